use crate::error::FailureReport;

/// State of the most recent request a controller issued.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestOutcome<T> {
    Pending,
    Success(T),
    Failure(FailureReport),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RequestTicket(pub u64);

/// Hands out monotonically increasing tickets. Only the completion holding
/// the latest ticket may touch controller state.
#[derive(Debug, Default)]
pub struct RequestSequencer {
    latest: u64,
}

impl RequestSequencer {
    pub fn issue(&mut self) -> RequestTicket {
        self.latest += 1;
        RequestTicket(self.latest)
    }

    pub fn is_current(&self, ticket: RequestTicket) -> bool {
        ticket.0 == self.latest
    }

    pub fn latest(&self) -> RequestTicket {
        RequestTicket(self.latest)
    }
}
