use std::sync::Arc;

use shared::domain::ReceiptSummary;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::{
    auth::AuthContext,
    criteria::{SearchCriteria, SearchForm},
    error::{FailureReport, GatewayError},
    gateway::GatewayClient,
    highlight::HighlightTerm,
    outcome::{RequestOutcome, RequestSequencer, RequestTicket},
    view::{ListingView, ReceiptRow},
};

/// Which operation produced the current outcome. Failures of the initial
/// unfiltered load are logged and shown as an empty list instead of inline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingRequest {
    Initial,
    Filter,
}

#[derive(Default)]
struct ListingState {
    activated: bool,
    criteria: SearchCriteria,
    highlight: HighlightTerm,
    items: Vec<ReceiptSummary>,
    last_outcome: Option<(ListingRequest, RequestOutcome<usize>)>,
    sequencer: RequestSequencer,
}

pub struct ListingController {
    gateway: Arc<GatewayClient>,
    auth: Arc<AuthContext>,
    inner: Mutex<ListingState>,
}

impl ListingController {
    pub fn new(gateway: Arc<GatewayClient>, auth: Arc<AuthContext>) -> Arc<Self> {
        Arc::new(Self {
            gateway,
            auth,
            inner: Mutex::new(ListingState::default()),
        })
    }

    /// Unfiltered fetch on first activation. Later calls do nothing.
    pub async fn load_initial(&self) {
        let ticket = {
            let mut guard = self.inner.lock().await;
            if guard.activated {
                return;
            }
            guard.activated = true;
            guard.last_outcome = Some((ListingRequest::Initial, RequestOutcome::Pending));
            guard.sequencer.issue()
        };

        let result = self.gateway.list_receipts(&SearchCriteria::default()).await;
        self.complete(ListingRequest::Initial, ticket, result).await;
    }

    pub async fn apply_filter(&self, criteria: SearchCriteria) {
        let ticket = {
            let mut guard = self.inner.lock().await;
            guard.activated = true;
            guard.highlight = HighlightTerm::from_criteria(&criteria);
            guard.criteria = criteria.clone();
            guard.last_outcome = Some((ListingRequest::Filter, RequestOutcome::Pending));
            guard.sequencer.issue()
        };

        info!(ticket = ticket.0, unconstrained = criteria.is_unconstrained(), "applying receipt filter");
        let result = self.gateway.list_receipts(&criteria).await;
        self.complete(ListingRequest::Filter, ticket, result).await;
    }

    /// Submits the search form. Invalid input is reported inline without a
    /// request.
    pub async fn submit_form(&self, form: &SearchForm) {
        match form.to_criteria() {
            Ok(criteria) => self.apply_filter(criteria).await,
            Err(report) => {
                let mut guard = self.inner.lock().await;
                // Supersede anything still in flight so it cannot hide the error.
                guard.sequencer.issue();
                guard.last_outcome = Some((ListingRequest::Filter, RequestOutcome::Failure(report)));
            }
        }
    }

    async fn complete(
        &self,
        request: ListingRequest,
        ticket: RequestTicket,
        result: Result<Vec<ReceiptSummary>, GatewayError>,
    ) {
        if result.as_ref().is_err_and(GatewayError::is_unauthorized) {
            self.auth.logout().await;
        }

        let mut guard = self.inner.lock().await;
        if !guard.sequencer.is_current(ticket) {
            debug!(
                ticket = ticket.0,
                latest = guard.sequencer.latest().0,
                "discarding stale listing response"
            );
            return;
        }

        let outcome = match result {
            Ok(receipts) => {
                info!(ticket = ticket.0, count = receipts.len(), "receipt listing updated");
                let count = receipts.len();
                guard.items = receipts;
                Some((request, RequestOutcome::Success(count)))
            }
            Err(GatewayError::Unauthorized) => {
                guard.items.clear();
                None
            }
            Err(err) => {
                warn!(ticket = ticket.0, ?request, error = %err, "receipt listing failed");
                err.failure_report()
                    .map(|report| (request, RequestOutcome::Failure(report)))
            }
        };
        guard.last_outcome = outcome;
    }

    pub async fn items(&self) -> Vec<ReceiptSummary> {
        self.inner.lock().await.items.clone()
    }

    pub async fn criteria(&self) -> SearchCriteria {
        self.inner.lock().await.criteria.clone()
    }

    pub async fn highlight(&self) -> HighlightTerm {
        self.inner.lock().await.highlight.clone()
    }

    pub async fn last_outcome(&self) -> Option<(ListingRequest, RequestOutcome<usize>)> {
        self.inner.lock().await.last_outcome.clone()
    }

    /// Inline error of the last request, if it is meant to be shown.
    pub async fn inline_error(&self) -> Option<FailureReport> {
        match self.inner.lock().await.last_outcome.as_ref() {
            Some((ListingRequest::Filter, RequestOutcome::Failure(report))) => Some(report.clone()),
            _ => None,
        }
    }

    pub async fn view(&self) -> ListingView {
        let guard = self.inner.lock().await;
        match &guard.last_outcome {
            Some((_, RequestOutcome::Pending)) => return ListingView::Loading,
            Some((ListingRequest::Filter, RequestOutcome::Failure(report))) => {
                return ListingView::Error(report.clone())
            }
            None if !guard.activated => return ListingView::Loading,
            _ => {}
        }

        if guard.items.is_empty() {
            ListingView::NoItemsFound
        } else {
            ListingView::Rows(guard.items.iter().map(ReceiptRow::from).collect())
        }
    }
}

#[cfg(test)]
#[path = "tests/listing_tests.rs"]
mod tests;
