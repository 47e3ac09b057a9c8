use std::sync::Arc;

use shared::domain::{Receipt, ReceiptId};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::{
    auth::AuthContext,
    error::{FailureReport, GatewayError},
    gateway::GatewayClient,
    highlight::HighlightTerm,
    outcome::{RequestOutcome, RequestSequencer},
    view::ReceiptDetailView,
};

/// Receives failures the detail view does not render itself.
pub trait ErrorReporter: Send + Sync {
    fn report(&self, report: &FailureReport);
}

pub struct LogErrorReporter;

impl ErrorReporter for LogErrorReporter {
    fn report(&self, report: &FailureReport) {
        warn!(message = %report.message, errors = ?report.errors, "request failed");
    }
}

#[derive(Default)]
struct DetailState {
    selected: Option<Receipt>,
    visible: bool,
    last_outcome: Option<RequestOutcome<ReceiptId>>,
    sequencer: RequestSequencer,
}

/// Shows a single receipt fetched by id. Needs nothing from the listing.
pub struct DetailController {
    gateway: Arc<GatewayClient>,
    auth: Arc<AuthContext>,
    reporter: Arc<dyn ErrorReporter>,
    inner: Mutex<DetailState>,
}

impl DetailController {
    pub fn new(gateway: Arc<GatewayClient>, auth: Arc<AuthContext>) -> Arc<Self> {
        Self::with_reporter(gateway, auth, Arc::new(LogErrorReporter))
    }

    pub fn with_reporter(
        gateway: Arc<GatewayClient>,
        auth: Arc<AuthContext>,
        reporter: Arc<dyn ErrorReporter>,
    ) -> Arc<Self> {
        Arc::new(Self {
            gateway,
            auth,
            reporter,
            inner: Mutex::new(DetailState::default()),
        })
    }

    pub async fn open(&self, id: ReceiptId) {
        let ticket = {
            let mut guard = self.inner.lock().await;
            guard.last_outcome = Some(RequestOutcome::Pending);
            guard.sequencer.issue()
        };

        let result = self.gateway.fetch_receipt(id).await;
        if result.as_ref().is_err_and(GatewayError::is_unauthorized) {
            self.auth.logout().await;
        }

        let mut guard = self.inner.lock().await;
        if !guard.sequencer.is_current(ticket) {
            debug!(ticket = ticket.0, receipt_id = id.0, "discarding stale receipt response");
            return;
        }

        match result {
            Ok(receipt) => {
                info!(receipt_id = receipt.id.0, items = receipt.items.len(), "receipt opened");
                guard.selected = Some(receipt);
                guard.visible = true;
                guard.last_outcome = Some(RequestOutcome::Success(id));
            }
            Err(GatewayError::Unauthorized) => {
                guard.last_outcome = None;
            }
            Err(err) => {
                let report = err.failure_report();
                guard.last_outcome = report.clone().map(RequestOutcome::Failure);
                drop(guard);
                if let Some(report) = report {
                    self.reporter.report(&report);
                }
            }
        }
    }

    /// Hides the detail but keeps the last receipt around.
    pub async fn close(&self) {
        self.inner.lock().await.visible = false;
    }

    pub async fn selected(&self) -> Option<Receipt> {
        self.inner.lock().await.selected.clone()
    }

    pub async fn is_visible(&self) -> bool {
        self.inner.lock().await.visible
    }

    pub async fn last_outcome(&self) -> Option<RequestOutcome<ReceiptId>> {
        self.inner.lock().await.last_outcome.clone()
    }

    pub async fn view(&self, highlight: &HighlightTerm) -> Option<ReceiptDetailView> {
        let guard = self.inner.lock().await;
        if !guard.visible {
            return None;
        }
        guard
            .selected
            .as_ref()
            .map(|receipt| ReceiptDetailView::new(receipt, highlight))
    }
}

#[cfg(test)]
#[path = "tests/detail_tests.rs"]
mod tests;
