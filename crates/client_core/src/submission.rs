use std::sync::Arc;

use shared::domain::Receipt;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::{
    auth::AuthContext,
    error::{FailureReport, GatewayError},
    gateway::{GatewayClient, UploadFile},
    highlight::HighlightTerm,
    view::{ReceiptDetailView, SubmissionView, RECEIPT_PROCESSED},
};

pub const NO_FILE_SELECTED: &str = "no file selected";

/// Upload form state; `file` is whatever the file picker currently holds.
#[derive(Debug, Clone, Default)]
pub struct UploadForm {
    pub file: Option<UploadFile>,
}

impl UploadForm {
    pub fn with_file(file: UploadFile) -> Self {
        Self { file: Some(file) }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmissionState {
    Idle,
    Submitting,
    Succeeded(Receipt),
    Failed(FailureReport),
}

/// Upload-and-process flow. At most one upload is in flight; the result of
/// the last one stays visible until the next accepted submission.
pub struct SubmissionMachine {
    gateway: Arc<GatewayClient>,
    auth: Arc<AuthContext>,
    state: Mutex<SubmissionState>,
}

impl SubmissionMachine {
    pub fn new(gateway: Arc<GatewayClient>, auth: Arc<AuthContext>) -> Arc<Self> {
        Arc::new(Self {
            gateway,
            auth,
            state: Mutex::new(SubmissionState::Idle),
        })
    }

    pub async fn state(&self) -> SubmissionState {
        self.state.lock().await.clone()
    }

    /// Returns the state the machine settled in. Calling this while an
    /// upload is in flight changes nothing and returns `Submitting`.
    pub async fn submit(&self, form: &UploadForm) -> SubmissionState {
        let file = {
            let mut guard = self.state.lock().await;
            if *guard == SubmissionState::Submitting {
                debug!("upload already in flight; ignoring submit");
                return SubmissionState::Submitting;
            }
            let Some(file) = form.file.clone() else {
                *guard = SubmissionState::Failed(FailureReport::validation(NO_FILE_SELECTED));
                return guard.clone();
            };
            *guard = SubmissionState::Submitting;
            file
        };

        info!(filename = %file.filename, size = file.bytes.len(), "uploading receipt");
        let result = self.gateway.create_receipt(file).await;
        let unauthorized = result.as_ref().is_err_and(GatewayError::is_unauthorized);

        let next = match result {
            Ok(receipt) => {
                info!(receipt_id = receipt.id.0, items = receipt.items.len(), "receipt processed");
                SubmissionState::Succeeded(receipt)
            }
            Err(GatewayError::Unauthorized) => SubmissionState::Idle,
            Err(err) => {
                warn!(error = %err, "receipt upload failed");
                match err.failure_report() {
                    Some(report) => SubmissionState::Failed(report),
                    None => SubmissionState::Idle,
                }
            }
        };

        *self.state.lock().await = next.clone();
        if unauthorized {
            self.auth.logout().await;
        }
        next
    }

    pub async fn view(&self) -> SubmissionView {
        match self.state().await {
            SubmissionState::Idle => SubmissionView::Idle,
            SubmissionState::Submitting => SubmissionView::Processing,
            SubmissionState::Succeeded(receipt) => SubmissionView::Succeeded {
                heading: RECEIPT_PROCESSED,
                detail: ReceiptDetailView::new(&receipt, &HighlightTerm::none()),
            },
            SubmissionState::Failed(report) => SubmissionView::Failed(report),
        }
    }
}

#[cfg(test)]
#[path = "tests/submission_tests.rs"]
mod tests;
