use std::fmt::Display;

use shared::error::ErrorPayload;
use thiserror::Error;

pub const TRANSPORT_ERROR_MESSAGE: &str = "Error connecting to API";
pub const UNEXPECTED_ERROR_MESSAGE: &str = "unexpected error";
pub const VALIDATION_ERROR_MESSAGE: &str = "Invalid form";

/// Everything a gateway call can fail with. Callers match on the variant;
/// nothing is thrown past the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    #[error("session is no longer authorized")]
    Unauthorized,
    #[error("server rejected request ({status}): {message}")]
    Application {
        status: u16,
        message: String,
        errors: Vec<String>,
    },
    #[error("{message}: {detail}")]
    Transport { message: String, detail: String },
}

impl GatewayError {
    pub fn transport(detail: impl Display) -> Self {
        Self::Transport {
            message: TRANSPORT_ERROR_MESSAGE.to_string(),
            detail: detail.to_string(),
        }
    }

    /// Builds an application error from a raw failure body. Bodies that are
    /// not JSON, or carry no `message`, collapse to the generic message.
    pub fn from_failure_body(status: u16, body: &[u8]) -> Self {
        match serde_json::from_slice::<ErrorPayload>(body) {
            Ok(ErrorPayload {
                message: Some(message),
                errors,
            }) => Self::Application {
                status,
                message,
                errors,
            },
            _ => Self::Application {
                status,
                message: UNEXPECTED_ERROR_MESSAGE.to_string(),
                errors: Vec::new(),
            },
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }

    /// What the user gets to see. `None` for `Unauthorized`, which is never
    /// rendered inline.
    pub fn failure_report(&self) -> Option<FailureReport> {
        match self {
            Self::Unauthorized => None,
            Self::Application {
                message, errors, ..
            } => Some(FailureReport::new(message.clone(), errors.clone())),
            Self::Transport { message, detail } => {
                Some(FailureReport::new(message.clone(), vec![detail.clone()]))
            }
        }
    }
}

/// Inline error shown to the user: a heading plus detail lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureReport {
    pub message: String,
    pub errors: Vec<String>,
}

impl FailureReport {
    pub fn new(message: impl Into<String>, errors: Vec<String>) -> Self {
        Self {
            message: message.into(),
            errors,
        }
    }

    /// Client-side precondition failure; never reaches the network.
    pub fn validation(detail: impl Into<String>) -> Self {
        Self::new(VALIDATION_ERROR_MESSAGE, vec![detail.into()])
    }
}
