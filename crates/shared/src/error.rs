use serde::{Deserialize, Serialize};

/// Failure body the backend sends with 4xx/5xx responses.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default)]
    pub errors: Vec<String>,
}

