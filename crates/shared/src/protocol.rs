use serde::{Deserialize, Serialize};

use crate::domain::{Receipt, ReceiptSummary};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoogleLoginRequest {
    pub credential: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub auth_token: String,
    pub picture_url: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceiptEnvelope {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub receipt: Receipt,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceiptListEnvelope {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub receipts: Vec<ReceiptSummary>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<ReceiptSummary>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Vec<ReceiptSummary>>::deserialize(deserializer)?.unwrap_or_default())
}
