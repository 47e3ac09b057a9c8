use std::{path::Path, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use reqwest::{
    multipart::{Form, Part},
    Client, Method, StatusCode,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use shared::{
    domain::{Receipt, ReceiptId, ReceiptSummary},
    protocol::{GoogleLoginRequest, ReceiptEnvelope, ReceiptListEnvelope, UserProfile},
};
use tracing::{debug, info, warn};

use crate::{auth::AuthContext, config::ClientSettings, criteria::SearchCriteria, error::GatewayError};

pub const UPLOAD_FIELD: &str = "file";
const DEFAULT_UPLOAD_TIMEOUT: Duration = Duration::from_secs(120);

/// File picked for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub filename: String,
    pub mime_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("failed to read '{}'", path.display()))?;
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "receipt".to_string());
        let mime_type = mime_guess::from_path(path)
            .first()
            .map(|mime| mime.essence_str().to_string());
        Ok(Self {
            filename,
            mime_type,
            bytes,
        })
    }

    fn into_part(self) -> Result<Part, GatewayError> {
        let part = Part::bytes(self.bytes).file_name(self.filename);
        match self.mime_type {
            Some(mime) => part.mime_str(&mime).map_err(GatewayError::transport),
            None => Ok(part),
        }
    }
}

#[derive(Debug, Clone)]
pub enum RequestBody {
    Json(Value),
    Multipart { field: String, file: UploadFile },
}

#[derive(Debug, Clone)]
pub struct GatewayRequest {
    method: Method,
    endpoint: String,
    query: Vec<(&'static str, String)>,
    body: Option<RequestBody>,
    timeout: Option<Duration>,
}

impl GatewayRequest {
    pub fn new(method: Method, endpoint: impl Into<String>) -> Self {
        Self {
            method,
            endpoint: endpoint.into(),
            query: Vec::new(),
            body: None,
            timeout: None,
        }
    }

    pub fn get(endpoint: impl Into<String>) -> Self {
        Self::new(Method::GET, endpoint)
    }

    pub fn post(endpoint: impl Into<String>) -> Self {
        Self::new(Method::POST, endpoint)
    }

    pub fn with_query(mut self, query: Vec<(&'static str, String)>) -> Self {
        self.query = query;
        self
    }

    pub fn with_json(mut self, body: Value) -> Self {
        self.body = Some(RequestBody::Json(body));
        self
    }

    pub fn with_file(mut self, field: impl Into<String>, file: UploadFile) -> Self {
        self.body = Some(RequestBody::Multipart {
            field: field.into(),
            file,
        });
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// The only component that talks to the network. Every response is folded
/// into `Result<_, GatewayError>`; no controller state is touched here.
pub struct GatewayClient {
    http: Client,
    base_url: String,
    upload_timeout: Duration,
    auth: Arc<AuthContext>,
}

impl GatewayClient {
    pub fn new(base_url: impl Into<String>, auth: Arc<AuthContext>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            upload_timeout: DEFAULT_UPLOAD_TIMEOUT,
            auth,
        }
    }

    pub fn from_settings(settings: &ClientSettings, auth: Arc<AuthContext>) -> Result<Self> {
        let http = Client::builder()
            .timeout(settings.request_timeout())
            .build()
            .context("failed to build http client")?;
        Ok(Self {
            http,
            base_url: settings.api_url.trim_end_matches('/').to_string(),
            upload_timeout: settings.upload_timeout(),
            auth,
        })
    }

    pub async fn call(&self, request: GatewayRequest) -> Result<Value, GatewayError> {
        let GatewayRequest {
            method,
            endpoint,
            query,
            body,
            timeout,
        } = request;

        let mut builder = self
            .http
            .request(method.clone(), format!("{}{endpoint}", self.base_url));
        if !query.is_empty() {
            builder = builder.query(&query);
        }
        if let Some(token) = self.auth.token().await {
            builder = builder.bearer_auth(token.as_str());
        }
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        builder = match body {
            None => builder,
            Some(RequestBody::Json(value)) => builder.json(&value),
            Some(RequestBody::Multipart { field, file }) => {
                builder.multipart(Form::new().part(field, file.into_part()?))
            }
        };

        debug!(%method, endpoint = %endpoint, "issuing request");
        let response = builder.send().await.map_err(|err| {
            warn!(%method, endpoint = %endpoint, error = %err, "transport failure");
            GatewayError::transport(err)
        })?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            warn!(%method, endpoint = %endpoint, "request unauthorized");
            return Err(GatewayError::Unauthorized);
        }

        if (200..400).contains(&status.as_u16()) {
            info!(%method, endpoint = %endpoint, status = status.as_u16(), "request succeeded");
            return response.json::<Value>().await.map_err(|err| {
                warn!(endpoint = %endpoint, error = %err, "malformed success body");
                GatewayError::transport(err)
            });
        }

        let body = response.bytes().await.map_err(GatewayError::transport)?;
        let err = GatewayError::from_failure_body(status.as_u16(), &body);
        warn!(%method, endpoint = %endpoint, status = status.as_u16(), error = %err, "request failed");
        Err(err)
    }

    pub async fn call_json<T: DeserializeOwned>(
        &self,
        request: GatewayRequest,
    ) -> Result<T, GatewayError> {
        let value = self.call(request).await?;
        serde_json::from_value(value).map_err(GatewayError::transport)
    }

    pub async fn login_google(&self, credential: &str) -> Result<UserProfile, GatewayError> {
        let body = serde_json::to_value(GoogleLoginRequest {
            credential: credential.to_string(),
        })
        .map_err(GatewayError::transport)?;
        self.call_json(GatewayRequest::post("/login/google").with_json(body))
            .await
    }

    pub async fn create_receipt(&self, file: UploadFile) -> Result<Receipt, GatewayError> {
        let envelope: ReceiptEnvelope = self
            .call_json(
                GatewayRequest::post("/receipt")
                    .with_file(UPLOAD_FIELD, file)
                    .with_timeout(self.upload_timeout),
            )
            .await?;
        Ok(envelope.receipt)
    }

    pub async fn list_receipts(
        &self,
        criteria: &SearchCriteria,
    ) -> Result<Vec<ReceiptSummary>, GatewayError> {
        let envelope: ReceiptListEnvelope = self
            .call_json(GatewayRequest::get("/receipts").with_query(criteria.query_pairs()))
            .await?;
        Ok(envelope.receipts)
    }

    pub async fn fetch_receipt(&self, id: ReceiptId) -> Result<Receipt, GatewayError> {
        let envelope: ReceiptEnvelope = self
            .call_json(GatewayRequest::get(format!("/receipts/{}", id.0)))
            .await?;
        Ok(envelope.receipt)
    }
}

#[cfg(test)]
#[path = "tests/gateway_tests.rs"]
mod tests;
