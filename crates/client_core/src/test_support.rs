use std::{
    collections::HashMap,
    sync::{Arc, Mutex as StdMutex, PoisonError},
    time::Duration,
};

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Router,
};
use serde_json::{json, Value};
use tokio::{
    net::TcpListener,
    sync::{Mutex, Notify},
};

use crate::{
    auth::{
        AuthContext, MemorySessionStore, Navigator, Route, SessionStore, AUTH_TOKEN_KEY, NAME_KEY,
        PROFILE_PICTURE_KEY,
    },
    detail::ErrorReporter,
    error::FailureReport,
    gateway::GatewayClient,
};

#[derive(Debug, Clone)]
pub struct ReceivedRequest {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub authorization: Option<String>,
    pub content_type: Option<String>,
    pub body: String,
}

#[derive(Clone)]
struct Scripted {
    status: StatusCode,
    body: String,
    gate: Option<Arc<Notify>>,
}

#[derive(Clone, Default)]
struct BackendState {
    hits: Arc<Mutex<Vec<ReceivedRequest>>>,
    scripts: Arc<Mutex<HashMap<String, Scripted>>>,
}

/// In-process stand-in for the receipts backend. Responses are scripted per
/// `"METHOD /path"` or `"METHOD /path?query"`; the more specific key wins.
pub struct MockBackend {
    pub base_url: String,
    state: BackendState,
}

impl MockBackend {
    pub async fn spawn() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        let state = BackendState::default();
        let app = Router::new().fallback(handle).with_state(state.clone());
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        Self {
            base_url: format!("http://{addr}"),
            state,
        }
    }

    pub async fn script(&self, route: &str, status: StatusCode, body: Value) {
        self.script_raw(route, status, &body.to_string()).await;
    }

    pub async fn script_raw(&self, route: &str, status: StatusCode, body: &str) {
        self.state.scripts.lock().await.insert(
            route.to_string(),
            Scripted {
                status,
                body: body.to_string(),
                gate: None,
            },
        );
    }

    /// Like [`MockBackend::script`], but the response is held back until the
    /// returned gate is notified.
    pub async fn script_gated(&self, route: &str, status: StatusCode, body: Value) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.state.scripts.lock().await.insert(
            route.to_string(),
            Scripted {
                status,
                body: body.to_string(),
                gate: Some(gate.clone()),
            },
        );
        gate
    }

    pub async fn hits(&self) -> Vec<ReceivedRequest> {
        self.state.hits.lock().await.clone()
    }

    pub async fn hits_for(&self, path: &str) -> Vec<ReceivedRequest> {
        self.hits()
            .await
            .into_iter()
            .filter(|hit| hit.path == path)
            .collect()
    }

    pub async fn wait_for_hits(&self, count: usize) {
        for _ in 0..200 {
            if self.state.hits.lock().await.len() >= count {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("backend never received {count} requests");
    }
}

async fn handle(
    State(state): State<BackendState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let header_text = |name: header::HeaderName| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
    };
    state.hits.lock().await.push(ReceivedRequest {
        method: method.to_string(),
        path: uri.path().to_string(),
        query: uri.query().map(str::to_string),
        authorization: header_text(header::AUTHORIZATION),
        content_type: header_text(header::CONTENT_TYPE),
        body: String::from_utf8_lossy(&body).into_owned(),
    });

    let scripted = {
        let scripts = state.scripts.lock().await;
        let exact = uri
            .query()
            .and_then(|query| scripts.get(&format!("{method} {}?{query}", uri.path())));
        exact
            .or_else(|| scripts.get(&format!("{method} {}", uri.path())))
            .cloned()
    };

    let Some(scripted) = scripted else {
        return (StatusCode::NOT_FOUND, "no script").into_response();
    };
    if let Some(gate) = scripted.gate {
        gate.notified().await;
    }
    (
        scripted.status,
        [(header::CONTENT_TYPE, "application/json")],
        scripted.body,
    )
        .into_response()
}

#[derive(Default)]
pub struct RecordingNavigator {
    routes: StdMutex<Vec<Route>>,
}

impl RecordingNavigator {
    pub fn routes(&self) -> Vec<Route> {
        self.routes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, route: Route) {
        self.routes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(route);
    }
}

#[derive(Default)]
pub struct RecordingReporter {
    reports: StdMutex<Vec<FailureReport>>,
}

impl RecordingReporter {
    pub fn reports(&self) -> Vec<FailureReport> {
        self.reports
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl ErrorReporter for RecordingReporter {
    fn report(&self, report: &FailureReport) {
        self.reports
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(report.clone());
    }
}

pub struct Harness {
    pub backend: MockBackend,
    pub store: Arc<MemorySessionStore>,
    pub navigator: Arc<RecordingNavigator>,
    pub auth: Arc<AuthContext>,
    pub gateway: Arc<GatewayClient>,
}

impl Harness {
    /// Backend plus a client stack that starts out logged in as "Ana".
    pub async fn logged_in() -> Self {
        let store = Arc::new(MemorySessionStore::new());
        store.set(AUTH_TOKEN_KEY, "token-123").expect("seed token");
        store.set(NAME_KEY, "Ana").expect("seed name");
        store
            .set(PROFILE_PICTURE_KEY, "https://example.test/ana.png")
            .expect("seed picture");
        Self::with_store(store).await
    }

    pub async fn logged_out() -> Self {
        Self::with_store(Arc::new(MemorySessionStore::new())).await
    }

    async fn with_store(store: Arc<MemorySessionStore>) -> Self {
        let backend = MockBackend::spawn().await;
        let navigator = Arc::new(RecordingNavigator::default());
        let auth = AuthContext::from_store(store.clone(), navigator.clone());
        let gateway = Arc::new(GatewayClient::new(backend.base_url.clone(), auth.clone()));
        Self {
            backend,
            store,
            navigator,
            auth,
            gateway,
        }
    }

    pub fn session_cleared(&self) -> bool {
        [AUTH_TOKEN_KEY, NAME_KEY, PROFILE_PICTURE_KEY]
            .iter()
            .all(|key| self.store.get(key).is_none())
    }
}

pub fn receipt_json(id: i64, supermarket: &str, items: &[(i64, &str)]) -> Value {
    let items: Vec<Value> = items
        .iter()
        .map(|(item_id, name)| {
            json!({
                "ID": item_id,
                "ReceiptID": id,
                "Name": name,
                "Quantity": 1,
                "UnitPrice": 1.25,
                "Price": 1.25
            })
        })
        .collect();
    json!({
        "ID": id,
        "UserID": 1,
        "Supermarket": supermarket,
        "Date": "2024-01-01T00:00:00Z",
        "Total": 12.5,
        "Currency": "EUR",
        "Items": items
    })
}

pub fn unauthorized_body() -> Value {
    json!({"message": "Unauthorized"})
}
