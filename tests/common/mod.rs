#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use serde_json::{json, Value};

use poetry_client::config::{BackendConfig, BackendKind, RestConfig};

pub const ANON_KEY: &str = "anon-key";

/// One request as the stub saw it
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub headers: HeaderMap,
    pub body: Value,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn query_pairs(&self) -> Vec<(String, String)> {
        url::form_urlencoded::parse(self.query.as_deref().unwrap_or_default().as_bytes())
            .into_owned()
            .collect()
    }

    pub fn query_value(&self, key: &str) -> Option<String> {
        self.query_pairs().into_iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }
}

#[derive(Debug, Clone)]
struct Scripted {
    method: Method,
    path: String,
    status: StatusCode,
    body: Value,
}

#[derive(Default)]
struct StubState {
    scripts: Mutex<Vec<Scripted>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

/// In-process HTTP stub standing in for the hosted backend or the legacy API.
///
/// Responses are scripted per method and path; the newest script for a route
/// wins. Unscripted routes answer 404.
pub struct StubServer {
    pub base_url: String,
    state: Arc<StubState>,
}

impl StubServer {
    pub async fn start() -> Result<Self> {
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
            .await
            .context("failed to bind stub server")?;

        let state = Arc::new(StubState::default());
        let app = Router::new().fallback(record).with_state(state.clone());
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Ok(Self { base_url: format!("http://127.0.0.1:{}", port), state })
    }

    pub fn respond(&self, method: Method, path: &str, status: u16, body: Value) -> &Self {
        let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        self.state.scripts.lock().unwrap().insert(0, Scripted { method, path: path.to_string(), status, body });
        self
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().unwrap().clone()
    }

    pub fn requests_to(&self, method: Method, path: &str) -> Vec<RecordedRequest> {
        self.requests().into_iter().filter(|r| r.method == method && r.path == path).collect()
    }

    pub fn backend_config(&self) -> BackendConfig {
        BackendConfig {
            kind: BackendKind::Supabase,
            supabase_url: self.base_url.clone(),
            supabase_anon_key: ANON_KEY.to_string(),
            site_url: None,
        }
    }

    pub fn rest_config(&self) -> RestConfig {
        RestConfig { base_url: format!("{}/api", self.base_url), timeout_secs: 5 }
    }
}

async fn record(
    State(state): State<Arc<StubState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let body = if body.is_empty() { Value::Null } else { serde_json::from_slice(&body).unwrap_or(Value::Null) };
    let request = RecordedRequest {
        method: method.clone(),
        path: uri.path().to_string(),
        query: uri.query().map(str::to_string),
        headers,
        body,
    };
    state.requests.lock().unwrap().push(request);

    let scripted = state
        .scripts
        .lock()
        .unwrap()
        .iter()
        .find(|s| s.method == method && s.path == uri.path())
        .cloned();

    match scripted {
        Some(Scripted { status, body: Value::Null, .. }) => status.into_response(),
        Some(Scripted { status, body, .. }) => (status, Json(body)).into_response(),
        None => (StatusCode::NOT_FOUND, Json(json!({ "message": "no stub for this route" }))).into_response(),
    }
}

pub fn user_json(id: &str, email: &str) -> Value {
    json!({
        "id": id,
        "email": email,
        "role": "authenticated",
        "user_metadata": { "username": email.split('@').next().unwrap_or_default() }
    })
}

pub fn session_json(token: &str, user: Value) -> Value {
    json!({
        "access_token": token,
        "token_type": "bearer",
        "expires_in": 3600,
        "refresh_token": "refresh",
        "user": user
    })
}
