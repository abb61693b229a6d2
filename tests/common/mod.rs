use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use mindwell::config::{CompletionConfig, Config};
use mindwell::server::{self, AppState};
use mindwell::storage::ConversationStore;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

/// Config pointing at a temporary store with live completion disabled
#[allow(dead_code)]
pub fn memory_config() -> Config {
    let mut config = Config::default();
    config.storage.database_url = Some("memory:".to_string());
    config
}

/// Completion settings aimed at a mock endpoint with short retry pauses
#[allow(dead_code)]
pub fn completion_config(api_base: &str, api_key: Option<&str>) -> CompletionConfig {
    CompletionConfig {
        enabled: true,
        api_base: api_base.to_string(),
        model: "test-model".to_string(),
        api_key: api_key.map(str::to_string),
        timeout_seconds: 1,
        max_attempts: 3,
        retry_delay_ms: 10,
        ..Default::default()
    }
}

/// Router over a fresh temporary store, plus a handle to that store
#[allow(dead_code)]
pub fn test_app(config: &Config) -> (Router, ConversationStore) {
    let store = ConversationStore::temporary().expect("failed to open temporary store");
    let state = AppState::with_store(config, store.clone()).expect("failed to build app state");
    (server::router(Arc::new(state)), store)
}

/// Send one request through the router and decode the JSON reply
#[allow(dead_code)]
pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    send_raw(app, builder.body(body).expect("failed to build request")).await
}

/// Send a prebuilt request through the router and decode the JSON reply
#[allow(dead_code)]
pub async fn send_raw(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(request)
        .await
        .expect("router returned an error");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("failed to read body");
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            Value::String(String::from_utf8_lossy(&bytes).into_owned())
        })
    };
    (status, value)
}
