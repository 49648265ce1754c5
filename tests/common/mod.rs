//! Helpers shared by the HTTP integration tests.

#![allow(dead_code)]

use std::{sync::Arc, time::Duration};

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use game_provider_service::{
    config::{AppConfig, StorageBackend},
    dao::game_store::GameStore,
    routes,
    services::retry::RetryPolicy,
    state::{AppState, SharedState},
};
use serde_json::Value;
use tower::ServiceExt;

/// State with a short retry delay so conflict tests stay fast.
pub fn test_state(max_attempts: u32) -> SharedState {
    AppState::new(AppConfig::new(
        StorageBackend::Memory,
        RetryPolicy::new(max_attempts, Duration::from_millis(10)),
    ))
}

pub async fn router_with_store(state: SharedState, store: Arc<dyn GameStore>) -> Router {
    state.install_game_store(store).await;
    routes::router(state)
}

pub async fn send(
    router: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
) -> Result<(StatusCode, Value), String> {
    let builder = Request::builder().method(method).uri(uri);

    let req = match body {
        Some(payload) => {
            let bytes = serde_json::to_vec(&payload)
                .map_err(|err| format!("serialize request body: {err}"))?;
            builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(bytes))
                .map_err(|err| format!("build request: {err}"))?
        }
        None => builder
            .body(Body::empty())
            .map_err(|err| format!("build request: {err}"))?,
    };

    let response = router
        .clone()
        .oneshot(req)
        .await
        .map_err(|err| format!("route request: {err}"))?;
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .map_err(|err| format!("read response body: {err}"))?;

    let parsed = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).map_err(|err| format!("parse response body: {err}"))?
    };
    Ok((status, parsed))
}

/// Messages carried by an error body, in order.
pub fn error_messages(body: &Value) -> Vec<String> {
    body["errors"]
        .as_array()
        .map(|errors| {
            errors
                .iter()
                .filter_map(|entry| entry["errorMessage"].as_str().map(str::to_owned))
                .collect()
        })
        .unwrap_or_default()
}
