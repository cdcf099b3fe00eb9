//! Shared helpers for the API integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use chrono::Utc;
use serde_json::Value;
use tower::ServiceExt;

use kairos_api::build_router;
use kairos_api::config::KairosConfig;
use kairos_api::state::AppState;
use test_utils::{fixtures, InMemoryStore};

pub fn state_with(store: Arc<InMemoryStore>, config: KairosConfig) -> Arc<AppState> {
    Arc::new(AppState::from_parts(
        config,
        store.clone(),
        store.clone(),
        store.clone(),
        store,
        None,
    ))
}

/// Router over the seeded Greek fixtures, plus the store for tweaking.
pub fn greece_app() -> (Router, Arc<InMemoryStore>) {
    app_with(fixtures::greece(Utc::now()))
}

pub fn app_with(store: InMemoryStore) -> (Router, Arc<InMemoryStore>) {
    let store = Arc::new(store);
    let state = state_with(store.clone(), KairosConfig::default());
    (build_router(state), store)
}

pub async fn get(app: &Router, uri: &str) -> (StatusCode, String) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

pub async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
    let (status, body) = get(app, uri).await;
    let json = serde_json::from_str(&body)
        .unwrap_or_else(|e| panic!("{} returned non-JSON body {:?}: {}", uri, body, e));
    (status, json)
}
