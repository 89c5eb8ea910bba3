//! HTTP endpoints

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use tower_http::trace::TraceLayer;

use crate::state::AppState;
use crate::websocket::ws_handler;

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/calls", get(list_calls))
        .route("/ws/call/:call_id", get(ws_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "active_calls": state.active_calls(),
    }))
}

async fn list_calls(State(state): State<AppState>) -> Json<serde_json::Value> {
    let calls: Vec<serde_json::Value> = state
        .calls
        .iter()
        .map(|entry| {
            serde_json::json!({
                "call_id": entry.key(),
                "started_at": entry.value().started_at.to_rfc3339(),
            })
        })
        .collect();
    Json(serde_json::json!({
        "count": calls.len(),
        "calls": calls,
    }))
}
