//! HTTP ingress
//!
//! Maps the external transport onto the sync loop: identity updates and
//! lock-change requests arrive here and are forwarded as triggers on a
//! bounded channel; the last status publication is served back out.
//! Handlers carry no sync logic of their own.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use parking_lot::RwLock;
use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::warn;
use vsd_sync::StatusPublication;

/// Inbound trigger delivered to the sync loop.
#[derive(Debug)]
pub enum Trigger {
    /// Raw identity-update payload, parsed by the coordinator
    IdentityUpdate(String),
    /// Desired lock state
    LockChange(bool),
}

#[derive(Clone)]
pub struct IngressState {
    pub trigger_tx: mpsc::Sender<Trigger>,
    pub latest: Arc<RwLock<Option<StatusPublication>>>,
}

#[derive(Debug, Deserialize)]
struct ChangeLockRequest {
    flg: bool,
}

pub fn router(state: IngressState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/status", get(get_status))
        .route("/vehicle_info", post(post_vehicle_info))
        .route("/change_lock", post(post_change_lock))
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

async fn get_status(State(state): State<IngressState>) -> Response {
    match state.latest.read().clone() {
        Some(publication) => (StatusCode::OK, Json(publication)).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({"error": "no status published yet"})),
        )
            .into_response(),
    }
}

async fn post_vehicle_info(State(state): State<IngressState>, body: String) -> StatusCode {
    forward(&state, Trigger::IdentityUpdate(body))
}

async fn post_change_lock(
    State(state): State<IngressState>,
    Json(request): Json<ChangeLockRequest>,
) -> StatusCode {
    forward(&state, Trigger::LockChange(request.flg))
}

/// A full channel means the sync loop is still inside a cycle; the
/// trigger is rejected rather than queued without bound.
fn forward(state: &IngressState, trigger: Trigger) -> StatusCode {
    match state.trigger_tx.try_send(trigger) {
        Ok(()) => StatusCode::ACCEPTED,
        Err(mpsc::error::TrySendError::Full(trigger)) => {
            warn!(?trigger, "sync loop busy, dropping trigger");
            StatusCode::SERVICE_UNAVAILABLE
        }
        Err(mpsc::error::TrySendError::Closed(_)) => StatusCode::SERVICE_UNAVAILABLE,
    }
}
