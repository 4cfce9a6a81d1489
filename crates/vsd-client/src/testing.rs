//! In-process stub of the delivery reservation service
//!
//! Mirrors the reference dummy server: a `GET`/`PATCH` pair on
//! `/api/vehicle_status` plus a debug endpoint to overwrite the stored
//! flags. Flag values are kept as raw JSON so tests can serve `null` or
//! non-numeric values and exercise the per-field parse handling.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, patch};
use axum::{Json, Router};
use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio::net::TcpListener;

use crate::error::Result;

/// Mutable state of the stub service.
#[derive(Debug, Clone)]
pub struct StubState {
    /// Last vehicle id seen in a request
    pub vehicle_id: String,
    pub lock_flg: Value,
    pub voice_flg: Value,
    pub active_schedule_exists: Value,
    /// When set, responses carry this id instead of the requested one
    pub forced_vehicle_id: Option<String>,
    /// When true, `GET /api/vehicle_status` answers 500
    pub fail_fetches: bool,
    /// When true, `PATCH /api/vehicle_status` answers 500
    pub fail_submits: bool,
    pub fetch_count: u64,
    pub submit_count: u64,
}

impl Default for StubState {
    fn default() -> Self {
        Self {
            vehicle_id: "XXXXX".to_owned(),
            lock_flg: json!(0),
            voice_flg: json!(0),
            active_schedule_exists: json!(0),
            forced_vehicle_id: None,
            fail_fetches: false,
            fail_submits: false,
            fetch_count: 0,
            submit_count: 0,
        }
    }
}

type SharedState = Arc<Mutex<StubState>>;

async fn get_vehicle_status(
    State(state): State<SharedState>,
    Query(params): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    let mut state = state.lock();
    state.fetch_count += 1;

    if state.fail_fetches {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"code": "500", "message": "Internal error."})),
        );
    }

    let Some(q_id) = params.get("vehicle_id") else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"code": "400", "message": "Getting vehicle id failed."})),
        );
    };
    state.vehicle_id = q_id.clone();

    let response_id = state.forced_vehicle_id.clone().unwrap_or_else(|| q_id.clone());
    (
        StatusCode::OK,
        Json(json!({
            "result": {
                "vehicle_id": response_id,
                "lock_flg": state.lock_flg,
                "voice_flg": state.voice_flg,
                "active_schedule_exists": state.active_schedule_exists,
            }
        })),
    )
}

async fn patch_vehicle_status(
    State(state): State<SharedState>,
    Json(payload): Json<Value>,
) -> impl IntoResponse {
    let mut state = state.lock();
    state.submit_count += 1;

    if state.fail_submits {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"code": "500", "message": "Internal error."})),
        );
    }

    if let Some(id) = payload.get("vehicle_id").and_then(Value::as_str) {
        state.vehicle_id = id.to_owned();
    }
    if let Some(lock) = payload.get("lock_flg") {
        state.lock_flg = lock.clone();
    }

    let response_id = state
        .forced_vehicle_id
        .clone()
        .unwrap_or_else(|| state.vehicle_id.clone());
    (
        StatusCode::OK,
        Json(json!({
            "result": {
                "vehicle_id": response_id,
                "lock_flg": state.lock_flg,
            }
        })),
    )
}

async fn patch_vehicle_status_debug(
    State(state): State<SharedState>,
    Json(payload): Json<Value>,
) -> impl IntoResponse {
    let mut state = state.lock();
    if let Some(lock) = payload.get("lock_flg") {
        state.lock_flg = lock.clone();
    }
    if let Some(voice) = payload.get("voice_flg") {
        state.voice_flg = voice.clone();
    }
    if let Some(schedule) = payload.get("active_schedule_exists") {
        state.active_schedule_exists = schedule.clone();
    }
    (
        StatusCode::OK,
        Json(json!({
            "result": {
                "lock_flg": state.lock_flg,
                "voice_flg": state.voice_flg,
                "active_schedule_exists": state.active_schedule_exists,
            }
        })),
    )
}

/// A stub reservation service that shuts down when dropped.
pub struct StubService {
    pub addr: SocketAddr,
    state: SharedState,
    shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
    handle: Option<tokio::task::JoinHandle<()>>,
}

impl StubService {
    /// Bind the stub to an ephemeral port and start serving.
    pub async fn start() -> Result<Self> {
        let state: SharedState = Arc::new(Mutex::new(StubState::default()));

        let router = Router::new()
            .route(
                "/api/vehicle_status",
                get(get_vehicle_status).patch(patch_vehicle_status),
            )
            .route("/api/vehicle_status_debug", patch(patch_vehicle_status_debug))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
        let handle = tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
                .ok();
        });

        Ok(Self {
            addr,
            state,
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        })
    }

    /// Base URL of the stub service
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Overwrite the stored flag values, raw JSON allowed.
    pub fn set_flags(&self, lock: Value, voice: Value, schedule: Value) {
        let mut state = self.state.lock();
        state.lock_flg = lock;
        state.voice_flg = voice;
        state.active_schedule_exists = schedule;
    }

    /// Make every response carry `id` regardless of what was requested.
    pub fn force_vehicle_id(&self, id: &str) {
        self.state.lock().forced_vehicle_id = Some(id.to_owned());
    }

    /// Make `GET /api/vehicle_status` answer 500.
    pub fn fail_fetches(&self, fail: bool) {
        self.state.lock().fail_fetches = fail;
    }

    /// Make `PATCH /api/vehicle_status` answer 500.
    pub fn fail_submits(&self, fail: bool) {
        self.state.lock().fail_submits = fail;
    }

    /// Snapshot of the current stub state
    pub fn state(&self) -> StubState {
        self.state.lock().clone()
    }

    /// Shutdown the stub gracefully
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for StubService {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}
