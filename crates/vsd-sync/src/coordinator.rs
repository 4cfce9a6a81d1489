//! Trigger coordinator
//!
//! Single writer over the status cache. The three entry points are
//! driven from one event-loop task, so every cycle (fetch, or submit
//! followed by fetch) runs to completion before the next trigger is
//! handled; there is no cancellation once a cycle starts.

use thiserror::Error;
use tracing::{debug, error, warn};

use vsd_client::{ClientError, ReservationClient};
use vsd_core::{validate_fetch, validate_submit_ack, StatusCache, ValidationError};

use crate::publisher::{StatusPublication, StatusSink};

/// Failure of one fetch or submit cycle.
///
/// Reported exactly once at the cycle-result level; retries inside the
/// client never surface here as individual failures.
#[derive(Debug, Error)]
pub enum CycleError {
    #[error(transparent)]
    Client(#[from] ClientError),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Owns the cache, the remote client and the publication sink, and
/// encodes when a cycle is allowed to run.
pub struct Coordinator<S> {
    cache: StatusCache,
    client: ReservationClient,
    sink: S,
}

impl<S: StatusSink> Coordinator<S> {
    pub fn new(client: ReservationClient, sink: S) -> Self {
        Self {
            cache: StatusCache::new(),
            client,
            sink,
        }
    }

    /// Read access to the cache, for inspection and tests.
    pub fn cache(&self) -> &StatusCache {
        &self.cache
    }

    /// Read access to the sink, for inspection and tests.
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Inbound identity update.
    ///
    /// Parses the vehicle id out of the raw JSON payload and stores it.
    /// A payload without a usable id raises the emergency flag; the
    /// previously stored identity stays in place. Never fetches.
    pub fn on_identity_update(&mut self, raw: &str) {
        let id = match serde_json::from_str::<serde_json::Value>(raw) {
            Ok(payload) => payload
                .get("vehicle_id")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_owned(),
            Err(e) => {
                error!("failed to parse identity update payload: {e}");
                String::new()
            }
        };
        self.cache.set_identity(&id);
    }

    /// Periodic timer tick.
    ///
    /// Skipped while the emergency flag is set or no identity has been
    /// received; otherwise runs one fetch cycle. A failed cycle is
    /// logged and the daemon keeps running, the next tick retries.
    pub async fn on_timer_tick(&mut self) {
        if self.cache.is_emergency() {
            error!("emergency flag is set; skipping status poll");
            return;
        }
        if self.cache.vehicle_id().is_none() {
            error!("vehicle id is unset; skipping status poll");
            return;
        }
        if let Err(e) = self.fetch_cycle().await {
            error!("status fetch cycle failed: {e}");
        }
    }

    /// Inbound lock-change request.
    ///
    /// Runs a submit cycle and, only when the acknowledgement validates,
    /// a fetch cycle: the post-write read is the single source of truth
    /// for what gets published, never the acknowledged write itself.
    /// Requests are refused while the emergency flag is set, same as
    /// timer polls.
    pub async fn on_lock_change(&mut self, desired_lock: bool) {
        if self.cache.vehicle_id().is_none() {
            debug!("vehicle id is unset; ignoring lock-change request");
            return;
        }
        if self.cache.is_emergency() {
            warn!("emergency flag is set; refusing lock-change request");
            return;
        }
        match self.submit_cycle(desired_lock).await {
            Ok(()) => {
                if let Err(e) = self.fetch_cycle().await {
                    error!("post-submit status fetch cycle failed: {e}");
                }
            }
            Err(e) => error!("lock-change submit cycle failed: {e}"),
        }
    }

    /// One fetch cycle: fetch, validate, apply, publish.
    async fn fetch_cycle(&mut self) -> Result<(), CycleError> {
        let Some(vehicle_id) = self.cache.vehicle_id().map(str::to_owned) else {
            return Ok(());
        };

        let body = self.client.fetch_status(&vehicle_id).await?;
        let outcome = validate_fetch(&body, &vehicle_id)?;
        self.cache.apply_fetch(&outcome);
        self.sink.publish(StatusPublication::now(self.cache.status()));
        debug!(%vehicle_id, "published vehicle status");
        Ok(())
    }

    /// One submit cycle: submit, validate the acknowledgement.
    ///
    /// Does not touch the cache; a valid acknowledgement
    /// only licenses the follow-up fetch cycle.
    async fn submit_cycle(&mut self, desired_lock: bool) -> Result<(), CycleError> {
        let Some(vehicle_id) = self.cache.vehicle_id().map(str::to_owned) else {
            return Ok(());
        };

        let body = self
            .client
            .submit_lock_change(&vehicle_id, desired_lock)
            .await?;
        validate_submit_ack(&body, &vehicle_id)?;
        debug!(%vehicle_id, desired_lock, "lock-change acknowledged");
        Ok(())
    }
}
