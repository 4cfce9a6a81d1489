//! In-memory status cache
//!
//! Owns the tracked vehicle identity, the emergency flag and the last
//! known-good status flags. Lives for the process lifetime; nothing is
//! ever deleted, only overwritten. There is no internal locking: the
//! trigger coordinator serializes all access.

use tracing::error;

use crate::types::VehicleStatus;
use crate::validate::FetchOutcome;

/// Local cache of the vehicle's remote operational state.
#[derive(Debug, Default)]
pub struct StatusCache {
    vehicle_id: Option<String>,
    emergency: bool,
    status: VehicleStatus,
}

impl StatusCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Currently tracked vehicle identity, if one has been received.
    pub fn vehicle_id(&self) -> Option<&str> {
        self.vehicle_id.as_deref()
    }

    /// True while the last identity update failed to supply an id.
    pub fn is_emergency(&self) -> bool {
        self.emergency
    }

    /// Last known-good status flags.
    pub fn status(&self) -> VehicleStatus {
        self.status
    }

    /// Stores a new vehicle identity.
    ///
    /// An empty id raises the emergency flag and keeps the previous
    /// identity in place; a stale identity may keep being queried, which
    /// is acceptable because every cycle re-validates the response id.
    /// A non-empty id clears the emergency flag.
    pub fn set_identity(&mut self, id: &str) {
        if id.is_empty() {
            self.emergency = true;
            error!("vehicle id could not be obtained from the identity update");
            return;
        }
        self.vehicle_id = Some(id.to_owned());
        self.emergency = false;
    }

    /// Applies a validated fetch outcome field by field.
    ///
    /// Fields the response did not carry a parseable value for retain
    /// their previous value. Never fails; whether the surrounding cycle
    /// publishes is the caller's decision.
    pub fn apply_fetch(&mut self, outcome: &FetchOutcome) {
        if let Some(lock) = outcome.lock_engaged {
            self.status.lock_engaged = lock;
        }
        if let Some(voice) = outcome.voice_prompt_enabled {
            self.status.voice_prompt_enabled = voice;
        }
        if let Some(schedule) = outcome.active_schedule_exists {
            self.status.active_schedule_exists = schedule;
        }
    }
}
