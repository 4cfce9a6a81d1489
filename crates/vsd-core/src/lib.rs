//! Core types for the vehicle status daemon
//!
//! Holds the in-memory model shared by the sync loop: the vehicle status
//! flags, the identity/emergency cache, the wire payload types of the
//! delivery reservation service and the response validation rules.

pub mod cache;
pub mod error;
pub mod types;
pub mod validate;

pub use cache::StatusCache;
pub use error::ValidationError;
pub use types::{StatusEnvelope, StatusResult, VehicleStatus};
pub use validate::{validate_fetch, validate_submit_ack, FetchOutcome};
