//! Synchronization core of the vehicle status daemon
//!
//! The coordinator owns the three entry points (timer tick, identity
//! update, lock-change request) and runs fetch and submit cycles to
//! completion, one at a time. The publisher side emits the cache
//! contents after every completed fetch cycle.

pub mod coordinator;
pub mod publisher;

pub use coordinator::{Coordinator, CycleError};
pub use publisher::{BroadcastSink, RecordingSink, StatusPublication, StatusSink};
