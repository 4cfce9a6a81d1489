//! Reservation service HTTP client
//!
//! Issues the two remote operations of the sync loop — fetch the vehicle
//! status, submit a lock change — with distinct timeout pairs and a
//! bounded retry policy on the write path. The `testing` module carries
//! an in-process stub of the reservation service for integration tests.

pub mod client;
pub mod error;
pub mod testing;

pub use client::{RemoteTimeouts, ReservationClient};
pub use error::{ClientError, Result};
