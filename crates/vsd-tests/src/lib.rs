//! Integration tests for the vehicle status daemon
//!
//! The tests live in `tests/` and drive the trigger coordinator
//! against the in-process reservation service stub.
