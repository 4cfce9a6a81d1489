//! Response validation for reservation service payloads
//!
//! A response is only trusted when its embedded vehicle id exactly
//! matches the id that was requested; this guards against a response
//! answering a different, possibly concurrent, request (the identity
//! can change between request and response).

use tracing::warn;

use crate::error::ValidationError;
use crate::types::{flag_from_value, StatusEnvelope};

/// Per-field outcome of a validated fetch response.
///
/// `None` means the field was absent or unparseable; the cache keeps
/// its previous value for that field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchOutcome {
    pub lock_engaged: Option<bool>,
    pub voice_prompt_enabled: Option<bool>,
    pub active_schedule_exists: Option<bool>,
}

fn parse_envelope(body: &str) -> Result<StatusEnvelope, ValidationError> {
    serde_json::from_str(body).map_err(|e| ValidationError::Malformed(e.to_string()))
}

fn check_identity(envelope: &StatusEnvelope, requested_id: &str) -> Result<(), ValidationError> {
    match envelope.result.vehicle_id.as_deref() {
        Some(id) if id == requested_id => Ok(()),
        _ => Err(ValidationError::IdentityMismatch),
    }
}

/// Validates a `GET /api/vehicle_status` response body.
///
/// Identity mismatch or an unparseable envelope rejects the whole
/// response. The three flag fields are individually optional: a field
/// that is missing or not a 0/1 value is reported as a warning and left
/// `None` so the previous cached value survives.
pub fn validate_fetch(body: &str, requested_id: &str) -> Result<FetchOutcome, ValidationError> {
    let envelope = parse_envelope(body)?;
    check_identity(&envelope, requested_id)?;

    let result = &envelope.result;
    let outcome = FetchOutcome {
        lock_engaged: flag_from_value(result.lock_flg.as_ref()),
        voice_prompt_enabled: flag_from_value(result.voice_flg.as_ref()),
        active_schedule_exists: flag_from_value(result.active_schedule_exists.as_ref()),
    };

    if outcome.lock_engaged.is_none() {
        warn!("failed to parse lock_flg retrieved from server");
    }
    if outcome.voice_prompt_enabled.is_none() {
        warn!("failed to parse voice_flg retrieved from server");
    }
    if outcome.active_schedule_exists.is_none() {
        warn!("failed to parse active_schedule_exists retrieved from server");
    }

    Ok(outcome)
}

/// Validates a `PATCH /api/vehicle_status` acknowledgement body.
///
/// Only the identity match and the presence of the acknowledged lock
/// value are checked. A valid acknowledgement never updates the cache;
/// it only licenses the follow-up fetch cycle.
pub fn validate_submit_ack(body: &str, requested_id: &str) -> Result<(), ValidationError> {
    let envelope = parse_envelope(body)?;
    check_identity(&envelope, requested_id)?;

    match envelope.result.lock_flg {
        Some(ref v) if !v.is_null() => Ok(()),
        _ => Err(ValidationError::MissingAck),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn fetch_full_payload() {
        let body = r#"{"result":{"vehicle_id":"V1","lock_flg":1,"voice_flg":0,"active_schedule_exists":1}}"#;
        let outcome = validate_fetch(body, "V1").unwrap();
        assert_eq!(
            outcome,
            FetchOutcome {
                lock_engaged: Some(true),
                voice_prompt_enabled: Some(false),
                active_schedule_exists: Some(true),
            }
        );
    }

    #[test]
    fn fetch_rejects_identity_mismatch() {
        let body = r#"{"result":{"vehicle_id":"V2","lock_flg":1,"voice_flg":0,"active_schedule_exists":1}}"#;
        let err = validate_fetch(body, "V1").unwrap_err();
        assert!(matches!(err, ValidationError::IdentityMismatch));
    }

    #[test]
    fn fetch_rejects_missing_identity() {
        let body = r#"{"result":{"lock_flg":1}}"#;
        let err = validate_fetch(body, "V1").unwrap_err();
        assert!(matches!(err, ValidationError::IdentityMismatch));
    }

    #[test]
    fn fetch_rejects_malformed_body() {
        let err = validate_fetch("not json", "V1").unwrap_err();
        assert!(matches!(err, ValidationError::Malformed(_)));
    }

    #[test]
    fn fetch_null_field_is_non_fatal() {
        let body = r#"{"result":{"vehicle_id":"V1","lock_flg":null,"voice_flg":1,"active_schedule_exists":0}}"#;
        let outcome = validate_fetch(body, "V1").unwrap();
        assert_eq!(outcome.lock_engaged, None);
        assert_eq!(outcome.voice_prompt_enabled, Some(true));
        assert_eq!(outcome.active_schedule_exists, Some(false));
    }

    #[test]
    fn fetch_non_numeric_field_is_non_fatal() {
        let body = r#"{"result":{"vehicle_id":"V1","lock_flg":"on","voice_flg":0,"active_schedule_exists":0}}"#;
        let outcome = validate_fetch(body, "V1").unwrap();
        assert_eq!(outcome.lock_engaged, None);
    }

    #[test]
    fn submit_ack_accepts_matching_identity() {
        let body = r#"{"result":{"vehicle_id":"V1","lock_flg":1}}"#;
        assert!(validate_submit_ack(body, "V1").is_ok());
    }

    #[test]
    fn submit_ack_rejects_identity_mismatch() {
        let body = r#"{"result":{"vehicle_id":"V2","lock_flg":1}}"#;
        let err = validate_submit_ack(body, "V1").unwrap_err();
        assert!(matches!(err, ValidationError::IdentityMismatch));
    }

    #[test]
    fn submit_ack_rejects_missing_lock_value() {
        let body = r#"{"result":{"vehicle_id":"V1"}}"#;
        let err = validate_submit_ack(body, "V1").unwrap_err();
        assert!(matches!(err, ValidationError::MissingAck));

        let body = r#"{"result":{"vehicle_id":"V1","lock_flg":null}}"#;
        let err = validate_submit_ack(body, "V1").unwrap_err();
        assert!(matches!(err, ValidationError::MissingAck));
    }
}
