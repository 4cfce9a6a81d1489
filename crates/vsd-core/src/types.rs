//! Vehicle status flags and the reservation service wire format

use serde::{Deserialize, Serialize};

/// Last known-good operational flags for the tracked vehicle.
///
/// Fields are updated independently: a fetch cycle only overwrites the
/// flags its response carried a parseable value for (stale-on-failure).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct VehicleStatus {
    pub lock_engaged: bool,
    pub voice_prompt_enabled: bool,
    pub active_schedule_exists: bool,
}

/// Top-level JSON envelope returned by the reservation service.
///
/// Both `GET /api/vehicle_status` and the PATCH acknowledgement wrap
/// their payload in a `result` object.
#[derive(Debug, Clone, Deserialize)]
pub struct StatusEnvelope {
    pub result: StatusResult,
}

/// Body of a reservation service response.
///
/// The flag fields stay untyped (`serde_json::Value`) on purpose: the
/// service is not trusted to always send 0/1 integers, and a single bad
/// field must not reject the whole payload. Conversion to booleans
/// happens per field during validation.
#[derive(Debug, Clone, Deserialize)]
pub struct StatusResult {
    #[serde(default)]
    pub vehicle_id: Option<String>,
    #[serde(default)]
    pub lock_flg: Option<serde_json::Value>,
    #[serde(default)]
    pub voice_flg: Option<serde_json::Value>,
    #[serde(default)]
    pub active_schedule_exists: Option<serde_json::Value>,
}

/// Interprets a wire flag value: integers map zero/nonzero, booleans
/// pass through, anything else is unparseable.
pub(crate) fn flag_from_value(value: Option<&serde_json::Value>) -> Option<bool> {
    match value? {
        serde_json::Value::Number(n) => n.as_i64().map(|v| v != 0).or_else(|| {
            n.as_u64().map(|v| v != 0)
        }),
        serde_json::Value::Bool(b) => Some(*b),
        _ => None,
    }
}
