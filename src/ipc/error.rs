use serde_json::json;
use tracing::error;

use crate::error::{RecordError, RosterError};

pub fn ok(id: &str, result: serde_json::Value) -> serde_json::Value {
    json!({
        "id": id,
        "ok": true,
        "result": result
    })
}

pub fn err(
    id: &str,
    code: &str,
    message: impl Into<String>,
    details: Option<serde_json::Value>,
) -> serde_json::Value {
    let mut error = json!({
        "code": code,
        "message": message.into(),
    });
    if let Some(d) = details {
        error["details"] = d;
    }
    json!({
        "id": id,
        "ok": false,
        "error": error,
    })
}

/// Maps the roster error taxonomy onto stable wire codes.
pub fn roster_err(id: &str, e: &RosterError) -> serde_json::Value {
    let message = e.to_string();
    if e.is_persistence() {
        error!(error = %message, "backing file failure");
    }
    match e {
        RosterError::Record(RecordError::Validation { field, .. }) => err(
            id,
            "validation_failed",
            message,
            Some(json!({ "field": field })),
        ),
        RosterError::Record(RecordError::Conversion { field, .. }) => {
            err(id, "bad_value", message, Some(json!({ "field": field })))
        }
        RosterError::Record(RecordError::UnknownField(field)) => {
            err(id, "unknown_field", message, Some(json!({ "field": field })))
        }
        RosterError::DuplicateId(student_id) => err(
            id,
            "duplicate_id",
            message,
            Some(json!({ "studentId": student_id })),
        ),
        RosterError::NotFound(student_id) => err(
            id,
            "not_found",
            "student not found",
            Some(json!({ "studentId": student_id })),
        ),
        RosterError::Io { path, .. }
        | RosterError::Json { path, .. }
        | RosterError::Corrupt { path, .. } => err(
            id,
            "persistence_failed",
            message,
            Some(json!({ "path": path.to_string_lossy() })),
        ),
    }
}

pub fn record_err(id: &str, e: RecordError) -> serde_json::Value {
    roster_err(id, &RosterError::from(e))
}
