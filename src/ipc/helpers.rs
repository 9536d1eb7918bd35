use crate::ipc::error::err;
use crate::ipc::types::Request;
use crate::roster::StudentFilter;

/// Reads a required string param; the `Err` is a ready-made error response.
pub fn required_str<'a>(req: &'a Request, key: &str) -> Result<&'a str, serde_json::Value> {
    req.params
        .get(key)
        .and_then(|v| v.as_str())
        .ok_or_else(|| err(&req.id, "bad_params", format!("missing {key}"), None))
}

pub fn optional_str<'a>(req: &'a Request, key: &str) -> Result<Option<&'a str>, serde_json::Value> {
    match req.params.get(key) {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(v) => v.as_str().map(Some).ok_or_else(|| {
            err(
                &req.id,
                "bad_params",
                format!("{key} must be a string"),
                None,
            )
        }),
    }
}

fn optional_i64(req: &Request, key: &str) -> Result<Option<i64>, serde_json::Value> {
    match req.params.get(key) {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(v) => v.as_i64().map(Some).ok_or_else(|| {
            err(
                &req.id,
                "bad_params",
                format!("{key} must be an integer"),
                None,
            )
        }),
    }
}

fn optional_f64(req: &Request, key: &str) -> Result<Option<f64>, serde_json::Value> {
    match req.params.get(key) {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(v) => v.as_f64().map(Some).ok_or_else(|| {
            err(
                &req.id,
                "bad_params",
                format!("{key} must be a number"),
                None,
            )
        }),
    }
}

pub fn parse_filter(req: &Request) -> Result<StudentFilter, serde_json::Value> {
    Ok(StudentFilter {
        min_age: optional_i64(req, "minAge")?,
        max_age: optional_i64(req, "maxAge")?,
        min_gpa: optional_f64(req, "minGpa")?,
        max_gpa: optional_f64(req, "maxGpa")?,
        grade: optional_str(req, "grade")?.map(str::to_string),
    })
}
