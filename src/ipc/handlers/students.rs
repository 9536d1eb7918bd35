use crate::ipc::error::{err, ok, record_err, roster_err};
use crate::ipc::helpers::{optional_str, parse_filter, required_str};
use crate::ipc::types::{AppState, Request};
use crate::student::StudentPatch;
use serde_json::json;

fn handle_students_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(&req.id, json!({ "students": state.roster.list_all() }))
}

fn handle_students_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    let student_id = match required_str(req, "studentId") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    // Absent ids are not an error here; the UI renders an empty selection.
    ok(
        &req.id,
        json!({ "student": state.roster.find_by_id(student_id) }),
    )
}

fn handle_students_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(data) = req.params.get("student").and_then(|v| v.as_object()) else {
        return err(&req.id, "bad_params", "missing/invalid student", None);
    };

    match state.roster.add(data.clone()) {
        Ok(student) => ok(&req.id, json!({ "student": student.to_serializable() })),
        Err(e) => roster_err(&req.id, &e),
    }
}

fn handle_students_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let student_id = match required_str(req, "studentId") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let Some(raw_patch) = req.params.get("patch").and_then(|v| v.as_object()) else {
        return err(&req.id, "bad_params", "missing/invalid patch", None);
    };
    let patch = match StudentPatch::from_map(raw_patch) {
        Ok(p) => p,
        Err(e) => return record_err(&req.id, e),
    };

    match state.roster.update(student_id, &patch) {
        Ok(student) => ok(&req.id, json!({ "student": student.to_serializable() })),
        Err(e) => roster_err(&req.id, &e),
    }
}

fn handle_students_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let student_id = match required_str(req, "studentId") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match state.roster.delete(student_id) {
        Ok(deleted) => ok(&req.id, json!({ "deleted": deleted })),
        Err(e) => roster_err(&req.id, &e),
    }
}

fn handle_students_search(state: &mut AppState, req: &Request) -> serde_json::Value {
    let query = match optional_str(req, "query") {
        Ok(v) => v.unwrap_or(""),
        Err(resp) => return resp,
    };
    ok(&req.id, json!({ "students": state.roster.search(query) }))
}

fn handle_students_filter(state: &mut AppState, req: &Request) -> serde_json::Value {
    let filter = match parse_filter(req) {
        Ok(f) => f,
        Err(resp) => return resp,
    };
    ok(&req.id, json!({ "students": state.roster.filter(&filter) }))
}

fn handle_students_query(state: &mut AppState, req: &Request) -> serde_json::Value {
    let query = match optional_str(req, "query") {
        Ok(v) => v.unwrap_or(""),
        Err(resp) => return resp,
    };
    let filter = match parse_filter(req) {
        Ok(f) => f,
        Err(resp) => return resp,
    };
    ok(
        &req.id,
        json!({ "students": state.roster.query(query, &filter) }),
    )
}

fn handle_students_stats(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(&req.id, json!(state.roster.stats()))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "students.list" => Some(handle_students_list(state, req)),
        "students.get" => Some(handle_students_get(state, req)),
        "students.create" => Some(handle_students_create(state, req)),
        "students.update" => Some(handle_students_update(state, req)),
        "students.delete" => Some(handle_students_delete(state, req)),
        "students.search" => Some(handle_students_search(state, req)),
        "students.filter" => Some(handle_students_filter(state, req)),
        "students.query" => Some(handle_students_query(state, req)),
        "students.stats" => Some(handle_students_stats(state, req)),
        _ => None,
    }
}
