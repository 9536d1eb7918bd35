use crate::ipc::error::{err, ok, roster_err};
use crate::ipc::helpers::required_str;
use crate::ipc::types::{AppState, Request};
use crate::roster::Roster;
use serde_json::json;
use std::path::PathBuf;
use tracing::info;

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "dataPath": state.roster.path().to_string_lossy(),
            "loggedIn": state.user.is_some()
        }),
    )
}

/// Switches to another backing file. The current roster stays active if the
/// new one cannot be opened.
fn handle_roster_open(state: &mut AppState, req: &Request) -> serde_json::Value {
    let path = match required_str(req, "path") {
        Ok(v) => PathBuf::from(v.trim()),
        Err(resp) => return resp,
    };
    if path.as_os_str().is_empty() {
        return err(&req.id, "bad_params", "path must not be empty", None);
    }

    match Roster::open(&path) {
        Ok(roster) => {
            info!(path = %path.display(), "switched roster file");
            state.roster = roster;
            ok(
                &req.id,
                json!({
                    "dataPath": state.roster.path().to_string_lossy(),
                    "count": state.roster.len()
                }),
            )
        }
        Err(e) => roster_err(&req.id, &e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        "roster.open" => Some(handle_roster_open(state, req)),
        _ => None,
    }
}
