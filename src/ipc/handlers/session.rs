use crate::auth::{self, LoginError};
use crate::ipc::error::{err, ok};
use crate::ipc::helpers::optional_str;
use crate::ipc::types::{AppState, Request};
use serde_json::json;
use tracing::info;

fn handle_login(state: &mut AppState, req: &Request) -> serde_json::Value {
    let username = match optional_str(req, "username") {
        Ok(v) => v.unwrap_or("").trim(),
        Err(resp) => return resp,
    };
    let password = match optional_str(req, "password") {
        Ok(v) => v.unwrap_or(""),
        Err(resp) => return resp,
    };

    match auth::verify(username, password) {
        Ok(user) => {
            info!(user, "logged in");
            state.user = Some(user.to_string());
            ok(&req.id, json!({ "username": user }))
        }
        Err(LoginError::MissingCredentials) => err(
            &req.id,
            "bad_params",
            "enter both username and password",
            None,
        ),
        Err(LoginError::InvalidCredentials) => err(
            &req.id,
            "invalid_credentials",
            "invalid username or password",
            None,
        ),
    }
}

fn handle_logout(state: &mut AppState, req: &Request) -> serde_json::Value {
    if let Some(user) = state.user.take() {
        info!(user = %user, "logged out");
    }
    ok(&req.id, json!({ "ok": true }))
}

fn handle_status(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "loggedIn": state.user.is_some(),
            "username": state.user
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "session.login" => Some(handle_login(state, req)),
        "session.logout" => Some(handle_logout(state, req)),
        "session.status" => Some(handle_status(state, req)),
        _ => None,
    }
}
