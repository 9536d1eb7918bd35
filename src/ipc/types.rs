use serde::Deserialize;

use crate::roster::Roster;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

pub struct AppState {
    pub roster: Roster,
    /// Logged-in username; roster methods are refused while this is `None`.
    pub user: Option<String>,
}
