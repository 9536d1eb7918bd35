use crate::backup;
use crate::ipc::error::{err, ok, roster_err};
use crate::ipc::helpers::required_str;
use crate::ipc::types::{AppState, Request};
use crate::paths::sibling;
use crate::roster::Roster;
use serde_json::json;
use std::path::PathBuf;
use tracing::info;

fn handle_export_bundle(state: &mut AppState, req: &Request) -> serde_json::Value {
    let out_path = match required_str(req, "outPath") {
        Ok(v) => PathBuf::from(v),
        Err(resp) => return resp,
    };

    match backup::export_roster_bundle(state.roster.path(), &out_path) {
        Ok(summary) => {
            info!(out = %out_path.display(), records = summary.record_count, "bundle exported");
            ok(
                &req.id,
                json!({
                    "bundleFormat": summary.bundle_format,
                    "entryCount": summary.entry_count,
                    "recordCount": summary.record_count
                }),
            )
        }
        Err(e) => err(&req.id, "backup_failed", format!("{e:#}"), None),
    }
}

/// Restores into a staging file, checks it opens as a valid roster, and only
/// then replaces the live backing file.
fn handle_import_bundle(state: &mut AppState, req: &Request) -> serde_json::Value {
    let in_path = match required_str(req, "inPath") {
        Ok(v) => PathBuf::from(v),
        Err(resp) => return resp,
    };
    let data_file = state.roster.path().to_path_buf();
    let staged = sibling(&data_file, ".restore");

    let summary = match backup::import_roster_bundle(&in_path, &staged) {
        Ok(s) => s,
        Err(e) => {
            let _ = std::fs::remove_file(&staged);
            return err(&req.id, "backup_failed", format!("{e:#}"), None);
        }
    };
    if let Err(e) = Roster::open(&staged) {
        let _ = std::fs::remove_file(&staged);
        return roster_err(&req.id, &e);
    }
    if let Err(e) = std::fs::rename(&staged, &data_file) {
        let _ = std::fs::remove_file(&staged);
        return err(
            &req.id,
            "backup_failed",
            format!("failed to replace {}: {e}", data_file.to_string_lossy()),
            None,
        );
    }
    if let Err(e) = state.roster.reload() {
        return roster_err(&req.id, &e);
    }

    info!(
        from = %in_path.display(),
        records = summary.record_count,
        "bundle imported"
    );
    ok(
        &req.id,
        json!({
            "bundleFormatDetected": summary.bundle_format_detected,
            "count": state.roster.len()
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "backup.exportBundle" => Some(handle_export_bundle(state, req)),
        "backup.importBundle" => Some(handle_import_bundle(state, req)),
        _ => None,
    }
}
