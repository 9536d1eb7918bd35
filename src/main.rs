mod auth;
mod backup;
mod error;
mod ipc;
mod paths;
mod roster;
mod student;

use anyhow::Context;
use clap::Parser;
use serde_json::json;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Student roster sidecar: one JSON request per stdin line, one JSON
/// response per stdout line.
#[derive(Debug, Parser)]
#[command(name = "rosterd", version)]
struct Args {
    /// Backing JSON file; created (with its directory) when missing.
    #[arg(long, default_value = roster::DEFAULT_DATA_PATH)]
    data: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // stdout carries the protocol, so logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let roster = roster::Roster::open(&args.data)
        .with_context(|| format!("failed to open roster {}", args.data.to_string_lossy()))?;
    if roster.is_empty() {
        info!("roster is empty");
    }
    let mut state = ipc::AppState { roster, user: None };
    info!(version = env!("CARGO_PKG_VERSION"), "rosterd ready");

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(v) => v,
            Err(_) => break,
        };
        if line.trim().is_empty() {
            continue;
        }

        let req: ipc::Request = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                // Can't reply without id.
                let resp = json!({
                    "ok": false,
                    "error": { "code": "bad_json", "message": e.to_string() }
                });
                let _ = writeln!(stdout, "{}", resp);
                let _ = stdout.flush();
                continue;
            }
        };

        let resp = ipc::handle_request(&mut state, req);
        let _ = writeln!(
            stdout,
            "{}",
            serde_json::to_string(&resp).unwrap_or_else(|_| "{\"ok\":false}".to_string())
        );
        let _ = stdout.flush();
    }

    info!("stdin closed, exiting");
    Ok(())
}
