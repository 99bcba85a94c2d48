//! Backend request log.
//!
//! Every request the HTTP transport makes is appended as one JSON line,
//! successful or not. `oven history` reads it back to show which endpoints
//! are slow or failing.
//!
//! Log file: `~/.oven/events.jsonl`

use std::fs::{self, OpenOptions, create_dir_all};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cluster::DashboardError;

// ---------------------------------------------------------------------------
// Event entry
// ---------------------------------------------------------------------------

/// One backend request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestEvent {
    pub timestamp: DateTime<Utc>,
    /// First path segment: `bake`, `checkcluster`, `pull`, `terminate`.
    pub endpoint: String,
    pub path: String,
    /// `"ok"` or `"error"`.
    pub outcome: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub error_kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub error: Option<String>,
    pub latency_ms: u64,
}

impl RequestEvent {
    pub fn new(path: &str, error: Option<&DashboardError>, latency_ms: u64) -> Self {
        Self {
            timestamp: Utc::now(),
            endpoint: endpoint_of(path).to_string(),
            path: path.to_string(),
            outcome: if error.is_some() { "error" } else { "ok" }.to_string(),
            error_kind: error.map(|e| e.kind().to_string()),
            error: error.map(ToString::to_string),
            latency_ms,
        }
    }

    pub fn is_error(&self) -> bool {
        self.outcome == "error"
    }
}

/// The endpoint name of a backend path (`/pull/tweets` → `pull`).
pub fn endpoint_of(path: &str) -> &str {
    match path.trim_start_matches('/').split('/').next() {
        Some("") | None => "root",
        Some(segment) => segment,
    }
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

/// Record a request. Best-effort; failures are silently ignored.
pub fn log_request(path: &str, error: Option<&DashboardError>, latency_ms: u64) {
    let event = RequestEvent::new(path, error, latency_ms);
    if let Some(log) = events_log_path() {
        let _ = append_event(&log, &event);
    }
}

fn append_event(log: &Path, event: &RequestEvent) -> anyhow::Result<()> {
    if let Some(parent) = log.parent() {
        create_dir_all(parent)?;
    }

    let mut file = OpenOptions::new().create(true).append(true).open(log)?;
    let json = serde_json::to_string(event)?;
    writeln!(file, "{json}")?;

    Ok(())
}

// ---------------------------------------------------------------------------
// Reading
// ---------------------------------------------------------------------------

/// Read every logged request, skipping malformed lines.
pub fn read_all_events() -> Vec<RequestEvent> {
    events_log_path()
        .map(|p| read_events_from(&p))
        .unwrap_or_default()
}

fn read_events_from(log: &Path) -> Vec<RequestEvent> {
    let Ok(file) = fs::File::open(log) else {
        return Vec::new();
    };

    BufReader::new(file)
        .lines()
        .map_while(Result::ok)
        .filter_map(|line| serde_json::from_str::<RequestEvent>(&line).ok())
        .collect()
}

/// Read requests from the last `days` days, or all of them for `None`.
pub fn read_events_since_days(days: Option<u32>) -> Vec<RequestEvent> {
    let events = read_all_events();

    let Some(days) = days else {
        return events;
    };

    let cutoff = Utc::now() - chrono::Duration::days(i64::from(days));
    events_since(events, cutoff)
}

fn events_since(events: Vec<RequestEvent>, cutoff: DateTime<Utc>) -> Vec<RequestEvent> {
    events
        .into_iter()
        .filter(|e| e.timestamp >= cutoff)
        .collect()
}

/// Return the path to the request log.
pub fn events_log_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".oven").join("events.jsonl"))
}
