//! Typed client for the cluster backend.
//!
//! Wraps a [`Transport`] and turns raw bodies from the four backend
//! endpoints into typed values:
//!
//! | Endpoint | Result |
//! |----------|--------|
//! | `/bake` | [`ClusterHandle`] from `Cluster.Id` |
//! | `/checkcluster/{id}` | [`ClusterStatus`] |
//! | `/pull/{table}` | record map in backend order |
//! | `/terminate/{id}` | raw acknowledgement text |

pub mod error;
pub mod transport;

use std::fmt;

use serde_json::{Map, Value};

pub use error::DashboardError;
pub use transport::{HttpTransport, Transport};

/// Cluster states that mean the cluster has finished starting up.
///
/// `RUNNING` may still show stale table data for the first few pulls;
/// `WAITING` means the cluster's jobs have completed.
pub const READY_STATES: [&str; 2] = ["WAITING", "RUNNING"];

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Opaque identifier of a remote cluster. Never validated.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClusterHandle(String);

impl ClusterHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClusterHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A status report for one cluster.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterStatus {
    /// The `status` field, when the payload carried a string one.
    pub state: Option<String>,
    /// The whole payload, shown verbatim while the cluster is starting.
    pub raw: Value,
}

impl ClusterStatus {
    /// Whether the cluster has left the starting phase.
    pub fn is_ready(&self) -> bool {
        self.state
            .as_deref()
            .is_some_and(|s| READY_STATES.contains(&s))
    }
}

/// Records of one table, keyed by record id, in the order the backend sent.
pub type Records = Map<String, Value>;

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Typed wrapper over a backend [`Transport`].
#[derive(Debug, Clone)]
pub struct ClusterApi<T> {
    transport: T,
}

impl<T: Transport> ClusterApi<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// `GET /bake`: request a new cluster.
    pub fn bake(&self) -> Result<ClusterHandle, DashboardError> {
        let path = "/bake";
        let body = self.transport.get(path)?;
        parse_bake(path, &body)
    }

    /// `GET /checkcluster/{id}`: current state of a cluster.
    pub fn check(&self, cluster: &ClusterHandle) -> Result<ClusterStatus, DashboardError> {
        let path = format!("/checkcluster/{cluster}");
        let body = self.transport.get(&path)?;
        parse_status(&path, &body)
    }

    /// `GET /pull/{table}`: every record currently stored in a table.
    pub fn pull(&self, table: &str) -> Result<Records, DashboardError> {
        let path = format!("/pull/{table}");
        let body = self.transport.get(&path)?;
        parse_records(&path, &body)
    }

    /// `GET /terminate/{id}`: ask the backend to shut a cluster down.
    pub fn terminate(&self, cluster: &ClusterHandle) -> Result<String, DashboardError> {
        let path = format!("/terminate/{cluster}");
        self.transport.get(&path)
    }

    /// `GET /`: reachability check used by `oven health`. Any HTTP answer
    /// counts, error statuses included.
    pub fn ping(&self) -> Result<(), DashboardError> {
        match self.transport.get("/") {
            Ok(_) => Ok(()),
            Err(DashboardError::RequestFailed { reason, .. }) if reason.starts_with("HTTP ") => {
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}

// ---------------------------------------------------------------------------
// Body parsing
// ---------------------------------------------------------------------------

fn parse_json(path: &str, body: &str) -> Result<Value, DashboardError> {
    serde_json::from_str(body).map_err(|e| {
        DashboardError::malformed(path, format!("{e}: {}", summarize(body)))
    })
}

/// Extract `Cluster.Id` from a bake response.
pub fn parse_bake(path: &str, body: &str) -> Result<ClusterHandle, DashboardError> {
    let value = parse_json(path, body)?;
    value
        .get("Cluster")
        .and_then(|c| c.get("Id"))
        .and_then(Value::as_str)
        .map(ClusterHandle::new)
        .ok_or_else(|| DashboardError::malformed(path, "missing Cluster.Id"))
}

/// Parse a status report. Any JSON is accepted; only a string `status`
/// field is interpreted.
pub fn parse_status(path: &str, body: &str) -> Result<ClusterStatus, DashboardError> {
    let raw = parse_json(path, body)?;
    let state = raw
        .get("status")
        .and_then(Value::as_str)
        .map(str::to_string);
    Ok(ClusterStatus { state, raw })
}

/// Parse a pull response, which must be a JSON object.
pub fn parse_records(path: &str, body: &str) -> Result<Records, DashboardError> {
    match parse_json(path, body)? {
        Value::Object(map) => Ok(map),
        other => Err(DashboardError::malformed(
            path,
            format!("expected an object of records, got {}", json_kind(&other)),
        )),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn summarize(body: &str) -> String {
    let flat = body.trim().replace(['\r', '\n'], " ");
    match flat.char_indices().nth(80) {
        Some((idx, _)) => format!("{}...", &flat[..idx]),
        None => flat,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bake_extracts_cluster_id() {
        let handle = parse_bake("/bake", r#"{"Cluster": {"Id": "j-2AXXXXXXGAPLF"}}"#).unwrap();
        assert_eq!(handle.as_str(), "j-2AXXXXXXGAPLF");
    }

    #[test]
    fn bake_without_id_is_malformed() {
        // The placeholder backend answers a bare string.
        let err = parse_bake("/bake", r#""hello""#).unwrap_err();
        assert_eq!(err.kind(), "malformed_response");

        let err = parse_bake("/bake", r#"{"Cluster": {}}"#).unwrap_err();
        assert!(err.to_string().contains("Cluster.Id"));
    }

    #[test]
    fn status_ready_only_for_waiting_and_running() {
        for (body, ready) in [
            (r#"{"status":"WAITING"}"#, true),
            (r#"{"status":"RUNNING"}"#, true),
            (r#"{"status":"STARTING"}"#, false),
            (r#"{"status":"PENDING"}"#, false),
            (r#"{"status":"BOOTSTRAPPING"}"#, false),
            (r#"{"status":""}"#, false),
            (r#"{"status":"running"}"#, false),
            (r#"{"name":"oven"}"#, false),
            (r#"{"status":7}"#, false),
            (r#"[1,2]"#, false),
        ] {
            let status = parse_status("/checkcluster/j-1", body).unwrap();
            assert_eq!(status.is_ready(), ready, "body {body}");
        }
    }

    #[test]
    fn status_plain_text_is_malformed() {
        let err = parse_status("/checkcluster/j-1", "No active clusters found").unwrap_err();
        assert!(matches!(err, DashboardError::MalformedResponse { .. }));
        assert!(err.to_string().contains("No active clusters found"));
    }

    #[test]
    fn records_keep_backend_order() {
        let body = r#"{"z": 1, "a": 2, "m": 3}"#;
        let records = parse_records("/pull/t", body).unwrap();
        let keys: Vec<&str> = records.keys().map(String::as_str).collect();
        assert_eq!(keys, ["z", "a", "m"]);
    }

    #[test]
    fn records_must_be_an_object() {
        let err = parse_records("/pull/t", "[1, 2]").unwrap_err();
        assert!(err.to_string().contains("an array"));
    }

    #[test]
    fn summarize_truncates_long_bodies() {
        let long = "x".repeat(200);
        let s = summarize(&long);
        assert_eq!(s.len(), 83);
        assert!(s.ends_with("..."));
    }
}
