//! Error kinds surfaced by backend requests.
//!
//! Every request made on behalf of the dashboard resolves to either a value
//! or one of these kinds. The session appends them to the region the failed
//! operation writes to, so a failure is never indistinguishable from "still
//! loading".

use thiserror::Error;

/// A failed backend request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DashboardError {
    /// Transport failure or a non-success HTTP status.
    #[error("request to {path} failed: {reason}")]
    RequestFailed { path: String, reason: String },

    /// The backend answered, but not with the shape we expected.
    #[error("malformed response from {path}: {reason}")]
    MalformedResponse { path: String, reason: String },

    /// The request did not complete within the configured timeout.
    #[error("request to {path} timed out after {timeout_ms} ms")]
    Timeout { path: String, timeout_ms: u64 },
}

impl DashboardError {
    pub fn request_failed(path: &str, reason: impl Into<String>) -> Self {
        Self::RequestFailed {
            path: path.to_string(),
            reason: reason.into(),
        }
    }

    pub fn malformed(path: &str, reason: impl Into<String>) -> Self {
        Self::MalformedResponse {
            path: path.to_string(),
            reason: reason.into(),
        }
    }

    pub fn timeout(path: &str, timeout_ms: u64) -> Self {
        Self::Timeout {
            path: path.to_string(),
            timeout_ms,
        }
    }

    /// Stable snake_case name of the kind, used in the event log.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::RequestFailed { .. } => "request_failed",
            Self::MalformedResponse { .. } => "malformed_response",
            Self::Timeout { .. } => "timeout",
        }
    }

    /// The backend path the failed request targeted.
    pub fn path(&self) -> &str {
        match self {
            Self::RequestFailed { path, .. }
            | Self::MalformedResponse { path, .. }
            | Self::Timeout { path, .. } => path,
        }
    }
}
