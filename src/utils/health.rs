//! Reachability and local-state checks shared by `oven health` and the
//! dashboard's `/api/health`.

use std::time::Duration;

use serde::Serialize;

use crate::analytics::events;
use crate::cluster::{ClusterApi, HttpTransport};
use crate::config::{self, OvenConfig};

/// Probe timeout. Short, so a dead backend does not stall the caller.
const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub backend_url: String,
    pub backend_reachable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend_error: Option<String>,
    pub config_exists: bool,
    pub log_exists: bool,
    pub logging_enabled: bool,
    pub tables: Vec<String>,
}

/// Run every check against the resolved config.
pub fn check(config: &OvenConfig) -> HealthReport {
    let api = ClusterApi::new(HttpTransport::new(&config.backend.url, PROBE_TIMEOUT));
    let backend_error = api.ping().err().map(|e| e.to_string());

    HealthReport {
        backend_url: config.backend.url.clone(),
        backend_reachable: backend_error.is_none(),
        backend_error,
        config_exists: config::global_config_file().is_some_and(|p| p.exists()),
        log_exists: events::events_log_path().is_some_and(|p| p.exists()),
        logging_enabled: config.logging.enabled,
        tables: config
            .tables
            .iter()
            .map(|b| format!("{} -> #{}", b.table, b.region))
            .collect(),
    }
}
