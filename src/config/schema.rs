/// Configuration schema and defaults for oven.
///
/// Sections: `[backend]`, `[polling]`, `[web]`, `[logging]` and the
/// `[[tables]]` array that decides which tables a pull reads and where each
/// one is shown.
///
/// Every field has a built-in default; files only need the keys they change.
use serde::{Deserialize, Serialize};

use crate::session::display::Region;
use crate::session::puller::TableBinding;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level oven configuration.
///
/// Maps directly to `~/.oven/config.toml` and `.oven.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OvenConfig {
    pub backend: BackendConfig,
    pub polling: PollingConfig,
    pub web: WebConfig,
    pub logging: LoggingConfig,
    pub tables: Vec<TableBinding>,
}

impl Default for OvenConfig {
    fn default() -> Self {
        Self {
            backend: BackendConfig::default(),
            polling: PollingConfig::default(),
            web: WebConfig::default(),
            logging: LoggingConfig::default(),
            tables: default_tables(),
        }
    }
}

/// The two tables the streaming jobs fill: raw tweets and their sentiment.
pub fn default_tables() -> Vec<TableBinding> {
    vec![
        TableBinding::new("tweets", Region::Tweet),
        TableBinding::new("sentiment", Region::Sentiment),
    ]
}

// ---------------------------------------------------------------------------
// [backend]
// ---------------------------------------------------------------------------

/// Where the cluster backend lives and how long to wait for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Base URL; endpoint paths are appended verbatim.
    pub url: String,
    /// Per-request timeout (milliseconds).
    pub request_timeout_ms: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:12340".to_string(),
            request_timeout_ms: 10_000,
        }
    }
}

// ---------------------------------------------------------------------------
// [polling]
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollingConfig {
    /// How often to check on a baking cluster (milliseconds).
    pub check_interval_ms: u64,
    /// How often to pull new records once the cluster is up (milliseconds).
    pub pull_interval_ms: u64,
    /// Number of pull rounds before the pull loop stops itself.
    pub max_pull_count: u32,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            check_interval_ms: 30_000,
            pull_interval_ms: 5_000,
            max_pull_count: 40,
        }
    }
}

// ---------------------------------------------------------------------------
// [web]
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebConfig {
    /// Listen address for `oven serve`.
    pub addr: String,
    /// Open the dashboard in the default browser on start.
    pub open_browser: bool,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1:12341".to_string(),
            open_browser: true,
        }
    }
}

// ---------------------------------------------------------------------------
// [logging]
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Record every backend request in `~/.oven/events.jsonl`.
    pub enabled: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

// ---------------------------------------------------------------------------
// Annotated default file
// ---------------------------------------------------------------------------

impl OvenConfig {
    /// The default config as an annotated TOML document, written by
    /// `oven config init`.
    pub fn default_toml() -> &'static str {
        DEFAULT_TOML
    }

    /// Reject values that would stall or flood the backend. A zero timeout
    /// fails every request at once; a zero interval polls every millisecond.
    pub fn validate(&self) -> anyhow::Result<()> {
        for (key, value) in [
            ("backend.request_timeout_ms", self.backend.request_timeout_ms),
            ("polling.check_interval_ms", self.polling.check_interval_ms),
            ("polling.pull_interval_ms", self.polling.pull_interval_ms),
        ] {
            if value == 0 {
                anyhow::bail!("{key} must be greater than 0");
            }
        }
        Ok(())
    }
}

const DEFAULT_TOML: &str = r#"# oven configuration
#
# Precedence (highest wins): OVEN_* environment variables,
# ./.oven.toml, ~/.oven/config.toml, built-in defaults.

[backend]
# Base URL of the cluster backend.
url = "http://127.0.0.1:12340"
# Give up on a single request after this many milliseconds.
# Timings must be greater than 0.
request_timeout_ms = 10000

[polling]
# Check on a baking cluster every 30 seconds.
check_interval_ms = 30000
# Pull new records every 5 seconds once the cluster is up.
pull_interval_ms = 5000
# Stop pulling after this many rounds.
max_pull_count = 40

[web]
addr = "127.0.0.1:12341"
open_browser = true

[logging]
# Record backend requests in ~/.oven/events.jsonl (see `oven history`).
enabled = true

# Tables to pull, and the dashboard region each one is shown in.
# Regions: bake-report, tweet, sentiment, terminate-report.
[[tables]]
table = "tweets"
region = "tweet"

[[tables]]
table = "sentiment"
region = "sentiment"
"#;

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
