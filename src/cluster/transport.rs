/// HTTP transport for the cluster backend.
///
/// [`Transport`] is the seam between the session and the network: the
/// session only ever asks for "the body at this path". [`HttpTransport`]
/// implements it with the synchronous `ureq` client; tests substitute a
/// scripted fake.
///
/// Every request made through [`HttpTransport`] is recorded in the event
/// log (`~/.oven/events.jsonl`) when logging is enabled.
use std::io;
use std::time::{Duration, Instant};

use crate::analytics::events;
use crate::config::schema::BackendConfig;

use super::error::DashboardError;

/// Fetches response bodies from the backend.
pub trait Transport {
    /// Issue `GET {base}{path}` and return the body on a 2xx answer.
    fn get(&self, path: &str) -> Result<String, DashboardError>;
}

// ---------------------------------------------------------------------------
// ureq-backed transport
// ---------------------------------------------------------------------------

/// Synchronous HTTP transport.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    base_url: String,
    timeout: Duration,
    log_events: bool,
}

impl HttpTransport {
    /// Build a transport from the resolved backend config.
    pub fn from_config(config: &BackendConfig, log_events: bool) -> Self {
        Self::new(&config.url, Duration::from_millis(config.request_timeout_ms))
            .with_event_log(log_events)
    }

    pub fn new(base_url: &str, timeout: Duration) -> Self {
        let base_url = pin_localhost_ipv4(base_url.trim_end_matches('/'));
        Self {
            base_url,
            timeout,
            log_events: false,
        }
    }

    pub fn with_event_log(mut self, enabled: bool) -> Self {
        self.log_events = enabled;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn timeout_ms(&self) -> u64 {
        self.timeout.as_millis() as u64
    }

    fn fetch(&self, path: &str) -> Result<String, DashboardError> {
        let url = format!("{}{}", self.base_url, path);

        let resp = ureq::get(&url)
            .timeout(self.timeout)
            .call()
            .map_err(|e| self.classify(path, e))?;

        resp.into_string().map_err(|e| {
            if is_timeout_io(&e) {
                DashboardError::timeout(path, self.timeout_ms())
            } else {
                DashboardError::malformed(path, format!("unreadable body: {e}"))
            }
        })
    }

    fn classify(&self, path: &str, err: ureq::Error) -> DashboardError {
        match err {
            ureq::Error::Status(code, resp) => DashboardError::request_failed(
                path,
                format!("HTTP {code} {}", resp.status_text()),
            ),
            ureq::Error::Transport(transport) => {
                if transport_timed_out(&transport) {
                    DashboardError::timeout(path, self.timeout_ms())
                } else {
                    DashboardError::request_failed(path, transport.to_string())
                }
            }
        }
    }
}

impl Transport for HttpTransport {
    fn get(&self, path: &str) -> Result<String, DashboardError> {
        let start = Instant::now();
        let result = self.fetch(path);

        if self.log_events {
            let latency_ms = start.elapsed().as_millis() as u64;
            events::log_request(path, result.as_ref().err(), latency_ms);
        }

        result
    }
}

/// Rewrite a `localhost` host to `127.0.0.1`. "localhost" may resolve to
/// ::1 first and stall when the backend only binds IPv4. Hosts that merely
/// start with "localhost" are left alone.
fn pin_localhost_ipv4(url: &str) -> String {
    const HOST: &str = "://localhost";
    if let Some(idx) = url.find(HOST) {
        let rest = &url[idx + HOST.len()..];
        if rest.is_empty() || rest.starts_with([':', '/']) {
            return format!("{}://127.0.0.1{rest}", &url[..idx]);
        }
    }
    url.to_string()
}

/// Walk the source chain of a transport error looking for an I/O timeout.
fn transport_timed_out(transport: &ureq::Transport) -> bool {
    let mut source = std::error::Error::source(transport);
    while let Some(err) = source {
        if let Some(io_err) = err.downcast_ref::<io::Error>()
            && is_timeout_io(io_err)
        {
            return true;
        }
        source = err.source();
    }
    transport.to_string().contains("timed out")
}

fn is_timeout_io(err: &io::Error) -> bool {
    matches!(err.kind(), io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
