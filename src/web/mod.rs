//! Embedded web dashboard for oven.
//!
//! Serves the control panel page and a small JSON API over `tiny_http`.
//! One thread runs everything: the loop fires due session timers, then
//! waits for the next HTTP request no longer than the time left until the
//! next tick. Requests and timer ticks therefore never overlap, and the
//! session needs no locking.
//!
//! Launched via `oven serve` (default: `http://127.0.0.1:12341`).

mod api;
mod frontend;

use std::io::{Cursor, Read};
use std::time::Duration;

use anyhow::{Context, Result};
use tiny_http::{Header, Method, Request, Response, Server, StatusCode};

use crate::cluster::{HttpTransport, Transport};
use crate::config::OvenConfig;
use crate::session::clock::{Clock, SystemClock};
use crate::session::{Dashboard, SessionSettings};

/// Longest wait for a request while no timer is scheduled.
const IDLE_WAIT: Duration = Duration::from_millis(500);

type HttpResponse = Response<Cursor<Vec<u8>>>;

// ---------------------------------------------------------------------------
// Server entry point
// ---------------------------------------------------------------------------

/// Start the dashboard server. Blocks the current thread.
pub fn serve(config: &OvenConfig, open_browser: bool) -> Result<()> {
    let addr = config.web.addr.as_str();
    let server = Server::http(addr)
        .map_err(|e| anyhow::anyhow!("failed to start HTTP server on {addr}: {e}"))?;

    println!("oven dashboard running at http://{addr}");
    println!("backend: {}", config.backend.url);
    println!("Press Ctrl+C to stop.\n");

    if open_browser {
        let _ = open_in_browser(&format!("http://{addr}"));
    }

    let transport = HttpTransport::from_config(&config.backend, config.logging.enabled);
    let mut dashboard = Dashboard::new(
        transport,
        SystemClock::new(),
        SessionSettings::from_config(config),
    );

    loop {
        dashboard.run_due();
        // The page reads whole regions; queued changes are only for the
        // terminal driver.
        dashboard.display_mut().take_pending();

        let wait = dashboard
            .time_until_next()
            .map_or(IDLE_WAIT, |d| d.min(IDLE_WAIT));
        if let Some(request) = server
            .recv_timeout(wait)
            .context("failed receiving dashboard request")?
        {
            handle(&mut dashboard, config, request);
        }
    }
}

/// Answer one request. Handler errors become a JSON 500; the loop goes on.
fn handle<T: Transport, C: Clock>(
    dashboard: &mut Dashboard<T, C>,
    config: &OvenConfig,
    mut request: Request,
) {
    let method = request.method().clone();
    let url = request.url().to_string();

    let body = if matches!(method, Method::Post | Method::Put) {
        let mut buf = String::new();
        let _ = request.as_reader().read_to_string(&mut buf);
        Some(buf)
    } else {
        None
    };

    let response = dispatch(dashboard, config, &method, &url, body.as_deref())
        .unwrap_or_else(|e| json_error(500, &e.to_string()));
    let status = response.status_code().0;
    let _ = request.respond(response);

    println!(
        "{} {} {} {}",
        chrono::Local::now().format("%H:%M:%S"),
        method,
        url,
        status
    );
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Route a request to its handler.
fn dispatch<T: Transport, C: Clock>(
    dashboard: &mut Dashboard<T, C>,
    config: &OvenConfig,
    method: &Method,
    url: &str,
    body: Option<&str>,
) -> Result<HttpResponse> {
    let path = url.split('?').next().unwrap_or(url);

    match (method, path) {
        (&Method::Get, "/") | (&Method::Get, "/index.html") => Ok(serve_frontend()),

        (&Method::Get, "/api/regions") => api::get_regions(dashboard),
        (&Method::Post, p) if p.starts_with("/api/controls/") => {
            let element_id = &p["/api/controls/".len()..];
            api::post_control(dashboard, element_id, body.unwrap_or(""))
        }
        (&Method::Get, "/api/health") => api::get_health(config),

        _ => Ok(json_error(404, "not found")),
    }
}

// ---------------------------------------------------------------------------
// Response helpers
// ---------------------------------------------------------------------------

fn serve_frontend() -> HttpResponse {
    Response::from_data(frontend::INDEX_HTML.as_bytes().to_vec())
        .with_header(header("Content-Type", "text/html; charset=utf-8"))
        .with_status_code(StatusCode(200))
}

/// JSON error body with the given status.
pub(crate) fn json_error(status: u16, message: &str) -> HttpResponse {
    let body = serde_json::json!({ "error": message }).to_string();
    Response::from_data(body.into_bytes())
        .with_header(content_type_json())
        .with_status_code(StatusCode(status))
}

pub(crate) fn content_type_json() -> Header {
    header("Content-Type", "application/json; charset=utf-8")
}

fn header(name: &str, value: &str) -> Header {
    // Both halves are static ASCII, which tiny_http always accepts.
    Header::from_bytes(name.as_bytes(), value.as_bytes())
        .unwrap_or_else(|_| unreachable!("static header {name}: {value}"))
}

/// Attempt to open a URL in the system default browser.
fn open_in_browser(url: &str) -> Result<()> {
    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("cmd")
            .args(["/C", "start", url])
            .spawn()
            .context("failed to open browser")?;
    }

    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open")
            .arg(url)
            .spawn()
            .context("failed to open browser")?;
    }

    #[cfg(target_os = "linux")]
    {
        std::process::Command::new("xdg-open")
            .arg(url)
            .spawn()
            .context("failed to open browser")?;
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::DashboardError;
    use crate::session::clock::ManualClock;

    struct Offline;

    impl Transport for Offline {
        fn get(&self, path: &str) -> Result<String, DashboardError> {
            Err(DashboardError::request_failed(path, "offline"))
        }
    }

    fn dashboard() -> Dashboard<Offline, ManualClock> {
        Dashboard::new(Offline, ManualClock::new(), SessionSettings::default())
    }

    #[test]
    fn index_serves_html() {
        let mut dash = dashboard();
        let config = OvenConfig::default();
        let resp = dispatch(&mut dash, &config, &Method::Get, "/", None).unwrap();
        assert_eq!(resp.status_code(), StatusCode(200));
    }

    #[test]
    fn unknown_route_is_404() {
        let mut dash = dashboard();
        let config = OvenConfig::default();
        let resp = dispatch(&mut dash, &config, &Method::Get, "/nope", None).unwrap();
        assert_eq!(resp.status_code(), StatusCode(404));
        let resp = dispatch(&mut dash, &config, &Method::Get, "/api/controls/bake", None).unwrap();
        assert_eq!(resp.status_code(), StatusCode(404));
    }

    #[test]
    fn control_route_reaches_session() {
        let mut dash = dashboard();
        let config = OvenConfig::default();
        let resp = dispatch(
            &mut dash,
            &config,
            &Method::Post,
            "/api/controls/already-baking-check",
            Some(r#"{"value": "j-77"}"#),
        )
        .unwrap();
        assert_eq!(resp.status_code(), StatusCode(200));
        assert_eq!(dash.polled_cluster().map(|c| c.as_str()), Some("j-77"));
    }
}
