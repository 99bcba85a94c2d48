//! JSON API handlers for the web dashboard.

use std::collections::BTreeMap;
use std::io::Cursor;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tiny_http::{Response, StatusCode};

use crate::cluster::Transport;
use crate::config::OvenConfig;
use crate::session::clock::Clock;
use crate::session::display::Region;
use crate::session::{Dashboard, SessionSummary};
use crate::ui::Control;
use crate::utils::health;

use super::{content_type_json, json_error};

// ---------------------------------------------------------------------------
// JSON bodies
// ---------------------------------------------------------------------------

/// Snapshot of every region plus the session state.
#[derive(Serialize)]
struct RegionsResponse {
    /// Rendered HTML per region, keyed by element id.
    regions: BTreeMap<&'static str, String>,
    session: SessionSummary,
}

/// Body of a control click. `value` is the content of the control's text
/// input, when it has one.
#[derive(Debug, Default, Deserialize)]
struct ControlRequest {
    #[serde(default)]
    value: Option<String>,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn json_response<T: Serialize>(data: &T) -> Result<Response<Cursor<Vec<u8>>>> {
    let body = serde_json::to_string(data).context("failed to serialize JSON response")?;
    Ok(Response::from_data(body.into_bytes())
        .with_header(content_type_json())
        .with_status_code(StatusCode(200)))
}

fn regions_snapshot<T: Transport, C: Clock>(dashboard: &Dashboard<T, C>) -> RegionsResponse {
    let display = dashboard.display();
    RegionsResponse {
        regions: Region::ALL
            .into_iter()
            .map(|r| (r.element_id(), display.render_html(r)))
            .collect(),
        session: dashboard.summary(),
    }
}

fn parse_control_request(body: &str) -> Result<ControlRequest, serde_json::Error> {
    if body.trim().is_empty() {
        return Ok(ControlRequest::default());
    }
    serde_json::from_str(body)
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// `GET /api/regions`: current contents of every output region.
pub fn get_regions<T: Transport, C: Clock>(
    dashboard: &Dashboard<T, C>,
) -> Result<Response<Cursor<Vec<u8>>>> {
    json_response(&regions_snapshot(dashboard))
}

/// `POST /api/controls/{element-id}`: click a control.
///
/// Expects an optional JSON body `{ "value": "j-XXXX" }` carrying the
/// control's input. Answers with the region snapshot after the click.
pub fn post_control<T: Transport, C: Clock>(
    dashboard: &mut Dashboard<T, C>,
    element_id: &str,
    body: &str,
) -> Result<Response<Cursor<Vec<u8>>>> {
    let Some(control) = Control::from_element_id(element_id) else {
        return Ok(json_error(404, &format!("unknown control: {element_id}")));
    };

    let request = match parse_control_request(body) {
        Ok(request) => request,
        Err(e) => return Ok(json_error(400, &format!("invalid control request: {e}"))),
    };

    dashboard.dispatch(control.bind(request.value.as_deref()));
    json_response(&regions_snapshot(dashboard))
}

/// `GET /api/health`: backend reachability and local file status.
pub fn get_health(config: &OvenConfig) -> Result<Response<Cursor<Vec<u8>>>> {
    json_response(&health::check(config))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
