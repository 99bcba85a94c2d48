//! Request history: per-endpoint aggregation of the request log.

use std::collections::HashMap;

use chrono::SecondsFormat;

use crate::analytics::events::{self, RequestEvent};

/// Summary for `oven history`.
#[derive(Debug, Default)]
pub struct History {
    pub total_requests: usize,
    pub total_failures: usize,
    pub endpoints: Vec<EndpointStat>,
}

/// Aggregated figures for one endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct EndpointStat {
    pub endpoint: String,
    pub requests: usize,
    pub failures: usize,
    pub timeouts: usize,
    pub avg_latency_ms: f64,
    pub max_latency_ms: u64,
    /// Timestamp of the most recent request.
    pub last_seen: String,
}

impl EndpointStat {
    pub fn failure_pct(&self) -> f64 {
        if self.requests == 0 {
            0.0
        } else {
            (self.failures as f64 / self.requests as f64) * 100.0
        }
    }
}

/// Compute history from the log, optionally limited to the last `days`.
pub fn compute_history(days: Option<u32>) -> History {
    let events = events::read_events_since_days(days);
    build_history(&events)
}

/// Aggregate events per endpoint, busiest endpoint first.
pub fn build_history(events: &[RequestEvent]) -> History {
    let mut groups: HashMap<&str, Vec<&RequestEvent>> = HashMap::new();
    for event in events {
        groups.entry(event.endpoint.as_str()).or_default().push(event);
    }

    let mut endpoints: Vec<EndpointStat> = groups
        .into_iter()
        .map(|(endpoint, group)| {
            let requests = group.len();
            let total_latency: u64 = group.iter().map(|e| e.latency_ms).sum();
            EndpointStat {
                endpoint: endpoint.to_string(),
                requests,
                failures: group.iter().filter(|e| e.is_error()).count(),
                timeouts: group
                    .iter()
                    .filter(|e| e.error_kind.as_deref() == Some("timeout"))
                    .count(),
                avg_latency_ms: total_latency as f64 / requests as f64,
                max_latency_ms: group.iter().map(|e| e.latency_ms).max().unwrap_or(0),
                last_seen: group
                    .iter()
                    .map(|e| e.timestamp)
                    .max()
                    .map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true))
                    .unwrap_or_default(),
            }
        })
        .collect();

    endpoints.sort_by(|a, b| {
        b.requests
            .cmp(&a.requests)
            .then_with(|| a.endpoint.cmp(&b.endpoint))
    });

    History {
        total_requests: events.len(),
        total_failures: events.iter().filter(|e| e.is_error()).count(),
        endpoints,
    }
}
