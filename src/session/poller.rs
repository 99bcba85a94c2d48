//! Status poll step: decide what a single status report means.

use crate::cluster::{ClusterStatus, DashboardError};

use super::display::Tone;

/// Alternating color for consecutive "still starting" reports.
///
/// Starts at red and flips before each use, so the first report shows blue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorToggle(Tone);

impl ColorToggle {
    pub fn new() -> Self {
        Self(Tone::Red)
    }

    pub fn current(self) -> Tone {
        self.0
    }

    /// Flip and return the new color.
    pub fn flip(&mut self) -> Tone {
        self.0 = match self.0 {
            Tone::Red => Tone::Blue,
            _ => Tone::Red,
        };
        self.0
    }
}

impl Default for ColorToggle {
    fn default() -> Self {
        Self::new()
    }
}

/// Outcome of one status poll.
#[derive(Debug, Clone, PartialEq)]
pub enum PollStep {
    /// The cluster is up: stop polling, start pulling.
    Ready,
    /// Still starting; show the raw payload in the given color.
    Baking { payload: String, tone: Tone },
    /// The request failed; keep polling.
    Failed(DashboardError),
}

/// Classify a status response. Only "still starting" reports flip the color.
pub fn next_step(
    result: Result<ClusterStatus, DashboardError>,
    color: &mut ColorToggle,
) -> PollStep {
    match result {
        Ok(status) if status.is_ready() => PollStep::Ready,
        Ok(status) => PollStep::Baking {
            payload: status.raw.to_string(),
            tone: color.flip(),
        },
        Err(e) => PollStep::Failed(e),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn status(raw: serde_json::Value) -> ClusterStatus {
        let state = raw
            .get("status")
            .and_then(|s| s.as_str())
            .map(str::to_string);
        ClusterStatus { state, raw }
    }

    #[test]
    fn toggle_starts_red_and_alternates() {
        let mut color = ColorToggle::new();
        assert_eq!(color.current(), Tone::Red);
        let seq: Vec<Tone> = (0..4).map(|_| color.flip()).collect();
        assert_eq!(seq, [Tone::Blue, Tone::Red, Tone::Blue, Tone::Red]);
    }

    #[test]
    fn ready_does_not_flip_color() {
        let mut color = ColorToggle::new();
        let step = next_step(Ok(status(json!({"status": "WAITING"}))), &mut color);
        assert_eq!(step, PollStep::Ready);
        assert_eq!(color.current(), Tone::Red);
    }

    #[test]
    fn baking_reports_compact_payload() {
        let mut color = ColorToggle::new();
        let step = next_step(
            Ok(status(json!({"name": "oven", "status": "STARTING"}))),
            &mut color,
        );
        assert_eq!(
            step,
            PollStep::Baking {
                payload: r#"{"name":"oven","status":"STARTING"}"#.to_string(),
                tone: Tone::Blue,
            }
        );
    }

    #[test]
    fn failures_leave_color_alone() {
        let mut color = ColorToggle::new();
        let err = DashboardError::timeout("/checkcluster/j-1", 10);
        let step = next_step(Err(err.clone()), &mut color);
        assert_eq!(step, PollStep::Failed(err));
        assert_eq!(color.current(), Tone::Red);
    }
}
