//! Data pull helpers: round counting and latest-record selection.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::cluster::Records;

use super::display::Region;

/// A table to pull and the region its records are shown in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableBinding {
    pub table: String,
    pub region: Region,
}

impl TableBinding {
    pub fn new(table: impl Into<String>, region: Region) -> Self {
        Self {
            table: table.into(),
            region,
        }
    }
}

/// Counts pull rounds up to a fixed cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PullCounter {
    count: u32,
    max: u32,
}

impl PullCounter {
    pub fn new(max: u32) -> Self {
        Self { count: 0, max }
    }

    pub fn count(self) -> u32 {
        self.count
    }

    pub fn max(self) -> u32 {
        self.max
    }

    /// Claim the next round. Returns `false` once the cap is reached.
    pub fn begin_round(&mut self) -> bool {
        if self.count >= self.max {
            return false;
        }
        self.count += 1;
        true
    }

    pub fn is_exhausted(self) -> bool {
        self.count >= self.max
    }

    pub fn reset(&mut self) {
        self.count = 0;
    }
}

/// The record the backend lists last.
///
/// The backend offers no timestamp, so "latest" is whatever entry its
/// mapping enumerates last. Key order is kept exactly as received.
pub fn latest_record(records: &Records) -> Option<&Value> {
    records.values().last()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counter_stops_at_cap() {
        let mut counter = PullCounter::new(3);
        assert!(counter.begin_round());
        assert!(counter.begin_round());
        assert!(!counter.is_exhausted());
        assert!(counter.begin_round());
        assert!(counter.is_exhausted());
        assert!(!counter.begin_round());
        assert_eq!(counter.count(), 3);
        counter.reset();
        assert_eq!(counter.count(), 0);
    }

    #[test]
    fn zero_cap_never_runs() {
        let mut counter = PullCounter::new(0);
        assert!(counter.is_exhausted());
        assert!(!counter.begin_round());
    }

    #[test]
    fn latest_is_last_in_backend_order() {
        let records: Records =
            serde_json::from_str(r#"{"900": {"text": "new"}, "100": {"text": "old"}}"#).unwrap();
        assert_eq!(
            latest_record(&records),
            Some(&serde_json::json!({"text": "old"}))
        );
    }

    #[test]
    fn latest_of_empty_is_none() {
        assert!(latest_record(&Records::new()).is_none());
    }

    #[test]
    fn binding_deserializes_region_by_element_id() {
        let binding: TableBinding =
            serde_json::from_str(r#"{"table": "sentiment", "region": "sentiment"}"#).unwrap();
        assert_eq!(binding, TableBinding::new("sentiment", Region::Sentiment));
    }
}
