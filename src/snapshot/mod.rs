pub mod baseline;
pub mod store;

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::audit::AuditResult;

pub use baseline::select_baseline;
pub use store::ReportStore;

pub const REPORT_EXTENSION: &str = "json";

pub fn timestamp_to_key(fetch_time: &str) -> String {
    fetch_time.replace(':', "_")
}

pub fn key_to_timestamp(key: &str) -> String {
    key.replace('_', ":")
}

pub fn parse_key(key: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&key_to_timestamp(key))
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SnapshotRef {
    pub key: String,
    pub timestamp: DateTime<Utc>,
    pub location: PathBuf,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub key: String,
    pub timestamp: DateTime<Utc>,
    pub report: AuditResult,
}

impl Snapshot {
    pub fn from_report(report: AuditResult) -> crate::error::Result<Self> {
        let timestamp = report.captured_at()?;
        Ok(Self {
            key: timestamp_to_key(&report.fetch_time),
            timestamp,
            report,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_round_trips_through_timestamp() {
        let fetch_time = "2024-03-01T10:15:30.250Z";
        let key = timestamp_to_key(fetch_time);
        assert_eq!(key, "2024-03-01T10_15_30.250Z");
        assert_eq!(key_to_timestamp(&key), fetch_time);
        assert_eq!(
            parse_key(&key).map(|ts| ts.to_rfc3339()),
            Some("2024-03-01T10:15:30.250+00:00".to_string())
        );
    }

    #[test]
    fn offsets_survive_the_key_mapping() {
        let key = timestamp_to_key("2024-03-01T12:15:30+02:00");
        assert_eq!(key, "2024-03-01T12_15_30+02_00");
        let parsed = parse_key(&key).expect("valid key");
        assert_eq!(parsed.to_rfc3339(), "2024-03-01T10:15:30+00:00");
    }

    #[test]
    fn foreign_names_do_not_parse() {
        assert!(parse_key("notes").is_none());
        assert!(parse_key("2024-13-01T00_00_00Z").is_none());
    }
}
