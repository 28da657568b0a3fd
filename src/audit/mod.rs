pub mod extract;

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::value::RawValue;
use serde_json::Value;

use crate::error::{ReportError, Result};

pub use extract::{extract_overall, OverallReport};

pub const DEFAULT_TRACKED_METRICS: [&str; 9] = [
    "first-contentful-paint",
    "first-meaningful-paint",
    "speed-index",
    "estimated-input-latency",
    "total-blocking-time",
    "max-potential-fid",
    "time-to-first-byte",
    "first-cpu-idle",
    "interactive",
];

/// A completed audit as emitted by the browser audit tool.
///
/// Only `fetchTime` and `audits` are interpreted. The body is kept verbatim
/// and is what gets serialized and persisted.
#[derive(Debug, Clone)]
pub struct AuditResult {
    pub fetch_time: String,
    pub audits: BTreeMap<String, AuditEntry>,
    raw: Box<RawValue>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct AuditEntry {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(rename = "numericValue", default)]
    pub numeric_value: Option<f64>,
}

#[derive(Deserialize)]
struct AuditFields {
    #[serde(rename = "fetchTime")]
    fetch_time: String,
    #[serde(default)]
    audits: BTreeMap<String, AuditEntry>,
}

impl AuditResult {
    pub fn from_json(raw: &str) -> Result<Self> {
        Self::parse(raw.to_string()).map_err(|e| ReportError::AuditRunner(e.to_string()))
    }

    pub fn from_value(value: Value) -> Result<Self> {
        Self::parse(value.to_string()).map_err(|e| ReportError::AuditRunner(e.to_string()))
    }

    pub(crate) fn parse(raw: String) -> serde_json::Result<Self> {
        let raw = RawValue::from_string(raw)?;
        let fields: AuditFields = serde_json::from_str(raw.get())?;
        Ok(Self {
            fetch_time: fields.fetch_time,
            audits: fields.audits,
            raw,
        })
    }

    pub fn raw_json(&self) -> &str {
        self.raw.get()
    }

    pub fn captured_at(&self) -> Result<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.fetch_time)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| ReportError::InvalidTimestamp(format!("{}: {e}", self.fetch_time)))
    }

    pub fn numeric(&self, key: &str) -> Option<f64> {
        self.audits.get(key).and_then(|entry| entry.numeric_value)
    }

    pub fn title(&self, key: &str) -> Option<&str> {
        self.audits
            .get(key)
            .and_then(|entry| entry.title.as_deref())
            .filter(|title| !title.trim().is_empty())
    }
}

impl PartialEq for AuditResult {
    fn eq(&self, other: &Self) -> bool {
        self.raw.get() == other.raw.get()
    }
}

impl Serialize for AuditResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.raw.serialize(serializer)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedMetrics(Vec<String>);

impl TrackedMetrics {
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut out: Vec<String> = Vec::new();
        for key in keys {
            let key = key.into().trim().to_string();
            if key.is_empty() || out.contains(&key) {
                continue;
            }
            out.push(key);
        }
        Self(out)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.iter().any(|k| k == key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for TrackedMetrics {
    fn default() -> Self {
        Self::new(DEFAULT_TRACKED_METRICS)
    }
}
