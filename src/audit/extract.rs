use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use tracing::debug;

use crate::audit::{AuditResult, TrackedMetrics};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OverallReport {
    values: Vec<(String, f64)>,
}

impl OverallReport {
    pub fn get(&self, key: &str) -> Option<f64> {
        self.values
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, value)| *value)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.values.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl Serialize for OverallReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (key, value) in &self.values {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

pub fn extract_overall(result: &AuditResult, metrics: &TrackedMetrics) -> OverallReport {
    let values = metrics
        .iter()
        .filter_map(|key| result.numeric(key).map(|value| (key.to_string(), value)))
        .collect::<Vec<_>>();
    debug!(
        tracked = metrics.len(),
        extracted = values.len(),
        "extracted overall report"
    );
    OverallReport { values }
}
