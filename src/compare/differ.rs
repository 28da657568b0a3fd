use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::audit::{AuditResult, TrackedMetrics};
use crate::error::{IncompleteReason, ReportError, Result};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Faster,
    Slower,
    Unchanged,
}

impl Direction {
    pub fn classify(signed_change: f64) -> Self {
        if signed_change > 0.0 {
            Self::Slower
        } else if signed_change < 0.0 {
            Self::Faster
        } else {
            Self::Unchanged
        }
    }
}

impl Display for Direction {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Self::Faster => "faster",
            Self::Slower => "slower",
            Self::Unchanged => "unchanged",
        };
        write!(f, "{text}")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DiffEntry {
    pub metric: String,
    pub title: String,
    pub percentage_change: f64,
    pub direction: Direction,
    pub previous: f64,
    pub current: f64,
}

impl DiffEntry {
    pub fn summary(&self) -> String {
        self.to_string()
    }
}

impl Display for DiffEntry {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.direction {
            Direction::Unchanged => write!(f, "{} is unchanged", self.title),
            direction => write!(
                f,
                "{} is {}% {direction}",
                self.title, self.percentage_change
            ),
        }
    }
}

pub type DiffResult = Vec<DiffEntry>;

pub fn round2(value: f64) -> f64 {
    (value * 100.0 + 0.5).floor() / 100.0
}

pub fn percentage_change(previous: f64, current: f64) -> Option<f64> {
    if previous == 0.0 {
        return None;
    }
    let change = round2(((current - previous) / previous) * 100.0);
    change.is_finite().then_some(change)
}

/// Compares every tracked metric of two audits, in tracked order.
///
/// A metric that either side did not measure, or whose baseline value is
/// zero, fails the whole comparison.
pub fn diff_reports(
    previous: &AuditResult,
    current: &AuditResult,
    metrics: &TrackedMetrics,
) -> Result<DiffResult> {
    let mut entries = Vec::with_capacity(metrics.len());
    for key in metrics.iter() {
        let before = previous
            .numeric(key)
            .ok_or_else(|| ReportError::incomplete(key, IncompleteReason::MissingFromPrevious))?;
        let after = current
            .numeric(key)
            .ok_or_else(|| ReportError::incomplete(key, IncompleteReason::MissingFromCurrent))?;
        let change = percentage_change(before, after)
            .ok_or_else(|| ReportError::incomplete(key, IncompleteReason::ZeroBaseline))?;

        entries.push(DiffEntry {
            metric: key.to_string(),
            title: previous.title(key).unwrap_or(key).to_string(),
            percentage_change: change.abs(),
            direction: Direction::classify(change),
            previous: before,
            current: after,
        });
    }
    Ok(entries)
}

pub fn summarize(entries: &[DiffEntry]) -> Vec<String> {
    entries.iter().map(DiffEntry::summary).collect()
}
