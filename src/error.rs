use std::fmt::{Display, Formatter};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("storage failure at {}: {source}", .path.display())]
    Storage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("corrupt report {}: {source}", .path.display())]
    CorruptReport {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("incomplete report for metric {metric}: {reason}")]
    IncompleteReport {
        metric: String,
        reason: IncompleteReason,
    },
    #[error("invalid report timestamp: {0}")]
    InvalidTimestamp(String),
    #[error("audit runner failed: {0}")]
    AuditRunner(String),
}

impl ReportError {
    pub fn storage(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Storage {
            path: path.into(),
            source,
        }
    }

    pub fn incomplete(metric: impl Into<String>, reason: IncompleteReason) -> Self {
        Self::IncompleteReport {
            metric: metric.into(),
            reason,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum IncompleteReason {
    MissingFromPrevious,
    MissingFromCurrent,
    ZeroBaseline,
}

impl Display for IncompleteReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Self::MissingFromPrevious => "not measured in the baseline report",
            Self::MissingFromCurrent => "not measured in the current report",
            Self::ZeroBaseline => "baseline value is zero, percentage change is undefined",
        };
        write!(f, "{text}")
    }
}

pub type Result<T> = std::result::Result<T, ReportError>;
