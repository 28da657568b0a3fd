use std::path::PathBuf;
use std::sync::Mutex;

use serde::Serialize;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ReportEvent {
    Started {
        key: String,
        tracked: usize,
    },
    BaselineSelected {
        key: String,
        baseline: String,
    },
    NoBaseline {
        key: String,
    },
    DiffComputed {
        key: String,
        baseline: String,
        entries: usize,
        slower: usize,
    },
    ComparisonFailed {
        key: String,
        error: String,
    },
    Persisted {
        key: String,
        location: PathBuf,
    },
    Failed {
        key: String,
        error: String,
    },
}

pub trait ReportObserver: Send + Sync {
    fn notify(&self, event: &ReportEvent);
}

pub struct TracingObserver;

impl ReportObserver for TracingObserver {
    fn notify(&self, event: &ReportEvent) {
        match event {
            ReportEvent::Started { key, tracked } => {
                info!(key = %key, tracked, "report run started")
            }
            ReportEvent::BaselineSelected { key, baseline } => {
                info!(key = %key, baseline = %baseline, "baseline selected")
            }
            ReportEvent::NoBaseline { key } => {
                info!(key = %key, "no baseline, comparison skipped")
            }
            ReportEvent::DiffComputed {
                key,
                baseline,
                entries,
                slower,
            } => info!(
                key = %key,
                baseline = %baseline,
                entries,
                slower,
                "comparison computed"
            ),
            ReportEvent::ComparisonFailed { key, error } => {
                warn!(key = %key, error = %error, "comparison failed, continuing without diff")
            }
            ReportEvent::Persisted { key, location } => {
                info!(key = %key, location = %location.display(), "report persisted")
            }
            ReportEvent::Failed { key, error } => {
                error!(key = %key, error = %error, "report run failed")
            }
        }
    }
}

#[derive(Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<ReportEvent>>,
}

impl RecordingObserver {
    pub fn events(&self) -> Vec<ReportEvent> {
        self.events
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

impl ReportObserver for RecordingObserver {
    fn notify(&self, event: &ReportEvent) {
        if let Ok(mut guard) = self.events.lock() {
            guard.push(event.clone());
        }
    }
}
