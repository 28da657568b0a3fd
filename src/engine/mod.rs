pub mod observer;

use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;

use crate::audit::{extract_overall, AuditResult, OverallReport, TrackedMetrics};
use crate::compare::{diff_reports, summarize, DiffResult, Direction};
use crate::error::{ReportError, Result};
use crate::snapshot::{select_baseline, ReportStore, Snapshot, SnapshotRef};

pub use observer::{RecordingObserver, ReportEvent, ReportObserver, TracingObserver};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportOutcome {
    pub overall_report: OverallReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compared_report: Option<DiffResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub baseline: Option<SnapshotRef>,
    pub storage_location: PathBuf,
}

impl ReportOutcome {
    pub fn compared_summary(&self) -> Option<Vec<String>> {
        self.compared_report.as_deref().map(summarize)
    }
}

pub struct ReportEngine {
    store: ReportStore,
    metrics: TrackedMetrics,
    observer: Arc<dyn ReportObserver>,
}

impl ReportEngine {
    pub fn new(store: ReportStore, metrics: TrackedMetrics) -> Self {
        Self::with_observer(store, metrics, Arc::new(TracingObserver))
    }

    pub fn with_observer(
        store: ReportStore,
        metrics: TrackedMetrics,
        observer: Arc<dyn ReportObserver>,
    ) -> Self {
        Self {
            store,
            metrics,
            observer,
        }
    }

    pub fn store(&self) -> &ReportStore {
        &self.store
    }

    pub fn metrics(&self) -> &TrackedMetrics {
        &self.metrics
    }

    /// Records a completed audit and compares it with the previous capture.
    ///
    /// Storage failures abort the run. Comparison failures are reported to the
    /// observer and leave `compared_report` empty.
    pub fn run(&self, audit: AuditResult) -> Result<ReportOutcome> {
        let snapshot = Snapshot::from_report(audit)?;
        let key = snapshot.key.clone();
        self.emit(ReportEvent::Started {
            key: key.clone(),
            tracked: self.metrics.len(),
        });

        if let Err(err) = self.store.ensure_ready() {
            return Err(self.fail(&key, err));
        }

        let overall_report = extract_overall(&snapshot.report, &self.metrics);
        let (compared_report, baseline) = self.compare_with_baseline(&snapshot);

        let storage_location = match self.store.save(&snapshot) {
            Ok(location) => location,
            Err(err) => return Err(self.fail(&key, err)),
        };
        self.emit(ReportEvent::Persisted {
            key,
            location: storage_location.clone(),
        });

        Ok(ReportOutcome {
            overall_report,
            compared_report,
            baseline,
            storage_location,
        })
    }

    pub fn compare(&self, previous: &AuditResult, current: &AuditResult) -> Result<DiffResult> {
        diff_reports(previous, current, &self.metrics)
    }

    fn compare_with_baseline(
        &self,
        current: &Snapshot,
    ) -> (Option<DiffResult>, Option<SnapshotRef>) {
        let key = current.key.clone();
        let (baseline, previous) = match select_baseline(&self.store, Some(current.timestamp)) {
            Ok(Some(found)) => found,
            Ok(None) => {
                self.emit(ReportEvent::NoBaseline { key });
                return (None, None);
            }
            Err(err) => {
                self.emit(ReportEvent::ComparisonFailed {
                    key,
                    error: err.to_string(),
                });
                return (None, None);
            }
        };

        self.emit(ReportEvent::BaselineSelected {
            key: key.clone(),
            baseline: baseline.key.clone(),
        });

        match self.compare(&previous, &current.report) {
            Ok(entries) => {
                self.emit(ReportEvent::DiffComputed {
                    key,
                    baseline: baseline.key.clone(),
                    entries: entries.len(),
                    slower: entries
                        .iter()
                        .filter(|e| e.direction == Direction::Slower)
                        .count(),
                });
                (Some(entries), Some(baseline))
            }
            Err(err) => {
                self.emit(ReportEvent::ComparisonFailed {
                    key,
                    error: err.to_string(),
                });
                (None, Some(baseline))
            }
        }
    }

    fn fail(&self, key: &str, err: ReportError) -> ReportError {
        self.emit(ReportEvent::Failed {
            key: key.to_string(),
            error: err.to_string(),
        });
        err
    }

    fn emit(&self, event: ReportEvent) {
        self.observer.notify(&event);
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use serde_json::json;
    use tempfile::TempDir;

    use super::*;

    fn audit(fetch_time: &str, interactive: f64, speed_index: Option<f64>) -> AuditResult {
        let mut audits = json!({
            "interactive": { "title": "Time to Interactive", "numericValue": interactive }
        });
        if let Some(value) = speed_index {
            audits["speed-index"] = json!({ "title": "Speed Index", "numericValue": value });
        }
        AuditResult::from_value(json!({ "fetchTime": fetch_time, "audits": audits }))
            .expect("parse audit")
    }

    fn engine(dir: &std::path::Path) -> (ReportEngine, Arc<RecordingObserver>) {
        let observer = Arc::new(RecordingObserver::default());
        let engine = ReportEngine::with_observer(
            ReportStore::new(dir),
            TrackedMetrics::new(["interactive"]),
            observer.clone(),
        );
        (engine, observer)
    }

    #[test]
    fn first_capture_has_no_comparison() {
        let tmp = TempDir::new().expect("tempdir");
        let (engine, observer) = engine(&tmp.path().join("report"));

        let outcome = engine
            .run(audit("2024-03-01T10:00:00.000Z", 2000.0, None))
            .expect("run");
        assert!(outcome.compared_report.is_none());
        assert!(outcome.compared_summary().is_none());
        assert!(outcome.storage_location.is_file());
        assert_eq!(outcome.overall_report.get("interactive"), Some(2000.0));

        let events = observer.events();
        assert!(matches!(events[0], ReportEvent::Started { .. }));
        assert!(matches!(events[1], ReportEvent::NoBaseline { .. }));
        assert!(matches!(events[2], ReportEvent::Persisted { .. }));
    }

    #[test]
    fn second_capture_is_compared_with_the_first() {
        let tmp = TempDir::new().expect("tempdir");
        let (engine, observer) = engine(tmp.path());

        engine
            .run(audit("2024-03-01T10:00:00.000Z", 2000.0, None))
            .expect("first run");
        let outcome = engine
            .run(audit("2024-03-02T10:00:00.000Z", 2500.0, None))
            .expect("second run");

        let diff = outcome.compared_report.as_ref().expect("diff");
        assert_eq!(diff[0].percentage_change, 25.0);
        assert_eq!(diff[0].direction, Direction::Slower);
        assert_eq!(
            outcome.compared_summary(),
            Some(vec!["Time to Interactive is 25% slower".to_string()])
        );
        let baseline = outcome.baseline.as_ref().expect("baseline");
        assert_eq!(baseline.key, "2024-03-01T10_00_00.000Z");
        assert_eq!(
            baseline.location,
            engine.store().list_all().expect("list")[0].location
        );
        assert!(observer
            .events()
            .iter()
            .any(|e| matches!(e, ReportEvent::DiffComputed { slower: 1, .. })));
    }

    #[test]
    fn comparison_failure_still_persists() {
        let tmp = TempDir::new().expect("tempdir");
        let observer = Arc::new(RecordingObserver::default());
        let engine = ReportEngine::with_observer(
            ReportStore::new(tmp.path()),
            TrackedMetrics::new(["interactive", "speed-index"]),
            observer.clone(),
        );

        engine
            .run(audit("2024-03-01T10:00:00.000Z", 2000.0, None))
            .expect("first run");
        let outcome = engine
            .run(audit("2024-03-02T10:00:00.000Z", 2500.0, Some(1200.0)))
            .expect("second run");

        assert!(outcome.compared_report.is_none());
        assert!(outcome.baseline.is_some());
        assert!(outcome.storage_location.is_file());
        assert_eq!(engine.store().list_all().expect("list").len(), 2);
        assert!(observer
            .events()
            .iter()
            .any(|e| matches!(e, ReportEvent::ComparisonFailed { .. })));
    }

    #[test]
    fn corrupt_baseline_degrades_to_no_comparison() {
        let tmp = TempDir::new().expect("tempdir");
        let (engine, _) = engine(tmp.path());
        engine.store().ensure_ready().expect("ready");
        fs::write(
            engine.store().location_for("2024-03-01T10_00_00.000Z"),
            "not json",
        )
        .expect("write corrupt");

        let outcome = engine
            .run(audit("2024-03-02T10:00:00.000Z", 2500.0, None))
            .expect("run");
        assert!(outcome.compared_report.is_none());
        assert!(outcome.storage_location.is_file());
    }

    #[test]
    fn storage_failure_is_fatal() {
        let tmp = TempDir::new().expect("tempdir");
        let blocker = tmp.path().join("report");
        fs::write(&blocker, "a file where the directory should be").expect("write");
        let (engine, observer) = engine(&blocker);

        let err = engine
            .run(audit("2024-03-02T10:00:00.000Z", 2500.0, None))
            .unwrap_err();
        assert!(matches!(err, ReportError::Storage { .. }));
        assert!(observer
            .events()
            .iter()
            .any(|e| matches!(e, ReportEvent::Failed { .. })));
    }

    #[test]
    fn save_failure_after_diff_is_fatal() {
        let tmp = TempDir::new().expect("tempdir");
        let (engine, observer) = engine(tmp.path());
        engine
            .run(audit("2024-03-01T10:00:00.000Z", 2000.0, None))
            .expect("first run");
        fs::create_dir(engine.store().location_for("2024-03-02T10_00_00.000Z"))
            .expect("block target file");

        let err = engine
            .run(audit("2024-03-02T10:00:00.000Z", 2500.0, None))
            .unwrap_err();
        assert!(matches!(err, ReportError::Storage { .. }));

        let events = observer.events();
        let diffed = events
            .iter()
            .position(|e| matches!(e, ReportEvent::DiffComputed { .. }))
            .expect("diff computed");
        let failed = events
            .iter()
            .position(|e| matches!(e, ReportEvent::Failed { .. }))
            .expect("failure reported");
        assert!(diffed < failed);
        assert!(!events
            .iter()
            .skip(diffed)
            .any(|e| matches!(e, ReportEvent::Persisted { .. })));
    }

    #[test]
    fn invalid_timestamp_is_rejected_before_writing() {
        let tmp = TempDir::new().expect("tempdir");
        let (engine, _) = engine(tmp.path());
        let err = engine.run(audit("not-a-time", 1.0, None)).unwrap_err();
        assert!(matches!(err, ReportError::InvalidTimestamp(_)));
        assert!(engine.store().list_all().expect("list").is_empty());
    }

    #[test]
    fn serializes_with_response_field_names() {
        let tmp = TempDir::new().expect("tempdir");
        let (engine, _) = engine(tmp.path());
        let outcome = engine
            .run(audit("2024-03-01T10:00:00.000Z", 2000.0, None))
            .expect("run");
        let value = serde_json::to_value(&outcome).expect("serialize");
        assert_eq!(value["overallReport"]["interactive"], json!(2000.0));
        assert!(value.get("comparedReport").is_none());
        assert!(value["storageLocation"].is_string());
    }
}
