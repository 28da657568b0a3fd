use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::audit::AuditResult;
use crate::error::{ReportError, Result};
use crate::snapshot::{parse_key, Snapshot, SnapshotRef, REPORT_EXTENSION};

#[derive(Debug, Clone)]
pub struct ReportStore {
    dir: PathBuf,
}

impl ReportStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn ensure_ready(&self) -> Result<()> {
        fs::create_dir_all(&self.dir).map_err(|e| ReportError::storage(&self.dir, e))
    }

    pub fn location_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.{REPORT_EXTENSION}"))
    }

    pub fn save(&self, snapshot: &Snapshot) -> Result<PathBuf> {
        let location = self.location_for(&snapshot.key);
        fs::write(&location, snapshot.report.raw_json())
            .map_err(|e| ReportError::storage(&location, e))?;
        debug!(location = %location.display(), "report written");
        Ok(location)
    }

    pub fn list_all(&self) -> Result<Vec<SnapshotRef>> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(ReportError::storage(&self.dir, e)),
        };

        let mut out = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| ReportError::storage(&self.dir, e))?;
            let path = entry.path();
            if !path.is_file()
                || path.extension().and_then(|ext| ext.to_str()) != Some(REPORT_EXTENSION)
            {
                continue;
            }
            let Some(key) = path.file_stem().and_then(|stem| stem.to_str()) else {
                continue;
            };
            let Some(timestamp) = parse_key(key) else {
                warn!(file = %path.display(), "skipping report with unparseable name");
                continue;
            };
            out.push(SnapshotRef {
                key: key.to_string(),
                timestamp,
                location: path.clone(),
            });
        }
        out.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then_with(|| a.key.cmp(&b.key)));
        Ok(out)
    }

    pub fn load(&self, location: &Path) -> Result<AuditResult> {
        let data = fs::read_to_string(location).map_err(|e| ReportError::storage(location, e))?;
        AuditResult::parse(data).map_err(|source| ReportError::CorruptReport {
            path: location.to_path_buf(),
            source,
        })
    }

    pub fn load_key(&self, key: &str) -> Result<Option<AuditResult>> {
        let location = self.location_for(key);
        if !location.is_file() {
            return Ok(None);
        }
        self.load(&location).map(Some)
    }

    pub fn latest(&self) -> Result<Option<(SnapshotRef, AuditResult)>> {
        let Some(newest) = self.list_all()?.pop() else {
            return Ok(None);
        };
        let report = self.load(&newest.location)?;
        Ok(Some((newest, report)))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};
    use tempfile::TempDir;

    use super::*;

    fn ready_store(tmp: &TempDir) -> ReportStore {
        let store = ReportStore::new(tmp.path());
        store.ensure_ready().expect("ensure ready");
        store
    }

    fn snapshot(fetch_time: &str, interactive: f64) -> Snapshot {
        let report = AuditResult::from_value(json!({
            "fetchTime": fetch_time,
            "finalUrl": "https://example.org/",
            "audits": {
                "interactive": {
                    "title": "Time to Interactive",
                    "numericValue": interactive,
                    "displayValue": "2.0 s"
                }
            }
        }))
        .expect("parse audit");
        Snapshot::from_report(report).expect("snapshot")
    }

    #[test]
    fn ensure_ready_is_idempotent() {
        let tmp = TempDir::new().expect("tempdir");
        let store = ReportStore::new(tmp.path().join("nested").join("report"));
        store.ensure_ready().expect("first");
        store.ensure_ready().expect("second");
        assert!(store.dir().is_dir());
    }

    #[test]
    fn save_then_load_returns_same_report() {
        let tmp = TempDir::new().expect("tempdir");
        let store = ready_store(&tmp);
        let snap = snapshot("2024-03-01T10:15:30.000Z", 2000.5);

        let location = store.save(&snap).expect("save");
        assert_eq!(
            location.file_name().and_then(|n| n.to_str()),
            Some("2024-03-01T10_15_30.000Z.json")
        );
        let loaded = store.load(&location).expect("load");
        assert_eq!(loaded, snap.report);
        assert_eq!(
            store.load_key(&snap.key).expect("load by key"),
            Some(snap.report.clone())
        );
        assert_eq!(store.load_key("2020-01-01T00_00_00Z").expect("missing"), None);
    }

    #[test]
    fn saved_file_is_the_received_body() {
        let tmp = TempDir::new().expect("tempdir");
        let store = ready_store(&tmp);
        let raw = json!({
            "fetchTime": "2024-03-01T10:15:30.000Z",
            "audits": {
                "total-blocking-time": { "title": "Total Blocking Time", "numericValue": 0 },
                "interactive": { "title": "Time to Interactive", "numericValue": 2000 },
                "viewport": { "score": 1 }
            }
        });
        let body = raw.to_string();
        let report = AuditResult::from_json(&body).expect("parse audit");

        let location = store
            .save(&Snapshot::from_report(report).expect("snapshot"))
            .expect("save");
        let written = fs::read_to_string(&location).expect("read back");
        assert_eq!(written, body);
        let on_disk: Value = serde_json::from_str(&written).expect("json on disk");
        assert_eq!(on_disk, raw);
    }

    #[test]
    fn list_skips_foreign_files_and_sorts_by_time() {
        let tmp = TempDir::new().expect("tempdir");
        let store = ready_store(&tmp);
        store
            .save(&snapshot("2024-03-02T08:00:00.000Z", 1.0))
            .expect("save");
        store
            .save(&snapshot("2024-03-01T08:00:00.000Z", 1.0))
            .expect("save");
        fs::write(tmp.path().join("notes.json"), "{}").expect("write foreign");
        fs::write(tmp.path().join("2024-03-03T08_00_00Z.txt"), "{}").expect("write foreign");
        fs::create_dir(tmp.path().join("2024-03-04T08_00_00Z.json")).expect("create dir");

        let listed = store.list_all().expect("list");
        let keys = listed.iter().map(|s| s.key.as_str()).collect::<Vec<_>>();
        assert_eq!(
            keys,
            vec!["2024-03-01T08_00_00.000Z", "2024-03-02T08_00_00.000Z"]
        );
    }

    #[test]
    fn missing_directory_lists_nothing() {
        let tmp = TempDir::new().expect("tempdir");
        let store = ReportStore::new(tmp.path().join("absent"));
        assert!(store.list_all().expect("list").is_empty());
        assert!(store.latest().expect("latest").is_none());
    }

    #[test]
    fn corrupt_file_is_reported() {
        let tmp = TempDir::new().expect("tempdir");
        let store = ready_store(&tmp);
        let path = store.location_for("2024-03-01T08_00_00Z");
        fs::write(&path, "{ not json").expect("write corrupt");
        let err = store.load(&path).unwrap_err();
        assert!(matches!(err, ReportError::CorruptReport { .. }));
    }

    #[test]
    fn save_into_missing_directory_fails_with_storage_error() {
        let tmp = TempDir::new().expect("tempdir");
        let store = ReportStore::new(tmp.path().join("never-created"));
        let err = store
            .save(&snapshot("2024-03-01T10:15:30.000Z", 1.0))
            .unwrap_err();
        assert!(matches!(err, ReportError::Storage { .. }));
    }

    #[test]
    fn same_timestamp_overwrites() {
        let tmp = TempDir::new().expect("tempdir");
        let store = ready_store(&tmp);
        store
            .save(&snapshot("2024-03-01T10:15:30.000Z", 1.0))
            .expect("save");
        let location = store
            .save(&snapshot("2024-03-01T10:15:30.000Z", 2.0))
            .expect("save");
        assert_eq!(store.list_all().expect("list").len(), 1);
        assert_eq!(
            store.load(&location).expect("load").numeric("interactive"),
            Some(2.0)
        );
    }
}
