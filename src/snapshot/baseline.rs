use chrono::{DateTime, Utc};
use tracing::debug;

use crate::audit::AuditResult;
use crate::error::Result;
use crate::snapshot::{ReportStore, SnapshotRef};

pub fn select_baseline(
    store: &ReportStore,
    before: Option<DateTime<Utc>>,
) -> Result<Option<(SnapshotRef, AuditResult)>> {
    let candidates = store.list_all()?;
    let Some(chosen) = candidates
        .into_iter()
        // list_all is sorted by (timestamp, key), so ties go to the greatest key
        .filter(|entry| before.map_or(true, |limit| entry.timestamp < limit))
        .last()
    else {
        debug!("no baseline snapshot available");
        return Ok(None);
    };

    let report = store.load(&chosen.location)?;
    Ok(Some((chosen, report)))
}
