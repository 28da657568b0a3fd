use anyhow::Result;
use serde::Serialize;

use crate::audit::OverallReport;
use crate::compare::DiffEntry;
use crate::engine::ReportOutcome;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportResponse {
    pub message: String,
    pub overall_report: OverallReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compared_report: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comparison: Option<Vec<DiffEntry>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub baseline: Option<String>,
    pub storage_location: String,
}

impl From<ReportOutcome> for ReportResponse {
    fn from(outcome: ReportOutcome) -> Self {
        Self {
            message: "Performance report generated successfully".to_string(),
            compared_report: outcome.compared_summary(),
            baseline: outcome.baseline.map(|b| b.key),
            storage_location: outcome.storage_location.display().to_string(),
            overall_report: outcome.overall_report,
            comparison: outcome.compared_report,
        }
    }
}

pub fn render_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}
