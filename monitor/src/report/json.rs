use super::Report;
use crate::error::ReportError;

pub(super) fn render(report: &Report) -> Result<String, ReportError> {
    Ok(serde_json::to_string_pretty(report)?)
}
