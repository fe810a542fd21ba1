use super::Report;
use crate::error::ReportError;

const HEADER: [&str; 7] = [
    "Endpoint",
    "Method",
    "Status",
    "Status Code",
    "Response Time (s)",
    "Attempts",
    "Error",
];

pub(super) fn render(report: &Report) -> Result<String, ReportError> {
    let mut writer = ::csv::Writer::from_writer(Vec::new());
    writer.write_record(HEADER)?;

    for row in &report.endpoints {
        writer.write_record([
            row.name.clone(),
            row.method.clone(),
            row.status.as_str().to_string(),
            row.status_code
                .map(|c| c.to_string())
                .unwrap_or_else(|| "-".to_string()),
            row.response_time_seconds
                .map(|rt| format!("{:.3}", rt))
                .unwrap_or_else(|| "-".to_string()),
            row.attempts.to_string(),
            row.error.clone().unwrap_or_else(|| "-".to_string()),
        ])?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| ReportError::Csv(e.into_error().into()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
