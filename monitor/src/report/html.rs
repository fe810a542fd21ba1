//! HTMLレポート
//!
//! マークアップは`templates/report.html`に置き、minijinjaの自動エスケープで値を埋め込む。

use super::{Report, ReportSummary};
use crate::error::ReportError;
use minijinja::Environment;
use serde::Serialize;

const TEMPLATE_NAME: &str = "report.html";
const TEMPLATE: &str = include_str!("templates/report.html");

#[derive(Serialize)]
struct HtmlRow<'a> {
    name: &'a str,
    method: &'a str,
    status: &'static str,
    status_code: String,
    response_time: String,
    error: Option<&'a str>,
}

#[derive(Serialize)]
struct HtmlContext<'a> {
    timestamp: String,
    summary: &'a ReportSummary,
    rows: Vec<HtmlRow<'a>>,
}

fn context(report: &Report) -> HtmlContext<'_> {
    let rows = report
        .endpoints
        .iter()
        .map(|row| HtmlRow {
            name: &row.name,
            method: &row.method,
            status: row.status.as_str(),
            status_code: row
                .status_code
                .map(|c| c.to_string())
                .unwrap_or_else(|| "-".to_string()),
            response_time: row
                .response_time_seconds
                .map(|rt| format!("{:.3}s", rt))
                .unwrap_or_else(|| "-".to_string()),
            error: row.error.as_deref(),
        })
        .collect();

    HtmlContext {
        timestamp: report.timestamp(),
        summary: &report.summary,
        rows,
    }
}

pub(super) fn render(report: &Report) -> Result<String, ReportError> {
    // `.html`で終わるテンプレート名にはHTMLエスケープが自動適用される
    let mut env = Environment::new();
    env.add_template(TEMPLATE_NAME, TEMPLATE)?;
    let html = env.get_template(TEMPLATE_NAME)?.render(context(report))?;
    Ok(html)
}
