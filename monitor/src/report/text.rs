use super::Report;
use std::fmt::Write;

pub(super) fn render(report: &Report) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Ollama Monitor Report");
    let _ = writeln!(out, "=====================");
    let _ = writeln!(out, "Generated: {}", report.timestamp());
    let _ = writeln!(
        out,
        "Endpoints: {} total, {} successful, {} failed",
        report.summary.total_endpoints, report.summary.successful, report.summary.failed
    );
    out.push('\n');

    for row in &report.endpoints {
        let _ = writeln!(out, "{} ({} {}):", row.name, row.method, row.path);
        let _ = writeln!(out, "  Status: {}", row.status.as_str());
        if let Some(code) = row.status_code {
            let _ = writeln!(out, "  Status Code: {}", code);
        }
        if let Some(rt) = row.response_time_seconds {
            let _ = writeln!(out, "  Response Time: {:.2} seconds", rt);
        }
        if let Some(error) = &row.error {
            let _ = writeln!(out, "  Error: {}", error);
        }
        if row.attempts > 1 {
            let _ = writeln!(out, "  Attempts: {}", row.attempts);
        }
        out.push('\n');
    }
    out
}
