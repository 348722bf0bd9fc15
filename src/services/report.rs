use crate::domain::models::{FileReport, RunReport, RunSummary};

/// Render one file's findings as tab-separated lines plus a verdict.
pub fn render_file_text(report: &FileReport) -> String {
    let mut out = String::new();
    for finding in &report.findings {
        out.push_str(&format!(
            "{}\t{}\t{}",
            finding.level, finding.code, finding.message
        ));
        if let Some(field) = &finding.field {
            out.push_str(&format!("\t({})", field));
        }
        out.push('\n');
    }
    out.push_str(&format!(
        "{}: {} ({} errors, {} warnings, {} info)",
        report.file,
        if report.valid { "valid" } else { "invalid" },
        report.errors,
        report.warnings,
        report.infos
    ));
    out
}

pub fn summarize(reports: &[FileReport]) -> RunSummary {
    RunSummary {
        files: reports.len(),
        failed: reports.iter().filter(|r| !r.valid).count(),
        errors: reports.iter().map(|r| r.errors).sum(),
        warnings: reports.iter().map(|r| r.warnings).sum(),
        valid: reports.iter().all(|r| r.valid),
    }
}

pub fn run_report(reports: Vec<FileReport>) -> RunReport {
    let summary = summarize(&reports);
    RunReport { reports, summary }
}

/// Render a whole run: every file block, then one unambiguous summary line.
pub fn render_run_text(run: &RunReport) -> String {
    let mut out = String::new();
    for report in &run.reports {
        out.push_str(&render_file_text(report));
        out.push('\n');
    }
    out.push_str(&format!(
        "checked {} file(s): {} failed, {} errors, {} warnings",
        run.summary.files, run.summary.failed, run.summary.errors, run.summary.warnings
    ));
    out
}
