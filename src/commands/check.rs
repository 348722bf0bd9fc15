use crate::domain::models::{FileReport, Finding, Level};
use crate::services::output::print_one;
use crate::services::{report, rules, storage};
use std::path::Path;

pub fn handle_validate(json: bool, file: &str, strict: bool) -> anyhow::Result<i32> {
    let raw = storage::read_document(Path::new(file))?;
    let findings = rules::validate_document(&raw);
    let file_report = FileReport::new(file.to_string(), findings, strict);
    let valid = file_report.valid;
    print_one(json, file_report, |r| report::render_file_text(r))?;
    Ok(if valid { 0 } else { 1 })
}

pub fn handle_lint(json: bool, dir: &str, strict: bool) -> anyhow::Result<i32> {
    let files = storage::walk_yaml_files(Path::new(dir))?;
    let mut reports = Vec::new();
    for path in files {
        let display = path.display().to_string();
        // a file that cannot be read is recorded against that file only
        let findings = match storage::read_document(&path) {
            Ok(raw) => rules::validate_document(&raw),
            Err(err) => vec![Finding {
                level: Level::Error,
                code: "P001".to_string(),
                message: format!("cannot read file: {}", err),
                field: None,
            }],
        };
        reports.push(FileReport::new(display, findings, strict));
    }
    let run = report::run_report(reports);
    let valid = run.summary.valid;
    print_one(json, run, |r| report::render_run_text(r))?;
    Ok(if valid { 0 } else { 1 })
}
