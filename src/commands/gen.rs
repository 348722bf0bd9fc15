use crate::cli::Target;
use crate::domain::models::{ConvertReport, GenReport, ModuleDescriptor};
use crate::services::generator::{self, GenerateError};
use crate::services::output::{print_err, print_one};
use crate::services::{convert, storage};
use std::path::{Path, PathBuf};

pub fn handle_gen(
    json: bool,
    input: &str,
    target: Option<Target>,
    output: &str,
) -> anyhow::Result<i32> {
    let raw = storage::read_document(Path::new(input))?;
    // YAML is a superset of JSON, so one parse path covers both descriptor forms.
    let descriptor: ModuleDescriptor = match serde_yaml::from_str(&raw) {
        Ok(d) => d,
        Err(err) => {
            let err = GenerateError {
                code: "INVALID_FIELD_TYPE".to_string(),
                field: String::new(),
                message: format!("descriptor does not match the module schema: {}", err),
                suggestions: vec!["check field names and value types against the descriptor schema".to_string()],
            };
            print_generate_error(json, &err)?;
            return Ok(1);
        }
    };

    match generator::generate(&descriptor, target) {
        Err(err) => {
            print_generate_error(json, &err)?;
            Ok(1)
        }
        Ok(bundle) => {
            let path = PathBuf::from(output).join(&bundle.file_name);
            storage::write_document(&path, &bundle.document_text)?;
            storage::audit(
                "gen",
                serde_json::json!({
                    "name": descriptor.name,
                    "target": bundle.target.as_str(),
                    "output": path.display().to_string(),
                    "reference": bundle.reference,
                }),
            );
            let report = GenReport {
                name: descriptor.name.clone(),
                target: bundle.target.as_str().to_string(),
                output_file: path.display().to_string(),
                unique_id: bundle.governance.document_metadata.unique_id.clone(),
                locator: bundle.locator.clone(),
                reference: bundle.reference.clone(),
                notes: bundle.notes.clone(),
            };
            print_one(json, report, |r| {
                let mut line = format!("generated {} -> {}", r.name, r.output_file);
                for note in &r.notes {
                    line.push_str(&format!("\nnote: {}", note));
                }
                line
            })?;
            Ok(0)
        }
    }
}

fn print_generate_error(json: bool, err: &GenerateError) -> anyhow::Result<()> {
    print_err(json, err, |e| {
        let mut out = if e.field.is_empty() {
            format!("error {}: {}", e.code, e.message)
        } else {
            format!("error {} ({}): {}", e.code, e.field, e.message)
        };
        for suggestion in &e.suggestions {
            out.push_str(&format!("\nhint: {}", suggestion));
        }
        out
    })
}

pub fn handle_convert(json: bool, file: &str, output: Option<&str>) -> anyhow::Result<i32> {
    let input_path = Path::new(file);
    let raw = storage::read_document(input_path)?;
    let (plain, stripped) = convert::strip_governance(&raw)?;

    let out_dir = match output {
        Some(dir) => PathBuf::from(dir),
        None => input_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(".")),
    };
    let stem = input_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("document");
    let out_path = out_dir.join(format!("{}.plain.yaml", stem));
    storage::write_document(&out_path, &plain)?;
    storage::audit(
        "convert",
        serde_json::json!({
            "input": file,
            "output": out_path.display().to_string(),
            "stripped": stripped,
        }),
    );

    let report = ConvertReport {
        input_file: file.to_string(),
        output_file: out_path.display().to_string(),
        stripped,
    };
    print_one(json, report, |r| {
        if r.stripped {
            format!("converted {} -> {}", r.input_file, r.output_file)
        } else {
            format!(
                "no governance companion in {}; copied to {}",
                r.input_file, r.output_file
            )
        }
    })?;
    Ok(0)
}
