use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Append one audit event to the local JSONL trail. Best-effort: auditing
/// never fails the command that triggered it.
pub fn audit(action: &str, data: serde_json::Value) {
    let home = match std::env::var("HOME") {
        Ok(h) => h,
        Err(_) => return,
    };
    let path = PathBuf::from(home).join(".config/ecogov/audit.jsonl");
    if let Some(parent) = path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    let event = serde_json::json!({
        "ts": chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
        "action": action,
        "data": data
    });
    let line = format!("{}\n", event);
    let _ = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .and_then(|mut f| std::io::Write::write_all(&mut f, line.as_bytes()));
}

pub fn read_document(path: &Path) -> anyhow::Result<String> {
    if !path.exists() {
        anyhow::bail!("no such file: {}", path.display());
    }
    Ok(std::fs::read_to_string(path)?)
}

pub fn write_document(path: &Path, text: &str) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, text)?;
    Ok(())
}

/// Collect every YAML file under `dir`, in lexicographic path order so that
/// repeated runs over an unchanged tree report findings in the same order.
pub fn walk_yaml_files(dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        anyhow::bail!("no such directory: {}", dir.display());
    }
    let mut files = Vec::new();
    for entry in WalkDir::new(dir) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let ext = entry
            .path()
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        if ext == "yaml" || ext == "yml" {
            files.push(entry.path().to_path_buf());
        }
    }
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::walk_yaml_files;
    use std::fs;

    #[test]
    fn walk_is_lexicographic_and_yaml_only() {
        let tmp = tempfile::TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("b")).unwrap();
        fs::write(tmp.path().join("b/second.yaml"), "---\n").unwrap();
        fs::write(tmp.path().join("a.yml"), "---\n").unwrap();
        fs::write(tmp.path().join("notes.txt"), "skip me").unwrap();

        let files = walk_yaml_files(tmp.path()).unwrap();
        let names: Vec<String> = files
            .iter()
            .map(|p| p.strip_prefix(tmp.path()).unwrap().display().to_string())
            .collect();
        assert_eq!(names, vec!["a.yml", "b/second.yaml"]);

        let again = walk_yaml_files(tmp.path()).unwrap();
        assert_eq!(files, again);
    }

    #[test]
    fn missing_directory_is_an_error() {
        assert!(walk_yaml_files(std::path::Path::new("/definitely/not/here")).is_err());
    }
}
