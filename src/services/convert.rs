use crate::domain::constants;
use crate::services::rules::GOVERNANCE_BLOCKS;
use serde_yaml::Value;

/// Strip the governance companion from a governed document, leaving the plain
/// target payload. Handles all three carriage forms: a trailing governance
/// stream document, a compose `x-governance` stanza, and a commented JSON
/// footer. Returns the stripped text and whether anything was removed.
pub fn strip_governance(raw: &str) -> anyhow::Result<(String, bool)> {
    let mut stripped = false;
    let mut kept = Vec::new();

    for chunk in split_documents(raw) {
        let (body, dropped_comment) = drop_governance_comments(&chunk);
        stripped |= dropped_comment;
        if body.trim().is_empty() {
            continue;
        }

        let Ok(value) = serde_yaml::from_str::<Value>(&body) else {
            kept.push(body);
            continue;
        };

        if GOVERNANCE_BLOCKS.iter().any(|b| value.get(b).is_some()) {
            stripped = true;
            continue;
        }

        if value.get("x-governance").is_some() {
            stripped = true;
            let mut value = value;
            if let Value::Mapping(map) = &mut value {
                map.remove(&Value::String("x-governance".to_string()));
            }
            let comments: String = body
                .lines()
                .take_while(|line| line.trim_start().starts_with('#'))
                .map(|line| format!("{}\n", line))
                .collect();
            kept.push(format!("{}{}", comments, serde_yaml::to_string(&value)?));
            continue;
        }

        kept.push(body);
    }

    let mut out = String::new();
    for chunk in kept {
        out.push_str("---\n");
        out.push_str(&chunk);
    }
    Ok((out, stripped))
}

fn split_documents(raw: &str) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    for line in raw.lines() {
        if line == "---" || line.starts_with("--- ") {
            if !current.trim().is_empty() {
                chunks.push(std::mem::take(&mut current));
            }
            current.clear();
        } else {
            current.push_str(line);
            current.push('\n');
        }
    }
    if !current.trim().is_empty() {
        chunks.push(current);
    }
    chunks
}

fn drop_governance_comments(chunk: &str) -> (String, bool) {
    let mut dropped = false;
    let body: String = chunk
        .lines()
        .filter(|line| {
            let is_footer = line.trim_start().starts_with(constants::GOVERNANCE_COMMENT);
            dropped |= is_footer;
            !is_footer
        })
        .map(|line| format!("{}\n", line))
        .collect();
    (body, dropped)
}
