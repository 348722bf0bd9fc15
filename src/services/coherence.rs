//! Deterministic placeholder semantic annotations.
//!
//! The coherence vector is NOT a trained embedding: it is a reproducible
//! pseudo-numeric tag derived from the resource name alone, so independent
//! runs (and independent implementations) agree bit-for-bit.

/// Derive the coherence vector for `name` at dimensionality `dim`.
///
/// Each raw element is `sin(byte_sum * (i+1) * 0.0001) * 0.5 + 0.5`, rounded
/// to 6 decimal places; the full vector is then L2-normalized to unit norm.
pub fn derive_vector(name: &str, dim: u32) -> Vec<f64> {
    let byte_sum: u64 = name.bytes().map(u64::from).sum();
    let mut v: Vec<f64> = (0..dim as usize)
        .map(|i| {
            let raw = (byte_sum as f64 * (i as f64 + 1.0) * 0.0001).sin() * 0.5 + 0.5;
            (raw * 1_000_000.0).round() / 1_000_000.0
        })
        .collect();
    let norm = v.iter().map(|x| x * x).sum::<f64>().sqrt();
    if norm > 0.0 {
        for x in &mut v {
            *x /= norm;
        }
    }
    v
}

/// Map name tokens to domain keywords. Unknown tokens pass through verbatim.
pub fn infer_keywords(name: &str) -> Vec<String> {
    let mut out = Vec::new();
    for token in name.split('-').filter(|t| !t.is_empty()) {
        match keyword_table(token) {
            Some(mapped) => out.extend(mapped.iter().map(|k| k.to_string())),
            None => out.push(token.to_string()),
        }
    }
    out
}

fn keyword_table(token: &str) -> Option<&'static [&'static str]> {
    let mapped: &[&str] = match token {
        "api" => &["rest", "endpoint", "service-interface"],
        "ai" => &["machine-learning", "inference", "model-serving"],
        "auth" => &["security", "identity", "access-control"],
        "web" => &["frontend", "http", "user-interface"],
        "worker" => &["background", "queue", "batch-processing"],
        "gateway" => &["routing", "ingress", "proxy"],
        "db" => &["storage", "persistence", "database"],
        "cache" => &["caching", "in-memory", "performance"],
        "bot" => &["automation", "conversational", "assistant"],
        "monitor" => &["observability", "metrics", "alerting"],
        _ => return None,
    };
    Some(mapped)
}
