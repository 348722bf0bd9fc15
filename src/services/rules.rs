//! Ordered rule catalogue for governed documents.
//!
//! Every rule is an independent predicate: one code, one severity, one check
//! function producing zero or more hits. Rules never short-circuit each
//! other; groups run in a fixed order (structural, document_metadata,
//! governance_info, registry_binding, vector_alignment_map, workload
//! payload, security) so repeated runs emit findings in a stable order.

use crate::domain::constants;
use crate::domain::models::{Finding, Level};
use crate::services::generator::{parse_cpu_millis, parse_memory_bytes};
use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;
use serde_yaml::Value;

pub const GOVERNANCE_BLOCKS: [&str; 4] = [
    "document_metadata",
    "governance_info",
    "registry_binding",
    "vector_alignment_map",
];

lazy_static! {
    static ref UUID_RE: Regex = Regex::new(
        "^[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}$"
    )
    .unwrap();
    static ref ENDPOINT_RE: Regex = Regex::new(r"^https?://[a-z0-9.-]+(:\d+)?$").unwrap();
    static ref BINDING_RE: Regex = Regex::new(r"^[a-z][a-z0-9-]* -> \[[^\]]*\]$").unwrap();
    static ref ALIAS_RE: Regex = Regex::new(r"(^|\s)[&*][A-Za-z_][A-Za-z0-9_-]*").unwrap();
    static ref BOOL_RE: Regex =
        Regex::new(r":\s+(yes|no|on|off|True|False|TRUE|FALSE)\s*$").unwrap();
}

pub struct RuleContext<'a> {
    pub raw: &'a str,
    pub docs: Vec<Value>,
    pub governance: Option<Value>,
}

pub struct Hit {
    pub message: String,
    pub field: Option<String>,
}

impl Hit {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            field: None,
        }
    }

    fn at(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            field: Some(field.into()),
        }
    }
}

pub struct Rule {
    pub code: &'static str,
    pub level: Level,
    pub check: fn(&RuleContext) -> Vec<Hit>,
}

/// Validate one document's raw text. An unparseable stream yields the single
/// parse finding; everything else accumulates.
pub fn validate_document(raw: &str) -> Vec<Finding> {
    let docs = match parse_stream(raw) {
        Ok(docs) => docs,
        Err(err) => {
            return vec![Finding {
                level: Level::Error,
                code: "P001".to_string(),
                message: format!("document cannot be parsed as YAML: {}", err),
                field: None,
            }]
        }
    };
    let ctx = RuleContext {
        raw,
        governance: extract_governance(&docs, raw),
        docs,
    };

    let mut findings = Vec::new();
    for rule in catalogue() {
        for hit in (rule.check)(&ctx) {
            findings.push(Finding {
                level: rule.level,
                code: rule.code.to_string(),
                message: hit.message,
                field: hit.field,
            });
        }
    }
    findings
}

fn parse_stream(raw: &str) -> Result<Vec<Value>, serde_yaml::Error> {
    let mut docs = Vec::new();
    for document in serde_yaml::Deserializer::from_str(raw) {
        let value = Value::deserialize(document)?;
        if !value.is_null() {
            docs.push(value);
        }
    }
    Ok(docs)
}

/// Locate the governance companion in any of its carriage forms: a stream
/// document holding the four blocks, a compose `x-governance` stanza, or a
/// commented JSON footer.
fn extract_governance(docs: &[Value], raw: &str) -> Option<Value> {
    for doc in docs {
        if GOVERNANCE_BLOCKS.iter().any(|b| doc.get(b).is_some()) {
            return Some(doc.clone());
        }
    }
    for doc in docs {
        if let Some(stanza) = doc.get("x-governance") {
            return Some(stanza.clone());
        }
    }
    for line in raw.lines() {
        if let Some(rest) = line.trim_start().strip_prefix(constants::GOVERNANCE_COMMENT) {
            if let Ok(value) = serde_yaml::from_str::<Value>(rest.trim()) {
                return Some(value);
            }
        }
    }
    None
}

fn block<'a>(ctx: &'a RuleContext, name: &str) -> Option<&'a Value> {
    ctx.governance.as_ref().and_then(|g| g.get(name))
}

pub fn catalogue() -> Vec<Rule> {
    vec![
        // structural
        Rule { code: "Y001", level: Level::Error, check: document_start_marker },
        Rule { code: "Y002", level: Level::Error, check: yaml_version_directive },
        Rule { code: "Y003", level: Level::Warning, check: anchor_or_alias },
        Rule { code: "Y004", level: Level::Warning, check: merge_key },
        Rule { code: "Y005", level: Level::Error, check: tab_indentation },
        Rule { code: "Y006", level: Level::Warning, check: noncanonical_booleans },
        Rule { code: "Y007", level: Level::Error, check: governance_companion_present },
        Rule { code: "Y008", level: Level::Warning, check: trailing_whitespace },
        Rule { code: "Y009", level: Level::Info, check: final_newline },
        // document_metadata
        Rule { code: "M001", level: Level::Error, check: metadata_block_present },
        Rule { code: "M002", level: Level::Error, check: unique_id_shape },
        Rule { code: "M003", level: Level::Error, check: schema_version_constant },
        Rule { code: "M004", level: Level::Error, check: generated_by_constant },
        Rule { code: "M005", level: Level::Error, check: cross_layer_binding_is_array },
        Rule { code: "M006", level: Level::Warning, check: closed_schema },
        Rule { code: "M007", level: Level::Warning, check: created_at_timestamp },
        Rule { code: "M008", level: Level::Warning, check: target_system_known },
        // governance_info
        Rule { code: "G001", level: Level::Error, check: governance_block_present },
        Rule { code: "G002", level: Level::Error, check: owner_present },
        Rule { code: "G003", level: Level::Warning, check: approval_chain_depth },
        Rule { code: "G004", level: Level::Error, check: compliance_tags_present },
        Rule { code: "G005", level: Level::Warning, check: managed_tag_present },
        Rule { code: "G006", level: Level::Warning, check: lifecycle_policy_known },
        Rule { code: "G007", level: Level::Warning, check: critical_implies_strict },
        // registry_binding
        Rule { code: "R001", level: Level::Error, check: registry_block_present },
        Rule { code: "R002", level: Level::Error, check: service_endpoint_shape },
        Rule { code: "R003", level: Level::Error, check: discovery_protocol_known },
        Rule { code: "R004", level: Level::Warning, check: health_path_absolute },
        Rule { code: "R005", level: Level::Error, check: registry_ttl_positive },
        Rule { code: "R006", level: Level::Warning, check: registry_ttl_sane },
        // vector_alignment_map
        Rule { code: "V001", level: Level::Error, check: vector_block_present },
        Rule { code: "V002", level: Level::Error, check: alignment_model_constant },
        Rule { code: "V003", level: Level::Error, check: dim_allowed },
        Rule { code: "V004", level: Level::Error, check: tolerance_in_range },
        Rule { code: "V005", level: Level::Error, check: vector_min_length },
        Rule { code: "V006", level: Level::Error, check: vector_numeric },
        Rule { code: "V007", level: Level::Warning, check: vector_element_range },
        Rule { code: "V008", level: Level::Error, check: function_keyword_nonempty },
        Rule { code: "V009", level: Level::Error, check: contextual_binding_shape },
        Rule { code: "V010", level: Level::Warning, check: vector_length_matches_dim },
        // workload payload (container-orchestration documents)
        Rule { code: "K001", level: Level::Error, check: liveness_probe_present },
        Rule { code: "K002", level: Level::Error, check: readiness_probe_present },
        Rule { code: "K003", level: Level::Error, check: resource_requests_present },
        Rule { code: "K004", level: Level::Error, check: resource_limits_present },
        Rule { code: "K005", level: Level::Error, check: limits_cover_requests },
        Rule { code: "K006", level: Level::Error, check: identity_label_present },
        Rule { code: "K007", level: Level::Error, check: no_inline_secret_env },
        Rule { code: "K008", level: Level::Warning, check: secret_reference_present },
        Rule { code: "K009", level: Level::Warning, check: replica_redundancy },
        // security / supply chain
        Rule { code: "S001", level: Level::Warning, check: image_tag_pinned },
        Rule { code: "S002", level: Level::Warning, check: image_registry_prefix },
        Rule { code: "S003", level: Level::Warning, check: no_privileged_containers },
        Rule { code: "S004", level: Level::Warning, check: no_host_path_volumes },
    ]
}

// ---- structural --------------------------------------------------------

fn document_start_marker(ctx: &RuleContext) -> Vec<Hit> {
    let body = ctx.raw.trim_start_matches('\u{feff}');
    if body.starts_with("---") {
        vec![]
    } else {
        vec![Hit::new("document does not open with the `---` start marker")]
    }
}

fn yaml_version_directive(ctx: &RuleContext) -> Vec<Hit> {
    ctx.raw
        .lines()
        .filter(|line| line.trim_start().starts_with("%YAML"))
        .map(|line| Hit::new(format!("forbidden version directive `{}`", line.trim())))
        .collect()
}

fn anchor_or_alias(ctx: &RuleContext) -> Vec<Hit> {
    let count = ctx
        .raw
        .lines()
        .filter(|line| !line.trim_start().starts_with('#'))
        .filter(|line| ALIAS_RE.is_match(line))
        .count();
    if count > 0 {
        vec![Hit::new(format!(
            "anchor/alias syntax on {} line(s); governed documents must stay self-contained",
            count
        ))]
    } else {
        vec![]
    }
}

fn merge_key(ctx: &RuleContext) -> Vec<Hit> {
    if ctx.raw.contains("<<:") {
        vec![Hit::new("merge key `<<:` is not allowed in governed documents")]
    } else {
        vec![]
    }
}

// Tab indentation fails the parser outright (P001); tabs YAML still accepts,
// e.g. as separation after a colon, are rejected here.
fn tab_indentation(ctx: &RuleContext) -> Vec<Hit> {
    ctx.raw
        .lines()
        .enumerate()
        .filter(|(_, line)| line.contains('\t'))
        .map(|(idx, _)| Hit::new(format!("tab whitespace on line {}", idx + 1)))
        .collect()
}

fn noncanonical_booleans(ctx: &RuleContext) -> Vec<Hit> {
    ctx.raw
        .lines()
        .filter(|line| !line.trim_start().starts_with('#'))
        .filter(|line| BOOL_RE.is_match(line))
        .map(|line| {
            Hit::new(format!(
                "non-canonical boolean spelling in `{}`; use true/false",
                line.trim()
            ))
        })
        .collect()
}

fn governance_companion_present(ctx: &RuleContext) -> Vec<Hit> {
    if ctx.governance.is_some() {
        vec![]
    } else {
        vec![Hit::new(
            "no governance companion found (all four governance blocks are absent)",
        )]
    }
}

fn trailing_whitespace(ctx: &RuleContext) -> Vec<Hit> {
    let count = ctx
        .raw
        .lines()
        .filter(|line| !line.is_empty() && line.ends_with([' ', '\t']))
        .count();
    if count > 0 {
        vec![Hit::new(format!("trailing whitespace on {} line(s)", count))]
    } else {
        vec![]
    }
}

fn final_newline(ctx: &RuleContext) -> Vec<Hit> {
    if ctx.raw.is_empty() || ctx.raw.ends_with('\n') {
        vec![]
    } else {
        vec![Hit::new("document does not end with a newline")]
    }
}

// ---- document_metadata -------------------------------------------------

fn metadata_block_present(ctx: &RuleContext) -> Vec<Hit> {
    if ctx.governance.is_none() || block(ctx, "document_metadata").is_some() {
        vec![]
    } else {
        vec![Hit::at("`document_metadata` block is missing", "document_metadata")]
    }
}

fn unique_id_shape(ctx: &RuleContext) -> Vec<Hit> {
    let Some(meta) = block(ctx, "document_metadata") else {
        return vec![];
    };
    let field = "document_metadata.unique_id";
    match meta.get("unique_id").and_then(Value::as_str) {
        Some(id) if UUID_RE.is_match(id) => vec![],
        Some(id) => vec![Hit::at(
            format!("unique_id `{}` is not a well-formed document identifier", id),
            field,
        )],
        None => vec![Hit::at("unique_id is missing", field)],
    }
}

fn schema_version_constant(ctx: &RuleContext) -> Vec<Hit> {
    let Some(meta) = block(ctx, "document_metadata") else {
        return vec![];
    };
    let field = "document_metadata.schema_version";
    match meta.get("schema_version").and_then(Value::as_str) {
        Some(v) if v == constants::SCHEMA_VERSION => vec![],
        Some(v) => vec![Hit::at(
            format!(
                "schema_version `{}` does not equal the required `{}`",
                v,
                constants::SCHEMA_VERSION
            ),
            field,
        )],
        None => vec![Hit::at("schema_version is missing", field)],
    }
}

fn generated_by_constant(ctx: &RuleContext) -> Vec<Hit> {
    let Some(meta) = block(ctx, "document_metadata") else {
        return vec![];
    };
    let field = "document_metadata.generated_by";
    match meta.get("generated_by").and_then(Value::as_str) {
        Some(v) if v == constants::GENERATED_BY => vec![],
        Some(v) => vec![Hit::at(
            format!(
                "generated_by `{}` does not equal the required `{}`",
                v,
                constants::GENERATED_BY
            ),
            field,
        )],
        None => vec![Hit::at("generated_by is missing", field)],
    }
}

fn cross_layer_binding_is_array(ctx: &RuleContext) -> Vec<Hit> {
    let Some(meta) = block(ctx, "document_metadata") else {
        return vec![];
    };
    let field = "document_metadata.cross_layer_binding";
    match meta.get("cross_layer_binding") {
        Some(v) if v.is_sequence() => vec![],
        Some(_) => vec![Hit::at("cross_layer_binding must be an array", field)],
        None => vec![Hit::at(
            "cross_layer_binding is missing; emit `[]` when there are no dependencies",
            field,
        )],
    }
}

fn closed_schema(ctx: &RuleContext) -> Vec<Hit> {
    const ALLOWED: [(&str, &[&str]); 4] = [
        (
            "document_metadata",
            &[
                "unique_id",
                "target_system",
                "cross_layer_binding",
                "schema_version",
                "generated_by",
                "created_at",
            ],
        ),
        (
            "governance_info",
            &["owner", "approval_chain", "compliance_tags", "lifecycle_policy"],
        ),
        (
            "registry_binding",
            &[
                "service_endpoint",
                "discovery_protocol",
                "health_check_path",
                "registry_ttl",
            ],
        ),
        (
            "vector_alignment_map",
            &[
                "alignment_model",
                "dim",
                "tolerance",
                "coherence_vector",
                "function_keyword",
                "contextual_binding",
            ],
        ),
    ];
    let mut hits = Vec::new();
    for (name, allowed) in ALLOWED {
        let Some(mapping) = block(ctx, name).and_then(Value::as_mapping) else {
            continue;
        };
        for key in mapping.keys() {
            let Some(key) = key.as_str() else { continue };
            if !allowed.contains(&key) {
                hits.push(Hit::at(
                    format!("unknown field `{}` in closed block `{}`", key, name),
                    format!("{}.{}", name, key),
                ));
            }
        }
    }
    hits
}

fn created_at_timestamp(ctx: &RuleContext) -> Vec<Hit> {
    let Some(meta) = block(ctx, "document_metadata") else {
        return vec![];
    };
    let field = "document_metadata.created_at";
    match meta.get("created_at").and_then(Value::as_str) {
        Some(ts) if chrono::DateTime::parse_from_rfc3339(ts).is_ok() => vec![],
        Some(ts) => vec![Hit::at(
            format!("created_at `{}` is not an RFC3339 timestamp", ts),
            field,
        )],
        None => vec![Hit::at("created_at is missing", field)],
    }
}

fn target_system_known(ctx: &RuleContext) -> Vec<Hit> {
    let Some(meta) = block(ctx, "document_metadata") else {
        return vec![];
    };
    let field = "document_metadata.target_system";
    const KNOWN: [&str; 4] = ["kubernetes", "compose", "helm", "nomad"];
    match meta.get("target_system").and_then(Value::as_str) {
        Some(t) if KNOWN.contains(&t) => vec![],
        Some(t) => vec![Hit::at(format!("unknown target_system `{}`", t), field)],
        None => vec![Hit::at("target_system is missing", field)],
    }
}

// ---- governance_info ---------------------------------------------------

fn governance_block_present(ctx: &RuleContext) -> Vec<Hit> {
    if ctx.governance.is_none() || block(ctx, "governance_info").is_some() {
        vec![]
    } else {
        vec![Hit::at("`governance_info` block is missing", "governance_info")]
    }
}

fn owner_present(ctx: &RuleContext) -> Vec<Hit> {
    let Some(info) = block(ctx, "governance_info") else {
        return vec![];
    };
    match info.get("owner").and_then(Value::as_str) {
        Some(owner) if !owner.trim().is_empty() => vec![],
        _ => vec![Hit::at("owner is missing or empty", "governance_info.owner")],
    }
}

fn approval_chain_depth(ctx: &RuleContext) -> Vec<Hit> {
    let Some(info) = block(ctx, "governance_info") else {
        return vec![];
    };
    let field = "governance_info.approval_chain";
    match info.get("approval_chain").and_then(Value::as_sequence) {
        Some(chain) if chain.len() >= 2 => vec![],
        Some(chain) => vec![Hit::at(
            format!("approval_chain has only {} entr(ies); expected at least 2", chain.len()),
            field,
        )],
        None => vec![Hit::at("approval_chain is missing", field)],
    }
}

fn compliance_tags_present(ctx: &RuleContext) -> Vec<Hit> {
    let Some(info) = block(ctx, "governance_info") else {
        return vec![];
    };
    match info.get("compliance_tags").and_then(Value::as_sequence) {
        Some(tags) if !tags.is_empty() => vec![],
        _ => vec![Hit::at(
            "compliance_tags is missing or empty",
            "governance_info.compliance_tags",
        )],
    }
}

fn managed_tag_present(ctx: &RuleContext) -> Vec<Hit> {
    let Some(tags) = block(ctx, "governance_info")
        .and_then(|i| i.get("compliance_tags"))
        .and_then(Value::as_sequence)
    else {
        return vec![];
    };
    if tags.iter().any(|t| t.as_str() == Some(constants::MANAGED_TAG)) {
        vec![]
    } else {
        vec![Hit::at(
            format!("compliance_tags does not carry the `{}` tag", constants::MANAGED_TAG),
            "governance_info.compliance_tags",
        )]
    }
}

fn lifecycle_policy_known(ctx: &RuleContext) -> Vec<Hit> {
    let Some(info) = block(ctx, "governance_info") else {
        return vec![];
    };
    let field = "governance_info.lifecycle_policy";
    match info.get("lifecycle_policy").and_then(Value::as_str) {
        Some("strict") | Some("standard") => vec![],
        Some(p) => vec![Hit::at(
            format!("lifecycle_policy `{}` is not `strict` or `standard`", p),
            field,
        )],
        None => vec![Hit::at("lifecycle_policy is missing", field)],
    }
}

fn critical_implies_strict(ctx: &RuleContext) -> Vec<Hit> {
    let Some(info) = block(ctx, "governance_info") else {
        return vec![];
    };
    let critical = info
        .get("compliance_tags")
        .and_then(Value::as_sequence)
        .map(|tags| tags.iter().any(|t| t.as_str() == Some("critical")))
        .unwrap_or(false);
    let strict = info.get("lifecycle_policy").and_then(Value::as_str) == Some("strict");
    if critical && !strict {
        vec![Hit::at(
            "`critical` compliance tag requires the `strict` lifecycle policy",
            "governance_info.lifecycle_policy",
        )]
    } else {
        vec![]
    }
}

// ---- registry_binding --------------------------------------------------

fn registry_block_present(ctx: &RuleContext) -> Vec<Hit> {
    if ctx.governance.is_none() || block(ctx, "registry_binding").is_some() {
        vec![]
    } else {
        vec![Hit::at("`registry_binding` block is missing", "registry_binding")]
    }
}

fn service_endpoint_shape(ctx: &RuleContext) -> Vec<Hit> {
    let Some(binding) = block(ctx, "registry_binding") else {
        return vec![];
    };
    let field = "registry_binding.service_endpoint";
    match binding.get("service_endpoint").and_then(Value::as_str) {
        Some(endpoint) if ENDPOINT_RE.is_match(endpoint) => vec![],
        Some(endpoint) => vec![Hit::at(
            format!("service_endpoint `{}` is not a plain `http://host[:port]` URL", endpoint),
            field,
        )],
        None => vec![Hit::at("service_endpoint is missing", field)],
    }
}

fn discovery_protocol_known(ctx: &RuleContext) -> Vec<Hit> {
    let Some(binding) = block(ctx, "registry_binding") else {
        return vec![];
    };
    let field = "registry_binding.discovery_protocol";
    match binding.get("discovery_protocol").and_then(Value::as_str) {
        Some(p) if constants::DISCOVERY_PROTOCOLS.contains(&p) => vec![],
        Some(p) => vec![Hit::at(
            format!("discovery_protocol `{}` is not one of consul, etcd, eureka", p),
            field,
        )],
        None => vec![Hit::at("discovery_protocol is missing", field)],
    }
}

fn health_path_absolute(ctx: &RuleContext) -> Vec<Hit> {
    let Some(binding) = block(ctx, "registry_binding") else {
        return vec![];
    };
    let field = "registry_binding.health_check_path";
    match binding.get("health_check_path").and_then(Value::as_str) {
        Some(path) if path.starts_with('/') => vec![],
        Some(path) => vec![Hit::at(
            format!("health_check_path `{}` is not an absolute path", path),
            field,
        )],
        None => vec![Hit::at("health_check_path is missing", field)],
    }
}

fn registry_ttl_positive(ctx: &RuleContext) -> Vec<Hit> {
    let Some(binding) = block(ctx, "registry_binding") else {
        return vec![];
    };
    let field = "registry_binding.registry_ttl";
    match binding.get("registry_ttl") {
        Some(v) => match v.as_i64() {
            Some(ttl) if ttl > 0 => vec![],
            _ => vec![Hit::at("registry_ttl must be a positive integer of seconds", field)],
        },
        None => vec![Hit::at("registry_ttl is missing", field)],
    }
}

fn registry_ttl_sane(ctx: &RuleContext) -> Vec<Hit> {
    let ttl = block(ctx, "registry_binding")
        .and_then(|b| b.get("registry_ttl"))
        .and_then(Value::as_i64);
    match ttl {
        Some(ttl) if ttl > 3600 => vec![Hit::at(
            format!("registry_ttl {}s exceeds one hour; stale registrations will linger", ttl),
            "registry_binding.registry_ttl",
        )],
        _ => vec![],
    }
}

// ---- vector_alignment_map ----------------------------------------------

fn vector_block_present(ctx: &RuleContext) -> Vec<Hit> {
    if ctx.governance.is_none() || block(ctx, "vector_alignment_map").is_some() {
        vec![]
    } else {
        vec![Hit::at(
            "`vector_alignment_map` block is missing",
            "vector_alignment_map",
        )]
    }
}

fn alignment_model_constant(ctx: &RuleContext) -> Vec<Hit> {
    let Some(vam) = block(ctx, "vector_alignment_map") else {
        return vec![];
    };
    let field = "vector_alignment_map.alignment_model";
    match vam.get("alignment_model").and_then(Value::as_str) {
        Some(m) if m == constants::ALIGNMENT_MODEL => vec![],
        Some(m) => vec![Hit::at(
            format!(
                "alignment_model `{}` does not equal the required `{}`",
                m,
                constants::ALIGNMENT_MODEL
            ),
            field,
        )],
        None => vec![Hit::at("alignment_model is missing", field)],
    }
}

fn dim_allowed(ctx: &RuleContext) -> Vec<Hit> {
    let Some(vam) = block(ctx, "vector_alignment_map") else {
        return vec![];
    };
    let field = "vector_alignment_map.dim";
    match vam.get("dim").and_then(Value::as_u64) {
        Some(dim) if constants::ALLOWED_DIMS.contains(&(dim as u32)) => vec![],
        Some(dim) => vec![Hit::at(
            format!("dim {} is not one of 1024, 2048, 4096", dim),
            field,
        )],
        None => vec![Hit::at("dim is missing or not an integer", field)],
    }
}

fn tolerance_in_range(ctx: &RuleContext) -> Vec<Hit> {
    let Some(vam) = block(ctx, "vector_alignment_map") else {
        return vec![];
    };
    let field = "vector_alignment_map.tolerance";
    match vam.get("tolerance").and_then(Value::as_f64) {
        Some(t) if (constants::TOLERANCE_MIN..=constants::TOLERANCE_MAX).contains(&t) => vec![],
        Some(t) => vec![Hit::at(
            format!(
                "tolerance {} is outside [{}, {}]",
                t,
                constants::TOLERANCE_MIN,
                constants::TOLERANCE_MAX
            ),
            field,
        )],
        None => vec![Hit::at("tolerance is missing or not numeric", field)],
    }
}

fn vector_min_length(ctx: &RuleContext) -> Vec<Hit> {
    let Some(vam) = block(ctx, "vector_alignment_map") else {
        return vec![];
    };
    let field = "vector_alignment_map.coherence_vector";
    match vam.get("coherence_vector").and_then(Value::as_sequence) {
        Some(v) if v.len() >= 8 => vec![],
        Some(v) => vec![Hit::at(
            format!("coherence_vector has {} entries; at least 8 are required", v.len()),
            field,
        )],
        None => vec![Hit::at("coherence_vector is missing", field)],
    }
}

fn vector_numeric(ctx: &RuleContext) -> Vec<Hit> {
    let Some(v) = block(ctx, "vector_alignment_map")
        .and_then(|b| b.get("coherence_vector"))
        .and_then(Value::as_sequence)
    else {
        return vec![];
    };
    let bad = v.iter().filter(|e| e.as_f64().is_none()).count();
    if bad > 0 {
        vec![Hit::at(
            format!("coherence_vector contains {} non-numeric entr(ies)", bad),
            "vector_alignment_map.coherence_vector",
        )]
    } else {
        vec![]
    }
}

fn vector_element_range(ctx: &RuleContext) -> Vec<Hit> {
    let Some(v) = block(ctx, "vector_alignment_map")
        .and_then(|b| b.get("coherence_vector"))
        .and_then(Value::as_sequence)
    else {
        return vec![];
    };
    let out_of_range = v
        .iter()
        .filter_map(Value::as_f64)
        .filter(|e| !(0.0..=1.0).contains(e))
        .count();
    if out_of_range > 0 {
        vec![Hit::at(
            format!("{} coherence_vector entr(ies) fall outside [0, 1]", out_of_range),
            "vector_alignment_map.coherence_vector",
        )]
    } else {
        vec![]
    }
}

fn function_keyword_nonempty(ctx: &RuleContext) -> Vec<Hit> {
    let Some(vam) = block(ctx, "vector_alignment_map") else {
        return vec![];
    };
    match vam.get("function_keyword").and_then(Value::as_sequence) {
        Some(kw) if !kw.is_empty() => vec![],
        _ => vec![Hit::at(
            "function_keyword must be a non-empty array",
            "vector_alignment_map.function_keyword",
        )],
    }
}

fn contextual_binding_shape(ctx: &RuleContext) -> Vec<Hit> {
    let Some(vam) = block(ctx, "vector_alignment_map") else {
        return vec![];
    };
    let field = "vector_alignment_map.contextual_binding";
    match vam.get("contextual_binding").and_then(Value::as_str) {
        Some(binding) if BINDING_RE.is_match(binding) => vec![],
        Some(binding) => vec![Hit::at(
            format!("contextual_binding `{}` does not match `name -> [deps]`", binding),
            field,
        )],
        None => vec![Hit::at("contextual_binding is missing", field)],
    }
}

fn vector_length_matches_dim(ctx: &RuleContext) -> Vec<Hit> {
    let Some(vam) = block(ctx, "vector_alignment_map") else {
        return vec![];
    };
    let dim = vam.get("dim").and_then(Value::as_u64);
    let len = vam
        .get("coherence_vector")
        .and_then(Value::as_sequence)
        .map(|v| v.len());
    match (dim, len) {
        (Some(dim), Some(len)) if len >= 8 && len as u64 != dim => vec![Hit::at(
            format!("coherence_vector length {} does not match dim {}", len, dim),
            "vector_alignment_map.coherence_vector",
        )],
        _ => vec![],
    }
}

// ---- workload payload --------------------------------------------------

struct WorkloadView<'a> {
    name: String,
    doc: &'a Value,
    containers: Vec<&'a Value>,
}

fn deployments<'a>(ctx: &'a RuleContext) -> Vec<WorkloadView<'a>> {
    ctx.docs
        .iter()
        .filter(|doc| doc.get("kind").and_then(Value::as_str) == Some("Deployment"))
        .map(|doc| {
            let name = doc
                .get("metadata")
                .and_then(|m| m.get("name"))
                .and_then(Value::as_str)
                .unwrap_or("<unnamed>")
                .to_string();
            let containers = doc
                .get("spec")
                .and_then(|s| s.get("template"))
                .and_then(|t| t.get("spec"))
                .and_then(|s| s.get("containers"))
                .and_then(Value::as_sequence)
                .map(|seq| seq.iter().collect())
                .unwrap_or_default();
            WorkloadView { name, doc, containers }
        })
        .collect()
}

fn container_name(container: &Value) -> &str {
    container
        .get("name")
        .and_then(Value::as_str)
        .unwrap_or("<unnamed>")
}

fn probe_check(ctx: &RuleContext, probe: &str) -> Vec<Hit> {
    let mut hits = Vec::new();
    for workload in deployments(ctx) {
        for container in &workload.containers {
            if container.get(probe).is_none() {
                hits.push(Hit::at(
                    format!(
                        "container `{}` in `{}` declares no {}",
                        container_name(container),
                        workload.name,
                        probe
                    ),
                    format!("spec.template.spec.containers.{}", probe),
                ));
            }
        }
    }
    hits
}

fn liveness_probe_present(ctx: &RuleContext) -> Vec<Hit> {
    probe_check(ctx, "livenessProbe")
}

fn readiness_probe_present(ctx: &RuleContext) -> Vec<Hit> {
    probe_check(ctx, "readinessProbe")
}

fn resource_section_check(ctx: &RuleContext, section: &str) -> Vec<Hit> {
    let mut hits = Vec::new();
    for workload in deployments(ctx) {
        for container in &workload.containers {
            let present = container
                .get("resources")
                .and_then(|r| r.get(section))
                .and_then(Value::as_mapping)
                .map(|m| !m.is_empty())
                .unwrap_or(false);
            if !present {
                hits.push(Hit::at(
                    format!(
                        "container `{}` in `{}` declares no resource {}",
                        container_name(container),
                        workload.name,
                        section
                    ),
                    format!("spec.template.spec.containers.resources.{}", section),
                ));
            }
        }
    }
    hits
}

fn resource_requests_present(ctx: &RuleContext) -> Vec<Hit> {
    resource_section_check(ctx, "requests")
}

fn resource_limits_present(ctx: &RuleContext) -> Vec<Hit> {
    resource_section_check(ctx, "limits")
}

fn limits_cover_requests(ctx: &RuleContext) -> Vec<Hit> {
    let mut hits = Vec::new();
    for workload in deployments(ctx) {
        for container in &workload.containers {
            let resources = container.get("resources");
            let quantity = |section: &str, key: &str| -> Option<String> {
                resources
                    .and_then(|r| r.get(section))
                    .and_then(|s| s.get(key))
                    .and_then(Value::as_str)
                    .map(str::to_string)
            };
            let checks: [(&str, fn(&str) -> Option<i64>); 2] =
                [("cpu", parse_cpu_millis), ("memory", parse_memory_bytes)];
            for (key, parse) in checks {
                let request = quantity("requests", key).and_then(|q| parse(&q));
                let limit = quantity("limits", key).and_then(|q| parse(&q));
                if let (Some(request), Some(limit)) = (request, limit) {
                    if limit < request {
                        hits.push(Hit::at(
                            format!(
                                "container `{}` in `{}` sets a {} limit below its request",
                                container_name(container),
                                workload.name,
                                key
                            ),
                            format!("spec.template.spec.containers.resources.limits.{}", key),
                        ));
                    }
                }
            }
        }
    }
    hits
}

fn identity_label_present(ctx: &RuleContext) -> Vec<Hit> {
    let mut hits = Vec::new();
    for workload in deployments(ctx) {
        let labeled = workload
            .doc
            .get("metadata")
            .and_then(|m| m.get("labels"))
            .and_then(|l| l.get(constants::IDENTITY_LABEL))
            .is_some();
        if !labeled {
            hits.push(Hit::at(
                format!(
                    "workload `{}` is missing the `{}` identity label",
                    workload.name,
                    constants::IDENTITY_LABEL
                ),
                "metadata.labels",
            ));
        }
    }
    hits
}

fn no_inline_secret_env(ctx: &RuleContext) -> Vec<Hit> {
    let mut hits = Vec::new();
    for workload in deployments(ctx) {
        for container in &workload.containers {
            let Some(env) = container.get("env").and_then(Value::as_sequence) else {
                continue;
            };
            for entry in env {
                let Some(key) = entry.get("name").and_then(Value::as_str) else {
                    continue;
                };
                let upper = key.to_ascii_uppercase();
                let secret_shaped = constants::SECRET_SUFFIXES
                    .iter()
                    .any(|suffix| upper.ends_with(suffix));
                // valueFrom-injected entries carry no literal value
                let literal = entry.get("value").is_some();
                if secret_shaped && literal {
                    hits.push(Hit::at(
                        format!(
                            "container `{}` in `{}` carries plaintext secret env `{}`",
                            container_name(container),
                            workload.name,
                            key
                        ),
                        format!("spec.template.spec.containers.env.{}", key),
                    ));
                }
            }
        }
    }
    hits
}

fn secret_reference_present(ctx: &RuleContext) -> Vec<Hit> {
    let mut hits = Vec::new();
    for workload in deployments(ctx) {
        for container in &workload.containers {
            let env_from = container
                .get("envFrom")
                .and_then(Value::as_sequence)
                .map(|seq| seq.iter().any(|e| e.get("secretRef").is_some()))
                .unwrap_or(false);
            let value_from = container
                .get("env")
                .and_then(Value::as_sequence)
                .map(|seq| {
                    seq.iter().any(|e| {
                        e.get("valueFrom")
                            .and_then(|v| v.get("secretKeyRef"))
                            .is_some()
                    })
                })
                .unwrap_or(false);
            if !env_from && !value_from {
                hits.push(Hit::at(
                    format!(
                        "container `{}` in `{}` declares no secret-injection reference",
                        container_name(container),
                        workload.name
                    ),
                    "spec.template.spec.containers.envFrom",
                ));
            }
        }
    }
    hits
}

fn replica_redundancy(ctx: &RuleContext) -> Vec<Hit> {
    let mut hits = Vec::new();
    for workload in deployments(ctx) {
        let replicas = workload
            .doc
            .get("spec")
            .and_then(|s| s.get("replicas"))
            .and_then(Value::as_i64);
        if let Some(replicas) = replicas {
            if replicas < 2 {
                hits.push(Hit::at(
                    format!(
                        "workload `{}` runs {} replica(s); a single replica has no failover",
                        workload.name, replicas
                    ),
                    "spec.replicas",
                ));
            }
        }
    }
    hits
}

// ---- security / supply chain -------------------------------------------

fn collect_images(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::Mapping(map) => {
            for (key, entry) in map {
                if key.as_str() == Some("image") {
                    if let Some(image) = entry.as_str() {
                        out.push(image.to_string());
                    } else if let Some(repo) =
                        entry.get("repository").and_then(Value::as_str)
                    {
                        let tag = entry
                            .get("tag")
                            .and_then(Value::as_str)
                            .unwrap_or("latest");
                        out.push(format!("{}:{}", repo, tag));
                    }
                }
                collect_images(entry, out);
            }
        }
        Value::Sequence(seq) => {
            for entry in seq {
                collect_images(entry, out);
            }
        }
        _ => {}
    }
}

fn images(ctx: &RuleContext) -> Vec<String> {
    let mut out = Vec::new();
    for doc in &ctx.docs {
        collect_images(doc, &mut out);
    }
    out
}

fn image_tag_pinned(ctx: &RuleContext) -> Vec<Hit> {
    images(ctx)
        .into_iter()
        .filter(|image| {
            let tag = image.rsplit_once(':').map(|(_, t)| t);
            match tag {
                Some(tag) => tag == "latest" || tag.contains('/'),
                None => true,
            }
        })
        .map(|image| {
            Hit::new(format!(
                "image `{}` uses a floating tag; pin an immutable version",
                image
            ))
        })
        .collect()
}

fn image_registry_prefix(ctx: &RuleContext) -> Vec<Hit> {
    images(ctx)
        .into_iter()
        .filter(|image| {
            match image.split('/').next() {
                // host-like first segment: contains a dot or port
                Some(first) if image.contains('/') => {
                    !(first.contains('.') || first.contains(':') || first == "localhost")
                }
                _ => true,
            }
        })
        .map(|image| {
            Hit::new(format!(
                "image `{}` has no registry host prefix and will resolve to a public default",
                image
            ))
        })
        .collect()
}

fn find_key(value: &Value, wanted: &str, hits: &mut usize) {
    match value {
        Value::Mapping(map) => {
            for (key, entry) in map {
                if key.as_str() == Some(wanted) {
                    let flagged = match wanted {
                        "privileged" => entry.as_bool() == Some(true),
                        _ => true,
                    };
                    if flagged {
                        *hits += 1;
                    }
                }
                find_key(entry, wanted, hits);
            }
        }
        Value::Sequence(seq) => {
            for entry in seq {
                find_key(entry, wanted, hits);
            }
        }
        _ => {}
    }
}

fn no_privileged_containers(ctx: &RuleContext) -> Vec<Hit> {
    let mut count = 0;
    for doc in &ctx.docs {
        find_key(doc, "privileged", &mut count);
    }
    if count > 0 {
        vec![Hit::new(format!(
            "{} privileged container setting(s) present",
            count
        ))]
    } else {
        vec![]
    }
}

fn no_host_path_volumes(ctx: &RuleContext) -> Vec<Hit> {
    let mut count = 0;
    for doc in &ctx.docs {
        find_key(doc, "hostPath", &mut count);
    }
    if count > 0 {
        vec![Hit::new(format!("{} hostPath volume(s) present", count))]
    } else {
        vec![]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Target;
    use crate::domain::models::ModuleDescriptor;
    use crate::services::generator::generate;

    fn generated(name: &str) -> String {
        let mut d = ModuleDescriptor::default();
        d.name = name.to_string();
        d.namespace = constants::DEFAULT_NAMESPACE.to_string();
        d.owner = constants::DEFAULT_OWNER.to_string();
        d.compliance_tags = vec!["internal".to_string()];
        d.ports = vec![8080];
        d.image = Some("registry.example.com/team/app:1.2.3".to_string());
        generate(&d, Some(Target::Kubernetes)).unwrap().document_text
    }

    fn errors(findings: &[Finding]) -> Vec<String> {
        findings
            .iter()
            .filter(|f| f.level == Level::Error)
            .map(|f| f.code.clone())
            .collect()
    }

    #[test]
    fn generated_documents_have_no_errors() {
        let findings = validate_document(&generated("user-service"));
        assert_eq!(errors(&findings), Vec::<String>::new(), "{:?}", findings);
    }

    #[test]
    fn wrong_schema_version_is_always_an_error() {
        let doc = generated("user-service").replace(constants::SCHEMA_VERSION, "v7");
        let findings = validate_document(&doc);
        assert!(errors(&findings).contains(&"M003".to_string()));
    }

    #[test]
    fn extra_field_in_closed_block_is_exactly_one_warning() {
        let doc = generated("user-service").replace(
            "registry_binding:\n",
            "registry_binding:\n  surprise_field: 1\n",
        );
        let findings = validate_document(&doc);
        assert_eq!(errors(&findings), Vec::<String>::new(), "{:?}", findings);
        let closed: Vec<_> = findings.iter().filter(|f| f.code == "M006").collect();
        assert_eq!(closed.len(), 1);
        assert_eq!(closed[0].level, Level::Warning);
    }

    #[test]
    fn missing_vector_block_fails_validation() {
        let doc = generated("user-service");
        // drop the vector block from the trailing governance document
        let trimmed = match doc.rfind("vector_alignment_map:") {
            Some(idx) => doc[..idx].to_string(),
            None => panic!("generated document lacks a vector block"),
        };
        let findings = validate_document(&trimmed);
        assert!(errors(&findings).contains(&"V001".to_string()));
    }

    #[test]
    fn unparseable_yaml_short_circuits_to_parse_finding() {
        let findings = validate_document("---\nkey: [unterminated\n");
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].code, "P001");
        assert_eq!(findings[0].level, Level::Error);
    }

    #[test]
    fn tab_whitespace_is_an_error() {
        // tab as separation after the colon parses, unlike tab indentation
        let doc = generated("user-service").replace("replicas: 2", "replicas:\t2");
        let findings = validate_document(&doc);
        assert!(findings.iter().any(|f| f.code == "Y005" && f.level == Level::Error));
    }

    #[test]
    fn noncanonical_booleans_warn() {
        let findings = validate_document("---\nenabled: yes\n");
        assert!(findings.iter().any(|f| f.code == "Y006" && f.level == Level::Warning));
    }

    #[test]
    fn missing_start_marker_is_an_error() {
        let findings = validate_document("key: value\n");
        assert!(findings.iter().any(|f| f.code == "Y001"));
    }

    #[test]
    fn plaintext_secret_env_is_a_hard_error() {
        let doc = "---\napiVersion: apps/v1\nkind: Deployment\nmetadata:\n  name: leaky\nspec:\n  replicas: 2\n  template:\n    spec:\n      containers:\n      - name: leaky\n        image: registry.example.com/leaky:1.0\n        env:\n        - name: API_TOKEN\n          value: plaintext\n";
        let findings = validate_document(doc);
        assert!(errors(&findings).contains(&"K007".to_string()));
    }

    #[test]
    fn floating_image_tag_warns() {
        let doc = generated("user-service")
            .replace("registry.example.com/team/app:1.2.3", "registry.example.com/team/app:latest");
        let findings = validate_document(&doc);
        assert!(findings.iter().any(|f| f.code == "S001" && f.level == Level::Warning));
    }

    #[test]
    fn unprefixed_image_warns() {
        let doc = generated("user-service")
            .replace("registry.example.com/team/app:1.2.3", "app:1.2.3");
        let findings = validate_document(&doc);
        assert!(findings.iter().any(|f| f.code == "S002" && f.level == Level::Warning));
    }

    #[test]
    fn compose_governance_stanza_is_recognized() {
        let mut d = ModuleDescriptor::default();
        d.name = "cart-service".to_string();
        d.namespace = constants::DEFAULT_NAMESPACE.to_string();
        d.owner = constants::DEFAULT_OWNER.to_string();
        d.compliance_tags = vec!["internal".to_string()];
        d.image = Some("registry.example.com/cart:2.0".to_string());
        let text = generate(&d, Some(Target::Compose)).unwrap().document_text;
        let findings = validate_document(&text);
        assert!(!findings.iter().any(|f| f.code == "Y007"), "{:?}", findings);
        assert_eq!(errors(&findings), Vec::<String>::new(), "{:?}", findings);
    }

    #[test]
    fn helm_comment_footer_is_recognized() {
        let mut d = ModuleDescriptor::default();
        d.name = "cart-service".to_string();
        d.namespace = constants::DEFAULT_NAMESPACE.to_string();
        d.owner = constants::DEFAULT_OWNER.to_string();
        d.compliance_tags = vec!["internal".to_string()];
        d.image = Some("registry.example.com/cart:2.0".to_string());
        let text = generate(&d, Some(Target::Helm)).unwrap().document_text;
        let findings = validate_document(&text);
        assert!(!findings.iter().any(|f| f.code == "Y007"), "{:?}", findings);
    }

    #[test]
    fn missing_governance_in_plain_manifest_is_fatal() {
        let findings = validate_document("---\napiVersion: v1\nkind: Service\nmetadata:\n  name: a\n");
        assert!(findings.iter().any(|f| f.code == "Y007" && f.level == Level::Error));
    }

    #[test]
    fn finding_order_is_stable() {
        let doc = generated("user-service");
        let a: Vec<String> = validate_document(&doc).iter().map(|f| f.code.clone()).collect();
        let b: Vec<String> = validate_document(&doc).iter().map(|f| f.code.clone()).collect();
        assert_eq!(a, b);
    }
}
