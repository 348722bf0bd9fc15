use crate::cli::Target;
use crate::domain::constants;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

fn default_namespace() -> String {
    constants::DEFAULT_NAMESPACE.to_string()
}

fn default_owner() -> String {
    constants::DEFAULT_OWNER.to_string()
}

fn default_compliance_tags() -> Vec<String> {
    vec![constants::DEFAULT_COMPLIANCE_TAG.to_string()]
}

fn default_request_cpu() -> String {
    "100m".to_string()
}

fn default_request_memory() -> String {
    "256Mi".to_string()
}

fn default_limit_cpu() -> String {
    "500m".to_string()
}

fn default_limit_memory() -> String {
    "512Mi".to_string()
}

fn default_liveness() -> String {
    "/health".to_string()
}

fn default_readiness() -> String {
    "/ready".to_string()
}

#[derive(Serialize)]
pub struct JsonOut<T: Serialize> {
    pub ok: bool,
    pub data: T,
}

/// Input record describing one deployable unit.
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct ModuleDescriptor {
    #[serde(default)]
    pub name: String,
    pub image: Option<String>,
    pub replicas: Option<i64>,
    #[serde(default)]
    pub ports: Vec<i64>,
    #[serde(default)]
    pub depends_on: Vec<String>,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    #[serde(default)]
    pub env: BTreeMap<String, String>,
    pub target: Option<Target>,
    #[serde(default = "default_namespace")]
    pub namespace: String,
    #[serde(default = "default_owner")]
    pub owner: String,
    #[serde(default = "default_compliance_tags")]
    pub compliance_tags: Vec<String>,
    #[serde(default)]
    pub resources: Resources,
    #[serde(default)]
    pub health: Health,
    pub vector_dim: Option<u32>,
    #[serde(default)]
    pub function_keywords: Vec<String>,
    pub discovery_protocol: Option<String>,
    pub registry_ttl: Option<i64>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Resources {
    #[serde(default)]
    pub requests: ResourceSpec,
    #[serde(default = "ResourceSpec::default_limits")]
    pub limits: ResourceSpec,
}

impl Default for Resources {
    fn default() -> Self {
        Self {
            requests: ResourceSpec::default(),
            limits: ResourceSpec::default_limits(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ResourceSpec {
    #[serde(default = "default_request_cpu")]
    pub cpu: String,
    #[serde(default = "default_request_memory")]
    pub memory: String,
}

impl Default for ResourceSpec {
    fn default() -> Self {
        Self {
            cpu: default_request_cpu(),
            memory: default_request_memory(),
        }
    }
}

impl ResourceSpec {
    fn default_limits() -> Self {
        Self {
            cpu: default_limit_cpu(),
            memory: default_limit_memory(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Health {
    #[serde(default = "default_liveness")]
    pub liveness: String,
    #[serde(default = "default_readiness")]
    pub readiness: String,
}

impl Default for Health {
    fn default() -> Self {
        Self {
            liveness: default_liveness(),
            readiness: default_readiness(),
        }
    }
}

/// The four-block governance companion attached to every generated document.
/// Field order here is the canonical emission order.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct GovernanceDocument {
    pub document_metadata: DocumentMetadata,
    pub governance_info: GovernanceInfo,
    pub registry_binding: RegistryBinding,
    pub vector_alignment_map: VectorAlignmentMap,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DocumentMetadata {
    pub unique_id: String,
    pub target_system: String,
    pub cross_layer_binding: Vec<String>,
    pub schema_version: String,
    pub generated_by: String,
    pub created_at: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct GovernanceInfo {
    pub owner: String,
    pub approval_chain: Vec<String>,
    pub compliance_tags: Vec<String>,
    pub lifecycle_policy: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RegistryBinding {
    pub service_endpoint: String,
    pub discovery_protocol: String,
    pub health_check_path: String,
    pub registry_ttl: i64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct VectorAlignmentMap {
    pub alignment_model: String,
    pub dim: u32,
    pub tolerance: f64,
    pub coherence_vector: Vec<f64>,
    pub function_keyword: Vec<String>,
    pub contextual_binding: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "UPPERCASE")]
pub enum Level {
    Info,
    Warning,
    Error,
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Level::Error => write!(f, "ERROR"),
            Level::Warning => write!(f, "WARNING"),
            Level::Info => write!(f, "INFO"),
        }
    }
}

/// One validator-reported issue.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Finding {
    pub level: Level,
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

/// Findings for one document plus derived counts.
#[derive(Debug, Serialize, Clone)]
pub struct FileReport {
    pub file: String,
    pub findings: Vec<Finding>,
    pub errors: usize,
    pub warnings: usize,
    pub infos: usize,
    pub valid: bool,
}

impl FileReport {
    pub fn new(file: String, findings: Vec<Finding>, strict: bool) -> Self {
        let errors = findings.iter().filter(|f| f.level == Level::Error).count();
        let warnings = findings
            .iter()
            .filter(|f| f.level == Level::Warning)
            .count();
        let infos = findings.iter().filter(|f| f.level == Level::Info).count();
        let valid = errors == 0 && (!strict || warnings == 0);
        Self {
            file,
            findings,
            errors,
            warnings,
            infos,
            valid,
        }
    }
}

/// Run-level summary over one or more file reports.
#[derive(Debug, Serialize, Clone)]
pub struct RunSummary {
    pub files: usize,
    pub failed: usize,
    pub errors: usize,
    pub warnings: usize,
    pub valid: bool,
}

#[derive(Debug, Serialize, Clone)]
pub struct RunReport {
    pub reports: Vec<FileReport>,
    pub summary: RunSummary,
}

/// Result of a `gen` run, as printed to the user.
#[derive(Debug, Serialize, Clone)]
pub struct GenReport {
    pub name: String,
    pub target: String,
    pub output_file: String,
    pub unique_id: String,
    pub locator: String,
    pub reference: String,
    pub notes: Vec<String>,
}

/// Result of a `convert` run.
#[derive(Debug, Serialize, Clone)]
pub struct ConvertReport {
    pub input_file: String,
    pub output_file: String,
    pub stripped: bool,
}
