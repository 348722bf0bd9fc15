use crate::cli::Target;
use crate::domain::constants;
use crate::domain::models::{
    DocumentMetadata, GovernanceDocument, GovernanceInfo, ModuleDescriptor, RegistryBinding,
    VectorAlignmentMap,
};
use crate::services::{coherence, identifier};
use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;

lazy_static! {
    static ref NAME_RE: Regex = Regex::new(r"^[a-z][a-z0-9-]*$").unwrap();
    static ref IMAGE_RE: Regex = Regex::new(
        r"^[a-z0-9]([a-z0-9._-]*[a-z0-9])?(/[a-z0-9]([a-z0-9._-]*[a-z0-9])?)*(:[A-Za-z0-9._-]+)?$"
    )
    .unwrap();
}

/// Structured, terminal generator error. When one of these triggers, the
/// generator emits only the error object, never a partial payload.
#[derive(thiserror::Error, Debug, Clone, Serialize)]
#[error("{code}: {message}")]
pub struct GenerateError {
    pub code: String,
    pub field: String,
    pub message: String,
    pub suggestions: Vec<String>,
}

impl GenerateError {
    fn new(code: &str, field: &str, message: String, suggestions: &[&str]) -> Self {
        Self {
            code: code.to_string(),
            field: field.to_string(),
            message,
            suggestions: suggestions.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Everything one generation call produces.
#[derive(Debug, Clone)]
pub struct GeneratedBundle {
    pub document_text: String,
    pub governance: GovernanceDocument,
    pub notes: Vec<String>,
    pub file_name: String,
    pub target: Target,
    /// Hierarchical locator for the minted document identity.
    pub locator: String,
    /// Namespaced reference for the described module.
    pub reference: String,
}

/// Generate the target payload plus governance companion for a descriptor.
pub fn generate(
    descriptor: &ModuleDescriptor,
    target_override: Option<Target>,
) -> Result<GeneratedBundle, GenerateError> {
    let name = descriptor.name.trim();
    if name.is_empty() {
        return Err(GenerateError::new(
            "MISSING_REQUIRED_FIELD",
            "name",
            "descriptor is missing the required `name` field".to_string(),
            &["add a lowercase hyphenated `name`, e.g. `user-service`"],
        ));
    }
    if !NAME_RE.is_match(name) {
        return Err(GenerateError::new(
            "INVALID_FIELD_TYPE",
            "name",
            format!("`{}` is not a lowercase hyphenated identifier", name),
            &["use only a-z, 0-9 and `-`, starting with a letter"],
        ));
    }

    let target = resolve_target(descriptor.target, target_override)?;

    let dim = descriptor.vector_dim.unwrap_or(constants::DEFAULT_DIM);
    if !constants::ALLOWED_DIMS.contains(&dim) {
        return Err(GenerateError::new(
            "VECTOR_DIM_OUT_OF_RANGE",
            "vector_dim",
            format!("vector_dim {} is not one of 1024, 2048, 4096", dim),
            &["omit vector_dim to accept the default 1024"],
        ));
    }

    let discovery = descriptor
        .discovery_protocol
        .clone()
        .unwrap_or_else(|| constants::DISCOVERY_PROTOCOLS[0].to_string());
    if !constants::DISCOVERY_PROTOCOLS.contains(&discovery.as_str()) {
        return Err(GenerateError::new(
            "INVALID_ENUM_VALUE",
            "discovery_protocol",
            format!("unknown discovery protocol `{}`", discovery),
            &["use one of consul, etcd, eureka"],
        ));
    }

    for port in &descriptor.ports {
        if !(1..=65535).contains(port) {
            return Err(GenerateError::new(
                "INVALID_PORT",
                "ports",
                format!("port {} is outside 1-65535", port),
                &["declare container ports within the TCP range"],
            ));
        }
    }

    let image = descriptor
        .image
        .clone()
        .unwrap_or_else(|| format!("{}:latest", name));
    if !IMAGE_RE.is_match(&image) {
        return Err(GenerateError::new(
            "INVALID_IMAGE_REF",
            "image",
            format!("`{}` is not a valid `name[:tag]` or `registry/name[:tag]` reference", image),
            &["use e.g. `registry.example.com/team/app:1.2.3`"],
        ));
    }

    let mut notes = Vec::new();

    let mut replicas = descriptor.replicas.unwrap_or(constants::DEFAULT_REPLICAS);
    if replicas <= 0 {
        notes.push(format!("replicas {} corrected to 1", replicas));
        replicas = 1;
    }

    let mut resources = descriptor.resources.clone();
    let req_cpu = parse_cpu_millis(&resources.requests.cpu);
    let lim_cpu = parse_cpu_millis(&resources.limits.cpu);
    if let (Some(req), Some(lim)) = (req_cpu, lim_cpu) {
        if lim < req {
            notes.push(format!(
                "cpu limit {} raised to request {}",
                resources.limits.cpu, resources.requests.cpu
            ));
            resources.limits.cpu = resources.requests.cpu.clone();
        }
    }
    let req_mem = parse_memory_bytes(&resources.requests.memory);
    let lim_mem = parse_memory_bytes(&resources.limits.memory);
    if let (Some(req), Some(lim)) = (req_mem, lim_mem) {
        if lim < req {
            notes.push(format!(
                "memory limit {} raised to request {}",
                resources.limits.memory, resources.requests.memory
            ));
            resources.limits.memory = resources.requests.memory.clone();
        }
    }

    let mut safe_env = BTreeMap::new();
    for (key, value) in &descriptor.env {
        if is_secret_key(key) {
            notes.push(format!(
                "env key {} redacted; inject it through the {}-secrets secret reference",
                key, name
            ));
        } else {
            safe_env.insert(key.clone(), value.clone());
        }
    }

    let minted = identifier::mint(&descriptor.namespace, "module", name);
    let governance = build_governance(descriptor, name, target, dim, &discovery, &minted);

    let corrected = CorrectedDescriptor {
        name,
        image: &image,
        replicas,
        resources: &resources,
        env: &safe_env,
        descriptor,
    };

    let document_text = match target {
        Target::Kubernetes => build_kubernetes(&corrected, &governance, &notes),
        Target::Compose => build_compose(&corrected, &governance, &notes),
        Target::Helm => build_helm(&corrected, &governance, &notes),
        Target::Nomad => build_nomad(&corrected, &governance, &notes),
    }
    .map_err(|e| {
        GenerateError::new(
            "GENERATION_FAILED",
            "",
            format!("failed to serialize {} payload: {}", target, e),
            &[],
        )
    })?;

    Ok(GeneratedBundle {
        document_text,
        governance,
        notes,
        file_name: format!("{}.{}", name, target.file_ext()),
        target,
        locator: minted.locator,
        reference: minted.reference,
    })
}

fn resolve_target(
    declared: Option<Target>,
    flag: Option<Target>,
) -> Result<Target, GenerateError> {
    match (declared, flag) {
        (Some(a), Some(b)) if a != b => Err(GenerateError::new(
            "AMBIGUOUS_TARGET",
            "target",
            format!("descriptor targets `{}` but --target requests `{}`", a, b),
            &["drop the --target flag or align it with the descriptor"],
        )),
        (_, Some(t)) | (Some(t), None) => Ok(t),
        (None, None) => Ok(Target::Kubernetes),
    }
}

fn is_secret_key(key: &str) -> bool {
    let upper = key.to_ascii_uppercase();
    constants::SECRET_SUFFIXES
        .iter()
        .any(|suffix| upper.ends_with(suffix))
}

/// Parse a Kubernetes cpu quantity into millicores. `250m` -> 250, `1` -> 1000.
pub fn parse_cpu_millis(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if let Some(stripped) = raw.strip_suffix('m') {
        stripped.parse::<i64>().ok()
    } else {
        raw.parse::<f64>().ok().map(|cores| (cores * 1000.0) as i64)
    }
}

/// Parse a Kubernetes memory quantity into bytes. Supports Ki/Mi/Gi suffixes.
pub fn parse_memory_bytes(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    for (suffix, factor) in [("Ki", 1i64 << 10), ("Mi", 1i64 << 20), ("Gi", 1i64 << 30)] {
        if let Some(stripped) = raw.strip_suffix(suffix) {
            return stripped.parse::<i64>().ok().map(|n| n * factor);
        }
    }
    raw.parse::<i64>().ok()
}

fn build_governance(
    descriptor: &ModuleDescriptor,
    name: &str,
    target: Target,
    dim: u32,
    discovery: &str,
    minted: &identifier::MintedId,
) -> GovernanceDocument {
    let mut compliance_tags = descriptor.compliance_tags.clone();
    if !compliance_tags.iter().any(|t| t == constants::MANAGED_TAG) {
        compliance_tags.push(constants::MANAGED_TAG.to_string());
    }
    dedupe(&mut compliance_tags);
    let lifecycle_policy = if compliance_tags.iter().any(|t| t == "critical") {
        "strict"
    } else {
        "standard"
    };

    let port = descriptor.ports.first().copied().unwrap_or(80);

    let mut function_keyword = vec![name.to_string()];
    function_keyword.extend(descriptor.function_keywords.iter().cloned());
    function_keyword.extend(coherence::infer_keywords(name));
    dedupe(&mut function_keyword);

    GovernanceDocument {
        document_metadata: DocumentMetadata {
            unique_id: minted.unique_id.clone(),
            target_system: target.as_str().to_string(),
            cross_layer_binding: descriptor.depends_on.clone(),
            schema_version: constants::SCHEMA_VERSION.to_string(),
            generated_by: constants::GENERATED_BY.to_string(),
            created_at: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
        },
        governance_info: GovernanceInfo {
            owner: descriptor.owner.clone(),
            approval_chain: vec![
                descriptor.owner.clone(),
                format!("{}-lead", descriptor.owner),
                constants::FINAL_APPROVER.to_string(),
            ],
            compliance_tags,
            lifecycle_policy: lifecycle_policy.to_string(),
        },
        registry_binding: RegistryBinding {
            service_endpoint: format!("http://{}:{}", name, port),
            discovery_protocol: discovery.to_string(),
            health_check_path: descriptor.health.readiness.clone(),
            registry_ttl: descriptor
                .registry_ttl
                .filter(|ttl| *ttl > 0)
                .unwrap_or(constants::DEFAULT_REGISTRY_TTL),
        },
        vector_alignment_map: VectorAlignmentMap {
            alignment_model: constants::ALIGNMENT_MODEL.to_string(),
            dim,
            tolerance: constants::DEFAULT_TOLERANCE,
            coherence_vector: coherence::derive_vector(name, dim),
            function_keyword,
            contextual_binding: format!("{} -> [{}]", name, descriptor.depends_on.join(", ")),
        },
    }
}

fn dedupe(values: &mut Vec<String>) {
    let mut seen = std::collections::HashSet::new();
    values.retain(|v| seen.insert(v.clone()));
}

struct CorrectedDescriptor<'a> {
    name: &'a str,
    image: &'a str,
    replicas: i64,
    resources: &'a crate::domain::models::Resources,
    env: &'a BTreeMap<String, String>,
    descriptor: &'a ModuleDescriptor,
}

fn header_comments(notes: &[String]) -> String {
    let mut out = format!("# generated-by: {}\n", constants::GENERATED_BY);
    for note in notes {
        out.push_str(&format!("# note: {}\n", note));
    }
    out
}

fn to_yaml_doc<T: Serialize>(value: &T) -> Result<String, serde_yaml::Error> {
    serde_yaml::to_string(value)
}

// ---- kubernetes target -------------------------------------------------

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Meta {
    name: String,
    namespace: String,
    labels: BTreeMap<String, String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Deployment {
    api_version: String,
    kind: String,
    metadata: Meta,
    spec: DeploymentSpec,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DeploymentSpec {
    replicas: i64,
    selector: Selector,
    template: PodTemplate,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Selector {
    match_labels: BTreeMap<String, String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PodTemplate {
    metadata: TemplateMeta,
    spec: PodSpec,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TemplateMeta {
    labels: BTreeMap<String, String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PodSpec {
    service_account_name: String,
    containers: Vec<Container>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Container {
    name: String,
    image: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    ports: Vec<ContainerPort>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    env: Vec<EnvVar>,
    env_from: Vec<EnvFrom>,
    liveness_probe: Probe,
    readiness_probe: Probe,
    resources: ResourceBlock,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ContainerPort {
    container_port: i64,
}

#[derive(Serialize)]
struct EnvVar {
    name: String,
    value: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EnvFrom {
    secret_ref: SecretRef,
}

#[derive(Serialize)]
struct SecretRef {
    name: String,
    optional: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Probe {
    http_get: HttpGet,
}

#[derive(Serialize)]
struct HttpGet {
    path: String,
    port: i64,
}

#[derive(Serialize)]
struct ResourceBlock {
    requests: BTreeMap<String, String>,
    limits: BTreeMap<String, String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Service {
    api_version: String,
    kind: String,
    metadata: Meta,
    spec: ServiceSpec,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ServiceSpec {
    selector: BTreeMap<String, String>,
    ports: Vec<ServicePort>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ServicePort {
    port: i64,
    target_port: i64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ConfigMap {
    api_version: String,
    kind: String,
    metadata: Meta,
    data: BTreeMap<String, String>,
}

fn identity_labels(name: &str) -> BTreeMap<String, String> {
    let mut labels = BTreeMap::new();
    labels.insert(constants::IDENTITY_LABEL.to_string(), "true".to_string());
    labels.insert(constants::NAME_LABEL.to_string(), name.to_string());
    labels
}

fn resource_block(resources: &crate::domain::models::Resources) -> ResourceBlock {
    let mut requests = BTreeMap::new();
    requests.insert("cpu".to_string(), resources.requests.cpu.clone());
    requests.insert("memory".to_string(), resources.requests.memory.clone());
    let mut limits = BTreeMap::new();
    limits.insert("cpu".to_string(), resources.limits.cpu.clone());
    limits.insert("memory".to_string(), resources.limits.memory.clone());
    ResourceBlock { requests, limits }
}

fn build_kubernetes(
    c: &CorrectedDescriptor,
    governance: &GovernanceDocument,
    notes: &[String],
) -> Result<String, serde_yaml::Error> {
    let probe_port = c.descriptor.ports.first().copied().unwrap_or(80);
    let mut labels = identity_labels(c.name);
    for (k, v) in &c.descriptor.labels {
        labels.insert(k.clone(), v.clone());
    }
    let mut selector = BTreeMap::new();
    selector.insert(constants::NAME_LABEL.to_string(), c.name.to_string());

    let deployment = Deployment {
        api_version: "apps/v1".to_string(),
        kind: "Deployment".to_string(),
        metadata: Meta {
            name: c.name.to_string(),
            namespace: c.descriptor.namespace.clone(),
            labels: labels.clone(),
        },
        spec: DeploymentSpec {
            replicas: c.replicas,
            selector: Selector {
                match_labels: selector.clone(),
            },
            template: PodTemplate {
                metadata: TemplateMeta {
                    labels: labels.clone(),
                },
                spec: PodSpec {
                    service_account_name: format!("{}-identity", c.name),
                    containers: vec![Container {
                        name: c.name.to_string(),
                        image: c.image.to_string(),
                        ports: c
                            .descriptor
                            .ports
                            .iter()
                            .map(|p| ContainerPort { container_port: *p })
                            .collect(),
                        env: c
                            .env
                            .iter()
                            .map(|(k, v)| EnvVar {
                                name: k.clone(),
                                value: v.clone(),
                            })
                            .collect(),
                        env_from: vec![EnvFrom {
                            secret_ref: SecretRef {
                                name: format!("{}-secrets", c.name),
                                optional: true,
                            },
                        }],
                        liveness_probe: Probe {
                            http_get: HttpGet {
                                path: c.descriptor.health.liveness.clone(),
                                port: probe_port,
                            },
                        },
                        readiness_probe: Probe {
                            http_get: HttpGet {
                                path: c.descriptor.health.readiness.clone(),
                                port: probe_port,
                            },
                        },
                        resources: resource_block(c.resources),
                    }],
                },
            },
        },
    };

    let service = Service {
        api_version: "v1".to_string(),
        kind: "Service".to_string(),
        metadata: Meta {
            name: c.name.to_string(),
            namespace: c.descriptor.namespace.clone(),
            labels: identity_labels(c.name),
        },
        spec: ServiceSpec {
            selector,
            ports: c
                .descriptor
                .ports
                .iter()
                .map(|p| ServicePort {
                    port: *p,
                    target_port: *p,
                })
                .collect(),
        },
    };

    let governance_json = serde_json::to_string(governance).map_err(<serde_yaml::Error as serde::ser::Error>::custom)?;
    let mut data = BTreeMap::new();
    data.insert(constants::GOVERNANCE_KEY.to_string(), governance_json);
    let configmap = ConfigMap {
        api_version: "v1".to_string(),
        kind: "ConfigMap".to_string(),
        metadata: Meta {
            name: format!("{}-governance", c.name),
            namespace: c.descriptor.namespace.clone(),
            labels: identity_labels(c.name),
        },
        data,
    };

    let mut out = String::from("---\n");
    out.push_str(&header_comments(notes));
    out.push_str(&to_yaml_doc(&deployment)?);
    out.push_str("---\n");
    out.push_str(&to_yaml_doc(&service)?);
    out.push_str("---\n");
    out.push_str(&to_yaml_doc(&configmap)?);
    out.push_str("---\n");
    out.push_str(&to_yaml_doc(governance)?);
    Ok(out)
}

// ---- compose target ----------------------------------------------------

#[derive(Serialize)]
struct ComposeFile {
    services: BTreeMap<String, ComposeService>,
    #[serde(rename = "x-governance")]
    x_governance: GovernanceDocument,
}

#[derive(Serialize)]
struct ComposeService {
    image: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    ports: Vec<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    environment: BTreeMap<String, String>,
    labels: BTreeMap<String, String>,
    deploy: ComposeDeploy,
    healthcheck: ComposeHealthcheck,
}

#[derive(Serialize)]
struct ComposeDeploy {
    replicas: i64,
    resources: ComposeResources,
}

#[derive(Serialize)]
struct ComposeResources {
    limits: ComposeResourceSpec,
    reservations: ComposeResourceSpec,
}

#[derive(Serialize)]
struct ComposeResourceSpec {
    cpus: String,
    memory: String,
}

#[derive(Serialize)]
struct ComposeHealthcheck {
    test: Vec<String>,
    interval: String,
    timeout: String,
    retries: u32,
}

fn cpus_string(raw: &str) -> String {
    match parse_cpu_millis(raw) {
        Some(millis) => format!("{:.2}", millis as f64 / 1000.0),
        None => raw.to_string(),
    }
}

fn build_compose(
    c: &CorrectedDescriptor,
    governance: &GovernanceDocument,
    notes: &[String],
) -> Result<String, serde_yaml::Error> {
    let health_port = c.descriptor.ports.first().copied().unwrap_or(80);
    let service = ComposeService {
        image: c.image.to_string(),
        ports: c
            .descriptor
            .ports
            .iter()
            .map(|p| format!("{}:{}", p, p))
            .collect(),
        environment: c.env.clone(),
        labels: identity_labels(c.name),
        deploy: ComposeDeploy {
            replicas: c.replicas,
            resources: ComposeResources {
                limits: ComposeResourceSpec {
                    cpus: cpus_string(&c.resources.limits.cpu),
                    memory: c.resources.limits.memory.clone(),
                },
                reservations: ComposeResourceSpec {
                    cpus: cpus_string(&c.resources.requests.cpu),
                    memory: c.resources.requests.memory.clone(),
                },
            },
        },
        healthcheck: ComposeHealthcheck {
            test: vec![
                "CMD".to_string(),
                "curl".to_string(),
                "-f".to_string(),
                format!("http://localhost:{}{}", health_port, c.descriptor.health.liveness),
            ],
            interval: "30s".to_string(),
            timeout: "5s".to_string(),
            retries: 3,
        },
    };

    let mut services = BTreeMap::new();
    services.insert(c.name.to_string(), service);
    let file = ComposeFile {
        services,
        x_governance: governance.clone(),
    };

    let mut out = String::from("---\n");
    out.push_str(&header_comments(notes));
    out.push_str(&to_yaml_doc(&file)?);
    Ok(out)
}

// ---- helm values target ------------------------------------------------

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HelmValues {
    replica_count: i64,
    image: HelmImage,
    service: HelmService,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    env: BTreeMap<String, String>,
    labels: BTreeMap<String, String>,
    resources: ResourceBlock,
    probes: HelmProbes,
}

#[derive(Serialize)]
struct HelmImage {
    repository: String,
    tag: String,
}

#[derive(Serialize)]
struct HelmService {
    port: i64,
}

#[derive(Serialize)]
struct HelmProbes {
    liveness: String,
    readiness: String,
}

fn build_helm(
    c: &CorrectedDescriptor,
    governance: &GovernanceDocument,
    notes: &[String],
) -> Result<String, serde_yaml::Error> {
    let (repository, tag) = match c.image.rsplit_once(':') {
        Some((repo, tag)) if !tag.contains('/') => (repo.to_string(), tag.to_string()),
        _ => (c.image.to_string(), "latest".to_string()),
    };
    let values = HelmValues {
        replica_count: c.replicas,
        image: HelmImage { repository, tag },
        service: HelmService {
            port: c.descriptor.ports.first().copied().unwrap_or(80),
        },
        env: c.env.clone(),
        labels: identity_labels(c.name),
        resources: resource_block(c.resources),
        probes: HelmProbes {
            liveness: c.descriptor.health.liveness.clone(),
            readiness: c.descriptor.health.readiness.clone(),
        },
    };

    let governance_json = serde_json::to_string(governance).map_err(<serde_yaml::Error as serde::ser::Error>::custom)?;
    let mut out = String::from("---\n");
    out.push_str(&header_comments(notes));
    out.push_str(&to_yaml_doc(&values)?);
    out.push_str(&format!(
        "{} {}\n",
        constants::GOVERNANCE_COMMENT,
        governance_json
    ));
    Ok(out)
}

// ---- nomad job target --------------------------------------------------

#[derive(Serialize)]
struct NomadFile {
    job: NomadJob,
}

#[derive(Serialize)]
struct NomadJob {
    id: String,
    datacenters: Vec<String>,
    #[serde(rename = "type")]
    job_type: String,
    group: NomadGroup,
    meta: BTreeMap<String, String>,
}

#[derive(Serialize)]
struct NomadGroup {
    count: i64,
    task: NomadTask,
}

#[derive(Serialize)]
struct NomadTask {
    driver: String,
    config: NomadConfig,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    env: BTreeMap<String, String>,
    resources: NomadResources,
    service: NomadService,
}

#[derive(Serialize)]
struct NomadConfig {
    image: String,
}

#[derive(Serialize)]
struct NomadResources {
    cpu: i64,
    memory: i64,
}

#[derive(Serialize)]
struct NomadService {
    name: String,
    port: i64,
    check: NomadCheck,
}

#[derive(Serialize)]
#[serde(rename_all = "snake_case")]
struct NomadCheck {
    #[serde(rename = "type")]
    check_type: String,
    path: String,
    interval: String,
    timeout: String,
}

fn build_nomad(
    c: &CorrectedDescriptor,
    governance: &GovernanceDocument,
    notes: &[String],
) -> Result<String, serde_yaml::Error> {
    let governance_json = serde_json::to_string(governance).map_err(<serde_yaml::Error as serde::ser::Error>::custom)?;
    let mut meta = BTreeMap::new();
    meta.insert(constants::GOVERNANCE_KEY.to_string(), governance_json);

    let file = NomadFile {
        job: NomadJob {
            id: c.name.to_string(),
            datacenters: vec!["dc1".to_string()],
            job_type: "service".to_string(),
            group: NomadGroup {
                count: c.replicas,
                task: NomadTask {
                    driver: "docker".to_string(),
                    config: NomadConfig {
                        image: c.image.to_string(),
                    },
                    env: c.env.clone(),
                    resources: NomadResources {
                        cpu: parse_cpu_millis(&c.resources.limits.cpu).unwrap_or(500),
                        memory: parse_memory_bytes(&c.resources.limits.memory)
                            .map(|b| b / (1 << 20))
                            .unwrap_or(512),
                    },
                    service: NomadService {
                        name: c.name.to_string(),
                        port: c.descriptor.ports.first().copied().unwrap_or(80),
                        check: NomadCheck {
                            check_type: "http".to_string(),
                            path: c.descriptor.health.readiness.clone(),
                            interval: "10s".to_string(),
                            timeout: "2s".to_string(),
                        },
                    },
                },
            },
            meta,
        },
    };

    let mut out = String::from("---\n");
    out.push_str(&header_comments(notes));
    out.push_str(&to_yaml_doc(&file)?);
    out.push_str("---\n");
    out.push_str(&to_yaml_doc(governance)?);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::ModuleDescriptor;

    fn descriptor(name: &str) -> ModuleDescriptor {
        let mut d = ModuleDescriptor::default();
        d.name = name.to_string();
        d.namespace = constants::DEFAULT_NAMESPACE.to_string();
        d.owner = constants::DEFAULT_OWNER.to_string();
        d.compliance_tags = vec!["internal".to_string()];
        d
    }

    #[test]
    fn missing_name_is_a_structured_error() {
        let err = generate(&ModuleDescriptor::default(), None).unwrap_err();
        assert_eq!(err.code, "MISSING_REQUIRED_FIELD");
        assert_eq!(err.field, "name");
        assert!(!err.suggestions.is_empty());
    }

    #[test]
    fn invalid_port_is_rejected() {
        let mut d = descriptor("svc");
        d.ports = vec![70000];
        let err = generate(&d, None).unwrap_err();
        assert_eq!(err.code, "INVALID_PORT");
    }

    #[test]
    fn malformed_image_is_rejected() {
        let mut d = descriptor("svc");
        d.image = Some("Bad Image!!".to_string());
        let err = generate(&d, None).unwrap_err();
        assert_eq!(err.code, "INVALID_IMAGE_REF");
    }

    #[test]
    fn conflicting_targets_are_ambiguous() {
        let mut d = descriptor("svc");
        d.target = Some(Target::Compose);
        let err = generate(&d, Some(Target::Nomad)).unwrap_err();
        assert_eq!(err.code, "AMBIGUOUS_TARGET");
    }

    #[test]
    fn matching_targets_are_not_ambiguous() {
        let mut d = descriptor("svc");
        d.target = Some(Target::Compose);
        let bundle = generate(&d, Some(Target::Compose)).unwrap();
        assert_eq!(bundle.target, Target::Compose);
    }

    #[test]
    fn bad_vector_dim_is_rejected() {
        let mut d = descriptor("svc");
        d.vector_dim = Some(512);
        let err = generate(&d, None).unwrap_err();
        assert_eq!(err.code, "VECTOR_DIM_OUT_OF_RANGE");
    }

    #[test]
    fn negative_replicas_are_corrected_with_note() {
        let mut d = descriptor("x");
        d.replicas = Some(-5);
        let bundle = generate(&d, None).unwrap();
        assert!(bundle.notes.iter().any(|n| n.contains("replicas -5 corrected to 1")));
        assert!(bundle.document_text.contains("replicas: 1"));
    }

    #[test]
    fn low_limits_are_raised_to_requests() {
        let mut d = descriptor("svc");
        d.resources.limits.cpu = "50m".to_string();
        d.resources.limits.memory = "128Mi".to_string();
        let bundle = generate(&d, None).unwrap();
        assert!(bundle.notes.iter().any(|n| n.contains("cpu limit")));
        assert!(bundle.notes.iter().any(|n| n.contains("memory limit")));
        assert!(!bundle.document_text.contains("cpu: 50m"));
    }

    #[test]
    fn secret_env_keys_are_redacted() {
        let mut d = descriptor("svc");
        d.env.insert("DB_PASSWORD".to_string(), "hunter2".to_string());
        d.env.insert("LOG_LEVEL".to_string(), "info".to_string());
        let bundle = generate(&d, None).unwrap();
        // the key survives only in the redaction note, never as an env entry
        assert!(!bundle.document_text.contains("name: DB_PASSWORD"));
        assert!(!bundle.document_text.contains("hunter2"));
        assert!(bundle.document_text.contains("LOG_LEVEL"));
        assert!(bundle.notes.iter().any(|n| n.contains("DB_PASSWORD")));
    }

    #[test]
    fn scenario_a_endpoint_and_binding() {
        let mut d = descriptor("user-service");
        d.ports = vec![8080];
        d.depends_on = vec!["auth-service".to_string()];
        let bundle = generate(&d, None).unwrap();
        assert_eq!(
            bundle.governance.registry_binding.service_endpoint,
            "http://user-service:8080"
        );
        assert_eq!(
            bundle.governance.vector_alignment_map.contextual_binding,
            "user-service -> [auth-service]"
        );
    }

    #[test]
    fn generation_is_idempotent_except_id_and_timestamp() {
        let mut d = descriptor("orders-api");
        d.ports = vec![9000];
        let a = generate(&d, None).unwrap();
        let b = generate(&d, None).unwrap();
        assert_ne!(
            a.governance.document_metadata.unique_id,
            b.governance.document_metadata.unique_id
        );
        assert_eq!(a.governance.governance_info.owner, b.governance.governance_info.owner);
        assert_eq!(
            a.governance.vector_alignment_map.coherence_vector,
            b.governance.vector_alignment_map.coherence_vector
        );
        assert_eq!(
            a.governance.registry_binding.service_endpoint,
            b.governance.registry_binding.service_endpoint
        );
    }

    #[test]
    fn cpu_and_memory_quantities_parse() {
        assert_eq!(parse_cpu_millis("250m"), Some(250));
        assert_eq!(parse_cpu_millis("1"), Some(1000));
        assert_eq!(parse_memory_bytes("256Mi"), Some(256 * (1 << 20)));
        assert_eq!(parse_memory_bytes("1Gi"), Some(1 << 30));
        assert_eq!(parse_memory_bytes("junk"), None);
    }

    #[test]
    fn approval_chain_derives_from_owner() {
        let mut d = descriptor("svc");
        d.owner = "payments-team".to_string();
        let bundle = generate(&d, None).unwrap();
        assert_eq!(
            bundle.governance.governance_info.approval_chain,
            vec!["payments-team", "payments-team-lead", "platform-arch"]
        );
    }

    #[test]
    fn critical_tag_selects_strict_lifecycle() {
        let mut d = descriptor("svc");
        d.compliance_tags = vec!["critical".to_string()];
        let bundle = generate(&d, None).unwrap();
        assert_eq!(bundle.governance.governance_info.lifecycle_policy, "strict");
        assert!(bundle
            .governance
            .governance_info
            .compliance_tags
            .contains(&constants::MANAGED_TAG.to_string()));
    }
}
