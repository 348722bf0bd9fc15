//! Protocol-level constants shared by every document the toolkit emits.
//!
//! The validator hard-fails documents that depart from these values, so the
//! generator and validator must read them from this one place. None of them
//! is configurable at runtime.

/// Toolkit identity string written into `document_metadata.generated_by`.
pub const GENERATED_BY: &str = "ecogov v0.4.0";

/// Compliance tag appended to every generated document's tag list.
pub const MANAGED_TAG: &str = "ecogov-managed";

/// Governance document schema version.
pub const SCHEMA_VERSION: &str = "gov-doc/v1";

/// Placeholder alignment model identifier. Not a trained model.
pub const ALIGNMENT_MODEL: &str = "eco-align-v2-static";

/// Default coherence tolerance. Valid range is [0.0001, 0.005].
pub const DEFAULT_TOLERANCE: f64 = 0.001;
pub const TOLERANCE_MIN: f64 = 0.0001;
pub const TOLERANCE_MAX: f64 = 0.005;

/// Label key stamped on every generated resource.
pub const IDENTITY_LABEL: &str = "app.ecogov.dev/managed";
pub const NAME_LABEL: &str = "app.ecogov.dev/name";

/// ConfigMap / meta key carrying the embedded governance JSON.
pub const GOVERNANCE_KEY: &str = "governance.json";

/// Comment marker carrying the governance JSON in single-document targets.
pub const GOVERNANCE_COMMENT: &str = "# governance-companion:";

/// Allowed coherence vector dimensionalities.
pub const ALLOWED_DIMS: [u32; 3] = [1024, 2048, 4096];

/// Allowed service discovery protocols for `registry_binding`.
pub const DISCOVERY_PROTOCOLS: [&str; 3] = ["consul", "etcd", "eureka"];

/// Environment variable key suffixes that must never appear inline.
pub const SECRET_SUFFIXES: [&str; 5] =
    ["_KEY", "_SECRET", "_PASSWORD", "_TOKEN", "_CREDENTIAL"];

/// Descriptor defaults.
pub const DEFAULT_NAMESPACE: &str = "eco-base";
pub const DEFAULT_OWNER: &str = "platform-team";
pub const DEFAULT_REPLICAS: i64 = 2;
pub const DEFAULT_DIM: u32 = 1024;
pub const DEFAULT_REGISTRY_TTL: i64 = 30;
pub const DEFAULT_COMPLIANCE_TAG: &str = "internal";
pub const FINAL_APPROVER: &str = "platform-arch";
