use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};

#[derive(Parser, Debug)]
#[command(name = "ecogov", version, about = "Ecosystem governance toolkit")]
pub struct Cli {
    #[arg(long, global = true, help = "Output machine-readable JSON")]
    pub json: bool,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate a deployment manifest plus governance companion from a descriptor
    Gen {
        #[arg(long, help = "Module descriptor file (JSON or YAML)")]
        input: String,
        #[arg(long, value_enum, help = "Target platform (overrides descriptor)")]
        target: Option<Target>,
        #[arg(long, default_value = ".", help = "Output directory")]
        output: String,
    },
    /// Validate a single governed document
    Validate {
        file: String,
        #[arg(long, default_value_t = false, help = "Treat warnings as failures")]
        strict: bool,
    },
    /// Recursively validate every YAML document under a directory
    Lint {
        #[arg(default_value = ".")]
        dir: String,
        #[arg(long, default_value_t = false, help = "Treat warnings as failures")]
        strict: bool,
    },
    /// Strip the governance companion, leaving a plain target manifest
    Convert {
        file: String,
        #[arg(long, help = "Output directory (defaults to the input's directory)")]
        output: Option<String>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Target {
    Kubernetes,
    Compose,
    Helm,
    Nomad,
}

impl Target {
    pub fn as_str(&self) -> &'static str {
        match self {
            Target::Kubernetes => "kubernetes",
            Target::Compose => "compose",
            Target::Helm => "helm",
            Target::Nomad => "nomad",
        }
    }

    pub fn file_ext(&self) -> &'static str {
        match self {
            Target::Kubernetes => "k8s.yaml",
            Target::Compose => "compose.yaml",
            Target::Helm => "values.yaml",
            Target::Nomad => "job.yaml",
        }
    }
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
