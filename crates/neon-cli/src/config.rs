//! CLI configuration: an optional TOML file plus environment overrides.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::debug;

use neon_core::FailurePolicy;
use neon_graph::GraphConfig;

/// Config file picked up from the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "neon.toml";

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct NeonConfig {
    pub graph: GraphConfig,
    pub reconcile: ReconcileConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ReconcileConfig {
    pub on_failure: FailurePolicy,
}

impl NeonConfig {
    /// Load `path`, or `neon.toml` if present, then apply `NEO4J_*`
    /// environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let default = PathBuf::from(DEFAULT_CONFIG_FILE);
                if default.exists() {
                    Self::from_file(&default)?
                } else {
                    Self::default()
                }
            }
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = toml::from_str(&raw).with_context(|| format!("Invalid config file {}", path.display()))?;
        debug!(path = %path.display(), "Loaded config");
        Ok(config)
    }

    /// Override connection settings from the environment. `lookup` returns
    /// the value of a variable, if set.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let graph = &mut self.graph;
        for (key, slot) in [
            ("NEO4J_URI", &mut graph.uri),
            ("NEO4J_USER", &mut graph.user),
            ("NEO4J_PASSWORD", &mut graph.password),
            ("NEO4J_DB", &mut graph.db),
        ] {
            if let Some(value) = lookup(key) {
                *slot = value;
            }
        }
    }
}
