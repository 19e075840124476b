//! Configuration loader
//!
//! Loads and validates the compiler YAML configuration.

use anyhow::{anyhow, Context, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::types::CompilerConfig;

/// Environment variable naming the configuration file.
pub const CONFIG_ENV_VAR: &str = "PIPELINE_COMPILER_CONFIG";

pub struct ConfigLoader {
    path: Option<PathBuf>,
}

impl ConfigLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    /// A loader that always yields the built-in defaults.
    pub fn defaults() -> Self {
        Self { path: None }
    }

    /// Create loader from an explicit path, else PIPELINE_COMPILER_CONFIG,
    /// else built-in defaults.
    pub fn resolve(explicit: Option<&Path>) -> Self {
        if let Some(path) = explicit {
            return Self::new(path);
        }
        match std::env::var(CONFIG_ENV_VAR) {
            Ok(path) if !path.trim().is_empty() => Self::new(path),
            _ => Self::defaults(),
        }
    }

    /// Path the loader reads from, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn load(&self) -> Result<CompilerConfig> {
        let Some(path) = &self.path else {
            debug!("No compiler config file, using defaults");
            return Ok(CompilerConfig::default());
        };

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config = CompilerConfig::from_yaml_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        validate_config(&config).with_context(|| format!("Invalid config {}", path.display()))?;

        info!(
            "Loaded compiler config from {} (keying: {:?}, policy: {:?})",
            path.display(),
            config.mapper_keying,
            config.shape_policy
        );
        Ok(config)
    }
}

/// Structural checks the type system cannot express.
pub fn validate_config(config: &CompilerConfig) -> Result<()> {
    let vocab = &config.vocabulary;
    if config.mapper_contract.trim().is_empty() {
        return Err(anyhow!("mapper_contract must not be empty"));
    }
    if !vocab.single_value.contains(&vocab.canonical_single) {
        return Err(anyhow!(
            "canonical_single '{}' is not listed in vocabulary.single_value",
            vocab.canonical_single
        ));
    }
    if !vocab.multi_value.contains(&vocab.canonical_many) {
        return Err(anyhow!(
            "canonical_many '{}' is not listed in vocabulary.multi_value",
            vocab.canonical_many
        ));
    }

    let families = [
        ("single_value", &vocab.single_value),
        ("multi_value", &vocab.multi_value),
        ("lazy_sequence", &vocab.lazy_sequence),
        ("future", &vocab.future),
    ];
    for (i, (name, list)) in families.iter().enumerate() {
        for (other, other_list) in families.iter().skip(i + 1) {
            if let Some(shared) = list.iter().find(|w| other_list.contains(w)) {
                return Err(anyhow!(
                    "wrapper '{}' appears in both vocabulary.{} and vocabulary.{}",
                    shared,
                    name,
                    other
                ));
            }
        }
    }
    Ok(())
}
