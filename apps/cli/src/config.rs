//! CLI configuration file support.
//!
//! Configuration precedence:
//! 1. CLI arguments (handled by clap)
//! 2. Local config file (./.netcanvasrc)
//! 3. Global config file (~/.netcanvas/config.toml)
//! 4. Defaults

use netcanvas_orchestrator::{PipelineConfig, PipelineConfigLoader};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// CLI configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CliConfig {
    /// Log level
    #[serde(default)]
    pub log_level: Option<String>,

    /// Output format preferences
    #[serde(default)]
    pub output: OutputConfig,

    /// Pipeline tuning; defaults apply when absent
    #[serde(default)]
    pub pipeline: Option<PipelineConfig>,
}

/// Output format configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Default output format (human, json); human when unset
    #[serde(default)]
    pub format: Option<String>,
}

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum CliConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(String),

    #[error("Failed to read configuration file: {0}")]
    ReadError(String),

    #[error("Failed to parse configuration file: {0}")]
    ParseError(String),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

pub type CliConfigResult<T> = std::result::Result<T, CliConfigError>;

impl CliConfig {
    /// Load configuration from a TOML file.
    pub fn load_from_file(path: &Path) -> CliConfigResult<Self> {
        if !path.exists() {
            return Err(CliConfigError::NotFound(path.display().to_string()));
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| CliConfigError::ReadError(format!("{}: {}", path.display(), e)))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| CliConfigError::ParseError(format!("{}: {}", path.display(), e)))?;
        config.check()?;
        Ok(config)
    }

    /// Get default global configuration file path.
    pub fn default_global_path() -> PathBuf {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(".netcanvas")
            .join("config.toml")
    }

    /// Get default local configuration file path.
    pub fn default_local_path() -> PathBuf {
        PathBuf::from(".netcanvasrc")
    }

    /// Discover and load configuration files.
    ///
    /// Missing files are skipped silently; unreadable or invalid ones are
    /// logged and skipped so a bad global file never blocks a command.
    pub fn discover_and_load() -> Self {
        let mut config = Self::default();

        for path in [Self::default_global_path(), Self::default_local_path()] {
            match Self::load_from_file(&path) {
                Ok(found) => config.merge(&found),
                Err(CliConfigError::NotFound(_)) => {}
                Err(e) => tracing::warn!(path = %path.display(), error = %e, "Ignoring configuration file"),
            }
        }

        config
    }

    /// Merge another configuration into this one.
    ///
    /// Values from `other` override values in `self` if they are set.
    pub fn merge(&mut self, other: &Self) {
        if let Some(ref log_level) = other.log_level {
            self.log_level = Some(log_level.clone());
        }
        if let Some(ref format) = other.output.format {
            self.output.format = Some(format.clone());
        }
        if let Some(ref pipeline) = other.pipeline {
            self.pipeline = Some(pipeline.clone());
        }
    }

    /// Whether reports default to JSON.
    pub fn json_output(&self) -> bool {
        self.output.format.as_deref() == Some("json")
    }

    /// Pipeline configuration to run commands with.
    ///
    /// An explicit `--config` file wins over the `[pipeline]` table.
    pub fn pipeline_config(&self, override_path: Option<&Path>) -> anyhow::Result<PipelineConfig> {
        if let Some(path) = override_path {
            return PipelineConfigLoader::load(path)
                .map_err(|e| anyhow::anyhow!("{}: {}", path.display(), e));
        }
        Ok(self.pipeline.clone().unwrap_or_default())
    }

    fn check(&self) -> CliConfigResult<()> {
        if let Some(format) = self.output.format.as_deref().filter(|f| !matches!(*f, "human" | "json")) {
            return Err(CliConfigError::InvalidValue(format!(
                "output.format must be 'human' or 'json', got '{}'",
                format
            )));
        }
        if let Some(ref pipeline) = self.pipeline {
            PipelineConfigLoader::validate(pipeline)
                .map_err(|e| CliConfigError::InvalidValue(format!("pipeline: {}", e)))?;
        }
        Ok(())
    }
}
