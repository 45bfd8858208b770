//! TOML configuration for the suggestion pipeline.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O error reading the file.
    #[error("Failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error.
    #[error("Failed to parse TOML configuration: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error.
    #[error("Invalid configuration: {0}")]
    Validation(String),
}

/// Pipeline configuration loaded from TOML.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub placement: PlacementConfig,

    #[serde(default)]
    pub proposal: ProposalConfig,
}

/// Placement engine tuning, in canvas units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementConfig {
    /// Grid pitch every placed coordinate is snapped to.
    pub grid_size: f64,
    /// Minimum distance kept from any existing device.
    pub min_spacing: f64,
    /// Spiral search attempts before giving up on overlap avoidance.
    pub max_attempts: u32,
    /// Base offset from the centroid of connected devices.
    pub connected_radius: f64,
    /// Extra random offset added to `connected_radius`.
    pub connected_jitter: f64,
    /// Base offset from the centroid of same-type devices.
    pub similar_radius: f64,
    /// Extra random offset added to `similar_radius`.
    pub similar_jitter: f64,
    /// Fraction of a building's size used for jitter around its center.
    pub building_inset: f64,
    /// Horizontal jitter around a tier's base coordinate.
    pub tier_jitter_x: f64,
    /// Vertical jitter around a tier's base coordinate.
    pub tier_jitter_y: f64,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            grid_size: 20.0,
            min_spacing: 80.0,
            max_attempts: 100,
            connected_radius: 150.0,
            connected_jitter: 100.0,
            similar_radius: 90.0,
            similar_jitter: 60.0,
            building_inset: 0.6,
            tier_jitter_x: 120.0,
            tier_jitter_y: 40.0,
        }
    }
}

/// Change-proposal extraction settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProposalConfig {
    /// Action tags that mark a fenced block as a change proposal.
    pub actions: Vec<String>,
}

impl Default for ProposalConfig {
    fn default() -> Self {
        Self { actions: vec!["propose_changes".to_string(), "update_devices".to_string()] }
    }
}

impl ProposalConfig {
    /// Whether `action` is a recognized proposal tag.
    pub fn recognizes(&self, action: &str) -> bool {
        self.actions.iter().any(|a| a == action)
    }
}

/// Configuration loader for pipeline settings.
pub struct PipelineConfigLoader;

impl PipelineConfigLoader {
    /// Loads pipeline configuration from a TOML file.
    ///
    /// # Errors
    /// Returns error if file cannot be read, parsed or validated.
    pub fn load(path: &Path) -> Result<PipelineConfig, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parses and validates configuration text.
    pub fn parse(content: &str) -> Result<PipelineConfig, ConfigError> {
        let config: PipelineConfig = toml::from_str(content)?;
        Self::validate(&config)?;
        Ok(config)
    }

    /// Validates pipeline configuration.
    pub fn validate(config: &PipelineConfig) -> Result<(), ConfigError> {
        let p = &config.placement;

        for (name, value) in [
            ("grid_size", p.grid_size),
            ("min_spacing", p.min_spacing),
            ("connected_radius", p.connected_radius),
            ("similar_radius", p.similar_radius),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::Validation(format!(
                    "placement.{}: must be a positive number, got {}",
                    name, value
                )));
            }
        }

        for (name, value) in [
            ("connected_jitter", p.connected_jitter),
            ("similar_jitter", p.similar_jitter),
            ("tier_jitter_x", p.tier_jitter_x),
            ("tier_jitter_y", p.tier_jitter_y),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Validation(format!(
                    "placement.{}: must not be negative, got {}",
                    name, value
                )));
            }
        }

        if !(p.building_inset > 0.0 && p.building_inset <= 1.0) {
            return Err(ConfigError::Validation(format!(
                "placement.building_inset: must be in (0, 1], got {}",
                p.building_inset
            )));
        }

        if config.proposal.actions.iter().all(|a| a.trim().is_empty()) {
            return Err(ConfigError::Validation(
                "proposal.actions: at least one action tag is required".to_string(),
            ));
        }

        Ok(())
    }
}
