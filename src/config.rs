//! Configuration Module
//!
//! Provides TOML-based configuration for Stream-Features.
//! Configuration is optional - CLI arguments can override file settings.

use std::path::Path;

use anyhow::{Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::export::OutputFormat;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub locator: LocatorConfig,
    pub window: WindowConfig,
    pub output: OutputConfig,
}

impl Config {
    /// Loads configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Loads configuration from file if it exists, otherwise returns defaults
    pub fn load_or_default(path: Option<&Path>) -> Self {
        match path {
            Some(p) => Self::load(p).unwrap_or_else(|e| {
                tracing::warn!("Failed to load config: {}, using defaults", e);
                Self::default()
            }),
            None => Self::default(),
        }
    }

    /// Generates a default configuration file content
    pub fn generate_default() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config)
            .unwrap_or_else(|_| "# Failed to generate config".to_string())
    }

    /// Validates the configuration
    pub fn validate(&self) -> Result<()> {
        if self.window.window_size <= 0.0 {
            anyhow::bail!("window_size must be greater than 0");
        }
        if self.window.first_n_seconds <= 0.0 {
            anyhow::bail!("first_n_seconds must be greater than 0");
        }
        if self.locator.remote_port_min > self.locator.remote_port_max {
            anyhow::bail!("remote_port_min must not exceed remote_port_max");
        }
        if let Err(e) = Regex::new(&self.locator.dns_pattern) {
            anyhow::bail!("dns_pattern is not a valid regex: {}", e);
        }
        Ok(())
    }
}

/// Flow-locator thresholds
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LocatorConfig {
    /// Lower bound of the streaming service's server-side port band
    pub remote_port_min: u16,
    /// Upper bound of the streaming service's server-side port band
    pub remote_port_max: u16,
    /// Fixed local port bound by the native client for video streams
    pub native_client_port: u16,
    /// A DNS-matched flow needs strictly more packets than this to be accepted
    pub min_fallback_packets: usize,
    /// Anchored pattern for the video CDN's DNS name shape
    pub dns_pattern: String,
}

impl Default for LocatorConfig {
    fn default() -> Self {
        Self {
            remote_port_min: 10_000,
            remote_port_max: 20_000,
            native_client_port: 49_005,
            min_fallback_packets: 10_000,
            dns_pattern: r"^\d+(?:-\d+)*\.pnt\.geforcenow\.nvidiagrid\.net$".to_string(),
        }
    }
}

/// Windowing defaults, overridable per invocation from the CLI
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Window width in seconds
    pub window_size: f64,
    /// Horizon in seconds; only the first n seconds of the flow are examined
    pub first_n_seconds: f64,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            window_size: 1.0,
            first_n_seconds: 5.0,
        }
    }
}

/// Output-related configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Output format (csv, json)
    #[serde(with = "output_format_serde")]
    pub format: OutputFormat,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Csv,
        }
    }
}

/// Custom serde implementation for OutputFormat
mod output_format_serde {
    use super::*;
    use serde::{Deserializer, Serializer};

    pub fn serialize<S>(format: &OutputFormat, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format.to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<OutputFormat, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
