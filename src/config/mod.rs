//! Configuration module
//!
//! Handles loading and managing tool configuration.

#![allow(dead_code)]

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AppConfig {
    /// Default output format (table, json, json-pretty, csv, summary)
    pub default_format: String,

    /// Store sealed outcomes after every run
    pub store_results: bool,

    /// Results directory; the platform data dir is used when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results_dir: Option<PathBuf>,

    /// Suite name used when storing results
    pub suite: String,

    /// Colorize terminal output
    pub color: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            default_format: "table".to_string(),
            store_results: false,
            results_dir: None,
            suite: "default".to_string(),
            color: true,
        }
    }
}

impl AppConfig {
    /// Load configuration from file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content =
            std::fs::read_to_string(path.as_ref()).context("Failed to read config file")?;

        let config: Self = if path
            .as_ref()
            .extension()
            .map(|e| e == "yaml" || e == "yml")
            .unwrap_or(false)
        {
            serde_yaml::from_str(&content).context("Failed to parse YAML config")?
        } else {
            serde_json::from_str(&content).context("Failed to parse JSON config")?
        };

        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = if path
            .as_ref()
            .extension()
            .map(|e| e == "yaml" || e == "yml")
            .unwrap_or(false)
        {
            serde_yaml::to_string(self).context("Failed to serialize config")?
        } else {
            serde_json::to_string_pretty(self).context("Failed to serialize config")?
        };

        std::fs::write(path, content).context("Failed to write config file")?;
        Ok(())
    }
}
