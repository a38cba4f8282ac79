//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.hashharvest.toml` files.

use crate::models::GroupProfile;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Remote API settings.
    #[serde(default)]
    pub api: ApiConfig,

    /// Output settings.
    #[serde(default)]
    pub output: OutputConfig,

    /// Threat-actor group profiles to collect, in run order.
    #[serde(default = "default_groups")]
    pub groups: Vec<GroupProfile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            output: OutputConfig::default(),
            groups: default_groups(),
        }
    }
}

/// MalwareBazaar API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Endpoint URL for tag queries.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Auth key. Usually supplied via MALWAREBAZAAR_API_KEY instead of
    /// being written to the config file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,

    /// Samples requested per tag query. The service caps this at 1000.
    #[serde(default = "default_limit")]
    pub limit: usize,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            key: None,
            limit: default_limit(),
            timeout_seconds: default_timeout(),
        }
    }
}

fn default_endpoint() -> String {
    "https://mb-api.abuse.ch/api/v1/".to_string()
}

fn default_limit() -> usize {
    1000 // service maximum per tag query
}

fn default_timeout() -> u64 {
    30
}

/// Output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory the per-group CSV files are written to.
    #[serde(default = "default_output_dir")]
    pub dir: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
        }
    }
}

fn default_output_dir() -> String {
    ".".to_string()
}

/// Default group list: the TEMP.Veles profile the tool originally shipped
/// for. Serves as a working example until a custom config is written.
fn default_groups() -> Vec<GroupProfile> {
    vec![GroupProfile {
        name: "TEMP.Veles".to_string(),
        identifier: "G0086".to_string(),
        tags: vec![
            // Primary identifiers
            "TEMPVeles".to_string(),
            "G0086".to_string(),
            "XENOTIME".to_string(),
            "ATK91".to_string(),
            // Associated malware and tools
            "TRITON".to_string(),
            "TRISIS".to_string(),
            "CATRUNNER".to_string(),
            "WMImplant".to_string(),
            "cryptcat".to_string(),
        ],
    }]
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(".hashharvest.toml");

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings.
    /// This method only overrides config when CLI provides explicit values.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref endpoint) = args.endpoint {
            self.api.endpoint = endpoint.clone();
        }
        if let Some(ref key) = args.api_key {
            self.api.key = Some(key.clone());
        }
        if let Some(limit) = args.limit {
            self.api.limit = limit;
        }
        if let Some(timeout) = args.timeout {
            self.api.timeout_seconds = timeout;
        }
        if let Some(ref dir) = args.output_dir {
            self.output.dir = dir.display().to_string();
        }
    }

    /// The effective auth key, if any was configured.
    pub fn api_key(&self) -> Option<&str> {
        self.api.key.as_deref().filter(|k| !k.is_empty())
    }

    /// Validate settings that the remote service or the writer would reject.
    pub fn validate(&self) -> Result<(), String> {
        if !self.api.endpoint.starts_with("http://") && !self.api.endpoint.starts_with("https://") {
            return Err("API endpoint must start with 'http://' or 'https://'".to_string());
        }

        if self.api.limit == 0 || self.api.limit > 1000 {
            return Err("API limit must be between 1 and 1000".to_string());
        }

        if self.api.timeout_seconds == 0 {
            return Err("Timeout must be at least 1 second".to_string());
        }

        if self.groups.is_empty() {
            return Err("No groups configured. Add a [[groups]] entry.".to_string());
        }

        for group in &self.groups {
            if group.name.is_empty() || group.identifier.is_empty() {
                return Err("Every group needs a non-empty name and identifier".to_string());
            }
            if group.tags.is_empty() {
                return Err(format!("Group '{}' has no search tags", group.name));
            }
            if group.tags.iter().any(|t| t.trim().is_empty()) {
                return Err(format!("Group '{}' has an empty search tag", group.name));
            }
        }

        Ok(())
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
