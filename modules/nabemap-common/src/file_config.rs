use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::types::DEFAULT_RADIUS_KM;

/// TOML-backed configuration loaded from disk.
/// Deployment-specific values (host, port, dataset override) stay as env vars.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub dataset: DatasetConfig,
    #[serde(default)]
    pub adjacency: AdjacencyConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatasetConfig {
    pub path: PathBuf,
    #[serde(default)]
    pub keys: PropertyKeys,
}

/// Ordered candidate property names; the first key present on a feature wins.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PropertyKeys {
    #[serde(default = "default_code_keys")]
    pub code: Vec<String>,
    #[serde(default = "default_name_keys")]
    pub name: Vec<String>,
    #[serde(default = "default_borough_keys")]
    pub borough: Vec<String>,
}

impl Default for PropertyKeys {
    fn default() -> Self {
        Self {
            code: default_code_keys(),
            name: default_name_keys(),
            borough: default_borough_keys(),
        }
    }
}

fn default_code_keys() -> Vec<String> {
    ["nta2020", "ntacode", "NTACode", "code"].map(String::from).to_vec()
}

fn default_name_keys() -> Vec<String> {
    ["ntaname", "NTAName", "name"].map(String::from).to_vec()
}

fn default_borough_keys() -> Vec<String> {
    ["boroname", "BoroName", "borough"].map(String::from).to_vec()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AdjacencyConfig {
    #[serde(default = "default_radius_km")]
    pub radius_km: f64,
    #[serde(default = "default_true")]
    pub cache: bool,
}

impl Default for AdjacencyConfig {
    fn default() -> Self {
        Self {
            radius_km: DEFAULT_RADIUS_KM,
            cache: true,
        }
    }
}

fn default_radius_km() -> f64 {
    DEFAULT_RADIUS_KM
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Empty means any origin.
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            allowed_origins: Vec::new(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

/// Load and parse a TOML config file.
pub fn load_config(path: &Path) -> Result<FileConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    parse_config(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Parse TOML config text.
pub fn parse_config(content: &str) -> Result<FileConfig> {
    let config: FileConfig = toml::from_str(content)?;
    if !config.adjacency.radius_km.is_finite() || config.adjacency.radius_km < 0.0 {
        anyhow::bail!(
            "adjacency.radius_km must be a non-negative number, got {}",
            config.adjacency.radius_km
        );
    }
    Ok(config)
}
