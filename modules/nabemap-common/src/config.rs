use anyhow::{Context, Result};
use std::path::PathBuf;

use crate::file_config::{load_config, FileConfig};

const DEFAULT_CONFIG_PATH: &str = "config/nabemap.toml";

/// Application configuration: the TOML file plus environment overrides.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub config_path: PathBuf,
    pub file: FileConfig,
}

impl AppConfig {
    /// Load `.env`, read the TOML file named by `NABEMAP_CONFIG`, then apply
    /// `NABEMAP_DATASET`, `API_HOST` and `API_PORT` overrides.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config_path = std::env::var("NABEMAP_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));
        let mut file = load_config(&config_path)?;

        if let Ok(dataset) = std::env::var("NABEMAP_DATASET") {
            file.dataset.path = PathBuf::from(dataset);
        }
        if let Ok(host) = std::env::var("API_HOST") {
            file.server.host = host;
        }
        if let Ok(port) = std::env::var("API_PORT") {
            file.server.port = port
                .parse()
                .with_context(|| format!("API_PORT must be a number, got {port}"))?;
        }

        let config = Self { config_path, file };
        config.log_summary();
        Ok(config)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.file.server.host, self.file.server.port)
    }

    fn log_summary(&self) {
        tracing::info!("Config loaded from {}", self.config_path.display());
        tracing::info!("  dataset: {}", self.file.dataset.path.display());
        tracing::info!(
            "  adjacency: radius_km={} cache={}",
            self.file.adjacency.radius_km,
            self.file.adjacency.cache
        );
        tracing::info!("  server: {}", self.bind_addr());
    }
}
