use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub storage: StorageConfig,
    #[serde(default)]
    pub library: LibraryConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// SQLite database holding full source records.
    pub blob_db_path: PathBuf,
    /// JSON document holding the group list.
    pub metadata_path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LibraryConfig {
    #[serde(default = "default_max_sources")]
    pub max_sources_per_group: usize,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            max_sources_per_group: default_max_sources(),
        }
    }
}

fn default_max_sources() -> usize {
    50
}

#[derive(Debug, Deserialize, Clone)]
pub struct GenerationConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default)]
    pub model: Option<String>,
    /// Environment variable read for the backend API key. The key itself
    /// never appears in the config file.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            model: None,
            api_key_env: default_api_key_env(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_endpoint() -> String {
    "http://localhost:8089/v1/generate".to_string()
}
fn default_api_key_env() -> String {
    "SHELF_API_KEY".to_string()
}
fn default_timeout_secs() -> u64 {
    120
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    if config.library.max_sources_per_group == 0 {
        anyhow::bail!("library.max_sources_per_group must be > 0");
    }

    if config.generation.timeout_secs == 0 {
        anyhow::bail!("generation.timeout_secs must be > 0");
    }

    if config.generation.endpoint.is_empty() {
        anyhow::bail!("generation.endpoint must not be empty");
    }

    Ok(config)
}
