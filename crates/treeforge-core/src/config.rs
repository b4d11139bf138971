//! Configuration management for TreeForge

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::types::DEFAULT_CHUNK_SIZE;

/// Configuration file names to search for
pub const CONFIG_FILE_NAMES: &[&str] = &[
    "treeforge.config.yaml",
    "treeforge.config.yml",
    "treeforge.config.json",
];

/// Project-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForgeConfig {
    /// Chat-completions endpoint for the generation capability
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// Environment variable holding the API key, if the endpoint needs one
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    /// Directory holding instruction templates (`structure.txt` lives here)
    #[serde(default = "default_agents_dir")]
    pub agents_dir: String,
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
}

fn default_endpoint() -> String {
    "http://localhost:11434/v1/chat/completions".to_string()
}

fn default_model() -> String {
    "qwen2.5-coder".to_string()
}

fn default_api_key_env() -> String {
    "TREEFORGE_API_KEY".to_string()
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}

fn default_agents_dir() -> String {
    "agents".to_string()
}

fn default_output_dir() -> String {
    "output".to_string()
}

impl Default for ForgeConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            model: default_model(),
            api_key_env: default_api_key_env(),
            chunk_size: default_chunk_size(),
            agents_dir: default_agents_dir(),
            output_dir: default_output_dir(),
        }
    }
}

impl ForgeConfig {
    /// Find a configuration file in a directory
    pub fn find_config_file(dir: &Path) -> Option<PathBuf> {
        for name in CONFIG_FILE_NAMES {
            let path = dir.join(name);
            if path.exists() {
                return Some(path);
            }
        }
        None
    }

    /// Load configuration from a file (yaml or json by extension)
    pub fn load(config_path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(config_path)?;
        let config = if config_path
            .extension()
            .map(|e| e == "json")
            .unwrap_or(false)
        {
            serde_json::from_str(&content)?
        } else {
            serde_yaml::from_str(&content)?
        };
        Ok(config)
    }

    /// Load from a directory, falling back to defaults when no config
    /// file is present
    pub fn load_or_default(dir: &Path) -> Result<Self> {
        match Self::find_config_file(dir) {
            Some(path) => Self::load(&path),
            None => Ok(Self::default()),
        }
    }
}
