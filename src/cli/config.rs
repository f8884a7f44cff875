use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::config;

const RECENT_SEARCH_LIMIT: usize = 10;

/// CLI state kept between invocations
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentConfig {
    #[serde(default)]
    pub last_email: Option<String>,
    #[serde(default)]
    pub recent_searches: Vec<String>,
}

impl EnvironmentConfig {
    /// Most recent first, no duplicates, bounded
    pub fn remember_search(&mut self, query: &str) {
        let query = query.trim();
        if query.is_empty() {
            return;
        }
        self.recent_searches.retain(|q| q != query);
        self.recent_searches.insert(0, query.to_string());
        self.recent_searches.truncate(RECENT_SEARCH_LIMIT);
    }
}

/// `POETRY_CONFIG_DIR` (through the app config) wins over `~/.config/poetry`
fn resolve_config_dir(configured: Option<&Path>, home: Option<String>) -> anyhow::Result<PathBuf> {
    if let Some(dir) = configured {
        return Ok(dir.to_path_buf());
    }
    let home = home.ok_or_else(|| anyhow::anyhow!("HOME environment variable not set"))?;
    Ok(PathBuf::from(home).join(".config").join("poetry"))
}

pub fn get_config_dir() -> anyhow::Result<PathBuf> {
    let config_dir = resolve_config_dir(config().storage.dir.as_deref(), std::env::var("HOME").ok())?;

    if !config_dir.exists() {
        fs::create_dir_all(&config_dir)?;
    }

    Ok(config_dir)
}

pub fn token_file() -> anyhow::Result<PathBuf> {
    Ok(get_config_dir()?.join("storage.json"))
}

pub fn load_environment_config() -> anyhow::Result<EnvironmentConfig> {
    let env_file = get_config_dir()?.join("env.json");

    if !env_file.exists() {
        return Ok(EnvironmentConfig::default());
    }

    let content = fs::read_to_string(env_file)?;
    let config: EnvironmentConfig = serde_json::from_str(&content)?;
    Ok(config)
}

pub fn save_environment_config(config: &EnvironmentConfig) -> anyhow::Result<()> {
    let env_file = get_config_dir()?.join("env.json");

    let content = serde_json::to_string_pretty(config)?;
    fs::write(env_file, content)?;
    Ok(())
}
