use std::{fs, path::Path};

use serde::Deserialize;

use crate::analyzers::deepfake::DeepfakeConfig;
use crate::core::error::LensError;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_store_path")]
    pub store_path: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default)]
    pub deepfake: DeepfakeConfig,
}

fn default_store_path() -> String {
    "data/sessions.json".to_string()
}

fn default_timeout_ms() -> u64 {
    5_000
}

pub fn load_config(path: Option<&str>) -> Result<AppConfig, LensError> {
    let default_path = Path::new("config/scamlens.toml");
    let path = path.map(Path::new).unwrap_or(default_path);

    if !path.exists() {
        return Ok(default_config());
    }

    let content = fs::read_to_string(path).map_err(|e| LensError::Config(e.to_string()))?;
    let cfg: AppConfig = toml::from_str(&content).map_err(|e| LensError::Config(e.to_string()))?;
    Ok(cfg)
}

fn default_config() -> AppConfig {
    AppConfig {
        store_path: default_store_path(),
        timeout_ms: default_timeout_ms(),
        deepfake: DeepfakeConfig::default(),
    }
}
