//! Configuration loading and saving (TOML).
//!
//! Lookup order:
//! 1. `$MARKDEX_CONFIG` environment variable
//! 2. `<platform config dir>/markdex/config.toml`
//! 3. Built-in defaults (no API base, user `default`)

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

pub const DEFAULT_USER_ID: &str = "default";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the bookmark server, e.g. `https://marks.example.com`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
    /// Identifier sent with usage tracking.
    pub user_id: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base: None,
            user_id: DEFAULT_USER_ID.into(),
        }
    }
}

/// Load config from the resolved path. Returns defaults if no file exists.
pub fn load_config() -> Result<Config> {
    match config_path() {
        Some(p) => load_config_from(&p),
        None => Ok(Config::default()),
    }
}

pub fn load_config_from(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }
    let content =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let mut config: Config =
        toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))?;
    if config.user_id.trim().is_empty() {
        config.user_id = DEFAULT_USER_ID.into();
    }
    Ok(config)
}

/// Persist config to the resolved path, creating parent directories.
pub fn save_config(config: &Config) -> Result<PathBuf> {
    let Some(path) = config_path() else {
        bail!("no config path could be resolved");
    };
    save_config_to(config, &path)?;
    Ok(path)
}

pub fn save_config_to(config: &Config, path: &Path) -> Result<()> {
    if config.api_base.as_deref().unwrap_or("").is_empty() {
        bail!("api_base required");
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    let content = toml::to_string_pretty(config).context("serializing config")?;
    std::fs::write(path, content).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

/// Resolve the config file path.
pub fn config_path() -> Option<PathBuf> {
    if let Ok(p) = std::env::var("MARKDEX_CONFIG") {
        return Some(PathBuf::from(p));
    }
    directories::ProjectDirs::from("dev", "markdex", "markdex")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

/// Describe the active config path (for `markdex config show`).
pub fn show_config_path() -> String {
    match config_path() {
        Some(p) if p.exists() => format!("{} (loaded)", p.display()),
        Some(p) => format!("{} (not found, using defaults)", p.display()),
        None => "no config path resolved (using defaults)".into(),
    }
}
