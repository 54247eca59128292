use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use crate::models::Priority;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub backend: BackendConfig,
    #[serde(default)]
    pub ui: UiConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BackendConfig {
    pub base_url: String,
    #[serde(default = "default_project_id")]
    pub project_id: u64,
}

fn default_project_id() -> u64 {
    1
}

#[derive(Debug, Deserialize, Clone)]
pub struct UiConfig {
    #[serde(default = "default_preview_chars")]
    pub content_preview_chars: usize,
    #[serde(default = "default_notification_ttl_ms")]
    pub notification_ttl_ms: u64,
    #[serde(default)]
    pub default_priority: Priority,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            content_preview_chars: default_preview_chars(),
            notification_ttl_ms: default_notification_ttl_ms(),
            default_priority: Priority::Normal,
        }
    }
}

fn default_preview_chars() -> usize {
    300
}
fn default_notification_ttl_ms() -> u64 {
    5000
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:8080".to_string()
}

impl Config {
    /// Defaults used when no config file is present.
    pub fn minimal() -> Self {
        Self {
            backend: BackendConfig {
                base_url: "http://127.0.0.1:5000".to_string(),
                project_id: default_project_id(),
            },
            ui: UiConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;

    Ok(config)
}

pub fn validate(config: &Config) -> Result<()> {
    let base = config.backend.base_url.trim();
    if !(base.starts_with("http://") || base.starts_with("https://")) {
        anyhow::bail!(
            "backend.base_url must start with http:// or https://, got '{}'",
            config.backend.base_url
        );
    }

    if config.ui.content_preview_chars == 0 {
        anyhow::bail!("ui.content_preview_chars must be > 0");
    }

    if config.ui.notification_ttl_ms == 0 {
        anyhow::bail!("ui.notification_ttl_ms must be > 0");
    }

    if let Priority::Other(p) = &config.ui.default_priority {
        anyhow::bail!(
            "Unknown ui.default_priority: '{}'. Must be low, normal, high, or urgent.",
            p
        );
    }

    Ok(())
}
