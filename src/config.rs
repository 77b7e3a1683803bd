use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub models: ModelsConfig,
    #[serde(default)]
    pub auth: AuthConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BackendConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_base_url() -> String {
    "http://127.0.0.1:8000/api".to_string()
}
fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct ModelsConfig {
    #[serde(default = "default_offered")]
    pub offered: Vec<String>,
    #[serde(default)]
    pub default: Option<String>,
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            offered: default_offered(),
            default: None,
        }
    }
}

fn default_offered() -> Vec<String> {
    vec!["llama-3.2-1b".to_string()]
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    #[serde(default = "default_token_env")]
    pub token_env: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_env: default_token_env(),
        }
    }
}

fn default_token_env() -> String {
    "RAG_API_TOKEN".to_string()
}

impl BackendConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl AuthConfig {
    /// Bearer token from the configured environment variable, if set and
    /// non-empty.
    pub fn token_from_env(&self) -> Option<String> {
        std::env::var(&self.token_env)
            .ok()
            .filter(|t| !t.trim().is_empty())
    }
}

impl Config {
    /// Built-in defaults, used when no config file is present.
    pub fn minimal() -> Self {
        Self {
            backend: BackendConfig::default(),
            models: ModelsConfig::default(),
            auth: AuthConfig::default(),
        }
    }
}

/// Read and parse a config file without validating it.
///
/// Use this when overrides are applied before [`validate`]; otherwise
/// prefer [`load_config`].
pub fn read_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    toml::from_str(&content).with_context(|| "Failed to parse config file")
}

pub fn load_config(path: &Path) -> Result<Config> {
    let config = read_config(path)?;
    validate(&config)?;
    Ok(config)
}

pub fn validate(config: &Config) -> Result<()> {
    // Validate backend
    let base = url::Url::parse(&config.backend.base_url)
        .with_context(|| format!("backend.base_url is not a URL: '{}'", config.backend.base_url))?;
    match base.scheme() {
        "http" | "https" => {}
        other => anyhow::bail!(
            "backend.base_url must use http or https, got '{}'",
            other
        ),
    }

    if config.backend.timeout_secs == 0 {
        anyhow::bail!("backend.timeout_secs must be > 0");
    }

    // Validate models
    if config.models.offered.is_empty() {
        anyhow::bail!("models.offered must list at least one model");
    }
    if config.models.offered.iter().any(|m| m.trim().is_empty()) {
        anyhow::bail!("models.offered must not contain empty model names");
    }
    if let Some(default) = &config.models.default {
        if !config.models.offered.contains(default) {
            anyhow::bail!(
                "models.default '{}' is not in models.offered ({})",
                default,
                config.models.offered.join(", ")
            );
        }
    }

    if config.auth.token_env.trim().is_empty() {
        anyhow::bail!("auth.token_env must not be empty");
    }

    Ok(())
}
