//! TOML configuration: `[server]`, `[store]`, and `[enrichment]` sections.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub enrichment: EnrichmentConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub bind: String,
    /// Directory served for every path outside `/api/`.
    #[serde(default)]
    pub static_dir: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    #[serde(default = "default_backend")]
    pub backend: String,
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            path: None,
        }
    }
}

fn default_backend() -> String {
    "sqlite".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct EnrichmentConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Name of the environment variable holding the bearer credential.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub max_retries: u32,
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_top_k")]
    pub top_k: u32,
    #[serde(default = "default_top_p")]
    pub top_p: f64,
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            endpoint: None,
            api_key_env: default_api_key_env(),
            timeout_secs: default_timeout_secs(),
            max_retries: 0,
            retry_backoff_ms: default_retry_backoff_ms(),
            temperature: default_temperature(),
            top_k: default_top_k(),
            top_p: default_top_p(),
            max_output_tokens: default_max_output_tokens(),
        }
    }
}

fn default_provider() -> String {
    "disabled".to_string()
}
fn default_api_key_env() -> String {
    "GEMINI_API_KEY".to_string()
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_retry_backoff_ms() -> u64 {
    500
}
fn default_temperature() -> f64 {
    0.7
}
fn default_top_k() -> u32 {
    40
}
fn default_top_p() -> f64 {
    0.8
}
fn default_max_output_tokens() -> u32 {
    1024
}

impl EnrichmentConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "disabled"
    }
}

impl Config {
    /// In-memory store, enrichment disabled. Used when no config file is
    /// needed (e.g. `insp enrich`).
    pub fn minimal() -> Self {
        Self {
            server: ServerConfig {
                bind: "127.0.0.1:8787".to_string(),
                static_dir: None,
            },
            store: StoreConfig {
                backend: "memory".to_string(),
                path: None,
            },
            enrichment: EnrichmentConfig::default(),
        }
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    parse_config(&content)
}

pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).with_context(|| "Failed to parse config file")?;

    // Validate store
    match config.store.backend.as_str() {
        "sqlite" => {
            if config.store.path.is_none() {
                anyhow::bail!("store.path must be set when backend is 'sqlite'");
            }
        }
        "memory" | "disabled" => {}
        other => anyhow::bail!(
            "Unknown store backend: '{}'. Must be sqlite, memory, or disabled.",
            other
        ),
    }

    // Validate enrichment
    match config.enrichment.provider.as_str() {
        "disabled" | "gemini" => {}
        other => anyhow::bail!(
            "Unknown enrichment provider: '{}'. Must be disabled or gemini.",
            other
        ),
    }

    if config.enrichment.is_enabled() && config.enrichment.endpoint.is_none() {
        anyhow::bail!(
            "enrichment.endpoint must be specified when provider is '{}'",
            config.enrichment.provider
        );
    }

    if config.enrichment.timeout_secs == 0 {
        anyhow::bail!("enrichment.timeout_secs must be > 0");
    }

    if !(0.0..=2.0).contains(&config.enrichment.temperature) {
        anyhow::bail!("enrichment.temperature must be in [0.0, 2.0]");
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_applied() {
        let config = parse_config(
            r#"
[server]
bind = "127.0.0.1:8787"

[store]
path = "./data/insp.sqlite"
"#,
        )
        .unwrap();
        assert_eq!(config.store.backend, "sqlite");
        assert_eq!(config.enrichment.provider, "disabled");
        assert_eq!(config.enrichment.api_key_env, "GEMINI_API_KEY");
        assert_eq!(config.enrichment.timeout_secs, 30);
        assert_eq!(config.enrichment.max_retries, 0);
        assert!(config.server.static_dir.is_none());
    }

    #[test]
    fn test_sqlite_requires_path() {
        let err = parse_config(
            r#"
[server]
bind = "127.0.0.1:8787"
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("store.path"));
    }

    #[test]
    fn test_unknown_backend_rejected() {
        let err = parse_config(
            r#"
[server]
bind = "127.0.0.1:8787"

[store]
backend = "redis"
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("Unknown store backend"));
    }

    #[test]
    fn test_gemini_requires_endpoint() {
        let err = parse_config(
            r#"
[server]
bind = "127.0.0.1:8787"

[store]
backend = "memory"

[enrichment]
provider = "gemini"
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("enrichment.endpoint"));
    }

    #[test]
    fn test_temperature_range() {
        let err = parse_config(
            r#"
[server]
bind = "127.0.0.1:8787"

[store]
backend = "memory"

[enrichment]
temperature = 3.5
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("temperature"));
    }

    #[test]
    fn test_minimal_is_memory_and_disabled() {
        let config = Config::minimal();
        assert_eq!(config.store.backend, "memory");
        assert!(!config.enrichment.is_enabled());
    }
}
