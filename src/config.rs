//! Application configuration.
//!
//! Settings come from built-in defaults, an optional TOML file, and
//! `HERA_`-prefixed environment variables, in increasing precedence.
//! `HERA_SERVER__PORT=9000` overrides `[server] port`.

use anyhow::{Context, Result};
use serde::Deserialize;

/// Top-level application settings.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// HTTP server settings
    #[serde(default)]
    pub server: ServerSettings,
    /// Storage backend settings
    #[serde(default)]
    pub database: DatabaseSettings,
    /// Intent classifier settings
    #[serde(default)]
    pub classifier: ClassifierSettings,
}

/// HTTP server settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    /// Bind address
    #[serde(default = "default_host")]
    pub host: String,
    /// Listen port
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Which storage backend to run against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Volatile in-process stores
    Memory,
    /// SQLite files on disk
    Sqlite,
}

/// Storage backend settings.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    /// Backend selection
    #[serde(default = "default_backend")]
    pub backend: StorageBackend,
    /// Employee database path (sqlite backend)
    #[serde(default = "default_employees_path")]
    pub employees_path: String,
    /// Session database path (sqlite backend)
    #[serde(default = "default_sessions_path")]
    pub sessions_path: String,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            employees_path: default_employees_path(),
            sessions_path: default_sessions_path(),
        }
    }
}

/// Which intent classifier to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassifierProvider {
    /// Deterministic keyword matching, no external calls
    Keyword,
    /// OpenAI chat completions
    Openai,
}

/// Intent classifier settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ClassifierSettings {
    /// Provider selection
    #[serde(default = "default_provider")]
    pub provider: ClassifierProvider,
    /// Model name for the openai provider
    #[serde(default = "default_model")]
    pub model: String,
    /// API key for the openai provider; usually set via OPENAI_API_KEY
    #[serde(default)]
    pub api_key: Option<String>,
}

impl Default for ClassifierSettings {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            api_key: None,
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_backend() -> StorageBackend {
    StorageBackend::Sqlite
}
fn default_employees_path() -> String {
    "data/employees.db".to_string()
}
fn default_sessions_path() -> String {
    "data/sessions.db".to_string()
}
fn default_provider() -> ClassifierProvider {
    ClassifierProvider::Keyword
}
fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

impl Settings {
    /// Load settings from the optional file plus the environment.
    pub fn load(path: Option<&str>) -> Result<Self> {
        let mut builder = ::config::Config::builder();

        builder = match path {
            Some(path) => builder.add_source(::config::File::with_name(path)),
            None => builder.add_source(::config::File::with_name("config/default").required(false)),
        };

        builder
            .add_source(::config::Environment::with_prefix("HERA").separator("__"))
            .build()
            .context("failed to read configuration")?
            .try_deserialize()
            .context("invalid configuration")
    }
}
