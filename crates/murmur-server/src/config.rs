//! Server configuration loading from file and environment variables.

use murmur_agent::AgentConfig;
use murmur_session::AnalysisConfig;
use murmur_voice::SynthesisConfig;
use serde::Deserialize;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr};
use thiserror::Error;

/// Top-level server configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Server network settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Object storage backend and log bucket.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Conversational agent runtime.
    #[serde(default)]
    pub agent: AgentConfig,

    /// Speech synthesis endpoint.
    #[serde(default)]
    pub synthesis: SynthesisConfig,

    /// Downstream analysis of merged sessions.
    #[serde(default)]
    pub analysis: AnalysisConfig,
}

/// Network configuration for the HTTP server.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to.
    #[serde(default = "default_host")]
    pub host: IpAddr,

    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Externally reachable base URL, used to build signed object links.
    #[serde(default = "default_public_url")]
    pub public_url: String,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "murmur_server=debug,info").
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to output logs in JSON format.
    #[serde(default)]
    pub json: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Process-local store; contents are lost on restart.
    #[default]
    Memory,
    /// Objects stored as files under `storage.root`.
    Fs,
}

impl std::str::FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "fs" => Ok(Self::Fs),
            other => Err(format!("unknown storage backend: {}", other)),
        }
    }
}

#[derive(Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,

    /// Root directory for the `fs` backend.
    #[serde(default = "default_storage_root")]
    pub root: String,

    /// Bucket holding log records and session summaries.
    #[serde(default = "default_log_bucket")]
    pub log_bucket: String,

    /// HMAC key for signed object URLs. Empty means a random key per process.
    #[serde(default)]
    pub signing_secret: String,
}

impl fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageConfig")
            .field("backend", &self.backend)
            .field("root", &self.root)
            .field("log_bucket", &self.log_bucket)
            .field("signing_secret", &"[REDACTED]")
            .finish()
    }
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))
}

fn default_port() -> u16 {
    3000
}

fn default_public_url() -> String {
    "http://127.0.0.1:3000".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_storage_root() -> String {
    "data".to_string()
}

fn default_log_bucket() -> String {
    "conversation-logs".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            public_url: default_public_url(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            root: default_storage_root(),
            log_bucket: default_log_bucket(),
            signing_secret: String::new(),
        }
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse the configuration file.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// An environment override held an unusable value.
    #[error("invalid value for {var}: {reason}")]
    Env { var: &'static str, reason: String },
}

/// Loads configuration from a TOML file, falling back to defaults, then
/// applies environment overrides.
///
/// # Errors
///
/// Returns `ConfigError` if the file exists but cannot be read or parsed, or
/// if an override cannot be parsed.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    let mut config = match path {
        Some(p) => match std::fs::read_to_string(p) {
            Ok(contents) => toml::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = p, "config file not found, using defaults");
                Config::default()
            }
            Err(e) => return Err(ConfigError::FileRead(e)),
        },
        None => Config::default(),
    };

    apply_env_overrides(&mut config, |name| std::env::var(name).ok())?;
    Ok(config)
}

/// Applies `MURMUR_*` overrides read through `lookup`.
///
/// | Variable | Field |
/// |----------|-------|
/// | `MURMUR_HOST` | `server.host` |
/// | `MURMUR_PORT` | `server.port` |
/// | `MURMUR_PUBLIC_URL` | `server.public_url` |
/// | `MURMUR_LOG_LEVEL` | `logging.level` |
/// | `MURMUR_LOG_JSON` | `logging.json` (`true` or `1`) |
/// | `MURMUR_STORAGE_BACKEND` | `storage.backend` |
/// | `MURMUR_STORAGE_ROOT` | `storage.root` |
/// | `MURMUR_LOG_BUCKET` | `storage.log_bucket` |
/// | `MURMUR_SIGNING_SECRET` | `storage.signing_secret` |
/// | `MURMUR_AGENT_ENDPOINT` | `agent.endpoint` |
/// | `MURMUR_AGENT_ID` | `agent.agent_id` |
/// | `MURMUR_AGENT_ALIAS_ID` | `agent.agent_alias_id` |
/// | `MURMUR_AGENT_API_KEY` | `agent.api_key` |
/// | `MURMUR_TTS_ENDPOINT_URL` | `synthesis.endpoint_url` |
/// | `MURMUR_TTS_ENDPOINT_NAME` | `synthesis.endpoint_name` |
/// | `MURMUR_TTS_API_KEY` | `synthesis.api_key` |
/// | `MURMUR_TTS_OUTPUT_BUCKET` | `synthesis.output_bucket` |
/// | `MURMUR_ANALYSIS_URL` | `analysis.url` |
pub fn apply_env_overrides<F>(config: &mut Config, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(host) = lookup("MURMUR_HOST") {
        config.server.host = host.parse().map_err(|e: std::net::AddrParseError| {
            ConfigError::Env {
                var: "MURMUR_HOST",
                reason: e.to_string(),
            }
        })?;
    }
    if let Some(port) = lookup("MURMUR_PORT") {
        config.server.port = port.parse().map_err(|e: std::num::ParseIntError| {
            ConfigError::Env {
                var: "MURMUR_PORT",
                reason: e.to_string(),
            }
        })?;
    }
    if let Some(url) = lookup("MURMUR_PUBLIC_URL") {
        config.server.public_url = url;
    }
    if let Some(level) = lookup("MURMUR_LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Some(json) = lookup("MURMUR_LOG_JSON") {
        config.logging.json = json == "true" || json == "1";
    }
    if let Some(backend) = lookup("MURMUR_STORAGE_BACKEND") {
        config.storage.backend = backend.parse().map_err(|reason| ConfigError::Env {
            var: "MURMUR_STORAGE_BACKEND",
            reason,
        })?;
    }
    if let Some(root) = lookup("MURMUR_STORAGE_ROOT") {
        config.storage.root = root;
    }
    if let Some(bucket) = lookup("MURMUR_LOG_BUCKET") {
        config.storage.log_bucket = bucket;
    }
    if let Some(secret) = lookup("MURMUR_SIGNING_SECRET") {
        config.storage.signing_secret = secret;
    }
    if let Some(endpoint) = lookup("MURMUR_AGENT_ENDPOINT") {
        config.agent.endpoint = endpoint;
    }
    if let Some(id) = lookup("MURMUR_AGENT_ID") {
        config.agent.agent_id = id;
    }
    if let Some(alias) = lookup("MURMUR_AGENT_ALIAS_ID") {
        config.agent.agent_alias_id = alias;
    }
    if let Some(key) = lookup("MURMUR_AGENT_API_KEY") {
        config.agent.api_key = key;
    }
    if let Some(url) = lookup("MURMUR_TTS_ENDPOINT_URL") {
        config.synthesis.endpoint_url = url;
    }
    if let Some(name) = lookup("MURMUR_TTS_ENDPOINT_NAME") {
        config.synthesis.endpoint_name = name;
    }
    if let Some(key) = lookup("MURMUR_TTS_API_KEY") {
        config.synthesis.api_key = key;
    }
    if let Some(bucket) = lookup("MURMUR_TTS_OUTPUT_BUCKET") {
        config.synthesis.output_bucket = bucket;
    }
    if let Some(url) = lookup("MURMUR_ANALYSIS_URL") {
        config.analysis.url = url;
    }

    Ok(())
}
