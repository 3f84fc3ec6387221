//! Server configuration loading from file and environment variables.

use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr};
use thiserror::Error;
use voxrelay_voice::{ConversationConfig, SpeechConfig, DEFAULT_MAX_CHUNK_CHARS};

/// Top-level server configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Server network settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Speech synthesis upstream.
    #[serde(default)]
    pub speech: SpeechConfig,

    /// Conversation model upstream.
    #[serde(default)]
    pub conversation: ConversationConfig,

    /// Reply chunking for sequential playback.
    #[serde(default)]
    pub chunking: ChunkingConfig,
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

    /// Directory holding the browser front end. Served as the fallback route
    /// when it contains an `index.html`.
    #[serde(default = "default_client_dir")]
    pub client_dir: String,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "voxrelay_server=debug,info").
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to output logs in JSON format.
    #[serde(default)]
    pub json: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChunkingConfig {
    /// Maximum characters per speech chunk.
    #[serde(default = "default_max_chunk_chars")]
    pub max_chunk_chars: usize,

    /// Upper bound on chunks synthesized for a single `/api/speak` request.
    #[serde(default = "default_max_speak_chunks")]
    pub max_speak_chunks: usize,
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))
}

fn default_port() -> u16 {
    5000
}

fn default_client_dir() -> String {
    "static".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_chunk_chars() -> usize {
    DEFAULT_MAX_CHUNK_CHARS
}

fn default_max_speak_chunks() -> usize {
    50
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            client_dir: default_client_dir(),
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

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            max_chunk_chars: default_max_chunk_chars(),
            max_speak_chunks: default_max_speak_chunks(),
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
}

/// Loads configuration from a TOML file, falling back to defaults, then
/// applies overrides from the process environment.
///
/// # Errors
///
/// Returns `ConfigError` if the file exists but cannot be read or parsed.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    load_config_with_env(path, |key| std::env::var(key).ok())
}

/// Same as [`load_config`], reading overrides through `env` instead of the
/// process environment.
pub fn load_config_with_env(
    path: Option<&str>,
    env: impl Fn(&str) -> Option<String>,
) -> Result<Config, ConfigError> {
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

    apply_env_overrides(&mut config, env);
    Ok(config)
}

/// Environment variable overrides:
/// - `VOXRELAY_HOST` overrides `server.host`
/// - `VOXRELAY_PORT` overrides `server.port`
/// - `PORT` sets `server.port` when `VOXRELAY_PORT` is unset, and also binds
///   all interfaces unless `VOXRELAY_HOST` is given
/// - `VOXRELAY_CLIENT_DIR` overrides `server.client_dir`
/// - `VOXRELAY_LOG_LEVEL` overrides `logging.level`
/// - `VOXRELAY_LOG_JSON` overrides `logging.json` (set to "true" to enable)
/// - `VOXRELAY_MAX_CHUNK_CHARS` overrides `chunking.max_chunk_chars`
/// - `VOXRELAY_MAX_SPEAK_CHUNKS` overrides `chunking.max_speak_chunks`
/// - `CLOUDFLARE_ACCOUNT_ID` / `CLOUDFLARE_API_TOKEN` override the speech credentials
/// - `GEMINI_API_KEY` overrides `conversation.api_key`
pub fn apply_env_overrides(config: &mut Config, env: impl Fn(&str) -> Option<String>) {
    if let Some(port) = env("VOXRELAY_PORT") {
        if let Ok(parsed) = port.parse() {
            config.server.port = parsed;
        }
    } else if let Some(Ok(parsed)) = env("PORT").map(|port| port.parse::<u16>()) {
        // Platforms that inject PORT forward traffic from outside the container.
        config.server.port = parsed;
        config.server.host = IpAddr::V4(Ipv4Addr::UNSPECIFIED);
    }
    if let Some(host) = env("VOXRELAY_HOST") {
        if let Ok(parsed) = host.parse() {
            config.server.host = parsed;
        }
    }
    if let Some(dir) = env("VOXRELAY_CLIENT_DIR") {
        config.server.client_dir = dir;
    }
    if let Some(level) = env("VOXRELAY_LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Some(json) = env("VOXRELAY_LOG_JSON") {
        config.logging.json = json == "true" || json == "1";
    }
    if let Some(max) = env("VOXRELAY_MAX_CHUNK_CHARS") {
        if let Ok(parsed) = max.parse() {
            config.chunking.max_chunk_chars = parsed;
        }
    }
    if let Some(max) = env("VOXRELAY_MAX_SPEAK_CHUNKS") {
        if let Ok(parsed) = max.parse() {
            config.chunking.max_speak_chunks = parsed;
        }
    }
    if let Some(account_id) = env("CLOUDFLARE_ACCOUNT_ID") {
        config.speech.account_id = account_id;
    }
    if let Some(token) = env("CLOUDFLARE_API_TOKEN") {
        config.speech.api_token = token;
    }
    if let Some(key) = env("GEMINI_API_KEY") {
        config.conversation.api_key = key;
    }
}
