use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub reader: ReaderConfig,

    #[serde(default)]
    pub auth: AuthConfig,

    #[serde(default)]
    pub tools: ToolsConfig,

    /// Videos served by the built-in catalog.
    #[serde(default)]
    pub videos: Vec<VideoEntry>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Route on which WebSocket upgrades are accepted.
    #[serde(default = "default_ws_path")]
    pub ws_path: String,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    9988
}
fn default_ws_path() -> String {
    "/ws".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            ws_path: default_ws_path(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReaderConfig {
    /// Size in bytes of one streamed chunk (default: 1 MiB).
    ///
    /// Also the granularity of seeking, so changing it changes where a
    /// given timestamp lands.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
}

fn default_chunk_size() -> usize {
    1024 * 1024
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    /// HMAC secret for signing tokens. When empty, a random secret is
    /// generated at startup and tokens do not survive a restart.
    #[serde(default)]
    pub secret: String,

    /// Issuer written into tokens created by this service.
    #[serde(default = "default_issuer")]
    pub issuer: String,

    /// Issuers whose tokens are accepted.
    #[serde(default = "default_accepted_issuers")]
    pub accepted_issuers: Vec<String>,

    /// Token lifetime in seconds (default: 86400).
    #[serde(default = "default_token_ttl")]
    pub token_ttl_secs: u64,
}

fn default_issuer() -> String {
    "streaming_service".to_string()
}
fn default_accepted_issuers() -> Vec<String> {
    vec!["auth_service".to_string(), "streaming_service".to_string()]
}
fn default_token_ttl() -> u64 {
    86400
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            secret: String::new(),
            issuer: default_issuer(),
            accepted_issuers: default_accepted_issuers(),
            token_ttl_secs: default_token_ttl(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ToolsConfig {
    /// Explicit ffprobe executable; looked up on PATH when unset.
    #[serde(default)]
    pub ffprobe: Option<PathBuf>,
}

/// A video entry of the built-in catalog.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct VideoEntry {
    /// 24 hex character identifier clients request the video by.
    pub id: String,

    pub name: String,

    pub path: PathBuf,

    /// 24 hex character identifier of the owning user.
    pub user_id: String,
}
