mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::collections::HashSet;
use std::path::Path;
use vidstream_common::{UserId, VideoId};

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    parse_config(&content).with_context(|| format!("Invalid config file: {:?}", path))
}

/// Parse and validate configuration from TOML text
pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).context("Failed to parse config")?;

    validate_config(&config)?;

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    let default_paths = [
        "./config.toml",
        "./vidstream.toml",
        "~/.config/vidstream/config.toml",
        "/etc/vidstream/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            return load_config(path);
        }
    }

    Ok(Config::default())
}

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    if config.server.port == 0 {
        anyhow::bail!("Server port cannot be 0");
    }

    if !config.server.ws_path.starts_with('/') {
        anyhow::bail!(
            "WebSocket path must start with '/': {:?}",
            config.server.ws_path
        );
    }

    if config.reader.chunk_size == 0 {
        anyhow::bail!("Reader chunk size cannot be 0");
    }

    if config.auth.token_ttl_secs == 0 {
        anyhow::bail!("Token TTL cannot be 0");
    }

    let mut seen = HashSet::new();
    for video in &config.videos {
        let id: VideoId = video
            .id
            .parse()
            .with_context(|| format!("Video '{}' has an invalid id", video.name))?;
        video
            .user_id
            .parse::<UserId>()
            .with_context(|| format!("Video '{}' has an invalid user id", video.name))?;

        if !seen.insert(id) {
            anyhow::bail!("Duplicate video id: {}", id);
        }

        if !video.path.exists() {
            tracing::warn!("Video file does not exist: {:?}", video.path);
        }
    }

    Ok(())
}
