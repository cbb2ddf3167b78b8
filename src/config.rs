use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub chat: ChatConfig,
    #[serde(default)]
    pub creation: CreationConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Timeout for plain request/response calls. The creation stream is
    /// exempt: a slow ingestion may legitimately run for minutes.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}
fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct SessionConfig {
    #[serde(default = "default_session_path")]
    pub path: PathBuf,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            path: default_session_path(),
        }
    }
}

fn default_session_path() -> PathBuf {
    PathBuf::from("./data/session.json")
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChatConfig {
    /// Number of trailing messages forwarded as conversational context on
    /// each chat request. 6 = three user/assistant pairs.
    #[serde(default = "default_history_depth")]
    pub history_depth: usize,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            history_depth: default_history_depth(),
        }
    }
}

fn default_history_depth() -> usize {
    6
}

/// Defaults for assistant-creation parameters, used when the CLI flags
/// are omitted. The server remains the authority on accepted ranges.
#[derive(Debug, Deserialize, Clone)]
pub struct CreationConfig {
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_top_k")]
    pub top_k: i64,
    #[serde(default = "default_chunk_size")]
    pub chunk_size: i64,
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: i64,
}

impl Default for CreationConfig {
    fn default() -> Self {
        Self {
            temperature: default_temperature(),
            top_k: default_top_k(),
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
        }
    }
}

fn default_temperature() -> f64 {
    0.5
}
fn default_top_k() -> i64 {
    5
}
fn default_chunk_size() -> i64 {
    500
}
fn default_chunk_overlap() -> i64 {
    50
}

/// Load the configuration from a TOML file.
///
/// A missing file is not an error: every setting has a usable default, so
/// the client works against a local backend with no config at all.
pub fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let mut config: Config =
        toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    // Validate api
    if config.api.base_url.is_empty() {
        anyhow::bail!("api.base_url must not be empty");
    }
    if config.api.timeout_secs == 0 {
        anyhow::bail!("api.timeout_secs must be > 0");
    }
    while config.api.base_url.ends_with('/') {
        config.api.base_url.pop();
    }

    // Validate chat
    if config.chat.history_depth % 2 != 0 {
        anyhow::bail!("chat.history_depth must be even (user/assistant pairs)");
    }

    // Validate creation defaults
    if !(0.0..=1.0).contains(&config.creation.temperature) {
        anyhow::bail!("creation.temperature must be in [0.0, 1.0]");
    }
    if config.creation.top_k < 1 {
        anyhow::bail!("creation.top_k must be >= 1");
    }
    if config.creation.chunk_size < 1 {
        anyhow::bail!("creation.chunk_size must be >= 1");
    }
    if config.creation.chunk_overlap < 0 {
        anyhow::bail!("creation.chunk_overlap must be >= 0");
    }

    Ok(config)
}
