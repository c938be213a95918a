//! Configuration loader and validator for the release announcer bot.
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::model::RepoRef;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(&'static str),
}

/// Root configuration struct mirroring the YAML schema exactly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    pub app: App,
    pub github: Github,
    pub discord: Discord,
}

/// App-level settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct App {
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

fn default_poll_interval_ms() -> u64 {
    60_000
}

/// Watched repository and the token used to read its release feed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Github {
    pub owner: String,
    pub repo: String,
    pub token: String,
}

/// Discord bot credentials and the announcement destination.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Discord {
    pub bot_token: String,
    pub channel_id: String,
}

impl Config {
    /// The watched repository as a single value.
    pub fn repo(&self) -> RepoRef {
        RepoRef::new(&self.github.owner, &self.github.repo)
    }
}

/// Load configuration from a YAML file and validate it.
/// - If `path` is None, uses `config.yaml` in the current working directory.
pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
    let path = path.unwrap_or_else(|| Path::new("config.yaml"));
    let content = fs::read_to_string(path)?;
    let cfg: Config = serde_yaml::from_str(&content)?;
    validate(&cfg)?;
    Ok(cfg)
}

/// Validate a configuration instance.
fn validate(cfg: &Config) -> Result<(), ConfigError> {
    if cfg.app.poll_interval_ms == 0 {
        return Err(ConfigError::Invalid("app.poll_interval_ms must be > 0"));
    }

    if cfg.github.owner.trim().is_empty() {
        return Err(ConfigError::Invalid("github.owner must be non-empty"));
    }
    if cfg.github.repo.trim().is_empty() {
        return Err(ConfigError::Invalid("github.repo must be non-empty"));
    }
    if cfg.github.token.trim().is_empty() {
        return Err(ConfigError::Invalid("github.token must be non-empty"));
    }

    if cfg.discord.bot_token.trim().is_empty() {
        return Err(ConfigError::Invalid("discord.bot_token must be non-empty"));
    }
    if cfg.discord.channel_id.trim().is_empty() {
        return Err(ConfigError::Invalid("discord.channel_id must be non-empty"));
    }

    Ok(())
}

/// Reference YAML document with every section present.
pub fn example() -> &'static str {
    r#"app:
  poll_interval_ms: 60000

github:
  owner: "acme"
  repo: "widget"
  token: "YOUR_GITHUB_ACCESS_TOKEN"

discord:
  bot_token: "YOUR_DISCORD_BOT_TOKEN"
  channel_id: "123456789012345678"
"#
}
