use std::{net::SocketAddr, time::Duration};

use crate::server::error::{config::ConfigError, AppError};

const DEFAULT_ORCHESTRATOR_TIMEOUT_SECS: u64 = 30;
const DEFAULT_HTTP_BIND_ADDR: &str = "0.0.0.0:8080";

/// Discord channel IDs receiving audit events, one per audit channel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogChannels {
    pub user: Option<u64>,
    pub moderator: Option<u64>,
    pub audit: Option<u64>,
    pub error: Option<u64>,
}

pub struct Config {
    pub database_url: String,

    pub discord_bot_token: String,

    pub orchestrator_url: String,
    pub orchestrator_token: Option<String>,
    pub orchestrator_timeout: Duration,

    pub http_bind_addr: SocketAddr,
    pub ad_reward_secret: String,

    pub log_channels: LogChannels,
    pub log_json: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        Ok(Self {
            database_url: required("DATABASE_URL")?,
            discord_bot_token: required("DISCORD_BOT_TOKEN")?,
            orchestrator_url: required("ORCHESTRATOR_URL")?,
            orchestrator_token: optional("ORCHESTRATOR_TOKEN"),
            orchestrator_timeout: Duration::from_secs(
                parsed("ORCHESTRATOR_TIMEOUT_SECS")?.unwrap_or(DEFAULT_ORCHESTRATOR_TIMEOUT_SECS),
            ),
            http_bind_addr: match parsed("HTTP_BIND_ADDR")? {
                Some(addr) => addr,
                None => parse_value("HTTP_BIND_ADDR", DEFAULT_HTTP_BIND_ADDR)?,
            },
            ad_reward_secret: required("AD_REWARD_SECRET")?,
            log_channels: LogChannels {
                user: parsed("LOG_CHANNEL_USER")?,
                moderator: parsed("LOG_CHANNEL_MOD")?,
                audit: parsed("LOG_CHANNEL_AUDIT")?,
                error: parsed("LOG_CHANNEL_ERROR")?,
            },
            log_json: parsed("LOG_JSON")?.unwrap_or(false),
        })
    }
}

fn required(name: &str) -> Result<String, ConfigError> {
    optional(name).ok_or_else(|| ConfigError::MissingEnvVar(name.to_string()))
}

/// Reads a variable, treating an empty value as unset.
fn optional(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .filter(|value| !value.trim().is_empty())
}

fn parsed<T: std::str::FromStr>(name: &str) -> Result<Option<T>, ConfigError> {
    optional(name)
        .map(|value| parse_value(name, &value))
        .transpose()
}

fn parse_value<T: std::str::FromStr>(name: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidEnvVar {
        name: name.to_string(),
        value: value.to_string(),
    })
}
