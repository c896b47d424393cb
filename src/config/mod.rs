//! Configuration module for Floodwarden.
//!
//! Loads configuration from environment variables (and `.env`).

use std::env;
use std::time::Duration;

use anyhow::{Context, Result, bail};

/// Bot running mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BotMode {
    #[default]
    Polling,
    Webhook,
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    // Telegram
    pub bot_token: String,
    pub bot_mode: BotMode,
    pub webhook_url: Option<String>,
    pub webhook_port: u16,
    pub webhook_secret: Option<String>,

    /// Owner user IDs (comma-separated).
    /// Owners are never flood-limited and may change settings anywhere.
    pub owner_ids: Vec<u64>,

    /// Chat that receives audit records, if any.
    pub log_channel_id: Option<i64>,

    /// Upper bound for a single moderation call.
    pub enforcement_timeout: Duration,

    // MongoDB, settings are kept in memory when unset
    pub mongodb_uri: Option<String>,
    pub mongodb_database: String,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let bot_token = env::var("BOT_TOKEN").context("BOT_TOKEN must be set")?;

        let bot_mode = match optional("BOT_MODE").as_deref().map(str::to_lowercase).as_deref() {
            Some("webhook") => BotMode::Webhook,
            _ => BotMode::Polling,
        };

        let webhook_url = optional("WEBHOOK_URL");
        if bot_mode == BotMode::Webhook && webhook_url.is_none() {
            bail!("WEBHOOK_URL must be set when BOT_MODE is webhook");
        }

        let webhook_port = parse_or("WEBHOOK_PORT", 8443)?;
        let timeout_secs: u64 = parse_or("ENFORCEMENT_TIMEOUT_SECS", 10)?;

        let log_channel_id = optional("LOG_CHANNEL_ID")
            .map(|s| s.parse::<i64>().context("LOG_CHANNEL_ID must be a chat id"))
            .transpose()?;

        Ok(Self {
            bot_token,
            bot_mode,
            webhook_url,
            webhook_port,
            webhook_secret: optional("WEBHOOK_SECRET"),
            owner_ids: parse_owner_ids(&optional("OWNER_IDS").unwrap_or_default()),
            log_channel_id,
            enforcement_timeout: Duration::from_secs(timeout_secs),
            mongodb_uri: optional("MONGODB_URI"),
            mongodb_database: optional("MONGODB_DATABASE")
                .unwrap_or_else(|| "floodwarden".to_string()),
        })
    }
}

/// Non-empty value of an environment variable.
fn optional(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_or<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional(key) {
        Some(raw) => raw
            .parse()
            .with_context(|| format!("{key} has an invalid value: {raw}")),
        None => Ok(default),
    }
}

/// Parse a comma-separated id list, skipping anything that is not a number.
fn parse_owner_ids(raw: &str) -> Vec<u64> {
    raw.split(',')
        .filter_map(|s| s.trim().parse::<u64>().ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_owner_ids() {
        assert_eq!(parse_owner_ids("1, 2,x,,3"), vec![1, 2, 3]);
        assert!(parse_owner_ids("").is_empty());
    }
}
