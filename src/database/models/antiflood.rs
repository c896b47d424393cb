//! Antiflood configuration models.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Action taken against a user who floods the chat.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum FloodMode {
    /// Ban permanently
    #[default]
    Ban,
    /// Ban then unban (user can rejoin)
    Kick,
    /// Revoke send permission indefinitely
    Mute,
    /// Ban until an expiry
    #[serde(rename = "tban")]
    TimedBan,
    /// Revoke send permission until an expiry
    #[serde(rename = "tmute")]
    TimedMute,
}

impl FloodMode {
    /// Parse the command keyword (`ban`, `kick`, `mute`, `tban`, `tmute`).
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword.to_lowercase().as_str() {
            "ban" => Some(Self::Ban),
            "kick" => Some(Self::Kick),
            "mute" => Some(Self::Mute),
            "tban" => Some(Self::TimedBan),
            "tmute" => Some(Self::TimedMute),
            _ => None,
        }
    }

    pub fn keyword(self) -> &'static str {
        match self {
            Self::Ban => "ban",
            Self::Kick => "kick",
            Self::Mute => "mute",
            Self::TimedBan => "tban",
            Self::TimedMute => "tmute",
        }
    }

    /// Whether the mode needs a duration parameter.
    pub fn is_timed(self) -> bool {
        matches!(self, Self::TimedBan | Self::TimedMute)
    }
}

impl fmt::Display for FloodMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// Action policy: mode plus its duration parameter for timed modes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FloodPolicy {
    pub mode: FloodMode,
    /// Duration spec, empty unless `mode` is timed.
    pub mode_param: String,
}

impl FloodPolicy {
    pub fn new(mode: FloodMode, mode_param: impl Into<String>) -> Self {
        let mode_param = if mode.is_timed() {
            mode_param.into()
        } else {
            String::new()
        };
        Self { mode, mode_param }
    }
}

impl fmt::Display for FloodPolicy {
    /// Renders as `<action>[ for <duration>]`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.mode.is_timed() {
            write!(f, "{} for {}", self.mode, self.mode_param)
        } else {
            write!(f, "{}", self.mode)
        }
    }
}

/// Stored flood settings for one chat.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FloodSetting {
    /// Telegram chat ID (indexed)
    pub chat_id: i64,

    /// Consecutive message limit, 0 = disabled
    #[serde(default)]
    pub threshold: u32,

    #[serde(default)]
    pub mode: FloodMode,

    /// Duration spec for tban/tmute
    #[serde(default)]
    pub mode_param: String,
}

impl FloodSetting {
    /// Defaults for a chat that was never configured.
    pub fn new(chat_id: i64) -> Self {
        Self {
            chat_id,
            threshold: 0,
            mode: FloodMode::Ban,
            mode_param: String::new(),
        }
    }

    pub fn policy(&self) -> FloodPolicy {
        FloodPolicy::new(self.mode, self.mode_param.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_rendering() {
        assert_eq!(FloodPolicy::new(FloodMode::Kick, "").to_string(), "kick");
        assert_eq!(FloodPolicy::new(FloodMode::TimedMute, "10m").to_string(), "tmute for 10m");
    }

    #[test]
    fn test_untimed_policy_drops_param() {
        let policy = FloodPolicy::new(FloodMode::Mute, "10m");
        assert!(policy.mode_param.is_empty());
    }

    #[test]
    fn test_mode_keywords() {
        assert_eq!(FloodMode::from_keyword("TBAN"), Some(FloodMode::TimedBan));
        assert_eq!(FloodMode::from_keyword("warn"), None);
        assert_eq!(FloodMode::default(), FloodMode::Ban);
    }
}
