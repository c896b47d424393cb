//! Settings commands: argument validation and store updates.
//!
//! Platform-independent; the Telegram handlers in `plugins::antiflood`
//! only resolve the chat, check admin rights and send the replies.

use super::error::{FloodError, FloodResult};
use super::settings::FloodSettingsStore;
use crate::database::{FloodMode, FloodPolicy};

/// Smallest threshold that can be enabled.
pub const MIN_THRESHOLD: u32 = 3;

pub const SETFLOOD_USAGE: &str =
    "Use /setflood N (3 or more) to enable flood control or /setflood off to disable it.";

pub const SETFLOODMODE_USAGE: &str =
    "Use /setfloodmode ban|kick|mute|tban|tmute [duration]. \
     Durations look like 4m = 4 minutes, 3h = 3 hours, 6d = 6 days, 5w = 5 weeks.";

/// Outcome of a successful `/setflood`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThresholdChange {
    Disabled,
    Enabled(u32),
}

/// Current flood settings of a chat, as shown by `/flood`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FloodStatus {
    pub threshold: u32,
    pub policy: FloodPolicy,
}

impl FloodStatus {
    pub fn is_enabled(&self) -> bool {
        self.threshold > 0
    }

    /// Threshold as text: the number, or "disabled".
    pub fn threshold_text(&self) -> String {
        if self.is_enabled() {
            self.threshold.to_string()
        } else {
            "disabled".to_string()
        }
    }
}

/// Handle the `/setflood` argument: `off`, `no`, `0` or a number.
///
/// Numbers 1 and 2 are rejected and leave the stored threshold as it is.
pub async fn set_threshold(
    store: &dyn FloodSettingsStore,
    chat_id: i64,
    arg: Option<&str>,
) -> FloodResult<ThresholdChange> {
    let arg = arg
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .ok_or_else(|| FloodError::InvalidArgument(SETFLOOD_USAGE.to_string()))?
        .to_lowercase();

    let threshold = match arg.as_str() {
        "off" | "no" => 0,
        digits if digits.bytes().all(|b| b.is_ascii_digit()) => digits
            .parse::<u32>()
            .map_err(|_| FloodError::InvalidArgument(format!("{digits} is too large.")))?,
        _ => return Err(FloodError::InvalidArgument(SETFLOOD_USAGE.to_string())),
    };

    if threshold > 0 && threshold < MIN_THRESHOLD {
        return Err(FloodError::InvalidThreshold(threshold));
    }

    store.set_threshold(chat_id, threshold).await?;

    Ok(match threshold {
        0 => ThresholdChange::Disabled,
        n => ThresholdChange::Enabled(n),
    })
}

/// Handle `/setfloodmode <mode> [duration]`.
pub async fn set_policy(
    store: &dyn FloodSettingsStore,
    chat_id: i64,
    args: &[&str],
) -> FloodResult<FloodPolicy> {
    let Some(keyword) = args.first() else {
        return Err(FloodError::InvalidArgument(SETFLOODMODE_USAGE.to_string()));
    };

    let mode = FloodMode::from_keyword(keyword).ok_or_else(|| {
        FloodError::InvalidArgument("I only understand ban/kick/mute/tban/tmute!".to_string())
    })?;

    store.set_policy(chat_id, mode, args.get(1).copied()).await
}

/// Read the chat's threshold and policy.
pub async fn query(store: &dyn FloodSettingsStore, chat_id: i64) -> FloodResult<FloodStatus> {
    let setting = store.get_setting(chat_id).await?;
    Ok(FloodStatus {
        threshold: setting.threshold,
        policy: setting.policy(),
    })
}
