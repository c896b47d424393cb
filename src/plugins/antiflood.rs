//! Antiflood command handlers.
//!
//! `/flood`, `/setflood` and `/setfloodmode`. Argument handling lives in
//! `antiflood::commands`; these handlers resolve the chat, check rights
//! and reply.

use teloxide::prelude::*;
use teloxide::types::ReplyParameters;
use tracing::info;

use crate::antiflood::commands::{self, FloodStatus, ThresholdChange};
use crate::antiflood::{AuditRecord, AuditTag, AuditUser, FloodError, SenderId};
use crate::bot::dispatcher::{AppState, ThrottledBot};

const GROUP_ONLY: &str = "This command is meant to be used in a group, not in PM.";
const NOT_ALLOWED: &str = "You need to be an admin with the right to change group info to do this.";

fn is_group(msg: &Message) -> bool {
    msg.chat.is_group() || msg.chat.is_supergroup()
}

fn command_args(msg: &Message) -> Vec<&str> {
    msg.text()
        .unwrap_or("")
        .split_whitespace()
        .skip(1)
        .collect()
}

fn issuer(msg: &Message) -> Option<AuditUser> {
    msg.from.as_ref().map(|user| AuditUser {
        id: SenderId::User(user.id.0),
        name: user.full_name(),
    })
}

async fn reply(bot: &ThrottledBot, msg: &Message, text: impl Into<String>) -> anyhow::Result<()> {
    bot.send_message(msg.chat.id, text)
        .reply_parameters(ReplyParameters::new(msg.id))
        .await?;
    Ok(())
}

/// Reply with the error if it came from user input, propagate it otherwise.
async fn reply_user_error(
    bot: &ThrottledBot,
    msg: &Message,
    err: FloodError,
) -> anyhow::Result<()> {
    if err.is_user_error() {
        reply(bot, msg, err.to_string()).await
    } else {
        Err(err.into())
    }
}

/// Group-only commands: reply and return false when used in PM.
async fn require_group(bot: &ThrottledBot, msg: &Message) -> anyhow::Result<bool> {
    if is_group(msg) {
        return Ok(true);
    }
    reply(bot, msg, GROUP_ONLY).await?;
    Ok(false)
}

/// Settings changes need the change-info right; anonymous admins pass.
async fn require_change_info(
    bot: &ThrottledBot,
    msg: &Message,
    state: &AppState,
) -> anyhow::Result<bool> {
    if msg.sender_chat.as_ref().is_some_and(|c| c.id == msg.chat.id) {
        return Ok(true);
    }

    let Some(user) = msg.from.as_ref() else {
        return Ok(false);
    };

    if state.permissions.can_change_info(msg.chat.id, user.id).await? {
        return Ok(true);
    }

    reply(bot, msg, NOT_ALLOWED).await?;
    Ok(false)
}

/// Handle /flood - show the current threshold.
pub async fn flood_command(bot: ThrottledBot, msg: Message, state: AppState) -> anyhow::Result<()> {
    if !require_group(&bot, &msg).await? {
        return Ok(());
    }

    let status = commands::query(state.settings.as_ref(), msg.chat.id.0).await?;
    reply(&bot, &msg, status_text(&status)).await
}

/// Reply to /flood: the threshold (or that it is off) and the policy.
fn status_text(status: &FloodStatus) -> String {
    if status.is_enabled() {
        format!(
            "I'm currently restricting members after {} consecutive messages. Flooders will get {}.",
            status.threshold_text(),
            status.policy
        )
    } else {
        format!(
            "I'm not enforcing any flood control here! Flooders would get {}.",
            status.policy
        )
    }
}

/// Handle /setflood - set or disable the threshold.
pub async fn setflood_command(
    bot: ThrottledBot,
    msg: Message,
    state: AppState,
) -> anyhow::Result<()> {
    if !require_group(&bot, &msg).await? || !require_change_info(&bot, &msg, &state).await? {
        return Ok(());
    }

    let chat_id = msg.chat.id;
    let chat_title = msg.chat.title().unwrap_or_default();
    let args = command_args(&msg);

    let change =
        match commands::set_threshold(state.settings.as_ref(), chat_id.0, args.first().copied())
            .await
        {
            Ok(change) => change,
            Err(e) => return reply_user_error(&bot, &msg, e).await,
        };

    let (text, note) = match change {
        ThresholdChange::Disabled => (
            format!("Antiflood has been disabled in {}.", chat_title),
            "Disabled antiflood.".to_string(),
        ),
        ThresholdChange::Enabled(n) => (
            format!("Antiflood has been set to {} in {}.", n, chat_title),
            format!("Set antiflood to {}.", n),
        ),
    };

    reply(&bot, &msg, text).await?;
    info!("Flood threshold changed in chat {}: {:?}", chat_id, change);

    if let Some(admin) = issuer(&msg) {
        let record =
            AuditRecord::settings_change(AuditTag::SetFlood, chat_id.0, chat_title, admin, note);
        state.audit.record(&record).await;
    }

    Ok(())
}

/// Handle /setfloodmode - show or change the enforcement policy.
pub async fn setfloodmode_command(
    bot: ThrottledBot,
    msg: Message,
    state: AppState,
) -> anyhow::Result<()> {
    if !require_group(&bot, &msg).await? {
        return Ok(());
    }

    let chat_id = msg.chat.id;
    let args = command_args(&msg);

    if args.is_empty() {
        let status = commands::query(state.settings.as_ref(), chat_id.0).await?;
        let text = format!(
            "Sending more messages than the flood limit will result in {}.",
            status.policy
        );
        return reply(&bot, &msg, text).await;
    }

    if !require_change_info(&bot, &msg, &state).await? {
        return Ok(());
    }

    let policy = match commands::set_policy(state.settings.as_ref(), chat_id.0, &args).await {
        Ok(policy) => policy,
        Err(e) => return reply_user_error(&bot, &msg, e).await,
    };

    reply(
        &bot,
        &msg,
        format!("Exceeding the consecutive flood limit will result in {}!", policy),
    )
    .await?;
    info!("Flood policy changed in chat {}: {}", chat_id, policy);

    if let Some(admin) = issuer(&msg) {
        let record = AuditRecord::settings_change(
            AuditTag::SetFloodMode,
            chat_id.0,
            msg.chat.title().unwrap_or_default(),
            admin,
            format!("Changed antiflood mode. Flooders will get {}.", policy),
        );
        state.audit.record(&record).await;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{FloodMode, FloodPolicy};

    #[test]
    fn test_disabled_status_still_names_policy() {
        let status = FloodStatus {
            threshold: 0,
            policy: FloodPolicy::new(FloodMode::TimedMute, "3h"),
        };
        assert_eq!(
            status_text(&status),
            "I'm not enforcing any flood control here! Flooders would get tmute for 3h."
        );
    }

    #[test]
    fn test_enabled_status() {
        let status = FloodStatus {
            threshold: 5,
            policy: FloodPolicy::default(),
        };
        assert_eq!(
            status_text(&status),
            "I'm currently restricting members after 5 consecutive messages. Flooders will get ban."
        );
    }
}
