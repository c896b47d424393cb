//! Telegram implementations of the flood control seams.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use teloxide::prelude::*;
use teloxide::types::{ChatPermissions, MessageId, ParseMode, ReplyParameters};
use teloxide::{ApiError, RequestError};
use tracing::{info, warn};

use super::dispatcher::ThrottledBot;
use crate::antiflood::{AuditRecord, GatewayError, ModerationGateway, NotificationSink, SenderId};

/// Moderation calls and chat notices through the throttled bot.
#[derive(Clone)]
pub struct TelegramGateway {
    bot: ThrottledBot,
}

impl TelegramGateway {
    pub fn new(bot: ThrottledBot) -> Self {
        Self { bot }
    }

    /// Stop a channel from posting in the chat.
    ///
    /// Telegram has no expiry and no partial restriction for sender chats,
    /// so every channel action is a ban until unbanned.
    async fn ban_sender_chat(
        &self,
        chat_id: i64,
        channel_id: i64,
        until: Option<DateTime<Utc>>,
    ) -> Result<(), GatewayError> {
        if until.is_some() {
            warn!(
                "Channel {} in chat {} cannot be restricted for a limited time, banning it instead",
                channel_id, chat_id
            );
        }
        self.bot
            .ban_chat_sender_chat(ChatId(chat_id), ChatId(channel_id))
            .await
            .map(|_| ())
            .map_err(classify)
    }
}

/// Whether Telegram refused the call because the bot lacks admin rights.
fn lacks_rights(err: &ApiError) -> bool {
    match err {
        ApiError::NotEnoughRightsToRestrict => true,
        ApiError::Unknown(text) => {
            let text = text.to_lowercase();
            text.contains("not enough rights")
                || text.contains("chat_admin_required")
                || text.contains("have no rights")
        }
        _ => false,
    }
}

fn classify(err: RequestError) -> GatewayError {
    match err {
        RequestError::Api(api) if lacks_rights(&api) => GatewayError::PermissionDenied(api.to_string()),
        other => GatewayError::Transport(other.to_string()),
    }
}

#[async_trait]
impl ModerationGateway for TelegramGateway {
    async fn ban(
        &self,
        chat_id: i64,
        sender: SenderId,
        until: Option<DateTime<Utc>>,
    ) -> Result<(), GatewayError> {
        let user_id = match sender {
            SenderId::User(id) => id,
            SenderId::Chat(id) => return self.ban_sender_chat(chat_id, id, until).await,
        };

        let req = self.bot.ban_chat_member(ChatId(chat_id), UserId(user_id));
        let req = match until {
            Some(dt) => req.until_date(dt),
            None => req,
        };
        req.await.map(|_| ()).map_err(classify)
    }

    async fn unban(&self, chat_id: i64, sender: SenderId) -> Result<(), GatewayError> {
        let result = match sender {
            SenderId::User(id) => {
                self.bot
                    .unban_chat_member(ChatId(chat_id), UserId(id))
                    .await
                    .map(|_| ())
            }
            SenderId::Chat(id) => {
                self.bot
                    .unban_chat_sender_chat(ChatId(chat_id), ChatId(id))
                    .await
                    .map(|_| ())
            }
        };
        result.map_err(classify)
    }

    async fn restrict_send(
        &self,
        chat_id: i64,
        sender: SenderId,
        until: Option<DateTime<Utc>>,
    ) -> Result<(), GatewayError> {
        let user_id = match sender {
            SenderId::User(id) => id,
            SenderId::Chat(id) => return self.ban_sender_chat(chat_id, id, until).await,
        };

        // No permissions at all = muted
        let req = self.bot.restrict_chat_member(
            ChatId(chat_id),
            UserId(user_id),
            ChatPermissions::empty(),
        );
        let req = match until {
            Some(dt) => req.until_date(dt),
            None => req,
        };
        req.await.map(|_| ()).map_err(classify)
    }
}

#[async_trait]
impl NotificationSink for TelegramGateway {
    async fn notify(&self, chat_id: i64, reply_to: Option<i32>, html: &str) -> Result<()> {
        let req = self
            .bot
            .send_message(ChatId(chat_id), html)
            .parse_mode(ParseMode::Html);
        let req = match reply_to {
            Some(id) => req.reply_parameters(ReplyParameters::new(MessageId(id))),
            None => req,
        };
        req.await?;
        Ok(())
    }
}

/// Routes audit records to the tracing log and the optional log channel.
#[derive(Clone)]
pub struct LogChannel {
    bot: ThrottledBot,
    chat: Option<ChatId>,
}

impl LogChannel {
    pub fn new(bot: ThrottledBot, chat: Option<i64>) -> Self {
        Self {
            bot,
            chat: chat.map(ChatId),
        }
    }

    pub async fn record(&self, record: &AuditRecord) {
        info!(
            "#{} in chat {} ({}): {}",
            record.tag, record.chat_id, record.chat_title, record.note
        );

        let Some(chat) = self.chat else {
            return;
        };

        if let Err(e) = self
            .bot
            .send_message(chat, record.to_html())
            .parse_mode(ParseMode::Html)
            .await
        {
            warn!("Failed to forward audit record to log channel {}: {}", chat, e);
        }
    }
}
