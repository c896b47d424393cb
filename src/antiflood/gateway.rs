//! Collaborator seams of the flood control core.
//!
//! The Telegram-backed implementations live in `bot::telegram` and
//! `permissions`.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::error::GatewayError;
use super::sender::SenderId;

/// Moderation actions against the messaging platform.
///
/// `until = None` means the restriction never expires. Implementations
/// document how they handle channel senders.
#[async_trait]
pub trait ModerationGateway: Send + Sync {
    async fn ban(
        &self,
        chat_id: i64,
        sender: SenderId,
        until: Option<DateTime<Utc>>,
    ) -> Result<(), GatewayError>;

    async fn unban(&self, chat_id: i64, sender: SenderId) -> Result<(), GatewayError>;

    /// Revoke the sender's permission to send messages.
    async fn restrict_send(
        &self,
        chat_id: i64,
        sender: SenderId,
        until: Option<DateTime<Utc>>,
    ) -> Result<(), GatewayError>;
}

/// Posts human-readable HTML text back into a chat.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn notify(&self, chat_id: i64, reply_to: Option<i32>, html: &str) -> Result<()>;
}

/// Decides whether a user is exempt from flood enforcement.
#[async_trait]
pub trait AdminOracle: Send + Sync {
    async fn is_exempt(&self, chat_id: i64, user_id: u64) -> Result<bool>;
}
