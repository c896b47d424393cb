//! Action dispatcher.
//!
//! Applies the chat's configured flood policy to a user whose run reached
//! the threshold, tells the chat, and produces the audit record.
//!
//! Failure handling:
//! - `PermissionDenied`: flood control is switched off for the chat, the
//!   chat is told why and an INFO record is returned.
//! - anything else (transport errors, timeouts): returned to the caller,
//!   nothing is changed.
//! - a kick whose unban fails has still banned the sender; it is reported
//!   as a ban.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{error, info, warn};

use super::audit::{AuditRecord, AuditTag, AuditUser};
use super::counter::FloodCounter;
use super::duration;
use super::error::{FloodResult, GatewayError};
use super::gateway::{ModerationGateway, NotificationSink};
use super::sender::SenderId;
use super::settings::FloodSettingsStore;
use crate::database::{FloodMode, FloodPolicy};

/// The message that completed a flood run.
#[derive(Debug, Clone)]
pub struct FloodTarget {
    pub chat_id: i64,
    pub chat_title: String,
    pub sender: SenderId,
    pub sender_name: String,
    pub message_id: i32,
    /// Timestamp of the triggering message; timed actions expire relative to it.
    pub sent_at: DateTime<Utc>,
}

impl FloodTarget {
    fn audit_user(&self) -> AuditUser {
        AuditUser {
            id: self.sender,
            name: self.sender_name.clone(),
        }
    }
}

fn audit_tag(mode: FloodMode) -> AuditTag {
    match mode {
        FloodMode::Ban => AuditTag::Banned,
        FloodMode::Kick => AuditTag::Kicked,
        FloodMode::Mute => AuditTag::Muted,
        FloodMode::TimedBan => AuditTag::TimedBan,
        FloodMode::TimedMute => AuditTag::TimedMute,
    }
}

/// Short outcome shown in the chat, e.g. "Banned!" or "Muted for 10m!".
fn outcome_text(policy: &FloodPolicy) -> String {
    match policy.mode {
        FloodMode::Ban => "Banned!".to_string(),
        FloodMode::Kick => "Kicked!".to_string(),
        FloodMode::Mute => "Muted!".to_string(),
        FloodMode::TimedBan => format!("Banned for {}!", policy.mode_param),
        FloodMode::TimedMute => format!("Muted for {}!", policy.mode_param),
    }
}

const AUTO_DISABLE_NOTICE: &str = "⚠️ I don't have permission to restrict members here, \
so flood control is now disabled.\nGive me the right to ban and restrict users, \
then turn it back on with /setflood.";

/// Executes flood policies through the moderation gateway.
pub struct ActionDispatcher {
    settings: Arc<dyn FloodSettingsStore>,
    counter: Arc<FloodCounter>,
    gateway: Arc<dyn ModerationGateway>,
    notifier: Arc<dyn NotificationSink>,
    /// Upper bound for each gateway call.
    timeout: Duration,
}

impl ActionDispatcher {
    pub fn new(
        settings: Arc<dyn FloodSettingsStore>,
        counter: Arc<FloodCounter>,
        gateway: Arc<dyn ModerationGateway>,
        notifier: Arc<dyn NotificationSink>,
        timeout: Duration,
    ) -> Self {
        Self {
            settings,
            counter,
            gateway,
            notifier,
            timeout,
        }
    }

    /// Apply the chat's policy to `target`.
    pub async fn dispatch(&self, target: &FloodTarget) -> FloodResult<AuditRecord> {
        let policy = self.settings.get_policy(target.chat_id).await?;

        // A stored spec that no longer parses is an error, never a default duration
        let until = if policy.mode.is_timed() {
            Some(duration::parse_expiry(&policy.mode_param, target.sent_at)?)
        } else {
            None
        };

        match self.execute(policy.mode, target, until).await {
            Ok(applied) => {
                // A kick can end up as a plain ban, report what really happened
                let policy = if applied == policy.mode {
                    policy
                } else {
                    FloodPolicy::new(applied, "")
                };

                info!(
                    "Flood action '{}' applied to {} in chat {}",
                    policy, target.sender, target.chat_id
                );

                let text = format!(
                    "🌊 {} flooded the chat. {}",
                    target.sender.mention_html(&target.sender_name),
                    outcome_text(&policy)
                );
                self.notify(target, &text).await;

                // The run has been dealt with; a newer run by someone else is kept
                self.counter.reset_sender(target.chat_id, target.sender);

                Ok(AuditRecord::enforcement(
                    audit_tag(policy.mode),
                    target.chat_id,
                    &target.chat_title,
                    target.audit_user(),
                ))
            }
            Err(e) if e.is_permission_denied() => self.auto_disable(target, &e).await,
            Err(e) => {
                error!(
                    "Flood action '{}' failed for {} in chat {}: {}",
                    policy, target.sender, target.chat_id, e
                );
                Err(e.into())
            }
        }
    }

    /// Run the gateway calls for `mode` and return the mode actually applied.
    async fn execute(
        &self,
        mode: FloodMode,
        target: &FloodTarget,
        until: Option<DateTime<Utc>>,
    ) -> Result<FloodMode, GatewayError> {
        let (chat_id, sender) = (target.chat_id, target.sender);

        match mode {
            FloodMode::Ban | FloodMode::TimedBan => {
                self.bounded(self.gateway.ban(chat_id, sender, until)).await?;
            }
            FloodMode::Kick => {
                self.bounded(self.gateway.ban(chat_id, sender, None)).await?;
                if let Err(e) = self.bounded(self.gateway.unban(chat_id, sender)).await {
                    error!(
                        "Kick of {} in chat {} degraded to a ban, unban failed: {}",
                        sender, chat_id, e
                    );
                    return Ok(FloodMode::Ban);
                }
            }
            FloodMode::Mute | FloodMode::TimedMute => {
                self.bounded(self.gateway.restrict_send(chat_id, sender, until))
                    .await?;
            }
        }

        Ok(mode)
    }

    async fn bounded<F>(&self, call: F) -> Result<(), GatewayError>
    where
        F: Future<Output = Result<(), GatewayError>>,
    {
        tokio::time::timeout(self.timeout, call)
            .await
            .map_err(|_| GatewayError::Timeout(self.timeout))?
    }

    /// Turn flood control off after the platform refused a moderation action.
    async fn auto_disable(
        &self,
        target: &FloodTarget,
        cause: &GatewayError,
    ) -> FloodResult<AuditRecord> {
        warn!(
            "Missing rights in chat {} ({}), disabling flood control",
            target.chat_id, cause
        );

        self.settings.set_threshold(target.chat_id, 0).await?;
        self.notify(target, AUTO_DISABLE_NOTICE).await;

        Ok(AuditRecord::info(
            target.chat_id,
            &target.chat_title,
            "Not enough permission to restrict users, so flood control was disabled automatically.",
        ))
    }

    /// Chat notifications are best effort; the action already happened.
    async fn notify(&self, target: &FloodTarget, html: &str) {
        if let Err(e) = self
            .notifier
            .notify(target.chat_id, Some(target.message_id), html)
            .await
        {
            warn!("Failed to notify chat {}: {}", target.chat_id, e);
        }
    }
}
