//! Flood evaluator.
//!
//! Entry point for every inbound group message: applies the admin
//! exemption, drives the counter and hands triggered runs to the
//! action dispatcher. The counter lock is released before any
//! moderation call starts.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use super::action::{ActionDispatcher, FloodTarget};
use super::audit::AuditRecord;
use super::counter::FloodCounter;
use super::error::FloodResult;
use super::gateway::AdminOracle;
use super::sender::SenderId;
use super::settings::FloodSettingsStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatKind {
    Private,
    Group,
}

/// One inbound message, reduced to what flood control needs.
#[derive(Debug, Clone)]
pub struct FloodEvent {
    pub chat_id: i64,
    pub chat_kind: ChatKind,
    pub chat_title: String,
    pub sender_id: SenderId,
    pub sender_name: String,
    /// Set when the platform already tells us the sender is an admin
    /// (e.g. anonymous admins posting as the group).
    pub sender_is_admin: bool,
    pub message_id: i32,
    pub sent_at: DateTime<Utc>,
}

impl FloodEvent {
    fn target(&self) -> FloodTarget {
        FloodTarget {
            chat_id: self.chat_id,
            chat_title: self.chat_title.clone(),
            sender: self.sender_id,
            sender_name: self.sender_name.clone(),
            message_id: self.message_id,
            sent_at: self.sent_at,
        }
    }
}

pub struct FloodEvaluator {
    settings: Arc<dyn FloodSettingsStore>,
    counter: Arc<FloodCounter>,
    admins: Arc<dyn AdminOracle>,
    actions: ActionDispatcher,
}

impl FloodEvaluator {
    pub fn new(
        settings: Arc<dyn FloodSettingsStore>,
        counter: Arc<FloodCounter>,
        admins: Arc<dyn AdminOracle>,
        actions: ActionDispatcher,
    ) -> Self {
        Self {
            settings,
            counter,
            admins,
            actions,
        }
    }

    /// Count `event` and enforce the chat's policy if it completes a flood.
    ///
    /// Returns the audit record of the enforcement (or of the
    /// auto-disable), `None` when nothing happened.
    pub async fn evaluate(&self, event: &FloodEvent) -> FloodResult<Option<AuditRecord>> {
        if event.chat_kind == ChatKind::Private {
            return Ok(None);
        }

        // Only user accounts can be chat admins
        let exempt = event.sender_is_admin
            || match event.sender_id {
                SenderId::User(user_id) => self.admins.is_exempt(event.chat_id, user_id).await?,
                SenderId::Chat(_) => false,
            };

        if exempt {
            debug!(
                "Sender {} is exempt in chat {}, resetting flood run",
                event.sender_id, event.chat_id
            );
            self.counter.observe(event.chat_id, None).await?;
            return Ok(None);
        }

        if !self.counter.observe(event.chat_id, Some(event.sender_id)).await? {
            return Ok(None);
        }

        info!(
            "{} reached the flood threshold in chat {}",
            event.sender_id, event.chat_id
        );

        self.actions.dispatch(&event.target()).await.map(Some)
    }

    /// Re-key a chat's settings and counter after a platform-side id change.
    pub async fn migrate_chat(&self, old_chat_id: i64, new_chat_id: i64) -> FloodResult<()> {
        self.settings.migrate(old_chat_id, new_chat_id).await?;
        self.counter.migrate(old_chat_id, new_chat_id);
        info!("Migrated flood control {} -> {}", old_chat_id, new_chat_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chrono::TimeZone;

    use super::*;
    use crate::antiflood::testing::{GatewayCall, RecordingGateway, RecordingNotifier, StaticAdmins};
    use crate::antiflood::{AuditTag, FloodError, MemoryFloodSettings};
    use crate::database::FloodMode;

    struct Harness {
        settings: Arc<MemoryFloodSettings>,
        counter: Arc<FloodCounter>,
        gateway: Arc<RecordingGateway>,
        evaluator: FloodEvaluator,
    }

    fn harness(admins: StaticAdmins) -> Harness {
        let settings = Arc::new(MemoryFloodSettings::new());
        let counter = Arc::new(FloodCounter::new(settings.clone()));
        let gateway = Arc::new(RecordingGateway::default());
        let actions = ActionDispatcher::new(
            settings.clone(),
            counter.clone(),
            gateway.clone(),
            Arc::new(RecordingNotifier::default()),
            Duration::from_secs(1),
        );
        let evaluator =
            FloodEvaluator::new(settings.clone(), counter.clone(), Arc::new(admins), actions);
        Harness { settings, counter, gateway, evaluator }
    }

    fn event(chat_id: i64, sender_id: u64, minute: u32) -> FloodEvent {
        FloodEvent {
            chat_id,
            chat_kind: ChatKind::Group,
            chat_title: "Chat".to_string(),
            sender_id: SenderId::User(sender_id),
            sender_name: format!("user{sender_id}"),
            sender_is_admin: false,
            message_id: minute as i32,
            sent_at: Utc.with_ymd_and_hms(2024, 3, 1, 12, minute, 0).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_third_message_triggers_timed_mute() {
        let h = harness(StaticAdmins::default());
        h.settings.set_threshold(-1, 3).await.unwrap();
        h.settings.set_policy(-1, FloodMode::TimedMute, Some("10m")).await.unwrap();

        assert!(h.evaluator.evaluate(&event(-1, 7, 0)).await.unwrap().is_none());
        assert!(h.evaluator.evaluate(&event(-1, 7, 1)).await.unwrap().is_none());
        let third = event(-1, 7, 2);
        let record = h.evaluator.evaluate(&third).await.unwrap().unwrap();

        assert_eq!(record.tag, AuditTag::TimedMute);
        assert_eq!(
            h.gateway.calls(),
            vec![GatewayCall::Restrict {
                chat_id: -1,
                sender: SenderId::User(7),
                until: Some(third.sent_at + chrono::Duration::minutes(10)),
            }]
        );
    }

    #[tokio::test]
    async fn test_admin_messages_reset_run() {
        let h = harness(StaticAdmins::with(&[(-1, 1)]));
        h.settings.set_threshold(-1, 3).await.unwrap();

        h.evaluator.evaluate(&event(-1, 7, 0)).await.unwrap();
        h.evaluator.evaluate(&event(-1, 7, 1)).await.unwrap();
        for minute in 2..10 {
            assert!(h.evaluator.evaluate(&event(-1, 1, minute)).await.unwrap().is_none());
        }
        assert_eq!(h.counter.state(-1).consecutive_count, 0);

        h.evaluator.evaluate(&event(-1, 7, 10)).await.unwrap();
        h.evaluator.evaluate(&event(-1, 7, 11)).await.unwrap();
        assert!(h.gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn test_anonymous_admin_flag_is_exempt() {
        let h = harness(StaticAdmins::default());
        h.settings.set_threshold(-1, 3).await.unwrap();

        for minute in 0..5 {
            let mut ev = event(-1, 7, minute);
            ev.sender_is_admin = true;
            assert!(h.evaluator.evaluate(&ev).await.unwrap().is_none());
        }
        assert!(h.gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn test_channel_sender_is_counted_and_never_exempt() {
        // Admin oracle would exempt user 100, which must not leak to channel -100
        let h = harness(StaticAdmins::with(&[(-1, 100)]));
        h.settings.set_threshold(-1, 3).await.unwrap();

        let channel_event = |minute| {
            let mut ev = event(-1, 100, minute);
            ev.sender_id = SenderId::Chat(-100);
            ev
        };

        h.evaluator.evaluate(&event(-1, 7, 0)).await.unwrap();
        h.evaluator.evaluate(&event(-1, 7, 1)).await.unwrap();
        // The channel post breaks the user's run
        assert!(h.evaluator.evaluate(&channel_event(2)).await.unwrap().is_none());
        assert!(h.evaluator.evaluate(&channel_event(3)).await.unwrap().is_none());
        let record = h.evaluator.evaluate(&channel_event(4)).await.unwrap().unwrap();

        assert_eq!(record.tag, AuditTag::Banned);
        assert_eq!(
            h.gateway.calls(),
            vec![GatewayCall::Ban { chat_id: -1, sender: SenderId::Chat(-100), until: None }]
        );
    }

    #[tokio::test]
    async fn test_private_chats_are_ignored() {
        let h = harness(StaticAdmins::default());
        h.settings.set_threshold(7, 3).await.unwrap();

        for minute in 0..5 {
            let mut ev = event(7, 7, minute);
            ev.chat_kind = ChatKind::Private;
            assert!(h.evaluator.evaluate(&ev).await.unwrap().is_none());
        }
        assert_eq!(h.counter.state(7).consecutive_count, 0);
    }

    #[tokio::test]
    async fn test_oracle_failure_leaves_count_untouched() {
        let h = harness(StaticAdmins::broken());
        h.settings.set_threshold(-1, 3).await.unwrap();

        let result = h.evaluator.evaluate(&event(-1, 7, 0)).await;

        assert!(matches!(result, Err(FloodError::Backend(_))));
        assert_eq!(h.counter.state(-1).consecutive_count, 0);
    }

    #[tokio::test]
    async fn test_migrated_chat_keeps_settings() {
        let h = harness(StaticAdmins::default());
        h.settings.set_threshold(-1, 3).await.unwrap();
        h.settings.set_policy(-1, FloodMode::Kick, None).await.unwrap();
        h.evaluator.evaluate(&event(-1, 7, 0)).await.unwrap();

        h.evaluator.migrate_chat(-1, -1001).await.unwrap();
        h.evaluator.migrate_chat(-1, -1001).await.unwrap();

        h.evaluator.evaluate(&event(-1001, 7, 1)).await.unwrap();
        let record = h.evaluator.evaluate(&event(-1001, 7, 2)).await.unwrap().unwrap();
        assert_eq!(record.tag, AuditTag::Kicked);
        assert_eq!(record.chat_id, -1001);
    }
}
