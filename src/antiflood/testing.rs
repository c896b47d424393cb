//! In-crate fakes for the collaborator traits.

use std::collections::HashSet;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use super::error::GatewayError;
use super::gateway::{AdminOracle, ModerationGateway, NotificationSink};
use super::sender::SenderId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayCall {
    Ban { chat_id: i64, sender: SenderId, until: Option<DateTime<Utc>> },
    Unban { chat_id: i64, sender: SenderId },
    Restrict { chat_id: i64, sender: SenderId, until: Option<DateTime<Utc>> },
}

/// Gateway that records every call and optionally fails or stalls.
#[derive(Default)]
pub struct RecordingGateway {
    calls: Mutex<Vec<GatewayCall>>,
    failure: Option<fn() -> GatewayError>,
    /// Fail only unbans, leaving bans to succeed.
    unban_failure: Option<fn() -> GatewayError>,
    stall: Option<Duration>,
}

impl RecordingGateway {
    pub fn failing_with(failure: fn() -> GatewayError) -> Self {
        Self {
            failure: Some(failure),
            ..Default::default()
        }
    }

    pub fn failing_unban_with(failure: fn() -> GatewayError) -> Self {
        Self {
            unban_failure: Some(failure),
            ..Default::default()
        }
    }

    pub fn stalling(stall: Duration) -> Self {
        Self {
            stall: Some(stall),
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<GatewayCall> {
        self.calls.lock().clone()
    }

    async fn record(&self, call: GatewayCall) -> Result<(), GatewayError> {
        let is_unban = matches!(call, GatewayCall::Unban { .. });
        self.calls.lock().push(call);
        if let Some(stall) = self.stall {
            tokio::time::sleep(stall).await;
        }
        match (self.failure, self.unban_failure) {
            (Some(failure), _) => Err(failure()),
            (None, Some(failure)) if is_unban => Err(failure()),
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl ModerationGateway for RecordingGateway {
    async fn ban(
        &self,
        chat_id: i64,
        sender: SenderId,
        until: Option<DateTime<Utc>>,
    ) -> Result<(), GatewayError> {
        self.record(GatewayCall::Ban { chat_id, sender, until }).await
    }

    async fn unban(&self, chat_id: i64, sender: SenderId) -> Result<(), GatewayError> {
        self.record(GatewayCall::Unban { chat_id, sender }).await
    }

    async fn restrict_send(
        &self,
        chat_id: i64,
        sender: SenderId,
        until: Option<DateTime<Utc>>,
    ) -> Result<(), GatewayError> {
        self.record(GatewayCall::Restrict { chat_id, sender, until }).await
    }
}

/// Notification sink that keeps `(chat_id, reply_to, html)` tuples.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<(i64, Option<i32>, String)>>,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<(i64, Option<i32>, String)> {
        self.sent.lock().clone()
    }
}

#[async_trait]
impl NotificationSink for RecordingNotifier {
    async fn notify(&self, chat_id: i64, reply_to: Option<i32>, html: &str) -> Result<()> {
        self.sent.lock().push((chat_id, reply_to, html.to_string()));
        Ok(())
    }
}

/// Admin oracle backed by a fixed set of `(chat_id, user_id)` pairs.
#[derive(Default)]
pub struct StaticAdmins {
    admins: HashSet<(i64, u64)>,
    broken: bool,
}

impl StaticAdmins {
    pub fn with(admins: &[(i64, u64)]) -> Self {
        Self {
            admins: admins.iter().copied().collect(),
            broken: false,
        }
    }

    /// Oracle whose every lookup fails.
    pub fn broken() -> Self {
        Self {
            broken: true,
            ..Default::default()
        }
    }
}

#[async_trait]
impl AdminOracle for StaticAdmins {
    async fn is_exempt(&self, chat_id: i64, user_id: u64) -> Result<bool> {
        if self.broken {
            anyhow::bail!("getChatMember failed");
        }
        Ok(self.admins.contains(&(chat_id, user_id)))
    }
}
