//! Flood settings store.
//!
//! Durable per-chat threshold and action policy. The MongoDB-backed
//! implementation lives in `database::FloodSettingsRepository`; the
//! in-memory one here is used when no database is configured.

use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::debug;

use super::duration;
use super::error::{FloodError, FloodResult};
use crate::database::{FloodMode, FloodPolicy, FloodSetting};

/// Per-chat flood configuration storage.
///
/// Implementations must be linearizable per chat id: a write followed by
/// a read of the same chat, from any caller, observes the write.
#[async_trait]
pub trait FloodSettingsStore: Send + Sync {
    /// Full setting row, defaults if the chat was never configured.
    async fn get_setting(&self, chat_id: i64) -> Result<FloodSetting>;

    /// Persist the threshold without touching the policy.
    async fn set_threshold(&self, chat_id: i64, threshold: u32) -> Result<()>;

    /// Persist the policy without touching the threshold.
    async fn save_policy(&self, chat_id: i64, policy: &FloodPolicy) -> Result<()>;

    /// Re-key the chat's row from `old_chat_id` to `new_chat_id`.
    ///
    /// Must be idempotent: a missing old row is a no-op.
    async fn migrate(&self, old_chat_id: i64, new_chat_id: i64) -> Result<()>;

    async fn get_threshold(&self, chat_id: i64) -> Result<u32> {
        Ok(self.get_setting(chat_id).await?.threshold)
    }

    async fn get_policy(&self, chat_id: i64) -> Result<FloodPolicy> {
        Ok(self.get_setting(chat_id).await?.policy())
    }

    /// Validate and persist a policy.
    ///
    /// Timed modes require a duration accepted by the duration grammar;
    /// for the other modes the parameter is discarded.
    async fn set_policy(
        &self,
        chat_id: i64,
        mode: FloodMode,
        mode_param: Option<&str>,
    ) -> FloodResult<FloodPolicy> {
        let policy = if mode.is_timed() {
            let spec = mode_param.filter(|p| !p.is_empty()).ok_or_else(|| {
                FloodError::InvalidArgument(format!(
                    "{mode} needs a duration, e.g. /setfloodmode {mode} 4m"
                ))
            })?;
            duration::validate(spec)?;
            FloodPolicy::new(mode, spec)
        } else {
            FloodPolicy::new(mode, "")
        };

        self.save_policy(chat_id, &policy).await?;
        Ok(policy)
    }
}

/// Process-local settings store.
#[derive(Debug, Default)]
pub struct MemoryFloodSettings {
    rows: RwLock<HashMap<i64, FloodSetting>>,
}

impl MemoryFloodSettings {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FloodSettingsStore for MemoryFloodSettings {
    async fn get_setting(&self, chat_id: i64) -> Result<FloodSetting> {
        Ok(self
            .rows
            .read()
            .get(&chat_id)
            .cloned()
            .unwrap_or_else(|| FloodSetting::new(chat_id)))
    }

    async fn set_threshold(&self, chat_id: i64, threshold: u32) -> Result<()> {
        self.rows
            .write()
            .entry(chat_id)
            .or_insert_with(|| FloodSetting::new(chat_id))
            .threshold = threshold;
        debug!("Set flood threshold {} for chat {}", threshold, chat_id);
        Ok(())
    }

    async fn save_policy(&self, chat_id: i64, policy: &FloodPolicy) -> Result<()> {
        let mut rows = self.rows.write();
        let row = rows
            .entry(chat_id)
            .or_insert_with(|| FloodSetting::new(chat_id));
        row.mode = policy.mode;
        row.mode_param = policy.mode_param.clone();
        debug!("Set flood policy '{}' for chat {}", policy, chat_id);
        Ok(())
    }

    async fn migrate(&self, old_chat_id: i64, new_chat_id: i64) -> Result<()> {
        let mut rows = self.rows.write();
        if let Some(mut row) = rows.remove(&old_chat_id) {
            row.chat_id = new_chat_id;
            rows.insert(new_chat_id, row);
            debug!("Migrated flood settings {} -> {}", old_chat_id, new_chat_id);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_defaults_for_unknown_chat() {
        let store = MemoryFloodSettings::new();
        assert_eq!(store.get_threshold(-100).await.unwrap(), 0);
        assert_eq!(store.get_policy(-100).await.unwrap(), FloodPolicy::default());
    }

    #[tokio::test]
    async fn test_threshold_and_policy_are_independent() {
        let store = MemoryFloodSettings::new();
        store.set_policy(-1, FloodMode::TimedMute, Some("10m")).await.unwrap();
        store.set_threshold(-1, 5).await.unwrap();
        store.set_threshold(-1, 0).await.unwrap();

        // Disabling keeps the policy so re-enabling resumes it
        let policy = store.get_policy(-1).await.unwrap();
        assert_eq!(policy, FloodPolicy::new(FloodMode::TimedMute, "10m"));

        store.set_threshold(-1, 4).await.unwrap();
        assert_eq!(store.get_threshold(-1).await.unwrap(), 4);
        assert_eq!(store.get_policy(-1).await.unwrap().mode, FloodMode::TimedMute);
    }

    #[tokio::test]
    async fn test_timed_policy_requires_valid_duration() {
        let store = MemoryFloodSettings::new();
        store.set_policy(-1, FloodMode::Kick, None).await.unwrap();

        let missing = store.set_policy(-1, FloodMode::TimedBan, None).await;
        assert!(matches!(missing, Err(FloodError::InvalidArgument(_))));

        let bad = store.set_policy(-1, FloodMode::TimedBan, Some("soon")).await;
        assert!(matches!(bad, Err(FloodError::InvalidDuration(_))));

        assert_eq!(store.get_policy(-1).await.unwrap().mode, FloodMode::Kick);
    }

    #[tokio::test]
    async fn test_untimed_policy_clears_param() {
        let store = MemoryFloodSettings::new();
        store.set_policy(-1, FloodMode::TimedBan, Some("1d")).await.unwrap();
        let policy = store.set_policy(-1, FloodMode::Mute, Some("1d")).await.unwrap();
        assert_eq!(policy.mode_param, "");
        assert_eq!(store.get_policy(-1).await.unwrap().mode_param, "");
    }

    #[tokio::test]
    async fn test_migrate_is_idempotent() {
        let store = MemoryFloodSettings::new();
        store.set_threshold(-1, 7).await.unwrap();
        store.set_policy(-1, FloodMode::Mute, None).await.unwrap();

        store.migrate(-1, -1001).await.unwrap();
        let once = store.get_setting(-1001).await.unwrap();
        store.migrate(-1, -1001).await.unwrap();
        let twice = store.get_setting(-1001).await.unwrap();

        assert_eq!(once, twice);
        assert_eq!(twice.chat_id, -1001);
        assert_eq!(twice.threshold, 7);
        assert_eq!(store.get_threshold(-1).await.unwrap(), 0);
    }
}
