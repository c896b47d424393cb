//! Consecutive-message counter.
//!
//! Tracks, per chat, who sent the last counted message and how many
//! messages they have sent back-to-back. Each chat's state sits behind
//! its own mutex, so updates for one chat are serialized while different
//! chats never wait on each other. The lock is never held across an
//! await point.

use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;
use tracing::debug;

use super::error::FloodResult;
use super::sender::SenderId;
use super::settings::FloodSettingsStore;

/// Counter state for one chat.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChatFloodState {
    /// Sender of the last counted message, `None` after a reset.
    pub last_sender_id: Option<SenderId>,
    pub consecutive_count: u32,
}

impl ChatFloodState {
    /// Count one message from `sender_id` and return the new run length.
    fn record(&mut self, sender_id: SenderId) -> u32 {
        if self.last_sender_id == Some(sender_id) {
            self.consecutive_count = self.consecutive_count.saturating_add(1);
        } else {
            self.last_sender_id = Some(sender_id);
            self.consecutive_count = 1;
        }
        self.consecutive_count
    }

    fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Per-chat consecutive-message counter.
pub struct FloodCounter {
    settings: Arc<dyn FloodSettingsStore>,
    chats: DashMap<i64, Arc<Mutex<ChatFloodState>>>,
}

impl FloodCounter {
    pub fn new(settings: Arc<dyn FloodSettingsStore>) -> Self {
        Self {
            settings,
            chats: DashMap::new(),
        }
    }

    /// Per-chat slot, created on first use.
    ///
    /// Slots are never removed, so every caller for a chat locks the same mutex.
    fn slot(&self, chat_id: i64) -> Arc<Mutex<ChatFloodState>> {
        // The shard guard is dropped at the end of this statement
        Arc::clone(self.chats.entry(chat_id).or_default().value())
    }

    /// Count one message and report whether the chat's threshold is reached.
    ///
    /// `sender_id = None` marks an exempt sender: the chat's run is
    /// forgotten and the call never triggers.
    ///
    /// The threshold is read before the counter is touched, so a storage
    /// failure aborts the call without changing the count.
    pub async fn observe(&self, chat_id: i64, sender_id: Option<SenderId>) -> FloodResult<bool> {
        let Some(sender_id) = sender_id else {
            self.reset(chat_id);
            return Ok(false);
        };

        let threshold = self.settings.get_threshold(chat_id).await?;

        let count = self.slot(chat_id).lock().record(sender_id);

        let triggered = threshold > 0 && count >= threshold;
        debug!(
            "Flood count {}/{} for {} in chat {}",
            count, threshold, sender_id, chat_id
        );

        Ok(triggered)
    }

    /// Forget the chat's current run.
    pub fn reset(&self, chat_id: i64) {
        if let Some(slot) = self.chats.get(&chat_id).map(|s| Arc::clone(s.value())) {
            slot.lock().reset();
        }
    }

    /// Forget the chat's run only if it still belongs to `sender_id`.
    ///
    /// Used after enforcement so a newer run by someone else survives.
    pub fn reset_sender(&self, chat_id: i64, sender_id: SenderId) -> bool {
        let Some(slot) = self.chats.get(&chat_id).map(|s| Arc::clone(s.value())) else {
            return false;
        };
        let mut state = slot.lock();
        if state.last_sender_id == Some(sender_id) {
            state.reset();
            true
        } else {
            false
        }
    }

    /// Snapshot of the chat's state (absent chats read as the reset state).
    #[cfg(test)]
    pub fn state(&self, chat_id: i64) -> ChatFloodState {
        self.chats
            .get(&chat_id)
            .map(|s| *s.value().lock())
            .unwrap_or_default()
    }

    /// Move a chat's in-progress run to its new id.
    ///
    /// A second call with the same pair finds nothing under `old_chat_id`
    /// and leaves the state alone.
    pub fn migrate(&self, old_chat_id: i64, new_chat_id: i64) {
        let Some(old) = self.chats.get(&old_chat_id).map(|s| Arc::clone(s.value())) else {
            return;
        };

        let moved = {
            let mut state = old.lock();
            std::mem::take(&mut *state)
        };

        if moved != ChatFloodState::default() {
            *self.slot(new_chat_id).lock() = moved;
            debug!("Migrated flood counter {} -> {}", old_chat_id, new_chat_id);
        }
    }
}
