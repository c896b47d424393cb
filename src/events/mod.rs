//! Event handler system.
//!
//! Non-command side of message handling: flood counting on every group
//! message (commands included) and chat id migrations.

pub mod antiflood;
pub mod migrate;

use teloxide::prelude::*;
use tracing::error;

use crate::bot::dispatcher::AppState;

pub use migrate::migration_handler;

/// Count a message toward flood runs.
///
/// Runs as an inspection in front of the command handler, so commands are
/// counted too and still reach their handlers afterwards.
pub async fn count_message(msg: Message, state: AppState) {
    if let Err(e) = antiflood::check_antiflood(&msg, &state).await {
        error!("Antiflood error in chat {}: {}", msg.chat.id, e);
    }
}
