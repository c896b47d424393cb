//! Chat migration handler.
//!
//! When a group is upgraded to a supergroup Telegram sends a service
//! message carrying the new chat id; flood settings and counters follow it.

use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;
use tracing::{error, info};

use crate::bot::dispatcher::AppState;

pub fn migration_handler() -> UpdateHandler<anyhow::Error> {
    dptree::filter_map(|msg: Message| msg.migrate_to_chat_id().copied())
        .endpoint(handle_migration)
}

async fn handle_migration(msg: Message, new_chat: ChatId, state: AppState) -> anyhow::Result<()> {
    info!("Chat {} migrated to {}", msg.chat.id, new_chat);

    if let Err(e) = state.evaluator.migrate_chat(msg.chat.id.0, new_chat.0).await {
        error!(
            "Failed to migrate flood settings {} -> {}: {}",
            msg.chat.id, new_chat, e
        );
    }

    Ok(())
}
