//! Message dispatcher setup.
//!
//! Builds the flood control services and the update handler tree.

use std::sync::Arc;

use teloxide::adaptors::Throttle;
use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;
use tracing::trace;

use super::telegram::{LogChannel, TelegramGateway};
use crate::antiflood::{ActionDispatcher, FloodCounter, FloodEvaluator, FloodSettingsStore};
use crate::cache::CacheRegistry;
use crate::config::Config;
use crate::events;
use crate::permissions::Permissions;
use crate::plugins;

/// Bot type with Throttle adaptor for automatic rate limiting.
pub type ThrottledBot = Throttle<Bot>;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Per-chat threshold and policy.
    pub settings: Arc<dyn FloodSettingsStore>,

    /// Permission checker with admin caching.
    pub permissions: Permissions,

    /// Per-message flood check.
    pub evaluator: Arc<FloodEvaluator>,

    /// Audit record sink.
    pub audit: LogChannel,
}

impl AppState {
    /// Wire the flood control services together.
    pub fn new(
        bot: ThrottledBot,
        settings: Arc<dyn FloodSettingsStore>,
        cache: Arc<CacheRegistry>,
        config: &Config,
    ) -> Self {
        // Permissions needs the inner Bot for getChatMember
        let permissions =
            Permissions::with_owners(bot.inner().clone(), cache, config.owner_ids.clone());

        let gateway = Arc::new(TelegramGateway::new(bot.clone()));
        let counter = Arc::new(FloodCounter::new(settings.clone()));
        let actions = ActionDispatcher::new(
            settings.clone(),
            counter.clone(),
            gateway.clone(),
            gateway,
            config.enforcement_timeout,
        );
        let evaluator = Arc::new(FloodEvaluator::new(
            settings.clone(),
            counter,
            Arc::new(permissions.clone()),
            actions,
        ));

        Self {
            settings,
            permissions,
            evaluator,
            audit: LogChannel::new(bot, config.log_channel_id),
        }
    }
}

/// Build the dispatcher with all handlers.
pub fn build_dispatcher(
    bot: ThrottledBot,
    state: AppState,
) -> Dispatcher<ThrottledBot, anyhow::Error, teloxide::dispatching::DefaultKey> {
    Dispatcher::builder(bot, schema())
        .dependencies(dptree::deps![state])
        // Plain chat messages end here after being counted
        .default_handler(|upd| async move {
            trace!("Unhandled update {:?}", upd.id);
        })
        .enable_ctrlc_handler()
        .build()
}

/// Build the handler schema.
fn schema() -> UpdateHandler<anyhow::Error> {
    // Migration notices first, then flood counting for everything else
    // (commands included), then commands
    let message_handler = Update::filter_message()
        .branch(events::migration_handler())
        .inspect_async(events::count_message)
        .branch(plugins::command_handler());

    dptree::entry().branch(message_handler)
}
