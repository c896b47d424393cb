//! Floodwarden - consecutive-message flood control for Telegram groups.
//!
//! ## Architecture
//!
//! - `antiflood` - Flood counting, enforcement and settings (platform-independent)
//! - `config` - Environment configuration
//! - `database` - MongoDB-backed flood settings
//! - `cache` - LRU-based caching with Moka
//! - `permissions` - Admin checking with caching
//! - `bot` - Telegram wiring (with Throttle for API rate limiting)
//! - `plugins` - Command handlers
//! - `events` - Message and migration handlers
//! - `utils` - Utility functions

mod antiflood;
mod bot;
mod cache;
mod config;
mod database;
mod events;
mod permissions;
mod plugins;
mod utils;

use std::sync::Arc;

use teloxide::adaptors::throttle::Limits;
use teloxide::prelude::*;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use antiflood::{FloodSettingsStore, MemoryFloodSettings};
use cache::CacheRegistry;
use config::Config;
use database::{Database, FloodSettingsRepository};

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file first (before anything else)
    dotenvy::dotenv().ok();

    // If RUST_LOG is not set, default to "info" level for our crate
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("floodwarden=info,teloxide=warn"));

    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Starting Floodwarden...");

    let config = Config::from_env()?;
    info!("Configuration loaded successfully");
    info!("Bot mode: {:?}", config.bot_mode);

    let cache = Arc::new(CacheRegistry::new());

    let settings: Arc<dyn FloodSettingsStore> = match &config.mongodb_uri {
        Some(uri) => {
            info!("Connecting to MongoDB...");
            let db = Database::connect(uri, &config.mongodb_database).await?;
            Arc::new(FloodSettingsRepository::new(&db, &cache))
        }
        None => {
            warn!("MONGODB_URI is not set, flood settings will not survive a restart");
            Arc::new(MemoryFloodSettings::new())
        }
    };

    // Throttle respects Telegram's rate limits:
    // - 30 messages per second globally
    // - 1 message per second to the same chat
    // - 20 messages per minute to the same group
    let bot = Bot::new(&config.bot_token).throttle(Limits::default());

    let me = bot.get_me().await?;
    info!("Bot username: @{}", me.username());

    if config.owner_ids.is_empty() {
        info!("No owner IDs configured (OWNER_IDS is empty)");
    } else {
        info!("Bot owners: {:?}", config.owner_ids);
    }

    let state = bot::AppState::new(bot.clone(), settings, cache.clone(), &config);
    info!("{} caches registered", cache.len());

    let dispatcher = bot::build_dispatcher(bot.clone(), state);
    bot::run(&config, bot, dispatcher).await
}
