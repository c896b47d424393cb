//! Cache module - named typed caches backed by Moka.
//!
//! - `CacheRegistry` - central registry holding all named caches
//! - `CacheConfig` - capacity and expiry settings for one cache
//! - `TypedCache` - thin typed wrapper over a Moka cache
//!
//! ```rust
//! let settings = registry.get_or_create::<i64, FloodSetting>(
//!     "flood_settings",
//!     CacheConfig::chat_settings(),
//! );
//! settings.insert(chat_id, row);
//! ```

mod config;
mod registry;
mod typed;

pub use config::CacheConfig;
pub use registry::CacheRegistry;
pub use typed::TypedCache;
