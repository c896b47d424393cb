//! Flood settings repository with hot caching.
//!
//! Read on every group message, written only by admin commands and
//! auto-disable. Writes go to MongoDB first and then replace the cached
//! row, so a read after a write in this process sees the new value.

use anyhow::Result;
use async_trait::async_trait;
use mongodb::bson::{self, doc};
use mongodb::options::{FindOneAndUpdateOptions, ReplaceOptions, ReturnDocument};
use mongodb::Collection;
use tracing::debug;

use crate::antiflood::FloodSettingsStore;
use crate::cache::{CacheConfig, CacheRegistry, TypedCache};
use crate::database::models::{FloodPolicy, FloodSetting};
use crate::database::Database;

/// Repository for per-chat flood settings.
pub struct FloodSettingsRepository {
    collection: Collection<FloodSetting>,
    cache: TypedCache<i64, FloodSetting>,
}

impl FloodSettingsRepository {
    pub fn new(db: &Database, cache: &CacheRegistry) -> Self {
        let settings_cache = cache.get_or_create("flood_settings", CacheConfig::chat_settings());

        Self {
            collection: db.collection("flood_settings"),
            cache: settings_cache,
        }
    }

    /// Apply `update` to the chat's row (creating it) and cache the result.
    async fn upsert(&self, chat_id: i64, update: bson::Document) -> Result<FloodSetting> {
        let filter = doc! { "chat_id": chat_id };
        let options = FindOneAndUpdateOptions::builder()
            .upsert(true)
            .return_document(ReturnDocument::After)
            .build();

        let row = self
            .collection
            .find_one_and_update(filter, update)
            .with_options(options)
            .await?
            .unwrap_or_else(|| FloodSetting::new(chat_id));

        self.cache.insert(chat_id, row.clone());
        Ok(row)
    }
}

#[async_trait]
impl FloodSettingsStore for FloodSettingsRepository {
    async fn get_setting(&self, chat_id: i64) -> Result<FloodSetting> {
        if let Some(row) = self.cache.get(&chat_id) {
            return Ok(row);
        }

        let filter = doc! { "chat_id": chat_id };
        let row = self
            .collection
            .find_one(filter)
            .await?
            .unwrap_or_else(|| FloodSetting::new(chat_id));

        // A write may have landed while we were reading; never overwrite it
        Ok(self.cache.insert_if_absent(chat_id, row))
    }

    async fn set_threshold(&self, chat_id: i64, threshold: u32) -> Result<()> {
        self.upsert(chat_id, doc! { "$set": { "threshold": i64::from(threshold) } })
            .await?;
        debug!("Saved flood threshold {} for chat {}", threshold, chat_id);
        Ok(())
    }

    async fn save_policy(&self, chat_id: i64, policy: &FloodPolicy) -> Result<()> {
        let update = doc! {
            "$set": {
                "mode": bson::to_bson(&policy.mode)?,
                "mode_param": policy.mode_param.as_str(),
            }
        };
        self.upsert(chat_id, update).await?;
        debug!("Saved flood policy '{}' for chat {}", policy, chat_id);
        Ok(())
    }

    async fn migrate(&self, old_chat_id: i64, new_chat_id: i64) -> Result<()> {
        let Some(mut row) = self
            .collection
            .find_one(doc! { "chat_id": old_chat_id })
            .await?
        else {
            debug!("No flood settings to migrate for chat {}", old_chat_id);
            return Ok(());
        };

        row.chat_id = new_chat_id;
        let options = ReplaceOptions::builder().upsert(true).build();
        self.collection
            .replace_one(doc! { "chat_id": new_chat_id }, &row)
            .with_options(options)
            .await?;
        self.collection
            .delete_one(doc! { "chat_id": old_chat_id })
            .await?;

        self.cache.invalidate(&old_chat_id);
        self.cache.insert(new_chat_id, row);
        debug!("Migrated flood settings {} -> {}", old_chat_id, new_chat_id);

        Ok(())
    }
}
