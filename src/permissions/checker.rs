//! Permission checker with caching.

use std::sync::Arc;

use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{ChatId, ChatMember, ChatMemberKind, UserId};
use tracing::debug;

use crate::antiflood::AdminOracle;
use crate::cache::{CacheConfig, CacheRegistry, TypedCache};

/// Admin rights relevant to flood control.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AdminInfo {
    pub is_owner: bool,
    pub can_change_info: bool,
}

impl AdminInfo {
    /// `None` for members that are not admins.
    fn from_chat_member(member: &ChatMember) -> Option<Self> {
        match &member.kind {
            ChatMemberKind::Owner(_) => Some(Self {
                is_owner: true,
                can_change_info: true,
            }),
            ChatMemberKind::Administrator(admin) => Some(Self {
                is_owner: false,
                can_change_info: admin.can_change_info,
            }),
            _ => None,
        }
    }

    fn bot_owner() -> Self {
        Self {
            is_owner: true,
            can_change_info: true,
        }
    }
}

/// Cache key for admin lookups.
type AdminCacheKey = (i64, u64); // (chat_id, user_id)

/// Permission checker with caching support.
#[derive(Clone)]
pub struct Permissions {
    bot: Bot,
    cache: TypedCache<AdminCacheKey, Option<AdminInfo>>,
    owner_ids: Arc<[u64]>,
}

impl Permissions {
    pub fn with_owners(bot: Bot, cache_registry: Arc<CacheRegistry>, owner_ids: Vec<u64>) -> Self {
        let cache = cache_registry.get_or_create("admin_permissions", CacheConfig::admin_status());

        Self {
            bot,
            cache,
            owner_ids: owner_ids.into(),
        }
    }

    #[inline]
    pub fn is_bot_owner(&self, user_id: UserId) -> bool {
        self.owner_ids.contains(&user_id.0)
    }

    /// Admin info for a user in a chat, `None` if not an admin.
    pub async fn get_admin_info(
        &self,
        chat_id: ChatId,
        user_id: UserId,
    ) -> anyhow::Result<Option<AdminInfo>> {
        if self.is_bot_owner(user_id) {
            return Ok(Some(AdminInfo::bot_owner()));
        }

        let cache_key = (chat_id.0, user_id.0);
        if let Some(cached) = self.cache.get(&cache_key) {
            debug!("Admin cache hit for user {} in chat {}", user_id, chat_id);
            return Ok(cached);
        }

        let member = self.bot.get_chat_member(chat_id, user_id).await?;
        let info = AdminInfo::from_chat_member(&member);

        // Non-admins are cached too, they are the common case
        self.cache.insert(cache_key, info.clone());

        Ok(info)
    }

    pub async fn is_admin(&self, chat_id: ChatId, user_id: UserId) -> anyhow::Result<bool> {
        Ok(self.get_admin_info(chat_id, user_id).await?.is_some())
    }

    /// Whether the user may change flood settings.
    pub async fn can_change_info(&self, chat_id: ChatId, user_id: UserId) -> anyhow::Result<bool> {
        Ok(self
            .get_admin_info(chat_id, user_id)
            .await?
            .is_some_and(|a| a.is_owner || a.can_change_info))
    }
}

#[async_trait]
impl AdminOracle for Permissions {
    async fn is_exempt(&self, chat_id: i64, user_id: u64) -> anyhow::Result<bool> {
        self.is_admin(ChatId(chat_id), UserId(user_id)).await
    }
}
