//! Permission checks for chat members.
//!
//! - Cached admin lookups (one `getChatMember` per user per few minutes)
//! - Bot owners from `OWNER_IDS` count as admins everywhere
//! - Implements the flood control `AdminOracle`
//!
//! ```rust
//! let perms = Permissions::with_owners(bot.clone(), cache.clone(), owner_ids);
//!
//! if perms.can_change_info(chat_id, user_id).await? {
//!     // ...
//! }
//! ```

mod checker;

pub use checker::Permissions;
