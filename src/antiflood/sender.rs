//! Who a counted message came from.

use std::fmt;

use crate::utils::{html_escape, mention_html};

/// Identity a flood run is attributed to.
///
/// Members posting "as" one of their channels are tracked under the
/// channel's chat id, apart from any user account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SenderId {
    User(u64),
    Chat(i64),
}

impl SenderId {
    /// HTML reference to the sender: a mention link for users, the
    /// escaped name for channels.
    pub fn mention_html(self, name: &str) -> String {
        match self {
            Self::User(id) => mention_html(id, name),
            Self::Chat(_) => format!("<b>{}</b>", html_escape(name)),
        }
    }
}

impl fmt::Display for SenderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User(id) => write!(f, "user {id}"),
            Self::Chat(id) => write!(f, "channel {id}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_users_and_channels_never_collide() {
        assert_ne!(SenderId::User(100), SenderId::Chat(100));
    }

    #[test]
    fn test_channel_mention_is_plain_name() {
        assert_eq!(SenderId::Chat(-100).mention_html("News & <co>"), "<b>News &amp; &lt;co&gt;</b>");
        assert_eq!(SenderId::User(7).to_string(), "user 7");
    }
}
