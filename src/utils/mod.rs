//! Utility functions.
//!
//! Small HTML helpers for Telegram messages.

/// Escape text for Telegram HTML parse mode.
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Clickable mention of a user by id.
pub fn mention_html(user_id: u64, name: &str) -> String {
    format!("<a href=\"tg://user?id={}\">{}</a>", user_id, html_escape(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_html_escape() {
        assert_eq!(html_escape("a < b && c > d"), "a &lt; b &amp;&amp; c &gt; d");
    }

    #[test]
    fn test_mention_escapes_name() {
        assert_eq!(
            mention_html(7, "<b>x</b>"),
            "<a href=\"tg://user?id=7\">&lt;b&gt;x&lt;/b&gt;</a>"
        );
    }
}
