//! Audit records for the log channel.

use std::fmt;

use super::sender::SenderId;
use crate::utils::html_escape;

/// Category of an audit record, rendered as a hashtag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditTag {
    Banned,
    Kicked,
    Muted,
    TimedBan,
    TimedMute,
    /// Informational, e.g. flood control auto-disabled
    Info,
    SetFlood,
    SetFloodMode,
}

impl AuditTag {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Banned => "BANNED",
            Self::Kicked => "KICKED",
            Self::Muted => "MUTED",
            Self::TimedBan => "TBAN",
            Self::TimedMute => "TMUTE",
            Self::Info => "INFO",
            Self::SetFlood => "SETFLOOD",
            Self::SetFloodMode => "SETFLOODMODE",
        }
    }
}

impl fmt::Display for AuditTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user or channel referenced by an audit record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditUser {
    pub id: SenderId,
    pub name: String,
}

/// What happened, where, and to (or by) whom.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditRecord {
    pub tag: AuditTag,
    pub chat_id: i64,
    pub chat_title: String,
    /// Label for `user` in the rendered record ("User" or "Admin").
    pub role: &'static str,
    pub user: Option<AuditUser>,
    /// Plain-text description, escaped on render.
    pub note: String,
}

impl AuditRecord {
    /// Record of a flood enforcement against `user`.
    pub fn enforcement(
        tag: AuditTag,
        chat_id: i64,
        chat_title: &str,
        user: AuditUser,
    ) -> Self {
        Self {
            tag,
            chat_id,
            chat_title: chat_title.to_string(),
            role: "User",
            user: Some(user),
            note: "Flooded the group.".to_string(),
        }
    }

    /// Record of a settings change made by `admin`.
    pub fn settings_change(
        tag: AuditTag,
        chat_id: i64,
        chat_title: &str,
        admin: AuditUser,
        note: impl Into<String>,
    ) -> Self {
        Self {
            tag,
            chat_id,
            chat_title: chat_title.to_string(),
            role: "Admin",
            user: Some(admin),
            note: note.into(),
        }
    }

    /// Informational record with no user attached.
    pub fn info(chat_id: i64, chat_title: &str, note: impl Into<String>) -> Self {
        Self {
            tag: AuditTag::Info,
            chat_id,
            chat_title: chat_title.to_string(),
            role: "User",
            user: None,
            note: note.into(),
        }
    }

    /// HTML rendering for the log channel.
    pub fn to_html(&self) -> String {
        let mut out = format!(
            "<b>{}:</b>\n#{}",
            html_escape(&self.chat_title),
            self.tag
        );
        if let Some(user) = &self.user {
            out.push_str(&format!(
                "\n<b>{}:</b> {}",
                self.role,
                user.id.mention_html(&user.name)
            ));
        }
        out.push('\n');
        out.push_str(&html_escape(&self.note));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enforcement_html() {
        let record = AuditRecord::enforcement(
            AuditTag::TimedMute,
            -1,
            "Rust <Fans>",
            AuditUser { id: SenderId::User(42), name: "Ann".to_string() },
        );
        assert_eq!(
            record.to_html(),
            "<b>Rust &lt;Fans&gt;:</b>\n#TMUTE\n<b>User:</b> <a href=\"tg://user?id=42\">Ann</a>\nFlooded the group."
        );
    }

    #[test]
    fn test_info_has_no_user_line() {
        let record = AuditRecord::info(-1, "Chat", "Flood control disabled.");
        assert_eq!(record.to_html(), "<b>Chat:</b>\n#INFO\nFlood control disabled.");
    }
}
