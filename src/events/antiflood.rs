//! Antiflood event handler.
//!
//! Turns group messages into flood events and records whatever the
//! evaluator enforced.

use teloxide::prelude::*;
use teloxide::types::{Chat, MessageKind};
use tracing::debug;

use crate::antiflood::{ChatKind, FloodEvent, FloodResult, SenderId};
use crate::bot::dispatcher::AppState;

/// How a message's sender takes part in flood counting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Sender {
    /// Counted under this identity.
    Counted(SenderId),
    /// Admin posting anonymously as the group, or the group's linked
    /// channel forwarding its posts. Exempt.
    ChatItself,
    /// Bot accounts, ignored entirely.
    Ignored,
}

fn classify_sender(msg: &Message) -> Option<Sender> {
    let from = msg.from.as_ref()?;

    let sender = match msg.sender_chat.as_ref().map(|c| c.id) {
        Some(id) if id == msg.chat.id => Sender::ChatItself,
        Some(_) if msg.is_automatic_forward() => Sender::ChatItself,
        // Member posting as one of their channels
        Some(id) => Sender::Counted(SenderId::Chat(id.0)),
        None if from.is_bot => Sender::Ignored,
        None => Sender::Counted(SenderId::User(from.id.0)),
    };
    Some(sender)
}

fn chat_kind(chat: &Chat) -> ChatKind {
    if chat.is_group() || chat.is_supergroup() {
        ChatKind::Group
    } else {
        ChatKind::Private
    }
}

/// Build the flood event for `msg`, `None` if it never counts.
///
/// Only regular messages count; joins, leaves, pins and other service
/// messages do not.
fn flood_event(msg: &Message) -> Option<FloodEvent> {
    if !matches!(msg.kind, MessageKind::Common(_)) {
        return None;
    }

    let (sender_id, sender_name, sender_is_admin) = match classify_sender(msg)? {
        Sender::Ignored => return None,
        Sender::Counted(id @ SenderId::Chat(_)) => {
            let name = msg
                .sender_chat
                .as_ref()
                .and_then(|c| c.title())
                .unwrap_or_default()
                .to_string();
            (id, name, false)
        }
        Sender::Counted(id) => (id, display_name(msg), false),
        Sender::ChatItself => (SenderId::Chat(msg.chat.id.0), display_name(msg), true),
    };

    Some(FloodEvent {
        chat_id: msg.chat.id.0,
        chat_kind: chat_kind(&msg.chat),
        chat_title: msg.chat.title().unwrap_or_default().to_string(),
        sender_id,
        sender_name,
        sender_is_admin,
        message_id: msg.id.0,
        sent_at: msg.date,
    })
}

fn display_name(msg: &Message) -> String {
    msg.from.as_ref().map(|u| u.full_name()).unwrap_or_default()
}

/// Count a group message and record any enforcement.
pub async fn check_antiflood(msg: &Message, state: &AppState) -> FloodResult<()> {
    let Some(event) = flood_event(msg) else {
        debug!("Skipping flood check for message {} in chat {}", msg.id.0, msg.chat.id);
        return Ok(());
    };

    if let Some(record) = state.evaluator.evaluate(&event).await? {
        state.audit.record(&record).await;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const GROUP: &str = r#"{"id":-1001,"title":"Rust Chat","type":"supergroup"}"#;
    const ANN: &str = r#"{"id":7,"is_bot":false,"first_name":"Ann"}"#;

    fn message(fields: &str) -> Message {
        let json = format!(r#"{{"message_id":1,"date":1700000000,"chat":{GROUP},{fields}}}"#);
        serde_json::from_str(&json).unwrap()
    }

    #[test]
    fn test_commands_are_counted() {
        let msg = message(&format!(r#""from":{ANN},"text":"/spam""#));

        let event = flood_event(&msg).unwrap();

        assert_eq!(event.sender_id, SenderId::User(7));
        assert_eq!(event.chat_kind, ChatKind::Group);
        assert!(!event.sender_is_admin);
    }

    #[test]
    fn test_channel_sender_is_counted_under_channel_id() {
        let msg = message(
            r#""from":{"id":136817688,"is_bot":true,"first_name":"Channel"},
               "sender_chat":{"id":-100200,"title":"Spam Channel","type":"channel"},
               "text":"buy now""#,
        );

        let event = flood_event(&msg).unwrap();

        assert_eq!(event.sender_id, SenderId::Chat(-100200));
        assert_eq!(event.sender_name, "Spam Channel");
        assert!(!event.sender_is_admin);
    }

    #[test]
    fn test_anonymous_admin_is_exempt() {
        let msg = message(&format!(
            r#""from":{{"id":1087968824,"is_bot":true,"first_name":"Group"}},
               "sender_chat":{GROUP},"text":"hello""#
        ));

        assert!(flood_event(&msg).unwrap().sender_is_admin);
    }

    #[test]
    fn test_linked_channel_forward_is_exempt() {
        let msg = message(
            r#""from":{"id":777000,"is_bot":false,"first_name":"Telegram"},
               "sender_chat":{"id":-100300,"title":"Our Channel","type":"channel"},
               "is_automatic_forward":true,"text":"news""#,
        );

        assert!(flood_event(&msg).unwrap().sender_is_admin);
    }

    #[test]
    fn test_bots_are_ignored() {
        let msg = message(r#""from":{"id":9,"is_bot":true,"first_name":"Helper"},"text":"beep""#);
        assert!(flood_event(&msg).is_none());
    }

    #[test]
    fn test_join_service_message_is_not_counted() {
        let msg = message(&format!(r#""from":{ANN},"new_chat_members":[{ANN}]"#));
        assert!(flood_event(&msg).is_none());
    }

    #[test]
    fn test_leave_service_message_is_not_counted() {
        let msg = message(&format!(r#""from":{ANN},"left_chat_member":{ANN}"#));
        assert!(flood_event(&msg).is_none());
    }
}
