//! Event types for the Banter wire protocol.
//!
//! Each WebSocket text message carries one JSON envelope of the form
//! `{"event": <name>, "data": <payload>}`. The event names are the wire
//! contract and must not be renamed.

use serde::{Deserialize, Serialize};

/// A chat room participant as it appears on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    /// User-chosen display name; unique key among live connections.
    pub nickname: String,
    /// Display color hint, opaque to the server.
    pub color: String,
}

impl Participant {
    /// Create a new participant.
    #[must_use]
    pub fn new(nickname: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            nickname: nickname.into(),
            color: color.into(),
        }
    }
}

/// A chat message payload.
///
/// `from` identifies the sender; `to`, when present, names a private
/// recipient. Clients may attach arbitrary extra fields, which are carried
/// through routing untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Sender nickname.
    pub from: String,

    /// Recipient nickname for private messages; absent for room messages.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,

    /// Message text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    /// Synthetic marker set by the server on the echo path.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flag: Option<String>,

    /// Any additional client-supplied fields, preserved verbatim.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl ChatMessage {
    /// Create a message addressed to the whole room.
    #[must_use]
    pub fn new(from: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: None,
            text: None,
            flag: None,
            extra: serde_json::Map::new(),
        }
    }

    /// Create a private message to a named recipient.
    #[must_use]
    pub fn private(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: Some(to.into()),
            text: None,
            flag: None,
            extra: serde_json::Map::new(),
        }
    }

    /// Set the message text.
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }
}

/// An event sent by a client to the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ClientEvent {
    /// Request to join the room with a nickname and color.
    #[serde(rename = "addUser")]
    AddUser(Participant),

    /// Send a chat message, private or room-wide.
    #[serde(rename = "addMessage")]
    AddMessage(ChatMessage),
}

/// An event sent by the server to a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ServerEvent {
    /// Outcome of an `addUser` request, unicast to the joiner.
    #[serde(rename = "userAddingResult")]
    UserAddingResult {
        /// `true` when the nickname was accepted.
        result: bool,
    },

    /// A new participant joined, broadcast to everyone else.
    #[serde(rename = "userAdded")]
    UserAdded(Participant),

    /// Full presence roster, unicast to a successful joiner.
    #[serde(rename = "allUser")]
    AllUser(Vec<Participant>),

    /// A routed chat message.
    #[serde(rename = "messageAdded")]
    MessageAdded(ChatMessage),

    /// A participant disconnected, broadcast to the remaining connections.
    #[serde(rename = "userRemoved")]
    UserRemoved {
        /// Nickname of the departed participant.
        nickname: String,
    },
}

impl ServerEvent {
    /// Create a `userAddingResult` event.
    #[must_use]
    pub fn adding_result(result: bool) -> Self {
        ServerEvent::UserAddingResult { result }
    }

    /// Create a `userAdded` event.
    #[must_use]
    pub fn user_added(participant: Participant) -> Self {
        ServerEvent::UserAdded(participant)
    }

    /// Create an `allUser` event.
    #[must_use]
    pub fn all_user(roster: Vec<Participant>) -> Self {
        ServerEvent::AllUser(roster)
    }

    /// Create a `messageAdded` event.
    #[must_use]
    pub fn message_added(message: ChatMessage) -> Self {
        ServerEvent::MessageAdded(message)
    }

    /// Create a `userRemoved` event.
    #[must_use]
    pub fn user_removed(nickname: impl Into<String>) -> Self {
        ServerEvent::UserRemoved {
            nickname: nickname.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_client_event_names() {
        let add_user: ClientEvent = serde_json::from_value(json!({
            "event": "addUser",
            "data": {"nickname": "alice", "color": "#111"}
        }))
        .unwrap();
        assert_eq!(
            add_user,
            ClientEvent::AddUser(Participant::new("alice", "#111"))
        );

        let add_message: ClientEvent = serde_json::from_value(json!({
            "event": "addMessage",
            "data": {"from": "alice", "to": "bob", "text": "hi"}
        }))
        .unwrap();
        assert_eq!(
            add_message,
            ClientEvent::AddMessage(ChatMessage::private("alice", "bob").with_text("hi"))
        );
    }

    #[test]
    fn test_server_event_names() {
        let cases = vec![
            (ServerEvent::adding_result(false), "userAddingResult"),
            (
                ServerEvent::user_added(Participant::new("bob", "#222")),
                "userAdded",
            ),
            (ServerEvent::all_user(vec![]), "allUser"),
            (
                ServerEvent::message_added(ChatMessage::new("alice")),
                "messageAdded",
            ),
            (ServerEvent::user_removed("alice"), "userRemoved"),
        ];

        for (event, name) in cases {
            let value = serde_json::to_value(&event).unwrap();
            assert_eq!(value["event"], name);
        }
    }

    #[test]
    fn test_message_optional_fields_omitted() {
        let message = ChatMessage::new("alice");
        let value = serde_json::to_value(&message).unwrap();
        let object = value.as_object().unwrap();

        assert!(!object.contains_key("to"));
        assert!(!object.contains_key("text"));
        assert!(!object.contains_key("flag"));
    }

    #[test]
    fn test_message_extra_fields_roundtrip() {
        let raw = json!({
            "from": "alice",
            "text": "hi",
            "timestamp": 1234,
            "avatar": "cat.png"
        });

        let message: ChatMessage = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(message.extra["timestamp"], 1234);
        assert_eq!(message.extra["avatar"], "cat.png");

        let back = serde_json::to_value(&message).unwrap();
        assert_eq!(back, raw);
    }
}
