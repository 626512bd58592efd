//! Codec for encoding and decoding Banter events.
//!
//! Events travel as JSON text, one envelope per WebSocket message. There is
//! no length prefix; WebSocket framing delimits events.

use thiserror::Error;

use crate::events::{ClientEvent, ServerEvent};

/// Maximum accepted inbound event size (64 KiB).
pub const MAX_EVENT_SIZE: usize = 64 * 1024;

/// Protocol errors that can occur during encoding/decoding.
///
/// All variants are recoverable: the server drops the offending event and
/// keeps the connection alive.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Inbound event exceeds the size limit.
    #[error("Event size {0} exceeds maximum {1}")]
    EventTooLarge(usize, usize),

    /// Malformed JSON or unknown event name.
    #[error("Invalid event: {0}")]
    Invalid(#[from] serde_json::Error),
}

/// Encode a server event to its JSON wire form.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn encode(event: &ServerEvent) -> Result<String, ProtocolError> {
    Ok(serde_json::to_string(event)?)
}

/// Decode a client event from its JSON wire form.
///
/// # Errors
///
/// Returns an error if the text is oversized, malformed, or names an
/// unknown event.
pub fn decode(text: &str) -> Result<ClientEvent, ProtocolError> {
    decode_limited(text, MAX_EVENT_SIZE)
}

/// Decode a client event with an explicit size limit.
///
/// # Errors
///
/// Returns an error if the text is oversized, malformed, or names an
/// unknown event.
pub fn decode_limited(text: &str, max_size: usize) -> Result<ClientEvent, ProtocolError> {
    if text.len() > max_size {
        return Err(ProtocolError::EventTooLarge(text.len(), max_size));
    }
    Ok(serde_json::from_str(text)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{ChatMessage, Participant};

    #[test]
    fn test_encode_decode_roundtrip() {
        let events = vec![
            ClientEvent::AddUser(Participant::new("alice", "#111")),
            ClientEvent::AddMessage(ChatMessage::private("alice", "bob").with_text("hi")),
            ClientEvent::AddMessage(ChatMessage::new("alice")),
        ];

        for event in events {
            let encoded = serde_json::to_string(&event).unwrap();
            let decoded = decode(&encoded).unwrap();
            assert_eq!(event, decoded);
        }
    }

    #[test]
    fn test_encode_server_event() {
        let encoded = encode(&ServerEvent::adding_result(true)).unwrap();
        assert_eq!(
            encoded,
            r#"{"event":"userAddingResult","data":{"result":true}}"#
        );
    }

    #[test]
    fn test_decode_malformed() {
        assert!(matches!(
            decode("not json"),
            Err(ProtocolError::Invalid(_))
        ));
        assert!(matches!(
            decode(r#"{"event":"noSuchEvent","data":{}}"#),
            Err(ProtocolError::Invalid(_))
        ));
    }

    #[test]
    fn test_decode_too_large() {
        let padding = "x".repeat(MAX_EVENT_SIZE);
        let text = format!(
            r#"{{"event":"addMessage","data":{{"from":"alice","text":"{padding}"}}}}"#
        );

        match decode(&text) {
            Err(ProtocolError::EventTooLarge(_, _)) => {}
            other => panic!("Expected EventTooLarge error, got {:?}", other),
        }
    }
}
