//! # banter-protocol
//!
//! Wire event definitions for the Banter chat room service.
//!
//! This crate defines the JSON events exchanged between clients and the
//! server, along with the text codec used over the WebSocket transport.
//!
//! ## Events
//!
//! - `addUser` / `userAddingResult` - Join handshake
//! - `userAdded` / `userRemoved` / `allUser` - Presence updates
//! - `addMessage` / `messageAdded` - Chat message routing
//!
//! ## Example
//!
//! ```rust
//! use banter_protocol::{codec, ClientEvent, Participant};
//!
//! let text = r##"{"event":"addUser","data":{"nickname":"alice","color":"#111"}}"##;
//! let event = codec::decode(text).unwrap();
//! assert_eq!(event, ClientEvent::AddUser(Participant::new("alice", "#111")));
//! ```

pub mod codec;
pub mod events;

pub use codec::{decode, encode, ProtocolError};
pub use events::{ChatMessage, ClientEvent, Participant, ServerEvent};
