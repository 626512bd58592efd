//! Message routing for the chat room.
//!
//! Each handler takes the registry plus one inbound event and returns the
//! list of deliveries it produced; [`dispatch`] performs the actual sends.
//! Handlers run to completion without awaiting, so holding the registry
//! lock across one of them never stalls another connection on I/O.

use banter_protocol::{ChatMessage, Participant, ServerEvent};
use thiserror::Error;
use tracing::{debug, warn};

use crate::handle::ClientHandle;
use crate::registry::Registry;

/// Marker written into the `flag` field on the echo path.
pub const ROBOT_FLAG: &str = "robot";

/// Canned text written on the echo path, replacing any user-supplied text.
pub const ROBOT_TEXT: &str = "gogogo";

/// Routing errors.
///
/// Both variants are recoverable delivery failures: the server logs them
/// and drops the event. The connection that sent the event stays up, as
/// does everyone else.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RouteError {
    /// A private message named a recipient with no live connection.
    #[error("Recipient not found: {0:?}")]
    RecipientNotFound(String),

    /// The echo path could not find the sender's own connection.
    #[error("Sender not found: {0:?}")]
    SenderNotFound(String),
}

/// Lifecycle state of a single connection.
///
/// A connection starts `Anonymous`, becomes `Named` on a successful
/// `addUser`, and ends `Closed`. A rejected join leaves it `Anonymous` so
/// the client may retry with a different nickname.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    /// Connected but not yet joined.
    Anonymous,
    /// Joined under the given nickname.
    Named(String),
    /// Disconnected; terminal.
    Closed,
}

impl ConnectionState {
    /// Get the nickname, if the connection has one.
    #[must_use]
    pub fn nickname(&self) -> Option<&str> {
        match self {
            ConnectionState::Named(nickname) => Some(nickname),
            _ => None,
        }
    }
}

/// One event addressed to one connection.
#[derive(Debug)]
pub struct Delivery {
    /// Destination connection.
    pub handle: ClientHandle,
    /// Event to send.
    pub event: ServerEvent,
}

impl Delivery {
    fn new(handle: &ClientHandle, event: ServerEvent) -> Self {
        Self {
            handle: handle.clone(),
            event,
        }
    }
}

/// Result of routing an `addUser` request.
#[derive(Debug)]
pub struct JoinOutcome {
    /// Whether the nickname was accepted.
    pub accepted: bool,
    /// Deliveries produced by the request, in send order.
    pub deliveries: Vec<Delivery>,
}

/// Route an `addUser` request.
///
/// On rejection only the failure acknowledgement goes back to the joiner.
/// On acceptance the joiner gets the success acknowledgement and the
/// post-join roster, and every other registered connection gets a
/// `userAdded` event. The unicast deliveries do not depend on the
/// broadcast: all sends are independent and best-effort.
pub fn handle_add_user(
    registry: &mut Registry,
    participant: Participant,
    handle: &ClientHandle,
) -> JoinOutcome {
    let nickname = participant.nickname.clone();

    match registry.try_join(participant.clone(), handle.clone()) {
        Err(error) => {
            debug!(nickname = %nickname, %error, "Join rejected");
            JoinOutcome {
                accepted: false,
                deliveries: vec![Delivery::new(handle, ServerEvent::adding_result(false))],
            }
        }
        Ok(roster) => {
            let mut deliveries = vec![Delivery::new(handle, ServerEvent::adding_result(true))];

            for (other, other_handle) in registry.entries() {
                if other != nickname {
                    deliveries.push(Delivery::new(
                        other_handle,
                        ServerEvent::user_added(participant.clone()),
                    ));
                }
            }

            deliveries.push(Delivery::new(handle, ServerEvent::all_user(roster)));

            JoinOutcome {
                accepted: true,
                deliveries,
            }
        }
    }
}

/// Route an `addMessage` event.
///
/// A message with a `to` field is delivered unmodified to that recipient
/// only. A message without one is stamped `flag = "robot"`, its text
/// replaced with `"gogogo"`, and echoed back to the sender alone -- it is
/// never broadcast to the rest of the room.
///
/// # Errors
///
/// Returns an error when the recipient (or, on the echo path, the sender)
/// has no live connection.
pub fn handle_add_message(
    registry: &Registry,
    mut message: ChatMessage,
) -> Result<Vec<Delivery>, RouteError> {
    match message.to.clone() {
        Some(to) => {
            let handle = registry
                .lookup(&to)
                .ok_or(RouteError::RecipientNotFound(to))?;
            Ok(vec![Delivery::new(
                handle,
                ServerEvent::message_added(message),
            )])
        }
        None => {
            let handle = registry
                .lookup(&message.from)
                .ok_or_else(|| RouteError::SenderNotFound(message.from.clone()))?;

            message.flag = Some(ROBOT_FLAG.to_string());
            message.text = Some(ROBOT_TEXT.to_string());

            Ok(vec![Delivery::new(
                handle,
                ServerEvent::message_added(message),
            )])
        }
    }
}

/// Route a disconnect for a named connection.
///
/// Builds `userRemoved` deliveries for every other registered connection,
/// then removes the participant, so the leaver is no longer discoverable by
/// the time the deliveries are dispatched.
pub fn handle_disconnect(registry: &mut Registry, nickname: &str) -> Vec<Delivery> {
    let deliveries: Vec<Delivery> = registry
        .entries()
        .filter(|(other, _)| *other != nickname)
        .map(|(_, handle)| Delivery::new(handle, ServerEvent::user_removed(nickname)))
        .collect();

    registry.leave(nickname);
    deliveries
}

/// Perform the sends for a batch of deliveries.
///
/// Fan-out is best-effort and independent per recipient; a closed
/// connection is logged and skipped. Returns the number of events actually
/// queued.
pub fn dispatch(deliveries: Vec<Delivery>) -> usize {
    let mut sent = 0;
    for delivery in deliveries {
        if delivery.handle.send(delivery.event) {
            sent += 1;
        } else {
            warn!("Skipped delivery to closed connection");
        }
    }
    sent
}
