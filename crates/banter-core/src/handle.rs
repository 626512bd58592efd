//! Per-connection send capability.
//!
//! A [`ClientHandle`] is the only way the rest of the system reaches a
//! connected client. The WebSocket writer task owns the paired receiver and
//! drains it onto the socket.

use banter_protocol::ServerEvent;
use tokio::sync::mpsc;
use tracing::trace;

/// An opaque, cloneable capability for sending events to one connection.
///
/// Sends are non-blocking and best-effort: delivery to a connection whose
/// writer has gone away reports `false` and is otherwise ignored, so one
/// dead recipient never stalls fan-out to the others.
#[derive(Debug, Clone)]
pub struct ClientHandle {
    sender: mpsc::UnboundedSender<ServerEvent>,
}

impl ClientHandle {
    /// Create a handle together with the receiver its connection drains.
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ServerEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }

    /// Queue an event for delivery to this connection.
    ///
    /// Returns `true` if the event was queued, `false` if the connection's
    /// writer has already shut down.
    pub fn send(&self, event: ServerEvent) -> bool {
        let queued = self.sender.send(event).is_ok();
        if !queued {
            trace!("Dropped event for closed connection");
        }
        queued
    }

    /// Check whether the connection's writer is still draining events.
    #[must_use]
    pub fn is_open(&self) -> bool {
        !self.sender.is_closed()
    }

    /// Check whether two handles address the same connection.
    #[must_use]
    pub fn same_connection(&self, other: &ClientHandle) -> bool {
        self.sender.same_channel(&other.sender)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_send_and_receive() {
        let (handle, mut rx) = ClientHandle::new();

        assert!(handle.send(ServerEvent::adding_result(true)));
        assert_eq!(rx.try_recv().unwrap(), ServerEvent::adding_result(true));
    }

    #[test]
    fn test_send_after_receiver_dropped() {
        let (handle, rx) = ClientHandle::new();
        drop(rx);

        assert!(!handle.is_open());
        assert!(!handle.send(ServerEvent::adding_result(true)));
    }

    #[test]
    fn test_same_connection() {
        let (handle, _rx) = ClientHandle::new();
        let (other, _rx2) = ClientHandle::new();

        assert!(handle.same_connection(&handle.clone()));
        assert!(!handle.same_connection(&other));
    }
}
