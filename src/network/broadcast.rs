//! Outbound Message Projection
//!
//! The round engine never touches a socket. Every state mutation pushes
//! its notifications into an [`Outbox`] as `(recipient, message)` pairs,
//! and the server loop drains the outbox to the per-session senders in
//! push order. No batching, no coalescing: the wire sees mutations in the
//! order they happened.

use crate::network::protocol::ServerMessage;
use crate::network::session::SessionId;

/// Who should receive a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recipient {
    /// Every live connection.
    All,
    /// One specific session.
    One(SessionId),
}

/// One outbound emission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outbound {
    /// Delivery target.
    pub recipient: Recipient,
    /// The message itself.
    pub message: ServerMessage,
}

/// Ordered queue of emissions produced while handling one input event.
#[derive(Debug, Default)]
pub struct Outbox {
    queue: Vec<Outbound>,
}

impl Outbox {
    /// Create an empty outbox.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a message for every live connection.
    pub fn broadcast(&mut self, message: ServerMessage) {
        self.queue.push(Outbound {
            recipient: Recipient::All,
            message,
        });
    }

    /// Queue a private message.
    pub fn send_to(&mut self, id: SessionId, message: ServerMessage) {
        self.queue.push(Outbound {
            recipient: Recipient::One(id),
            message,
        });
    }

    /// Drain queued emissions in push order.
    pub fn drain(&mut self) -> impl Iterator<Item = Outbound> + '_ {
        self.queue.drain(..)
    }

    /// Number of queued emissions.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Whether nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::state::GamePhase;

    #[test]
    fn test_drain_preserves_push_order() {
        let id = SessionId::test_id(3);
        let mut outbox = Outbox::new();

        outbox.broadcast(ServerMessage::Phase(GamePhase::Betting));
        outbox.send_to(
            id,
            ServerMessage::MyDice {
                dice: vec![1, 2, 3],
            },
        );
        outbox.broadcast(ServerMessage::CurrentBet { bet: None });

        let drained: Vec<Outbound> = outbox.drain().collect();
        assert_eq!(drained.len(), 3);
        assert_eq!(drained[0].recipient, Recipient::All);
        assert_eq!(drained[1].recipient, Recipient::One(id));
        assert_eq!(drained[2].message, ServerMessage::CurrentBet { bet: None });
        assert!(outbox.is_empty());
    }
}
