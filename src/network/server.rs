//! WebSocket Game Server
//!
//! Accepts connections and runs the game event loop. Per-connection tasks
//! only shuttle text frames between the socket and channels; every touch
//! of game state happens on the one loop below, so the aggregate needs no
//! locking anywhere.
//!
//! There are no turn timeouts: an idle-but-connected player stalls the
//! game indefinitely. That is a known property of the rules, not
//! something this layer papers over.

use std::collections::BTreeMap;
use std::net::SocketAddr;

use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::{accept_async, tungstenite::Message};
use tracing::{debug, error, info, warn};

use crate::game::round;
use crate::game::state::Game;
use crate::network::broadcast::{Outbox, Recipient};
use crate::network::protocol::ClientMessage;
use crate::network::session::SessionId;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address.
    pub bind_addr: SocketAddr,
    /// Maximum concurrent connections.
    pub max_connections: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            // The port the original desktop clients dial.
            bind_addr: "0.0.0.0:54000".parse().unwrap(),
            max_connections: 32,
        }
    }
}

/// Server errors. Binding is the only fatal path; everything after a
/// successful bind is handled per-connection.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Failed to bind the listening port.
    #[error("Failed to bind: {0}")]
    Bind(#[source] std::io::Error),
}

/// Inputs to the game event loop. Disconnection is an ordinary event on
/// the same stream as messages, never an error path.
enum Event {
    /// A connection finished its handshake and wants a session.
    Connected {
        sender: mpsc::UnboundedSender<String>,
        reply: oneshot::Sender<SessionId>,
    },
    /// One decoded text frame from a session.
    Frame { id: SessionId, text: String },
    /// The connection is gone.
    Closed { id: SessionId },
}

/// The game server.
pub struct DudoServer {
    config: ServerConfig,
}

impl DudoServer {
    /// Create a new server.
    pub fn new(config: ServerConfig) -> Self {
        Self { config }
    }

    /// Run with a fresh entropy seed for the dice.
    ///
    /// # Errors
    ///
    /// [`ServerError::Bind`] if the listening port cannot be bound.
    pub async fn run(&self) -> Result<(), ServerError> {
        self.run_seeded(rand::random()).await
    }

    /// Run with a caller-chosen dice seed. Split out so a test harness
    /// can script round outcomes.
    pub async fn run_seeded(&self, seed: u64) -> Result<(), ServerError> {
        let listener = TcpListener::bind(&self.config.bind_addr)
            .await
            .map_err(ServerError::Bind)?;
        info!("Dudo server listening on {}", self.config.bind_addr);

        let (event_tx, mut event_rx) = mpsc::channel::<Event>(256);

        // The entire mutable game state lives on this loop. Connection
        // tasks reach it only through the event channel.
        let mut game = Game::new(seed);
        let mut senders: BTreeMap<SessionId, mpsc::UnboundedSender<String>> = BTreeMap::new();
        let mut outbox = Outbox::new();

        loop {
            tokio::select! {
                result = listener.accept() => {
                    match result {
                        Ok((stream, addr)) => {
                            debug!(%addr, "inbound connection");
                            tokio::spawn(handle_connection(stream, addr, event_tx.clone()));
                        }
                        Err(e) => error!("Accept error: {}", e),
                    }
                }
                event = event_rx.recv() => {
                    // The loop holds a sender clone, so the channel never
                    // closes from the other side.
                    let Some(event) = event else { break };
                    match event {
                        Event::Connected { sender, reply } => {
                            if senders.len() >= self.config.max_connections {
                                warn!("Connection limit reached, refusing client");
                                continue; // dropping `reply` tells the task to close
                            }
                            let id = game.connect();
                            senders.insert(id, sender);
                            if reply.send(id).is_err() {
                                // Task died mid-handshake; roll back.
                                round::handle_disconnect(&mut game, id);
                                senders.remove(&id);
                            }
                        }
                        Event::Frame { id, text } => {
                            match ClientMessage::parse(&text) {
                                Ok(msg) => {
                                    round::handle_message(&mut game, id, msg, &mut outbox);
                                    deliver(&senders, &mut outbox);
                                }
                                Err(e) => {
                                    // Unparsable input is dropped without
                                    // a reply, as the original server did.
                                    debug!(session = %id, error = %e, "dropping malformed message");
                                }
                            }
                        }
                        Event::Closed { id } => {
                            round::handle_disconnect(&mut game, id);
                            senders.remove(&id);
                        }
                    }
                }
            }
        }

        Ok(())
    }
}

/// Drain the outbox to the per-session senders, in push order.
fn deliver(senders: &BTreeMap<SessionId, mpsc::UnboundedSender<String>>, outbox: &mut Outbox) {
    for out in outbox.drain() {
        let line = out.message.encode();
        match out.recipient {
            Recipient::All => {
                for (id, sender) in senders {
                    if sender.send(line.clone()).is_err() {
                        // Receiver side is tearing down; its Closed event
                        // is already on its way.
                        debug!(session = %id, "send to closing connection");
                    }
                }
            }
            Recipient::One(id) => {
                if let Some(sender) = senders.get(&id) {
                    let _ = sender.send(line);
                }
            }
        }
    }
}

/// Drive one client connection: WebSocket handshake, session handshake
/// with the game loop, then frame shuttling until either side hangs up.
async fn handle_connection(stream: TcpStream, addr: SocketAddr, events: mpsc::Sender<Event>) {
    let ws_stream = match accept_async(stream).await {
        Ok(ws) => ws,
        Err(e) => {
            debug!(%addr, "WebSocket handshake failed: {}", e);
            return;
        }
    };
    let (mut ws_sender, mut ws_receiver) = ws_stream.split();

    let (line_tx, mut line_rx) = mpsc::unbounded_channel::<String>();
    let (reply_tx, reply_rx) = oneshot::channel();
    if events
        .send(Event::Connected {
            sender: line_tx,
            reply: reply_tx,
        })
        .await
        .is_err()
    {
        return;
    }
    let Ok(id) = reply_rx.await else {
        // Server refused the session (connection cap).
        let _ = ws_sender.close().await;
        return;
    };
    info!(%addr, session = %id, "client connected");

    // Writer task: encoded lines out to the socket.
    let writer = tokio::spawn(async move {
        while let Some(line) = line_rx.recv().await {
            if ws_sender.send(Message::Text(line)).await.is_err() {
                break;
            }
        }
    });

    // Reader loop: text frames in to the game loop.
    while let Some(msg) = ws_receiver.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                if events.send(Event::Frame { id, text }).await.is_err() {
                    break;
                }
            }
            Ok(Message::Close(_)) => break,
            // Binary, ping and pong frames are not protocol messages.
            Ok(_) => {}
            Err(e) => {
                debug!(session = %id, "WebSocket error: {}", e);
                break;
            }
        }
    }

    let _ = events.send(Event::Closed { id }).await;
    writer.abort();
    info!(%addr, session = %id, "client gone");
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::protocol::ServerMessage;

    #[test]
    fn test_server_config_default() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_addr.port(), 54000);
        assert_eq!(config.max_connections, 32);
    }

    #[tokio::test]
    async fn test_deliver_routes_broadcast_and_private() {
        let a = SessionId::test_id(0);
        let b = SessionId::test_id(1);
        let (tx_a, mut rx_a) = mpsc::unbounded_channel();
        let (tx_b, mut rx_b) = mpsc::unbounded_channel();
        let senders = BTreeMap::from([(a, tx_a), (b, tx_b)]);

        let mut outbox = Outbox::new();
        outbox.broadcast(ServerMessage::Turn {
            name: "Ana".to_string(),
        });
        outbox.send_to(b, ServerMessage::MyDice { dice: vec![2, 6] });
        deliver(&senders, &mut outbox);

        assert_eq!(rx_a.try_recv().unwrap(), "TURN Ana");
        assert!(rx_a.try_recv().is_err());
        assert_eq!(rx_b.try_recv().unwrap(), "TURN Ana");
        assert_eq!(rx_b.try_recv().unwrap(), "MYDICE 2 6");
    }

    #[tokio::test]
    async fn test_deliver_survives_closed_receiver() {
        let a = SessionId::test_id(0);
        let (tx_a, rx_a) = mpsc::unbounded_channel();
        drop(rx_a);
        let senders = BTreeMap::from([(a, tx_a)]);

        let mut outbox = Outbox::new();
        outbox.broadcast(ServerMessage::CurrentBet { bet: None });
        deliver(&senders, &mut outbox);
        assert!(outbox.is_empty());
    }
}
