//! Network Layer
//!
//! WebSocket transport and the wire protocol. This layer is
//! **non-deterministic** — all game logic runs through `game/`, on a
//! single task that owns the whole aggregate.

pub mod broadcast;
pub mod protocol;
pub mod server;
pub mod session;

pub use broadcast::{Outbound, Outbox, Recipient};
pub use protocol::{ClientMessage, Notice, ProtocolError, ServerMessage};
pub use server::{DudoServer, ServerConfig, ServerError};
pub use session::{SessionId, SessionRegistry};
