//! # Dudo Game Server
//!
//! Authoritative server for Dudo, a turn-based multiplayer dice-bluffing game.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       DUDO SERVER                            │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/            - Deterministic primitives                 │
//! │  └── rng.rs       - Seedable Xorshift128+ dice generator     │
//! │                                                              │
//! │  game/            - Game rules (deterministic)               │
//! │  ├── bet.rs       - Bet escalation rules, wild-digit tally   │
//! │  ├── turn.rs      - Turn rotation                            │
//! │  ├── state.rs     - Single mutable game aggregate            │
//! │  └── round.rs     - Round engine (roll/bet/doubt/next)       │
//! │                                                              │
//! │  network/         - Networking (non-deterministic)           │
//! │  ├── protocol.rs  - Text wire grammar                        │
//! │  ├── session.rs   - Session registry (slot table)            │
//! │  ├── broadcast.rs - Outbound message projection              │
//! │  └── server.rs    - WebSocket listener + game event loop     │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Single event loop
//!
//! The entire mutable game state (sessions, bet, turn order, round dice,
//! phase, RNG) is one aggregate owned by a single task. Connection tasks
//! only move text frames between sockets and channels; every read and
//! mutation of game state happens serially on that one task, so no locks
//! exist anywhere in game logic. Given the same seed and the same input
//! event sequence, the engine produces the same broadcast sequence.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod core;
pub mod game;
pub mod network;

// Re-export commonly used types
pub use crate::core::rng::DiceRng;
pub use game::bet::Bet;
pub use game::state::{Game, GamePhase};
pub use network::protocol::{ClientMessage, Notice, ServerMessage};
pub use network::session::SessionId;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Dice each player starts the game with
pub const STARTING_DICE: u8 = 5;

/// Number of faces on a die
pub const DIE_FACES: u8 = 6;
