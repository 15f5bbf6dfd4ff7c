//! Game Logic Module
//!
//! The rule set and state machine. Everything here is deterministic:
//! given the same seed and input sequence it produces the same broadcast
//! sequence, which is what the round tests rely on.
//!
//! ## Module Structure
//!
//! - `bet`: bet escalation rules and the wild-digit tally
//! - `turn`: turn rotation
//! - `state`: the single mutable game aggregate
//! - `round`: the round engine (roll / bet / doubt / next)

pub mod bet;
pub mod round;
pub mod state;
pub mod turn;

// Re-export key types
pub use bet::{count_matching, is_legal_raise, Bet};
pub use state::{Game, GamePhase, RoundDice};
pub use turn::TurnOrder;
