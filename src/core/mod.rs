//! Core deterministic primitives.
//!
//! Everything the game rules consume that must be reproducible lives here,
//! which today is just the dice generator.

pub mod rng;

// Re-export core types
pub use rng::DiceRng;
