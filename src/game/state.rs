//! Game State Definitions
//!
//! The single mutable aggregate the event loop owns. Everything shared —
//! sessions, turn order, phase, the standing bet, this round's dice and
//! the dice generator — lives behind one `Game` value; nothing else in the
//! crate holds game state.

use std::collections::BTreeMap;

use crate::core::rng::DiceRng;
use crate::game::bet::Bet;
use crate::game::turn::TurnOrder;
use crate::network::session::{SessionId, SessionRegistry};

/// Global game phase. Mutated only by the round engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GamePhase {
    /// Waiting for the first roll (or for a fresh game after a winner).
    Lobby,
    /// A bet is being escalated around the table.
    Betting,
    /// Dice are face-up after a doubt; waiting for NEXT.
    Reveal,
}

impl GamePhase {
    /// The token this phase carries on the wire.
    ///
    /// Betting and Reveal are shouted in uppercase; Lobby keeps its
    /// lobby-case spelling. The client protocol is case-sensitive.
    pub fn wire_name(self) -> &'static str {
        match self {
            Self::Lobby => "Lobby",
            Self::Betting => "BETTING",
            Self::Reveal => "REVEAL",
        }
    }
}

/// Dice rolled this round, per player. Recreated every round.
pub type RoundDice = BTreeMap<SessionId, Vec<u8>>;

/// The game aggregate.
///
/// Field access within the crate is deliberate: the round engine
/// (`game::round`) mutates these fields directly under the single event
/// loop, and splitting borrows across fields is what lets the turn cursor
/// consult dice counts without cloning.
#[derive(Debug)]
pub struct Game {
    /// Connection-to-player table; exclusive owner of all `Player` state.
    pub(crate) sessions: SessionRegistry,
    /// Turn rotation for the running game.
    pub(crate) turns: TurnOrder,
    /// Current phase.
    pub(crate) phase: GamePhase,
    /// Standing bet, if any.
    pub(crate) bet: Option<Bet>,
    /// This round's dice.
    pub(crate) round_dice: RoundDice,
    /// Player who sent the very first ROLL; opens the first round again
    /// if no doubt has produced a loser yet.
    pub(crate) first_opener: Option<SessionId>,
    /// Loser of the last resolved doubt; opens the next round.
    pub(crate) last_loser: Option<SessionId>,
    /// Engine-owned dice generator.
    pub(crate) rng: DiceRng,
}

impl Game {
    /// Create a fresh game in the lobby.
    ///
    /// The seed fixes the entire dice sequence, which is how tests script
    /// round outcomes.
    pub fn new(seed: u64) -> Self {
        Self {
            sessions: SessionRegistry::new(),
            turns: TurnOrder::new(),
            phase: GamePhase::Lobby,
            bet: None,
            round_dice: RoundDice::new(),
            first_opener: None,
            last_loser: None,
            rng: DiceRng::new(seed),
        }
    }

    /// Allocate a session for a newly accepted connection.
    pub fn connect(&mut self) -> SessionId {
        self.sessions.connect()
    }

    /// Current phase.
    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    /// The standing bet, if one exists.
    pub fn current_bet(&self) -> Option<&Bet> {
        self.bet.as_ref()
    }

    /// Remaining dice for `id`; 0 for anything not registered.
    pub fn dice_of(&self, id: SessionId) -> u8 {
        self.sessions.get(id).map_or(0, |p| p.dice_count)
    }

    /// Derived palifico predicate: the player whose turn it currently is
    /// holds exactly one die. Never stored; recomputed per decision.
    pub fn is_palifico(&self) -> bool {
        self.turns
            .current()
            .map(|id| self.dice_of(id) == 1)
            .unwrap_or(false)
    }

    /// Player name lookup, falling back to the original server's
    /// placeholder for anything unknown.
    pub fn name_or_unknown(&self, id: SessionId) -> String {
        self.sessions
            .name_of(id)
            .unwrap_or("Unknown")
            .to_string()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_game_is_in_lobby() {
        let game = Game::new(1);
        assert_eq!(game.phase(), GamePhase::Lobby);
        assert!(game.bet.is_none());
        assert!(game.round_dice.is_empty());
    }

    #[test]
    fn test_wire_names() {
        assert_eq!(GamePhase::Lobby.wire_name(), "Lobby");
        assert_eq!(GamePhase::Betting.wire_name(), "BETTING");
        assert_eq!(GamePhase::Reveal.wire_name(), "REVEAL");
    }

    #[test]
    fn test_dice_of_unregistered_is_zero() {
        let mut game = Game::new(1);
        let id = game.connect();
        assert_eq!(game.dice_of(id), 0);

        game.sessions.register(id, "Ana").unwrap();
        assert_eq!(game.dice_of(id), crate::STARTING_DICE);
    }

    #[test]
    fn test_palifico_follows_current_player() {
        let mut game = Game::new(1);
        let a = game.connect();
        let b = game.connect();
        game.sessions.register(a, "Ana").unwrap();
        game.sessions.register(b, "Ben").unwrap();
        game.turns
            .setup_if_needed([(a, 5), (b, 5)].into_iter());

        assert!(!game.is_palifico());

        game.sessions.get_mut(a).unwrap().dice_count = 1;
        assert!(game.is_palifico());

        // Not palifico once the turn moves on to a healthy player
        game.turns.advance(|_| 5);
        assert!(!game.is_palifico());
    }

    #[test]
    fn test_palifico_false_without_turn_order() {
        let game = Game::new(1);
        assert!(!game.is_palifico());
    }
}
