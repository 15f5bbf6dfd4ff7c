//! Bet Escalation Rules
//!
//! The pure decision core of the game: which bets are legal successors to
//! the current bet, and how many dice on the table match a bet face.
//!
//! Face 1 ("ones") is the wild digit. When escalating, one die showing 1 is
//! worth two of any other face; converting back into ones halves the count
//! (rounded up). Palifico rounds suspend all of that: ones are never wild
//! and can never be bet.
//!
//! Everything in this module is a pure function of its arguments so the
//! whole rule set is exhaustively testable without an engine.

use crate::network::session::SessionId;
use crate::DIE_FACES;

/// The standing bet of a betting phase.
///
/// At most one exists per round; the engine models "no bet yet" as
/// `Option<Bet>::None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bet {
    /// Session that placed the bet.
    pub bettor: SessionId,
    /// Bettor's name at bet time (kept so a later disconnect cannot
    /// erase who to blame when the bet is doubted).
    pub bettor_name: String,
    /// Claimed number of matching dice across all cups.
    pub count: u32,
    /// Claimed face, 1..=6.
    pub face: u8,
}

/// Decide whether `(count, face)` is a legal raise over `current`.
///
/// `palifico` must be the derived predicate for the acting player's round
/// (current player holds exactly one die), evaluated by the caller.
pub fn is_legal_raise(current: Option<&Bet>, count: u32, face: u8, palifico: bool) -> bool {
    if face < 1 || face > DIE_FACES || count == 0 {
        return false;
    }

    if palifico {
        // Palifico: ones are not wild and cannot be bet; the face is
        // locked after the opening bet; only the quantity may grow.
        if face == 1 {
            return false;
        }
        return match current {
            None => true,
            Some(bet) => face == bet.face && count > bet.count,
        };
    }

    let Some(bet) = current else {
        // Opening bet cannot be ones.
        return face != 1;
    };

    match (bet.face == 1, face == 1) {
        // Non-ones to non-ones: raise the count, or same count higher face.
        (false, false) => count > bet.count || (count == bet.count && face > bet.face),
        // Non-ones to ones: at least half the count, rounded up.
        (false, true) => count >= bet.count.div_ceil(2),
        // Ones to ones: strictly more ones.
        (true, true) => count > bet.count,
        // Ones to non-ones: each one was worth two, plus one more.
        (true, false) => count >= 2 * bet.count + 1,
    }
}

/// Count dice matching `bet_face` across all revealed hands.
///
/// Ones are wild unless:
/// - palifico round (not wild), or
/// - the bet is on ones (ones count only as ones).
pub fn count_matching<'a, I>(hands: I, bet_face: u8, palifico: bool) -> u32
where
    I: IntoIterator<Item = &'a [u8]>,
{
    let mut total = 0;
    for hand in hands {
        for &die in hand {
            let matches = if bet_face == 1 {
                die == 1
            } else if palifico {
                die == bet_face
            } else {
                die == bet_face || die == 1
            };
            if matches {
                total += 1;
            }
        }
    }
    total
}

// =============================================================================
// TESTS
// =============================================================================
