//! Protocol Messages
//!
//! Text wire format for client-server communication. Every message is one
//! WebSocket text frame holding a keyword followed by space-separated
//! arguments, e.g. `BET 3 4` or `CURRENTBET Ana 3 4`.
//!
//! The parser is strict: it distinguishes unparsable input (a
//! [`ProtocolError`], dropped by the server without reply) from well-formed
//! messages that turn out to be illegal in the current game state (answered
//! with an `INFO` code by the engine).

use crate::game::state::GamePhase;

/// Errors produced by the strict message parser.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    /// Empty input line.
    #[error("empty message")]
    Empty,

    /// First token is not a known keyword.
    #[error("unknown command: {0}")]
    UnknownCommand(String),

    /// Keyword recognized but a required argument is missing.
    #[error("missing argument for {0}")]
    MissingArgument(&'static str),

    /// An argument failed to parse as a number.
    #[error("invalid number in {0}")]
    InvalidNumber(&'static str),

    /// More arguments than the grammar allows.
    #[error("trailing input after {0}")]
    TrailingInput(&'static str),
}

// =============================================================================
// CLIENT -> SERVER MESSAGES
// =============================================================================

/// Messages sent from client to server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientMessage {
    /// Register this connection under a player name.
    Hello {
        /// Requested player name (everything after the keyword).
        name: String,
    },

    /// Request round start (honored in Lobby only).
    Roll,

    /// Propose a bet of `count` dice showing `face`.
    Bet {
        /// Claimed number of matching dice on the table.
        count: u32,
        /// Claimed face value.
        face: u8,
    },

    /// Challenge the current bet.
    Doubt,

    /// Advance to the next round (honored in Reveal only).
    Next,
}

impl ClientMessage {
    /// Parse one inbound line.
    ///
    /// # Errors
    ///
    /// Returns a [`ProtocolError`] describing exactly why the line is
    /// unparsable; the caller drops such input without a reply.
    pub fn parse(line: &str) -> Result<Self, ProtocolError> {
        let trimmed = line.trim_end_matches(['\r', '\n']).trim_start();
        let (keyword, rest) = match trimmed.split_once(char::is_whitespace) {
            Some((keyword, rest)) => (keyword, rest),
            None => (trimmed, ""),
        };

        match keyword {
            "" => Err(ProtocolError::Empty),
            "HELLO" => {
                // The name is the remainder of the line, as the original
                // clients send it; it only has to be non-empty.
                let name = rest.trim();
                if name.is_empty() {
                    return Err(ProtocolError::MissingArgument("HELLO"));
                }
                Ok(Self::Hello {
                    name: name.to_string(),
                })
            }
            "ROLL" => expect_no_args("ROLL", rest).map(|_| Self::Roll),
            "BET" => {
                let mut tokens = rest.split_whitespace();
                let count = tokens
                    .next()
                    .ok_or(ProtocolError::MissingArgument("BET"))?
                    .parse::<u32>()
                    .map_err(|_| ProtocolError::InvalidNumber("BET"))?;
                let face = tokens
                    .next()
                    .ok_or(ProtocolError::MissingArgument("BET"))?
                    .parse::<u8>()
                    .map_err(|_| ProtocolError::InvalidNumber("BET"))?;
                if tokens.next().is_some() {
                    return Err(ProtocolError::TrailingInput("BET"));
                }
                Ok(Self::Bet { count, face })
            }
            "DOUBT" => expect_no_args("DOUBT", rest).map(|_| Self::Doubt),
            "NEXT" => expect_no_args("NEXT", rest).map(|_| Self::Next),
            other => Err(ProtocolError::UnknownCommand(other.to_string())),
        }
    }
}

fn expect_no_args(keyword: &'static str, rest: &str) -> Result<(), ProtocolError> {
    if rest.trim().is_empty() {
        Ok(())
    } else {
        Err(ProtocolError::TrailingInput(keyword))
    }
}

// =============================================================================
// SERVER -> CLIENT MESSAGES
// =============================================================================

/// Codes carried by `INFO` notices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// Sender bet outside their turn.
    NotYourTurn,

    /// The proposed bet is not a legal raise.
    InvalidBet,

    /// A doubt resolved against `name`, who now holds `remaining` dice.
    LostDie {
        /// Player who lost the die.
        name: String,
        /// Dice the player still holds.
        remaining: u8,
    },

    /// `name` is out of dice and out of the game.
    Eliminated {
        /// Eliminated player.
        name: String,
    },

    /// `name` is the last player holding dice.
    Winner {
        /// Winning player.
        name: String,
    },
}

/// Messages sent from server to client.
///
/// Everything is broadcast except [`ServerMessage::Welcome`] and
/// [`ServerMessage::MyDice`], which go to a single client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerMessage {
    /// Acknowledges a successful HELLO (private).
    Welcome {
        /// Registered name, echoed back.
        name: String,
    },

    /// Phase transition.
    Phase(GamePhase),

    /// Whose turn it now is.
    Turn {
        /// Player whose turn it is.
        name: String,
    },

    /// Current bet snapshot; `None` encodes as `CURRENTBET None 0 0`.
    CurrentBet {
        /// Bettor name, count and face of the standing bet.
        bet: Option<(String, u32, u8)>,
    },

    /// A player's remaining dice count.
    DiceCount {
        /// Player name.
        name: String,
        /// Remaining dice.
        count: u8,
    },

    /// A player's actual dice, shown to everyone during Reveal.
    Reveal {
        /// Player whose dice these are.
        name: String,
        /// The revealed die values.
        dice: Vec<u8>,
    },

    /// A player's own dice (private).
    MyDice {
        /// The recipient's die values.
        dice: Vec<u8>,
    },

    /// Informational/error notice.
    Info(Notice),
}

impl ServerMessage {
    /// Encode to the wire line (no trailing newline; framing is the
    /// transport's job).
    pub fn encode(&self) -> String {
        match self {
            Self::Welcome { name } => format!("WELCOME {name}"),
            Self::Phase(phase) => format!("PHASE {}", phase.wire_name()),
            Self::Turn { name } => format!("TURN {name}"),
            Self::CurrentBet { bet: None } => "CURRENTBET None 0 0".to_string(),
            Self::CurrentBet {
                bet: Some((bettor, count, face)),
            } => format!("CURRENTBET {bettor} {count} {face}"),
            Self::DiceCount { name, count } => format!("DICECOUNT {name} {count}"),
            Self::Reveal { name, dice } => {
                let mut line = format!("REVEAL {name}");
                for d in dice {
                    line.push(' ');
                    line.push_str(&d.to_string());
                }
                line
            }
            Self::MyDice { dice } => {
                let mut line = String::from("MYDICE");
                for d in dice {
                    line.push(' ');
                    line.push_str(&d.to_string());
                }
                line
            }
            Self::Info(notice) => match notice {
                Notice::NotYourTurn => "INFO NotYourTurn".to_string(),
                Notice::InvalidBet => "INFO InvalidBet".to_string(),
                Notice::LostDie { name, remaining } => {
                    format!("INFO LostDie {name} {remaining}")
                }
                Notice::Eliminated { name } => format!("INFO Eliminated {name}"),
                Notice::Winner { name } => format!("INFO Winner {name}"),
            },
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hello() {
        assert_eq!(
            ClientMessage::parse("HELLO Ana"),
            Ok(ClientMessage::Hello {
                name: "Ana".to_string()
            })
        );
    }

    #[test]
    fn test_parse_hello_keeps_inner_spaces() {
        // The original clients allow spaced names; the remainder is the name.
        assert_eq!(
            ClientMessage::parse("HELLO Ana Maria"),
            Ok(ClientMessage::Hello {
                name: "Ana Maria".to_string()
            })
        );
    }

    #[test]
    fn test_parse_hello_without_name() {
        assert_eq!(
            ClientMessage::parse("HELLO "),
            Err(ProtocolError::MissingArgument("HELLO"))
        );
    }

    #[test]
    fn test_parse_tolerates_surrounding_whitespace() {
        assert_eq!(
            ClientMessage::parse("  HELLO Ana"),
            Ok(ClientMessage::Hello {
                name: "Ana".to_string()
            })
        );
        assert_eq!(ClientMessage::parse(" ROLL "), Ok(ClientMessage::Roll));
    }

    #[test]
    fn test_parse_roll() {
        assert_eq!(ClientMessage::parse("ROLL"), Ok(ClientMessage::Roll));
    }

    #[test]
    fn test_parse_bet() {
        assert_eq!(
            ClientMessage::parse("BET 3 4"),
            Ok(ClientMessage::Bet { count: 3, face: 4 })
        );
    }

    #[test]
    fn test_parse_bet_trims_line_ending() {
        assert_eq!(
            ClientMessage::parse("BET 3 4\r\n"),
            Ok(ClientMessage::Bet { count: 3, face: 4 })
        );
    }

    #[test]
    fn test_parse_bet_missing_face() {
        assert_eq!(
            ClientMessage::parse("BET 3"),
            Err(ProtocolError::MissingArgument("BET"))
        );
    }

    #[test]
    fn test_parse_bet_unparsable_number() {
        assert_eq!(
            ClientMessage::parse("BET three 4"),
            Err(ProtocolError::InvalidNumber("BET"))
        );
        assert_eq!(
            ClientMessage::parse("BET 3 -1"),
            Err(ProtocolError::InvalidNumber("BET"))
        );
    }

    #[test]
    fn test_parse_bet_trailing_tokens() {
        assert_eq!(
            ClientMessage::parse("BET 3 4 5"),
            Err(ProtocolError::TrailingInput("BET"))
        );
    }

    #[test]
    fn test_parse_doubt_and_next() {
        assert_eq!(ClientMessage::parse("DOUBT"), Ok(ClientMessage::Doubt));
        assert_eq!(ClientMessage::parse("NEXT"), Ok(ClientMessage::Next));
    }

    #[test]
    fn test_parse_unknown_keyword() {
        assert_eq!(
            ClientMessage::parse("FOLD"),
            Err(ProtocolError::UnknownCommand("FOLD".to_string()))
        );
        // Keywords are case-sensitive
        assert_eq!(
            ClientMessage::parse("bet 3 4"),
            Err(ProtocolError::UnknownCommand("bet".to_string()))
        );
    }

    #[test]
    fn test_parse_empty() {
        assert_eq!(ClientMessage::parse(""), Err(ProtocolError::Empty));
        assert_eq!(ClientMessage::parse("   "), Err(ProtocolError::Empty));
    }

    #[test]
    fn test_encode_welcome() {
        let msg = ServerMessage::Welcome {
            name: "Ana".to_string(),
        };
        assert_eq!(msg.encode(), "WELCOME Ana");
    }

    #[test]
    fn test_encode_phase() {
        assert_eq!(
            ServerMessage::Phase(GamePhase::Betting).encode(),
            "PHASE BETTING"
        );
        assert_eq!(
            ServerMessage::Phase(GamePhase::Reveal).encode(),
            "PHASE REVEAL"
        );
        assert_eq!(
            ServerMessage::Phase(GamePhase::Lobby).encode(),
            "PHASE Lobby"
        );
    }

    #[test]
    fn test_encode_current_bet_cleared() {
        let msg = ServerMessage::CurrentBet { bet: None };
        assert_eq!(msg.encode(), "CURRENTBET None 0 0");
    }

    #[test]
    fn test_encode_current_bet_set() {
        let msg = ServerMessage::CurrentBet {
            bet: Some(("Ana".to_string(), 3, 4)),
        };
        assert_eq!(msg.encode(), "CURRENTBET Ana 3 4");
    }

    #[test]
    fn test_encode_dice_count() {
        let msg = ServerMessage::DiceCount {
            name: "Ben".to_string(),
            count: 4,
        };
        assert_eq!(msg.encode(), "DICECOUNT Ben 4");
    }

    #[test]
    fn test_encode_reveal() {
        let msg = ServerMessage::Reveal {
            name: "Ana".to_string(),
            dice: vec![1, 4, 4, 6, 2],
        };
        assert_eq!(msg.encode(), "REVEAL Ana 1 4 4 6 2");
    }

    #[test]
    fn test_encode_my_dice() {
        let msg = ServerMessage::MyDice {
            dice: vec![5, 5, 1],
        };
        assert_eq!(msg.encode(), "MYDICE 5 5 1");
    }

    #[test]
    fn test_encode_notices() {
        assert_eq!(
            ServerMessage::Info(Notice::NotYourTurn).encode(),
            "INFO NotYourTurn"
        );
        assert_eq!(
            ServerMessage::Info(Notice::InvalidBet).encode(),
            "INFO InvalidBet"
        );
        assert_eq!(
            ServerMessage::Info(Notice::LostDie {
                name: "Ben".to_string(),
                remaining: 2
            })
            .encode(),
            "INFO LostDie Ben 2"
        );
        assert_eq!(
            ServerMessage::Info(Notice::Eliminated {
                name: "Ben".to_string()
            })
            .encode(),
            "INFO Eliminated Ben"
        );
        assert_eq!(
            ServerMessage::Info(Notice::Winner {
                name: "Ana".to_string()
            })
            .encode(),
            "INFO Winner Ana"
        );
    }
}
