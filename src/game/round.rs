//! Round Engine
//!
//! The phase state machine: Lobby → Betting → Reveal → Betting (next
//! round) | Lobby (game over). Every inbound message lands here after
//! parsing; every handler mutates the aggregate and pushes the matching
//! notifications into the outbox in mutation order.
//!
//! Illegal-but-well-formed actions answer the sender with an `INFO` code
//! and change nothing. Messages arriving in the wrong phase are ignored
//! outright, as the original server did.

use tracing::{debug, info};

use crate::game::bet::{count_matching, is_legal_raise, Bet};
use crate::game::state::{Game, GamePhase};
use crate::network::broadcast::Outbox;
use crate::network::protocol::{ClientMessage, Notice, ServerMessage};
use crate::network::session::SessionId;

/// Dispatch one parsed message from `id`.
pub fn handle_message(game: &mut Game, id: SessionId, msg: ClientMessage, outbox: &mut Outbox) {
    match msg {
        ClientMessage::Hello { name } => handle_hello(game, id, &name, outbox),
        ClientMessage::Roll => handle_roll(game, id, outbox),
        ClientMessage::Bet { count, face } => handle_bet(game, id, count, face, outbox),
        ClientMessage::Doubt => handle_doubt(game, id, outbox),
        ClientMessage::Next => handle_next(game, id, outbox),
    }
}

/// A connection dropped: scrub the session from every structure that
/// references it. The game continues with the remaining roster; nothing
/// is broadcast.
pub fn handle_disconnect(game: &mut Game, id: SessionId) {
    match game.sessions.name_of(id) {
        Some(name) => info!(player = %name, session = %id, "disconnected"),
        None => debug!(session = %id, "connection closed before HELLO"),
    }
    game.sessions.unregister(id);
    game.turns.remove(id);
    game.round_dice.remove(&id);
}

fn handle_hello(game: &mut Game, id: SessionId, name: &str, outbox: &mut Outbox) {
    if game.sessions.register(id, name).is_err() {
        debug!(session = %id, "HELLO on a dead session");
        return;
    }
    info!(player = %name, session = %id, "registered");

    outbox.send_to(
        id,
        ServerMessage::Welcome {
            name: name.to_string(),
        },
    );
    // Full roster broadcast so every client learns the new player.
    broadcast_dice_counts(game, outbox);
}

fn handle_roll(game: &mut Game, id: SessionId, outbox: &mut Outbox) {
    if game.phase != GamePhase::Lobby {
        debug!(phase = ?game.phase, "ROLL ignored outside Lobby");
        return;
    }

    if game.turns.is_empty() {
        // Whoever asks first opens the first round (and re-opens it until
        // a doubt produces a loser).
        game.first_opener = Some(id);
    }
    let players: Vec<(SessionId, u8)> = game
        .sessions
        .players()
        .map(|(pid, p)| (pid, p.dice_count))
        .collect();
    game.turns.setup_if_needed(players);

    game.bet = None;
    roll_round_dice(game, outbox);

    game.phase = GamePhase::Betting;
    outbox.broadcast(ServerMessage::Phase(GamePhase::Betting));

    {
        let Game {
            ref sessions,
            ref mut turns,
            ..
        } = *game;
        turns.skip_exhausted(|pid| sessions.get(pid).map_or(0, |p| p.dice_count));
    }
    if let Some(current) = game.turns.current() {
        outbox.broadcast(ServerMessage::Turn {
            name: game.name_or_unknown(current),
        });
    }
    outbox.broadcast(ServerMessage::CurrentBet { bet: None });

    info!(round_players = game.round_dice.len(), "round started");
}

fn handle_bet(game: &mut Game, id: SessionId, count: u32, face: u8, outbox: &mut Outbox) {
    if game.phase != GamePhase::Betting {
        debug!(phase = ?game.phase, "BET ignored outside Betting");
        return;
    }
    if game.turns.current() != Some(id) {
        outbox.send_to(id, ServerMessage::Info(Notice::NotYourTurn));
        return;
    }

    let palifico = game.is_palifico();
    if !is_legal_raise(game.bet.as_ref(), count, face, palifico) {
        outbox.send_to(id, ServerMessage::Info(Notice::InvalidBet));
        return;
    }

    let bettor_name = game.name_or_unknown(id);
    info!(player = %bettor_name, count, face, palifico, "bet placed");
    game.bet = Some(Bet {
        bettor: id,
        bettor_name: bettor_name.clone(),
        count,
        face,
    });

    outbox.broadcast(ServerMessage::CurrentBet {
        bet: Some((bettor_name, count, face)),
    });

    {
        let Game {
            ref sessions,
            ref mut turns,
            ..
        } = *game;
        turns.advance(|pid| sessions.get(pid).map_or(0, |p| p.dice_count));
    }
    if let Some(next) = game.turns.current() {
        outbox.broadcast(ServerMessage::Turn {
            name: game.name_or_unknown(next),
        });
    }
}

fn handle_doubt(game: &mut Game, id: SessionId, outbox: &mut Outbox) {
    if game.phase != GamePhase::Betting {
        debug!(phase = ?game.phase, "DOUBT ignored outside Betting");
        return;
    }
    let Some(bet) = game.bet.clone() else {
        // Nothing to challenge yet.
        return;
    };

    // Palifico is decided by whose turn it is at the moment of the doubt,
    // before any mutation.
    let palifico = game.is_palifico();

    game.phase = GamePhase::Reveal;
    outbox.broadcast(ServerMessage::Phase(GamePhase::Reveal));
    for (pid, dice) in &game.round_dice {
        outbox.broadcast(ServerMessage::Reveal {
            name: game.name_or_unknown(*pid),
            dice: dice.clone(),
        });
    }

    let matches = count_matching(
        game.round_dice.values().map(|v| v.as_slice()),
        bet.face,
        palifico,
    );
    let bet_holds = matches >= bet.count;

    let challenger_name = game.name_or_unknown(id);
    let (loser_id, loser_name) = if bet_holds {
        (id, challenger_name.clone())
    } else {
        (bet.bettor, bet.bettor_name.clone())
    };
    info!(
        challenger = %challenger_name,
        bettor = %bet.bettor_name,
        count = bet.count,
        face = bet.face,
        matches,
        palifico,
        loser = %loser_name,
        "doubt resolved"
    );
    game.last_loser = Some(loser_id);

    let mut remaining = None;
    if let Some(player) = game.sessions.get_mut(loser_id) {
        if player.dice_count > 0 {
            player.dice_count -= 1;
            remaining = Some(player.dice_count);
        }
    }
    if let Some(remaining) = remaining {
        outbox.broadcast(ServerMessage::Info(Notice::LostDie {
            name: loser_name.clone(),
            remaining,
        }));
        broadcast_dice_counts(game, outbox);
        if remaining == 0 {
            outbox.broadcast(ServerMessage::Info(Notice::Eliminated {
                name: loser_name.clone(),
            }));
        }
    }

    let survivors: Vec<String> = game
        .sessions
        .players()
        .filter(|(_, p)| p.dice_count > 0)
        .map(|(_, p)| p.name.clone())
        .collect();
    if survivors.len() < 2 {
        let winner = survivors
            .into_iter()
            .next()
            .unwrap_or_else(|| "Unknown".to_string());
        info!(winner = %winner, "game over");
        outbox.broadcast(ServerMessage::Info(Notice::Winner { name: winner }));
        game.phase = GamePhase::Lobby;
    }
}

fn handle_next(game: &mut Game, _id: SessionId, outbox: &mut Outbox) {
    if game.phase != GamePhase::Reveal {
        debug!(phase = ?game.phase, "NEXT ignored outside Reveal");
        return;
    }

    // Eliminated players leave the rotation only here, at the boundary.
    {
        let Game {
            ref sessions,
            ref mut turns,
            ..
        } = *game;
        turns.prune(|pid| sessions.get(pid).map_or(0, |p| p.dice_count));
    }
    if game.turns.is_empty() {
        let players: Vec<(SessionId, u8)> = game
            .sessions
            .players()
            .map(|(pid, p)| (pid, p.dice_count))
            .collect();
        game.turns.setup_if_needed(players);
    }

    game.bet = None;
    roll_round_dice(game, outbox);

    game.phase = GamePhase::Betting;
    outbox.broadcast(ServerMessage::Phase(GamePhase::Betting));

    // The previous doubt's loser opens; before any doubt has happened,
    // the original first-round opener does. A loser no longer seated
    // leaves the cursor where the prune put it.
    if let Some(opener) = game.last_loser.or(game.first_opener) {
        game.turns.set_current(opener);
    }
    if let Some(current) = game.turns.current() {
        outbox.broadcast(ServerMessage::Turn {
            name: game.name_or_unknown(current),
        });
    }
    outbox.broadcast(ServerMessage::CurrentBet { bet: None });
}

/// Roll fresh dice for every player still holding any, then publish the
/// roster counts and each player's private hand.
fn roll_round_dice(game: &mut Game, outbox: &mut Outbox) {
    {
        let Game {
            ref sessions,
            ref mut rng,
            ref mut round_dice,
            ..
        } = *game;
        round_dice.clear();
        for (pid, player) in sessions.players() {
            if player.dice_count == 0 {
                continue;
            }
            round_dice.insert(pid, rng.roll_dice(player.dice_count));
        }
    }

    broadcast_dice_counts(game, outbox);
    for (pid, dice) in &game.round_dice {
        outbox.send_to(*pid, ServerMessage::MyDice { dice: dice.clone() });
    }
}

/// DICECOUNT line for every registered player, in registration order.
fn broadcast_dice_counts(game: &Game, outbox: &mut Outbox) {
    for (_, player) in game.sessions.players() {
        outbox.broadcast(ServerMessage::DiceCount {
            name: player.name.clone(),
            count: player.dice_count,
        });
    }
}

// =============================================================================
// TESTS
// =============================================================================
