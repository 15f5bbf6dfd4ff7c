//! Session Registry
//!
//! Maps connections to player identities and per-player game state.
//!
//! Connections are handed out as [`SessionId`]s: generation-checked indices
//! into a slot table. A freed slot bumps its generation, so a stale id held
//! anywhere else in the engine (turn order, round dice, a standing bet) can
//! never alias a later connection that reuses the index.
//!
//! Registration is deliberately lenient: `HELLO` never rejects, including
//! duplicate names. Name lookups resolve to the earliest registration.

use std::fmt;

/// Errors from registry operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// The id does not refer to a live connection.
    #[error("session is not connected")]
    NotConnected,
}

/// Stable opaque handle for one connection.
///
/// Implements `Ord` so `BTreeMap<SessionId, _>` iterates deterministically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SessionId {
    index: u32,
    generation: u32,
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s{}g{}", self.index, self.generation)
    }
}

#[cfg(test)]
impl SessionId {
    /// Fabricate an id for tests that only need a distinct handle.
    pub fn test_id(index: u32) -> Self {
        Self {
            index,
            generation: 0,
        }
    }
}

/// A registered player.
#[derive(Debug, Clone)]
pub struct Player {
    /// Player name as given in HELLO.
    pub name: String,
    /// Remaining dice; starts at [`crate::STARTING_DICE`], floor 0.
    pub dice_count: u8,
}

/// What a slot currently holds.
#[derive(Debug)]
enum SlotState {
    /// No connection.
    Free,
    /// Socket open, HELLO not yet received.
    Connected,
    /// Named player.
    Registered(Player),
}

#[derive(Debug)]
struct Slot {
    generation: u32,
    state: SlotState,
}

/// The session table.
///
/// Owns every [`Player`]; the rest of the engine refers to players only
/// through [`SessionId`]s.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    slots: Vec<Slot>,
    free: Vec<u32>,
    /// Live ids in connection order; registration order for iteration.
    order: Vec<SessionId>,
}

impl SessionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a slot for a new connection.
    pub fn connect(&mut self) -> SessionId {
        let index = match self.free.pop() {
            Some(index) => {
                self.slots[index as usize].state = SlotState::Connected;
                index
            }
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    state: SlotState::Connected,
                });
                (self.slots.len() - 1) as u32
            }
        };
        let id = SessionId {
            index,
            generation: self.slots[index as usize].generation,
        };
        self.order.push(id);
        id
    }

    /// Attach a player identity to a connection, dice at full strength.
    ///
    /// Never rejects a live connection: a repeated HELLO re-registers and
    /// resets the dice count, and duplicate names are allowed.
    ///
    /// # Errors
    ///
    /// [`SessionError::NotConnected`] if `id` is stale.
    pub fn register(&mut self, id: SessionId, name: &str) -> Result<(), SessionError> {
        let slot = self.live_slot_mut(id).ok_or(SessionError::NotConnected)?;
        slot.state = SlotState::Registered(Player {
            name: name.to_string(),
            dice_count: crate::STARTING_DICE,
        });
        Ok(())
    }

    /// Free a connection's slot. Idempotent: a stale id is a no-op.
    ///
    /// The caller is responsible for also dropping the id from the turn
    /// order and the round dice.
    pub fn unregister(&mut self, id: SessionId) {
        let Some(slot) = self.live_slot_mut(id) else {
            return;
        };
        slot.state = SlotState::Free;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        self.order.retain(|&o| o != id);
    }

    /// Whether the id refers to a live connection (registered or not).
    pub fn is_connected(&self, id: SessionId) -> bool {
        self.live_slot(id).is_some()
    }

    /// Look up a registered player.
    pub fn get(&self, id: SessionId) -> Option<&Player> {
        match &self.live_slot(id)?.state {
            SlotState::Registered(player) => Some(player),
            _ => None,
        }
    }

    /// Mutable lookup of a registered player.
    pub fn get_mut(&mut self, id: SessionId) -> Option<&mut Player> {
        match &mut self.live_slot_mut(id)?.state {
            SlotState::Registered(player) => Some(player),
            _ => None,
        }
    }

    /// Player name, if registered.
    pub fn name_of(&self, id: SessionId) -> Option<&str> {
        self.get(id).map(|p| p.name.as_str())
    }

    /// Earliest registered session carrying `name`.
    pub fn lookup_by_name(&self, name: &str) -> Option<SessionId> {
        self.players().find(|(_, p)| p.name == name).map(|(id, _)| id)
    }

    /// Registered players in registration order.
    pub fn players(&self) -> impl Iterator<Item = (SessionId, &Player)> {
        self.order.iter().filter_map(|&id| match &self.slot(id).state {
            SlotState::Registered(player) => Some((id, player)),
            _ => None,
        })
    }

    /// Number of registered players.
    pub fn player_count(&self) -> usize {
        self.players().count()
    }

    fn slot(&self, id: SessionId) -> &Slot {
        &self.slots[id.index as usize]
    }

    fn live_slot(&self, id: SessionId) -> Option<&Slot> {
        let slot = self.slots.get(id.index as usize)?;
        if slot.generation != id.generation || matches!(slot.state, SlotState::Free) {
            return None;
        }
        Some(slot)
    }

    fn live_slot_mut(&mut self, id: SessionId) -> Option<&mut Slot> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation || matches!(slot.state, SlotState::Free) {
            return None;
        }
        Some(slot)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connect_register_lookup() {
        let mut registry = SessionRegistry::new();
        let id = registry.connect();

        assert!(registry.is_connected(id));
        assert!(registry.get(id).is_none());

        registry.register(id, "Ana").unwrap();
        let player = registry.get(id).unwrap();
        assert_eq!(player.name, "Ana");
        assert_eq!(player.dice_count, crate::STARTING_DICE);
    }

    #[test]
    fn test_register_stale_id_fails() {
        let mut registry = SessionRegistry::new();
        let id = registry.connect();
        registry.unregister(id);

        assert_eq!(registry.register(id, "Ana"), Err(SessionError::NotConnected));
    }

    #[test]
    fn test_unregister_is_idempotent() {
        let mut registry = SessionRegistry::new();
        let id = registry.connect();
        registry.register(id, "Ana").unwrap();

        registry.unregister(id);
        registry.unregister(id);
        assert!(!registry.is_connected(id));
        assert_eq!(registry.player_count(), 0);
    }

    #[test]
    fn test_freed_id_never_aliases_reused_slot() {
        let mut registry = SessionRegistry::new();
        let old = registry.connect();
        registry.register(old, "Ana").unwrap();
        registry.unregister(old);

        // The slot index is reused, the generation is not.
        let new = registry.connect();
        registry.register(new, "Ben").unwrap();
        assert_ne!(old, new);

        assert!(registry.get(old).is_none());
        assert!(!registry.is_connected(old));
        assert_eq!(registry.get(new).unwrap().name, "Ben");
    }

    #[test]
    fn test_players_in_registration_order_across_removals() {
        let mut registry = SessionRegistry::new();
        let a = registry.connect();
        let b = registry.connect();
        let c = registry.connect();
        registry.register(a, "Ana").unwrap();
        registry.register(b, "Ben").unwrap();
        registry.register(c, "Cleo").unwrap();

        registry.unregister(a);
        let d = registry.connect();
        registry.register(d, "Dov").unwrap();

        // Dov reuses Ana's slot index but comes last in order.
        let names: Vec<&str> = registry.players().map(|(_, p)| p.name.as_str()).collect();
        assert_eq!(names, ["Ben", "Cleo", "Dov"]);
    }

    #[test]
    fn test_duplicate_names_resolve_to_earliest() {
        let mut registry = SessionRegistry::new();
        let a = registry.connect();
        let b = registry.connect();
        registry.register(a, "Ana").unwrap();
        registry.register(b, "Ana").unwrap();

        assert_eq!(registry.lookup_by_name("Ana"), Some(a));
        assert_eq!(registry.player_count(), 2);
    }

    #[test]
    fn test_repeated_hello_resets_dice() {
        let mut registry = SessionRegistry::new();
        let id = registry.connect();
        registry.register(id, "Ana").unwrap();
        registry.get_mut(id).unwrap().dice_count = 2;

        registry.register(id, "Anita").unwrap();
        let player = registry.get(id).unwrap();
        assert_eq!(player.name, "Anita");
        assert_eq!(player.dice_count, crate::STARTING_DICE);
    }

    #[test]
    fn test_unnamed_connection_not_listed() {
        let mut registry = SessionRegistry::new();
        let a = registry.connect();
        let _b = registry.connect();
        registry.register(a, "Ana").unwrap();

        assert_eq!(registry.player_count(), 1);
        assert_eq!(registry.lookup_by_name("Ben"), None);
    }
}
