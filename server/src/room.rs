//! Rooms and the registry that owns them
//!
//! A room pairs one `Game` with its membership: who sits on each side and
//! who is watching. Rooms are created on first join and dropped as soon as
//! both sides are empty.

use crate::game::Game;
use log::info;
use rand::Rng;
use shared::{Difficulty, Role, Side};
use std::collections::hash_map::Entry;
use std::collections::HashMap;

pub type RoomId = String;
pub type ClientId = u32;

const ROOM_CODE_LEN: usize = 6;
const ROOM_CODE_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct SideSlots {
    left: Option<ClientId>,
    right: Option<ClientId>,
}

impl SideSlots {
    fn get(&self, side: Side) -> Option<ClientId> {
        match side {
            Side::Left => self.left,
            Side::Right => self.right,
        }
    }

    fn slot(&mut self, side: Side) -> &mut Option<ClientId> {
        match side {
            Side::Left => &mut self.left,
            Side::Right => &mut self.right,
        }
    }
}

#[derive(Debug)]
pub struct Room {
    id: RoomId,
    pub game: Game,
    sides: SideSlots,
    players: HashMap<ClientId, Role>,
    /// Identifies the live power-up cycle; `None` once cancelled.
    powerup_epoch: Option<u64>,
}

impl Room {
    pub fn new(id: RoomId, game: Game) -> Self {
        Self {
            id,
            game,
            sides: SideSlots::default(),
            players: HashMap::new(),
            powerup_epoch: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Seats a client: left first, then right, otherwise spectator.
    /// A client already in the room keeps its role.
    pub fn assign(&mut self, client_id: ClientId) -> Role {
        if let Some(role) = self.players.get(&client_id) {
            return *role;
        }

        let vacant = [Side::Left, Side::Right]
            .into_iter()
            .find(|side| self.sides.get(*side).is_none());
        let role = match vacant {
            Some(side) => {
                *self.sides.slot(side) = Some(client_id);
                Role::from(side)
            }
            None => Role::Spectator,
        };

        self.players.insert(client_id, role);
        role
    }

    /// Removes a client and frees its side. Returns the role it held.
    pub fn release(&mut self, client_id: ClientId) -> Option<Role> {
        let role = self.players.remove(&client_id)?;
        if let Some(side) = role.side() {
            let slot = self.sides.slot(side);
            if *slot == Some(client_id) {
                *slot = None;
            }
        }
        Some(role)
    }

    pub fn role_of(&self, client_id: ClientId) -> Option<Role> {
        self.players.get(&client_id).copied()
    }

    pub fn occupant(&self, side: Side) -> Option<ClientId> {
        self.sides.get(side)
    }

    /// True while at least one side is taken. Spectators alone don't count.
    pub fn has_players(&self) -> bool {
        self.sides.left.is_some() || self.sides.right.is_some()
    }

    /// Every connection that should receive room broadcasts.
    pub fn members(&self) -> Vec<ClientId> {
        self.players.keys().copied().collect()
    }

    pub fn member_count(&self) -> usize {
        self.players.len()
    }

    pub fn powerup_epoch(&self) -> Option<u64> {
        self.powerup_epoch
    }

    pub fn arm_powerups(&mut self, epoch: u64) {
        self.powerup_epoch = Some(epoch);
    }

    pub fn disarm_powerups(&mut self) {
        self.powerup_epoch = None;
    }
}

/// Owns every live room, keyed by room code.
#[derive(Debug, Default)]
pub struct RoomRegistry {
    rooms: HashMap<RoomId, Room>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<&Room> {
        self.rooms.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Room> {
        self.rooms.get_mut(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.rooms.contains_key(id)
    }

    /// Returns the room, creating it with a fresh game if it doesn't exist.
    /// The flag tells whether it was just created; settings of an existing
    /// room are never changed.
    pub fn get_or_create(
        &mut self,
        id: RoomId,
        win_score: u32,
        difficulty: Difficulty,
    ) -> (&mut Room, bool) {
        match self.rooms.entry(id) {
            Entry::Occupied(entry) => (entry.into_mut(), false),
            Entry::Vacant(entry) => {
                let game = Game::new(win_score, difficulty);
                info!(
                    "Created room {} ({}, first to {})",
                    entry.key(),
                    difficulty.label(),
                    game.win_score()
                );
                let room = Room::new(entry.key().clone(), game);
                (entry.insert(room), true)
            }
        }
    }

    pub fn remove(&mut self, id: &str) -> Option<Room> {
        let room = self.rooms.remove(id);
        if room.is_some() {
            info!("Removed room {}", id);
        }
        room
    }

    /// Random lowercase base-36 code not currently in use.
    pub fn generate_room_id(&self) -> RoomId {
        let mut rng = rand::thread_rng();
        loop {
            let code: String = (0..ROOM_CODE_LEN)
                .map(|_| ROOM_CODE_ALPHABET[rng.gen_range(0..ROOM_CODE_ALPHABET.len())] as char)
                .collect();
            if !self.rooms.contains_key(&code) {
                return code;
            }
        }
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Room> {
        self.rooms.values_mut()
    }

    pub fn ids(&self) -> Vec<RoomId> {
        self.rooms.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_room() -> Room {
        Room::new("room1".to_string(), Game::with_seed(10, Difficulty::Medium, 1))
    }

    #[test]
    fn test_assign_order() {
        let mut room = test_room();

        assert_eq!(room.assign(1), Role::Left);
        assert_eq!(room.assign(2), Role::Right);
        assert_eq!(room.assign(3), Role::Spectator);
        assert_eq!(room.assign(4), Role::Spectator);

        assert_eq!(room.occupant(Side::Left), Some(1));
        assert_eq!(room.occupant(Side::Right), Some(2));
        assert_eq!(room.member_count(), 4);
    }

    #[test]
    fn test_assign_is_idempotent() {
        let mut room = test_room();

        assert_eq!(room.assign(1), Role::Left);
        assert_eq!(room.assign(1), Role::Left);
        assert_eq!(room.occupant(Side::Right), None);
        assert_eq!(room.member_count(), 1);
    }

    #[test]
    fn test_release_frees_side() {
        let mut room = test_room();
        room.assign(1);
        room.assign(2);
        room.assign(3);

        assert_eq!(room.release(1), Some(Role::Left));
        assert_eq!(room.occupant(Side::Left), None);
        assert!(room.has_players());

        // Next joiner takes the vacated left side, not spectator.
        assert_eq!(room.assign(4), Role::Left);
        assert_eq!(room.role_of(3), Some(Role::Spectator));
    }

    #[test]
    fn test_spectators_do_not_keep_room_alive() {
        let mut room = test_room();
        room.assign(1);
        room.assign(2);
        room.assign(3);

        room.release(1);
        room.release(2);

        assert!(!room.has_players());
        assert_eq!(room.members(), vec![3]);
    }

    #[test]
    fn test_release_unknown_client() {
        let mut room = test_room();
        room.assign(1);

        assert_eq!(room.release(99), None);
        assert_eq!(room.occupant(Side::Left), Some(1));
    }

    #[test]
    fn test_powerup_epoch_arming() {
        let mut room = test_room();
        assert_eq!(room.powerup_epoch(), None);

        room.arm_powerups(7);
        assert_eq!(room.powerup_epoch(), Some(7));

        room.disarm_powerups();
        assert_eq!(room.powerup_epoch(), None);
    }

    #[test]
    fn test_registry_create_and_remove() {
        let mut registry = RoomRegistry::new();
        assert!(registry.is_empty());

        let (room, created) = registry.get_or_create("abc".to_string(), 3, Difficulty::Hard);
        assert!(created);
        assert_eq!(room.id(), "abc");
        assert_eq!(room.game.win_score(), 3);
        assert_eq!(room.game.difficulty(), Difficulty::Hard);

        let (room, created) = registry.get_or_create("abc".to_string(), 5, Difficulty::Easy);
        assert!(!created);
        assert_eq!(room.game.win_score(), 3);

        assert!(registry.contains("abc"));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.ids(), vec!["abc".to_string()]);

        assert!(registry.remove("abc").is_some());
        assert!(registry.remove("abc").is_none());
        assert!(registry.get("abc").is_none());
    }

    #[test]
    fn test_generated_room_ids() {
        let mut registry = RoomRegistry::new();
        for _ in 0..50 {
            let id = registry.generate_room_id();
            assert_eq!(id.len(), ROOM_CODE_LEN);
            assert!(id
                .chars()
                .all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
            assert!(!registry.contains(&id));
            registry.get_or_create(id, 10, Difficulty::Medium);
        }
        assert_eq!(registry.len(), 50);
    }
}
