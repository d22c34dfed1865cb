//! Room membership and the per-tick update of every room
//!
//! The lobby is the single owner of all room state. Client requests and the
//! tick driver both call into it from the same task, so a paddle move that
//! lands between two ticks is always visible in the next broadcast.
//!
//! Nothing here touches the network. Every operation writes the messages it
//! wants delivered into an [`Outbox`] and the transport resolves recipients.

use crate::error::LobbyError;
use crate::game::StepOutcome;
use crate::powerup::PowerupScheduler;
use crate::room::{ClientId, Room, RoomId, RoomRegistry};
use log::{debug, info};
use shared::{Difficulty, Packet, Role, VisualEvent, DEFAULT_WIN_SCORE};
use std::collections::HashMap;
use std::time::Instant;

/// Message addressed either to one connection or to a whole room.
#[derive(Debug, Clone)]
pub enum Outbound {
    ToClient { client_id: ClientId, packet: Packet },
    ToRoom { room: RoomId, packet: Packet },
}

/// Messages produced by lobby operations, in emission order.
#[derive(Debug, Default)]
pub struct Outbox {
    messages: Vec<Outbound>,
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn send(&mut self, client_id: ClientId, packet: Packet) {
        self.messages.push(Outbound::ToClient { client_id, packet });
    }

    pub fn broadcast(&mut self, room: &str, packet: Packet) {
        self.messages.push(Outbound::ToRoom {
            room: room.to_string(),
            packet,
        });
    }

    pub fn drain(&mut self) -> std::vec::Drain<'_, Outbound> {
        self.messages.drain(..)
    }

    pub fn messages(&self) -> &[Outbound] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct JoinRequest {
    pub room: Option<String>,
    pub win_score: Option<u32>,
    pub difficulty: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinAck {
    pub room: RoomId,
    pub role: Role,
    pub created: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Departure {
    pub room: RoomId,
    pub role: Role,
    /// Both sides were empty afterwards, so the room was deleted.
    pub room_closed: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub rooms: usize,
    pub advanced: usize,
    pub finished: usize,
}

#[derive(Debug, Default)]
pub struct Lobby {
    rooms: RoomRegistry,
    powerups: PowerupScheduler,
    memberships: HashMap<ClientId, RoomId>,
}

impl Lobby {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lobby with custom power-up timing, mostly for tests.
    pub fn with_powerups(powerups: PowerupScheduler) -> Self {
        Self {
            powerups,
            ..Self::default()
        }
    }

    /// Puts a client into a room, creating the room if needed.
    ///
    /// The client gets its role and one immediate snapshot. A client already
    /// seated elsewhere leaves that room first.
    pub fn join(
        &mut self,
        client_id: ClientId,
        request: JoinRequest,
        now: Instant,
        outbox: &mut Outbox,
    ) -> JoinAck {
        let room_id = match request.room {
            Some(room) if !room.is_empty() => room,
            _ => self.rooms.generate_room_id(),
        };

        if self
            .memberships
            .get(&client_id)
            .is_some_and(|current| *current != room_id)
        {
            if let Some(departure) = self.disconnect(client_id) {
                debug!(
                    "Client {} switched from room {} to {}",
                    client_id, departure.room, room_id
                );
            }
        }

        let difficulty = request
            .difficulty
            .as_deref()
            .map(Difficulty::from_label)
            .unwrap_or_default();
        let win_score = request.win_score.unwrap_or(DEFAULT_WIN_SCORE);

        let (room, created) = self.rooms.get_or_create(room_id.clone(), win_score, difficulty);
        if created {
            self.powerups.start(room, now);
        }
        let role = room.assign(client_id);
        let snapshot = room.game.snapshot();
        self.memberships.insert(client_id, room_id.clone());

        info!("Client {} joined room {} as {}", client_id, room_id, role);

        outbox.send(
            client_id,
            Packet::PlayerType {
                room: room_id.clone(),
                role,
            },
        );
        outbox.send(client_id, Packet::GameState(snapshot));

        JoinAck {
            room: room_id,
            role,
            created,
        }
    }

    /// Moves the caller's paddle. Returns the clamped offset that was stored.
    pub fn paddle_move(
        &mut self,
        client_id: ClientId,
        room_id: &str,
        y: f32,
    ) -> Result<f32, LobbyError> {
        if y.is_nan() {
            return Err(LobbyError::InvalidPosition);
        }
        let room = self.room_mut(room_id)?;
        let role = room.role_of(client_id).ok_or_else(|| LobbyError::NotInRoom {
            client_id,
            room: room_id.to_string(),
        })?;
        let side = role.side().ok_or(LobbyError::Spectator(client_id))?;
        Ok(room.game.move_paddle(side, y))
    }

    pub fn toggle_pause(
        &mut self,
        room_id: &str,
        paused: bool,
        outbox: &mut Outbox,
    ) -> Result<(), LobbyError> {
        self.room_mut(room_id)?.game.set_paused(paused);
        info!(
            "Room {} {}",
            room_id,
            if paused { "paused" } else { "resumed" }
        );
        outbox.broadcast(room_id, Packet::PauseState { paused });
        Ok(())
    }

    /// Throws the match away and starts a fresh one with the same settings.
    /// Seats and spectators are kept. A paused room comes back unpaused.
    pub fn restart(
        &mut self,
        room_id: &str,
        now: Instant,
        outbox: &mut Outbox,
    ) -> Result<(), LobbyError> {
        let room = self
            .rooms
            .get_mut(room_id)
            .ok_or_else(|| LobbyError::UnknownRoom(room_id.to_string()))?;
        let was_paused = room.game.is_paused();
        room.game.restart();
        self.powerups.cancel(room_id);
        self.powerups.start(room, now);
        info!("Room {} restarted", room_id);

        if was_paused {
            outbox.broadcast(room_id, Packet::PauseState { paused: false });
        }
        Ok(())
    }

    /// Forgets a client. Deletes its room once neither side is occupied.
    pub fn disconnect(&mut self, client_id: ClientId) -> Option<Departure> {
        let room_id = self.memberships.remove(&client_id)?;
        let room = self.rooms.get_mut(&room_id)?;
        let role = room.release(client_id)?;
        debug!("Client {} left room {} ({})", client_id, room_id, role);

        let room_closed = !room.has_players();
        if room_closed {
            self.powerups.cancel(&room_id);
            self.rooms.remove(&room_id);
            self.memberships.retain(|_, room| *room != room_id);
        }

        Some(Departure {
            room: room_id,
            role,
            room_closed,
        })
    }

    /// One broadcast-scheduler tick: due power-up timers first, then physics
    /// and a snapshot for every room that is still playing.
    pub fn tick(&mut self, now: Instant, outbox: &mut Outbox) -> TickReport {
        for (room_id, event) in self.powerups.poll(now, &mut self.rooms) {
            outbox.broadcast(&room_id, Packet::Visual(event));
        }

        let mut report = TickReport {
            rooms: self.rooms.len(),
            ..TickReport::default()
        };
        let mut finished = Vec::new();

        for room in self.rooms.iter_mut() {
            match room.game.step(now) {
                StepOutcome::Frozen => {}
                StepOutcome::Advanced { events } => {
                    report.advanced += 1;
                    broadcast_events(outbox, room, &events);
                    outbox.broadcast(room.id(), Packet::GameState(room.game.snapshot()));
                }
                StepOutcome::Finished { winner, events } => {
                    report.advanced += 1;
                    report.finished += 1;
                    info!("Room {} finished, {} side wins", room.id(), winner);
                    broadcast_events(outbox, room, &events);
                    outbox.broadcast(room.id(), Packet::GameState(room.game.snapshot()));
                    outbox.broadcast(room.id(), Packet::Visual(VisualEvent::Score));
                    room.disarm_powerups();
                    finished.push(room.id().to_string());
                }
            }
        }

        for room_id in finished {
            self.powerups.cancel(&room_id);
        }

        report
    }

    pub fn room(&self, room_id: &str) -> Option<&Room> {
        self.rooms.get(room_id)
    }

    pub fn room_mut(&mut self, room_id: &str) -> Result<&mut Room, LobbyError> {
        self.rooms
            .get_mut(room_id)
            .ok_or_else(|| LobbyError::UnknownRoom(room_id.to_string()))
    }

    pub fn room_of(&self, client_id: ClientId) -> Option<&RoomId> {
        self.memberships.get(&client_id)
    }

    /// Connections that receive broadcasts for `room_id`.
    pub fn room_members(&self, room_id: &str) -> Vec<ClientId> {
        self.rooms
            .get(room_id)
            .map(Room::members)
            .unwrap_or_default()
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    pub fn pending_timers(&self) -> usize {
        self.powerups.pending()
    }
}

fn broadcast_events(outbox: &mut Outbox, room: &Room, events: &[VisualEvent]) {
    for event in events {
        outbox.broadcast(room.id(), Packet::Visual(*event));
    }
}
