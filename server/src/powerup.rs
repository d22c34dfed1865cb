//! Per-room power-up cycle
//!
//! Every room gets a recurring timer that enlarges a random paddle for a
//! short window. Timers carry the epoch of the cycle that scheduled them;
//! restarting or cancelling a room's cycle changes its epoch, so timers left
//! over from an earlier cycle are dropped instead of touching the new game.

use crate::game::GamePhase;
use crate::room::{Room, RoomId, RoomRegistry};
use crate::scheduler::TimerQueue;
use log::debug;
use shared::{Side, VisualEvent, POWERUP_DURATION_MS, POWERUP_PERIOD_MS};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    /// Periodic firing that may enlarge a paddle.
    Fire,
    /// Shrinks a paddle back once its window ends.
    Clear(Side),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PowerupTimer {
    pub room: RoomId,
    pub epoch: u64,
    pub kind: TimerKind,
}

#[derive(Debug)]
pub struct PowerupScheduler {
    timers: TimerQueue<PowerupTimer>,
    period: Duration,
    duration: Duration,
    next_epoch: u64,
}

impl Default for PowerupScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl PowerupScheduler {
    pub fn new() -> Self {
        Self::with_timing(
            Duration::from_millis(POWERUP_PERIOD_MS),
            Duration::from_millis(POWERUP_DURATION_MS),
        )
    }

    pub fn with_timing(period: Duration, duration: Duration) -> Self {
        Self {
            timers: TimerQueue::new(),
            period,
            duration,
            next_epoch: 0,
        }
    }

    /// Starts a new cycle for `room`, superseding any earlier one. The first
    /// firing is one period after `now`. Returns the cycle's epoch.
    pub fn start(&mut self, room: &mut Room, now: Instant) -> u64 {
        self.next_epoch += 1;
        let epoch = self.next_epoch;
        room.arm_powerups(epoch);
        self.timers.schedule(
            now + self.period,
            PowerupTimer {
                room: room.id().to_string(),
                epoch,
                kind: TimerKind::Fire,
            },
        );
        epoch
    }

    /// Drops every pending timer for `room`, whatever its epoch.
    pub fn cancel(&mut self, room: &str) -> usize {
        self.timers.cancel(|timer| timer.room == room)
    }

    pub fn pending(&self) -> usize {
        self.timers.len()
    }

    /// Runs every timer due at `now` and returns the notifications to broadcast.
    pub fn poll(&mut self, now: Instant, rooms: &mut RoomRegistry) -> Vec<(RoomId, VisualEvent)> {
        let mut fired = Vec::new();

        while let Some((deadline, timer)) = self.timers.pop_due(now) {
            let Some(room) = rooms.get_mut(&timer.room) else {
                debug!("Dropping power-up timer for closed room {}", timer.room);
                continue;
            };
            if room.powerup_epoch() != Some(timer.epoch) {
                debug!("Dropping stale power-up timer for room {}", timer.room);
                continue;
            }

            match timer.kind {
                TimerKind::Fire => {
                    self.timers.schedule(
                        deadline + self.period,
                        PowerupTimer {
                            kind: TimerKind::Fire,
                            ..timer.clone()
                        },
                    );

                    // The cycle keeps ticking while paused but skips the firing.
                    if room.game.phase() != GamePhase::Playing {
                        continue;
                    }

                    let side = room.game.activate_random_powerup();
                    debug!("Room {}: big paddle on {} side", timer.room, side);
                    self.timers.schedule(
                        deadline + self.duration,
                        PowerupTimer {
                            kind: TimerKind::Clear(side),
                            ..timer.clone()
                        },
                    );
                    fired.push((timer.room, VisualEvent::BigPaddle));
                }
                TimerKind::Clear(side) => {
                    room.game.clear_powerup(side);
                }
            }
        }

        fired
    }
}
