//! Authoritative per-room game engine
//!
//! One `Game` owns the physics state of a single room: ball, paddles, scores,
//! power-up flags and the Playing/Paused/Finished phase. The engine never
//! performs I/O; `step` reports what happened during a tick and the caller
//! turns that into broadcasts.

use log::info;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use shared::{
    BallSnapshot, Difficulty, DifficultyProfile, GameSnapshot, PaddlePositions, Scores, Side,
    VisualEvent, BIG_PADDLE_FACTOR, CANVAS_HEIGHT, CANVAS_WIDTH, DEFAULT_WIN_SCORE,
    LEFT_PADDLE_EDGE, RIGHT_PADDLE_EDGE, SPEEDUP_FACTOR, SPEEDUP_INTERVAL_MS,
};
use std::time::{Duration, Instant};

const SPEEDUP_INTERVAL: Duration = Duration::from_millis(SPEEDUP_INTERVAL_MS);

/// Difference between horizontal and vertical serve speed.
const SERVE_VERTICAL_OFFSET: f32 = 1.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GamePhase {
    Playing,
    Paused,
    Finished,
}

/// Axis-aligned square ball. `x`/`y` is the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ball {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub size: f32,
}

impl Ball {
    fn centered(size: f32, vx: f32, vy: f32) -> Self {
        Self {
            x: CANVAS_WIDTH / 2.0 - size / 2.0,
            y: CANVAS_HEIGHT / 2.0 - size / 2.0,
            vx,
            vy,
            size,
        }
    }

    pub fn left(&self) -> f32 {
        self.x
    }

    pub fn right(&self) -> f32 {
        self.x + self.size
    }

    pub fn top(&self) -> f32 {
        self.y
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.size
    }

    fn overlaps_vertically(&self, top: f32, height: f32) -> bool {
        self.bottom() >= top && self.top() <= top + height
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PowerupFlags {
    pub left: bool,
    pub right: bool,
}

impl PowerupFlags {
    pub fn get(&self, side: Side) -> bool {
        match side {
            Side::Left => self.left,
            Side::Right => self.right,
        }
    }

    pub fn set(&mut self, side: Side, active: bool) {
        match side {
            Side::Left => self.left = active,
            Side::Right => self.right = active,
        }
    }
}

/// Result of advancing a room by one tick.
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    /// Paused or finished; nothing moved.
    Frozen,
    Advanced { events: Vec<VisualEvent> },
    /// This tick ended the match.
    Finished {
        winner: Side,
        events: Vec<VisualEvent>,
    },
}

#[derive(Debug, Clone)]
pub struct Game {
    difficulty: Difficulty,
    win_score: u32,
    profile: DifficultyProfile,
    pub ball: Ball,
    pub paddles: PaddlePositions,
    pub scores: Scores,
    powerups: PowerupFlags,
    paused: bool,
    game_over: bool,
    last_speedup: Option<Instant>,
    rng: StdRng,
}

fn random_sign(rng: &mut StdRng) -> f32 {
    if rng.gen_bool(0.5) {
        1.0
    } else {
        -1.0
    }
}

impl Game {
    /// Creates a fresh match. A `win_score` of zero selects the default.
    pub fn new(win_score: u32, difficulty: Difficulty) -> Self {
        Self::with_rng(win_score, difficulty, StdRng::from_entropy())
    }

    /// Same as `new` but with reproducible serves and bounces.
    pub fn with_seed(win_score: u32, difficulty: Difficulty, seed: u64) -> Self {
        Self::with_rng(win_score, difficulty, StdRng::seed_from_u64(seed))
    }

    fn with_rng(win_score: u32, difficulty: Difficulty, mut rng: StdRng) -> Self {
        let win_score = if win_score == 0 {
            DEFAULT_WIN_SCORE
        } else {
            win_score
        };
        let profile = difficulty.profile();
        let paddle_y = CANVAS_HEIGHT / 2.0 - profile.paddle_height / 2.0;

        let vx = profile.ball_speed * random_sign(&mut rng);
        let vy = (profile.ball_speed - SERVE_VERTICAL_OFFSET) * random_sign(&mut rng);

        Self {
            difficulty,
            win_score,
            profile,
            ball: Ball::centered(profile.ball_size, vx, vy),
            paddles: PaddlePositions {
                left: paddle_y,
                right: paddle_y,
            },
            scores: Scores::default(),
            powerups: PowerupFlags::default(),
            paused: false,
            game_over: false,
            last_speedup: None,
            rng,
        }
    }

    /// Discards the match and starts over with the same win score and difficulty.
    pub fn restart(&mut self) {
        let rng = StdRng::seed_from_u64(self.rng.gen());
        *self = Self::with_rng(self.win_score, self.difficulty, rng);
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn win_score(&self) -> u32 {
        self.win_score
    }

    pub fn profile(&self) -> DifficultyProfile {
        self.profile
    }

    pub fn powerups(&self) -> PowerupFlags {
        self.powerups
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn is_game_over(&self) -> bool {
        self.game_over
    }

    pub fn last_speedup(&self) -> Option<Instant> {
        self.last_speedup
    }

    pub fn phase(&self) -> GamePhase {
        if self.game_over {
            GamePhase::Finished
        } else if self.paused {
            GamePhase::Paused
        } else {
            GamePhase::Playing
        }
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    /// The side that reached the win score, if any.
    pub fn winner(&self) -> Option<Side> {
        if self.scores.left >= self.win_score {
            Some(Side::Left)
        } else if self.scores.right >= self.win_score {
            Some(Side::Right)
        } else {
            None
        }
    }

    pub fn effective_paddle_height(&self, side: Side) -> f32 {
        if self.powerups.get(side) {
            self.profile.paddle_height * BIG_PADDLE_FACTOR
        } else {
            self.profile.paddle_height
        }
    }

    /// Moves a paddle, clamped to the canvas for its current height.
    /// Returns the stored offset.
    pub fn move_paddle(&mut self, side: Side, y: f32) -> f32 {
        let max_y = CANVAS_HEIGHT - self.effective_paddle_height(side);
        let clamped = y.min(max_y).max(0.0);
        self.paddles.set(side, clamped);
        clamped
    }

    pub fn activate_powerup(&mut self, side: Side) {
        self.powerups.set(side, true);
    }

    /// Enlarges a paddle chosen uniformly at random and returns its side.
    pub fn activate_random_powerup(&mut self) -> Side {
        let side = if self.rng.gen_bool(0.5) {
            Side::Left
        } else {
            Side::Right
        };
        self.activate_powerup(side);
        side
    }

    pub fn clear_powerup(&mut self, side: Side) {
        self.powerups.set(side, false);
    }

    pub fn clear_powerups(&mut self) {
        self.powerups = PowerupFlags::default();
    }

    /// Advances the match by one tick.
    ///
    /// Order matters: move, walls, left paddle, right paddle, scoring,
    /// speed ramp, win check.
    pub fn step(&mut self, now: Instant) -> StepOutcome {
        if self.phase() != GamePhase::Playing {
            return StepOutcome::Frozen;
        }

        let mut events = Vec::new();

        self.ball.x += self.ball.vx;
        self.ball.y += self.ball.vy;

        self.bounce_off_walls(&mut events);
        self.bounce_off_paddle(Side::Left, &mut events);
        self.bounce_off_paddle(Side::Right, &mut events);
        self.check_scoring(&mut events);
        self.apply_speedup(now);

        if let Some(winner) = self.winner() {
            self.game_over = true;
            self.clear_powerups();
            info!(
                "Match over: {} wins {}-{}",
                winner, self.scores.left, self.scores.right
            );
            return StepOutcome::Finished { winner, events };
        }

        StepOutcome::Advanced { events }
    }

    fn bounce_off_walls(&mut self, events: &mut Vec<VisualEvent>) {
        // A ball resting against a wall with no vertical speed is not a bounce.
        if self.ball.top() <= 0.0 {
            let hit = self.ball.top() < 0.0 || self.ball.vy < 0.0;
            self.ball.y = 0.0;
            self.ball.vy = self.ball.vy.abs();
            if hit {
                events.push(VisualEvent::Bounce);
            }
        } else if self.ball.bottom() >= CANVAS_HEIGHT {
            let hit = self.ball.bottom() > CANVAS_HEIGHT || self.ball.vy > 0.0;
            self.ball.y = CANVAS_HEIGHT - self.ball.size;
            self.ball.vy = -self.ball.vy.abs();
            if hit {
                events.push(VisualEvent::Bounce);
            }
        }
    }

    fn bounce_off_paddle(&mut self, side: Side, events: &mut Vec<VisualEvent>) {
        let top = self.paddles.get(side);
        let height = self.effective_paddle_height(side);
        if !self.ball.overlaps_vertically(top, height) {
            return;
        }

        let hit = match side {
            Side::Left => self.ball.left() <= LEFT_PADDLE_EDGE,
            Side::Right => self.ball.right() >= RIGHT_PADDLE_EDGE,
        };
        if !hit {
            return;
        }

        self.ball.vx = -self.ball.vx;
        self.ball.x = match side {
            Side::Left => LEFT_PADDLE_EDGE,
            Side::Right => RIGHT_PADDLE_EDGE - self.ball.size,
        };
        self.ball.vy += self.rng.gen_range(-1.0..=1.0);
        events.push(VisualEvent::Bounce);
    }

    fn check_scoring(&mut self, events: &mut Vec<VisualEvent>) {
        if self.ball.left() < 0.0 {
            self.award_point(Side::Right, events);
        }
        if self.ball.right() > CANVAS_WIDTH {
            self.award_point(Side::Left, events);
        }
    }

    fn award_point(&mut self, scorer: Side, events: &mut Vec<VisualEvent>) {
        self.scores.award(scorer);
        events.push(VisualEvent::Score);
        self.reset_ball(scorer.opposite());
    }

    /// Re-serves from the centre toward `toward`.
    fn reset_ball(&mut self, toward: Side) {
        let direction = match toward {
            Side::Left => -1.0,
            Side::Right => 1.0,
        };
        let speed = self.profile.ball_speed;
        let vy = (speed - SERVE_VERTICAL_OFFSET) * random_sign(&mut self.rng);
        self.ball = Ball::centered(self.profile.ball_size, speed * direction, vy);
    }

    // No cap: velocity keeps compounding for the life of the match.
    fn apply_speedup(&mut self, now: Instant) {
        let due = match self.last_speedup {
            None => true,
            Some(last) => now.saturating_duration_since(last) >= SPEEDUP_INTERVAL,
        };
        if due {
            self.ball.vx *= SPEEDUP_FACTOR;
            self.ball.vy *= SPEEDUP_FACTOR;
            self.last_speedup = Some(now);
        }
    }

    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            ball: BallSnapshot {
                x: self.ball.x,
                y: self.ball.y,
                size: self.ball.size,
            },
            paddles: self.paddles,
            scores: self.scores,
            win_score: self.win_score,
            difficulty: self.difficulty,
            big_paddle_left: self.powerups.left,
            big_paddle_right: self.powerups.right,
        }
    }
}
