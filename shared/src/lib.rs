use serde::{Deserialize, Serialize};
use std::fmt;

pub const CANVAS_WIDTH: f32 = 800.0;
pub const CANVAS_HEIGHT: f32 = 500.0;
pub const PADDLE_OFFSET: f32 = 20.0;
pub const PADDLE_WIDTH: f32 = 15.0;
pub const BIG_PADDLE_FACTOR: f32 = 1.8;
pub const DEFAULT_WIN_SCORE: u32 = 10;
pub const SPEEDUP_FACTOR: f32 = 1.10;
pub const SPEEDUP_INTERVAL_MS: u64 = 10_000;
pub const POWERUP_PERIOD_MS: u64 = 30_000;
pub const POWERUP_DURATION_MS: u64 = 5_000;

/// Inner edge of the left paddle band.
pub const LEFT_PADDLE_EDGE: f32 = PADDLE_OFFSET + PADDLE_WIDTH;
/// Inner edge of the right paddle band.
pub const RIGHT_PADDLE_EDGE: f32 = CANVAS_WIDTH - PADDLE_OFFSET - PADDLE_WIDTH;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn opposite(self) -> Side {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Left => write!(f, "left"),
            Side::Right => write!(f, "right"),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Left,
    Right,
    Spectator,
}

impl Role {
    /// The paddle this role controls, if any.
    pub fn side(self) -> Option<Side> {
        match self {
            Role::Left => Some(Side::Left),
            Role::Right => Some(Side::Right),
            Role::Spectator => None,
        }
    }
}

impl From<Side> for Role {
    fn from(side: Side) -> Self {
        match side {
            Side::Left => Role::Left,
            Side::Right => Role::Right,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Left => write!(f, "left"),
            Role::Right => write!(f, "right"),
            Role::Spectator => write!(f, "spectator"),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

/// Per-room tuning derived once from the difficulty.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct DifficultyProfile {
    pub paddle_height: f32,
    pub ball_speed: f32,
    pub ball_size: f32,
}

impl Difficulty {
    /// Resolves a client-supplied label. Anything unrecognised is medium.
    pub fn from_label(label: &str) -> Difficulty {
        match label {
            "easy" => Difficulty::Easy,
            "hard" => Difficulty::Hard,
            _ => Difficulty::Medium,
        }
    }

    pub fn profile(self) -> DifficultyProfile {
        match self {
            Difficulty::Easy => DifficultyProfile {
                paddle_height: 125.0,
                ball_speed: 4.0,
                ball_size: 18.0,
            },
            Difficulty::Medium => DifficultyProfile {
                paddle_height: 100.0,
                ball_speed: 5.5,
                ball_size: 14.0,
            },
            Difficulty::Hard => DifficultyProfile {
                paddle_height: 60.0,
                ball_speed: 7.0,
                ball_size: 10.0,
            },
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

/// Fire-and-forget presentation cue.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum VisualEvent {
    Bounce,
    Score,
    BigPaddle,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct BallSnapshot {
    pub x: f32,
    pub y: f32,
    pub size: f32,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct PaddlePositions {
    pub left: f32,
    pub right: f32,
}

impl PaddlePositions {
    pub fn get(&self, side: Side) -> f32 {
        match side {
            Side::Left => self.left,
            Side::Right => self.right,
        }
    }

    pub fn set(&mut self, side: Side, y: f32) {
        match side {
            Side::Left => self.left = y,
            Side::Right => self.right = y,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
pub struct Scores {
    pub left: u32,
    pub right: u32,
}

impl Scores {
    pub fn get(&self, side: Side) -> u32 {
        match side {
            Side::Left => self.left,
            Side::Right => self.right,
        }
    }

    pub fn award(&mut self, side: Side) {
        match side {
            Side::Left => self.left += 1,
            Side::Right => self.right += 1,
        }
    }
}

/// Authoritative room state as broadcast every tick.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct GameSnapshot {
    pub ball: BallSnapshot,
    pub paddles: PaddlePositions,
    pub scores: Scores,
    pub win_score: u32,
    pub difficulty: Difficulty,
    pub big_paddle_left: bool,
    pub big_paddle_right: bool,
}

impl GameSnapshot {
    /// Paddle height a renderer should draw for `side`.
    pub fn paddle_height(&self, side: Side) -> f32 {
        let base = self.difficulty.profile().paddle_height;
        let big = match side {
            Side::Left => self.big_paddle_left,
            Side::Right => self.big_paddle_right,
        };
        if big {
            base * BIG_PADDLE_FACTOR
        } else {
            base
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub enum Packet {
    JoinRoom {
        room: Option<String>,
        win_score: Option<u32>,
        difficulty: Option<String>,
    },
    PaddleMove {
        room: String,
        y: f32,
    },
    TogglePause {
        room: String,
        paused: bool,
    },
    RestartGame {
        room: String,
    },
    Heartbeat,
    Disconnect,

    PlayerType {
        room: String,
        role: Role,
    },
    GameState(GameSnapshot),
    Visual(VisualEvent),
    PauseState {
        paused: bool,
    },
    Disconnected {
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    fn sample_snapshot() -> GameSnapshot {
        GameSnapshot {
            ball: BallSnapshot {
                x: 393.0,
                y: 243.0,
                size: 14.0,
            },
            paddles: PaddlePositions {
                left: 200.0,
                right: 120.5,
            },
            scores: Scores { left: 3, right: 7 },
            win_score: 10,
            difficulty: Difficulty::Medium,
            big_paddle_left: false,
            big_paddle_right: true,
        }
    }

    #[test]
    fn test_difficulty_profiles() {
        let easy = Difficulty::Easy.profile();
        assert_eq!(easy.paddle_height, 125.0);
        assert_eq!(easy.ball_speed, 4.0);
        assert_eq!(easy.ball_size, 18.0);

        let medium = Difficulty::Medium.profile();
        assert_eq!(medium.paddle_height, 100.0);
        assert_eq!(medium.ball_speed, 5.5);
        assert_eq!(medium.ball_size, 14.0);

        let hard = Difficulty::Hard.profile();
        assert_eq!(hard.paddle_height, 60.0);
        assert_eq!(hard.ball_speed, 7.0);
        assert_eq!(hard.ball_size, 10.0);
    }

    #[test]
    fn test_difficulty_label_fallback() {
        assert_eq!(Difficulty::from_label("easy"), Difficulty::Easy);
        assert_eq!(Difficulty::from_label("hard"), Difficulty::Hard);
        assert_eq!(Difficulty::from_label("medium"), Difficulty::Medium);
        assert_eq!(Difficulty::from_label(""), Difficulty::Medium);
        assert_eq!(Difficulty::from_label("HARD"), Difficulty::Medium);
        assert_eq!(Difficulty::from_label("nightmare"), Difficulty::Medium);
        assert_eq!(Difficulty::default(), Difficulty::Medium);
    }

    #[test]
    fn test_difficulty_label_matches_resolver() {
        for difficulty in [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard] {
            assert_eq!(Difficulty::from_label(difficulty.label()), difficulty);
        }
    }

    #[test]
    fn test_role_side_mapping() {
        assert_eq!(Role::Left.side(), Some(Side::Left));
        assert_eq!(Role::Right.side(), Some(Side::Right));
        assert_eq!(Role::Spectator.side(), None);
        assert_eq!(Role::from(Side::Right), Role::Right);
        assert_eq!(Side::Left.opposite(), Side::Right);
        assert_eq!(Side::Right.opposite(), Side::Left);
    }

    #[test]
    fn test_paddle_edges() {
        assert_eq!(LEFT_PADDLE_EDGE, 35.0);
        assert_eq!(RIGHT_PADDLE_EDGE, 765.0);
    }

    #[test]
    fn test_scores_award() {
        let mut scores = Scores::default();
        scores.award(Side::Right);
        scores.award(Side::Right);
        scores.award(Side::Left);
        assert_eq!(scores.get(Side::Left), 1);
        assert_eq!(scores.get(Side::Right), 2);
    }

    #[test]
    fn test_snapshot_paddle_height() {
        let snapshot = sample_snapshot();
        assert_approx_eq!(snapshot.paddle_height(Side::Left), 100.0, 0.001);
        assert_approx_eq!(snapshot.paddle_height(Side::Right), 180.0, 0.001);
    }

    #[test]
    fn test_packet_serialization_join_room() {
        let packet = Packet::JoinRoom {
            room: Some("abc123".to_string()),
            win_score: Some(3),
            difficulty: Some("hard".to_string()),
        };
        let serialized = bincode::serialize(&packet).unwrap();
        let deserialized: Packet = bincode::deserialize(&serialized).unwrap();

        match deserialized {
            Packet::JoinRoom {
                room,
                win_score,
                difficulty,
            } => {
                assert_eq!(room.as_deref(), Some("abc123"));
                assert_eq!(win_score, Some(3));
                assert_eq!(difficulty.as_deref(), Some("hard"));
            }
            _ => panic!("Wrong packet type after deserialization"),
        }
    }

    #[test]
    fn test_packet_serialization_game_state() {
        let packet = Packet::GameState(sample_snapshot());
        let serialized = bincode::serialize(&packet).unwrap();
        let deserialized: Packet = bincode::deserialize(&serialized).unwrap();

        match deserialized {
            Packet::GameState(snapshot) => {
                assert_eq!(snapshot, sample_snapshot());
                assert_approx_eq!(snapshot.paddles.right, 120.5, 0.0001);
            }
            _ => panic!("Wrong packet type after deserialization"),
        }
    }
}
