//! Game phase, entity bookkeeping and the events the controller emits

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::stage::NodeId;
use super::timer::TimerHandle;
use crate::audio::SoundEffect;

/// Current phase of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Intro overlay shown, player idles without a body
    NotStarted,
    /// Active gameplay; the spawn timer only exists here
    Flying { spawn_timer: TimerHandle },
    /// Crashed, waiting for the restart prompt
    GameOver,
    /// "Game Over" shown; the first tap requests a fresh scene
    RestartReady { restart_requested: bool },
}

impl GamePhase {
    pub fn name(&self) -> &'static str {
        match self {
            GamePhase::NotStarted => "NotStarted",
            GamePhase::Flying { .. } => "Flying",
            GamePhase::GameOver => "GameOver",
            GamePhase::RestartReady { .. } => "RestartReady",
        }
    }

    pub fn is_flying(&self) -> bool {
        matches!(self, GamePhase::Flying { .. })
    }
}

/// Sprite appearance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Texture {
    /// Invisible node (sensors, labels)
    #[default]
    None,
    Background,
    Floor,
    Intro,
    /// Idle/flap animation frame (1-based)
    Player(u8),
    PlayerDead,
    EnemyTop(u8),
    EnemyBottom(u8),
}

/// Node ids of one spawned obstacle pair plus its rolled parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObstaclePair {
    pub top: NodeId,
    pub bottom: NodeId,
    pub trigger: NodeId,
    /// Visual variant (1..=OBSTACLE_VARIANTS)
    pub variant: u8,
    /// Distance from the scene top to the gap's upper edge
    pub offset: u32,
    pub gap: f32,
}

/// Things the host reacts to (audio, leaderboard, presentation)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    /// First tap committed the run
    Started,
    ObstacleSpawned { variant: u8, offset: u32 },
    Scored { score: u32 },
    Sound(SoundEffect),
    GameOver { score: u32 },
    /// "Game Over" label shown
    RestartReady,
    /// The host should mount a fresh scene
    RestartRequested,
}

/// Read-only view of an obstacle pair for bots and reports
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObstacleView {
    /// Trailing edge of the barriers (where the score trigger sits)
    pub trailing_x: f32,
    pub gap_center: f32,
    pub gap: f32,
    pub variant: u8,
}

/// Per-step summary of the scene
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub phase: GamePhase,
    pub score: u32,
    pub time_ticks: u64,
    pub player_position: Vec2,
    pub player_velocity: Vec2,
    pub player_rotation: f32,
    /// Sorted by spawn order (oldest first)
    pub obstacles: Vec<ObstacleView>,
}
