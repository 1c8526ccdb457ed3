//! Flappy Dragon - A tap-to-flap arcade game
//!
//! Core modules:
//! - `sim`: Deterministic simulation (stage, timers, phase machine)
//! - `app`: Host session (fixed timestep loop, restart, audio dispatch)
//! - `audio`: Sound effect and music playback seam
//! - `autopilot`: Tap bot for headless runs
//! - `settings`: Runtime preferences

pub mod app;
pub mod audio;
pub mod autopilot;
pub mod highscores;
pub mod settings;
pub mod sim;

pub use app::{App, LogPresenter, Presenter, SceneInfo, Transition};
pub use highscores::HighScores;
pub use settings::Settings;

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    use glam::Vec2;

    /// Fixed simulation timestep (60 Hz, one step per rendered frame)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;
    /// Longest frame the host loop will account for
    pub const MAX_FRAME_DT: f32 = 0.1;

    /// Scene dimensions (y up, origin bottom-left)
    pub const SCENE_WIDTH: f32 = 320.0;
    pub const SCENE_HEIGHT: f32 = 568.0;
    /// Playable height above the floor
    pub const GAME_AREA: f32 = 410.0;
    /// Floor line; the boundary sensor sits here
    pub const FLOOR_LEVEL: f32 = SCENE_HEIGHT - GAME_AREA;

    /// Horizontal scroll speed shared by floor and obstacles (units/s)
    pub const SCROLL_SPEED: f32 = 100.0;
    pub const FLOOR_SIZE: Vec2 = Vec2::new(720.0, 120.0);

    /// Player sprite
    pub const PLAYER_X: f32 = 60.0;
    pub const PLAYER_SIZE: Vec2 = Vec2::new(42.0, 32.0);
    /// Body radius is the sprite half-width minus this inset
    pub const PLAYER_BODY_INSET: f32 = 10.0;
    pub const PLAYER_MASS: f32 = 0.1;
    pub const PLAYER_FRAMES: u8 = 4;
    pub const PLAYER_FRAME_DURATION: f32 = 0.09;

    /// World gravity (units/s²)
    pub const GRAVITY: Vec2 = Vec2::new(0.0, -900.0);
    /// Upward impulse per tap (velocity change = impulse / mass)
    pub const FLAP_IMPULSE: Vec2 = Vec2::new(0.0, 25.0);
    /// Rotation (radians) per unit of vertical velocity
    pub const ROTATION_SCALE: f32 = 0.001;

    /// Obstacles
    pub const SPAWN_INTERVAL: f32 = 2.5;
    pub const OBSTACLE_SIZE: Vec2 = Vec2::new(52.0, 320.0);
    pub const OBSTACLE_OFFSET_BASE: u32 = 74;
    pub const OBSTACLE_OFFSET_BAND: u32 = 132;
    pub const OBSTACLE_VARIANTS: u8 = 4;
    /// Vertical gap between barriers, in player heights
    pub const GAP_FACTOR: f32 = 2.5;
    pub const SCORE_TRIGGER_WIDTH: f32 = 1.0;

    /// Delay between the crash and the restart prompt
    pub const GAME_OVER_DELAY: f32 = 3.0;
    /// Prompt shown once the game-over delay has elapsed
    pub const GAME_OVER_TEXT: &str = "Game Over";
    /// Restart transition length
    pub const RESTART_TRANSITION_SECS: f32 = 1.0;
}

/// Physics category bitmasks
pub mod category {
    pub const NONE: u32 = 0;
    pub const PLAYER: u32 = 1;
    /// Barriers and the floor/ceiling sensors
    pub const ENEMY: u32 = 2;
    pub const SCORE: u32 = 4;
}

/// Initial player position: horizontally fixed, vertically centred in the game area
#[inline]
pub fn player_start() -> Vec2 {
    Vec2::new(consts::PLAYER_X, consts::SCENE_HEIGHT - consts::GAME_AREA / 2.0)
}

/// Vertical gap between the barriers of an obstacle pair
#[inline]
pub fn obstacle_gap() -> f32 {
    consts::PLAYER_SIZE.y * consts::GAP_FACTOR
}

/// Mix a run index into a base seed so every run gets its own stream
#[inline]
pub fn run_seed(base: u64, run: u32) -> u64 {
    base.wrapping_add((run as u64).wrapping_mul(2654435761))
}
