//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by node ID)
//! - No rendering, audio output or platform dependencies

pub mod collision;
pub mod controller;
pub mod spawn;
pub mod stage;
pub mod state;
pub mod tick;
pub mod timer;

pub use collision::{ContactOutcome, resolve_contact};
pub use controller::GameController;
pub use spawn::{ObstacleLayout, SpawnRoll, obstacle_layout, roll_spawn};
pub use stage::{Action, Body, Contact, Node, NodeId, Shape, Stage};
pub use state::{GameEvent, GamePhase, ObstaclePair, ObstacleView, Snapshot, Texture};
pub use tick::{TickInput, tick};
pub use timer::{Scheduler, TimerEvent, TimerHandle, Timers};
