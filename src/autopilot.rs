//! Tap bot for headless runs
//!
//! Hovers just under the centre of the next gap: taps whenever the player is
//! below its target height and not already rising.

use crate::consts::*;
use crate::player_start;
use crate::sim::{GamePhase, Snapshot};

#[derive(Debug, Clone)]
pub struct Autopilot {
    /// How far below the gap centre to hover
    pub hover_below: f32,
    /// Only tap once vertical velocity has dropped to this
    pub max_rise: f32,
}

impl Default for Autopilot {
    fn default() -> Self {
        Self {
            hover_below: 12.0,
            max_rise: 0.0,
        }
    }
}

impl Autopilot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Height the player should stay around
    pub fn target_height(&self, snapshot: &Snapshot) -> f32 {
        let radius = PLAYER_SIZE.x / 2.0 - PLAYER_BODY_INSET;
        let player_left = snapshot.player_position.x - radius;
        snapshot
            .obstacles
            .iter()
            .filter(|o| o.trailing_x >= player_left)
            .min_by(|a, b| {
                a.trailing_x
                    .partial_cmp(&b.trailing_x)
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .map(|o| o.gap_center)
            .unwrap_or_else(|| player_start().y)
            - self.hover_below
    }

    /// Whether to tap before the next step
    pub fn next_tap(&self, snapshot: &Snapshot) -> bool {
        match snapshot.phase {
            GamePhase::NotStarted => true,
            GamePhase::Flying { .. } => {
                snapshot.player_position.y < self.target_height(snapshot)
                    && snapshot.player_velocity.y <= self.max_rise
            }
            // Restarting is the caller's decision
            GamePhase::GameOver | GamePhase::RestartReady { .. } => false,
        }
    }
}
