//! Obstacle pair placement
//!
//! Rolling the random parameters is separate from the geometry so the layout
//! can be checked for any offset.

use glam::Vec2;
use rand::Rng;

use crate::consts::*;
use crate::obstacle_gap;

/// Random parameters of one obstacle pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpawnRoll {
    /// Distance from the scene top to the top barrier's lower edge
    pub offset: u32,
    pub variant: u8,
}

/// Draw offset in `[BASE, BASE + BAND)` and variant in `1..=VARIANTS`
pub fn roll_spawn<R: Rng>(rng: &mut R) -> SpawnRoll {
    let offset = OBSTACLE_OFFSET_BASE + rng.random_range(0..OBSTACLE_OFFSET_BAND);
    let variant = rng.random_range(1..=OBSTACLE_VARIANTS);
    SpawnRoll { offset, variant }
}

/// Centres of the three nodes of an obstacle pair at spawn time
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObstacleLayout {
    pub top: Vec2,
    pub bottom: Vec2,
    pub trigger: Vec2,
    pub barrier_size: Vec2,
    pub trigger_size: Vec2,
    pub gap: f32,
}

impl ObstacleLayout {
    /// Lower edge of the top barrier
    pub fn gap_top(&self) -> f32 {
        self.top.y - self.barrier_size.y / 2.0
    }

    /// Upper edge of the bottom barrier
    pub fn gap_bottom(&self) -> f32 {
        self.bottom.y + self.barrier_size.y / 2.0
    }

    /// Horizontal distance every node travels before removal
    pub fn travel(&self) -> f32 {
        SCENE_WIDTH + self.barrier_size.x
    }

    pub fn travel_duration(&self) -> f32 {
        self.travel() / SCROLL_SPEED
    }
}

/// Place a pair just past the right edge, with the gap's upper edge `offset`
/// below the scene top and the score trigger on the barriers' trailing edge.
pub fn obstacle_layout(offset: u32) -> ObstacleLayout {
    let size = OBSTACLE_SIZE;
    let gap = obstacle_gap();
    let x = SCENE_WIDTH + size.x / 2.0;

    let top = Vec2::new(x, SCENE_HEIGHT - offset as f32 + size.y / 2.0);
    let bottom = Vec2::new(x, top.y - size.y - gap);
    let trigger = Vec2::new(top.x + size.x / 2.0, top.y - size.y / 2.0 - gap / 2.0);

    ObstacleLayout {
        top,
        bottom,
        trigger,
        barrier_size: size,
        trigger_size: Vec2::new(SCORE_TRIGGER_WIDTH, gap),
        gap,
    }
}
