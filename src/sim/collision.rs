//! Overlap tests for stage bodies and the contact resolution policy
//!
//! Bodies are axis-aligned: rectangles ignore node rotation, which only
//! ever affects the (circular) player.

use glam::Vec2;

use super::stage::Shape;
use crate::category;

/// What a contact-begin means for the run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactOutcome {
    /// Passed through a score trigger
    Score,
    /// Hit a barrier or boundary sensor
    Crash,
    Ignore,
}

/// Classify a contact from the two bodies' category masks.
///
/// Score is checked first, so a contact carrying both SCORE and ENEMY
/// counts as a point.
pub fn resolve_contact(category_a: u32, category_b: u32) -> ContactOutcome {
    let combined = category_a | category_b;
    if combined & category::SCORE != 0 {
        ContactOutcome::Score
    } else if combined & category::ENEMY != 0 {
        ContactOutcome::Crash
    } else {
        ContactOutcome::Ignore
    }
}

/// True if either body wants contact reports about the other
#[inline]
pub fn wants_contact(category_a: u32, contact_a: u32, category_b: u32, contact_b: u32) -> bool {
    category_a & contact_b != 0 || category_b & contact_a != 0
}

/// Strict overlap between two shapes centred at `pos_a` / `pos_b`
pub fn shapes_overlap(pos_a: Vec2, shape_a: &Shape, pos_b: Vec2, shape_b: &Shape) -> bool {
    match (shape_a, shape_b) {
        (Shape::Circle { radius: ra }, Shape::Circle { radius: rb }) => {
            circle_circle_overlap(pos_a, *ra, pos_b, *rb)
        }
        (Shape::Circle { radius }, Shape::Rect { size }) => {
            circle_rect_overlap(pos_a, *radius, pos_b, *size)
        }
        (Shape::Rect { size }, Shape::Circle { radius }) => {
            circle_rect_overlap(pos_b, *radius, pos_a, *size)
        }
        (Shape::Rect { size: sa }, Shape::Rect { size: sb }) => {
            rect_rect_overlap(pos_a, *sa, pos_b, *sb)
        }
    }
}

pub fn circle_circle_overlap(a: Vec2, ra: f32, b: Vec2, rb: f32) -> bool {
    let reach = ra + rb;
    a.distance_squared(b) < reach * reach
}

/// Circle against an axis-aligned rectangle given by centre and full size
pub fn circle_rect_overlap(center: Vec2, radius: f32, rect_center: Vec2, rect_size: Vec2) -> bool {
    let half = rect_size / 2.0;
    let closest = center.clamp(rect_center - half, rect_center + half);
    center.distance_squared(closest) < radius * radius
}

pub fn rect_rect_overlap(a: Vec2, size_a: Vec2, b: Vec2, size_b: Vec2) -> bool {
    let delta = (a - b).abs();
    let reach = (size_a + size_b) / 2.0;
    delta.x < reach.x && delta.y < reach.y
}
