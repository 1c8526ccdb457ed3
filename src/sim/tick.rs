//! Fixed timestep simulation tick
//!
//! One step of the host loop: input, timers, per-frame update, then actions
//! and physics with their contacts.

use super::controller::GameController;
use super::timer::Timers;

/// Input for a single tick (deterministic)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Taps that arrived since the previous tick
    pub taps: u32,
}

impl TickInput {
    pub fn tap() -> Self {
        Self { taps: 1 }
    }
}

/// Advance a scene by one fixed timestep
pub fn tick(game: &mut GameController<Timers>, input: &TickInput, dt: f32) {
    for _ in 0..input.taps {
        game.tap();
    }

    for event in game.scheduler_mut().advance(dt) {
        game.on_timer(event);
    }

    game.update();

    for contact in game.stage_mut().step(dt) {
        game.on_contact(contact.category_a, contact.category_b);
    }

    game.count_tick();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::*;
    use crate::sim::GamePhase;

    #[test]
    fn test_tick_not_started_to_flying() {
        let mut game = GameController::new(12345);
        let idle = TickInput::default();
        tick(&mut game, &idle, SIM_DT);
        assert_eq!(game.phase(), GamePhase::NotStarted);

        tick(&mut game, &TickInput::tap(), SIM_DT);
        assert!(game.phase().is_flying());
        assert_eq!(game.time_ticks(), 2);
    }

    #[test]
    fn test_idle_player_does_not_fall() {
        let mut game = GameController::new(1);
        let start = game.snapshot().player_position;
        for _ in 0..600 {
            tick(&mut game, &TickInput::default(), SIM_DT);
        }
        assert_eq!(game.snapshot().player_position, start);
        assert_eq!(game.phase(), GamePhase::NotStarted);
    }

    #[test]
    fn test_untouched_player_hits_the_floor() {
        let mut game = GameController::new(2);
        tick(&mut game, &TickInput::tap(), SIM_DT);
        for _ in 0..600 {
            tick(&mut game, &TickInput::default(), SIM_DT);
            if game.phase() == GamePhase::GameOver {
                break;
            }
        }
        assert_eq!(game.phase(), GamePhase::GameOver);
        // Fell well before the first pair could arrive
        assert_eq!(game.score(), 0);
        assert!(game.snapshot().player_position.y < FLOOR_LEVEL + PLAYER_SIZE.x);
    }

    #[test]
    fn test_determinism() {
        let mut game1 = GameController::new(99999);
        let mut game2 = GameController::new(99999);

        let inputs: Vec<TickInput> = (0..900)
            .map(|i| TickInput {
                taps: u32::from(i % 17 == 0),
            })
            .collect();

        for input in &inputs {
            tick(&mut game1, input, SIM_DT);
            tick(&mut game2, input, SIM_DT);
        }

        assert_eq!(game1.snapshot(), game2.snapshot());
        assert_eq!(game1.spawned(), game2.spawned());
    }
}
