//! Scene controller: the phase machine
//!
//! Owns every entity of one scene (through its `Stage`) and reacts to the
//! four things that can happen to a run: a tap, a timer firing, a contact
//! beginning, and a rendered frame. Restarting means building a new
//! controller; nothing here resets itself.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;

use super::collision::{ContactOutcome, resolve_contact};
use super::spawn::{obstacle_layout, roll_spawn};
use super::stage::{Action, Body, Node, NodeId, Stage};
use super::state::{GameEvent, GamePhase, ObstaclePair, ObstacleView, Snapshot, Texture};
use super::timer::{Scheduler, TimerEvent, Timers};
use crate::audio::SoundEffect;
use crate::consts::*;
use crate::{category, player_start};

/// One scene of the game
#[derive(Debug, Clone)]
pub struct GameController<S: Scheduler = Timers> {
    seed: u64,
    rng: Pcg32,
    scheduler: S,
    stage: Stage,
    phase: GamePhase,
    score: u32,
    /// Simulation steps run on this scene
    time_ticks: u64,
    player: NodeId,
    floor: NodeId,
    intro: Option<NodeId>,
    score_label: Option<NodeId>,
    game_over_label: Option<NodeId>,
    /// Pairs still on stage, oldest first
    obstacles: Vec<ObstaclePair>,
    spawned: u32,
    events: Vec<GameEvent>,
}

impl GameController<Timers> {
    /// Fresh scene with its own timer queue and a RNG seeded from `seed`
    pub fn new(seed: u64) -> Self {
        Self::with_parts(seed, Pcg32::seed_from_u64(seed), Timers::new())
    }
}

impl<S: Scheduler> GameController<S> {
    /// Fresh scene using the given scheduler
    pub fn with_scheduler(seed: u64, scheduler: S) -> Self {
        Self::with_parts(seed, Pcg32::seed_from_u64(seed), scheduler)
    }

    /// Fresh scene with an injected RNG and scheduler
    pub fn with_parts(seed: u64, rng: Pcg32, scheduler: S) -> Self {
        let mut stage = Stage::new();

        stage.spawn(
            Node::new(
                "background",
                Vec2::new(SCENE_WIDTH / 2.0, SCENE_HEIGHT / 2.0),
                Vec2::new(SCENE_WIDTH, SCENE_HEIGHT),
            )
            .with_texture(Texture::Background),
        );

        // Floor top edge sits on the floor line; scrolling by half its width
        // keeps the jump back out of view
        let floor = stage.spawn(
            Node::new(
                "floor",
                Vec2::new(FLOOR_SIZE.x / 2.0, FLOOR_LEVEL - FLOOR_SIZE.y / 2.0),
                FLOOR_SIZE,
            )
            .with_texture(Texture::Floor)
            .with_z(2)
            .with_action(Action::scroll_loop(SCROLL_SPEED, FLOOR_SIZE.x / 2.0)),
        );

        for (name, y) in [("floor_sensor", FLOOR_LEVEL), ("ceiling_sensor", SCENE_HEIGHT)] {
            let size = Vec2::new(SCENE_WIDTH, 1.0);
            stage.spawn(
                Node::new(name, Vec2::new(SCENE_WIDTH / 2.0, y), size).with_body(
                    Body::rect(size).with_masks(category::ENEMY, category::PLAYER, 0),
                ),
            );
        }

        let intro = stage.spawn(
            Node::new(
                "intro",
                Vec2::new(SCENE_WIDTH / 2.0, SCENE_HEIGHT - 210.0),
                Vec2::new(SCENE_WIDTH * 0.8, 160.0),
            )
            .with_texture(Texture::Intro)
            .with_z(3),
        );

        let frames = (1..=PLAYER_FRAMES).map(Texture::Player).collect();
        let player = stage.spawn(
            Node::new("player", player_start(), PLAYER_SIZE)
                .with_texture(Texture::Player(1))
                .with_z(4)
                .with_action(Action::animate(frames, PLAYER_FRAME_DURATION)),
        );

        log::info!("Scene built (seed {})", seed);

        Self {
            seed,
            rng,
            scheduler,
            stage,
            phase: GamePhase::NotStarted,
            score: 0,
            time_ticks: 0,
            player,
            floor,
            intro: Some(intro),
            score_label: None,
            game_over_label: None,
            obstacles: Vec::new(),
            spawned: 0,
            events: Vec::new(),
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn time_ticks(&self) -> u64 {
        self.time_ticks
    }

    pub fn player(&self) -> NodeId {
        self.player
    }

    pub fn floor(&self) -> NodeId {
        self.floor
    }

    pub fn intro(&self) -> Option<NodeId> {
        self.intro
    }

    pub fn score_label(&self) -> Option<NodeId> {
        self.score_label
    }

    pub fn game_over_label(&self) -> Option<NodeId> {
        self.game_over_label
    }

    /// Obstacle pairs still on stage
    pub fn obstacles(&self) -> &[ObstaclePair] {
        &self.obstacles
    }

    /// Obstacle pairs created since the scene was built
    pub fn spawned(&self) -> u32 {
        self.spawned
    }

    pub fn stage(&self) -> &Stage {
        &self.stage
    }

    pub fn stage_mut(&mut self) -> &mut Stage {
        &mut self.stage
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    /// Take the events emitted since the last drain
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub(crate) fn count_tick(&mut self) {
        self.time_ticks += 1;
    }

    /// Primary input
    pub fn tap(&mut self) {
        match self.phase {
            GamePhase::NotStarted => self.start_flying(),
            GamePhase::Flying { .. } => self.flap(),
            GamePhase::GameOver => {}
            GamePhase::RestartReady { restart_requested } => {
                if !restart_requested {
                    self.phase = GamePhase::RestartReady {
                        restart_requested: true,
                    };
                    self.events.push(GameEvent::RestartRequested);
                    log::info!("Restart requested (score {})", self.score);
                }
            }
        }
    }

    /// Dispatch a fired timer
    pub fn on_timer(&mut self, event: TimerEvent) {
        match event {
            TimerEvent::SpawnObstacles => {
                if self.phase.is_flying() {
                    self.spawn_obstacles();
                }
            }
            TimerEvent::ShowGameOver => {
                if self.phase == GamePhase::GameOver {
                    self.show_restart_prompt();
                }
            }
        }
    }

    /// Dispatch a contact-begin between bodies with the given categories
    pub fn on_contact(&mut self, category_a: u32, category_b: u32) {
        if !self.phase.is_flying() {
            return;
        }
        match resolve_contact(category_a, category_b) {
            ContactOutcome::Score => self.add_point(),
            ContactOutcome::Crash => self.game_over(),
            ContactOutcome::Ignore => {}
        }
    }

    /// Per-frame work: tilt the player with its vertical velocity, forget
    /// pairs the stage has removed
    pub fn update(&mut self) {
        if self.phase.is_flying() {
            if let Some(node) = self.stage.node_mut(self.player) {
                if let Some(body) = node.body.as_ref().filter(|b| b.dynamic) {
                    node.rotation = body.velocity.y * ROTATION_SCALE;
                }
            }
        }

        let stage = &self.stage;
        self.obstacles.retain(|pair| {
            stage.contains(pair.top) || stage.contains(pair.bottom) || stage.contains(pair.trigger)
        });
    }

    fn start_flying(&mut self) {
        if let Some(intro) = self.intro.take() {
            self.stage.remove(intro);
        }

        let label = self.stage.spawn(
            Node::new(
                "score",
                Vec2::new(SCENE_WIDTH / 2.0, SCENE_HEIGHT - 100.0),
                Vec2::ZERO,
            )
            .with_text("0")
            .with_z(5),
        );
        self.score_label = Some(label);
        self.score = 0;

        let radius = PLAYER_SIZE.x / 2.0 - PLAYER_BODY_INSET;
        let body = Body::circle(radius).with_mass(PLAYER_MASS).with_masks(
            category::PLAYER,
            category::ENEMY | category::SCORE,
            category::ENEMY,
        );
        self.stage.attach_body(self.player, body);
        self.stage.apply_impulse(self.player, FLAP_IMPULSE);

        let spawn_timer = self
            .scheduler
            .schedule_repeating(SPAWN_INTERVAL, TimerEvent::SpawnObstacles);
        self.phase = GamePhase::Flying { spawn_timer };
        self.events.push(GameEvent::Started);
        log::info!("Run started (seed {})", self.seed);
    }

    /// Zero the vertical velocity first so quick taps never stack
    fn flap(&mut self) {
        if let Some(velocity) = self.stage.velocity(self.player) {
            self.stage.set_velocity(self.player, Vec2::new(velocity.x, 0.0));
            self.stage.apply_impulse(self.player, FLAP_IMPULSE);
        }
    }

    fn spawn_obstacles(&mut self) {
        let roll = roll_spawn(&mut self.rng);
        let layout = obstacle_layout(roll.offset);
        let motion = Action::move_by_then_remove(
            Vec2::new(-layout.travel(), 0.0),
            layout.travel_duration(),
        );

        let top = self.stage.spawn(
            Node::new("enemy_top", layout.top, layout.barrier_size)
                .with_texture(Texture::EnemyTop(roll.variant))
                .with_z(1)
                .with_body(Body::rect(layout.barrier_size).with_masks(
                    category::ENEMY,
                    category::PLAYER,
                    0,
                ))
                .with_action(motion.clone()),
        );
        let bottom = self.stage.spawn(
            Node::new("enemy_bottom", layout.bottom, layout.barrier_size)
                .with_texture(Texture::EnemyBottom(roll.variant))
                .with_z(1)
                .with_body(Body::rect(layout.barrier_size).with_masks(
                    category::ENEMY,
                    category::PLAYER,
                    0,
                ))
                .with_action(motion.clone()),
        );
        let trigger = self.stage.spawn(
            Node::new("score_trigger", layout.trigger, layout.trigger_size)
                .with_body(Body::rect(layout.trigger_size).with_masks(
                    category::SCORE,
                    category::PLAYER,
                    0,
                ))
                .with_action(motion),
        );

        self.obstacles.push(ObstaclePair {
            top,
            bottom,
            trigger,
            variant: roll.variant,
            offset: roll.offset,
            gap: layout.gap,
        });
        self.spawned += 1;
        self.events.push(GameEvent::ObstacleSpawned {
            variant: roll.variant,
            offset: roll.offset,
        });
        log::debug!(
            "Spawned obstacle #{} (variant {}, offset {})",
            self.spawned,
            roll.variant,
            roll.offset
        );
    }

    fn add_point(&mut self) {
        self.score += 1;
        if let Some(node) = self.score_label.and_then(|id| self.stage.node_mut(id)) {
            node.text = Some(self.score.to_string());
        }
        self.events.push(GameEvent::Scored { score: self.score });
        self.events.push(GameEvent::Sound(SoundEffect::Score));
        log::debug!("Score {}", self.score);
    }

    fn game_over(&mut self) {
        let GamePhase::Flying { spawn_timer } = self.phase else {
            return;
        };
        self.scheduler.cancel(spawn_timer);

        // Everything in flight stops where it is
        self.stage.remove_all_actions();

        if let Some(node) = self.stage.node_mut(self.player) {
            node.rotation = 0.0;
            node.texture = Texture::PlayerDead;
        }
        self.stage.set_velocity(self.player, Vec2::ZERO);
        self.stage.set_dynamic(self.player, false);
        self.stage.set_masks(self.player, category::PLAYER, category::NONE, category::NONE);

        self.scheduler.schedule_once(GAME_OVER_DELAY, TimerEvent::ShowGameOver);
        self.phase = GamePhase::GameOver;
        self.events.push(GameEvent::Sound(SoundEffect::Hit));
        self.events.push(GameEvent::GameOver { score: self.score });
        log::info!(
            "Game over: score {} after {} obstacles",
            self.score,
            self.spawned
        );
    }

    fn show_restart_prompt(&mut self) {
        let label = self.stage.spawn(
            Node::new(
                "game_over",
                Vec2::new(SCENE_WIDTH / 2.0, SCENE_HEIGHT / 2.0),
                Vec2::ZERO,
            )
            .with_text(GAME_OVER_TEXT)
            .with_z(5),
        );
        self.game_over_label = Some(label);
        self.phase = GamePhase::RestartReady {
            restart_requested: false,
        };
        self.events.push(GameEvent::RestartReady);
        log::info!("Restart prompt shown");
    }

    /// Read-only summary for bots and reports
    pub fn snapshot(&self) -> Snapshot {
        let player = self.stage.node(self.player);
        let obstacles = self
            .obstacles
            .iter()
            .filter_map(|pair| {
                let trigger = self.stage.node(pair.trigger)?;
                Some(ObstacleView {
                    trailing_x: trigger.position.x,
                    gap_center: trigger.position.y,
                    gap: pair.gap,
                    variant: pair.variant,
                })
            })
            .collect();

        Snapshot {
            phase: self.phase,
            score: self.score,
            time_ticks: self.time_ticks,
            player_position: player.map(|n| n.position).unwrap_or_else(player_start),
            player_velocity: self.stage.velocity(self.player).unwrap_or(Vec2::ZERO),
            player_rotation: player.map(|n| n.rotation).unwrap_or(0.0),
            obstacles,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::timer::TimerHandle;

    /// Scheduler that records calls instead of keeping time
    #[derive(Debug, Default)]
    struct RecordingScheduler {
        repeating: Vec<(f32, TimerEvent)>,
        once: Vec<(f32, TimerEvent)>,
        cancelled: Vec<TimerHandle>,
        timers: Timers,
    }

    impl Scheduler for RecordingScheduler {
        fn schedule_repeating(&mut self, interval: f32, event: TimerEvent) -> TimerHandle {
            self.repeating.push((interval, event));
            self.timers.schedule_repeating(interval, event)
        }

        fn schedule_once(&mut self, delay: f32, event: TimerEvent) -> TimerHandle {
            self.once.push((delay, event));
            self.timers.schedule_once(delay, event)
        }

        fn cancel(&mut self, handle: TimerHandle) {
            self.cancelled.push(handle);
            self.timers.cancel(handle);
        }
    }

    fn flying() -> GameController {
        let mut game = GameController::new(42);
        game.tap();
        game
    }

    #[test]
    fn test_new_scene_is_not_started() {
        let game = GameController::new(1);
        assert_eq!(game.phase(), GamePhase::NotStarted);
        assert_eq!(game.score(), 0);
        assert!(game.intro().is_some());
        assert!(game.stage().body(game.player()).is_none());
        assert!(game.obstacles().is_empty());
        // Idle animation and floor scroll are running
        assert_eq!(game.stage().animated_nodes(), 2);
    }

    #[test]
    fn test_first_tap_starts_run() {
        let mut game = GameController::with_scheduler(5, RecordingScheduler::default());
        game.tap();

        assert!(game.phase().is_flying());
        assert!(game.intro().is_none());
        let label = game.score_label().unwrap();
        assert_eq!(game.stage().node(label).unwrap().text.as_deref(), Some("0"));

        let body = game.stage().body(game.player()).unwrap();
        assert!(body.dynamic);
        assert_eq!(body.category, category::PLAYER);
        assert!((body.velocity.y - FLAP_IMPULSE.y / PLAYER_MASS).abs() < 1e-3);

        assert_eq!(
            game.scheduler().repeating,
            vec![(SPAWN_INTERVAL, TimerEvent::SpawnObstacles)]
        );
        assert_eq!(game.drain_events(), vec![GameEvent::Started]);
    }

    #[test]
    fn test_taps_while_flying_do_not_stack() {
        let mut game = flying();
        game.tap();
        game.tap();
        let v = game.stage().velocity(game.player()).unwrap();
        assert!((v.y - FLAP_IMPULSE.y / PLAYER_MASS).abs() < 1e-3);
        // Still a single spawn timer
        assert_eq!(game.scheduler().pending(), 1);
    }

    #[test]
    fn test_flap_resets_falling_velocity() {
        let mut game = flying();
        let player = game.player();
        game.stage_mut().set_velocity(player, Vec2::new(0.0, -400.0));
        game.tap();
        let v = game.stage().velocity(game.player()).unwrap();
        assert!((v.y - FLAP_IMPULSE.y / PLAYER_MASS).abs() < 1e-3);
    }

    #[test]
    fn test_score_contact() {
        let mut game = flying();
        game.drain_events();
        game.on_contact(category::PLAYER, category::SCORE);

        assert_eq!(game.score(), 1);
        assert!(game.phase().is_flying());
        let label = game.score_label().unwrap();
        assert_eq!(game.stage().node(label).unwrap().text.as_deref(), Some("1"));
        assert_eq!(
            game.drain_events(),
            vec![
                GameEvent::Scored { score: 1 },
                GameEvent::Sound(SoundEffect::Score)
            ]
        );
    }

    #[test]
    fn test_obstacle_contact_ends_run() {
        let mut game = GameController::with_scheduler(5, RecordingScheduler::default());
        game.tap();
        let GamePhase::Flying { spawn_timer } = game.phase() else {
            panic!("expected Flying");
        };

        game.on_contact(category::ENEMY, category::PLAYER);
        assert_eq!(game.phase(), GamePhase::GameOver);
        assert_eq!(game.scheduler().cancelled, vec![spawn_timer]);
        assert_eq!(
            game.scheduler().once,
            vec![(GAME_OVER_DELAY, TimerEvent::ShowGameOver)]
        );

        let node = game.stage().node(game.player()).unwrap();
        assert_eq!(node.texture, Texture::PlayerDead);
        assert_eq!(node.rotation, 0.0);
        let body = node.body.as_ref().unwrap();
        assert!(!body.dynamic);
        assert_eq!(body.contact_test, category::NONE);
        assert_eq!(game.stage().animated_nodes(), 0);

        // Second crash while already over changes nothing
        game.on_contact(category::ENEMY, category::PLAYER);
        assert_eq!(game.scheduler().cancelled.len(), 1);
        assert_eq!(game.scheduler().once.len(), 1);
    }

    #[test]
    fn test_combined_contact_scores() {
        let mut game = flying();
        game.on_contact(category::PLAYER, category::SCORE | category::ENEMY);
        assert_eq!(game.score(), 1);
        assert!(game.phase().is_flying());
    }

    #[test]
    fn test_contacts_ignored_outside_flying() {
        let mut game = GameController::new(3);
        game.on_contact(category::PLAYER, category::SCORE);
        game.on_contact(category::PLAYER, category::ENEMY);
        assert_eq!(game.phase(), GamePhase::NotStarted);
        assert_eq!(game.score(), 0);

        game.tap();
        game.on_contact(category::PLAYER, category::ENEMY);
        game.on_contact(category::PLAYER, category::SCORE);
        assert_eq!(game.phase(), GamePhase::GameOver);
        assert_eq!(game.score(), 0);
    }

    #[test]
    fn test_tap_ignored_during_game_over() {
        let mut game = flying();
        game.on_contact(category::PLAYER, category::ENEMY);
        game.drain_events();
        game.tap();
        assert_eq!(game.phase(), GamePhase::GameOver);
        assert!(game.drain_events().is_empty());
    }

    #[test]
    fn test_restart_prompt_and_single_restart_request() {
        let mut game = flying();
        game.on_contact(category::PLAYER, category::ENEMY);
        game.on_timer(TimerEvent::ShowGameOver);

        assert_eq!(
            game.phase(),
            GamePhase::RestartReady {
                restart_requested: false
            }
        );
        let label = game.game_over_label().unwrap();
        assert_eq!(
            game.stage().node(label).unwrap().text.as_deref(),
            Some(GAME_OVER_TEXT)
        );
        game.drain_events();

        game.tap();
        game.tap();
        assert_eq!(game.drain_events(), vec![GameEvent::RestartRequested]);
    }

    #[test]
    fn test_stray_timer_events_are_ignored() {
        let mut game = GameController::new(9);
        game.on_timer(TimerEvent::SpawnObstacles);
        game.on_timer(TimerEvent::ShowGameOver);
        assert_eq!(game.phase(), GamePhase::NotStarted);
        assert_eq!(game.spawned(), 0);
        assert!(game.game_over_label().is_none());
    }

    #[test]
    fn test_spawn_builds_pair() {
        let mut game = flying();
        game.on_timer(TimerEvent::SpawnObstacles);

        assert_eq!(game.obstacles().len(), 1);
        let pair = game.obstacles()[0];
        assert!((1..=OBSTACLE_VARIANTS).contains(&pair.variant));
        let top = game.stage().node(pair.top).unwrap();
        let bottom = game.stage().node(pair.bottom).unwrap();
        let trigger = game.stage().node(pair.trigger).unwrap();

        let gap = (top.position.y - top.size.y / 2.0) - (bottom.position.y + bottom.size.y / 2.0);
        assert!((gap - PLAYER_SIZE.y * GAP_FACTOR).abs() < 1e-3);
        assert_eq!(top.texture, Texture::EnemyTop(pair.variant));
        assert_eq!(trigger.body.as_ref().unwrap().category, category::SCORE);
        assert_eq!(trigger.texture, Texture::None);
    }

    #[test]
    fn test_rotation_tracks_velocity_only_while_flying() {
        let mut game = GameController::new(11);
        game.update();
        assert_eq!(game.stage().node(game.player()).unwrap().rotation, 0.0);

        game.tap();
        game.update();
        let rotation = game.stage().node(game.player()).unwrap().rotation;
        assert!((rotation - FLAP_IMPULSE.y / PLAYER_MASS * ROTATION_SCALE).abs() < 1e-5);

        game.on_contact(category::PLAYER, category::ENEMY);
        let player = game.player();
        game.stage_mut().set_velocity(player, Vec2::new(0.0, -500.0));
        game.update();
        assert_eq!(game.stage().node(game.player()).unwrap().rotation, 0.0);
    }
}
