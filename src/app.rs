//! Host session: presentation, fixed-timestep loop and restart
//!
//! The app owns the current scene and everything that outlives it (settings,
//! audio, leaderboard). Restarting drops the whole scene, timers included,
//! and mounts a freshly built one.

use serde::{Deserialize, Serialize};

use crate::audio::{AudioBackend, AudioManager, LogBackend, MusicTrack};
use crate::consts::*;
use crate::highscores::HighScores;
use crate::run_seed;
use crate::settings::Settings;
use crate::sim::{GameController, GameEvent, TickInput, tick};

/// Visual effect used when a scene replaces another
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Transition {
    Doorway { duration: f32 },
    Fade { duration: f32 },
    FlipHorizontal { duration: f32 },
}

impl Transition {
    pub fn name(&self) -> &'static str {
        match self {
            Transition::Doorway { .. } => "doorway",
            Transition::Fade { .. } => "fade",
            Transition::FlipHorizontal { .. } => "flip-horizontal",
        }
    }

    pub fn duration(&self) -> f32 {
        match self {
            Transition::Doorway { duration }
            | Transition::Fade { duration }
            | Transition::FlipHorizontal { duration } => *duration,
        }
    }
}

/// Identity of a mounted scene
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneInfo {
    /// Run index within the session (0-based)
    pub run: u32,
    pub seed: u64,
}

/// Presentation surface: told whenever a new scene is mounted
pub trait Presenter {
    fn mount(&mut self, scene: &SceneInfo, transition: Option<Transition>);
}

/// Presenter that only logs scene changes
#[derive(Debug, Clone, Copy, Default)]
pub struct LogPresenter;

impl Presenter for LogPresenter {
    fn mount(&mut self, scene: &SceneInfo, transition: Option<Transition>) {
        match transition {
            Some(t) => log::info!(
                "Mounting run {} (seed {}) with {} transition ({:.1}s)",
                scene.run,
                scene.seed,
                t.name(),
                t.duration()
            ),
            None => log::info!("Mounting run {} (seed {})", scene.run, scene.seed),
        }
    }
}

/// Outcome of a finished run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub run: u32,
    pub seed: u64,
    pub score: u32,
    pub obstacles_spawned: u32,
    pub ticks: u64,
    /// Leaderboard rank, if the score made it
    pub rank: Option<usize>,
}

/// Game session
pub struct App<B: AudioBackend = LogBackend, P: Presenter = LogPresenter> {
    settings: Settings,
    audio: AudioManager<B>,
    presenter: P,
    high_scores: HighScores,
    game: GameController,
    scene: SceneInfo,
    input: TickInput,
    accumulator: f32,
    finished: Vec<RunSummary>,
}

impl<B: AudioBackend, P: Presenter> App<B, P> {
    /// Start background music and mount the first scene
    pub fn new(settings: Settings, backend: B, mut presenter: P) -> Self {
        let mut audio = AudioManager::from_settings(backend, &settings);
        audio.play_music(MusicTrack::Background);

        let scene = SceneInfo {
            run: 0,
            seed: run_seed(settings.seed, 0),
        };
        let game = GameController::new(scene.seed);
        presenter.mount(&scene, None);

        Self {
            settings,
            audio,
            presenter,
            high_scores: HighScores::new(),
            game,
            scene,
            input: TickInput::default(),
            accumulator: 0.0,
            finished: Vec::new(),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn audio(&self) -> &AudioManager<B> {
        &self.audio
    }

    pub fn audio_mut(&mut self) -> &mut AudioManager<B> {
        &mut self.audio
    }

    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    pub fn high_scores(&self) -> &HighScores {
        &self.high_scores
    }

    /// Current scene
    pub fn game(&self) -> &GameController {
        &self.game
    }

    pub fn scene(&self) -> SceneInfo {
        self.scene
    }

    /// Runs that reached game over, in order
    pub fn finished_runs(&self) -> &[RunSummary] {
        &self.finished
    }

    /// Queue a tap for the next simulation step
    pub fn tap(&mut self) {
        self.input.taps += 1;
    }

    /// Account for a rendered frame: run as many fixed steps as it covers
    pub fn update(&mut self, frame_dt: f32) {
        // NaN compares false everywhere and would poison the accumulator
        if !frame_dt.is_finite() {
            log::warn!("Ignoring frame time {}", frame_dt);
            return;
        }
        self.accumulator += frame_dt.clamp(0.0, MAX_FRAME_DT);

        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            self.step();
            self.accumulator -= SIM_DT;
            substeps += 1;
        }
    }

    /// Run exactly one fixed step and handle what it produced
    pub fn step(&mut self) {
        let input = std::mem::take(&mut self.input);
        tick(&mut self.game, &input, SIM_DT);
        self.process_events();
    }

    /// Tear down the current scene and mount the next run
    pub fn restart(&mut self) {
        let scene = SceneInfo {
            run: self.scene.run + 1,
            seed: run_seed(self.settings.seed, self.scene.run + 1),
        };
        let transition = self.settings.restart_transition;

        self.game = GameController::new(scene.seed);
        self.scene = scene;
        self.input = TickInput::default();
        self.presenter.mount(&scene, transition);
    }

    fn process_events(&mut self) {
        let mut restart = false;
        for event in self.game.drain_events() {
            match event {
                GameEvent::Sound(effect) => self.audio.play(effect),
                GameEvent::GameOver { score } => self.record_run(score),
                GameEvent::RestartRequested => restart = true,
                GameEvent::Started
                | GameEvent::ObstacleSpawned { .. }
                | GameEvent::Scored { .. }
                | GameEvent::RestartReady => {}
            }
        }
        if restart {
            self.restart();
        }
    }

    fn record_run(&mut self, score: u32) {
        let rank = self
            .high_scores
            .add_score(score, self.scene.run, self.scene.seed);
        if let Some(rank) = rank {
            log::info!("Run {} placed #{} with {}", self.scene.run, rank, score);
        }
        self.finished.push(RunSummary {
            run: self.scene.run,
            seed: self.scene.seed,
            score,
            obstacles_spawned: self.game.spawned(),
            ticks: self.game.time_ticks(),
            rank,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::SoundEffect;
    use crate::category;
    use crate::sim::GamePhase;

    #[derive(Debug, Default)]
    struct Mounts(Vec<(SceneInfo, Option<Transition>)>);

    impl Presenter for Mounts {
        fn mount(&mut self, scene: &SceneInfo, transition: Option<Transition>) {
            self.0.push((*scene, transition));
        }
    }

    #[derive(Debug, Default)]
    struct Sounds {
        effects: Vec<SoundEffect>,
        music: Vec<MusicTrack>,
    }

    impl AudioBackend for Sounds {
        fn play_music(&mut self, track: MusicTrack, _volume: f32) {
            self.music.push(track);
        }

        fn stop_music(&mut self) {}

        fn play_effect(&mut self, effect: SoundEffect, _volume: f32) {
            self.effects.push(effect);
        }
    }

    fn app() -> App<Sounds, Mounts> {
        App::new(Settings::default(), Sounds::default(), Mounts::default())
    }

    #[test]
    fn test_first_mount_has_no_transition() {
        let app = app();
        assert_eq!(app.presenter().0.len(), 1);
        assert_eq!(app.presenter().0[0].1, None);
        assert_eq!(app.scene().run, 0);
        assert_eq!(app.audio().backend().music, vec![MusicTrack::Background]);
    }

    #[test]
    fn test_update_runs_fixed_steps() {
        let mut app = app();
        app.update(SIM_DT * 3.0 + SIM_DT / 2.0);
        assert_eq!(app.game().time_ticks(), 3);

        // Huge frames are clamped
        app.update(5.0);
        assert_eq!(app.game().time_ticks(), 3 + 6);
    }

    #[test]
    fn test_non_finite_frame_is_ignored() {
        let mut app = app();
        app.update(f32::NAN);
        app.update(f32::INFINITY);
        assert_eq!(app.game().time_ticks(), 0);

        // The loop still runs afterwards
        app.update(SIM_DT * 2.5);
        assert_eq!(app.game().time_ticks(), 2);
    }

    #[test]
    fn test_tap_is_consumed_by_one_step() {
        let mut app = app();
        app.tap();
        app.step();
        assert!(app.game().phase().is_flying());
        let v = app.game().snapshot().player_velocity.y;
        app.step();
        // No second impulse: gravity only
        assert!(app.game().snapshot().player_velocity.y < v);
    }

    #[test]
    fn test_crash_restart_cycle() {
        let mut app = app();
        app.tap();
        app.step();

        // Let the player fall onto the floor sensor
        while app.game().phase().is_flying() {
            app.step();
        }
        assert_eq!(app.game().phase(), GamePhase::GameOver);
        assert_eq!(app.audio().backend().effects, vec![SoundEffect::Hit]);
        assert_eq!(app.finished_runs().len(), 1);
        assert_eq!(app.finished_runs()[0].score, 0);
        assert_eq!(app.finished_runs()[0].rank, None);

        // Taps during the delay do nothing
        app.tap();
        app.step();
        assert_eq!(app.game().phase(), GamePhase::GameOver);

        let steps = (GAME_OVER_DELAY / SIM_DT).ceil() as u32 + 1;
        for _ in 0..steps {
            app.step();
        }
        assert!(matches!(app.game().phase(), GamePhase::RestartReady { .. }));

        app.tap();
        app.tap();
        app.step();
        assert_eq!(app.scene().run, 1);
        assert_eq!(app.game().phase(), GamePhase::NotStarted);
        assert_eq!(app.game().score(), 0);

        let mounts = &app.presenter().0;
        assert_eq!(mounts.len(), 2);
        assert_eq!(
            mounts[1].1,
            Some(Transition::Doorway {
                duration: RESTART_TRANSITION_SECS
            })
        );
        assert_ne!(mounts[0].0.seed, mounts[1].0.seed);
    }

    #[test]
    fn test_scoring_plays_sound() {
        let mut app = app();
        app.tap();
        app.step();
        app.game.on_contact(category::PLAYER, category::SCORE);
        app.process_events();
        assert_eq!(app.audio().backend().effects, vec![SoundEffect::Score]);
    }

    #[test]
    fn test_restart_without_transition() {
        let settings = Settings {
            restart_transition: None,
            ..Settings::default()
        };
        let mut app = App::new(settings, Sounds::default(), Mounts::default());
        app.restart();
        assert_eq!(app.presenter().0[1].1, None);
    }

    #[test]
    fn test_restart_uses_configured_transition() {
        let fade = Transition::Fade { duration: 0.4 };
        let settings = Settings {
            restart_transition: Some(fade),
            ..Settings::default()
        };
        let mut app = App::new(settings, Sounds::default(), Mounts::default());
        app.restart();
        app.restart();
        assert_eq!(app.presenter().0[1].1, Some(fade));
        assert_eq!(app.presenter().0[2].0.run, 2);
    }
}
