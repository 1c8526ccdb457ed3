//! Flappy Dragon headless runner
//!
//! Plays a number of runs with the autopilot and prints a JSON report.
//!
//! Usage:
//!   flappy-dragon --runs 5 --seed 42
//!   RUST_LOG=debug flappy-dragon --settings settings.json

use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::Parser;
use serde::Serialize;

use flappy_dragon::app::{App, LogPresenter, RunSummary};
use flappy_dragon::audio::LogBackend;
use flappy_dragon::autopilot::Autopilot;
use flappy_dragon::consts::SIM_DT;
use flappy_dragon::settings::Settings;
use flappy_dragon::sim::GamePhase;

#[derive(Parser, Debug)]
#[command(name = "flappy-dragon")]
#[command(about = "Run Flappy Dragon headless with the autopilot")]
struct Args {
    /// Seed of the first run (overrides the settings file)
    #[arg(long)]
    seed: Option<u64>,

    /// Number of runs to play
    #[arg(long, default_value_t = 3)]
    runs: u32,

    /// Cap on simulated seconds per run
    #[arg(long, default_value_t = 120.0)]
    seconds: f32,

    /// Settings JSON file
    #[arg(long)]
    settings: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct RunReport {
    run: u32,
    seed: u64,
    score: u32,
    seconds: f32,
    /// False when the run hit the time cap still flying
    crashed: bool,
}

#[derive(Debug, Serialize)]
struct Report {
    runs: Vec<RunReport>,
    best: Option<u32>,
    /// Every run that ended in a crash
    finished: Vec<RunSummary>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if args.runs == 0 {
        bail!("--runs must be > 0");
    }
    if args.seconds.is_nan() || args.seconds <= 0.0 {
        bail!("--seconds must be > 0");
    }

    let mut settings = match &args.settings {
        Some(path) => Settings::load(path),
        None => Settings::default(),
    };
    if let Some(seed) = args.seed {
        settings.seed = seed;
    }
    log::info!("Flappy Dragon (headless) starting, seed {}", settings.seed);

    let max_steps = (args.seconds / SIM_DT).ceil() as u64;
    let pilot = Autopilot::new();
    let mut app = App::new(settings, LogBackend, LogPresenter);
    let mut reports = Vec::with_capacity(args.runs as usize);

    for run in 0..args.runs {
        let mut steps = 0u64;
        while steps < max_steps {
            let snapshot = app.game().snapshot();
            if matches!(snapshot.phase, GamePhase::RestartReady { .. }) {
                break;
            }
            if pilot.next_tap(&snapshot) {
                app.tap();
            }
            app.step();
            steps += 1;
        }

        let game = app.game();
        let crashed = !game.phase().is_flying();
        if !crashed {
            log::warn!("Run {} hit the {}s cap", run, args.seconds);
        }
        reports.push(RunReport {
            run,
            seed: app.scene().seed,
            score: game.score(),
            seconds: steps as f32 * SIM_DT,
            crashed,
        });

        if run + 1 < args.runs {
            if matches!(game.phase(), GamePhase::RestartReady { .. }) {
                // Same path a player takes
                app.tap();
                app.step();
            } else {
                app.restart();
            }
        }
    }

    let report = Report {
        runs: reports,
        best: app.high_scores().top_score(),
        finished: app.finished_runs().to_vec(),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
