//! Arena Duel headless driver
//!
//! Usage: `arena-duel [settings-path] [seed] [seconds]`
//!
//! Runs a scripted player against the CPU at 60 frames per second and logs
//! health once per simulated second. `RUST_LOG=info` shows the summary,
//! `debug` adds hits and bursts.

use std::env;
use std::process::ExitCode;

use arena_duel::game::Phase;
use arena_duel::renderer::RecordingSink;
use arena_duel::sim::{InputState, SimEvent};
use arena_duel::{Game, SetupError, Settings};

const FRAME_DT: f32 = 1.0 / 60.0;
const DEFAULT_SEED: u64 = 42;
const DEFAULT_SECONDS: f32 = 30.0;

fn main() -> ExitCode {
    env_logger::init();

    let args: Vec<String> = env::args().skip(1).collect();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &[String]) -> Result<(), SetupError> {
    let settings = match args.first() {
        Some(path) => Settings::load(path)?,
        None => Settings::builtin()?,
    };
    let seed = parse_or(args.get(1), DEFAULT_SEED, "seed");
    let seconds = parse_or(args.get(2), DEFAULT_SECONDS, "seconds");

    log::info!("Arena Duel (headless) starting: seed {seed}, {seconds}s");
    let mut game = Game::new(&settings, seed)?;
    let mut sink = RecordingSink::default();

    let frames = (seconds / FRAME_DT).ceil() as u64;
    let mut hits = 0usize;
    let mut bursts = 0usize;

    for frame in 0..frames {
        sink.clear();
        let input = scripted_input(&game, frame);
        game.frame(FRAME_DT, input, &mut sink);

        for event in game.drain_events() {
            match event {
                SimEvent::ProjectileHit { .. } => hits += 1,
                SimEvent::ClusterBurst { .. } => bursts += 1,
                _ => {}
            }
        }

        if frame % 60 == 0 && game.current_phase() == Some(Phase::Duel) {
            let arena = game.arena();
            log::info!(
                "t={:>5.1}s player {:?} cpu {:?} ({} entities)",
                frame as f32 * FRAME_DT,
                arena.health(arena.player()),
                arena.health(arena.cpu()),
                arena.arbiter().len()
            );
        }
    }

    let arena = game.arena();
    log::info!(
        "Finished: player {:?}, cpu {:?}, {} hits, {} cluster bursts",
        arena.health(arena.player()),
        arena.health(arena.cpu()),
        hits,
        bursts
    );
    Ok(())
}

/// Strafe in a slow square around the arena while shooting at the CPU
fn scripted_input(game: &Game, frame: u64) -> InputState {
    let arena = game.arena();
    let aim_target = arena.robot_position(arena.cpu()).unwrap_or_default();
    let leg = (frame / 90) % 4;

    InputState {
        up: leg == 0,
        left: leg == 1,
        down: leg == 2,
        right: leg == 3,
        aim_target,
        primary: true,
        secondary: frame % 240 == 0,
        // Only the menu listens
        confirm: true,
    }
}

fn parse_or<T>(arg: Option<&String>, default: T, name: &str) -> T
where
    T: std::str::FromStr + std::fmt::Display,
{
    match arg {
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            log::warn!("Invalid {name} {raw:?}, using {default}");
            default
        }),
        None => default,
    }
}
