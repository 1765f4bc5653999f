//! Rewind Rooms -- headless runner.
//!
//! Loads a level, then drives the session with a **fixed-timestep** loop (see
//! `TimeState`):
//!
//!   1. `begin_frame()` -- feed one frame of time into the accumulator
//!   2. `while should_step()` -- apply this step's input, run one fixed step
//!   3. poll the level file and the feedback script for changes
//!
//! Input comes from a replay file when one is given; otherwise the player
//! stands idle for `--steps` steps. A confirmed quit prompt ends the run early.
//! Feedback goes to the log and, when `--script` is given, to a Lua script.
//!
//! Hot reload: the level JSON and the Lua script are watched via mtime polling
//! and reloaded at frame boundaries (between fixed steps). A level that fails
//! to load or wire up leaves the running session untouched.

mod button;
mod contact;
mod controller;
mod door;
mod feedback;
mod hud;
mod level;
mod link;
mod lua_bridge;
mod platform;
mod replay;
mod save_state;
mod session;
mod trigger;
mod world;

use std::path::PathBuf;

use feedback::{FeedbackSink, LogSink};
use level::{load_level_from_path, LevelWatcher};
use lua_bridge::LuaFeedback;
use replay::{load_replay_from_path, ReplayStep};
use rr_core::input::InputState;
use rr_core::time::TimeState;
use session::GameSession;

const DEFAULT_STEPS: u64 = 600;

struct RunOptions {
    level_path: PathBuf,
    replay_path: Option<PathBuf>,
    script_path: Option<PathBuf>,
    steps: Option<u64>,
}

fn usage() -> String {
    "Usage: cargo run -p rr_game -- <level.json> [--replay <replay.json>] [--script <feedback.lua>] [--steps <n>]\nExample: cargo run -p rr_game -- assets/levels/puzzle_room_1.json --replay assets/replays/room1.json".to_string()
}

fn parse_args(args: &[String]) -> Result<RunOptions, String> {
    let mut level_path = None;
    let mut replay_path = None;
    let mut script_path = None;
    let mut steps = None;

    let mut iter = args.iter().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--replay" => replay_path = Some(PathBuf::from(iter.next().ok_or_else(usage)?)),
            "--script" => script_path = Some(PathBuf::from(iter.next().ok_or_else(usage)?)),
            "--steps" => {
                let raw = iter.next().ok_or_else(usage)?;
                let parsed = raw
                    .parse::<u64>()
                    .map_err(|e| format!("Invalid --steps value '{raw}': {e}"))?;
                steps = Some(parsed);
            }
            other if other.starts_with("--") => {
                return Err(format!("Unknown option '{other}'\n{}", usage()));
            }
            other => {
                if level_path.is_some() {
                    return Err(usage());
                }
                level_path = Some(PathBuf::from(other));
            }
        }
    }

    Ok(RunOptions {
        level_path: level_path.ok_or_else(usage)?,
        replay_path,
        script_path,
        steps,
    })
}

fn reload_level(session: &mut GameSession, watcher: &LevelWatcher) {
    let level = match load_level_from_path(watcher.path()) {
        Ok(level) => level,
        Err(err) => {
            log::error!("Level reload failed: {err}");
            return;
        }
    };
    match GameSession::from_level(&level) {
        Ok(fresh) => {
            *session = fresh;
            log::info!("Level reloaded: {} ({})", level.scene, level.version);
        }
        Err(err) => log::error!("Level reload failed: {err}"),
    }
}

fn main() -> Result<(), String> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().collect();
    let options = parse_args(&args)?;

    log::info!("Rewind Rooms starting...");

    let level = load_level_from_path(&options.level_path)?;
    let mut session = GameSession::from_level(&level)
        .map_err(|e| format!("Failed to set up level {}: {e}", options.level_path.display()))?;
    let mut watcher = LevelWatcher::new(options.level_path.clone());
    log::info!(
        "Level loaded: {} ({}), fixed step {:.4}s",
        level.scene,
        level.version,
        session.fixed_dt()
    );

    let steps: Vec<ReplayStep> = match &options.replay_path {
        Some(path) => {
            let replay = load_replay_from_path(path)?;
            if (replay.fixed_dt - session.fixed_dt()).abs() > f32::EPSILON {
                log::warn!(
                    "Replay fixed_dt {} differs from level fixed_dt {}; using the level's",
                    replay.fixed_dt,
                    session.fixed_dt()
                );
            }
            let mut steps = replay.expanded_steps();
            if let Some(limit) = options.steps {
                steps.truncate(limit as usize);
            }
            log::info!("Replay loaded: {} steps from {}", steps.len(), path.display());
            steps
        }
        None => {
            let count = options.steps.unwrap_or(DEFAULT_STEPS);
            vec![
                ReplayStep {
                    held: Vec::new(),
                    mouse_delta: glam::Vec2::ZERO,
                    scroll: 0.0,
                };
                count as usize
            ]
        }
    };

    let mut log_sink = LogSink;
    let mut lua = options.script_path.clone().map(LuaFeedback::new);

    let mut time = TimeState::new(f64::from(session.fixed_dt()));
    let mut input = InputState::new();
    let mut pending = steps.iter();
    let mut finished = false;

    while !finished {
        time.begin_frame(time.fixed_dt);
        while time.should_step() {
            let Some(step) = pending.next() else {
                finished = true;
                break;
            };
            step.apply(&mut input);

            let mut sinks: Vec<&mut dyn FeedbackSink> = vec![&mut log_sink];
            if let Some(lua) = lua.as_mut() {
                sinks.push(lua);
            }
            session
                .step(&input, &mut sinks)
                .map_err(|e| format!("Simulation halted at step {}: {e}", session.step_count()))?;
            input.end_frame();

            if let Some(command) = session.take_scene_command() {
                match command.target_scene() {
                    Some(scene) => log::info!(
                        "Scene change to '{scene}' requested; staying in {}",
                        session.scene()
                    ),
                    None => {
                        log::info!("Quit requested at step {}", session.step_count());
                        finished = true;
                        break;
                    }
                }
            }
        }
        time.end_frame();

        if watcher.should_reload() {
            reload_level(&mut session, &watcher);
        }
        if let Some(lua) = lua.as_mut() {
            lua.check_reload();
        }
    }

    let snapshot = session.snapshot();
    log::info!(
        "Finished after {} steps ({:.2}s simulated)",
        time.fixed_step_count,
        time.total_time
    );
    log::info!(
        "Player at ({:.2}, {:.2}, {:.2}), slot {} selected, filled {:?}",
        snapshot.player_position.x,
        snapshot.player_position.y,
        snapshot.player_position.z,
        snapshot.selected_slot + 1,
        snapshot.filled_slots
    );
    log::info!(
        "Open doors: {:?}; moving platforms: {:?}",
        snapshot.open_doors,
        snapshot.moving_platforms
    );
    let hud = session.hud();
    let sprites: Vec<usize> = (0..session.store().slot_count())
        .filter_map(|slot| hud.sprite(slot))
        .collect();
    log::info!(
        "HUD: {} screen, slot sprites {:?}, text {:?} (alpha {:.2})",
        hud.screen(),
        sprites,
        hud.text(),
        hud.text_alpha()
    );
    for button in session.buttons() {
        log::info!(
            "Button '{}': {}{}",
            button.name,
            if button.is_pressed() { "pressed" } else { "idle" },
            if button.is_enabled() { "" } else { ", disabled" }
        );
    }
    if let Some(lua) = &lua {
        log::info!("{} ({} notifications delivered)", lua.status(), lua.delivered());
    }

    Ok(())
}
