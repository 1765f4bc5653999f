use glam::Vec2;
use rr_core::input::{InputState, Key};
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Deserialize, Clone)]
pub struct ReplaySequence {
    #[serde(default = "default_dt")]
    pub fixed_dt: f32,
    pub frames: Vec<ReplayFrame>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ReplayFrame {
    /// Keys held down during this frame. Anything not listed is up.
    #[serde(default)]
    pub held: Vec<Key>,
    #[serde(default)]
    pub mouse_dx: f32,
    #[serde(default)]
    pub mouse_dy: f32,
    #[serde(default)]
    pub scroll: f32,
    #[serde(default = "default_repeat")]
    pub repeat: u32,
}

/// Input for exactly one fixed step.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplayStep {
    pub held: Vec<Key>,
    pub mouse_delta: Vec2,
    pub scroll: f32,
}

impl ReplayStep {
    /// Drive `input` to this step's key set. Keys that go down or up since
    /// the previous step produce edges, so a key held across many steps
    /// only reports `just_pressed` on the first.
    pub fn apply(&self, input: &mut InputState) {
        input.set_held(&self.held);
        input.add_mouse_delta(self.mouse_delta);
        input.add_scroll(self.scroll);
    }
}

impl ReplaySequence {
    pub fn expanded_steps(&self) -> Vec<ReplayStep> {
        let mut out = Vec::new();
        for frame in &self.frames {
            let step = ReplayStep {
                held: frame.held.clone(),
                mouse_delta: Vec2::new(frame.mouse_dx, frame.mouse_dy),
                scroll: frame.scroll,
            };
            for _ in 0..frame.repeat.max(1) {
                out.push(step.clone());
            }
        }
        out
    }
}

pub fn load_replay_from_path(path: &Path) -> Result<ReplaySequence, String> {
    let raw =
        fs::read_to_string(path).map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
    let replay: ReplaySequence = serde_json::from_str(&raw)
        .map_err(|e| format!("Failed to parse replay JSON {}: {e}", path.display()))?;
    validate_replay(&replay)?;
    Ok(replay)
}

fn validate_replay(replay: &ReplaySequence) -> Result<(), String> {
    if replay.fixed_dt <= 0.0 {
        return Err("Replay validation failed: fixed_dt must be > 0".to_string());
    }
    if replay.frames.is_empty() {
        return Err("Replay validation failed: frames list is empty".to_string());
    }
    Ok(())
}

const fn default_dt() -> f32 {
    1.0 / 60.0
}

const fn default_repeat() -> u32 {
    1
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_file_path(name_hint: &str) -> std::path::PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time before unix epoch")
            .as_nanos();
        std::env::temp_dir().join(format!(
            "rr_replay_test_{}_{}_{}.json",
            name_hint,
            std::process::id(),
            nanos
        ))
    }

    #[test]
    fn replay_file_parses_and_expands() {
        let path = temp_file_path("parse");
        fs::write(
            &path,
            r#"{
              "fixed_dt": 0.016666667,
              "frames": [
                { "held": ["w"], "repeat": 3 },
                { "held": ["w", "f"], "mouse_dx": 4.0 },
                { "held": ["2"], "scroll": -1.0 }
              ]
            }"#,
        )
        .expect("write replay file");

        let replay = load_replay_from_path(&path).expect("replay should load");
        let steps = replay.expanded_steps();
        assert_eq!(steps.len(), 5);
        assert_eq!(steps[0].held, vec![Key::W]);
        assert_eq!(steps[3].held, vec![Key::W, Key::F]);
        assert_eq!(steps[3].mouse_delta, Vec2::new(4.0, 0.0));
        assert_eq!(steps[4].held, vec![Key::Digit2]);
        assert_eq!(steps[4].scroll, -1.0);

        let _ = fs::remove_file(path);
    }

    #[test]
    fn held_key_reports_one_press_across_steps() {
        let replay = ReplaySequence {
            fixed_dt: default_dt(),
            frames: vec![
                ReplayFrame {
                    held: vec![Key::F],
                    mouse_dx: 0.0,
                    mouse_dy: 0.0,
                    scroll: 0.0,
                    repeat: 3,
                },
                ReplayFrame {
                    held: Vec::new(),
                    mouse_dx: 0.0,
                    mouse_dy: 0.0,
                    scroll: 0.0,
                    repeat: 1,
                },
            ],
        };
        let mut input = InputState::new();
        let mut presses = 0;
        let mut releases = 0;
        for step in replay.expanded_steps() {
            step.apply(&mut input);
            if input.is_just_pressed(Key::F) {
                presses += 1;
            }
            if input.is_just_released(Key::F) {
                releases += 1;
            }
            input.end_frame();
        }
        assert_eq!(presses, 1);
        assert_eq!(releases, 1);
    }

    #[test]
    fn unknown_key_name_is_a_parse_error() {
        let path = temp_file_path("bad_key");
        fs::write(&path, r#"{ "frames": [ { "held": ["q"] } ] }"#).expect("write replay file");
        let err = load_replay_from_path(&path).expect_err("unknown key should fail");
        assert!(err.starts_with("Failed to parse replay JSON"));

        let _ = fs::remove_file(path);
    }

    #[test]
    fn empty_replay_is_rejected() {
        let path = temp_file_path("empty");
        fs::write(&path, r#"{ "frames": [] }"#).expect("write replay file");
        let err = load_replay_from_path(&path).expect_err("empty replay should fail");
        assert!(err.contains("frames list is empty"));

        let _ = fs::remove_file(path);
    }
}
