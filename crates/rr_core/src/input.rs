//! Input state tracking with both edge-triggered and level-triggered queries.
//!
//! - **Level-triggered (held):** `is_held(key)` returns true every frame the key
//!   is physically down. Used for continuous actions like movement and the
//!   interact signal buttons listen for.
//!
//! - **Edge-triggered (just_pressed / just_released):** These are true only during
//!   the frame the transition happened. They are cleared by `end_frame()`, which
//!   the runner calls only after at least one fixed simulation step has consumed
//!   them. A save or load press therefore fires exactly once per key-down.
//!
//! Mouse look and scroll are accumulated between steps and drained with the
//! other transients.

use std::collections::HashSet;

use glam::Vec2;
use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Key {
    W,
    A,
    S,
    D,
    Space,
    /// Interact
    E,
    /// Save state
    F,
    /// Load state
    R,
    #[serde(rename = "1")]
    Digit1,
    #[serde(rename = "2")]
    Digit2,
    #[serde(rename = "3")]
    Digit3,
    #[serde(rename = "4")]
    Digit4,
    #[serde(rename = "5")]
    Digit5,
    #[serde(rename = "6")]
    Digit6,
    #[serde(rename = "7")]
    Digit7,
    #[serde(rename = "8")]
    Digit8,
    #[serde(rename = "9")]
    Digit9,
    Escape,
}

impl Key {
    pub const ALL: &'static [Key] = &[
        Key::W,
        Key::A,
        Key::S,
        Key::D,
        Key::Space,
        Key::E,
        Key::F,
        Key::R,
        Key::Digit1,
        Key::Digit2,
        Key::Digit3,
        Key::Digit4,
        Key::Digit5,
        Key::Digit6,
        Key::Digit7,
        Key::Digit8,
        Key::Digit9,
        Key::Escape,
    ];

    pub const DIGITS: [Key; 9] = [
        Key::Digit1,
        Key::Digit2,
        Key::Digit3,
        Key::Digit4,
        Key::Digit5,
        Key::Digit6,
        Key::Digit7,
        Key::Digit8,
        Key::Digit9,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::W => "w",
            Self::A => "a",
            Self::S => "s",
            Self::D => "d",
            Self::Space => "space",
            Self::E => "e",
            Self::F => "f",
            Self::R => "r",
            Self::Digit1 => "1",
            Self::Digit2 => "2",
            Self::Digit3 => "3",
            Self::Digit4 => "4",
            Self::Digit5 => "5",
            Self::Digit6 => "6",
            Self::Digit7 => "7",
            Self::Digit8 => "8",
            Self::Digit9 => "9",
            Self::Escape => "escape",
        }
    }

    /// Number key `n` (1-9).
    pub fn digit(n: usize) -> Option<Key> {
        n.checked_sub(1).and_then(|index| Self::DIGITS.get(index).copied())
    }

    pub fn from_name(name: &str) -> Option<Key> {
        Self::ALL.iter().copied().find(|key| key.name() == name)
    }
}

pub struct InputState {
    held: HashSet<Key>,
    just_pressed: HashSet<Key>,
    just_released: HashSet<Key>,

    mouse_delta: Vec2,
    scroll_delta: f32,
}

impl InputState {
    pub fn new() -> Self {
        Self {
            held: HashSet::new(),
            just_pressed: HashSet::new(),
            just_released: HashSet::new(),
            mouse_delta: Vec2::ZERO,
            scroll_delta: 0.0,
        }
    }

    pub fn key_down(&mut self, key: Key) {
        if self.held.insert(key) {
            self.just_pressed.insert(key);
        }
    }

    pub fn key_up(&mut self, key: Key) {
        if self.held.remove(&key) {
            self.just_released.insert(key);
        }
    }

    /// Bring the held set in line with `keys`, generating the press/release
    /// edges a real device would have produced.
    pub fn set_held(&mut self, keys: &[Key]) {
        let released: Vec<Key> = self
            .held
            .iter()
            .copied()
            .filter(|key| !keys.contains(key))
            .collect();
        for key in released {
            self.key_up(key);
        }
        for &key in keys {
            self.key_down(key);
        }
    }

    pub fn add_mouse_delta(&mut self, delta: Vec2) {
        self.mouse_delta += delta;
    }

    pub fn add_scroll(&mut self, amount: f32) {
        self.scroll_delta += amount;
    }

    pub fn is_held(&self, key: Key) -> bool {
        self.held.contains(&key)
    }

    pub fn is_just_pressed(&self, key: Key) -> bool {
        self.just_pressed.contains(&key)
    }

    pub fn is_just_released(&self, key: Key) -> bool {
        self.just_released.contains(&key)
    }

    pub fn mouse_delta(&self) -> Vec2 {
        self.mouse_delta
    }

    pub fn scroll_delta(&self) -> f32 {
        self.scroll_delta
    }

    /// -1.0, 0.0 or 1.0 from a pair of opposing keys.
    pub fn axis(&self, negative: Key, positive: Key) -> f32 {
        let mut value = 0.0;
        if self.is_held(positive) {
            value += 1.0;
        }
        if self.is_held(negative) {
            value -= 1.0;
        }
        value
    }

    pub fn end_frame(&mut self) {
        self.just_pressed.clear();
        self.just_released.clear();
        self.mouse_delta = Vec2::ZERO;
        self.scroll_delta = 0.0;
    }
}

impl Default for InputState {
    fn default() -> Self {
        Self::new()
    }
}
