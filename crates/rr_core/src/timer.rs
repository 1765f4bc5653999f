//! Explicit timer state for time-driven gameplay.
//!
//! Every timed behaviour (ability cooldowns, sliding doors, button travel,
//! fading feedback text) is a small value advanced once per fixed step with
//! `tick(dt)`. Nothing suspends control flow; the owner decides what to do
//! when a timer reports completion.

/// Re-arming cooldown. `remaining` always stays within `[0, max]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cooldown {
    max: f32,
    remaining: f32,
    active: bool,
}

impl Cooldown {
    pub fn new(max: f32) -> Self {
        let max = max.max(0.0);
        Self {
            max,
            remaining: max,
            active: false,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn remaining(&self) -> f32 {
        self.remaining
    }

    pub fn max(&self) -> f32 {
        self.max
    }

    pub fn arm(&mut self) {
        self.remaining = self.max;
        self.active = true;
    }

    /// Advance by one fixed step. Returns true on the step the cooldown expires.
    pub fn tick(&mut self, dt: f32) -> bool {
        if !self.active {
            return false;
        }
        self.remaining = (self.remaining - dt).max(0.0);
        if self.remaining <= 0.0 {
            self.remaining = self.max;
            self.active = false;
            return true;
        }
        false
    }
}

/// Linear interpolation of a scalar over a fixed duration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tween {
    pub from: f32,
    pub to: f32,
    elapsed: f32,
    duration: f32,
}

impl Tween {
    pub fn new(from: f32, to: f32, duration: f32) -> Self {
        Self {
            from,
            to,
            elapsed: 0.0,
            duration: duration.max(0.0),
        }
    }

    pub fn value(&self) -> f32 {
        if self.duration <= 0.0 {
            return self.to;
        }
        let t = (self.elapsed / self.duration).clamp(0.0, 1.0);
        self.from + (self.to - self.from) * t
    }

    pub fn is_finished(&self) -> bool {
        self.elapsed >= self.duration
    }

    /// Advance and return the new value. The final step lands exactly on `to`.
    pub fn tick(&mut self, dt: f32) -> f32 {
        self.elapsed = (self.elapsed + dt).min(self.duration);
        if self.is_finished() {
            return self.to;
        }
        self.value()
    }
}

/// A transient message that fades out. Showing a new message replaces the
/// running one instead of queueing behind it.
#[derive(Debug, Clone, PartialEq)]
pub struct Fade {
    duration: f32,
    remaining: f32,
    message: Option<String>,
}

impl Fade {
    pub fn new(duration: f32) -> Self {
        Self {
            duration: duration.max(0.0),
            remaining: 0.0,
            message: None,
        }
    }

    pub fn show(&mut self, message: impl Into<String>) {
        self.message = Some(message.into());
        self.remaining = self.duration;
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn alpha(&self) -> f32 {
        if self.message.is_none() || self.duration <= 0.0 {
            return 0.0;
        }
        self.remaining / self.duration
    }

    pub fn tick(&mut self, dt: f32) {
        if self.message.is_none() {
            return;
        }
        self.remaining -= dt;
        if self.remaining <= 0.0 {
            self.remaining = 0.0;
            self.message = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cooldown_starts_inactive_and_full() {
        let cd = Cooldown::new(2.0);
        assert!(!cd.is_active());
        assert_eq!(cd.remaining(), 2.0);
    }

    #[test]
    fn cooldown_expires_and_resets_to_max() {
        let mut cd = Cooldown::new(1.0);
        cd.arm();
        assert!(!cd.tick(0.4));
        assert!(cd.is_active());
        assert!((cd.remaining() - 0.6).abs() < 1e-6);
        assert!(!cd.tick(0.4));
        assert!(cd.tick(0.4));
        assert!(!cd.is_active());
        assert_eq!(cd.remaining(), 1.0);
    }

    #[test]
    fn cooldown_remaining_never_leaves_range() {
        let mut cd = Cooldown::new(0.5);
        cd.arm();
        for _ in 0..10 {
            cd.tick(0.3);
            assert!(cd.remaining() >= 0.0 && cd.remaining() <= cd.max());
        }
    }

    #[test]
    fn inactive_cooldown_ignores_ticks() {
        let mut cd = Cooldown::new(1.0);
        assert!(!cd.tick(5.0));
        assert_eq!(cd.remaining(), 1.0);
    }

    #[test]
    fn tween_lands_exactly_on_target() {
        let mut tween = Tween::new(0.0, 3.0, 1.0);
        let mut last = 0.0;
        for _ in 0..7 {
            last = tween.tick(1.0 / 6.0);
        }
        assert!(tween.is_finished());
        assert_eq!(last, 3.0);
    }

    #[test]
    fn tween_midpoint_is_linear() {
        let mut tween = Tween::new(2.0, 4.0, 2.0);
        let value = tween.tick(1.0);
        assert!((value - 3.0).abs() < 1e-6);
    }

    #[test]
    fn zero_duration_tween_is_instant() {
        let mut tween = Tween::new(1.0, 5.0, 0.0);
        assert_eq!(tween.tick(0.0), 5.0);
        assert!(tween.is_finished());
    }

    #[test]
    fn fade_replaces_running_message() {
        let mut fade = Fade::new(1.0);
        fade.show("Added Save 1");
        fade.tick(0.5);
        assert!((fade.alpha() - 0.5).abs() < 1e-6);

        fade.show("Loaded Save 1");
        assert_eq!(fade.message(), Some("Loaded Save 1"));
        assert_eq!(fade.alpha(), 1.0);

        fade.tick(1.5);
        assert_eq!(fade.message(), None);
        assert_eq!(fade.alpha(), 0.0);
    }
}
