//! Sliding doors.
//!
//! A door is a panel that rises by `open_height` when opened and drops back
//! when closed, each over its own duration. `is_open` flips immediately when a
//! slide starts; it is the state buttons read when resolving toggles, not the
//! panel's current height.

use rr_core::timer::Tween;

use crate::world::Transform;

#[derive(Debug, Clone, PartialEq)]
pub struct Door {
    is_open: bool,
    pub open_height: f32,
    pub open_time: f32,
    pub close_time: f32,
    closed_y: f32,
    slide: Option<Tween>,
}

impl Door {
    /// `closed_y` is the panel height in the closed position.
    pub fn new(closed_y: f32, open_height: f32, open_time: f32, close_time: f32) -> Self {
        Self {
            is_open: false,
            open_height,
            open_time,
            close_time,
            closed_y,
            slide: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.is_open
    }

    pub fn is_sliding(&self) -> bool {
        self.slide.is_some()
    }

    pub fn open_y(&self) -> f32 {
        self.closed_y + self.open_height
    }

    pub fn closed_y(&self) -> f32 {
        self.closed_y
    }

    /// Start sliding open. No-op if already open.
    pub fn open(&mut self, transform: &Transform) {
        if self.is_open {
            return;
        }
        self.slide = Some(Tween::new(
            transform.position.y,
            self.open_y(),
            self.open_time,
        ));
        self.is_open = true;
    }

    /// Start sliding shut. No-op if already closed.
    pub fn close(&mut self, transform: &Transform) {
        if !self.is_open {
            return;
        }
        self.slide = Some(Tween::new(
            transform.position.y,
            self.closed_y,
            self.close_time,
        ));
        self.is_open = false;
    }

    /// Snap to the open position without animating. Only used when a room is
    /// set up with a door that starts open.
    pub fn open_initial(&mut self, transform: &mut Transform) {
        if self.is_open {
            return;
        }
        self.slide = None;
        transform.position.y = self.open_y();
        self.is_open = true;
    }

    pub fn close_initial(&mut self, transform: &mut Transform) {
        if !self.is_open {
            return;
        }
        self.slide = None;
        transform.position.y = self.closed_y;
        self.is_open = false;
    }

    pub fn tick(&mut self, dt: f32, transform: &mut Transform) {
        let Some(slide) = self.slide.as_mut() else {
            return;
        };
        transform.position.y = slide.tick(dt);
        if slide.is_finished() {
            self.slide = None;
        }
    }
}
