//! Overlap queries standing in for the host engine's trigger/contact events.
//!
//! Contacts are derived each fixed step from axis-aligned boxes: a trigger
//! "stays" while the boxes overlap, "enters" on the first overlapping step and
//! "exits" on the first step they stop overlapping. Resolution (pushing bodies
//! apart) is not modelled; gameplay only needs the events.

use glam::Vec3;

/// Distance under a body's feet still counted as standing on a surface.
pub const SUPPORT_TOLERANCE: f32 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub center: Vec3,
    pub half_extents: Vec3,
}

impl Aabb {
    pub fn new(center: Vec3, half_extents: Vec3) -> Self {
        Self {
            center,
            half_extents: half_extents.abs(),
        }
    }

    pub fn min(&self) -> Vec3 {
        self.center - self.half_extents
    }

    pub fn max(&self) -> Vec3 {
        self.center + self.half_extents
    }

    pub fn top(&self) -> f32 {
        self.center.y + self.half_extents.y
    }

    pub fn overlaps(&self, other: &Aabb) -> bool {
        let (a_min, a_max) = (self.min(), self.max());
        let (b_min, b_max) = (other.min(), other.max());
        a_min.x <= b_max.x
            && a_max.x >= b_min.x
            && a_min.y <= b_max.y
            && a_max.y >= b_min.y
            && a_min.z <= b_max.z
            && a_max.z >= b_min.z
    }

    /// True if `point` lies over this box's top face footprint (XZ only).
    pub fn covers_xz(&self, point: Vec3) -> bool {
        let (min, max) = (self.min(), self.max());
        point.x >= min.x && point.x <= max.x && point.z >= min.z && point.z <= max.z
    }
}

/// Enter/stay/exit tracking for one contact pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContactState {
    touching: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactEvent {
    Enter,
    Stay,
    Exit,
}

impl ContactState {
    pub fn is_touching(&self) -> bool {
        self.touching
    }

    /// Feed this step's overlap result; returns the resulting event, if any.
    pub fn update(&mut self, overlapping: bool) -> Option<ContactEvent> {
        let event = match (self.touching, overlapping) {
            (false, true) => Some(ContactEvent::Enter),
            (true, true) => Some(ContactEvent::Stay),
            (true, false) => Some(ContactEvent::Exit),
            (false, false) => None,
        };
        self.touching = overlapping;
        event
    }
}
