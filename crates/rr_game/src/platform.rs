//! Moving platforms.
//!
//! A platform travels at constant speed through an ordered waypoint list.
//! Arriving at the last waypoint either wraps to the first (`loops`) or
//! reverses the list in place and starts again from its new head, so a
//! non-looping platform ping-pongs along the same path.

use glam::Vec3;

use crate::world::{ObjectId, Transform};

#[derive(Debug, Clone, PartialEq)]
pub struct MovingPlatform {
    waypoints: Vec<Vec3>,
    next_waypoint: usize,
    pub speed: f32,
    pub loops: bool,
    stopped: bool,
    riders: Vec<ObjectId>,
}

impl MovingPlatform {
    pub fn new(waypoints: Vec<Vec3>, speed: f32, loops: bool) -> Self {
        Self {
            waypoints,
            next_waypoint: 0,
            speed,
            loops,
            stopped: false,
            riders: Vec::new(),
        }
    }

    pub fn waypoints(&self) -> &[Vec3] {
        &self.waypoints
    }

    pub fn next_waypoint(&self) -> usize {
        self.next_waypoint
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    pub fn set_stopped(&mut self, stopped: bool) {
        self.stopped = stopped;
    }

    pub fn riders(&self) -> &[ObjectId] {
        &self.riders
    }

    pub fn attach(&mut self, rider: ObjectId) {
        if !self.riders.contains(&rider) {
            self.riders.push(rider);
        }
    }

    pub fn detach(&mut self, rider: ObjectId) {
        self.riders.retain(|&id| id != rider);
    }

    /// Stop and move straight to `waypoint`, which becomes the current target.
    /// Returns false if the index is out of range.
    pub fn snap_to_waypoint(&mut self, waypoint: usize, transform: &mut Transform) -> bool {
        let Some(&position) = self.waypoints.get(waypoint) else {
            return false;
        };
        self.stopped = true;
        self.next_waypoint = waypoint;
        transform.position = position;
        true
    }

    pub fn tick(&mut self, dt: f32, transform: &mut Transform) {
        if self.stopped || self.waypoints.is_empty() {
            return;
        }
        let target = self.waypoints[self.next_waypoint];
        transform.position = transform.position.move_towards(target, self.speed * dt);
        if transform.position == target {
            self.advance_waypoint();
        }
    }

    fn advance_waypoint(&mut self) {
        if self.next_waypoint + 1 >= self.waypoints.len() {
            if !self.loops {
                self.waypoints.reverse();
            }
            self.next_waypoint = 0;
        } else {
            self.next_waypoint += 1;
        }
    }
}
