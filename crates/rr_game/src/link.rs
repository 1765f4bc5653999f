//! Link table entries: what a button drives and how.
//!
//! Each `LinkDescriptor` names one door or moving platform plus the policy a
//! button applies to it. Resolution always reads the target's current state
//! from the world (door `is_open`, platform `stopped`) rather than trusting
//! what the button last did, since several buttons and triggers may drive the
//! same target.

use serde::Deserialize;
use thiserror::Error;

use crate::world::{ObjectId, World};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkKind {
    MovingPlatform,
    Door,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkState {
    Open,
    Closed,
    Stopped,
    Moving,
}

impl LinkState {
    pub fn valid_for(self, kind: LinkKind) -> bool {
        match kind {
            LinkKind::Door => matches!(self, LinkState::Open | LinkState::Closed),
            LinkKind::MovingPlatform => matches!(self, LinkState::Stopped | LinkState::Moving),
        }
    }
}

/// Secondary platform to hard-reset whenever the owning link is pressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResetTarget {
    pub target: ObjectId,
    pub waypoint: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LinkDescriptor {
    pub kind: LinkKind,
    pub target: ObjectId,
    pub default_state: LinkState,
    pub pressed_state: LinkState,
    pub resets_when_released: bool,
    pub toggles_on_press: bool,
    pub reset_targets: Vec<ResetTarget>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LinkError {
    #[error("linked object '{0}' does not exist")]
    UnknownObject(String),
    #[error("linked object {0:?} has no door behavior")]
    MissingDoor(ObjectId),
    #[error("linked object {0:?} has no moving platform behavior")]
    MissingPlatform(ObjectId),
    #[error("link state {state:?} is not valid for a {kind:?} link")]
    StateMismatch { kind: LinkKind, state: LinkState },
    #[error("trigger refers to button #{index} but the room has {count}")]
    ButtonOutOfRange { index: usize, count: usize },
    #[error("reset waypoint {waypoint} is out of range for platform {target:?} ({count} waypoints)")]
    WaypointOutOfRange {
        target: ObjectId,
        waypoint: usize,
        count: usize,
    },
}

impl LinkDescriptor {
    /// Check everything that can be checked before the first press. A room
    /// with any invalid link must not start.
    pub fn validate(&self, world: &World) -> Result<(), LinkError> {
        for state in [self.default_state, self.pressed_state] {
            if !state.valid_for(self.kind) {
                return Err(LinkError::StateMismatch {
                    kind: self.kind,
                    state,
                });
            }
        }
        self.require_component(world)?;
        for reset in &self.reset_targets {
            let platform = world
                .platform(reset.target)
                .ok_or(LinkError::MissingPlatform(reset.target))?;
            let count = platform.waypoints().len();
            if reset.waypoint >= count {
                return Err(LinkError::WaypointOutOfRange {
                    target: reset.target,
                    waypoint: reset.waypoint,
                    count,
                });
            }
        }
        Ok(())
    }

    fn require_component(&self, world: &World) -> Result<(), LinkError> {
        match self.kind {
            LinkKind::Door => world
                .door(self.target)
                .map(|_| ())
                .ok_or(LinkError::MissingDoor(self.target)),
            LinkKind::MovingPlatform => world
                .platform(self.target)
                .map(|_| ())
                .ok_or(LinkError::MissingPlatform(self.target)),
        }
    }

    /// Whether the target currently counts as "on" for indicator purposes:
    /// door open, or platform moving.
    pub fn is_active(&self, world: &World) -> Result<bool, LinkError> {
        match self.kind {
            LinkKind::Door => world
                .door(self.target)
                .map(|door| door.is_open())
                .ok_or(LinkError::MissingDoor(self.target)),
            LinkKind::MovingPlatform => world
                .platform(self.target)
                .map(|platform| !platform.is_stopped())
                .ok_or(LinkError::MissingPlatform(self.target)),
        }
    }

    /// Put the target into its default state at room start. Doors snap
    /// instead of sliding.
    pub fn apply_initial(&self, world: &mut World) -> Result<bool, LinkError> {
        match self.kind {
            LinkKind::Door => {
                let (door, transform) = world
                    .door_parts_mut(self.target)
                    .ok_or(LinkError::MissingDoor(self.target))?;
                if self.default_state == LinkState::Open {
                    door.open_initial(transform);
                } else {
                    door.close_initial(transform);
                }
            }
            LinkKind::MovingPlatform => {
                let platform = world
                    .platform_mut(self.target)
                    .ok_or(LinkError::MissingPlatform(self.target))?;
                platform.set_stopped(self.default_state == LinkState::Stopped);
            }
        }
        self.is_active(world)
    }

    /// Resolve a press against the target's current state. Returns the
    /// resulting indicator state.
    pub fn apply_press(&self, world: &mut World) -> Result<bool, LinkError> {
        match self.kind {
            LinkKind::MovingPlatform => {
                let platform = world
                    .platform_mut(self.target)
                    .ok_or(LinkError::MissingPlatform(self.target))?;
                let stopped = if self.toggles_on_press {
                    !platform.is_stopped()
                } else {
                    self.pressed_state == LinkState::Stopped
                };
                platform.set_stopped(stopped);
            }
            LinkKind::Door => {
                let (door, transform) = world
                    .door_parts_mut(self.target)
                    .ok_or(LinkError::MissingDoor(self.target))?;
                let open = (self.pressed_state == LinkState::Open && !self.toggles_on_press)
                    || (self.toggles_on_press && !door.is_open());
                if open {
                    door.open(transform);
                } else {
                    door.close(transform);
                }
            }
        }

        for reset in &self.reset_targets {
            match world.snap_platform(reset.target, reset.waypoint) {
                Some(true) => {}
                Some(false) => {
                    return Err(LinkError::WaypointOutOfRange {
                        target: reset.target,
                        waypoint: reset.waypoint,
                        count: world
                            .platform(reset.target)
                            .map_or(0, |platform| platform.waypoints().len()),
                    });
                }
                None => return Err(LinkError::MissingPlatform(reset.target)),
            }
        }

        self.is_active(world)
    }

    /// Drive the target back to its default state (animated for doors).
    /// Returns the resulting indicator state.
    pub fn apply_release(&self, world: &mut World) -> Result<bool, LinkError> {
        match self.kind {
            LinkKind::MovingPlatform => {
                let platform = world
                    .platform_mut(self.target)
                    .ok_or(LinkError::MissingPlatform(self.target))?;
                platform.set_stopped(self.default_state == LinkState::Stopped);
            }
            LinkKind::Door => {
                let (door, transform) = world
                    .door_parts_mut(self.target)
                    .ok_or(LinkError::MissingDoor(self.target))?;
                if self.default_state == LinkState::Open {
                    door.open(transform);
                } else {
                    door.close(transform);
                }
            }
        }
        self.is_active(world)
    }
}
