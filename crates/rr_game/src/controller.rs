//! First-person look and walking.
//!
//! Movement is kinematic: constant walk speed relative to the camera yaw,
//! gravity with an edge-triggered jump, and a ground query against the
//! highest support under the player's feet. There is no wall resolution;
//! rooms are laid out so the player is never asked to push through geometry.

use glam::{Quat, Vec2, Vec3};

use crate::contact::{Aabb, SUPPORT_TOLERANCE};
use crate::world::{ObjectId, Transform};

/// Tallest ledge the player walks onto without jumping.
const STEP_UP: f32 = 0.2;

#[derive(Debug, Clone, Copy, Default)]
pub struct ControllerInput {
    /// x = strafe right, y = forward. Not required to be normalised.
    pub move_axis: Vec2,
    pub jump_pressed: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct ControllerConfig {
    pub move_speed: f32,
    pub jump_speed: f32,
    pub gravity: f32,
    pub max_fall_speed: f32,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            move_speed: 5.0,
            jump_speed: 5.5,
            gravity: -18.0,
            max_fall_speed: -30.0,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CameraConfig {
    pub sensitivity: f32,
    pub pitch_limit_degrees: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            sensitivity: 6.0,
            pitch_limit_degrees: 90.0,
        }
    }
}

/// Yaw/pitch camera. Angles are stored in degrees.
#[derive(Debug, Clone, Copy)]
pub struct LookCamera {
    pub yaw: f32,
    pub pitch: f32,
    pub config: CameraConfig,
}

impl LookCamera {
    pub fn new(config: CameraConfig) -> Self {
        Self {
            yaw: 0.0,
            pitch: 0.0,
            config,
        }
    }

    /// Mouse right turns right, mouse up looks up.
    pub fn look(&mut self, mouse_delta: Vec2, dt: f32) {
        let scale = self.config.sensitivity * dt;
        self.yaw -= mouse_delta.x * scale;
        self.pitch -= mouse_delta.y * scale;
        let limit = self.config.pitch_limit_degrees;
        self.pitch = self.pitch.clamp(-limit, limit);
    }

    pub fn yaw_rotation(&self) -> Quat {
        Quat::from_rotation_y(self.yaw.to_radians())
    }

    pub fn rotation(&self) -> Quat {
        self.yaw_rotation() * Quat::from_rotation_x(self.pitch.to_radians())
    }

    /// Forward on the ground plane.
    pub fn forward(&self) -> Vec3 {
        self.yaw_rotation() * Vec3::NEG_Z
    }

    pub fn right(&self) -> Vec3 {
        self.yaw_rotation() * Vec3::X
    }
}

/// Something the player can stand on.
#[derive(Debug, Clone, Copy)]
pub struct Support {
    pub object: ObjectId,
    pub bounds: Aabb,
}

#[derive(Debug, Clone, Copy)]
pub struct PlayerController {
    pub velocity_y: f32,
    pub grounded: bool,
    /// Object currently under the player's feet; `None` on the floor or in
    /// the air.
    pub standing_on: Option<ObjectId>,
    pub config: ControllerConfig,
}

impl PlayerController {
    pub fn new(config: ControllerConfig) -> Self {
        Self {
            velocity_y: 0.0,
            grounded: false,
            standing_on: None,
            config,
        }
    }

    pub fn step(
        &mut self,
        input: ControllerInput,
        camera: &LookCamera,
        dt: f32,
        transform: &mut Transform,
        half_extents: Vec3,
        supports: &[Support],
    ) {
        let wish = camera.right() * input.move_axis.x + camera.forward() * input.move_axis.y;
        let direction = Vec3::new(wish.x, 0.0, wish.z).normalize_or_zero();
        if direction != Vec3::ZERO {
            transform.position += direction * self.config.move_speed * dt;
            transform.rotation = Quat::from_rotation_y(f32::atan2(-direction.x, -direction.z));
        }

        // Jump is edge-triggered and only legal from grounded state.
        if input.jump_pressed && self.grounded {
            self.velocity_y = self.config.jump_speed;
            self.grounded = false;
        }

        self.velocity_y =
            (self.velocity_y + self.config.gravity * dt).max(self.config.max_fall_speed);
        transform.position.y += self.velocity_y * dt;

        let feet = transform.position.y - half_extents.y;
        let (ground, support) = ground_below(transform.position, feet, supports);
        if self.velocity_y <= 0.0 && feet <= ground + SUPPORT_TOLERANCE {
            transform.position.y = ground + half_extents.y;
            self.velocity_y = 0.0;
            self.grounded = true;
            self.standing_on = support;
        } else {
            self.grounded = false;
            self.standing_on = None;
        }
    }
}

/// Highest surface at or just above `feet` whose footprint covers the
/// player. The floor at y = 0 always counts.
fn ground_below(position: Vec3, feet: f32, supports: &[Support]) -> (f32, Option<ObjectId>) {
    let mut best = (0.0, None);
    for support in supports {
        let top = support.bounds.top();
        if support.bounds.covers_xz(position)
            && top <= feet + STEP_UP
            && top >= best.0
        {
            best = (top, Some(support.object));
        }
    }
    best
}
