//! Level files: room layout, button wiring and designer tuning.
//!
//! Everything in a level refers to other objects by name. Names are resolved
//! to `ObjectId`s exactly once, in `build_room`; a dangling name or a link to
//! an object missing the right component stops the room from starting.

use glam::{Quat, Vec3};
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::button::Button;
use crate::controller::{CameraConfig, ControllerConfig};
use crate::door::Door;
use crate::link::{LinkDescriptor, LinkError, LinkKind, LinkState, ResetTarget};
use crate::platform::MovingPlatform;
use crate::save_state::SaveStateConfig;
use crate::trigger::{Trigger, TriggerAction};
use crate::world::{GameObject, ObjectId, Transform, World};

pub const PLAYER_NAME: &str = "player";

#[derive(Debug, Deserialize, Clone)]
pub struct LevelFile {
    pub version: String,
    pub scene: String,
    #[serde(default)]
    pub tuning: Tuning,
    pub player: PlayerSpawn,
    #[serde(default)]
    pub objects: Vec<ObjectSpec>,
    #[serde(default)]
    pub buttons: Vec<ButtonSpec>,
    #[serde(default)]
    pub triggers: Vec<TriggerSpec>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Tuning {
    /// Number keys select slots 1-9; higher slots are reached by scrolling.
    #[serde(default = "default_slot_count")]
    pub slot_count: usize,
    #[serde(default = "default_cooldown")]
    pub save_cooldown: f32,
    #[serde(default = "default_cooldown")]
    pub load_cooldown: f32,
    #[serde(default = "default_load_lift")]
    pub load_lift: f32,
    #[serde(default = "default_text_fade_time")]
    pub text_fade_time: f32,
    #[serde(default = "default_overwrite_flash_time")]
    pub overwrite_flash_time: f32,
    #[serde(default = "default_fixed_dt")]
    pub fixed_dt: f32,
    #[serde(default = "default_player_speed")]
    pub player_speed: f32,
    #[serde(default = "default_jump_speed")]
    pub jump_speed: f32,
    #[serde(default = "default_gravity")]
    pub gravity: f32,
    #[serde(default = "default_max_fall_speed")]
    pub max_fall_speed: f32,
    #[serde(default = "default_look_sensitivity")]
    pub look_sensitivity: f32,
    #[serde(default = "default_pitch_limit")]
    pub pitch_limit_degrees: f32,
    #[serde(default = "default_marker_colors")]
    pub marker_colors: Vec<[f32; 4]>,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            slot_count: default_slot_count(),
            save_cooldown: default_cooldown(),
            load_cooldown: default_cooldown(),
            load_lift: default_load_lift(),
            text_fade_time: default_text_fade_time(),
            overwrite_flash_time: default_overwrite_flash_time(),
            fixed_dt: default_fixed_dt(),
            player_speed: default_player_speed(),
            jump_speed: default_jump_speed(),
            gravity: default_gravity(),
            max_fall_speed: default_max_fall_speed(),
            look_sensitivity: default_look_sensitivity(),
            pitch_limit_degrees: default_pitch_limit(),
            marker_colors: default_marker_colors(),
        }
    }
}

impl Tuning {
    pub fn save_state_config(&self) -> SaveStateConfig {
        SaveStateConfig {
            slot_count: self.slot_count,
            save_cooldown: self.save_cooldown,
            load_cooldown: self.load_cooldown,
            load_lift: self.load_lift,
            marker_colors: self.marker_colors.clone(),
        }
    }

    pub fn controller_config(&self) -> ControllerConfig {
        ControllerConfig {
            move_speed: self.player_speed,
            jump_speed: self.jump_speed,
            gravity: self.gravity,
            max_fall_speed: self.max_fall_speed,
        }
    }

    pub fn camera_config(&self) -> CameraConfig {
        CameraConfig {
            sensitivity: self.look_sensitivity,
            pitch_limit_degrees: self.pitch_limit_degrees,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct PlayerSpawn {
    pub position: Vec3,
    #[serde(default)]
    pub yaw_deg: f32,
    #[serde(default = "default_player_half_extents")]
    pub half_extents: Vec3,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ObjectSpec {
    pub name: String,
    pub position: Vec3,
    #[serde(default)]
    pub yaw_deg: f32,
    #[serde(default = "default_half_extents")]
    pub half_extents: Vec3,
    #[serde(default)]
    pub door: Option<DoorSpec>,
    #[serde(default)]
    pub platform: Option<PlatformSpec>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DoorSpec {
    pub open_height: f32,
    #[serde(default = "default_door_time")]
    pub open_time: f32,
    #[serde(default = "default_door_time")]
    pub close_time: f32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PlatformSpec {
    pub waypoints: Vec<Vec3>,
    pub speed: f32,
    #[serde(default)]
    pub loops: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ButtonSpec {
    /// Name of the object acting as the pressure plate.
    pub object: String,
    #[serde(default = "default_press_distance")]
    pub press_distance: f32,
    #[serde(default = "default_press_time")]
    pub press_time: f32,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub links: Vec<LinkSpec>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LinkSpec {
    pub kind: LinkKind,
    pub target: String,
    pub default_state: LinkState,
    pub pressed_state: LinkState,
    #[serde(default)]
    pub resets_when_released: bool,
    #[serde(default)]
    pub toggles_on_press: bool,
    #[serde(default)]
    pub reset_targets: Vec<ResetTargetSpec>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ResetTargetSpec {
    pub target: String,
    pub waypoint: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TriggerSpec {
    /// Name of the object whose box is the trigger volume.
    pub object: String,
    pub action: TriggerActionSpec,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TriggerActionSpec {
    CloseDoor {
        door: String,
        #[serde(default)]
        opposite: Option<String>,
    },
    /// `from`/`to` name button plate objects.
    ShiftButton { from: String, to: String },
}

/// A level resolved into live simulation state.
pub struct Room {
    pub scene: String,
    pub tuning: Tuning,
    pub world: World,
    pub player: ObjectId,
    pub player_half_extents: Vec3,
    pub player_yaw_deg: f32,
    pub buttons: Vec<Button>,
    pub triggers: Vec<Trigger>,
}

pub struct LevelWatcher {
    level_path: PathBuf,
    last_seen_modified: Option<SystemTime>,
}

impl LevelWatcher {
    pub fn new(level_path: PathBuf) -> Self {
        let last_seen_modified = modified_time(&level_path);
        Self {
            level_path,
            last_seen_modified,
        }
    }

    pub fn path(&self) -> &Path {
        &self.level_path
    }

    pub fn should_reload(&mut self) -> bool {
        let current = modified_time(&self.level_path);
        match (self.last_seen_modified, current) {
            (Some(old), Some(now)) if now > old => {
                self.last_seen_modified = Some(now);
                true
            }
            (None, Some(now)) => {
                self.last_seen_modified = Some(now);
                true
            }
            _ => false,
        }
    }
}

pub fn load_level_from_path(level_path: &Path) -> Result<LevelFile, String> {
    let raw = fs::read_to_string(level_path)
        .map_err(|e| format!("Failed to read level file {}: {e}", level_path.display()))?;
    let level: LevelFile = serde_json::from_str(&raw)
        .map_err(|e| format!("Failed to parse level JSON {}: {e}", level_path.display()))?;
    validate_level(&level)?;
    Ok(level)
}

fn validate_level(level: &LevelFile) -> Result<(), String> {
    let tuning = &level.tuning;
    if tuning.slot_count == 0 {
        return Err("Level validation failed: tuning.slot_count must be at least 1".to_string());
    }
    if tuning.fixed_dt <= 0.0 {
        return Err("Level validation failed: tuning.fixed_dt must be > 0".to_string());
    }
    if tuning.save_cooldown < 0.0 || tuning.load_cooldown < 0.0 {
        return Err("Level validation failed: cooldowns must be >= 0".to_string());
    }

    let mut names = HashSet::new();
    names.insert(PLAYER_NAME);
    for object in &level.objects {
        if !names.insert(object.name.as_str()) {
            return Err(format!(
                "Level validation failed: duplicate object name '{}'",
                object.name
            ));
        }
        if let Some(platform) = &object.platform {
            if platform.waypoints.is_empty() {
                return Err(format!(
                    "Level validation failed: platform '{}' has no waypoints",
                    object.name
                ));
            }
            if platform.speed <= 0.0 {
                return Err(format!(
                    "Level validation failed: platform '{}' speed must be > 0",
                    object.name
                ));
            }
        }
        if let Some(door) = &object.door {
            if door.open_time < 0.0 || door.close_time < 0.0 {
                return Err(format!(
                    "Level validation failed: door '{}' has a negative slide time",
                    object.name
                ));
            }
        }
    }

    let mut plates = HashSet::new();
    for button in &level.buttons {
        if !plates.insert(button.object.as_str()) {
            return Err(format!(
                "Level validation failed: object '{}' is used by more than one button",
                button.object
            ));
        }
        if button.press_time <= 0.0 {
            return Err(format!(
                "Level validation failed: button '{}' press_time must be > 0",
                button.object
            ));
        }
    }

    Ok(())
}

/// Spawn every object, resolve names and initialise each button's links.
pub fn build_room(level: &LevelFile) -> Result<Room, LinkError> {
    let mut world = World::new();

    let player = world.spawn(GameObject::new(
        PLAYER_NAME,
        Transform {
            position: level.player.position,
            rotation: Quat::from_rotation_y(level.player.yaw_deg.to_radians()),
            scale: Vec3::ONE,
        },
        level.player.half_extents,
    ));

    for spec in &level.objects {
        let transform = Transform {
            position: spec.position,
            rotation: Quat::from_rotation_y(spec.yaw_deg.to_radians()),
            scale: Vec3::ONE,
        };
        let mut object = GameObject::new(spec.name.clone(), transform, spec.half_extents);
        object.door = spec.door.as_ref().map(|door| {
            Door::new(
                spec.position.y,
                door.open_height,
                door.open_time,
                door.close_time,
            )
        });
        object.platform = spec
            .platform
            .as_ref()
            .map(|platform| MovingPlatform::new(platform.waypoints.clone(), platform.speed, platform.loops));
        world.spawn(object);
    }

    let resolve = |world: &World, name: &str| {
        world
            .find_by_name(name)
            .ok_or_else(|| LinkError::UnknownObject(name.to_string()))
    };

    let mut buttons = Vec::with_capacity(level.buttons.len());
    for spec in &level.buttons {
        let plate = resolve(&world, &spec.object)?;
        let mut links = Vec::with_capacity(spec.links.len());
        for link in &spec.links {
            let mut reset_targets = Vec::with_capacity(link.reset_targets.len());
            for reset in &link.reset_targets {
                reset_targets.push(ResetTarget {
                    target: resolve(&world, &reset.target)?,
                    waypoint: reset.waypoint,
                });
            }
            links.push(LinkDescriptor {
                kind: link.kind,
                target: resolve(&world, &link.target)?,
                default_state: link.default_state,
                pressed_state: link.pressed_state,
                resets_when_released: link.resets_when_released,
                toggles_on_press: link.toggles_on_press,
                reset_targets,
            });
        }
        let mut button = Button::new(
            spec.object.clone(),
            plate,
            links,
            spec.press_distance,
            spec.press_time,
        );
        button.set_enabled(spec.enabled);
        button.initialize(&mut world)?;
        buttons.push(button);
    }

    let button_index = |name: &str| {
        level
            .buttons
            .iter()
            .position(|button| button.object == name)
            .ok_or_else(|| LinkError::UnknownObject(name.to_string()))
    };

    let mut triggers = Vec::with_capacity(level.triggers.len());
    for spec in &level.triggers {
        let volume = resolve(&world, &spec.object)?;
        let action = match &spec.action {
            TriggerActionSpec::CloseDoor { door, opposite } => TriggerAction::CloseDoor {
                door: resolve(&world, door)?,
                opposite: opposite
                    .as_deref()
                    .map(|name| resolve(&world, name))
                    .transpose()?,
            },
            TriggerActionSpec::ShiftButton { from, to } => TriggerAction::ShiftButton {
                from: button_index(from)?,
                to: button_index(to)?,
            },
        };
        let trigger = Trigger::new(spec.object.clone(), volume, action);
        trigger.validate(&world, buttons.len())?;
        triggers.push(trigger);
    }

    log::info!(
        "Built room '{}': {} objects, {} buttons, {} triggers",
        level.scene,
        world.len(),
        buttons.len(),
        triggers.len()
    );

    Ok(Room {
        scene: level.scene.clone(),
        tuning: level.tuning.clone(),
        world,
        player,
        player_half_extents: level.player.half_extents,
        player_yaw_deg: level.player.yaw_deg,
        buttons,
        triggers,
    })
}

fn modified_time(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).ok()?.modified().ok()
}

const fn default_slot_count() -> usize {
    3
}

const fn default_cooldown() -> f32 {
    2.0
}

const fn default_load_lift() -> f32 {
    0.2
}

const fn default_text_fade_time() -> f32 {
    1.5
}

const fn default_overwrite_flash_time() -> f32 {
    0.5
}

const fn default_fixed_dt() -> f32 {
    1.0 / 60.0
}

const fn default_player_speed() -> f32 {
    5.0
}

const fn default_jump_speed() -> f32 {
    5.5
}

const fn default_gravity() -> f32 {
    -18.0
}

const fn default_max_fall_speed() -> f32 {
    -30.0
}

const fn default_look_sensitivity() -> f32 {
    6.0
}

const fn default_pitch_limit() -> f32 {
    90.0
}

fn default_marker_colors() -> Vec<[f32; 4]> {
    SaveStateConfig::default().marker_colors
}

const fn default_player_half_extents() -> Vec3 {
    Vec3::new(0.4, 0.9, 0.4)
}

const fn default_half_extents() -> Vec3 {
    Vec3::splat(0.5)
}

const fn default_door_time() -> f32 {
    1.0
}

const fn default_press_distance() -> f32 {
    0.1
}

const fn default_press_time() -> f32 {
    0.5
}

const fn default_enabled() -> bool {
    true
}
