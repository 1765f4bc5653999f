//! Save-state store: the rewind mechanic.
//!
//! The player can snapshot their transform into one of a few numbered slots
//! and later teleport back to it. Saving and loading each sit behind their own
//! cooldown; a request made while its cooldown runs is dropped, not queued.
//!
//! Loading is two-phase. `load` validates the request and records a pending
//! teleport; `apply_deferred` performs it in the late part of the fixed step,
//! after platforms and the player controller have moved the mover. Applying it
//! any earlier would let the same step's movement overwrite the teleport.

use glam::{Quat, Vec3};
use rr_core::timer::Cooldown;
use thiserror::Error;

use crate::feedback::{Feedback, FeedbackQueue};
use crate::world::{GameObject, ObjectId, Transform, WaypointMarker, World};

const MARKER_HALF_EXTENTS: Vec3 = Vec3::splat(0.25);
const DEFAULT_MARKER_COLOR: [f32; 4] = [1.0, 1.0, 1.0, 1.0];

#[derive(Debug, Clone, PartialEq)]
pub struct SaveStateConfig {
    pub slot_count: usize,
    pub save_cooldown: f32,
    pub load_cooldown: f32,
    /// Added to the saved height on load so the mover does not clip the floor.
    pub load_lift: f32,
    pub marker_colors: Vec<[f32; 4]>,
}

impl Default for SaveStateConfig {
    fn default() -> Self {
        Self {
            slot_count: 3,
            save_cooldown: 2.0,
            load_cooldown: 2.0,
            load_lift: 0.2,
            marker_colors: vec![
                [0.9, 0.2, 0.2, 1.0],
                [0.2, 0.8, 0.3, 1.0],
                [0.2, 0.4, 0.9, 1.0],
            ],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SaveSlot {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
    pub has_value: bool,
}

impl Default for SaveSlot {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
            has_value: false,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SlotError {
    #[error("save slot {requested} is out of range (1..={count})")]
    OutOfRange { requested: usize, count: usize },
}

#[derive(Debug, Clone, Copy)]
struct PendingTeleport {
    slot: usize,
    record: SaveSlot,
}

pub struct SaveStateStore {
    config: SaveStateConfig,
    mover: ObjectId,
    slots: Vec<SaveSlot>,
    markers: Vec<Option<ObjectId>>,
    selected: usize,
    save_cooldown: Cooldown,
    load_cooldown: Cooldown,
    pending: Option<PendingTeleport>,
}

impl SaveStateStore {
    pub fn new(config: SaveStateConfig, mover: ObjectId) -> Self {
        let slot_count = config.slot_count.max(1);
        Self {
            slots: vec![SaveSlot::default(); slot_count],
            markers: vec![None; slot_count],
            selected: 0,
            save_cooldown: Cooldown::new(config.save_cooldown),
            load_cooldown: Cooldown::new(config.load_cooldown),
            pending: None,
            mover,
            config,
        }
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Zero-based index of the slot save/load act on.
    pub fn selected_slot(&self) -> usize {
        self.selected
    }

    pub fn slot(&self, index: usize) -> Option<&SaveSlot> {
        self.slots.get(index)
    }

    pub fn has_value(&self, index: usize) -> bool {
        self.slots.get(index).is_some_and(|slot| slot.has_value)
    }

    pub fn marker(&self, index: usize) -> Option<ObjectId> {
        self.markers.get(index).copied().flatten()
    }

    pub fn save_cooldown(&self) -> &Cooldown {
        &self.save_cooldown
    }

    pub fn load_cooldown(&self) -> &Cooldown {
        &self.load_cooldown
    }

    pub fn has_pending_load(&self) -> bool {
        self.pending.is_some()
    }

    /// Select slot `number` (one-based, as shown to the player).
    pub fn select_slot(
        &mut self,
        number: usize,
        feedback: &mut FeedbackQueue,
    ) -> Result<(), SlotError> {
        if number == 0 || number > self.slots.len() {
            log::warn!(
                "Ignoring selection of save slot {number}; valid slots are 1..={}",
                self.slots.len()
            );
            return Err(SlotError::OutOfRange {
                requested: number,
                count: self.slots.len(),
            });
        }
        let previous = self.selected;
        self.selected = number - 1;
        if previous != self.selected {
            feedback.push(Feedback::SlotDeselected(previous));
        }
        feedback.push(Feedback::SlotSelected(self.selected));
        log::debug!("Selected save slot {number}");
        Ok(())
    }

    /// Move the selection by `step` slots, wrapping at either end.
    pub fn cycle_slot(&mut self, step: i32, feedback: &mut FeedbackQueue) {
        if step == 0 {
            return;
        }
        let count = self.slots.len() as i32;
        let next = (self.selected as i32 + step).rem_euclid(count) as usize;
        // Always in range, so the error arm cannot trigger.
        let _ = self.select_slot(next + 1, feedback);
    }

    /// Snapshot the mover into the selected slot. Returns false if the
    /// request was dropped.
    pub fn save(&mut self, world: &mut World, feedback: &mut FeedbackQueue) -> bool {
        if self.save_cooldown.is_active() {
            log::debug!(
                "Save ignored: cooldown {:.2}s remaining",
                self.save_cooldown.remaining()
            );
            return false;
        }
        let Some(transform) = world.transform(self.mover).copied() else {
            log::error!("Save ignored: mover {:?} no longer exists", self.mover);
            return false;
        };
        self.save_cooldown.arm();

        let index = self.selected;
        let overwrote = self.slots[index].has_value;
        self.slots[index] = SaveSlot {
            position: transform.position,
            rotation: transform.rotation,
            scale: transform.scale,
            has_value: true,
        };

        if let Some(old_marker) = self.markers[index].take() {
            world.despawn(old_marker);
        }
        let mut marker = GameObject::new(
            format!("save_marker_{}", index + 1),
            Transform::from_position(transform.position),
            MARKER_HALF_EXTENTS,
        );
        marker.marker = Some(WaypointMarker {
            slot: index,
            color: self
                .config
                .marker_colors
                .get(index)
                .copied()
                .unwrap_or(DEFAULT_MARKER_COLOR),
        });
        self.markers[index] = Some(world.spawn(marker));

        if overwrote {
            feedback.text(format!("Overwrote Save {}", index + 1));
            feedback.push(Feedback::SlotOverwritten(index));
        } else {
            feedback.text(format!("Added Save {}", index + 1));
            feedback.push(Feedback::SlotFilled(index));
        }
        log::info!("Saved state to slot {}", index + 1);
        true
    }

    /// Schedule a teleport back to the selected slot. Returns false if the
    /// request was dropped.
    pub fn load(&mut self, feedback: &mut FeedbackQueue) -> bool {
        if self.load_cooldown.is_active() {
            log::debug!(
                "Load ignored: cooldown {:.2}s remaining",
                self.load_cooldown.remaining()
            );
            return false;
        }
        let index = self.selected;
        if !self.slots[index].has_value {
            log::info!("Nothing saved in slot {}", index + 1);
            return false;
        }
        self.load_cooldown.arm();
        self.pending = Some(PendingTeleport {
            slot: index,
            record: self.slots[index],
        });
        feedback.push(Feedback::SlotEmptied(index));
        true
    }

    /// Decay both cooldowns by one fixed step.
    pub fn tick(&mut self, dt: f32) {
        if self.save_cooldown.tick(dt) {
            log::debug!("Save cooldown finished");
        }
        if self.load_cooldown.tick(dt) {
            log::debug!("Load cooldown finished");
        }
    }

    /// Late-step half of `load`. Returns the slot that was restored, if any.
    pub fn apply_deferred(
        &mut self,
        world: &mut World,
        feedback: &mut FeedbackQueue,
    ) -> Option<usize> {
        let PendingTeleport { slot, record } = self.pending.take()?;
        let Some(transform) = world.transform_mut(self.mover) else {
            log::error!("Load dropped: mover {:?} no longer exists", self.mover);
            return None;
        };
        transform.position = record.position + Vec3::Y * self.config.load_lift;
        transform.rotation = record.rotation;
        transform.scale = record.scale;

        self.slots[slot].has_value = false;
        if let Some(marker) = self.markers[slot].take() {
            world.despawn(marker);
        }
        feedback.text(format!("Loaded Save {}", slot + 1));
        log::info!("Loaded state from slot {}", slot + 1);
        Some(slot)
    }
}
