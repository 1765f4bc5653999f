//! Trigger volumes that fire once when the player walks in.

use crate::button::Button;
use crate::contact::{ContactEvent, ContactState};
use crate::link::LinkError;
use crate::world::{ObjectId, World};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerAction {
    /// Close `door` behind the player, optionally opening the way ahead.
    CloseDoor {
        door: ObjectId,
        opposite: Option<ObjectId>,
    },
    /// Hand control from one button to another (indices into the room's
    /// button list).
    ShiftButton { from: usize, to: usize },
}

#[derive(Debug, Clone)]
pub struct Trigger {
    pub name: String,
    volume: ObjectId,
    action: TriggerAction,
    contact: ContactState,
}

impl Trigger {
    pub fn new(name: impl Into<String>, volume: ObjectId, action: TriggerAction) -> Self {
        Self {
            name: name.into(),
            volume,
            action,
            contact: ContactState::default(),
        }
    }

    pub fn volume(&self) -> ObjectId {
        self.volume
    }

    pub fn action(&self) -> TriggerAction {
        self.action
    }

    pub fn validate(&self, world: &World, button_count: usize) -> Result<(), LinkError> {
        match self.action {
            TriggerAction::CloseDoor { door, opposite } => {
                for id in std::iter::once(door).chain(opposite) {
                    if world.door(id).is_none() {
                        return Err(LinkError::MissingDoor(id));
                    }
                }
            }
            TriggerAction::ShiftButton { from, to } => {
                for index in [from, to] {
                    if index >= button_count {
                        return Err(LinkError::ButtonOutOfRange {
                            index,
                            count: button_count,
                        });
                    }
                }
            }
        }
        Ok(())
    }

    /// Feed this step's overlap. The action runs on enter only. Returns true
    /// if it fired.
    pub fn update(
        &mut self,
        overlapping: bool,
        world: &mut World,
        buttons: &mut [Button],
    ) -> Result<bool, LinkError> {
        if self.contact.update(overlapping) != Some(ContactEvent::Enter) {
            return Ok(false);
        }
        log::debug!("Trigger '{}' entered", self.name);
        match self.action {
            TriggerAction::CloseDoor { door, opposite } => {
                let (behind, transform) = world
                    .door_parts_mut(door)
                    .ok_or(LinkError::MissingDoor(door))?;
                behind.close(transform);
                if let Some(ahead) = opposite {
                    let (ahead_door, transform) = world
                        .door_parts_mut(ahead)
                        .ok_or(LinkError::MissingDoor(ahead))?;
                    ahead_door.open(transform);
                }
            }
            TriggerAction::ShiftButton { from, to } => {
                let count = buttons.len();
                let missing = |index: usize| LinkError::ButtonOutOfRange { index, count };
                buttons.get_mut(from).ok_or_else(|| missing(from))?.set_enabled(false);
                buttons.get_mut(to).ok_or_else(|| missing(to))?.set_enabled(true);
            }
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::door::Door;
    use crate::world::{GameObject, Transform};
    use glam::Vec3;

    fn spawn_door(world: &mut World, name: &str) -> ObjectId {
        let mut object = GameObject::new(name, Transform::default(), Vec3::ONE);
        object.door = Some(Door::new(0.0, 3.0, 0.5, 0.2));
        world.spawn(object)
    }

    fn spawn_volume(world: &mut World) -> ObjectId {
        world.spawn(GameObject::new("volume", Transform::default(), Vec3::ONE))
    }

    #[test]
    fn close_door_fires_on_enter_only() {
        let mut world = World::new();
        let behind = spawn_door(&mut world, "behind");
        let ahead = spawn_door(&mut world, "ahead");
        {
            let (door, transform) = world.door_parts_mut(behind).unwrap();
            door.open_initial(transform);
        }
        let volume = spawn_volume(&mut world);
        let mut trigger = Trigger::new(
            "hall",
            volume,
            TriggerAction::CloseDoor {
                door: behind,
                opposite: Some(ahead),
            },
        );

        assert!(trigger.update(true, &mut world, &mut []).unwrap());
        assert!(!world.door(behind).unwrap().is_open());
        assert!(world.door(ahead).unwrap().is_open());

        // Staying inside does not fire again.
        assert!(!trigger.update(true, &mut world, &mut []).unwrap());
        assert!(!trigger.update(false, &mut world, &mut []).unwrap());
        assert!(trigger.update(true, &mut world, &mut []).unwrap());
    }

    #[test]
    fn shift_button_swaps_enabled_buttons() {
        let mut world = World::new();
        let volume = spawn_volume(&mut world);
        let a = world.spawn(GameObject::new("a", Transform::default(), Vec3::ONE));
        let b = world.spawn(GameObject::new("b", Transform::default(), Vec3::ONE));
        let mut buttons = vec![
            Button::new("a", a, Vec::new(), 0.1, 0.5),
            Button::new("b", b, Vec::new(), 0.1, 0.5),
        ];
        buttons[1].set_enabled(false);

        let mut trigger = Trigger::new("shift", volume, TriggerAction::ShiftButton { from: 0, to: 1 });
        assert!(trigger.update(true, &mut world, &mut buttons).unwrap());
        assert!(!buttons[0].is_enabled());
        assert!(buttons[1].is_enabled());
    }

    #[test]
    fn validate_rejects_non_door_target() {
        let mut world = World::new();
        let volume = spawn_volume(&mut world);
        let trigger = Trigger::new(
            "bad",
            volume,
            TriggerAction::CloseDoor {
                door: volume,
                opposite: None,
            },
        );
        assert_eq!(trigger.validate(&world, 0), Err(LinkError::MissingDoor(volume)));

        let shift = Trigger::new("shift", volume, TriggerAction::ShiftButton { from: 0, to: 2 });
        assert_eq!(
            shift.validate(&world, 2),
            Err(LinkError::ButtonOutOfRange { index: 2, count: 2 })
        );
    }

    #[test]
    fn shift_to_missing_button_reports_index_and_count() {
        let mut world = World::new();
        let volume = spawn_volume(&mut world);
        let a = world.spawn(GameObject::new("a", Transform::default(), Vec3::ONE));
        let mut buttons = vec![Button::new("a", a, Vec::new(), 0.1, 0.5)];

        let mut trigger = Trigger::new("shift", volume, TriggerAction::ShiftButton { from: 0, to: 3 });
        assert_eq!(
            trigger.update(true, &mut world, &mut buttons),
            Err(LinkError::ButtonOutOfRange { index: 3, count: 1 })
        );
    }
}
