//! Pressure-plate buttons.
//!
//! Per button: `Idle -> Pressed -> Idle`. A press fires when the player is in
//! contact, the interact signal is held, the button is idle, and it has not
//! already fired for the current interaction. The interaction guard clears as
//! soon as the interact signal drops, so the player can press again without
//! stepping off. While pressed, the button plays its press-in/press-out
//! travel; when that finishes it returns to idle and runs release resolution.

use glam::Vec3;

use crate::feedback::{Feedback, FeedbackQueue};
use crate::link::{LinkDescriptor, LinkError};
use crate::world::{ObjectId, World};

#[derive(Debug, Clone, Copy, PartialEq)]
struct PressTravel {
    elapsed: f32,
    duration: f32,
}

impl PressTravel {
    /// 0 at rest, 1 fully pressed in, back to 0 at the end.
    fn depth(&self) -> f32 {
        if self.duration <= 0.0 {
            return 0.0;
        }
        let t = (self.elapsed / self.duration).clamp(0.0, 1.0);
        1.0 - (2.0 * t - 1.0).abs()
    }
}

#[derive(Debug, Clone)]
pub struct Button {
    pub name: String,
    object: ObjectId,
    links: Vec<LinkDescriptor>,
    indicators: Vec<bool>,
    pub press_distance: f32,
    pub press_time: f32,
    enabled: bool,
    pressed: bool,
    acted_this_contact: bool,
    travel: Option<PressTravel>,
    rest_position: Option<Vec3>,
}

impl Button {
    pub fn new(
        name: impl Into<String>,
        object: ObjectId,
        links: Vec<LinkDescriptor>,
        press_distance: f32,
        press_time: f32,
    ) -> Self {
        let indicators = vec![false; links.len()];
        Self {
            name: name.into(),
            object,
            links,
            indicators,
            press_distance,
            press_time,
            enabled: true,
            pressed: false,
            acted_this_contact: false,
            travel: None,
            rest_position: None,
        }
    }

    pub fn object(&self) -> ObjectId {
        self.object
    }

    pub fn links(&self) -> &[LinkDescriptor] {
        &self.links
    }

    /// Active/inactive highlight per link, in link order.
    pub fn indicators(&self) -> &[bool] {
        &self.indicators
    }

    pub fn is_pressed(&self) -> bool {
        self.pressed
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Validate every link and drive each target to its default state.
    pub fn initialize(&mut self, world: &mut World) -> Result<(), LinkError> {
        for link in &self.links {
            link.validate(world)?;
        }
        for (link, indicator) in self.links.iter().zip(self.indicators.iter_mut()) {
            *indicator = link.apply_initial(world)?;
        }
        self.rest_position = world.transform(self.object).map(|t| t.position);
        Ok(())
    }

    /// Feed this step's contact and interact state. Returns true if the
    /// button fired.
    pub fn update_contact(
        &mut self,
        in_contact: bool,
        interacting: bool,
        world: &mut World,
        feedback: &mut FeedbackQueue,
    ) -> Result<bool, LinkError> {
        if !interacting {
            self.acted_this_contact = false;
        }
        if !self.enabled || !in_contact || self.pressed || !interacting || self.acted_this_contact
        {
            return Ok(false);
        }

        self.interact(world)?;
        self.pressed = true;
        self.acted_this_contact = true;
        self.travel = Some(PressTravel {
            elapsed: 0.0,
            duration: self.press_time,
        });
        feedback.push(Feedback::ButtonSound);
        log::info!("Button '{}' pressed", self.name);
        Ok(true)
    }

    /// Advance the press travel. Runs release resolution on the step the
    /// travel completes.
    pub fn tick(&mut self, dt: f32, world: &mut World) -> Result<(), LinkError> {
        let Some(travel) = self.travel.as_mut() else {
            return Ok(());
        };
        travel.elapsed += dt;
        let finished = travel.elapsed >= travel.duration;
        let depth = if finished { 0.0 } else { travel.depth() };

        if let (Some(rest), Some(transform)) = (self.rest_position, world.transform_mut(self.object))
        {
            let inward = transform.rotation * Vec3::NEG_X;
            transform.position = rest + inward * (self.press_distance * depth);
        }

        if finished {
            self.travel = None;
            self.pressed = false;
            self.stop_interaction(world)?;
        }
        Ok(())
    }

    fn interact(&mut self, world: &mut World) -> Result<(), LinkError> {
        // All links are checked before any of them is applied.
        for link in &self.links {
            link.validate(world)?;
        }
        for (link, indicator) in self.links.iter().zip(self.indicators.iter_mut()) {
            *indicator = link.apply_press(world)?;
        }
        Ok(())
    }

    fn stop_interaction(&mut self, world: &mut World) -> Result<(), LinkError> {
        for (link, indicator) in self.links.iter().zip(self.indicators.iter_mut()) {
            if link.resets_when_released {
                *indicator = link.apply_release(world)?;
            } else {
                *indicator = link.is_active(world)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::door::Door;
    use crate::link::{LinkKind, LinkState};
    use crate::platform::MovingPlatform;
    use crate::world::{GameObject, Transform};

    const DT: f32 = 1.0 / 60.0;

    struct Room {
        world: World,
        door: ObjectId,
        button: Button,
        feedback: FeedbackQueue,
    }

    fn room(toggles: bool, resets: bool) -> Room {
        let mut world = World::new();
        let mut door_object = GameObject::new("door", Transform::default(), Vec3::ONE);
        door_object.door = Some(Door::new(0.0, 3.0, 0.5, 0.2));
        let door = world.spawn(door_object);
        let plate = world.spawn(GameObject::new(
            "plate",
            Transform::from_position(Vec3::new(5.0, 0.0, 0.0)),
            Vec3::new(0.5, 0.1, 0.5),
        ));
        let link = LinkDescriptor {
            kind: LinkKind::Door,
            target: door,
            default_state: LinkState::Closed,
            pressed_state: LinkState::Open,
            resets_when_released: resets,
            toggles_on_press: toggles,
            reset_targets: Vec::new(),
        };
        let mut button = Button::new("plate", plate, vec![link], 0.1, 0.5);
        button.initialize(&mut world).expect("valid links");
        Room {
            world,
            door,
            button,
            feedback: FeedbackQueue::new(),
        }
    }

    fn press(room: &mut Room) -> bool {
        room.button
            .update_contact(true, true, &mut room.world, &mut room.feedback)
            .unwrap()
    }

    fn release_interact(room: &mut Room) {
        room.button
            .update_contact(true, false, &mut room.world, &mut room.feedback)
            .unwrap();
    }

    fn finish_travel(room: &mut Room) {
        for _ in 0..40 {
            room.button.tick(DT, &mut room.world).unwrap();
            room.world.tick(DT);
        }
        assert!(!room.button.is_pressed());
    }

    fn door_open(room: &Room) -> bool {
        room.world.door(room.door).unwrap().is_open()
    }

    #[test]
    fn press_opens_door_and_stays_open() {
        let mut room = room(false, false);
        assert!(!door_open(&room));
        assert!(press(&mut room));
        assert!(door_open(&room));
        assert_eq!(room.button.indicators(), &[true]);
        assert!(room.feedback.events().contains(&Feedback::ButtonSound));

        // Overlapping press while still pressed does nothing.
        assert!(!press(&mut room));
        finish_travel(&mut room);
        release_interact(&mut room);
        assert!(press(&mut room));
        assert!(door_open(&room));
    }

    #[test]
    fn toggling_button_alternates_door() {
        let mut room = room(true, false);
        assert!(press(&mut room));
        assert!(door_open(&room));
        finish_travel(&mut room);
        release_interact(&mut room);
        assert!(press(&mut room));
        assert!(!door_open(&room));
    }

    #[test]
    fn holding_interact_does_not_refire() {
        let mut room = room(true, false);
        assert!(press(&mut room));
        finish_travel(&mut room);
        // Interact still held: the guard blocks a second press.
        assert!(!press(&mut room));
        assert!(door_open(&room));
    }

    #[test]
    fn guard_clears_without_leaving_contact() {
        let mut room = room(true, false);
        press(&mut room);
        finish_travel(&mut room);
        room.button
            .update_contact(false, false, &mut room.world, &mut room.feedback)
            .unwrap();
        assert!(press(&mut room));
    }

    #[test]
    fn no_press_without_contact() {
        let mut room = room(false, false);
        let fired = room
            .button
            .update_contact(false, true, &mut room.world, &mut room.feedback)
            .unwrap();
        assert!(!fired);
        assert!(!door_open(&room));
    }

    #[test]
    fn release_resets_to_default_when_configured() {
        let mut room = room(false, true);
        press(&mut room);
        assert!(door_open(&room));
        finish_travel(&mut room);
        assert!(!door_open(&room));
        assert_eq!(room.button.indicators(), &[false]);
    }

    #[test]
    fn disabled_button_ignores_presses() {
        let mut room = room(false, false);
        room.button.set_enabled(false);
        assert!(!press(&mut room));
        assert!(!door_open(&room));
    }

    #[test]
    fn press_travel_moves_plate_and_returns() {
        let mut room = room(false, false);
        let plate = room.button.object();
        press(&mut room);
        for _ in 0..15 {
            room.button.tick(DT, &mut room.world).unwrap();
        }
        let mid = room.world.transform(plate).unwrap().position;
        assert!(mid.x < 5.0);
        finish_travel(&mut room);
        assert_eq!(
            room.world.transform(plate).unwrap().position,
            Vec3::new(5.0, 0.0, 0.0)
        );
    }

    #[test]
    fn initialize_rejects_misconfigured_link() {
        let mut world = World::new();
        let platform_only = {
            let mut object = GameObject::new("lift", Transform::default(), Vec3::ONE);
            object.platform = Some(MovingPlatform::new(vec![Vec3::ZERO], 1.0, true));
            world.spawn(object)
        };
        let plate = world.spawn(GameObject::new("plate", Transform::default(), Vec3::ONE));
        let link = LinkDescriptor {
            kind: LinkKind::Door,
            target: platform_only,
            default_state: LinkState::Closed,
            pressed_state: LinkState::Open,
            resets_when_released: false,
            toggles_on_press: false,
            reset_targets: Vec::new(),
        };
        let mut button = Button::new("plate", plate, vec![link], 0.1, 0.5);
        assert_eq!(
            button.initialize(&mut world),
            Err(LinkError::MissingDoor(platform_only))
        );
    }
}
