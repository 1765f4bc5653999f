//! One running room.
//!
//! `GameSession` owns every piece of simulation state for a room and advances
//! it one fixed step at a time. Step order:
//!
//! 1. slot selection, save and load requests
//! 2. camera look and player movement
//! 3. contacts: triggers, buttons, platform riding
//! 4. world tick: platforms (carrying riders), doors, button travel
//! 5. cooldown decay
//! 6. deferred load teleport
//! 7. HUD tick and feedback dispatch
//!
//! The teleport has to come after everything that moves the player in the
//! same step, or that movement would be applied on top of the restored
//! position.

use glam::{Quat, Vec2, Vec3};
use rr_core::input::{InputState, Key};

use crate::button::Button;
use crate::controller::{ControllerInput, LookCamera, PlayerController, Support};
use crate::feedback::{FeedbackQueue, FeedbackSink};
use crate::hud::{self, Hud, SceneCommand, Screen};
use crate::level::{build_room, LevelFile, Room, Tuning};
use crate::link::LinkError;
use crate::save_state::SaveStateStore;
use crate::trigger::Trigger;
use crate::world::{ObjectId, World};

/// Comparable summary of a session, used for logging and determinism checks.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub step: u64,
    pub player_position: Vec3,
    pub player_rotation: Quat,
    pub selected_slot: usize,
    pub filled_slots: Vec<bool>,
    pub open_doors: Vec<String>,
    pub moving_platforms: Vec<String>,
}

pub struct GameSession {
    scene: String,
    tuning: Tuning,
    world: World,
    player: ObjectId,
    player_half_extents: Vec3,
    controller: PlayerController,
    camera: LookCamera,
    riding: Option<ObjectId>,
    store: SaveStateStore,
    buttons: Vec<Button>,
    triggers: Vec<Trigger>,
    feedback: FeedbackQueue,
    hud: Hud,
    scene_command: Option<SceneCommand>,
    step_count: u64,
}

impl GameSession {
    pub fn from_level(level: &LevelFile) -> Result<Self, LinkError> {
        Ok(Self::new(build_room(level)?))
    }

    pub fn new(room: Room) -> Self {
        let Room {
            scene,
            tuning,
            world,
            player,
            player_half_extents,
            player_yaw_deg,
            buttons,
            triggers,
        } = room;

        let mut camera = LookCamera::new(tuning.camera_config());
        camera.yaw = player_yaw_deg;
        let mut feedback = FeedbackQueue::new();
        let mut store = SaveStateStore::new(tuning.save_state_config(), player);
        // Slot 1 is always valid; this only announces the initial selection.
        let _ = store.select_slot(1, &mut feedback);

        let hud = Hud::new(
            store.slot_count(),
            tuning.overwrite_flash_time,
            tuning.text_fade_time,
            Screen::SaveStateUi,
        );

        log::info!(
            "Session started in '{}' (cursor {})",
            scene,
            if hud::cursor_visible(&scene) {
                "visible"
            } else {
                "hidden"
            }
        );

        Self {
            controller: PlayerController::new(tuning.controller_config()),
            scene,
            tuning,
            world,
            player,
            player_half_extents,
            camera,
            riding: None,
            store,
            buttons,
            triggers,
            feedback,
            hud,
            scene_command: None,
            step_count: 0,
        }
    }

    pub fn scene(&self) -> &str {
        &self.scene
    }

    pub fn fixed_dt(&self) -> f32 {
        self.tuning.fixed_dt
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn player(&self) -> ObjectId {
        self.player
    }

    pub fn store(&self) -> &SaveStateStore {
        &self.store
    }

    pub fn buttons(&self) -> &[Button] {
        &self.buttons
    }

    pub fn hud(&self) -> &Hud {
        &self.hud
    }

    pub fn camera(&self) -> &LookCamera {
        &self.camera
    }

    pub fn riding(&self) -> Option<ObjectId> {
        self.riding
    }

    pub fn step_count(&self) -> u64 {
        self.step_count
    }

    /// Scene change confirmed on a menu screen since the last call.
    pub fn take_scene_command(&mut self) -> Option<SceneCommand> {
        self.scene_command.take()
    }

    /// Advance one fixed step. `sinks` receive every feedback event raised
    /// during the step, after the HUD has seen it.
    pub fn step(
        &mut self,
        input: &InputState,
        sinks: &mut [&mut dyn FeedbackSink],
    ) -> Result<(), LinkError> {
        let dt = self.tuning.fixed_dt;

        self.handle_actions(input);
        self.move_player(input, dt);
        self.update_contacts(input)?;

        self.world.tick(dt);
        for button in &mut self.buttons {
            button.tick(dt, &mut self.world)?;
        }

        self.store.tick(dt);

        if self
            .store
            .apply_deferred(&mut self.world, &mut self.feedback)
            .is_some()
        {
            self.controller.velocity_y = 0.0;
            self.set_riding(None);
        }

        self.hud.tick(dt);
        for event in self.feedback.drain() {
            self.hud.notify(&event);
            for sink in sinks.iter_mut() {
                sink.notify(&event);
            }
        }

        self.step_count += 1;
        Ok(())
    }

    fn handle_actions(&mut self, input: &InputState) {
        if input.is_just_pressed(Key::Escape) {
            if self.hud.screen() == Screen::Quit {
                self.hud.back();
            } else {
                self.hud.switch_to(Screen::Quit);
            }
        }
        if self.hud.screen() == Screen::Quit {
            // Interact confirms. Slot keys are ignored while the prompt is up.
            if input.is_just_pressed(Key::E) {
                self.scene_command = Some(SceneCommand::Quit);
            }
            return;
        }

        // Number keys reach slots 1-9; any further slots are scroll-only.
        for number in 1..=self.store.slot_count() {
            let Some(key) = Key::digit(number) else {
                break;
            };
            if input.is_just_pressed(key) {
                if let Err(err) = self.store.select_slot(number, &mut self.feedback) {
                    log::debug!("{err}");
                }
            }
        }

        let scroll = input.scroll_delta();
        if scroll != 0.0 {
            self.store
                .cycle_slot(scroll.signum() as i32, &mut self.feedback);
        }

        if input.is_just_pressed(Key::F) {
            self.store.save(&mut self.world, &mut self.feedback);
        }
        if input.is_just_pressed(Key::R) {
            self.store.load(&mut self.feedback);
        }
    }

    fn move_player(&mut self, input: &InputState, dt: f32) {
        self.camera.look(input.mouse_delta(), dt);

        let supports: Vec<Support> = self
            .world
            .iter()
            .filter(|(id, object)| *id != self.player && object.platform.is_some())
            .map(|(id, object)| Support {
                object: id,
                bounds: object.bounds(),
            })
            .collect();

        let controller_input = ControllerInput {
            move_axis: Vec2::new(input.axis(Key::A, Key::D), input.axis(Key::S, Key::W)),
            jump_pressed: input.is_just_pressed(Key::Space),
        };
        let Some(transform) = self.world.transform_mut(self.player) else {
            log::error!("Player {:?} is missing from the world", self.player);
            return;
        };
        self.controller.step(
            controller_input,
            &self.camera,
            dt,
            transform,
            self.player_half_extents,
            &supports,
        );
    }

    fn update_contacts(&mut self, input: &InputState) -> Result<(), LinkError> {
        let Some(player_bounds) = self.world.get(self.player).map(|object| object.bounds()) else {
            return Ok(());
        };
        let overlaps = |world: &World, id: ObjectId| {
            world
                .get(id)
                .is_some_and(|object| object.bounds().overlaps(&player_bounds))
        };

        for trigger in &mut self.triggers {
            let overlapping = overlaps(&self.world, trigger.volume());
            trigger.update(overlapping, &mut self.world, &mut self.buttons)?;
        }

        let interacting = input.is_held(Key::E);
        for button in &mut self.buttons {
            let in_contact = overlaps(&self.world, button.object());
            button.update_contact(in_contact, interacting, &mut self.world, &mut self.feedback)?;
        }

        self.set_riding(self.controller.standing_on);
        Ok(())
    }

    fn set_riding(&mut self, platform: Option<ObjectId>) {
        if self.riding == platform {
            return;
        }
        if let Some(previous) = self.riding.take() {
            if let Some(old) = self.world.platform_mut(previous) {
                old.detach(self.player);
            }
        }
        if let Some(next) = platform {
            if let Some(new) = self.world.platform_mut(next) {
                new.attach(self.player);
                self.riding = Some(next);
            }
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let transform = self.world.transform(self.player).copied().unwrap_or_default();
        let mut open_doors = Vec::new();
        let mut moving_platforms = Vec::new();
        for (_, object) in self.world.iter() {
            if object.door.as_ref().is_some_and(|door| door.is_open()) {
                open_doors.push(object.name.clone());
            }
            if object
                .platform
                .as_ref()
                .is_some_and(|platform| !platform.is_stopped())
            {
                moving_platforms.push(object.name.clone());
            }
        }
        SessionSnapshot {
            step: self.step_count,
            player_position: transform.position,
            player_rotation: transform.rotation,
            selected_slot: self.store.selected_slot(),
            filled_slots: (0..self.store.slot_count())
                .map(|slot| self.store.has_value(slot))
                .collect(),
            open_doors,
            moving_platforms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feedback::Feedback;
    use crate::hud::SlotIcon;
    use crate::replay::{ReplayFrame, ReplaySequence};

    const ROOM: &str = r#"
    {
      "version": "0.1",
      "scene": "PuzzleRoom1",
      "player": { "position": [1.0, 0.9, 1.0] },
      "objects": [
        { "name": "exit_door", "position": [0.0, 0.0, -8.0], "half_extents": [1.5, 1.5, 0.2],
          "door": { "open_height": 3.0, "open_time": 0.5, "close_time": 0.25 } },
        { "name": "lift", "position": [8.0, 0.25, 0.0], "half_extents": [1.0, 0.25, 1.0],
          "platform": { "waypoints": [[8.0, 0.25, 0.0], [8.0, 0.25, 6.0]], "speed": 1.5 } },
        { "name": "plate", "position": [1.0, 0.05, -3.0], "half_extents": [0.6, 0.05, 0.6] }
      ],
      "buttons": [
        { "object": "plate", "links": [
          { "kind": "door", "target": "exit_door", "default_state": "closed", "pressed_state": "open" }
        ] }
      ]
    }
    "#;

    #[derive(Default)]
    struct Recorder(Vec<Feedback>);

    impl FeedbackSink for Recorder {
        fn notify(&mut self, event: &Feedback) {
            self.0.push(event.clone());
        }
    }

    fn session() -> GameSession {
        let level: LevelFile = serde_json::from_str(ROOM).expect("parse room");
        GameSession::from_level(&level).expect("room builds")
    }

    fn step_with(session: &mut GameSession, input: &mut InputState, held: &[Key]) {
        input.set_held(held);
        session.step(input, &mut []).expect("step");
        input.end_frame();
    }

    fn idle(session: &mut GameSession, input: &mut InputState, steps: usize) {
        for _ in 0..steps {
            step_with(session, input, &[]);
        }
    }

    fn player_position(session: &GameSession) -> Vec3 {
        session.world().transform(session.player()).unwrap().position
    }

    #[test]
    fn save_then_load_restores_with_lift() {
        let mut session = session();
        let mut input = InputState::new();
        idle(&mut session, &mut input, 1);
        let saved = player_position(&session);
        assert_eq!(saved, Vec3::new(1.0, 0.9, 1.0));

        step_with(&mut session, &mut input, &[Key::F]);
        assert!(session.store().has_value(0));
        assert!(session.store().marker(0).is_some());

        idle(&mut session, &mut input, 30);
        step_with(&mut session, &mut input, &[Key::R]);
        let loaded = player_position(&session);
        assert!((loaded - (saved + Vec3::Y * 0.2)).length() < 1e-5);
        assert!(!session.store().has_value(0));
        assert!(session.store().marker(0).is_none());
    }

    #[test]
    fn teleport_wins_over_same_step_movement() {
        let mut session = session();
        let mut input = InputState::new();
        step_with(&mut session, &mut input, &[Key::F]);
        let saved = *session.world().transform(session.player()).unwrap();

        for _ in 0..20 {
            step_with(&mut session, &mut input, &[Key::D]);
        }
        step_with(&mut session, &mut input, &[Key::D, Key::R]);
        let loaded = player_position(&session);
        assert!((loaded.x - saved.position.x).abs() < 1e-5);
        assert!((loaded.z - saved.position.z).abs() < 1e-5);
    }

    #[test]
    fn held_save_key_fires_once() {
        let mut session = session();
        let mut input = InputState::new();
        let mut recorder = Recorder::default();
        for _ in 0..200 {
            input.set_held(&[Key::F]);
            session.step(&input, &mut [&mut recorder]).unwrap();
            input.end_frame();
        }
        let saves = recorder
            .0
            .iter()
            .filter(|event| matches!(event, Feedback::SlotFilled(_) | Feedback::SlotOverwritten(_)))
            .count();
        assert_eq!(saves, 1);
    }

    #[test]
    fn slot_keys_and_scroll_change_selection() {
        let mut session = session();
        let mut input = InputState::new();
        step_with(&mut session, &mut input, &[Key::Digit3]);
        assert_eq!(session.store().selected_slot(), 2);

        input.add_scroll(1.0);
        step_with(&mut session, &mut input, &[]);
        assert_eq!(session.store().selected_slot(), 0);

        input.add_scroll(-1.0);
        step_with(&mut session, &mut input, &[]);
        assert_eq!(session.store().selected_slot(), 2);
        assert_eq!(session.hud().icon(2), Some(SlotIcon::SelectedEmpty));
        assert_eq!(session.hud().icon(0), Some(SlotIcon::UnselectedEmpty));
    }

    #[test]
    fn save_updates_hud_and_sinks() {
        let mut session = session();
        let mut input = InputState::new();
        let mut recorder = Recorder::default();
        input.set_held(&[Key::F]);
        session.step(&input, &mut [&mut recorder]).unwrap();

        assert_eq!(session.hud().icon(0), Some(SlotIcon::SelectedFull));
        assert_eq!(session.hud().text(), Some("Added Save 1"));
        assert!(recorder.0.contains(&Feedback::SlotSelected(0)));
        assert!(recorder.0.contains(&Feedback::SlotFilled(0)));
    }

    #[test]
    fn walking_onto_plate_and_interacting_opens_door() {
        let mut session = session();
        let mut input = InputState::new();
        let mut recorder = Recorder::default();
        // Plate is 4 units ahead (-Z); walk speed 5 u/s.
        for _ in 0..48 {
            input.set_held(&[Key::W]);
            session.step(&input, &mut [&mut recorder]).unwrap();
            input.end_frame();
        }
        assert!(session.snapshot().open_doors.is_empty());

        input.set_held(&[Key::E]);
        session.step(&input, &mut [&mut recorder]).unwrap();
        input.end_frame();
        assert_eq!(session.snapshot().open_doors, vec!["exit_door".to_string()]);
        assert!(recorder.0.contains(&Feedback::ButtonSound));
        assert_eq!(session.buttons()[0].indicators(), &[true]);
    }

    #[test]
    fn number_keys_follow_configured_slot_count() {
        let level: LevelFile = serde_json::from_str(&ROOM.replace(
            r#""scene": "PuzzleRoom1","#,
            r#""scene": "PuzzleRoom1", "tuning": { "slot_count": 5 },"#,
        ))
        .expect("parse room");
        let mut five = GameSession::from_level(&level).expect("room builds");
        let mut input = InputState::new();

        step_with(&mut five, &mut input, &[Key::Digit5]);
        assert_eq!(five.store().selected_slot(), 4);
        step_with(&mut five, &mut input, &[]);
        step_with(&mut five, &mut input, &[Key::Digit6]);
        assert_eq!(five.store().selected_slot(), 4);

        // With the default three slots, 4 is not a slot.
        let mut three = session();
        step_with(&mut three, &mut input, &[]);
        step_with(&mut three, &mut input, &[Key::Digit4]);
        assert_eq!(three.store().selected_slot(), 0);
    }

    #[test]
    fn quit_prompt_blocks_slot_keys_and_confirms_with_interact() {
        let mut session = session();
        let mut input = InputState::new();
        step_with(&mut session, &mut input, &[Key::Escape]);
        assert_eq!(session.hud().screen(), Screen::Quit);

        step_with(&mut session, &mut input, &[]);
        step_with(&mut session, &mut input, &[Key::F]);
        assert!(!session.store().has_value(0));
        assert_eq!(session.take_scene_command(), None);

        step_with(&mut session, &mut input, &[]);
        step_with(&mut session, &mut input, &[Key::E]);
        let command = session.take_scene_command().expect("quit confirmed");
        assert_eq!(command, SceneCommand::Quit);
        assert_eq!(command.target_scene(), None);
        assert_eq!(session.take_scene_command(), None);

        step_with(&mut session, &mut input, &[Key::Escape]);
        assert_eq!(session.hud().screen(), Screen::SaveStateUi);
    }

    #[test]
    fn player_rides_platform() {
        let level: LevelFile = serde_json::from_str(
            &ROOM.replace(r#""position": [1.0, 0.9, 1.0]"#, r#""position": [8.0, 1.4, 0.0]"#),
        )
        .expect("parse room");
        let mut session = GameSession::from_level(&level).expect("room builds");
        let mut input = InputState::new();
        idle(&mut session, &mut input, 60);

        let lift = session.world().find_by_name("lift").unwrap();
        assert_eq!(session.riding(), Some(lift));
        let player = player_position(&session);
        let platform = session.world().transform(lift).unwrap().position;
        assert!(platform.z > 0.5);
        assert!((player.z - platform.z).abs() < 1e-4);
        assert!((player.y - 1.4).abs() < 1e-4);
    }

    #[test]
    fn same_replay_same_result() {
        let frame = |held: Vec<Key>, mouse_dx: f32, repeat: u32| ReplayFrame {
            held,
            mouse_dx,
            mouse_dy: 0.0,
            scroll: 0.0,
            repeat,
        };
        let replay = ReplaySequence {
            fixed_dt: 1.0 / 60.0,
            frames: vec![
                frame(vec![Key::F], 0.0, 1),
                frame(vec![Key::W], 2.0, 48),
                frame(vec![Key::E], 0.0, 2),
                frame(vec![Key::Space, Key::D], -1.0, 40),
                frame(vec![Key::Digit2], 0.0, 1),
                frame(vec![Key::R], 0.0, 1),
                frame(vec![Key::A, Key::W], 0.5, 90),
            ],
        };

        let run = || {
            let mut session = session();
            let mut input = InputState::new();
            for step in replay.expanded_steps() {
                step.apply(&mut input);
                session.step(&input, &mut []).unwrap();
                input.end_frame();
            }
            session.snapshot()
        };
        let first = run();
        let second = run();
        assert_eq!(first, second);
        assert_eq!(first.step, 183);
    }
}
