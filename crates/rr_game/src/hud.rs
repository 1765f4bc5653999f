//! Save-slot icons, screen switching and the transient text line.
//!
//! The HUD is a feedback sink: it never talks back to gameplay. Slot icon
//! updates only land while the save-state screen is the visible one, so
//! icons go stale behind a menu exactly the way the in-game canvas does.

use rr_core::timer::Fade;

use crate::feedback::{Feedback, FeedbackSink};

/// Icon per slot. The discriminant is the offset into the slot's four
/// sprites.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotIcon {
    UnselectedEmpty = 0,
    UnselectedFull = 1,
    SelectedEmpty = 2,
    SelectedFull = 3,
}

impl SlotIcon {
    pub fn is_full(self) -> bool {
        matches!(self, Self::UnselectedFull | Self::SelectedFull)
    }

    pub fn is_selected(self) -> bool {
        matches!(self, Self::SelectedEmpty | Self::SelectedFull)
    }

    fn with(selected: bool, full: bool) -> Self {
        match (selected, full) {
            (false, false) => Self::UnselectedEmpty,
            (false, true) => Self::UnselectedFull,
            (true, false) => Self::SelectedEmpty,
            (true, true) => Self::SelectedFull,
        }
    }
}

/// Sprite sheet index for `icon` on `slot` (four sprites per slot).
pub fn sprite_index(slot: usize, icon: SlotIcon) -> usize {
    slot * 4 + icon as usize
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Screen {
    MainMenu,
    Credits,
    HowToPlay,
    Quit,
    SaveStateUi,
}

impl Screen {
    pub const ALL: &'static [Screen] = &[
        Screen::MainMenu,
        Screen::Credits,
        Screen::HowToPlay,
        Screen::Quit,
        Screen::SaveStateUi,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::MainMenu => "Main Menu",
            Self::Credits => "Credits",
            Self::HowToPlay => "How To Play",
            Self::Quit => "Quit",
            Self::SaveStateUi => "Save States",
        }
    }
}

impl std::fmt::Display for Screen {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneCommand {
    StartGame,
    MainMenu,
    Quit,
}

pub const FIRST_PUZZLE_SCENE: &str = "PuzzleRoom1";
pub const MAIN_MENU_SCENE: &str = "MainMenu";

impl SceneCommand {
    /// Scene to load next, or `None` when the application should exit.
    pub fn target_scene(self) -> Option<&'static str> {
        match self {
            Self::StartGame => Some(FIRST_PUZZLE_SCENE),
            Self::MainMenu => Some(MAIN_MENU_SCENE),
            Self::Quit => None,
        }
    }
}

/// The pointer is captured in puzzle rooms and free everywhere else.
pub fn cursor_visible(scene_name: &str) -> bool {
    !scene_name.contains("Puzzle")
}

#[derive(Debug, Clone, Copy)]
struct Flash {
    slot: usize,
    remaining: f32,
}

pub struct Hud {
    icons: Vec<SlotIcon>,
    selected: Option<usize>,
    screen: Screen,
    last_screen: Option<Screen>,
    flashes: Vec<Flash>,
    flash_time: f32,
    text: Fade,
}

impl Hud {
    pub fn new(slot_count: usize, flash_time: f32, text_fade_time: f32, screen: Screen) -> Self {
        Self {
            icons: vec![SlotIcon::UnselectedEmpty; slot_count],
            selected: None,
            screen,
            last_screen: None,
            flashes: Vec::new(),
            flash_time,
            text: Fade::new(text_fade_time),
        }
    }

    pub fn icon(&self, slot: usize) -> Option<SlotIcon> {
        self.icons.get(slot).copied()
    }

    pub fn icons(&self) -> &[SlotIcon] {
        &self.icons
    }

    pub fn sprite(&self, slot: usize) -> Option<usize> {
        self.icon(slot).map(|icon| sprite_index(slot, icon))
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    pub fn text(&self) -> Option<&str> {
        self.text.message()
    }

    pub fn text_alpha(&self) -> f32 {
        self.text.alpha()
    }

    pub fn switch_to(&mut self, screen: Screen) {
        if screen == self.screen {
            return;
        }
        self.last_screen = Some(self.screen);
        self.screen = screen;
        log::debug!("Screen: {}", screen);
    }

    /// Return to the screen that was visible before the last switch.
    pub fn back(&mut self) {
        if let Some(previous) = self.last_screen {
            self.switch_to(previous);
        }
    }

    pub fn tick(&mut self, dt: f32) {
        self.text.tick(dt);

        let mut finished = Vec::new();
        self.flashes.retain_mut(|flash| {
            flash.remaining -= dt;
            if flash.remaining <= 0.0 {
                finished.push(flash.slot);
                false
            } else {
                true
            }
        });
        for slot in finished {
            let selected = self.selected == Some(slot);
            self.set_icon(slot, SlotIcon::with(selected, true));
        }
    }

    fn slots_visible(&self) -> bool {
        self.screen == Screen::SaveStateUi
    }

    fn set_icon(&mut self, slot: usize, icon: SlotIcon) {
        if !self.slots_visible() {
            return;
        }
        if let Some(current) = self.icons.get_mut(slot) {
            *current = icon;
        }
    }
}

impl FeedbackSink for Hud {
    fn notify(&mut self, event: &Feedback) {
        match *event {
            Feedback::SlotSelected(slot) => {
                self.selected = Some(slot);
                let full = self.icon(slot).is_some_and(SlotIcon::is_full);
                self.set_icon(slot, SlotIcon::with(true, full));
            }
            Feedback::SlotDeselected(slot) => {
                if self.selected == Some(slot) {
                    self.selected = None;
                }
                let full = self.icon(slot) == Some(SlotIcon::SelectedFull);
                self.set_icon(slot, SlotIcon::with(false, full));
            }
            Feedback::SlotFilled(slot) => self.set_icon(slot, SlotIcon::SelectedFull),
            Feedback::SlotEmptied(slot) => self.set_icon(slot, SlotIcon::SelectedEmpty),
            Feedback::SlotOverwritten(slot) => {
                self.set_icon(slot, SlotIcon::SelectedEmpty);
                self.flashes.retain(|flash| flash.slot != slot);
                self.flashes.push(Flash {
                    slot,
                    remaining: self.flash_time,
                });
            }
            Feedback::Text(ref message) => self.text.show(message.clone()),
            Feedback::ButtonSound => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hud() -> Hud {
        Hud::new(3, 0.5, 1.5, Screen::SaveStateUi)
    }

    #[test]
    fn sprite_index_groups_four_per_slot() {
        assert_eq!(sprite_index(0, SlotIcon::UnselectedEmpty), 0);
        assert_eq!(sprite_index(0, SlotIcon::SelectedFull), 3);
        assert_eq!(sprite_index(1, SlotIcon::UnselectedFull), 5);
        assert_eq!(sprite_index(2, SlotIcon::SelectedEmpty), 10);
    }

    #[test]
    fn select_and_deselect_keep_fill_state() {
        let mut hud = hud();
        hud.notify(&Feedback::SlotSelected(0));
        assert_eq!(hud.icon(0), Some(SlotIcon::SelectedEmpty));
        hud.notify(&Feedback::SlotFilled(0));
        assert_eq!(hud.icon(0), Some(SlotIcon::SelectedFull));

        hud.notify(&Feedback::SlotDeselected(0));
        hud.notify(&Feedback::SlotSelected(1));
        assert_eq!(hud.icon(0), Some(SlotIcon::UnselectedFull));
        assert_eq!(hud.icon(1), Some(SlotIcon::SelectedEmpty));

        hud.notify(&Feedback::SlotDeselected(1));
        hud.notify(&Feedback::SlotSelected(0));
        assert_eq!(hud.icon(0), Some(SlotIcon::SelectedFull));
        assert_eq!(hud.icon(1), Some(SlotIcon::UnselectedEmpty));
    }

    #[test]
    fn overwrite_flashes_then_returns_to_full() {
        let mut hud = hud();
        hud.notify(&Feedback::SlotSelected(2));
        hud.notify(&Feedback::SlotFilled(2));
        hud.notify(&Feedback::SlotOverwritten(2));
        assert_eq!(hud.icon(2), Some(SlotIcon::SelectedEmpty));

        hud.tick(0.3);
        assert_eq!(hud.icon(2), Some(SlotIcon::SelectedEmpty));
        hud.tick(0.3);
        assert_eq!(hud.icon(2), Some(SlotIcon::SelectedFull));
    }

    #[test]
    fn overwrite_flash_ends_unselected_if_selection_moved() {
        let mut hud = hud();
        hud.notify(&Feedback::SlotSelected(0));
        hud.notify(&Feedback::SlotOverwritten(0));
        hud.notify(&Feedback::SlotDeselected(0));
        hud.notify(&Feedback::SlotSelected(1));
        hud.tick(1.0);
        assert_eq!(hud.icon(0), Some(SlotIcon::UnselectedFull));
    }

    #[test]
    fn hidden_slot_screen_ignores_updates() {
        let mut hud = hud();
        hud.switch_to(Screen::Quit);
        hud.notify(&Feedback::SlotSelected(0));
        hud.notify(&Feedback::SlotFilled(0));
        assert_eq!(hud.icon(0), Some(SlotIcon::UnselectedEmpty));

        hud.back();
        assert_eq!(hud.screen(), Screen::SaveStateUi);
        hud.notify(&Feedback::SlotFilled(0));
        assert_eq!(hud.icon(0), Some(SlotIcon::SelectedFull));
    }

    #[test]
    fn back_returns_to_previous_screen() {
        let mut hud = Hud::new(3, 0.5, 1.5, Screen::MainMenu);
        hud.back();
        assert_eq!(hud.screen(), Screen::MainMenu);
        hud.switch_to(Screen::Credits);
        hud.back();
        assert_eq!(hud.screen(), Screen::MainMenu);
        hud.switch_to(Screen::HowToPlay);
        hud.switch_to(Screen::Quit);
        hud.back();
        assert_eq!(hud.screen(), Screen::HowToPlay);
    }

    #[test]
    fn text_is_replaced_by_newer_message() {
        let mut hud = hud();
        hud.notify(&Feedback::Text("Added Save 1".into()));
        hud.tick(1.0);
        hud.notify(&Feedback::Text("Loaded Save 1".into()));
        assert_eq!(hud.text(), Some("Loaded Save 1"));
        assert!((hud.text_alpha() - 1.0).abs() < 1e-6);
        hud.tick(2.0);
        assert_eq!(hud.text(), None);
    }

    #[test]
    fn scene_commands_and_cursor() {
        assert_eq!(SceneCommand::StartGame.target_scene(), Some("PuzzleRoom1"));
        assert_eq!(SceneCommand::MainMenu.target_scene(), Some("MainMenu"));
        assert_eq!(SceneCommand::Quit.target_scene(), None);
        assert!(!cursor_visible("PuzzleRoom2"));
        assert!(cursor_visible("MainMenu"));
    }

    #[test]
    fn screen_labels_are_distinct() {
        for (i, a) in Screen::ALL.iter().enumerate() {
            for b in &Screen::ALL[i + 1..] {
                assert_ne!(a.label(), b.label());
            }
        }
    }
}
