//! Lua feedback scripts.
//!
//! A script can react to gameplay notifications (slot changes, transient text,
//! button sounds) by defining global handler functions:
//!
//! ```lua
//! function on_slot_filled(slot) engine.log("filled " .. slot) end
//! function on_text(message) end
//! function on_button_sound() end
//! ```
//!
//! Slots are passed one-based, matching what the player sees. Handlers are
//! optional; a missing one is skipped. Scripts only observe: nothing they do
//! flows back into the simulation, and a handler error is logged and dropped.
//!
//! Reload strategy: on file change (mtime polling) a **fresh Lua state** is
//! created and the script is re-executed from scratch, so no globals leak
//! from the previous version.

use std::path::PathBuf;
use std::time::SystemTime;

use mlua::prelude::*;

use crate::feedback::{Feedback, FeedbackSink};

/// Status of the Lua runtime for the session summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LuaStatus {
    /// Script loaded and receiving notifications.
    Loaded,
    /// Script had an error; notifications are dropped until it is fixed.
    Error,
    /// No script file found; notifications go to the log only.
    Fallback,
}

impl LuaStatus {
    pub fn label(self) -> &'static str {
        match self {
            Self::Loaded => "Lua: loaded",
            Self::Error => "Lua: ERROR",
            Self::Fallback => "Lua: fallback",
        }
    }
}

impl std::fmt::Display for LuaStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

pub struct LuaFeedback {
    lua: Lua,
    script_path: PathBuf,
    last_modified: Option<SystemTime>,
    status: LuaStatus,
    last_error: Option<String>,
    delivered: usize,
}

impl LuaFeedback {
    /// If the script file doesn't exist, starts in Fallback mode.
    pub fn new(script_path: PathBuf) -> Self {
        let mut bridge = Self {
            lua: Lua::new(),
            script_path,
            last_modified: None,
            status: LuaStatus::Fallback,
            last_error: None,
            delivered: 0,
        };
        bridge.try_load_script();
        bridge
    }

    pub fn status(&self) -> LuaStatus {
        self.status
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Number of notifications a handler actually ran for.
    pub fn delivered(&self) -> usize {
        self.delivered
    }

    /// Reload if the script file changed. Call between fixed steps.
    pub fn check_reload(&mut self) {
        let current_mtime = match std::fs::metadata(&self.script_path) {
            Ok(meta) => meta.modified().ok(),
            Err(_) => return,
        };

        if current_mtime != self.last_modified {
            log::info!(
                "Lua script changed, reloading: {}",
                self.script_path.display()
            );
            self.try_load_script();
        }
    }

    fn dispatch(&self, event: &Feedback) -> LuaResult<bool> {
        let (handler, arg) = match event {
            Feedback::SlotSelected(slot) => ("on_slot_selected", LuaArg::Slot(*slot)),
            Feedback::SlotDeselected(slot) => ("on_slot_deselected", LuaArg::Slot(*slot)),
            Feedback::SlotFilled(slot) => ("on_slot_filled", LuaArg::Slot(*slot)),
            Feedback::SlotEmptied(slot) => ("on_slot_emptied", LuaArg::Slot(*slot)),
            Feedback::SlotOverwritten(slot) => ("on_slot_overwritten", LuaArg::Slot(*slot)),
            Feedback::Text(message) => ("on_text", LuaArg::Text(message)),
            Feedback::ButtonSound => ("on_button_sound", LuaArg::Unit),
        };

        let Some(function) = self.lua.globals().get::<Option<LuaFunction>>(handler)? else {
            return Ok(false);
        };
        match arg {
            LuaArg::Slot(slot) => function.call::<()>(slot as i64 + 1)?,
            LuaArg::Text(message) => function.call::<()>(message)?,
            LuaArg::Unit => function.call::<()>(())?,
        }
        Ok(true)
    }

    fn try_load_script(&mut self) {
        if !self.script_path.exists() {
            log::warn!(
                "Lua script not found: {}. Feedback goes to the log only.",
                self.script_path.display()
            );
            self.status = LuaStatus::Fallback;
            self.last_error = None;
            self.last_modified = None;
            return;
        }

        self.last_modified = std::fs::metadata(&self.script_path)
            .ok()
            .and_then(|m| m.modified().ok());

        self.lua = Lua::new();

        if let Err(err) = self.setup_engine_api() {
            let msg = format!("Failed to setup Lua engine API: {}", err);
            log::error!("{}", msg);
            self.status = LuaStatus::Error;
            self.last_error = Some(msg);
            return;
        }

        let source = match std::fs::read_to_string(&self.script_path) {
            Ok(source) => source,
            Err(err) => {
                let msg = format!("Failed to read Lua script: {}", err);
                log::error!("{}", msg);
                self.status = LuaStatus::Error;
                self.last_error = Some(msg);
                return;
            }
        };

        match self
            .lua
            .load(&source)
            .set_name(self.script_path.to_string_lossy())
            .exec()
        {
            Ok(()) => {
                self.status = LuaStatus::Loaded;
                self.last_error = None;
                log::info!("Lua script loaded: {}", self.script_path.display());
            }
            Err(err) => {
                let msg = format!("Lua script load error: {}", err);
                log::error!("{}", msg);
                self.status = LuaStatus::Error;
                self.last_error = Some(msg);
            }
        }
    }

    /// `engine.log(message)` writes to the host log at info level.
    fn setup_engine_api(&self) -> LuaResult<()> {
        let engine = self.lua.create_table()?;
        let log_fn = self.lua.create_function(|_, message: String| {
            log::info!("[lua] {}", message);
            Ok(())
        })?;
        engine.set("log", log_fn)?;
        self.lua.globals().set("engine", engine)?;
        Ok(())
    }
}

enum LuaArg<'a> {
    Slot(usize),
    Text(&'a str),
    Unit,
}

impl FeedbackSink for LuaFeedback {
    fn notify(&mut self, event: &Feedback) {
        if self.status != LuaStatus::Loaded {
            return;
        }
        match self.dispatch(event) {
            Ok(true) => self.delivered += 1,
            Ok(false) => {}
            Err(err) => log::error!("Lua feedback handler error for {:?}: {}", event, err),
        }
    }
}
