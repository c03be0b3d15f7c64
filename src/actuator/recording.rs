//! Actuator that records commands instead of performing them

use serde::Serialize;

use super::Actuator;
use crate::core::types::{GridPos, Key, MouseButton, ScreenPos};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Command {
    UseKeyAt { target: [f32; 2], key: String },
    ClickGrid { target: [f32; 2], button: MouseButton },
    ClickScreen { pos: ScreenPos, button: MouseButton },
    PressKey { key: String },
    KeyDown { key: String },
    KeyUp { key: String },
    SendText { text: String },
}

#[derive(Debug, Default)]
pub struct RecordingActuator {
    pub commands: Vec<Command>,
    /// When set, `use_key_at` moves the simulated player onto its target
    pub teleport: bool,
    position: Option<GridPos>,
}

impl RecordingActuator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorder whose simulated player arrives instantly at move targets
    pub fn teleporting() -> Self {
        Self {
            teleport: true,
            ..Self::default()
        }
    }

    /// Remove and return everything recorded so far
    pub fn drain(&mut self) -> Vec<Command> {
        std::mem::take(&mut self.commands)
    }

    pub fn key_presses(&self) -> impl Iterator<Item = &str> {
        self.commands.iter().filter_map(|c| match c {
            Command::PressKey { key } => Some(key.as_str()),
            _ => None,
        })
    }
}

impl Actuator for RecordingActuator {
    fn use_key_at(&mut self, target: GridPos, key: &Key) {
        if self.teleport {
            self.position = Some(target);
        }
        self.commands.push(Command::UseKeyAt {
            target: target.to_array(),
            key: key.to_string(),
        });
    }

    fn click_grid(&mut self, target: GridPos, button: MouseButton) {
        self.commands.push(Command::ClickGrid {
            target: target.to_array(),
            button,
        });
    }

    fn click_screen(&mut self, pos: ScreenPos, button: MouseButton) {
        self.commands.push(Command::ClickScreen { pos, button });
    }

    fn press_key(&mut self, key: &Key) {
        self.commands.push(Command::PressKey {
            key: key.to_string(),
        });
    }

    fn key_down(&mut self, key: &Key) {
        self.commands.push(Command::KeyDown {
            key: key.to_string(),
        });
    }

    fn key_up(&mut self, key: &Key) {
        self.commands.push(Command::KeyUp {
            key: key.to_string(),
        });
    }

    fn send_text(&mut self, text: &str) {
        self.commands.push(Command::SendText {
            text: text.to_string(),
        });
    }

    fn player_position(&self) -> Option<GridPos> {
        self.position
    }
}
