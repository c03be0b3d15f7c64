//! Actuation boundary
//!
//! The core never talks to input devices. Every command goes through the
//! `Actuator` trait, wrapped in a `GatedActuator` so that each primitive
//! re-arms the global rate gate.

pub mod gate;
pub mod recording;

pub use gate::{ActionGate, GatedActuator};
pub use recording::{Command, RecordingActuator};

use crate::core::types::{GridPos, Key, MouseButton, ScreenPos};

/// Input primitives supplied by the host backend.
///
/// Implementations add their own timing jitter and map grid positions to
/// screen coordinates.
pub trait Actuator {
    /// Point the cursor at a grid position and press a key (movement or cast)
    fn use_key_at(&mut self, target: GridPos, key: &Key);

    /// Click a grid position (world objects, labels)
    fn click_grid(&mut self, target: GridPos, button: MouseButton);

    /// Click a pixel position (panels, buttons)
    fn click_screen(&mut self, pos: ScreenPos, button: MouseButton);

    fn press_key(&mut self, key: &Key);

    fn key_down(&mut self, key: &Key);

    fn key_up(&mut self, key: &Key);

    fn send_text(&mut self, text: &str);

    /// Player position after the last primitive, when the backend can observe it
    fn player_position(&self) -> Option<GridPos> {
        None
    }
}
