//! Global action-rate gate

use std::time::{Duration, Instant};

use super::Actuator;
use crate::core::types::{GridPos, Key, MouseButton, ScreenPos};

/// Single "next allowed action" timestamp plus a focus check
#[derive(Debug, Clone, Default)]
pub struct ActionGate {
    next_allowed: Option<Instant>,
}

impl ActionGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self, now: Instant, window_focused: bool) -> bool {
        window_focused && self.next_allowed.map_or(true, |t| now >= t)
    }

    pub fn reset(&mut self, now: Instant, interval: Duration) {
        self.next_allowed = Some(now + interval);
    }

    pub fn next_allowed(&self) -> Option<Instant> {
        self.next_allowed
    }
}

/// Wraps a backend so that every primitive resets the gate
pub struct GatedActuator<'a> {
    inner: &'a mut dyn Actuator,
    gate: &'a mut ActionGate,
    now: Instant,
    interval: Duration,
    actuations: usize,
}

impl<'a> GatedActuator<'a> {
    pub fn new(
        inner: &'a mut dyn Actuator,
        gate: &'a mut ActionGate,
        now: Instant,
        interval: Duration,
    ) -> Self {
        Self {
            inner,
            gate,
            now,
            interval,
            actuations: 0,
        }
    }

    /// Primitives issued through this wrapper so far
    pub fn actuations(&self) -> usize {
        self.actuations
    }

    fn performed(&mut self) {
        self.actuations += 1;
        self.gate.reset(self.now, self.interval);
    }
}

impl Actuator for GatedActuator<'_> {
    fn use_key_at(&mut self, target: GridPos, key: &Key) {
        self.inner.use_key_at(target, key);
        self.performed();
    }

    fn click_grid(&mut self, target: GridPos, button: MouseButton) {
        self.inner.click_grid(target, button);
        self.performed();
    }

    fn click_screen(&mut self, pos: ScreenPos, button: MouseButton) {
        self.inner.click_screen(pos, button);
        self.performed();
    }

    fn press_key(&mut self, key: &Key) {
        self.inner.press_key(key);
        self.performed();
    }

    fn key_down(&mut self, key: &Key) {
        self.inner.key_down(key);
        self.performed();
    }

    fn key_up(&mut self, key: &Key) {
        self.inner.key_up(key);
        self.performed();
    }

    fn send_text(&mut self, text: &str) {
        self.inner.send_text(text);
        self.performed();
    }

    fn player_position(&self) -> Option<GridPos> {
        self.inner.player_position()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actuator::RecordingActuator;

    #[test]
    fn test_gate_requires_focus_and_time() {
        let now = Instant::now();
        let mut gate = ActionGate::new();
        assert!(gate.is_open(now, true));
        assert!(!gate.is_open(now, false));

        gate.reset(now, Duration::from_millis(100));
        assert!(!gate.is_open(now + Duration::from_millis(50), true));
        assert!(gate.is_open(now + Duration::from_millis(100), true));
    }

    #[test]
    fn test_every_primitive_resets_gate() {
        let now = Instant::now();
        let mut gate = ActionGate::new();
        let mut backend = RecordingActuator::new();
        {
            let mut gated =
                GatedActuator::new(&mut backend, &mut gate, now, Duration::from_millis(100));
            gated.press_key(&Key::new("Z"));
            gated.click_screen(ScreenPos::new(1.0, 2.0), MouseButton::Left);
            assert_eq!(gated.actuations(), 2);
        }
        assert_eq!(backend.commands.len(), 2);
        assert_eq!(gate.next_allowed(), Some(now + Duration::from_millis(100)));
    }
}
