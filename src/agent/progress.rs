//! Encounter progress state machine
//!
//! Interprets the anchor entity's raw signals into an active flag, a phase
//! counter and a cooldown. When the anchor goes unseen for too long the
//! encounter is considered inactive, without starting a cooldown.

use std::time::{Duration, Instant};

use serde::Serialize;

use crate::core::config::IdentityConfig;
use crate::core::types::GridPos;
use crate::perception::WorldSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ProgressEvent {
    Started,
    Ended,
    PhaseChanged { from: i64, to: i64 },
    Stale,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProgressState {
    pub anchor: Option<GridPos>,
    pub active: bool,
    pub phase: i64,
    #[serde(skip)]
    pub cooldown_until: Option<Instant>,
    #[serde(skip)]
    pub last_update: Option<Instant>,
}

#[derive(Debug, Clone, Default)]
pub struct ProgressStateMachine {
    state: ProgressState,
}

impl ProgressStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &ProgressState {
        &self.state
    }

    pub fn anchor(&self) -> Option<GridPos> {
        self.state.anchor
    }

    pub fn is_active(&self) -> bool {
        self.state.active
    }

    pub fn phase(&self) -> i64 {
        self.state.phase
    }

    /// Inactive and past the cooldown
    pub fn can_start(&self, now: Instant) -> bool {
        !self.state.active && self.state.cooldown_until.map_or(true, |t| now >= t)
    }

    pub fn reset(&mut self) {
        self.state = ProgressState::default();
    }

    /// Read the anchor's signals from this tick's snapshot
    pub fn observe(
        &mut self,
        snapshot: &WorldSnapshot,
        identities: &IdentityConfig,
        now: Instant,
        min_wave_delay: Duration,
        stale_after: Duration,
    ) -> Vec<ProgressEvent> {
        let mut events = Vec::new();
        let was_active = self.state.active;

        let Some(anchor) = snapshot.first_with_identity(&identities.progress_anchor) else {
            let stale = self
                .state
                .last_update
                .is_some_and(|t| now.saturating_duration_since(t) > stale_after);
            if was_active && stale {
                tracing::warn!("progress anchor unseen, treating encounter as inactive");
                self.state.active = false;
                events.push(ProgressEvent::Stale);
            }
            return events;
        };

        let active = anchor.signal(&identities.active_signal).unwrap_or(0) > 0;
        let ending = anchor.signal(&identities.ending_signal).unwrap_or(0) != 0;
        let phase = anchor
            .signal(&identities.phase_signal)
            .unwrap_or(self.state.phase);

        if self.state.anchor.is_none() {
            tracing::info!(position = ?anchor.position, "progress anchor found");
        }
        self.state.anchor = Some(anchor.position);
        self.state.active = active && !ending;
        self.state.last_update = Some(now);

        if was_active && !self.state.active {
            self.state.cooldown_until = Some(now + min_wave_delay);
            tracing::info!(phase, "encounter phase ended");
            events.push(ProgressEvent::Ended);
        } else if !was_active && self.state.active {
            tracing::info!(phase, "encounter phase started");
            events.push(ProgressEvent::Started);
        }

        if phase != self.state.phase {
            events.push(ProgressEvent::PhaseChanged {
                from: self.state.phase,
                to: phase,
            });
            self.state.phase = phase;
        }

        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::perception::EntityHandle;
    use glam::Vec2;

    const DELAY: Duration = Duration::from_secs(5);
    const STALE: Duration = Duration::from_secs(10);

    fn snapshot(active: i64, ending: i64, phase: i64) -> WorldSnapshot {
        let mut snapshot = WorldSnapshot::new("Arena", Vec2::ZERO);
        snapshot.entities.push(
            EntityHandle::object(1, Vec2::new(30.0, 30.0), "Objects/ProgressAnchor")
                .with_signal("active", active)
                .with_signal("ending", ending)
                .with_signal("phase", phase),
        );
        snapshot
    }

    #[test]
    fn test_active_requires_no_ending_signal() {
        let ids = IdentityConfig::default();
        let now = Instant::now();
        let mut machine = ProgressStateMachine::new();

        machine.observe(&snapshot(1, 1, 1), &ids, now, DELAY, STALE);
        assert!(!machine.is_active());
        assert_eq!(machine.anchor(), Some(Vec2::new(30.0, 30.0)));

        let events = machine.observe(&snapshot(1, 0, 1), &ids, now, DELAY, STALE);
        assert!(machine.is_active());
        assert_eq!(events, vec![ProgressEvent::Started]);
    }

    #[test]
    fn test_end_starts_cooldown() {
        let ids = IdentityConfig::default();
        let t0 = Instant::now();
        let mut machine = ProgressStateMachine::new();
        machine.observe(&snapshot(1, 0, 1), &ids, t0, DELAY, STALE);

        let t = t0 + Duration::from_secs(30);
        let events = machine.observe(&snapshot(0, 0, 1), &ids, t, DELAY, STALE);
        assert_eq!(events, vec![ProgressEvent::Ended]);
        assert!(!machine.can_start(t + Duration::from_millis(4999)));
        assert!(machine.can_start(t + DELAY));
    }

    #[test]
    fn test_phase_change_is_reported() {
        let ids = IdentityConfig::default();
        let now = Instant::now();
        let mut machine = ProgressStateMachine::new();
        machine.observe(&snapshot(0, 0, 3), &ids, now, DELAY, STALE);
        let events = machine.observe(&snapshot(1, 0, 4), &ids, now, DELAY, STALE);
        assert!(events.contains(&ProgressEvent::PhaseChanged { from: 3, to: 4 }));
        assert_eq!(machine.phase(), 4);
    }

    #[test]
    fn test_stale_anchor_degrades_without_cooldown() {
        let ids = IdentityConfig::default();
        let t0 = Instant::now();
        let mut machine = ProgressStateMachine::new();
        machine.observe(&snapshot(1, 0, 1), &ids, t0, DELAY, STALE);

        let empty = WorldSnapshot::new("Arena", Vec2::ZERO);
        let events = machine.observe(&empty, &ids, t0 + Duration::from_secs(5), DELAY, STALE);
        assert!(events.is_empty());
        assert!(machine.is_active());

        let events = machine.observe(&empty, &ids, t0 + Duration::from_secs(11), DELAY, STALE);
        assert_eq!(events, vec![ProgressEvent::Stale]);
        assert!(!machine.is_active());
        assert!(machine.can_start(t0 + Duration::from_secs(11)));
        // anchor position is still known
        assert!(machine.anchor().is_some());
    }
}
