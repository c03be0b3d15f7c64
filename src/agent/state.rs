//! Run state shared by the arbiter and actions

use std::time::{Duration, Instant};

use serde::Serialize;

use super::progress::{ProgressEvent, ProgressStateMachine};
use crate::combat::{CombatStrategy, Strategy, StrategyKind};
use crate::core::config::AgentConfig;
use crate::core::types::GridPos;
use crate::perception::WorldSnapshot;

/// Player movement below this is treated as standing still
const MOTION_EPSILON: f32 = 0.1;

/// Tracks when the player last changed position
#[derive(Debug, Clone)]
pub struct MotionTracker {
    last_position: Option<GridPos>,
    last_moved_at: Instant,
}

impl MotionTracker {
    pub fn new(now: Instant) -> Self {
        Self {
            last_position: None,
            last_moved_at: now,
        }
    }

    pub fn update(&mut self, position: GridPos, now: Instant) {
        let moved = self
            .last_position
            .map_or(true, |p| p.distance(position) > MOTION_EPSILON);
        if moved {
            self.last_position = Some(position);
            self.last_moved_at = now;
        }
    }

    /// Restart the stillness window, e.g. when a new path is started
    pub fn touch(&mut self, now: Instant) {
        self.last_moved_at = self.last_moved_at.max(now);
    }

    pub fn stationary_for(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.last_moved_at)
    }

    pub fn last_moved_at(&self) -> Instant {
        self.last_moved_at
    }
}

/// Positions of designated entities, remembered across ticks
#[derive(Debug, Clone, Default, Serialize)]
pub struct Landmarks {
    /// Sticky for the area visit once seen
    pub stash: Option<GridPos>,
    /// Nearest portal at the last sighting
    pub portal: Option<GridPos>,
    pub map_device: Option<GridPos>,
}

#[derive(Debug, Clone, Default)]
pub struct ExploreCycle {
    /// Revealed chunks are cleared when the next explore action starts
    pub needs_reset: bool,
    /// Cycles that exhausted the map without finding the progress anchor
    pub anchorless_exhausted: u32,
}

#[derive(Debug, Clone)]
pub struct RunState {
    pub progress: ProgressStateMachine,
    pub landmarks: Landmarks,
    pub motion: MotionTracker,
    pub explore: ExploreCycle,
    /// Items moved to the stash during the current phase
    pub store_attempts: u32,
    /// Last tick on which valid combat targets were visible
    pub last_targets_seen: Option<Instant>,
    /// Loot stays pending until this time while the encounter is inactive
    pub loot_settle_until: Option<Instant>,
    pub last_loot_toggle: Option<Instant>,
    /// Target selection state; outlives individual combat actions
    combat: Option<Strategy>,
}

impl RunState {
    pub fn new(now: Instant) -> Self {
        Self {
            progress: ProgressStateMachine::new(),
            landmarks: Landmarks::default(),
            motion: MotionTracker::new(now),
            explore: ExploreCycle {
                needs_reset: true,
                anchorless_exhausted: 0,
            },
            store_attempts: 0,
            last_targets_seen: None,
            loot_settle_until: None,
            last_loot_toggle: None,
            combat: None,
        }
    }

    /// Strategy for the configured kind, rebuilt only when the kind changes
    pub fn combat_strategy(&mut self, kind: StrategyKind) -> &mut Strategy {
        if self.combat.as_ref().map(|s| s.kind()) != Some(kind) {
            tracing::debug!(?kind, "combat strategy built");
            self.combat = Some(Strategy::from_kind(kind));
        }
        self.combat.get_or_insert_with(|| Strategy::from_kind(kind))
    }

    pub fn combat(&self) -> Option<&Strategy> {
        self.combat.as_ref()
    }

    /// Fresh state for a new area visit
    pub fn reset_for_area(&mut self, now: Instant) {
        *self = Self::new(now);
    }

    /// Perception phase of a tick: motion, progress signals, landmarks
    pub fn observe(
        &mut self,
        snapshot: &WorldSnapshot,
        config: &AgentConfig,
        now: Instant,
    ) -> Vec<ProgressEvent> {
        self.motion.update(snapshot.player_pos(), now);

        let events = self.progress.observe(
            snapshot,
            &config.identities,
            now,
            config.timing.min_wave_delay(),
            config.timing.anchor_stale(),
        );
        for event in &events {
            if let ProgressEvent::PhaseChanged { from, to } = event {
                tracing::debug!(from, to, store_attempts = self.store_attempts, "per-phase counters reset");
                self.store_attempts = 0;
            }
        }

        let ids = &config.identities;
        if self.landmarks.stash.is_none() {
            if let Some(stash) = snapshot.nearest_with_identity(&ids.stash) {
                tracing::debug!(position = ?stash.position, "stash located");
                self.landmarks.stash = Some(stash.position);
            }
        }
        if let Some(portal) = snapshot.nearest_with_identity(&ids.portal) {
            self.landmarks.portal = Some(portal.position);
        }
        if let Some(device) = snapshot.nearest_with_identity(&ids.map_device) {
            self.landmarks.map_device = Some(device.position);
        }

        events
    }

    /// Loot is pending when an item is visible, or while the settle window
    /// after the last seen item is open and no encounter is running
    pub fn loot_pending(&self, item_visible: bool, now: Instant) -> bool {
        item_visible
            || (!self.progress.is_active()
                && self.loot_settle_until.is_some_and(|t| now < t))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::perception::EntityHandle;
    use glam::Vec2;

    #[test]
    fn test_motion_tracker_ignores_jitter() {
        let t0 = Instant::now();
        let mut motion = MotionTracker::new(t0);
        motion.update(Vec2::new(10.0, 10.0), t0);
        motion.update(Vec2::new(10.05, 10.0), t0 + Duration::from_secs(1));
        assert_eq!(motion.stationary_for(t0 + Duration::from_secs(3)), Duration::from_secs(3));

        motion.update(Vec2::new(12.0, 10.0), t0 + Duration::from_secs(3));
        assert_eq!(motion.stationary_for(t0 + Duration::from_secs(3)), Duration::ZERO);
    }

    #[test]
    fn test_stash_is_sticky_portal_follows_nearest() {
        let config = AgentConfig::default();
        let now = Instant::now();
        let mut run = RunState::new(now);

        let mut snapshot = WorldSnapshot::new("Arena", Vec2::ZERO);
        snapshot
            .entities
            .push(EntityHandle::object(1, Vec2::new(5.0, 5.0), "Stash"));
        snapshot
            .entities
            .push(EntityHandle::object(2, Vec2::new(50.0, 0.0), "Portal"));
        run.observe(&snapshot, &config, now);
        assert_eq!(run.landmarks.stash, Some(Vec2::new(5.0, 5.0)));

        let mut moved = WorldSnapshot::new("Arena", Vec2::new(100.0, 0.0));
        moved
            .entities
            .push(EntityHandle::object(3, Vec2::new(90.0, 0.0), "Stash"));
        moved
            .entities
            .push(EntityHandle::object(4, Vec2::new(95.0, 0.0), "Portal"));
        run.observe(&moved, &config, now);
        assert_eq!(run.landmarks.stash, Some(Vec2::new(5.0, 5.0)));
        assert_eq!(run.landmarks.portal, Some(Vec2::new(95.0, 0.0)));
    }

    #[test]
    fn test_phase_change_resets_store_attempts() {
        let config = AgentConfig::default();
        let now = Instant::now();
        let mut run = RunState::new(now);
        run.store_attempts = 12;

        let mut snapshot = WorldSnapshot::new("Arena", Vec2::ZERO);
        snapshot.entities.push(
            EntityHandle::object(1, Vec2::ZERO, "ProgressAnchor").with_signal("phase", 2),
        );
        run.observe(&snapshot, &config, now);
        assert_eq!(run.store_attempts, 0);
    }
}
