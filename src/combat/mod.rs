//! Combat target selection
//!
//! A strategy turns the live monster set into a target position and a
//! recommended response. Strategies may keep lock state between ticks, so
//! the combat action owns one instance and rebuilds it when the configured
//! kind changes.

pub mod aggressive;
pub mod priority;
pub mod response;
pub mod skills;
pub mod standard;

pub use aggressive::{AggressiveStrategy, Lock};
pub use response::{recommend_response, ResponsePlan};
pub use skills::{CastType, SkillBar, SkillRole};
pub use standard::StandardStrategy;

use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::core::config::CombatConfig;
use crate::core::types::{GridPos, Rarity};
use crate::perception::{EntityHandle, WorldSnapshot};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum StrategyKind {
    #[default]
    Standard,
    Aggressive,
}

/// Everything a strategy may look at for one decision
#[derive(Debug, Clone, Copy)]
pub struct CombatInput<'a> {
    /// All perceived entities; strategies filter to valid targets themselves
    pub entities: &'a [EntityHandle],
    pub player: GridPos,
    pub health_percent: f32,
    pub nearby_enemies: usize,
    /// Base selection range (combat distance, possibly expanded)
    pub range: f32,
    pub now: Instant,
}

impl<'a> CombatInput<'a> {
    pub fn from_snapshot(
        snapshot: &'a WorldSnapshot,
        range: f32,
        nearby_radius: f32,
        now: Instant,
    ) -> Self {
        let player = snapshot.player_pos();
        Self {
            entities: &snapshot.entities,
            player,
            health_percent: snapshot.player.health_percent,
            nearby_enemies: snapshot.monsters_near(player, nearby_radius).count(),
            range,
            now,
        }
    }

    pub fn monsters(&self) -> impl Iterator<Item = &'a EntityHandle> {
        self.entities.iter().filter(|e| e.is_valid_target())
    }

    /// Valid targets within `radius` of the player
    pub fn monsters_within(&self, radius: f32) -> Vec<&'a EntityHandle> {
        let player = self.player;
        self.monsters()
            .filter(|m| m.distance_from(player) <= radius)
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Target {
    pub id: u64,
    pub position: GridPos,
    pub rarity: Rarity,
    /// Matched a configured priority identity
    pub priority: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CombatDecision {
    pub target: Option<Target>,
    pub response: ResponsePlan,
    /// Human-readable justification for diagnostics
    pub reason: String,
}

impl CombatDecision {
    pub fn target_position(&self) -> Option<GridPos> {
        self.target.as_ref().map(|t| t.position)
    }

    pub fn is_priority(&self) -> bool {
        self.target.as_ref().is_some_and(|t| t.priority)
    }
}

pub trait CombatStrategy {
    fn kind(&self) -> StrategyKind;

    fn select(&mut self, input: &CombatInput<'_>, config: &CombatConfig) -> CombatDecision;

    /// Currently pinned to a priority target
    fn is_locked(&self) -> bool {
        false
    }

    /// Drop any state carried between ticks
    fn reset(&mut self) {}
}

/// Closed set of strategies behind one dispatch point
#[derive(Debug, Clone)]
pub enum Strategy {
    Standard(StandardStrategy),
    Aggressive(AggressiveStrategy),
}

impl Strategy {
    pub fn from_kind(kind: StrategyKind) -> Self {
        match kind {
            StrategyKind::Standard => Strategy::Standard(StandardStrategy),
            StrategyKind::Aggressive => Strategy::Aggressive(AggressiveStrategy::new()),
        }
    }

    /// Priority target currently pinned, if any
    pub fn priority_lock(&self) -> Option<&Lock> {
        match self {
            Strategy::Standard(_) => None,
            Strategy::Aggressive(s) => s.lock(),
        }
    }
}

impl CombatStrategy for Strategy {
    fn kind(&self) -> StrategyKind {
        match self {
            Strategy::Standard(s) => s.kind(),
            Strategy::Aggressive(s) => s.kind(),
        }
    }

    fn select(&mut self, input: &CombatInput<'_>, config: &CombatConfig) -> CombatDecision {
        match self {
            Strategy::Standard(s) => s.select(input, config),
            Strategy::Aggressive(s) => s.select(input, config),
        }
    }

    fn is_locked(&self) -> bool {
        match self {
            Strategy::Standard(s) => s.is_locked(),
            Strategy::Aggressive(s) => s.is_locked(),
        }
    }

    fn reset(&mut self) {
        match self {
            Strategy::Standard(s) => s.reset(),
            Strategy::Aggressive(s) => s.reset(),
        }
    }
}
