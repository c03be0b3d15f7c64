//! Behavior arbitration
//!
//! Every tick an ordered predicate chain picks exactly one action kind.
//! The running action instance is kept while the same kind keeps winning
//! and its last result was not terminal; otherwise a fresh instance is built.

use serde::Serialize;

use super::actions::{Action, ActionKind, ActionResult, AgentAction};
use super::context::TickContext;
use crate::core::error::Result;

/// What one arbiter step selected and how the action responded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ArbiterStep {
    pub kind: ActionKind,
    pub result: ActionResult,
}

#[derive(Debug)]
pub struct BehaviorArbiter {
    current: Action,
    last_result: ActionResult,
}

impl Default for BehaviorArbiter {
    fn default() -> Self {
        Self::new()
    }
}

impl BehaviorArbiter {
    pub fn new() -> Self {
        Self {
            current: Action::new(ActionKind::Idle),
            last_result: ActionResult::Running,
        }
    }

    pub fn current_kind(&self) -> ActionKind {
        self.current.kind()
    }

    pub fn last_result(&self) -> ActionResult {
        self.last_result
    }

    /// Forget the running action (area change)
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Decide which action should run this tick
    pub fn choose(&self, ctx: &mut TickContext<'_>) -> ActionKind {
        let snapshot = ctx.snapshot;
        let config = ctx.config;
        let now = ctx.now;

        if !snapshot.player.alive && snapshot.ui.revive_button.is_some() {
            return ActionKind::Revive;
        }
        if snapshot.area.is_staging {
            return ActionKind::CreateMap;
        }
        if ctx.run.progress.anchor().is_none() {
            return ActionKind::Explore;
        }

        let item_visible = ctx.closest_loot().is_some();
        if item_visible {
            return ActionKind::Loot;
        }
        let loot_pending = ctx.run.loot_pending(item_visible, now);
        let active = ctx.run.progress.is_active();

        let storing = self.current.kind() == ActionKind::StoreItems && !self.last_result.is_terminal();
        let wants_store = storing
            || (config.run.use_consumables && snapshot.consumable_opportunity())
            || snapshot.inventory.items.len() >= config.run.store_item_threshold;
        if !active && ctx.run.landmarks.stash.is_some() && wants_store && !loot_pending {
            return ActionKind::StoreItems;
        }

        if active && !loot_pending {
            let sight = config.navigation.view_distance;
            let player = snapshot.player_pos();
            if snapshot.monsters().any(|m| m.distance_from(player) <= sight) {
                ctx.run.last_targets_seen = Some(now);
                return ActionKind::Combat;
            }
            let recent = ctx
                .run
                .last_targets_seen
                .is_some_and(|t| now.saturating_duration_since(t) < config.timing.combat_hysteresis());
            return if recent {
                ActionKind::Combat
            } else {
                ActionKind::Explore
            };
        }

        if !active && !loot_pending && ctx.run.progress.can_start(now) {
            let phase = ctx.run.progress.phase();
            return if phase < i64::from(config.run.wave_limit) {
                ActionKind::StartWave
            } else {
                ActionKind::LeaveMap
            };
        }

        ActionKind::Idle
    }

    /// Choose, replace the action if needed, and run one step of it
    pub fn step(&mut self, ctx: &mut TickContext<'_>) -> Result<ArbiterStep> {
        let kind = self.choose(ctx);
        if kind != self.current.kind() || self.last_result.is_terminal() {
            if kind != self.current.kind() {
                tracing::debug!(from = %self.current.kind(), to = %kind, "action switched");
            }
            self.current = Action::new(kind);
        }

        let result = self.current.tick(ctx)?;
        if result != ActionResult::Running {
            tracing::debug!(action = %kind, ?result, "action reported");
        }
        self.last_result = result;
        Ok(ArbiterStep { kind, result })
    }
}
