//! Fighting: casts, target chasing and tactical repositioning
//!
//! One actuation per tick, in priority order: stuck recovery, self-cast,
//! targeted cast, movement.

use super::{ActionKind, ActionResult, AgentAction, Navigator, Travel};
use crate::agent::context::TickContext;
use crate::combat::priority::{best_fighting_position, fight_weight};
use crate::combat::{CombatDecision, CombatInput, CombatStrategy, StrategyKind};
use crate::core::error::Result;
use crate::core::types::GridPos;
use crate::perception::EntityHandle;

#[derive(Debug)]
pub struct CombatAction {
    nav: Navigator,
    last_target: Option<GridPos>,
}

impl CombatAction {
    pub fn new() -> Self {
        Self {
            nav: Navigator::new(),
            last_target: None,
        }
    }

    fn decide(&mut self, ctx: &mut TickContext<'_>) -> CombatDecision {
        let config = ctx.config;
        let combat = &config.combat;
        let combat_distance = config.navigation.combat_distance;
        let player = ctx.player();

        let mut range = combat_distance;
        let in_range = ctx
            .snapshot
            .monsters()
            .any(|m| m.distance_from(player) <= combat_distance);
        if !in_range && ctx.snapshot.monsters_remaining.unwrap_or(0) > 0 {
            range *= combat.expanded_search_multiplier;
        }

        let input = CombatInput::from_snapshot(ctx.snapshot, range, combat.nearby_radius, ctx.now);
        let decision = ctx.run.combat_strategy(combat.strategy).select(&input, combat);
        tracing::trace!(reason = %decision.reason, target = ?decision.target_position(), "combat decision");
        decision
    }

    /// Cast the recommended skill at `target`, falling back to the damage role
    fn cast_at(&mut self, ctx: &mut TickContext<'_>, target: GridPos, decision: &CombatDecision) -> bool {
        let roles = [decision.response.role, decision.response.damage_role];
        let slot = roles
            .iter()
            .find_map(|&role| ctx.skills.ready_for_role(&ctx.config.skills, role, ctx.snapshot, ctx.now));
        let Some(index) = slot else {
            return false;
        };
        let key = ctx.config.skills[index].key.clone();
        ctx.actuator.use_key_at(target, &key);
        ctx.skills.mark_used(index, ctx.now);
        true
    }

    fn travel(&mut self, ctx: &mut TickContext<'_>, destination: GridPos, arrive_within: f32) -> ActionResult {
        match self.nav.travel(ctx, destination, arrive_within) {
            Travel::Stuck => {
                ctx.nudge();
                ActionResult::Exception
            }
            Travel::Unreachable => {
                self.last_target = None;
                ActionResult::Running
            }
            Travel::Arrived | Travel::Moving => ActionResult::Running,
        }
    }

    /// Move somewhere better when not casting
    fn reposition(&mut self, ctx: &mut TickContext<'_>) -> ActionResult {
        let config = ctx.config;
        let snapshot = ctx.snapshot;
        let combat = &config.combat;
        let combat_distance = config.navigation.combat_distance;
        let player = ctx.player();

        if let Some(last) = self.last_target {
            let distance = player.distance(last);
            if distance > combat_distance && distance <= combat.max_chase_distance {
                return self.travel(ctx, last, combat_distance);
            }
        }

        let max_reposition = combat.max_reposition_distance;
        let ratio = combat.reposition_ratio;
        let monsters: Vec<&EntityHandle> = snapshot
            .monsters()
            .filter(|m| m.position.distance(player) <= max_reposition)
            .collect();
        let current = fight_weight(player, monsters.iter().copied(), combat_distance);
        if let Some((spot, weight)) = best_fighting_position(player, &monsters, combat_distance) {
            if weight as f32 > current as f32 * ratio {
                tracing::debug!(?spot, weight, current, "repositioning toward heavier fight");
                return self.travel(ctx, spot, combat_distance);
            }
        }
        ActionResult::Running
    }
}

impl Default for CombatAction {
    fn default() -> Self {
        Self::new()
    }
}

impl AgentAction for CombatAction {
    fn kind(&self) -> ActionKind {
        ActionKind::Combat
    }

    fn tick(&mut self, ctx: &mut TickContext<'_>) -> Result<ActionResult> {
        if self.nav.is_moving() && ctx.is_stuck() {
            ctx.nudge();
            self.nav.clear();
            return Ok(ActionResult::Exception);
        }

        if let Some(index) = ctx
            .skills
            .ready_self_cast(&ctx.config.skills, ctx.snapshot, ctx.now)
        {
            let key = ctx.config.skills[index].key.clone();
            let player = ctx.player();
            ctx.actuator.use_key_at(player, &key);
            ctx.skills.mark_used(index, ctx.now);
            return Ok(ActionResult::Running);
        }

        let decision = self.decide(ctx);

        if let Some(target) = decision.target.as_ref().map(|t| t.position) {
            let distance = ctx.distance_to(target);
            if decision.is_priority() {
                let engage = ctx.config.combat.engage_distance;
                if distance > engage {
                    return Ok(self.travel(ctx, target, engage));
                }
                self.nav.clear();
                self.cast_at(ctx, target, &decision);
                return Ok(ActionResult::Running);
            }

            self.last_target = Some(target);
            if distance <= decision_range(ctx) && self.cast_at(ctx, target, &decision) {
                self.nav.clear();
                return Ok(ActionResult::Running);
            }
        }

        Ok(self.reposition(ctx))
    }
}

/// Casting range for ordinary targets
fn decision_range(ctx: &TickContext<'_>) -> f32 {
    let combat_distance = ctx.config.navigation.combat_distance;
    let aggressive = &ctx.config.combat.aggressive;
    match ctx.config.combat.strategy {
        StrategyKind::Standard => combat_distance,
        StrategyKind::Aggressive => {
            (combat_distance + aggressive.range_bonus).min(aggressive.range_cap.max(combat_distance))
        }
    }
}
