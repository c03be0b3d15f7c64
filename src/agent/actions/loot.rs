//! Picking up ground items

use std::time::Duration;

use super::{ActionKind, ActionResult, AgentAction, Navigator, Travel};
use crate::agent::context::TickContext;
use crate::core::error::Result;
use crate::core::types::MouseButton;

#[derive(Debug, Default)]
pub struct LootAction {
    nav: Navigator,
    item: Option<u64>,
    failed_clicks: u32,
}

impl LootAction {
    pub fn new() -> Self {
        Self::default()
    }

    /// Press the label toggle twice so hidden labels are redrawn
    fn refresh_labels(ctx: &mut TickContext<'_>) {
        let key = ctx.config.keys.loot_toggle.clone();
        ctx.actuator.press_key(&key);
        ctx.actuator.press_key(&key);
        ctx.run.last_loot_toggle = Some(ctx.now);
    }

    fn needs_unstick(ctx: &TickContext<'_>) -> bool {
        if !ctx.config.run.loot_unstick {
            return false;
        }
        let timing = &ctx.config.timing;
        let still = ctx.run.motion.stationary_for(ctx.now)
            > Duration::from_secs_f32(timing.loot_stuck_secs.max(0.0));
        let toggle_due = ctx.run.last_loot_toggle.map_or(true, |t| {
            ctx.now.saturating_duration_since(t)
                > Duration::from_secs_f32(timing.loot_toggle_interval_secs.max(0.0))
        });
        still || toggle_due
    }
}

impl AgentAction for LootAction {
    fn kind(&self) -> ActionKind {
        ActionKind::Loot
    }

    fn tick(&mut self, ctx: &mut TickContext<'_>) -> Result<ActionResult> {
        if Self::needs_unstick(ctx) {
            tracing::debug!("toggling loot labels");
            Self::refresh_labels(ctx);
            return Ok(ActionResult::Running);
        }

        let Some(item) = ctx.closest_loot() else {
            let settled = ctx.run.loot_settle_until.map_or(true, |t| ctx.now >= t);
            return Ok(if settled {
                ActionResult::Success
            } else {
                ActionResult::Running
            });
        };
        ctx.run.loot_settle_until =
            Some(ctx.now + Duration::from_millis(ctx.config.timing.loot_settle_ms));

        if self.item != Some(item.id) {
            self.item = Some(item.id);
            self.failed_clicks = 0;
            self.nav.clear();
        }

        let node_size = ctx.config.navigation.node_size;
        if ctx.distance_to(item.position) <= node_size {
            if self.failed_clicks >= ctx.config.run.max_failed_loot_clicks {
                tracing::debug!(item = item.id, clicks = self.failed_clicks, "label not responding, refreshing");
                Self::refresh_labels(ctx);
                self.failed_clicks = 0;
                return Ok(ActionResult::Running);
            }
            ctx.actuator.click_grid(item.position, MouseButton::Left);
            self.failed_clicks += 1;
            return Ok(ActionResult::Running);
        }

        match self.nav.travel(ctx, item.position, node_size) {
            Travel::Moving | Travel::Arrived => Ok(ActionResult::Running),
            Travel::Stuck => {
                ctx.nudge();
                Ok(ActionResult::Exception)
            }
            Travel::Unreachable => {
                tracing::debug!(item = item.id, label = %item.label, "loot unreachable");
                ctx.map.blacklist_item(item.id);
                Ok(ActionResult::Failure)
            }
        }
    }
}
