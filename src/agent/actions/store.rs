//! Banking carried items and applying stash consumables

use std::time::{Duration, Instant};

use super::{ActionKind, ActionResult, AgentAction, Navigator, Travel};
use crate::agent::context::TickContext;
use crate::core::error::{AgentError, Result};
use crate::core::types::MouseButton;
use crate::perception::CursorState;

#[derive(Debug, Default)]
pub struct StoreItemsAction {
    nav: Navigator,
    resume_at: Option<Instant>,
    /// Waiting for the use-item cursor after right-clicking a consumable
    awaiting_cursor_until: Option<Instant>,
    consumable_attempts: u32,
}

impl StoreItemsAction {
    pub fn new() -> Self {
        Self::default()
    }

    fn wants_consumable(&self, ctx: &TickContext<'_>) -> bool {
        ctx.config.run.use_consumables
            && ctx.snapshot.consumable_opportunity()
            && self.consumable_attempts < ctx.config.run.max_consumable_attempts
    }

    fn apply_consumable(&mut self, ctx: &mut TickContext<'_>) -> ActionResult {
        let snapshot = ctx.snapshot;
        let cursor_wait = Duration::from_millis(ctx.config.timing.cursor_wait_ms);

        if snapshot.cursor == CursorState::UseItem {
            if let Some(slot) = snapshot.equipment.iter().find(|s| !s.has_consumable) {
                ctx.actuator.click_screen(slot.screen_pos, MouseButton::Left);
            }
            self.awaiting_cursor_until = None;
            self.consumable_attempts += 1;
            return ActionResult::Running;
        }

        if let Some(until) = self.awaiting_cursor_until {
            if ctx.now < until {
                return ActionResult::Running;
            }
            tracing::debug!(attempts = self.consumable_attempts, "use-item cursor never appeared");
            self.awaiting_cursor_until = None;
            self.consumable_attempts += 1;
            return ActionResult::Running;
        }

        if let Some(item) = snapshot.stash.consumables.first() {
            ctx.actuator.click_screen(item.screen_pos, MouseButton::Right);
            self.awaiting_cursor_until = Some(ctx.now + cursor_wait);
        }
        ActionResult::Running
    }
}

impl AgentAction for StoreItemsAction {
    fn kind(&self) -> ActionKind {
        ActionKind::StoreItems
    }

    fn tick(&mut self, ctx: &mut TickContext<'_>) -> Result<ActionResult> {
        let config = ctx.config;
        let snapshot = ctx.snapshot;

        if ctx.run.store_attempts > config.run.max_store_attempts {
            return Err(AgentError::fatal(format!(
                "stored {} items this phase without emptying the inventory",
                ctx.run.store_attempts
            )));
        }
        if self.resume_at.is_some_and(|t| ctx.now < t) {
            return Ok(ActionResult::Running);
        }
        self.resume_at = None;

        if !snapshot.stash.open {
            if snapshot.inventory.items.is_empty() && !self.wants_consumable(ctx) {
                return Ok(ActionResult::Success);
            }
            let Some(stash) = ctx.run.landmarks.stash else {
                return Ok(ActionResult::Failure);
            };
            let reach = config.navigation.node_size * 2.0;
            return Ok(match self.nav.travel(ctx, stash, reach) {
                Travel::Arrived => {
                    ctx.actuator.click_grid(stash, MouseButton::Left);
                    self.resume_at = Some(ctx.now + Duration::from_millis(config.timing.stash_open_wait_ms));
                    ActionResult::Running
                }
                Travel::Moving => ActionResult::Running,
                Travel::Stuck => {
                    ctx.nudge();
                    ActionResult::Exception
                }
                Travel::Unreachable => {
                    tracing::warn!(?stash, "stash unreachable");
                    ActionResult::Failure
                }
            });
        }

        if snapshot.cursor == CursorState::HoldItem {
            ctx.actuator
                .click_screen(snapshot.inventory.drop_pos, MouseButton::Left);
            return Ok(ActionResult::Running);
        }

        if self.wants_consumable(ctx) || snapshot.cursor == CursorState::UseItem {
            return Ok(self.apply_consumable(ctx));
        }

        if let Some(item) = snapshot.inventory.items.first() {
            let modifier = &config.keys.transfer_modifier;
            ctx.actuator.key_down(modifier);
            ctx.actuator.click_screen(item.screen_pos, MouseButton::Left);
            ctx.actuator.key_up(modifier);
            ctx.run.store_attempts += 1;
            return Ok(ActionResult::Running);
        }

        tracing::info!(stored = ctx.run.store_attempts, "inventory stored");
        ctx.actuator.press_key(&config.keys.close_panels);
        Ok(ActionResult::Success)
    }
}
