//! Click the revival prompt after death

use std::time::{Duration, Instant};

use super::{ActionKind, ActionResult, AgentAction};
use crate::agent::context::TickContext;
use crate::core::error::Result;
use crate::core::types::MouseButton;

#[derive(Debug, Default)]
pub struct ReviveAction {
    resume_at: Option<Instant>,
}

impl ReviveAction {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AgentAction for ReviveAction {
    fn kind(&self) -> ActionKind {
        ActionKind::Revive
    }

    fn tick(&mut self, ctx: &mut TickContext<'_>) -> Result<ActionResult> {
        if ctx.snapshot.player.alive {
            return Ok(ActionResult::Success);
        }
        if self.resume_at.is_some_and(|t| ctx.now < t) {
            return Ok(ActionResult::Running);
        }
        let Some(button) = ctx.snapshot.ui.revive_button else {
            return Ok(ActionResult::Failure);
        };
        tracing::info!("player died, reviving");
        ctx.actuator.click_screen(button, MouseButton::Left);
        self.resume_at = Some(ctx.now + Duration::from_millis(ctx.config.timing.revive_wait_ms));
        Ok(ActionResult::Running)
    }
}
