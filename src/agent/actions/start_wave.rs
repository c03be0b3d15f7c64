//! Walk to the progress anchor and start the next phase

use super::{ActionKind, ActionResult, AgentAction, Navigator, Travel};
use crate::agent::context::TickContext;
use crate::core::error::Result;
use crate::core::types::MouseButton;

#[derive(Debug, Default)]
pub struct StartWaveAction {
    nav: Navigator,
}

impl StartWaveAction {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AgentAction for StartWaveAction {
    fn kind(&self) -> ActionKind {
        ActionKind::StartWave
    }

    fn tick(&mut self, ctx: &mut TickContext<'_>) -> Result<ActionResult> {
        if ctx.closest_loot().is_some() {
            return Ok(ActionResult::Failure);
        }

        let target = ctx.run.progress.anchor().unwrap_or_else(|| ctx.map.center());
        let reach = ctx.config.navigation.node_size * 2.0;
        match self.nav.travel(ctx, target, reach) {
            Travel::Arrived => {
                tracing::info!(phase = ctx.run.progress.phase(), "starting next phase");
                ctx.actuator.click_grid(target, MouseButton::Left);
                Ok(ActionResult::Success)
            }
            Travel::Moving => Ok(ActionResult::Running),
            Travel::Stuck => {
                ctx.nudge();
                Ok(ActionResult::Exception)
            }
            Travel::Unreachable => Ok(ActionResult::Failure),
        }
    }
}
