//! Leave the area through the nearest portal

use super::{ActionKind, ActionResult, AgentAction, Navigator, Travel};
use crate::agent::context::TickContext;
use crate::core::error::Result;
use crate::core::types::MouseButton;

#[derive(Debug, Default)]
pub struct LeaveMapAction {
    nav: Navigator,
}

impl LeaveMapAction {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AgentAction for LeaveMapAction {
    fn kind(&self) -> ActionKind {
        ActionKind::LeaveMap
    }

    fn tick(&mut self, ctx: &mut TickContext<'_>) -> Result<ActionResult> {
        if ctx.closest_loot().is_some() {
            return Ok(ActionResult::Exception);
        }
        let Some(portal) = ctx.run.landmarks.portal else {
            tracing::debug!("no portal known");
            return Ok(ActionResult::Exception);
        };

        let reach = ctx.config.navigation.node_size * 2.0;
        match self.nav.travel(ctx, portal, reach) {
            Travel::Arrived => {
                tracing::info!(phase = ctx.run.progress.phase(), "leaving area");
                ctx.actuator.click_grid(portal, MouseButton::Left);
                Ok(ActionResult::Success)
            }
            Travel::Moving => Ok(ActionResult::Running),
            Travel::Stuck => {
                ctx.nudge();
                Ok(ActionResult::Exception)
            }
            Travel::Unreachable => Ok(ActionResult::Exception),
        }
    }
}
