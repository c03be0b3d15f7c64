//! Open a new encounter from the staging area
//!
//! Walk to the map device, place a fragment, activate, then keep clicking
//! the portal until the area changes.

use std::time::{Duration, Instant};

use super::{ActionKind, ActionResult, AgentAction, Navigator, Travel};
use crate::agent::context::TickContext;
use crate::core::error::{AgentError, Result};
use crate::core::types::{GridPos, MouseButton};

#[derive(Debug, Default)]
pub struct CreateMapAction {
    nav: Navigator,
    resume_at: Option<Instant>,
    activated: bool,
}

impl CreateMapAction {
    pub fn new() -> Self {
        Self::default()
    }

    fn wait(&mut self, ctx: &TickContext<'_>, millis: u64) {
        self.resume_at = Some(ctx.now + Duration::from_millis(millis));
    }

    /// Walk within reach of `target` and click it
    fn reach_and_click(&mut self, ctx: &mut TickContext<'_>, target: GridPos, wait_ms: u64) -> ActionResult {
        let reach = ctx.config.navigation.node_size * 2.0;
        match self.nav.travel(ctx, target, reach) {
            Travel::Arrived => {
                ctx.actuator.click_grid(target, MouseButton::Left);
                self.wait(ctx, wait_ms);
                ActionResult::Running
            }
            Travel::Moving => ActionResult::Running,
            Travel::Stuck => {
                ctx.nudge();
                ActionResult::Exception
            }
            Travel::Unreachable => ActionResult::Exception,
        }
    }
}

impl AgentAction for CreateMapAction {
    fn kind(&self) -> ActionKind {
        ActionKind::CreateMap
    }

    fn tick(&mut self, ctx: &mut TickContext<'_>) -> Result<ActionResult> {
        if !ctx.snapshot.area.is_staging {
            return Ok(ActionResult::Success);
        }
        if self.resume_at.is_some_and(|t| ctx.now < t) {
            return Ok(ActionResult::Running);
        }
        self.resume_at = None;

        let config = ctx.config;
        let snapshot = ctx.snapshot;
        let timing = &config.timing;

        if self.activated {
            let Some(portal) = snapshot.nearest_with_identity(&config.identities.portal) else {
                return Ok(ActionResult::Running);
            };
            let position = portal.position;
            return Ok(self.reach_and_click(ctx, position, timing.portal_click_interval_ms));
        }

        if let Some(device) = snapshot.ui.map_device.as_ref() {
            if device.activate_enabled {
                tracing::info!("activating map device");
                ctx.actuator.click_screen(device.activate_pos, MouseButton::Left);
                self.activated = true;
                self.wait(ctx, timing.device_activate_wait_ms);
                return Ok(ActionResult::Running);
            }
            let Some(fragment) = device.fragments.first() else {
                return Err(AgentError::fatal("no fragment available for the map device"));
            };
            let modifier = &config.keys.transfer_modifier;
            ctx.actuator.key_down(modifier);
            ctx.actuator.click_screen(fragment.screen_pos, MouseButton::Left);
            ctx.actuator.key_up(modifier);
            self.wait(ctx, timing.device_interact_wait_ms);
            return Ok(ActionResult::Running);
        }

        let Some(device) = ctx.run.landmarks.map_device else {
            tracing::debug!("map device not visible");
            return Ok(ActionResult::Exception);
        };
        Ok(self.reach_and_click(ctx, device, timing.device_interact_wait_ms))
    }
}
