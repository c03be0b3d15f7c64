//! Chunk-driven exploration

use super::{ActionKind, ActionResult, AgentAction, Navigator, Travel};
use crate::agent::context::TickContext;
use crate::core::error::{AgentError, Result};
use crate::core::types::{CellKey, GridPos};

/// Head to the area centre first when farther than this
const CENTER_APPROACH_DISTANCE: f32 = 50.0;
/// Failure fallback only returns to the centre when farther than this
const CENTER_FALLBACK_DISTANCE: f32 = 100.0;

#[derive(Debug, Default)]
pub struct ExploreAction {
    nav: Navigator,
    started: bool,
    heading_to_center: bool,
    /// Chunk key, its centroid, and the walkable cell nearest to it
    target: Option<(CellKey, GridPos, GridPos)>,
    failures: u32,
}

impl ExploreAction {
    pub fn new() -> Self {
        Self::default()
    }

    fn start(&mut self, ctx: &mut TickContext<'_>) {
        self.started = true;
        if ctx.run.explore.needs_reset {
            ctx.map.chunks_mut().reset_all();
            ctx.run.explore.needs_reset = false;
            tracing::debug!(area = ctx.map.name(), "exploration cycle started");
        }
        if ctx.distance_to(ctx.map.center()) > CENTER_APPROACH_DISTANCE {
            self.heading_to_center = true;
        }
    }

    /// Map exhausted or failure budget spent
    fn finish_cycle(&mut self, ctx: &mut TickContext<'_>, result: ActionResult) -> Result<ActionResult> {
        ctx.run.explore.needs_reset = true;
        if ctx.run.progress.anchor().is_none() {
            ctx.run.explore.anchorless_exhausted += 1;
            let cycles = ctx.run.explore.anchorless_exhausted;
            tracing::warn!(cycles, "exploration cycle ended without finding the progress anchor");
            if cycles >= ctx.config.run.max_anchorless_cycles {
                return Err(AgentError::fatal(format!(
                    "progress anchor not found after {cycles} exploration cycles"
                )));
            }
        }
        Ok(result)
    }
}

impl AgentAction for ExploreAction {
    fn kind(&self) -> ActionKind {
        ActionKind::Explore
    }

    fn tick(&mut self, ctx: &mut TickContext<'_>) -> Result<ActionResult> {
        if !self.started {
            self.start(ctx);
        }

        let view_distance = ctx.config.navigation.view_distance;
        let node_size = ctx.config.navigation.node_size;
        let player = ctx.player();
        ctx.map.chunks_mut().update_revealed(player, view_distance);

        if self.heading_to_center {
            let center = ctx.map.center();
            match self.nav.travel(ctx, center, node_size) {
                Travel::Moving => return Ok(ActionResult::Running),
                Travel::Stuck => {
                    ctx.nudge();
                    return Ok(ActionResult::Exception);
                }
                Travel::Arrived | Travel::Unreachable => self.heading_to_center = false,
            }
        }

        if let Some((_, centroid, _)) = self.target {
            if centroid.distance(player) < view_distance {
                self.target = None;
                self.nav.clear();
            }
        }

        if self.target.is_none() {
            match ctx.map.next_explore_chunk(player) {
                Some(chunk) => {
                    let (key, centroid) = (chunk.key(), chunk.centroid);
                    let half = (ctx.map.chunks().chunk_size() / 2) as i32;
                    match ctx.map.grid().nearest_walkable(centroid, half) {
                        Some(cell) => self.target = Some((key, centroid, cell.to_pos())),
                        None => {
                            ctx.map.blacklist_chunk(key);
                            return Ok(ActionResult::Running);
                        }
                    }
                }
                None => {
                    let center = ctx.map.center();
                    if ctx.distance_to(center) > CENTER_APPROACH_DISTANCE {
                        match self.nav.travel(ctx, center, node_size) {
                            Travel::Moving => return Ok(ActionResult::Running),
                            Travel::Stuck => {
                                ctx.nudge();
                                return Ok(ActionResult::Exception);
                            }
                            Travel::Arrived | Travel::Unreachable => {}
                        }
                    }
                    tracing::info!(
                        revealed = ctx.map.chunks().revealed_count(),
                        "exploration complete"
                    );
                    return self.finish_cycle(ctx, ActionResult::Success);
                }
            }
        }

        let Some((key, _, goal)) = self.target else {
            return Ok(ActionResult::Running);
        };
        match self.nav.travel(ctx, goal, node_size) {
            Travel::Moving => Ok(ActionResult::Running),
            Travel::Arrived => {
                self.target = None;
                Ok(ActionResult::Running)
            }
            Travel::Stuck => {
                ctx.nudge();
                Ok(ActionResult::Exception)
            }
            Travel::Unreachable => {
                ctx.map.blacklist_chunk(key);
                self.target = None;
                self.failures += 1;
                let max = ctx.config.run.max_explore_failures;
                if self.failures >= max {
                    tracing::warn!(failures = self.failures, "too many unreachable chunks");
                    return self.finish_cycle(ctx, ActionResult::Failure);
                }
                if self.failures == max / 2
                    && ctx.distance_to(ctx.map.center()) > CENTER_FALLBACK_DISTANCE
                {
                    self.heading_to_center = true;
                }
                Ok(ActionResult::Running)
            }
        }
    }
}
