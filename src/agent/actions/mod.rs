//! Resumable units of behavior
//!
//! Every action performs at most one meaningful step per tick and reports an
//! `ActionResult`. Waits are expressed as "resume at" timestamps checked on
//! later ticks, never as blocking sleeps.

pub mod combat;
pub mod create_map;
pub mod explore;
pub mod leave_map;
pub mod loot;
pub mod revive;
pub mod start_wave;
pub mod store;

pub use combat::CombatAction;
pub use create_map::CreateMapAction;
pub use explore::ExploreAction;
pub use leave_map::LeaveMapAction;
pub use loot::LootAction;
pub use revive::ReviveAction;
pub use start_wave::StartWaveAction;
pub use store::StoreItemsAction;

use std::fmt;

use serde::Serialize;

use super::context::TickContext;
use crate::core::error::Result;
use crate::core::types::GridPos;
use crate::navigation::{FollowStep, Path};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ActionResult {
    /// Keep calling
    Running,
    Success,
    Failure,
    /// Recoverable anomaly; re-arbitrate next tick
    Exception,
}

impl ActionResult {
    pub fn is_terminal(self) -> bool {
        matches!(self, ActionResult::Success | ActionResult::Failure)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ActionKind {
    Explore,
    Combat,
    Loot,
    StoreItems,
    StartWave,
    LeaveMap,
    CreateMap,
    Revive,
    Idle,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

pub trait AgentAction {
    fn kind(&self) -> ActionKind;

    /// Perform one step. Only fatal aborts are returned as errors.
    fn tick(&mut self, ctx: &mut TickContext<'_>) -> Result<ActionResult>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct IdleAction;

impl AgentAction for IdleAction {
    fn kind(&self) -> ActionKind {
        ActionKind::Idle
    }

    fn tick(&mut self, _ctx: &mut TickContext<'_>) -> Result<ActionResult> {
        Ok(ActionResult::Running)
    }
}

/// Closed action set with one dispatch point
#[derive(Debug)]
pub enum Action {
    Explore(ExploreAction),
    Combat(CombatAction),
    Loot(LootAction),
    StoreItems(StoreItemsAction),
    StartWave(StartWaveAction),
    LeaveMap(LeaveMapAction),
    CreateMap(CreateMapAction),
    Revive(ReviveAction),
    Idle(IdleAction),
}

impl Action {
    pub fn new(kind: ActionKind) -> Self {
        match kind {
            ActionKind::Explore => Action::Explore(ExploreAction::new()),
            ActionKind::Combat => Action::Combat(CombatAction::new()),
            ActionKind::Loot => Action::Loot(LootAction::new()),
            ActionKind::StoreItems => Action::StoreItems(StoreItemsAction::new()),
            ActionKind::StartWave => Action::StartWave(StartWaveAction::new()),
            ActionKind::LeaveMap => Action::LeaveMap(LeaveMapAction::new()),
            ActionKind::CreateMap => Action::CreateMap(CreateMapAction::new()),
            ActionKind::Revive => Action::Revive(ReviveAction::new()),
            ActionKind::Idle => Action::Idle(IdleAction),
        }
    }

    fn inner(&mut self) -> &mut dyn AgentAction {
        match self {
            Action::Explore(a) => a,
            Action::Combat(a) => a,
            Action::Loot(a) => a,
            Action::StoreItems(a) => a,
            Action::StartWave(a) => a,
            Action::LeaveMap(a) => a,
            Action::CreateMap(a) => a,
            Action::Revive(a) => a,
            Action::Idle(a) => a,
        }
    }
}

impl AgentAction for Action {
    fn kind(&self) -> ActionKind {
        match self {
            Action::Explore(_) => ActionKind::Explore,
            Action::Combat(_) => ActionKind::Combat,
            Action::Loot(_) => ActionKind::Loot,
            Action::StoreItems(_) => ActionKind::StoreItems,
            Action::StartWave(_) => ActionKind::StartWave,
            Action::LeaveMap(_) => ActionKind::LeaveMap,
            Action::CreateMap(_) => ActionKind::CreateMap,
            Action::Revive(_) => ActionKind::Revive,
            Action::Idle(_) => ActionKind::Idle,
        }
    }

    fn tick(&mut self, ctx: &mut TickContext<'_>) -> Result<ActionResult> {
        self.inner().tick(ctx)
    }
}

/// Outcome of one `Navigator::travel` step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Travel {
    Arrived,
    Moving,
    Unreachable,
    Stuck,
}

/// Path ownership shared by the moving actions: plans on demand, replans
/// when the path expires or the destination moves, and checks for stuck
/// movement while a path is being followed.
#[derive(Debug, Clone, Default)]
pub struct Navigator {
    path: Option<Path>,
    destination: Option<GridPos>,
}

impl Navigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_moving(&self) -> bool {
        self.path.as_ref().is_some_and(|p| !p.is_finished())
    }

    pub fn clear(&mut self) {
        self.path = None;
        self.destination = None;
    }

    pub fn travel(
        &mut self,
        ctx: &mut TickContext<'_>,
        destination: GridPos,
        arrive_within: f32,
    ) -> Travel {
        if ctx.distance_to(destination) <= arrive_within {
            self.clear();
            return Travel::Arrived;
        }

        let node_size = ctx.config.navigation.node_size;
        let moved_goal = self
            .destination
            .map_or(true, |d| d.distance(destination) > node_size);
        if moved_goal || !self.is_moving() {
            if self.is_moving() && ctx.is_stuck() {
                return Travel::Stuck;
            }
            match ctx
                .map
                .find_path(ctx.player(), destination, ctx.now, &ctx.config.navigation)
            {
                Some(path) => {
                    self.path = Some(path);
                    self.destination = Some(destination);
                    ctx.run.motion.touch(ctx.now);
                }
                None => {
                    self.clear();
                    return Travel::Unreachable;
                }
            }
        } else if ctx.is_stuck() {
            return Travel::Stuck;
        }

        let Some(path) = self.path.as_mut() else {
            return Travel::Unreachable;
        };
        if let Some(next) = path.next() {
            if ctx.distance_to(next) > ctx.config.navigation.max_waypoint_distance {
                tracing::debug!(?next, "abandoning path with distant waypoint");
                self.clear();
                return Travel::Unreachable;
            }
        }

        match ctx.follow(path) {
            FollowStep::Expired => tracing::debug!("path expired, replanning"),
            FollowStep::Finished | FollowStep::Moved(_) => {}
        }
        Travel::Moving
    }
}
