//! Decision core: run state, behavior arbitration and the action set

pub mod actions;
pub mod arbiter;
pub mod context;
pub mod driver;
pub mod progress;
pub mod state;

pub use actions::{Action, ActionKind, ActionResult, AgentAction};
pub use arbiter::{ArbiterStep, BehaviorArbiter};
pub use context::TickContext;
pub use driver::{Agent, TickOutcome};
pub use progress::{ProgressEvent, ProgressState, ProgressStateMachine};
pub use state::{Landmarks, MotionTracker, RunState};
