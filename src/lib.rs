//! Wave Agent - autonomous explore/fight/loot/bank decision core

pub mod actuator;
pub mod agent;
pub mod combat;
pub mod core;
pub mod navigation;
pub mod perception;

pub use crate::agent::{Agent, TickOutcome};
pub use crate::core::{AgentConfig, AgentError, Result};
