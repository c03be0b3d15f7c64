//! Top-level tick driver
//!
//! Owns everything that survives between ticks and runs the fixed tick
//! order: perception update, rate gate, arbitration. A fatal abort sets the
//! stop flag; nothing runs again until `start` is called.

use std::time::Instant;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;

use super::actions::{ActionKind, ActionResult};
use super::arbiter::BehaviorArbiter;
use super::context::TickContext;
use super::progress::ProgressEvent;
use super::state::RunState;
use crate::actuator::{ActionGate, Actuator, GatedActuator};
use crate::combat::SkillBar;
use crate::core::config::AgentConfig;
use crate::core::error::{AgentError, Result};
use crate::navigation::AreaMap;
use crate::perception::{TerrainLayer, WorldSnapshot};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TickOutcome {
    /// The run is halted
    Stopped { reason: Option<String> },
    /// No map for the snapshot's area; `enter_area` must be called
    NoMap,
    /// Rate gate closed or window unfocused
    Gated,
    Acted {
        action: ActionKind,
        result: ActionResult,
        events: Vec<ProgressEvent>,
    },
}

pub struct Agent {
    config: AgentConfig,
    map: Option<AreaMap>,
    run: RunState,
    skills: SkillBar,
    gate: ActionGate,
    arbiter: BehaviorArbiter,
    rng: ChaCha8Rng,
    running: bool,
    stop_reason: Option<String>,
}

impl Agent {
    pub fn new(config: AgentConfig, seed: u64) -> Self {
        Self {
            config,
            map: None,
            run: RunState::new(Instant::now()),
            skills: SkillBar::new(),
            gate: ActionGate::new(),
            arbiter: BehaviorArbiter::new(),
            rng: ChaCha8Rng::seed_from_u64(seed),
            running: true,
            stop_reason: None,
        }
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Swap configuration; takes effect on the next tick
    pub fn set_config(&mut self, config: AgentConfig) -> Result<()> {
        config.validate()?;
        self.config = config;
        tracing::info!("configuration updated");
        Ok(())
    }

    pub fn map(&self) -> Option<&AreaMap> {
        self.map.as_ref()
    }

    pub fn run_state(&self) -> &RunState {
        &self.run
    }

    pub fn current_action(&self) -> ActionKind {
        self.arbiter.current_kind()
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn stop_reason(&self) -> Option<&str> {
        self.stop_reason.as_deref()
    }

    pub fn start(&mut self) {
        self.running = true;
        self.stop_reason = None;
        tracing::info!("agent started");
    }

    pub fn stop(&mut self, reason: impl Into<String>) {
        let reason = reason.into();
        tracing::info!(%reason, "agent stopped");
        self.running = false;
        self.stop_reason = Some(reason);
    }

    /// Build the navigation state for a new area visit
    pub fn enter_area(
        &mut self,
        terrain: &TerrainLayer,
        snapshot: &WorldSnapshot,
        now: Instant,
    ) -> Result<()> {
        let map = AreaMap::from_terrain(snapshot.area.name.clone(), terrain, &self.config)?;
        self.install_map(map, now);
        Ok(())
    }

    /// Use a prebuilt map for a new area visit
    pub fn install_map(&mut self, map: AreaMap, now: Instant) {
        tracing::info!(area = map.name(), "entered area");
        self.map = Some(map);
        self.run.reset_for_area(now);
        self.arbiter.reset();
    }

    /// Run one tick against this snapshot
    pub fn tick(
        &mut self,
        snapshot: &WorldSnapshot,
        actuator: &mut dyn Actuator,
        now: Instant,
    ) -> TickOutcome {
        if !self.running {
            return TickOutcome::Stopped {
                reason: self.stop_reason.clone(),
            };
        }
        let Some(map) = self.map.as_mut() else {
            return TickOutcome::NoMap;
        };
        if map.name() != snapshot.area.name {
            return TickOutcome::NoMap;
        }

        let events = self.run.observe(snapshot, &self.config, now);

        if !self.gate.is_open(now, snapshot.ui.window_focused) {
            return TickOutcome::Gated;
        }

        let interval = self.config.timing.action_interval();
        let mut gated = GatedActuator::new(actuator, &mut self.gate, now, interval);
        let mut ctx = TickContext {
            now,
            snapshot,
            config: &self.config,
            map,
            run: &mut self.run,
            skills: &mut self.skills,
            actuator: &mut gated,
            rng: &mut self.rng,
        };

        match self.arbiter.step(&mut ctx) {
            Ok(step) => TickOutcome::Acted {
                action: step.kind,
                result: step.result,
                events,
            },
            Err(err) => {
                let reason = err.to_string();
                if err.is_fatal() {
                    tracing::error!(%reason, "fatal abort");
                } else {
                    tracing::error!(%reason, "unexpected error, halting");
                }
                self.stop(reason.clone());
                TickOutcome::Stopped {
                    reason: Some(reason),
                }
            }
        }
    }

    /// Convenience for hosts that treat a stop as an error
    pub fn ensure_running(&self) -> Result<()> {
        match (&self.running, &self.stop_reason) {
            (true, _) => Ok(()),
            (false, Some(reason)) => Err(AgentError::FatalAbort(reason.clone())),
            (false, None) => Err(AgentError::fatal("agent stopped")),
        }
    }
}
