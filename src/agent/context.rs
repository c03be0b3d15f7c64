//! Per-tick context threaded through the arbiter, actions and strategies

use std::time::{Duration, Instant};

use rand::Rng;
use rand_chacha::ChaCha8Rng;

use super::state::RunState;
use crate::actuator::Actuator;
use crate::combat::SkillBar;
use crate::core::config::AgentConfig;
use crate::core::types::GridPos;
use crate::navigation::{AreaMap, FollowParams, FollowStep, Path};
use crate::perception::{GroundItem, WorldSnapshot};

pub struct TickContext<'a> {
    pub now: Instant,
    pub snapshot: &'a WorldSnapshot,
    pub config: &'a AgentConfig,
    pub map: &'a mut AreaMap,
    pub run: &'a mut RunState,
    pub skills: &'a mut SkillBar,
    pub actuator: &'a mut dyn Actuator,
    pub rng: &'a mut ChaCha8Rng,
}

impl<'a> TickContext<'a> {
    pub fn player(&self) -> GridPos {
        self.snapshot.player_pos()
    }

    pub fn distance_to(&self, target: GridPos) -> f32 {
        self.player().distance(target)
    }

    /// Stillness window: longer in the staging area
    pub fn stuck_window(&self) -> Duration {
        if self.snapshot.area.is_staging {
            self.config.timing.staging_stuck_timeout()
        } else {
            self.config.timing.stuck_timeout()
        }
    }

    pub fn is_stuck(&self) -> bool {
        self.run.motion.stationary_for(self.now) > self.stuck_window()
    }

    pub fn closest_loot(&self) -> Option<&'a GroundItem> {
        self.map
            .closest_valid_ground_item(self.snapshot, &self.config.run)
    }

    /// Issue one movement command toward `target`
    pub fn move_toward(&mut self, target: GridPos) {
        let key = self.skills.movement_key(
            &self.config.skills,
            &self.config.keys.fallback_move,
            self.now,
            &mut *self.rng,
        );
        self.actuator.use_key_at(target, &key);
    }

    /// Advance a path by one step using the movement skills
    pub fn follow(&mut self, path: &mut Path) -> FollowStep {
        let nav = &self.config.navigation;
        let params = FollowParams {
            pop_radius: nav.waypoint_pop_radius,
            arrival_radius: nav.node_size,
        };
        let player = self.player();
        let now = self.now;
        let config = self.config;
        let skills = &mut *self.skills;
        let rng = &mut *self.rng;
        let actuator = &mut *self.actuator;
        path.follow(player, now, params, |target| {
            let key = skills.movement_key(&config.skills, &config.keys.fallback_move, now, rng);
            actuator.use_key_at(target, &key);
            actuator.player_position()
        })
    }

    /// Shake a stuck player loose with a random short move
    pub fn nudge(&mut self) {
        let radius = self.config.run.nudge_radius.max(1.0);
        let offset = GridPos::new(
            self.rng.gen_range(-radius..=radius),
            self.rng.gen_range(-radius..=radius),
        );
        let target = self.player() + offset;
        tracing::debug!(?target, stationary = ?self.run.motion.stationary_for(self.now), "stuck, nudging");
        self.move_toward(target);
        self.run.motion.touch(self.now);
    }
}
