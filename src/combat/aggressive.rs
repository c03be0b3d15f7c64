//! Aggressive strategy with priority-target locking
//!
//! Unlocked, the strategy scores targets by rarity and local density and
//! sticks to the previous target's area for a short stability window.
//! A visible priority monster takes over immediately and pins selection:
//!
//! - a strictly higher-ranked priority monster steals the lock
//! - the tracked position only follows the target past a reposition
//!   threshold, so small jitter never interrupts a cast
//! - an unseen target is held at its last position for a grace period
//! - the lock is released after the grace period, when the tracked
//!   position is too far away, or when the target is seen dead

use std::time::{Duration, Instant};

use super::priority::priority_rank;
use super::response::recommend_response;
use super::{CombatDecision, CombatInput, CombatStrategy, StrategyKind, Target};
use crate::core::config::{AggressiveConfig, CombatConfig};
use crate::core::types::{GridPos, Rarity};
use crate::perception::EntityHandle;

#[derive(Debug, Clone, PartialEq)]
pub struct Lock {
    pub id: u64,
    pub name: String,
    pub rank: u32,
    pub rarity: Rarity,
    pub position: GridPos,
    pub last_seen: Instant,
    pub locked_at: Instant,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LockState {
    Unlocked,
    Locked(Lock),
}

#[derive(Debug, Clone, Copy)]
struct LastTarget {
    id: u64,
    position: GridPos,
    rarity: Rarity,
    chosen_at: Instant,
}

#[derive(Debug, Clone)]
pub struct AggressiveStrategy {
    state: LockState,
    last_target: Option<LastTarget>,
}

impl Default for AggressiveStrategy {
    fn default() -> Self {
        Self::new()
    }
}

fn secs(value: f32) -> Duration {
    Duration::from_secs_f32(value.max(0.0))
}

impl AggressiveStrategy {
    pub fn new() -> Self {
        Self {
            state: LockState::Unlocked,
            last_target: None,
        }
    }

    pub fn state(&self) -> &LockState {
        &self.state
    }

    pub fn lock(&self) -> Option<&Lock> {
        match &self.state {
            LockState::Locked(lock) => Some(lock),
            LockState::Unlocked => None,
        }
    }

    fn range(input: &CombatInput<'_>, cfg: &AggressiveConfig) -> f32 {
        (input.range + cfg.range_bonus).min(cfg.range_cap.max(input.range))
    }

    fn acquire(&mut self, monster: &EntityHandle, rank: u32, now: Instant) {
        tracing::info!(id = monster.id, name = %monster.name, rank, "priority lock acquired");
        self.state = LockState::Locked(Lock {
            id: monster.id,
            name: monster.name.clone(),
            rank,
            rarity: monster.rarity,
            position: monster.position,
            last_seen: now,
            locked_at: now,
        });
    }

    fn release(&mut self, why: &str) {
        if let LockState::Locked(lock) = &self.state {
            tracing::info!(id = lock.id, name = %lock.name, reason = why, "priority lock released");
        }
        self.state = LockState::Unlocked;
    }

    /// Advance the lock state machine. Returns the locked target if the
    /// lock survives this tick.
    fn update_lock(
        &mut self,
        input: &CombatInput<'_>,
        config: &CombatConfig,
        search_radius: f32,
    ) -> Option<Target> {
        let cfg = &config.aggressive;
        let now = input.now;

        let best_priority = input
            .monsters_within(search_radius)
            .into_iter()
            .filter_map(|m| priority_rank(&m.name, &config.priority_targets).map(|r| (m, r)))
            .max_by(|(a, ra), (b, rb)| {
                ra.cmp(rb).then_with(|| {
                    b.distance_from(input.player)
                        .total_cmp(&a.distance_from(input.player))
                })
            });

        if let Some((monster, rank)) = best_priority {
            match self.lock().map(|l| (l.id, l.rank, l.name.clone())) {
                None => self.acquire(monster, rank, now),
                Some((id, locked_rank, name)) if rank > locked_rank && monster.id != id => {
                    tracing::info!(from = %name, to = %monster.name, rank, "priority lock escalated");
                    self.acquire(monster, rank, now);
                }
                _ => {}
            }
        }

        let LockState::Locked(lock) = &mut self.state else {
            return None;
        };

        let sighting = input
            .entities
            .iter()
            .find(|e| e.id == lock.id && e.hostile);
        let mut release = None;
        match sighting {
            Some(e) if !e.alive => release = Some("target killed"),
            Some(e) if e.targetable && e.distance_from(input.player) <= search_radius => {
                lock.last_seen = now;
                if e.position.distance(lock.position) > cfg.reposition_threshold {
                    lock.position = e.position;
                }
            }
            _ => {
                if now.saturating_duration_since(lock.last_seen) > secs(cfg.grace_secs) {
                    release = Some("grace period elapsed");
                }
            }
        }
        if release.is_none() && lock.position.distance(input.player) > cfg.max_lock_distance {
            release = Some("target too far");
        }

        if let Some(why) = release {
            self.release(why);
            return None;
        }

        Some(Target {
            id: lock.id,
            position: lock.position,
            rarity: lock.rarity,
            priority: true,
        })
    }

    fn select_unlocked(
        &mut self,
        input: &CombatInput<'_>,
        cfg: &AggressiveConfig,
        focus_fire: bool,
        range: f32,
    ) -> Option<(Target, &'static str)> {
        let now = input.now;
        let player = input.player;
        let in_range = input.monsters_within(range);
        if in_range.is_empty() {
            return None;
        }

        if let Some(prev) = self.last_target {
            let window = if prev.rarity.is_elite() {
                secs(cfg.elite_stability_secs)
            } else {
                secs(cfg.stability_secs)
            };
            if now.saturating_duration_since(prev.chosen_at) < window {
                let held = in_range
                    .iter()
                    .filter(|m| m.position.distance(prev.position) < cfg.stability_radius)
                    .min_by(|a, b| {
                        b.rarity.cmp(&a.rarity).then_with(|| {
                            a.position
                                .distance(prev.position)
                                .total_cmp(&b.position.distance(prev.position))
                        })
                    });
                if let Some(m) = held {
                    self.last_target = Some(LastTarget {
                        id: m.id,
                        position: m.position,
                        rarity: m.rarity,
                        chosen_at: prev.chosen_at,
                    });
                    return Some((plain_target(m), "holding previous target area"));
                }
            }
        }

        let close: Vec<&EntityHandle> = in_range
            .iter()
            .copied()
            .filter(|m| m.distance_from(player) < range * cfg.close_fraction)
            .collect();
        let pool = if close.is_empty() { &in_range } else { &close };

        let density = |m: &EntityHandle| {
            in_range
                .iter()
                .filter(|o| o.id != m.id && o.position.distance(m.position) <= cfg.density_radius)
                .count()
        };

        let best = pool.iter().copied().min_by(|a, b| {
            let by_rarity = b.rarity.cmp(&a.rarity);
            let by_density = density(b).cmp(&density(a));
            let primary = if focus_fire {
                by_rarity.then(by_density)
            } else {
                by_density.then(by_rarity)
            };
            primary.then_with(|| a.distance_from(player).total_cmp(&b.distance_from(player)))
        })?;

        let chosen_at = match self.last_target {
            Some(prev) if prev.id == best.id => prev.chosen_at,
            _ => now,
        };
        self.last_target = Some(LastTarget {
            id: best.id,
            position: best.position,
            rarity: best.rarity,
            chosen_at,
        });
        let why = if focus_fire {
            "focus fire on highest value"
        } else {
            "clearing densest group"
        };
        Some((plain_target(best), why))
    }
}

fn plain_target(m: &EntityHandle) -> Target {
    Target {
        id: m.id,
        position: m.position,
        rarity: m.rarity,
        priority: false,
    }
}

impl CombatStrategy for AggressiveStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Aggressive
    }

    fn select(&mut self, input: &CombatInput<'_>, config: &CombatConfig) -> CombatDecision {
        let cfg = &config.aggressive;
        let range = Self::range(input, cfg);
        let search_radius = range * cfg.lock_search_multiplier;

        let (target, reason) = match self.update_lock(input, config, search_radius) {
            Some(locked) => {
                let reason = match self.lock() {
                    Some(lock) if input.now > lock.last_seen => {
                        format!("holding lock on {} (unseen)", lock.name)
                    }
                    Some(lock) => format!("locked on {}", lock.name),
                    None => String::new(),
                };
                (Some(locked), reason)
            }
            None => match self.select_unlocked(input, cfg, config.focus_fire, range) {
                Some((t, why)) => (Some(t), why.to_string()),
                None => (None, "no monsters in range".to_string()),
            },
        };

        let high_value = target
            .as_ref()
            .is_some_and(|t| t.priority || t.rarity.is_elite());
        let response = recommend_response(
            &cfg.thresholds,
            input.health_percent,
            input.nearby_enemies,
            config.maintain_buffs,
            high_value,
        );

        CombatDecision {
            target,
            response,
            reason,
        }
    }

    fn is_locked(&self) -> bool {
        matches!(self.state, LockState::Locked(_))
    }

    fn reset(&mut self) {
        self.state = LockState::Unlocked;
        self.last_target = None;
    }
}
