//! Combat strategy integration tests
//!
//! Priority locking across ticks: grace periods, escalation, and the
//! ways a lock is released.

use std::time::{Duration, Instant};

use glam::Vec2;

use wave_agent::combat::{
    AggressiveStrategy, CombatInput, CombatStrategy, SkillRole, StandardStrategy, Strategy,
    StrategyKind,
};
use wave_agent::core::config::{CombatConfig, PriorityTarget};
use wave_agent::core::types::Rarity;
use wave_agent::perception::EntityHandle;

fn config() -> CombatConfig {
    CombatConfig {
        strategy: StrategyKind::Aggressive,
        priority_targets: vec![
            PriorityTarget {
                name: "Kosis".into(),
                rank: 2,
            },
            PriorityTarget {
                name: "Omniphobia".into(),
                rank: 1,
            },
        ],
        ..CombatConfig::default()
    }
}

fn input(entities: &[EntityHandle], player: Vec2, now: Instant) -> CombatInput<'_> {
    CombatInput {
        entities,
        player,
        health_percent: 100.0,
        nearby_enemies: entities.len(),
        range: 15.0,
        now,
    }
}

fn boss(id: u64, x: f32, name: &str) -> EntityHandle {
    EntityHandle::monster(id, Vec2::new(x, 0.0), Rarity::Unique).with_name(name)
}

fn after(start: Instant, millis: u64) -> Instant {
    start + Duration::from_millis(millis)
}

#[test]
fn test_lock_survives_brief_absence() {
    let config = config();
    let mut strategy = AggressiveStrategy::new();
    let t0 = Instant::now();

    let seen = [boss(1, 40.0, "Omniphobia, Fear Manifest")];
    let decision = strategy.select(&input(&seen, Vec2::ZERO, t0), &config);
    assert!(decision.is_priority());
    assert_eq!(decision.target_position(), Some(Vec2::new(40.0, 0.0)));
    assert!(strategy.is_locked());

    // Out of sight for one tick: still pinned to the last known position
    let decision = strategy.select(&input(&[], Vec2::ZERO, after(t0, 1000)), &config);
    assert!(strategy.is_locked());
    assert_eq!(decision.target_position(), Some(Vec2::new(40.0, 0.0)));
    assert!(decision.reason.contains("unseen"));

    // Back in sight within the grace period
    let decision = strategy.select(&input(&seen, Vec2::ZERO, after(t0, 2500)), &config);
    assert!(decision.is_priority());
    assert_eq!(strategy.lock().map(|l| l.last_seen), Some(after(t0, 2500)));
}

#[test]
fn test_lock_released_after_grace_period() {
    let config = config();
    let mut strategy = AggressiveStrategy::new();
    let t0 = Instant::now();

    let seen = [boss(1, 40.0, "Omniphobia")];
    strategy.select(&input(&seen, Vec2::ZERO, t0), &config);
    assert!(strategy.is_locked());

    let decision = strategy.select(&input(&[], Vec2::ZERO, after(t0, 3100)), &config);
    assert!(!strategy.is_locked());
    assert!(decision.target.is_none());
}

#[test]
fn test_higher_rank_steals_lock() {
    let config = config();
    let mut strategy = AggressiveStrategy::new();
    let t0 = Instant::now();

    let first = [boss(1, 20.0, "Omniphobia")];
    strategy.select(&input(&first, Vec2::ZERO, t0), &config);
    assert_eq!(strategy.lock().map(|l| l.id), Some(1));

    // Same rank does not take over
    let peer = [boss(1, 20.0, "Omniphobia"), boss(3, 10.0, "Omniphobia")];
    strategy.select(&input(&peer, Vec2::ZERO, after(t0, 200)), &config);
    assert_eq!(strategy.lock().map(|l| l.id), Some(1));

    let both = [boss(1, 20.0, "Omniphobia"), boss(2, 50.0, "Kosis, The Revelation")];
    let decision = strategy.select(&input(&both, Vec2::ZERO, after(t0, 400)), &config);
    assert_eq!(strategy.lock().map(|l| (l.id, l.rank)), Some((2, 2)));
    assert_eq!(decision.target_position(), Some(Vec2::new(50.0, 0.0)));
}

#[test]
fn test_lock_released_on_kill() {
    let config = config();
    let mut strategy = AggressiveStrategy::new();
    let t0 = Instant::now();

    let seen = [boss(1, 30.0, "Kosis")];
    strategy.select(&input(&seen, Vec2::ZERO, t0), &config);
    assert!(strategy.is_locked());

    let mut corpse = boss(1, 30.0, "Kosis");
    corpse.alive = false;
    let rest = [corpse, EntityHandle::monster(7, Vec2::new(5.0, 0.0), Rarity::Normal)];
    let decision = strategy.select(&input(&rest, Vec2::ZERO, after(t0, 200)), &config);
    assert!(!strategy.is_locked());
    assert_eq!(decision.target.map(|t| t.id), Some(7));
}

#[test]
fn test_lock_released_when_target_too_far() {
    let config = config();
    let mut strategy = AggressiveStrategy::new();
    let t0 = Instant::now();

    let seen = [boss(1, 40.0, "Kosis")];
    strategy.select(&input(&seen, Vec2::ZERO, t0), &config);

    // Player ran off; the remembered position is now far behind
    let decision = strategy.select(&input(&[], Vec2::new(-200.0, 0.0), after(t0, 500)), &config);
    assert!(!strategy.is_locked());
    assert!(decision.target.is_none());
}

#[test]
fn test_priority_target_gets_single_target_damage() {
    let config = config();
    let mut strategy = Strategy::from_kind(StrategyKind::Aggressive);
    let t0 = Instant::now();

    let seen = [boss(1, 40.0, "Kosis")];
    let decision = strategy.select(&input(&seen, Vec2::ZERO, t0), &config);
    assert_eq!(decision.response.damage_role, SkillRole::SingleTarget);
}

#[test]
fn test_low_health_goes_defensive() {
    let config = config();
    let mut strategy = StandardStrategy;
    let t0 = Instant::now();

    let pack: Vec<EntityHandle> = (0..3)
        .map(|i| EntityHandle::monster(i, Vec2::new(5.0 + i as f32, 0.0), Rarity::Normal))
        .collect();
    let mut hurt = input(&pack, Vec2::ZERO, t0);
    hurt.health_percent = 20.0;
    let decision = strategy.select(&hurt, &config);
    assert_eq!(decision.response.role, SkillRole::Defensive);
    assert!(decision.target.is_some());
}

#[test]
fn test_standard_prefers_rarity_over_distance() {
    let config = CombatConfig::default();
    let mut strategy = StandardStrategy;
    let t0 = Instant::now();

    let monsters = [
        EntityHandle::monster(1, Vec2::new(3.0, 0.0), Rarity::Normal),
        EntityHandle::monster(2, Vec2::new(12.0, 0.0), Rarity::Rare),
        EntityHandle::monster(3, Vec2::new(40.0, 0.0), Rarity::Unique),
    ];
    let decision = strategy.select(&input(&monsters, Vec2::ZERO, t0), &config);
    assert_eq!(decision.target.map(|t| t.id), Some(2));
}
