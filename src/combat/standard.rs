//! Standard strategy: highest rarity in range, nearest first

use super::priority::priority_rank;
use super::response::recommend_response;
use super::{CombatDecision, CombatInput, CombatStrategy, StrategyKind, Target};
use crate::core::config::CombatConfig;

#[derive(Debug, Clone, Copy, Default)]
pub struct StandardStrategy;

impl CombatStrategy for StandardStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Standard
    }

    fn select(&mut self, input: &CombatInput<'_>, config: &CombatConfig) -> CombatDecision {
        let player = input.player;
        let best = input.monsters_within(input.range).into_iter().min_by(|a, b| {
            b.rarity
                .cmp(&a.rarity)
                .then_with(|| a.distance_from(player).total_cmp(&b.distance_from(player)))
        });

        let target = best.map(|m| Target {
            id: m.id,
            position: m.position,
            rarity: m.rarity,
            priority: priority_rank(&m.name, &config.priority_targets).is_some(),
        });
        let high_value = target
            .as_ref()
            .is_some_and(|t| t.priority || t.rarity.is_elite());
        let response = recommend_response(
            &config.standard,
            input.health_percent,
            input.nearby_enemies,
            config.maintain_buffs,
            high_value,
        );
        let reason = match &target {
            Some(t) => format!("{:?} monster {} in range", t.rarity, t.id),
            None => "no monsters in range".to_string(),
        };

        CombatDecision {
            target,
            response,
            reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Rarity;
    use crate::perception::EntityHandle;
    use glam::Vec2;
    use std::time::Instant;

    fn input(entities: &[EntityHandle], range: f32) -> CombatInput<'_> {
        CombatInput {
            entities,
            player: Vec2::ZERO,
            health_percent: 100.0,
            nearby_enemies: entities.len(),
            range,
            now: Instant::now(),
        }
    }

    #[test]
    fn test_picks_highest_rarity_then_nearest() {
        let entities = vec![
            EntityHandle::monster(1, Vec2::new(2.0, 0.0), Rarity::Normal),
            EntityHandle::monster(2, Vec2::new(9.0, 0.0), Rarity::Rare),
            EntityHandle::monster(3, Vec2::new(5.0, 0.0), Rarity::Rare),
            EntityHandle::monster(4, Vec2::new(50.0, 0.0), Rarity::Unique),
        ];
        let decision = StandardStrategy.select(&input(&entities, 15.0), &CombatConfig::default());
        assert_eq!(decision.target.map(|t| t.id), Some(3));
    }

    #[test]
    fn test_no_target_out_of_range() {
        let entities = vec![EntityHandle::monster(1, Vec2::new(20.0, 0.0), Rarity::Normal)];
        let decision = StandardStrategy.select(&input(&entities, 15.0), &CombatConfig::default());
        assert!(decision.target.is_none());
        assert!(!decision.reason.is_empty());
    }
}
