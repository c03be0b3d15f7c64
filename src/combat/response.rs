//! Recommended response given player state and target

use serde::Serialize;

use super::skills::SkillRole;
use crate::core::config::ResponseThresholds;

/// Primary recommendation plus the damage role to use when no skill for the
/// primary role is ready
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ResponsePlan {
    pub role: SkillRole,
    pub damage_role: SkillRole,
}

pub fn recommend_response(
    thresholds: &ResponseThresholds,
    health_percent: f32,
    nearby_enemies: usize,
    maintain_buffs: bool,
    high_value_target: bool,
) -> ResponsePlan {
    let damage_role = if high_value_target {
        SkillRole::SingleTarget
    } else if nearby_enemies > 1 {
        SkillRole::AreaDamage
    } else {
        SkillRole::PrimaryDamage
    };

    let critical = health_percent < thresholds.defensive_health;
    let crowded = nearby_enemies > thresholds.crowd_size && health_percent < thresholds.crowd_health;

    let role = if critical || crowded {
        SkillRole::Defensive
    } else if maintain_buffs && health_percent > thresholds.buff_min_health {
        SkillRole::Buff
    } else {
        damage_role
    };

    ResponsePlan { role, damage_role }
}
