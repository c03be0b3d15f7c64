//! Skill slots and their cooldown timers

use std::time::{Duration, Instant};

use ahash::AHashMap;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::core::config::SkillSlotConfig;
use crate::core::types::Key;
use crate::perception::WorldSnapshot;

/// What a skill is for
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SkillRole {
    Defensive,
    Buff,
    AreaDamage,
    SingleTarget,
    #[default]
    PrimaryDamage,
}

impl SkillRole {
    pub fn is_damage(self) -> bool {
        matches!(
            self,
            SkillRole::AreaDamage | SkillRole::SingleTarget | SkillRole::PrimaryDamage
        )
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CastType {
    /// Cast at a monster position
    #[default]
    TargetMonster,
    /// Cast on the player's own position
    SelfCast,
}

/// Last-use timestamps per slot index. Lives in the agent, not the config,
/// so a config swap never resets cooldowns.
#[derive(Debug, Clone, Default)]
pub struct SkillBar {
    last_used: AHashMap<usize, Instant>,
}

impl SkillBar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_ready(&self, index: usize, slot: &SkillSlotConfig, now: Instant) -> bool {
        self.last_used.get(&index).map_or(true, |&t| {
            now.saturating_duration_since(t) >= Duration::from_millis(slot.min_delay_ms)
        })
    }

    pub fn mark_used(&mut self, index: usize, now: Instant) {
        self.last_used.insert(index, now);
    }

    fn buff_missing(slot: &SkillSlotConfig, snapshot: &WorldSnapshot) -> bool {
        slot.buff.as_deref().map_or(true, |b| !snapshot.has_buff(b))
    }

    /// First ready self-cast slot whose buff is not already active
    pub fn ready_self_cast(
        &self,
        slots: &[SkillSlotConfig],
        snapshot: &WorldSnapshot,
        now: Instant,
    ) -> Option<usize> {
        slots.iter().enumerate().find_map(|(i, slot)| {
            (slot.cast == CastType::SelfCast
                && !slot.movement
                && self.is_ready(i, slot, now)
                && Self::buff_missing(slot, snapshot))
            .then_some(i)
        })
    }

    /// First ready targeted slot with the given role
    pub fn ready_for_role(
        &self,
        slots: &[SkillSlotConfig],
        role: SkillRole,
        snapshot: &WorldSnapshot,
        now: Instant,
    ) -> Option<usize> {
        slots.iter().enumerate().find_map(|(i, slot)| {
            (slot.role == role
                && slot.cast == CastType::TargetMonster
                && !slot.movement
                && self.is_ready(i, slot, now)
                && Self::buff_missing(slot, snapshot))
            .then_some(i)
        })
    }

    /// Random ready movement slot, or the fallback key. Marks the slot used.
    pub fn movement_key<R: Rng + ?Sized>(
        &mut self,
        slots: &[SkillSlotConfig],
        fallback: &Key,
        now: Instant,
        rng: &mut R,
    ) -> Key {
        let ready: Vec<usize> = slots
            .iter()
            .enumerate()
            .filter(|(i, slot)| slot.movement && self.is_ready(*i, slot, now))
            .map(|(i, _)| i)
            .collect();
        match ready.choose(rng) {
            Some(&i) => {
                self.mark_used(i, now);
                slots[i].key.clone()
            }
            None => fallback.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn slot(key: &str, role: SkillRole, cast: CastType, movement: bool) -> SkillSlotConfig {
        SkillSlotConfig {
            key: Key::new(key),
            role,
            cast,
            movement,
            min_delay_ms: 1000,
            buff: None,
        }
    }

    #[test]
    fn test_cooldown_gates_reuse() {
        let now = Instant::now();
        let slots = vec![slot("Q", SkillRole::AreaDamage, CastType::TargetMonster, false)];
        let snapshot = WorldSnapshot::new("Arena", Vec2::ZERO);
        let mut bar = SkillBar::new();

        assert_eq!(bar.ready_for_role(&slots, SkillRole::AreaDamage, &snapshot, now), Some(0));
        bar.mark_used(0, now);
        assert_eq!(
            bar.ready_for_role(&slots, SkillRole::AreaDamage, &snapshot, now + Duration::from_millis(500)),
            None
        );
        assert_eq!(
            bar.ready_for_role(&slots, SkillRole::AreaDamage, &snapshot, now + Duration::from_millis(1000)),
            Some(0)
        );
    }

    #[test]
    fn test_self_cast_respects_buff_guard() {
        let now = Instant::now();
        let mut guarded = slot("R", SkillRole::Buff, CastType::SelfCast, false);
        guarded.buff = Some("fortify".into());
        let slots = vec![guarded];
        let mut snapshot = WorldSnapshot::new("Arena", Vec2::ZERO);
        let bar = SkillBar::new();

        assert_eq!(bar.ready_self_cast(&slots, &snapshot, now), Some(0));
        snapshot.player.buffs.push("fortify".into());
        assert_eq!(bar.ready_self_cast(&slots, &snapshot, now), None);
    }

    #[test]
    fn test_movement_key_falls_back_when_on_cooldown() {
        let now = Instant::now();
        let slots = vec![slot("T", SkillRole::PrimaryDamage, CastType::TargetMonster, true)];
        let mut bar = SkillBar::new();
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let fallback = Key::new("E");

        assert_eq!(bar.movement_key(&slots, &fallback, now, &mut rng), Key::new("T"));
        assert_eq!(bar.movement_key(&slots, &fallback, now, &mut rng), fallback);
    }
}
