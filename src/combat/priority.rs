//! Priority target identities and fight-position weighting

use crate::core::config::PriorityTarget;
use crate::core::types::GridPos;
use crate::perception::EntityHandle;

/// Highest rank among priority patterns contained in `name` (case-insensitive)
pub fn priority_rank(name: &str, targets: &[PriorityTarget]) -> Option<u32> {
    if name.is_empty() {
        return None;
    }
    let lowered = name.to_lowercase();
    targets
        .iter()
        .filter(|t| !t.name.is_empty() && lowered.contains(&t.name.to_lowercase()))
        .map(|t| t.rank)
        .max()
}

/// Sum of rarity weights of monsters within `radius` of `position`
pub fn fight_weight<'a>(
    position: GridPos,
    monsters: impl IntoIterator<Item = &'a EntityHandle>,
    radius: f32,
) -> u32 {
    monsters
        .into_iter()
        .filter(|m| m.position.distance(position) <= radius)
        .map(|m| m.rarity.weight())
        .sum()
}

/// Monster position beyond `radius` from the player with the heaviest fight
/// weight. Earlier monsters win ties.
pub fn best_fighting_position(
    player: GridPos,
    monsters: &[&EntityHandle],
    radius: f32,
) -> Option<(GridPos, u32)> {
    let mut best: Option<(GridPos, u32)> = None;
    for candidate in monsters
        .iter()
        .filter(|m| m.position.distance(player) > radius)
    {
        let weight = fight_weight(candidate.position, monsters.iter().copied(), radius);
        if best.map_or(true, |(_, w)| weight > w) {
            best = Some((candidate.position, weight));
        }
    }
    best
}
