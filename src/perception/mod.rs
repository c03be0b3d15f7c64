//! World sensor data model
//!
//! The host produces one `WorldSnapshot` per tick (and a `TerrainLayer` on
//! area entry). Nothing in the decision core mutates these values.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::core::types::{GridPos, Rarity, ScreenPos};

fn yes() -> bool {
    true
}

/// Packed walkability layer: every byte holds two adjacent half-cells
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TerrainLayer {
    pub num_cols: usize,
    pub num_rows: usize,
    pub bytes_per_row: usize,
    pub data: Vec<u8>,
}

/// Opaque entity reference supplied by the sensor
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EntityHandle {
    pub id: u64,
    pub position: GridPos,
    #[serde(default = "yes")]
    pub alive: bool,
    pub hostile: bool,
    pub targetable: bool,
    pub rarity: Rarity,
    pub name: String,
    /// Resource path or other stable identity string
    pub identity: String,
    /// Distance to the player as reported by the sensor
    pub distance: Option<f32>,
    /// Named state values (only present on anchor-like entities)
    pub signals: AHashMap<String, i64>,
}

impl EntityHandle {
    /// A live, hostile, targetable monster
    pub fn monster(id: u64, position: GridPos, rarity: Rarity) -> Self {
        Self {
            id,
            position,
            alive: true,
            hostile: true,
            targetable: true,
            rarity,
            ..Default::default()
        }
    }

    /// A non-hostile world object recognised by identity
    pub fn object(id: u64, position: GridPos, identity: impl Into<String>) -> Self {
        Self {
            id,
            position,
            alive: true,
            identity: identity.into(),
            ..Default::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_signal(mut self, name: impl Into<String>, value: i64) -> Self {
        self.signals.insert(name.into(), value);
        self
    }

    pub fn is_valid_target(&self) -> bool {
        self.alive && self.hostile && self.targetable
    }

    pub fn identity_matches(&self, pattern: &str) -> bool {
        !pattern.is_empty() && self.identity.contains(pattern)
    }

    pub fn signal(&self, name: &str) -> Option<i64> {
        self.signals.get(name).copied()
    }

    /// Sensor-reported distance, or straight-line distance when absent
    pub fn distance_from(&self, player: GridPos) -> f32 {
        self.distance
            .unwrap_or_else(|| self.position.distance(player))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GroundItem {
    pub id: u64,
    pub position: GridPos,
    pub label: String,
    #[serde(default = "yes")]
    pub label_visible: bool,
}

impl GroundItem {
    pub fn new(id: u64, position: GridPos, label: impl Into<String>) -> Self {
        Self {
            id,
            position,
            label: label.into(),
            label_visible: true,
        }
    }
}

/// An item cell inside an inventory-like panel
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PanelItem {
    pub id: u64,
    pub screen_pos: ScreenPos,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InventoryView {
    pub panel_visible: bool,
    pub items: Vec<PanelItem>,
    /// Empty area of the inventory panel used to drop a held item
    pub drop_pos: ScreenPos,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StashView {
    pub open: bool,
    /// Consumables that can be applied to equipment
    pub consumables: Vec<PanelItem>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EquipmentSlot {
    pub screen_pos: ScreenPos,
    pub has_consumable: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CursorState {
    #[default]
    Free,
    HoldItem,
    UseItem,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MapDeviceView {
    pub activate_enabled: bool,
    pub activate_pos: ScreenPos,
    /// Inventory items that can be placed into the device
    pub fragments: Vec<PanelItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiView {
    pub window_focused: bool,
    pub revive_button: Option<ScreenPos>,
    /// Present while the map device window is open
    pub map_device: Option<MapDeviceView>,
}

impl Default for UiView {
    fn default() -> Self {
        Self {
            window_focused: true,
            revive_button: None,
            map_device: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerView {
    pub position: GridPos,
    #[serde(default = "yes")]
    pub alive: bool,
    pub health_percent: f32,
    pub buffs: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AreaView {
    pub name: String,
    /// Safe staging area (hideout) where new encounters are set up
    pub is_staging: bool,
}

/// Read-only per-tick view of the world
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldSnapshot {
    pub player: PlayerView,
    pub area: AreaView,
    pub entities: Vec<EntityHandle>,
    pub ground_items: Vec<GroundItem>,
    pub inventory: InventoryView,
    pub stash: StashView,
    pub equipment: Vec<EquipmentSlot>,
    pub cursor: CursorState,
    pub ui: UiView,
    /// Monsters the encounter reports as still alive, if known
    pub monsters_remaining: Option<u32>,
}

impl WorldSnapshot {
    /// Snapshot of a healthy, alive player in the named area
    pub fn new(area: impl Into<String>, player_position: GridPos) -> Self {
        Self {
            player: PlayerView {
                position: player_position,
                alive: true,
                health_percent: 100.0,
                buffs: Vec::new(),
            },
            area: AreaView {
                name: area.into(),
                is_staging: false,
            },
            ..Default::default()
        }
    }

    pub fn player_pos(&self) -> GridPos {
        self.player.position
    }

    /// Live hostile targetable monsters
    pub fn monsters(&self) -> impl Iterator<Item = &EntityHandle> {
        self.entities.iter().filter(|e| e.is_valid_target())
    }

    /// Monsters within `radius` of a position
    pub fn monsters_near(&self, center: GridPos, radius: f32) -> impl Iterator<Item = &EntityHandle> {
        self.monsters()
            .filter(move |e| e.position.distance(center) <= radius)
    }

    pub fn first_with_identity(&self, pattern: &str) -> Option<&EntityHandle> {
        self.entities.iter().find(|e| e.identity_matches(pattern))
    }

    pub fn nearest_with_identity(&self, pattern: &str) -> Option<&EntityHandle> {
        let player = self.player.position;
        self.entities
            .iter()
            .filter(|e| e.identity_matches(pattern))
            .min_by(|a, b| a.distance_from(player).total_cmp(&b.distance_from(player)))
    }

    pub fn has_buff(&self, buff: &str) -> bool {
        self.player.buffs.iter().any(|b| b == buff)
    }

    /// A stash consumable exists and some equipment slot lacks one
    pub fn consumable_opportunity(&self) -> bool {
        !self.stash.consumables.is_empty() && self.equipment.iter().any(|s| !s.has_consumable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;

    #[test]
    fn test_monsters_filters_invalid_targets() {
        let mut snapshot = WorldSnapshot::new("Arena", Vec2::ZERO);
        snapshot
            .entities
            .push(EntityHandle::monster(1, Vec2::new(5.0, 0.0), Rarity::Normal));
        let mut dead = EntityHandle::monster(2, Vec2::new(6.0, 0.0), Rarity::Rare);
        dead.alive = false;
        snapshot.entities.push(dead);
        snapshot
            .entities
            .push(EntityHandle::object(3, Vec2::new(1.0, 1.0), "Objects/Stash"));

        let ids: Vec<u64> = snapshot.monsters().map(|e| e.id).collect();
        assert_eq!(ids, vec![1]);
    }

    #[test]
    fn test_nearest_with_identity_prefers_reported_distance() {
        let mut snapshot = WorldSnapshot::new("Arena", Vec2::ZERO);
        let mut far_by_report = EntityHandle::object(1, Vec2::new(1.0, 0.0), "TownPortal");
        far_by_report.distance = Some(90.0);
        snapshot.entities.push(far_by_report);
        snapshot
            .entities
            .push(EntityHandle::object(2, Vec2::new(20.0, 0.0), "TownPortal"));

        assert_eq!(snapshot.nearest_with_identity("Portal").map(|e| e.id), Some(2));
        assert!(snapshot.nearest_with_identity("").is_none());
    }

    #[test]
    fn test_consumable_opportunity_requires_both_sides() {
        let mut snapshot = WorldSnapshot::new("Arena", Vec2::ZERO);
        snapshot.equipment.push(EquipmentSlot::default());
        assert!(!snapshot.consumable_opportunity());

        snapshot.stash.consumables.push(PanelItem::default());
        assert!(snapshot.consumable_opportunity());

        snapshot.equipment[0].has_consumable = true;
        assert!(!snapshot.consumable_opportunity());
    }
}
