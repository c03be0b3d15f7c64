//! Core type definitions used throughout the codebase

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Grid-space position. One unit is one walkability cell.
pub type GridPos = Vec2;

/// Quantized grid coordinate used to key position-based caches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellKey {
    pub x: i32,
    pub y: i32,
}

impl CellKey {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Round a grid position to its containing cell
    pub fn from_pos(pos: GridPos) -> Self {
        Self {
            x: pos.x.round() as i32,
            y: pos.y.round() as i32,
        }
    }

    pub fn to_pos(self) -> GridPos {
        Vec2::new(self.x as f32, self.y as f32)
    }
}

/// Pixel position on the host window
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScreenPos {
    pub x: f32,
    pub y: f32,
}

impl ScreenPos {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Monster rarity tier as reported by perception
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Rarity {
    #[default]
    Normal,
    Magic,
    Rare,
    Unique,
}

impl Rarity {
    /// Targeting weight: one unique is worth 25 normal monsters
    pub fn weight(self) -> u32 {
        match self {
            Rarity::Normal => 1,
            Rarity::Magic => 3,
            Rarity::Rare => 10,
            Rarity::Unique => 25,
        }
    }

    pub fn is_elite(self) -> bool {
        matches!(self, Rarity::Rare | Rarity::Unique)
    }
}

/// Named key understood by the actuator backend ("Q", "Escape", "Ctrl", ...)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Key(pub String);

impl Key {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MouseButton {
    Left,
    Right,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_key_rounds() {
        assert_eq!(CellKey::from_pos(Vec2::new(3.6, -0.4)), CellKey::new(4, 0));
        assert_eq!(CellKey::new(7, 2).to_pos(), Vec2::new(7.0, 2.0));
    }

    #[test]
    fn test_rarity_weight_ordering() {
        assert!(Rarity::Unique.weight() > Rarity::Rare.weight());
        assert!(Rarity::Rare.weight() > Rarity::Magic.weight());
        assert!(Rarity::Magic.weight() > Rarity::Normal.weight());
        assert!(Rarity::Rare.is_elite());
        assert!(!Rarity::Magic.is_elite());
    }
}
