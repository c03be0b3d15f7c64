//! Per-area navigation bundle
//!
//! Owns the grid, the exploration chunks and the position-keyed blacklists
//! for one area visit. Entering a new area replaces the whole `AreaMap`, so
//! nothing here survives an area change.

use std::time::Instant;

use ahash::AHashSet;

use super::chunks::{Chunk, ChunkIndex};
use super::grid::WorldGrid;
use super::path::Path;
use super::pathfinding::find_path;
use crate::core::config::{AgentConfig, NavigationConfig, RunConfig};
use crate::core::error::Result;
use crate::core::types::{CellKey, GridPos};
use crate::perception::{GroundItem, TerrainLayer, WorldSnapshot};

#[derive(Debug, Clone)]
pub struct AreaMap {
    name: String,
    grid: WorldGrid,
    chunks: ChunkIndex,
    center: GridPos,
    item_blacklist: AHashSet<u64>,
    chunk_blacklist: AHashSet<CellKey>,
}

impl AreaMap {
    pub fn new(name: impl Into<String>, grid: WorldGrid, config: &AgentConfig) -> Self {
        let name = name.into();
        let chunks = ChunkIndex::build(&grid, config.navigation.chunk_size);
        let center = config.area_center(&name).unwrap_or_else(|| grid.center());
        tracing::info!(
            area = %name,
            width = grid.width(),
            height = grid.height(),
            chunks = chunks.len(),
            "area map built"
        );
        Self {
            name,
            grid,
            chunks,
            center,
            item_blacklist: AHashSet::new(),
            chunk_blacklist: AHashSet::new(),
        }
    }

    pub fn from_terrain(
        name: impl Into<String>,
        terrain: &TerrainLayer,
        config: &AgentConfig,
    ) -> Result<Self> {
        let grid = WorldGrid::from_terrain(terrain, config.navigation.terrain_subdivision)?;
        Ok(Self::new(name, grid, config))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn grid(&self) -> &WorldGrid {
        &self.grid
    }

    pub fn chunks(&self) -> &ChunkIndex {
        &self.chunks
    }

    pub fn chunks_mut(&mut self) -> &mut ChunkIndex {
        &mut self.chunks
    }

    /// Known centre of the encounter area, or the grid centre
    pub fn center(&self) -> GridPos {
        self.center
    }

    /// Plan and simplify a path. A blocked start snaps to nearby floor;
    /// the goal must be walkable.
    pub fn find_path(
        &self,
        start: GridPos,
        end: GridPos,
        now: Instant,
        nav: &NavigationConfig,
    ) -> Option<Path> {
        let Some(start_cell) = self.grid.nearest_walkable(start, nav.start_snap_radius) else {
            tracing::debug!(?start, "no walkable cell near path start");
            return None;
        };
        match find_path(&self.grid, start_cell.to_pos(), end) {
            Some(raw) => Some(Path::new(raw, nav.node_size, now, nav.path_ttl())),
            None => {
                tracing::debug!(?start, ?end, "no path");
                None
            }
        }
    }

    pub fn blacklist_item(&mut self, id: u64) {
        if self.item_blacklist.insert(id) {
            tracing::debug!(item = id, "ground item blacklisted");
        }
    }

    pub fn is_item_blacklisted(&self, id: u64) -> bool {
        self.item_blacklist.contains(&id)
    }

    pub fn blacklist_chunk(&mut self, key: CellKey) {
        if self.chunk_blacklist.insert(key) {
            tracing::debug!(x = key.x, y = key.y, "chunk blacklisted");
        }
    }

    pub fn is_chunk_blacklisted(&self, key: CellKey) -> bool {
        self.chunk_blacklist.contains(&key)
    }

    /// Nearest explorable chunk that has not been blacklisted
    pub fn next_explore_chunk(&self, player: GridPos) -> Option<&Chunk> {
        self.chunks
            .next_unrevealed_where(player, |c| !self.chunk_blacklist.contains(&c.key()))
    }

    /// Nearest lootable ground item: label visible, not an ignored kind, not
    /// blacklisted
    pub fn closest_valid_ground_item<'a>(
        &self,
        snapshot: &'a WorldSnapshot,
        run: &RunConfig,
    ) -> Option<&'a GroundItem> {
        let player = snapshot.player_pos();
        snapshot
            .ground_items
            .iter()
            .filter(|item| item.label_visible && !item.label.is_empty())
            .filter(|item| {
                !run.ignored_item_suffixes
                    .iter()
                    .any(|suffix| item.label.ends_with(suffix.as_str()))
            })
            .filter(|item| !self.item_blacklist.contains(&item.id))
            .min_by(|a, b| {
                a.position
                    .distance(player)
                    .total_cmp(&b.position.distance(player))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::AreaCenter;
    use glam::Vec2;

    #[test]
    fn test_center_prefers_configured_area() {
        let mut config = AgentConfig::default();
        config.areas.push(AreaCenter {
            area: "Bridge".into(),
            center: [7.0, 3.0],
        });
        let map = AreaMap::new("Bridge", WorldGrid::filled(20, 20, 1), &config);
        assert_eq!(map.center(), Vec2::new(7.0, 3.0));

        let other = AreaMap::new("Elsewhere", WorldGrid::filled(20, 20, 1), &config);
        assert_eq!(other.center(), Vec2::new(10.0, 10.0));
    }

    #[test]
    fn test_find_path_snaps_blocked_start() {
        let config = AgentConfig::default();
        let map = AreaMap::new(
            "Test",
            WorldGrid::from_ascii(&["#....", ".....", "....."]),
            &config,
        );
        let path = map
            .find_path(Vec2::ZERO, Vec2::new(4.0, 2.0), Instant::now(), &config.navigation)
            .unwrap();
        assert_eq!(path.destination(), Some(Vec2::new(4.0, 2.0)));
        assert!(map
            .find_path(Vec2::new(1.0, 1.0), Vec2::ZERO, Instant::now(), &config.navigation)
            .is_none());
    }

    #[test]
    fn test_closest_valid_ground_item_filters() {
        let config = AgentConfig::default();
        let mut map = AreaMap::new("Test", WorldGrid::filled(50, 50, 1), &config);
        let mut snapshot = WorldSnapshot::new("Test", Vec2::ZERO);
        snapshot
            .ground_items
            .push(GroundItem::new(1, Vec2::new(1.0, 0.0), "Stack of Gold"));
        snapshot
            .ground_items
            .push(GroundItem::new(2, Vec2::new(2.0, 0.0), "Rare Ring"));
        let mut hidden = GroundItem::new(3, Vec2::new(0.5, 0.0), "Hidden Amulet");
        hidden.label_visible = false;
        snapshot.ground_items.push(hidden);
        snapshot
            .ground_items
            .push(GroundItem::new(4, Vec2::new(9.0, 0.0), "Unique Belt"));

        let item = map.closest_valid_ground_item(&snapshot, &config.run).unwrap();
        assert_eq!(item.id, 2);

        map.blacklist_item(2);
        let item = map.closest_valid_ground_item(&snapshot, &config.run).unwrap();
        assert_eq!(item.id, 4);
    }

    #[test]
    fn test_blacklisted_chunk_is_skipped() {
        let config = AgentConfig::default();
        let mut map = AreaMap::new("Test", WorldGrid::filled(20, 10, 1), &config);
        let first = map.next_explore_chunk(Vec2::ZERO).unwrap().key();
        map.blacklist_chunk(first);
        let second = map.next_explore_chunk(Vec2::ZERO).unwrap().key();
        assert_ne!(first, second);
        map.blacklist_chunk(second);
        assert!(map.next_explore_chunk(Vec2::ZERO).is_none());
    }
}
