//! Exploration chunks
//!
//! The grid is partitioned into fixed-size square regions. Each region keeps
//! its walkable weight (fixed at construction) and a revealed flag that only
//! goes false -> true until the next explicit reset.

use glam::Vec2;

use super::grid::WorldGrid;
use crate::core::types::{CellKey, GridPos};

#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    pub centroid: GridPos,
    /// Sum of the region's walkability values
    pub weight: u32,
    pub revealed: bool,
}

impl Chunk {
    /// Quantized centroid, used to key blacklists
    pub fn key(&self) -> CellKey {
        CellKey::from_pos(self.centroid)
    }

    pub fn is_explorable(&self) -> bool {
        !self.revealed && self.weight > 0
    }
}

#[derive(Debug, Clone)]
pub struct ChunkIndex {
    chunk_size: usize,
    chunks: Vec<Chunk>,
}

impl ChunkIndex {
    pub fn build(grid: &WorldGrid, chunk_size: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        let cols = grid.width().div_ceil(chunk_size);
        let rows = grid.height().div_ceil(chunk_size);
        let half = (chunk_size / 2) as f32;

        let mut chunks = Vec::with_capacity(cols * rows);
        for cy in 0..rows {
            for cx in 0..cols {
                let start_x = cx * chunk_size;
                let start_y = cy * chunk_size;
                let mut weight = 0u32;
                for y in start_y..(start_y + chunk_size).min(grid.height()) {
                    for x in start_x..(start_x + chunk_size).min(grid.width()) {
                        weight += u32::from(grid.get(x as i32, y as i32).unwrap_or(0));
                    }
                }
                chunks.push(Chunk {
                    centroid: Vec2::new(start_x as f32 + half, start_y as f32 + half),
                    weight,
                    revealed: false,
                });
            }
        }

        Self { chunk_size, chunks }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Chunk> {
        self.chunks.iter()
    }

    pub fn revealed_count(&self) -> usize {
        self.chunks.iter().filter(|c| c.revealed).count()
    }

    /// Clear every revealed flag
    pub fn reset_all(&mut self) {
        for chunk in &mut self.chunks {
            chunk.revealed = false;
        }
    }

    /// Reveal unrevealed chunks whose centroid is closer than `view_distance`.
    /// Returns how many were newly revealed.
    pub fn update_revealed(&mut self, player: GridPos, view_distance: f32) -> usize {
        let mut revealed = 0;
        for chunk in self.chunks.iter_mut().filter(|c| !c.revealed) {
            if chunk.centroid.distance(player) < view_distance {
                chunk.revealed = true;
                revealed += 1;
            }
        }
        revealed
    }

    /// Nearest explorable chunk, ties broken by larger weight
    pub fn next_unrevealed(&self, player: GridPos) -> Option<&Chunk> {
        self.next_unrevealed_where(player, |_| true)
    }

    /// Nearest explorable chunk accepted by `filter`
    pub fn next_unrevealed_where<F>(&self, player: GridPos, filter: F) -> Option<&Chunk>
    where
        F: Fn(&Chunk) -> bool,
    {
        self.chunks
            .iter()
            .filter(|c| c.is_explorable() && filter(c))
            .min_by(|a, b| {
                let da = a.centroid.distance(player);
                let db = b.centroid.distance(player);
                da.total_cmp(&db).then_with(|| b.weight.cmp(&a.weight))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_weights_and_centroids() {
        let grid = WorldGrid::filled(25, 10, 1);
        let index = ChunkIndex::build(&grid, 10);
        assert_eq!(index.len(), 3);
        let chunks: Vec<_> = index.iter().collect();
        assert_eq!(chunks[0].weight, 100);
        assert_eq!(chunks[0].centroid, Vec2::new(5.0, 5.0));
        // partial trailing chunk only counts cells inside the grid
        assert_eq!(chunks[2].weight, 50);
        assert_eq!(chunks[2].centroid, Vec2::new(25.0, 5.0));
    }

    #[test]
    fn test_update_revealed_is_strictly_closer_than_view_distance() {
        let grid = WorldGrid::filled(20, 10, 1);
        let mut index = ChunkIndex::build(&grid, 10);
        // centroids at (5,5) and (15,5); player at (5,5)
        assert_eq!(index.update_revealed(Vec2::new(5.0, 5.0), 10.0), 1);
        assert_eq!(index.revealed_count(), 1);
        assert_eq!(index.update_revealed(Vec2::new(5.0, 5.0), 10.5), 1);
        assert_eq!(index.update_revealed(Vec2::new(5.0, 5.0), 100.0), 0);

        index.reset_all();
        assert_eq!(index.revealed_count(), 0);
    }

    #[test]
    fn test_next_unrevealed_skips_floorless_chunks() {
        // left chunk has no floor, right chunk does
        let mut cells = vec![0u8; 20 * 10];
        for y in 0..10 {
            for x in 10..20 {
                cells[y * 20 + x] = 1;
            }
        }
        let grid = WorldGrid::from_cells(20, 10, cells).unwrap();
        let mut index = ChunkIndex::build(&grid, 10);

        let next = index.next_unrevealed(Vec2::new(0.0, 0.0)).unwrap();
        assert_eq!(next.centroid, Vec2::new(15.0, 5.0));

        index.update_revealed(Vec2::new(15.0, 5.0), 1.0);
        assert!(index.next_unrevealed(Vec2::new(0.0, 0.0)).is_none());
    }

    #[test]
    fn test_next_unrevealed_tie_prefers_heavier_chunk() {
        let mut cells = vec![1u8; 20 * 10];
        // thin out the left chunk
        for y in 0..5 {
            for x in 0..10 {
                cells[y * 20 + x] = 0;
            }
        }
        let grid = WorldGrid::from_cells(20, 10, cells).unwrap();
        let index = ChunkIndex::build(&grid, 10);
        // equidistant from both centroids
        let next = index.next_unrevealed(Vec2::new(10.0, 5.0)).unwrap();
        assert_eq!(next.weight, 100);
    }
}
