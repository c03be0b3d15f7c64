//! Walkability grid decoded from the terrain layer
//!
//! One cell per grid unit, row-major, 0 = blocked and >0 = walkable.
//! Built once per area visit and never mutated afterwards.

use glam::Vec2;

use crate::core::error::{AgentError, Result};
use crate::core::types::{CellKey, GridPos};
use crate::perception::TerrainLayer;

#[derive(Debug, Clone)]
pub struct WorldGrid {
    width: usize,
    height: usize,
    cells: Vec<u8>,
}

impl WorldGrid {
    /// Decode the packed terrain layer at `subdivision` cells per tile edge.
    ///
    /// Each byte holds two cells: the low nibble is the even column and the
    /// high nibble the odd one. The extra final column takes the low nibble
    /// of the byte after the packed run. A row stops early when the layer
    /// runs out.
    pub fn from_terrain(terrain: &TerrainLayer, subdivision: usize) -> Result<Self> {
        if terrain.num_cols < 2 || terrain.num_rows < 2 {
            return Err(AgentError::InvalidTerrain(format!(
                "terrain must be at least 2x2 tiles, got {}x{}",
                terrain.num_cols, terrain.num_rows
            )));
        }
        if terrain.bytes_per_row == 0 {
            return Err(AgentError::InvalidTerrain("bytes_per_row is zero".into()));
        }

        let mut packed_width = (terrain.num_cols - 1) * subdivision;
        if packed_width % 2 != 0 {
            packed_width += 1;
        }
        let width = packed_width + 1;
        let height = (terrain.num_rows - 1) * subdivision;
        let mut cells = vec![0u8; width * height];

        for row in 0..height {
            for col in (0..width).step_by(2) {
                let index = row * terrain.bytes_per_row + col / 2;
                let Some(&byte) = terrain.data.get(index) else {
                    break;
                };
                cells[row * width + col] = u8::from(byte & 0x0F > 0);
                if col + 1 < width {
                    cells[row * width + col + 1] = u8::from(byte >> 4 > 0);
                }
            }
        }

        let walkable = cells.iter().filter(|&&c| c > 0).count();
        tracing::debug!(width, height, walkable, "decoded terrain grid");

        Ok(Self {
            width,
            height,
            cells,
        })
    }

    /// Build from explicit row-major cell values
    pub fn from_cells(width: usize, height: usize, cells: Vec<u8>) -> Result<Self> {
        if cells.len() != width * height {
            return Err(AgentError::InvalidTerrain(format!(
                "expected {} cells for {}x{}, got {}",
                width * height,
                width,
                height,
                cells.len()
            )));
        }
        Ok(Self {
            width,
            height,
            cells,
        })
    }

    /// Grid with every cell set to `value`
    pub fn filled(width: usize, height: usize, value: u8) -> Self {
        Self {
            width,
            height,
            cells: vec![value; width * height],
        }
    }

    /// Parse an ASCII map: `#` is blocked, anything else walkable.
    /// Rows shorter than the widest row are padded with blocked cells.
    pub fn from_ascii(rows: &[&str]) -> Self {
        let width = rows.iter().map(|r| r.chars().count()).max().unwrap_or(0);
        let height = rows.len();
        let mut cells = vec![0u8; width * height];
        for (y, row) in rows.iter().enumerate() {
            for (x, ch) in row.chars().enumerate() {
                cells[y * width + x] = u8::from(ch != '#');
            }
        }
        Self {
            width,
            height,
            cells,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    #[inline]
    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height
    }

    #[inline]
    pub fn get(&self, x: i32, y: i32) -> Option<u8> {
        if self.in_bounds(x, y) {
            Some(self.cells[y as usize * self.width + x as usize])
        } else {
            None
        }
    }

    #[inline]
    pub fn is_walkable(&self, x: i32, y: i32) -> bool {
        self.get(x, y).is_some_and(|v| v > 0)
    }

    pub fn is_walkable_pos(&self, pos: GridPos) -> bool {
        let key = CellKey::from_pos(pos);
        self.is_walkable(key.x, key.y)
    }

    /// Nearest walkable cell within `radius` (Chebyshev rings), closest first
    pub fn nearest_walkable(&self, pos: GridPos, radius: i32) -> Option<CellKey> {
        let origin = CellKey::from_pos(pos);
        if self.is_walkable(origin.x, origin.y) {
            return Some(origin);
        }
        for ring in 1..=radius.max(0) {
            let best = (-ring..=ring)
                .flat_map(|dy| (-ring..=ring).map(move |dx| (dx, dy)))
                .filter(|(dx, dy)| dx.abs() == ring || dy.abs() == ring)
                .map(|(dx, dy)| CellKey::new(origin.x + dx, origin.y + dy))
                .filter(|c| self.is_walkable(c.x, c.y))
                .min_by(|a, b| {
                    let da = a.to_pos().distance_squared(pos);
                    let db = b.to_pos().distance_squared(pos);
                    da.total_cmp(&db)
                });
            if best.is_some() {
                return best;
            }
        }
        None
    }

    /// Centre of the grid in grid coordinates
    pub fn center(&self) -> GridPos {
        Vec2::new(self.width as f32 / 2.0, self.height as f32 / 2.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terrain_dimensions_round_up_to_even() {
        // (2 - 1) * 23 = 23 is odd -> 24 packed columns, 25 wide
        let terrain = TerrainLayer {
            num_cols: 2,
            num_rows: 2,
            bytes_per_row: 13,
            data: vec![0x11; 13 * 23],
        };
        let grid = WorldGrid::from_terrain(&terrain, 23).unwrap();
        assert_eq!(grid.width(), 25);
        assert_eq!(grid.height(), 23);
        assert!(grid.is_walkable(0, 0));
        assert!(grid.is_walkable(23, 22));
        assert!(grid.is_walkable(24, 0));
        assert!(grid.is_walkable(24, 22));
    }

    #[test]
    fn test_final_column_reads_low_nibble() {
        let mut data = vec![0u8; 13 * 23];
        data[12] = 0xF0; // high nibble has no column to land in
        data[13 + 12] = 0x01;
        let terrain = TerrainLayer {
            num_cols: 2,
            num_rows: 2,
            bytes_per_row: 13,
            data,
        };
        let grid = WorldGrid::from_terrain(&terrain, 23).unwrap();
        assert_eq!(grid.get(24, 0), Some(0));
        assert_eq!(grid.get(24, 1), Some(1));
    }

    #[test]
    fn test_short_layer_leaves_final_column_blocked() {
        let terrain = TerrainLayer {
            num_cols: 2,
            num_rows: 2,
            bytes_per_row: 12,
            data: vec![0x11; 12 * 23],
        };
        let grid = WorldGrid::from_terrain(&terrain, 23).unwrap();
        // Last byte of the layer is the final packed pair
        assert!(grid.is_walkable(23, 22));
        assert!(!grid.is_walkable(24, 22));
    }

    #[test]
    fn test_terrain_nibbles_map_to_adjacent_columns() {
        let mut data = vec![0u8; 12 * 23];
        data[0] = 0x20; // col 0 blocked, col 1 walkable
        data[1] = 0x03; // col 2 walkable, col 3 blocked
        let terrain = TerrainLayer {
            num_cols: 2,
            num_rows: 2,
            bytes_per_row: 12,
            data,
        };
        let grid = WorldGrid::from_terrain(&terrain, 23).unwrap();
        assert_eq!(grid.get(0, 0), Some(0));
        assert_eq!(grid.get(1, 0), Some(1));
        assert_eq!(grid.get(2, 0), Some(1));
        assert_eq!(grid.get(3, 0), Some(0));
    }

    #[test]
    fn test_truncated_terrain_leaves_rest_blocked() {
        let terrain = TerrainLayer {
            num_cols: 2,
            num_rows: 2,
            bytes_per_row: 12,
            data: vec![0xFF; 12],
        };
        let grid = WorldGrid::from_terrain(&terrain, 23).unwrap();
        assert!(grid.is_walkable(5, 0));
        assert!(!grid.is_walkable(5, 1));
    }

    #[test]
    fn test_rejects_degenerate_terrain() {
        let terrain = TerrainLayer {
            num_cols: 1,
            num_rows: 4,
            bytes_per_row: 4,
            data: vec![],
        };
        assert!(matches!(
            WorldGrid::from_terrain(&terrain, 23),
            Err(AgentError::InvalidTerrain(_))
        ));
        assert!(WorldGrid::from_cells(3, 3, vec![1; 8]).is_err());
    }

    #[test]
    fn test_nearest_walkable_snaps_off_wall() {
        let grid = WorldGrid::from_ascii(&["###..", "###..", "#####"]);
        assert_eq!(
            grid.nearest_walkable(Vec2::new(2.0, 0.0), 2),
            Some(CellKey::new(3, 0))
        );
        assert_eq!(grid.nearest_walkable(Vec2::new(0.0, 2.0), 1), None);
    }
}
