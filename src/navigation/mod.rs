//! Spatial layer: walkability grid, exploration chunks, A* and path following

pub mod chunks;
pub mod grid;
pub mod map;
pub mod path;
pub mod pathfinding;

pub use chunks::{Chunk, ChunkIndex};
pub use grid::WorldGrid;
pub use map::AreaMap;
pub use path::{FollowParams, FollowStep, Path};
pub use pathfinding::find_path;
