//! Chunk model
//!
//! A chunk is the unit of streaming granularity: a fixed-size block of the
//! tile world identified by integer coordinates, owning one grid of tile
//! ids per named layer.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Empty cell (no tile).
pub const TILE_EMPTY: u16 = 0;
/// Grass ground tile.
pub const TILE_GRASS: u16 = 1;
/// Dirt ground tile.
pub const TILE_DIRT: u16 = 2;
/// Stone obstacle tile.
pub const TILE_STONE: u16 = 3;
/// Water obstacle tile.
pub const TILE_WATER: u16 = 4;
/// Sand ground tile.
pub const TILE_SAND: u16 = 5;

/// Chunk coordinate (in chunks, not tiles).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChunkCoord {
    pub x: i32,
    pub y: i32,
}

impl ChunkCoord {
    /// Create a new chunk coordinate
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Chunk containing a world position, given the chunk edge in world units
    pub fn from_world(pos: Vec2, chunk_size_px: f32) -> Self {
        Self {
            x: (pos.x / chunk_size_px).floor() as i32,
            y: (pos.y / chunk_size_px).floor() as i32,
        }
    }

    /// World-space origin (top-left corner) of this chunk
    pub fn origin(self, chunk_size_px: f32) -> Vec2 {
        Vec2::new(self.x as f32 * chunk_size_px, self.y as f32 * chunk_size_px)
    }

    /// Euclidean distance to another coordinate, in chunk units
    pub fn distance_to(self, other: ChunkCoord) -> f32 {
        let dx = (self.x - other.x) as f32;
        let dy = (self.y - other.y) as f32;
        (dx * dx + dy * dy).sqrt()
    }

    /// Key used to address this chunk in external storage
    pub fn storage_key(self) -> String {
        format!("{}_{}", self.x, self.y)
    }
}

impl core::fmt::Display for ChunkCoord {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Named layer within a chunk
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LayerKind {
    /// Base terrain, never collides
    Ground,
    /// Obstacles; the collidable layer
    World,
    /// Decorative props drawn above the world layer
    Props,
}

impl LayerKind {
    /// Layer name as it appears in the resource format
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ground => "ground",
            Self::World => "world",
            Self::Props => "props",
        }
    }

    /// Parse a resource-format layer name
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "ground" => Some(Self::Ground),
            "world" => Some(Self::World),
            "props" => Some(Self::Props),
            _ => None,
        }
    }
}

/// One row-major grid of tile-type ids within a chunk
#[derive(Clone, Debug, PartialEq)]
pub struct TileLayer {
    pub kind: LayerKind,
    /// Grid width in tiles
    pub width: u32,
    /// Grid height in tiles
    pub height: u32,
    /// Row-major tile ids, `width * height` entries
    pub data: Vec<u16>,
    /// Whether non-empty tiles in this layer block movement
    pub collides: bool,
}

impl TileLayer {
    /// Create a layer, padding or truncating `data` to `width * height`
    pub fn new(kind: LayerKind, width: u32, height: u32, mut data: Vec<u16>, collides: bool) -> Self {
        let expected = (width * height) as usize;
        if data.len() != expected {
            log::warn!(
                "{} layer has {} tiles, expected {}; padding with empty",
                kind.as_str(),
                data.len(),
                expected
            );
            data.resize(expected, TILE_EMPTY);
        }
        Self {
            kind,
            width,
            height,
            data,
            collides,
        }
    }

    /// Tile id at layer-local coordinates
    pub fn tile(&self, x: u32, y: u32) -> Option<u16> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.data[(y * self.width + x) as usize])
    }

    /// Whether the cell blocks movement
    pub fn is_obstacle(&self, x: u32, y: u32) -> bool {
        self.collides && self.tile(x, y).map(|t| t != TILE_EMPTY).unwrap_or(false)
    }
}

/// A resident chunk: coordinate plus its named layers.
///
/// Dropping the chunk releases all owned layer data; a chunk is never
/// partially unloaded.
#[derive(Clone, Debug)]
pub struct Chunk {
    pub coord: ChunkCoord,
    pub layers: Vec<TileLayer>,
}

impl Chunk {
    /// Look up a layer by kind
    pub fn layer(&self, kind: LayerKind) -> Option<&TileLayer> {
        self.layers.iter().find(|l| l.kind == kind)
    }

    /// The collidable layer, if any
    pub fn collision_layer(&self) -> Option<&TileLayer> {
        self.layers.iter().find(|l| l.collides)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_world_floors() {
        assert_eq!(
            ChunkCoord::from_world(Vec2::new(0.0, 0.0), 512.0),
            ChunkCoord::new(0, 0)
        );
        assert_eq!(
            ChunkCoord::from_world(Vec2::new(-0.5, 512.0), 512.0),
            ChunkCoord::new(-1, 1)
        );
    }

    #[test]
    fn test_origin_round_trip() {
        let coord = ChunkCoord::new(-4, 9);
        let origin = coord.origin(512.0);
        assert_eq!(ChunkCoord::from_world(origin, 512.0), coord);
    }

    #[test]
    fn test_storage_key() {
        assert_eq!(ChunkCoord::new(-3, 12).storage_key(), "-3_12");
    }

    #[test]
    fn test_layer_padding() {
        let layer = TileLayer::new(LayerKind::Ground, 4, 4, vec![TILE_GRASS; 10], false);
        assert_eq!(layer.data.len(), 16);
        assert_eq!(layer.tile(3, 3), Some(TILE_EMPTY));
    }

    #[test]
    fn test_obstacle_requires_collides() {
        let solid = TileLayer::new(LayerKind::World, 2, 2, vec![TILE_STONE; 4], true);
        let decor = TileLayer::new(LayerKind::Props, 2, 2, vec![TILE_STONE; 4], false);

        assert!(solid.is_obstacle(0, 0));
        assert!(!decor.is_obstacle(0, 0));
        assert!(!solid.is_obstacle(5, 0));
    }
}
