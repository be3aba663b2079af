//! Chunk store
//!
//! Owns the active chunk set and the load/unload policy driven by observer
//! position. Every frame-facing operation is cheap when nothing changed;
//! the expensive paths (fetch, generation) only run for chunks entering
//! the window.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use glam::Vec2;

use rove_core::config::WorldConfig;
use rove_core::events::{EventSender, WorldEvent};

use crate::chunk::{Chunk, ChunkCoord, TileLayer, TILE_EMPTY};
use crate::generator::SeededGenerator;
use crate::source::ChunkSource;

/// Result of a window refresh: chunks that entered and left the active set
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RefreshDelta {
    pub loaded: Vec<ChunkCoord>,
    pub unloaded: Vec<ChunkCoord>,
}

impl RefreshDelta {
    /// Whether the refresh changed nothing
    pub fn is_empty(&self) -> bool {
        self.loaded.is_empty() && self.unloaded.is_empty()
    }
}

/// Walkability rows covering the active window's bounding rect.
///
/// Cells are tile ids from the collidable layer; `TILE_EMPTY` is walkable.
/// Cells under unloaded chunks (corners of a circular window) are filled
/// with [`CollisionGrid::UNLOADED`] so paths never cross unknown ground.
#[derive(Clone, Debug, PartialEq)]
pub struct CollisionGrid {
    /// Origin of the grid in tile units (world tile coordinates)
    pub origin_x: i32,
    pub origin_y: i32,
    /// Row-major cell values, indexed `[row][col]`
    pub rows: Vec<Vec<u16>>,
}

impl CollisionGrid {
    /// Sentinel for cells outside any loaded chunk
    pub const UNLOADED: u16 = u16::MAX;
}

/// Streaming cache of resident chunks
pub struct ChunkStore {
    chunk_size: u32,
    chunk_size_px: f32,
    source: Option<Arc<dyn ChunkSource>>,
    generator: SeededGenerator,
    active: HashMap<ChunkCoord, Chunk>,
    events: EventSender<WorldEvent>,
}

impl ChunkStore {
    /// Create a store with no external source (pure procedural world)
    pub fn new(config: &WorldConfig, events: EventSender<WorldEvent>) -> Self {
        Self {
            chunk_size: config.chunk_size,
            chunk_size_px: config.chunk_size_px(),
            source: None,
            generator: SeededGenerator::new(config.chunk_size, config.tile_size),
            active: HashMap::new(),
            events,
        }
    }

    /// Attach an external chunk source, tried before generation
    pub fn with_source(mut self, source: Arc<dyn ChunkSource>) -> Self {
        self.set_source(source);
        self
    }

    /// Install an external chunk source after construction
    pub fn set_source(&mut self, source: Arc<dyn ChunkSource>) {
        self.source = Some(source);
    }

    /// Chunk coordinates within `radius` (Euclidean, chunk units) of `center`
    pub fn window(center: ChunkCoord, radius: i32) -> Vec<ChunkCoord> {
        let mut chunks = Vec::new();
        for dy in -radius..=radius {
            for dx in -radius..=radius {
                let dist = ((dx * dx + dy * dy) as f32).sqrt();
                if dist <= radius as f32 {
                    chunks.push(ChunkCoord::new(center.x + dx, center.y + dy));
                }
            }
        }
        chunks
    }

    /// Recompute the load window around the observer and apply the delta.
    ///
    /// Unloads every active chunk outside the window, then loads every
    /// windowed chunk not yet active. Safe to call at high frequency; a
    /// no-op when the window is unchanged.
    pub async fn refresh(&mut self, observer: Vec2, radius: i32) -> RefreshDelta {
        let center = ChunkCoord::from_world(observer, self.chunk_size_px);
        let target: HashSet<ChunkCoord> = Self::window(center, radius).into_iter().collect();

        let to_unload: Vec<ChunkCoord> = self
            .active
            .keys()
            .filter(|c| !target.contains(c))
            .copied()
            .collect();
        for coord in &to_unload {
            self.unload(*coord);
        }

        let to_load: Vec<ChunkCoord> = target
            .iter()
            .filter(|c| !self.active.contains_key(c))
            .copied()
            .collect();
        for coord in &to_load {
            self.load(*coord).await;
        }

        RefreshDelta {
            loaded: to_load,
            unloaded: to_unload,
        }
    }

    /// Load a chunk, fetching from the source and falling back to
    /// deterministic generation on any failure.
    ///
    /// Idempotent: a second call for an active chunk returns the existing
    /// instance without side effects. Never fails; the result is always a
    /// usable chunk.
    pub async fn load(&mut self, coord: ChunkCoord) -> &Chunk {
        if self.active.contains_key(&coord) {
            return &self.active[&coord];
        }

        let data = match &self.source {
            Some(source) => match source.fetch(coord).await {
                Ok(data) => data,
                Err(e) => {
                    log::debug!("chunk {coord} fetch failed ({e}), generating");
                    self.generator.generate(coord)
                }
            },
            None => self.generator.generate(coord),
        };

        let chunk = data.into_chunk(coord);
        self.active.insert(coord, chunk);
        self.events.send(WorldEvent::ChunkLoaded {
            chunk_x: coord.x,
            chunk_y: coord.y,
        });
        log::debug!("chunk {coord} loaded ({} active)", self.active.len());

        &self.active[&coord]
    }

    /// Drop a chunk and everything it owns. No-op for a non-active chunk,
    /// which also covers loads that completed after their window passed.
    pub fn unload(&mut self, coord: ChunkCoord) {
        if self.active.remove(&coord).is_none() {
            return;
        }
        self.events.send(WorldEvent::ChunkUnloaded {
            chunk_x: coord.x,
            chunk_y: coord.y,
        });
        log::debug!("chunk {coord} unloaded ({} active)", self.active.len());
    }

    /// Unload everything
    pub fn clear(&mut self) {
        let coords: Vec<ChunkCoord> = self.active.keys().copied().collect();
        for coord in coords {
            self.unload(coord);
        }
    }

    /// Whether a coordinate is currently resident
    pub fn is_active(&self, coord: ChunkCoord) -> bool {
        self.active.contains_key(&coord)
    }

    /// The resident chunk at a coordinate
    pub fn chunk(&self, coord: ChunkCoord) -> Option<&Chunk> {
        self.active.get(&coord)
    }

    /// The resident chunk containing a world position
    pub fn chunk_at(&self, pos: Vec2) -> Option<&Chunk> {
        self.chunk(ChunkCoord::from_world(pos, self.chunk_size_px))
    }

    /// Currently active coordinates
    pub fn active_coords(&self) -> Vec<ChunkCoord> {
        self.active.keys().copied().collect()
    }

    /// Number of resident chunks
    pub fn len(&self) -> usize {
        self.active.len()
    }

    /// Check if no chunks are resident
    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    /// Every active chunk's collidable layer, for collision pairing rebuilds
    pub fn collision_layers(&self) -> Vec<(ChunkCoord, &TileLayer)> {
        self.active
            .iter()
            .filter_map(|(coord, chunk)| chunk.collision_layer().map(|l| (*coord, l)))
            .collect()
    }

    /// Walkability grid covering the bounding rect of the active window,
    /// for the path planner. `None` while no chunks are resident.
    pub fn collision_grid(&self) -> Option<CollisionGrid> {
        let min_x = self.active.keys().map(|c| c.x).min()?;
        let max_x = self.active.keys().map(|c| c.x).max()?;
        let min_y = self.active.keys().map(|c| c.y).min()?;
        let max_y = self.active.keys().map(|c| c.y).max()?;

        let size = self.chunk_size as usize;
        let cols = (max_x - min_x + 1) as usize * size;
        let rows_n = (max_y - min_y + 1) as usize * size;
        let mut rows = vec![vec![CollisionGrid::UNLOADED; cols]; rows_n];

        for (coord, chunk) in &self.active {
            let base_col = (coord.x - min_x) as usize * size;
            let base_row = (coord.y - min_y) as usize * size;
            let collision = chunk.collision_layer();

            for ty in 0..self.chunk_size {
                for tx in 0..self.chunk_size {
                    let value = match collision {
                        Some(layer) => layer.tile(tx, ty).unwrap_or(TILE_EMPTY),
                        None => TILE_EMPTY,
                    };
                    rows[base_row + ty as usize][base_col + tx as usize] = value;
                }
            }
        }

        Some(CollisionGrid {
            origin_x: min_x * self.chunk_size as i32,
            origin_y: min_y * self.chunk_size as i32,
            rows,
        })
    }
}
