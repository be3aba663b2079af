//! World configuration
//!
//! A single immutable value built at startup and handed explicitly to every
//! component. Persistence lives in `rove_gamestate`; nothing here touches
//! I/O or global state.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Configuration for a world session.
///
/// All empirically tuned intervals are fields rather than constants; the
/// defaults match the values the simulation was tuned with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldConfig {
    /// Tile edge length in world units
    pub tile_size: u32,
    /// Chunk edge length in tiles
    pub chunk_size: u32,
    /// Chunk loading radius around the observer, in chunks
    pub load_radius: i32,
    /// Minimum interval between chunk window refreshes (ms)
    pub chunk_refresh_interval_ms: u64,
    /// Minimum interval between path replans per entity (ms)
    pub path_replan_interval_ms: u64,
    /// Search iterations the path planner may spend per pump
    pub path_iterations_per_pump: u32,
    /// Arrival threshold for waypoints and patrol points, in world units
    pub arrival_threshold: f32,
    /// Number of NPCs pre-constructed in the pool
    pub npc_pool_size: usize,
    /// Range at which the observer is noticed by NPCs, in world units
    pub interaction_range: f32,
    /// Behavior timer range while idling (ms)
    pub idle_timer_ms: (u64, u64),
    /// Behavior timer range while wandering (ms)
    pub wander_timer_ms: (u64, u64),
    /// Seed for behavior selection rolls
    pub behavior_seed: u64,
    /// Whether NPCs issue path requests at all
    pub pathfinding_enabled: bool,
    /// Key of the single persisted save slot
    pub save_key: String,
    /// Hour of day used when no save data exists
    pub start_hour: f32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            tile_size: 32,
            chunk_size: 16,
            load_radius: 2,
            chunk_refresh_interval_ms: 100,
            path_replan_interval_ms: 500,
            path_iterations_per_pump: 1000,
            arrival_threshold: 10.0,
            npc_pool_size: 15,
            interaction_range: 48.0,
            idle_timer_ms: (3_000, 8_000),
            wander_timer_ms: (5_000, 12_000),
            behavior_seed: 0x5eed_ca57,
            pathfinding_enabled: true,
            save_key: "rove_save".to_string(),
            start_hour: 12.0,
        }
    }
}

impl WorldConfig {
    /// Set the chunk loading radius
    pub fn with_load_radius(mut self, radius: i32) -> Self {
        self.load_radius = radius;
        self
    }

    /// Set tile and chunk geometry
    pub fn with_geometry(mut self, tile_size: u32, chunk_size: u32) -> Self {
        self.tile_size = tile_size;
        self.chunk_size = chunk_size;
        self
    }

    /// Set the chunk refresh throttle
    pub fn with_refresh_interval(mut self, ms: u64) -> Self {
        self.chunk_refresh_interval_ms = ms;
        self
    }

    /// Set the per-entity replan throttle
    pub fn with_replan_interval(mut self, ms: u64) -> Self {
        self.path_replan_interval_ms = ms;
        self
    }

    /// Set the behavior RNG seed
    pub fn with_behavior_seed(mut self, seed: u64) -> Self {
        self.behavior_seed = seed;
        self
    }

    /// Disable pathfinding, forcing straight-line steering
    pub fn without_pathfinding(mut self) -> Self {
        self.pathfinding_enabled = false;
        self
    }

    /// Chunk edge length in world units
    pub fn chunk_size_px(&self) -> f32 {
        (self.chunk_size * self.tile_size) as f32
    }

    /// Chunk coordinate containing a world position
    pub fn world_to_chunk(&self, pos: Vec2) -> (i32, i32) {
        let size = self.chunk_size_px();
        (
            (pos.x / size).floor() as i32,
            (pos.y / size).floor() as i32,
        )
    }

    /// World-space origin of a chunk coordinate
    pub fn chunk_to_world(&self, chunk_x: i32, chunk_y: i32) -> Vec2 {
        let size = self.chunk_size_px();
        Vec2::new(chunk_x as f32 * size, chunk_y as f32 * size)
    }
}
