//! Rove World - chunk streaming
//!
//! The tile world is streamed in fixed-size chunks around a moving
//! observer:
//!
//! - [`chunk`] - chunk coordinates, tile layers, resident chunks
//! - [`data`] - the external chunk resource format (JSON)
//! - [`generator`] - deterministic fallback generation
//! - [`source`] - asynchronous chunk storage backends
//! - [`store`] - the [`ChunkStore`]: load window, eviction, collision layers
//!
//! Storage failures never surface to callers; a chunk that cannot be
//! fetched is generated deterministically from its coordinates instead.

pub mod chunk;
pub mod data;
pub mod generator;
pub mod source;
pub mod store;

pub mod prelude {
    pub use crate::chunk::{Chunk, ChunkCoord, LayerKind, TileLayer};
    pub use crate::data::{ChunkData, LayerData};
    pub use crate::generator::SeededGenerator;
    pub use crate::source::{ChunkSource, DirectorySource, FetchError, MemorySource};
    pub use crate::store::{ChunkStore, CollisionGrid, RefreshDelta};
}

pub use prelude::*;
