//! Chunk storage backends
//!
//! A [`ChunkSource`] hands back raw chunk documents by coordinate. Fetches
//! are asynchronous and may fail; the store recovers every failure by
//! generating the chunk instead, so source errors never travel further
//! than a log line.

use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;
use parking_lot::RwLock;
use thiserror::Error;

use crate::chunk::ChunkCoord;
use crate::data::ChunkData;

/// Errors from a chunk fetch
#[derive(Debug, Error)]
pub enum FetchError {
    /// No document stored for the coordinate
    #[error("chunk {0} not found")]
    NotFound(String),

    /// Underlying I/O failure
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Document exists but does not parse
    #[error("parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Asynchronous chunk storage
#[async_trait]
pub trait ChunkSource: Send + Sync {
    /// Fetch the document for a coordinate, keyed `"{x}_{y}"`
    async fn fetch(&self, coord: ChunkCoord) -> Result<ChunkData, FetchError>;
}

/// Reads `"{x}_{y}.json"` documents from a directory
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    /// Create a source rooted at a directory
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl ChunkSource for DirectorySource {
    async fn fetch(&self, coord: ChunkCoord) -> Result<ChunkData, FetchError> {
        let path = self.root.join(format!("{}.json", coord.storage_key()));
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(FetchError::NotFound(coord.storage_key()));
            }
            Err(e) => return Err(e.into()),
        };
        Ok(serde_json::from_slice(&bytes)?)
    }
}

/// In-memory source for tests and embedded worlds
#[derive(Default)]
pub struct MemorySource {
    chunks: RwLock<HashMap<ChunkCoord, ChunkData>>,
}

impl MemorySource {
    /// Create an empty source
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a document
    pub fn insert(&self, coord: ChunkCoord, data: ChunkData) {
        self.chunks.write().insert(coord, data);
    }

    /// Number of stored documents
    pub fn len(&self) -> usize {
        self.chunks.read().len()
    }

    /// Check if the source holds nothing
    pub fn is_empty(&self) -> bool {
        self.chunks.read().is_empty()
    }
}

#[async_trait]
impl ChunkSource for MemorySource {
    async fn fetch(&self, coord: ChunkCoord) -> Result<ChunkData, FetchError> {
        self.chunks
            .read()
            .get(&coord)
            .cloned()
            .ok_or_else(|| FetchError::NotFound(coord.storage_key()))
    }
}
