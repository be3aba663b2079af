//! Typed world events
//!
//! Components push events while they work; the orchestrator drains the
//! channel once per frame and reacts (collision rebuilds, chunk population,
//! forwarding to the embedding UI).

use crossbeam_channel::{unbounded, Receiver, Sender};

/// Events emitted by the core toward the orchestrator and embedding UI
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorldEvent {
    /// A chunk finished loading and joined the active set
    ChunkLoaded { chunk_x: i32, chunk_y: i32 },
    /// A chunk was evicted from the active set
    ChunkUnloaded { chunk_x: i32, chunk_y: i32 },
    /// An NPC was acquired from the pool and placed in the world
    NpcSpawned { id: u64 },
}

/// Sending half of an [`EventChannel`], cheap to clone into components
#[derive(Clone)]
pub struct EventSender<E> {
    tx: Sender<E>,
}

impl<E> EventSender<E> {
    /// Send an event. Dropped receivers are tolerated; the event is lost.
    pub fn send(&self, event: E) {
        let _ = self.tx.send(event);
    }
}

/// A single-type event channel, drained once per frame by its owner
pub struct EventChannel<E> {
    tx: Sender<E>,
    rx: Receiver<E>,
}

impl<E> EventChannel<E> {
    /// Create a new channel
    pub fn new() -> Self {
        let (tx, rx) = unbounded();
        Self { tx, rx }
    }

    /// Get a sender for components that emit into this channel
    pub fn sender(&self) -> EventSender<E> {
        EventSender {
            tx: self.tx.clone(),
        }
    }

    /// Send an event directly
    pub fn send(&self, event: E) {
        let _ = self.tx.send(event);
    }

    /// Receive one pending event, if any
    pub fn receive(&self) -> Option<E> {
        self.rx.try_recv().ok()
    }

    /// Drain all pending events
    pub fn drain(&self) -> Vec<E> {
        let mut events = Vec::new();
        while let Ok(event) = self.rx.try_recv() {
            events.push(event);
        }
        events
    }

    /// Number of pending events
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    /// Check if there are no pending events
    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}

impl<E> Default for EventChannel<E> {
    fn default() -> Self {
        Self::new()
    }
}
