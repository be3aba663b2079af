//! Rove Runtime - the world orchestrator
//!
//! Ties the components into one cooperative per-frame loop: NPC behavior
//! first, depth sorting after all position updates, then throttled chunk
//! refreshes, event-driven collision rebuilds and planner pumping. The
//! embedding (renderer, input, physics) talks to [`World`] and consumes
//! the events it surfaces.

pub mod world;

pub mod prelude {
    pub use crate::world::{Observer, World};
    pub use rove_ai::prelude::*;
    pub use rove_core::prelude::*;
    pub use rove_gamestate::{FileStore, MemoryStore, SaveData, SaveManager};
    pub use rove_nav::prelude::*;
    pub use rove_pool::{EntityPool, Handle, Recyclable};
    pub use rove_world::prelude::*;
}

pub use prelude::*;
