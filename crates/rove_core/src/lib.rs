//! Rove Core - shared primitives for the streamed world
//!
//! This crate carries the pieces every other Rove crate leans on:
//!
//! - [`WorldConfig`] - one immutable configuration value, passed explicitly
//! - [`WorldEvent`] / [`EventChannel`] - typed events drained once per frame
//! - [`DepthSortable`] / [`DepthSorter`] - y-derived draw ordering

pub mod config;
pub mod depth;
pub mod events;

pub mod prelude {
    pub use crate::config::WorldConfig;
    pub use crate::depth::{DepthSortable, DepthSorter};
    pub use crate::events::{EventChannel, EventSender, WorldEvent};
}

pub use prelude::*;
