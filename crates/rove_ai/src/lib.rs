//! Rove AI - NPC behavior
//!
//! NPCs are pooled entities driven by a small explicit state machine
//! (idle / patrol / follow / interact). The [`BehaviorController`] owns the
//! pool, rolls behaviors on timers, issues throttled path requests and
//! integrates movement; pathfinding unavailability degrades to
//! straight-line steering without ever stalling an entity.

pub mod controller;
pub mod npc;
pub mod state;

pub mod prelude {
    pub use crate::controller::{BehaviorController, NpcRecord};
    pub use crate::npc::{BehaviorTarget, Npc, NpcConfig};
    pub use crate::state::{transition, BehaviorEvent, NpcState};
}

pub use prelude::*;
