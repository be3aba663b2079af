//! Rove Nav - cooperative grid pathfinding
//!
//! The planner turns world coordinates into walkability-grid searches and
//! resolves them asynchronously relative to the calling frame: requests
//! return a [`PathTicket`](planner::PathTicket) immediately, the search
//! advances under an iteration budget each time the orchestrator pumps the
//! planner, and callers poll the ticket on later frames.
//!
//! Pathfinding unavailability never halts movement - a degraded planner
//! resolves every request to `None` and callers fall back to straight-line
//! steering.

pub mod grid;
pub mod planner;

pub mod prelude {
    pub use crate::grid::WalkGrid;
    pub use crate::planner::{PathPlanner, PathTicket, Waypoint};
}

pub use prelude::*;
