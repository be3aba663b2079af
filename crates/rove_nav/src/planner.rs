//! Path planner
//!
//! Wraps an incremental A* search engine behind a request/ticket API.
//! Requests are validated immediately (planner not ready, endpoint off the
//! grid) and otherwise queued; each `pump` spends the engine's iteration
//! budget advancing queued searches in arrival order, so one frame never
//! pays for a whole search.

use std::collections::{BinaryHeap, HashMap, HashSet, VecDeque};

use crossbeam_channel::{bounded, Receiver, Sender};
use glam::Vec2;
use thiserror::Error;

use crate::grid::WalkGrid;

/// A world-space point on a computed path, one per traversed grid cell
pub type Waypoint = Vec2;

/// A resolved path: `None` when unreachable or the planner is degraded
pub type PathResult = Option<Vec<Waypoint>>;

const SQRT_2: f32 = std::f32::consts::SQRT_2;

/// Engine construction errors
#[derive(Debug, Error)]
pub enum EngineError {
    /// The per-pump iteration budget must allow progress
    #[error("iteration budget must be non-zero")]
    ZeroBudget,
}

/// The underlying incremental search engine.
///
/// Initialization validates its budget; a failed initialization leaves the
/// owning planner permanently degraded.
struct SearchEngine {
    iterations_per_pump: u32,
}

impl SearchEngine {
    fn initialize(iterations_per_pump: u32) -> Result<Self, EngineError> {
        if iterations_per_pump == 0 {
            return Err(EngineError::ZeroBudget);
        }
        Ok(Self {
            iterations_per_pump,
        })
    }
}

/// Pending path request held by the caller.
///
/// Poll once per frame; the ticket resolves at most once.
pub struct PathTicket {
    rx: Receiver<PathResult>,
}

impl PathTicket {
    fn pending() -> (Sender<PathResult>, Self) {
        let (tx, rx) = bounded(1);
        (tx, Self { rx })
    }

    fn resolved(result: PathResult) -> Self {
        let (tx, ticket) = Self::pending();
        let _ = tx.send(result);
        ticket
    }

    /// Take the result if the search has finished
    pub fn poll(&self) -> Option<PathResult> {
        self.rx.try_recv().ok()
    }
}

#[derive(Clone, Copy)]
struct Node {
    cell: (i32, i32),
    f_score: f32,
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.cell == other.cell
    }
}

impl Eq for Node {}

impl PartialOrd for Node {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Node {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        other
            .f_score
            .partial_cmp(&self.f_score)
            .unwrap_or(std::cmp::Ordering::Equal)
    }
}

enum SearchStep {
    /// Budget ran out before the search finished
    Paused,
    /// Search finished with the given cells (or unreachable)
    Done(Option<Vec<(i32, i32)>>),
}

struct Search {
    goal: (i32, i32),
    open: BinaryHeap<Node>,
    g_score: HashMap<(i32, i32), f32>,
    came_from: HashMap<(i32, i32), (i32, i32)>,
    closed: HashSet<(i32, i32)>,
    tx: Sender<PathResult>,
}

impl Search {
    fn new(start: (i32, i32), goal: (i32, i32), tx: Sender<PathResult>) -> Self {
        let mut search = Self {
            goal,
            open: BinaryHeap::new(),
            g_score: HashMap::new(),
            came_from: HashMap::new(),
            closed: HashSet::new(),
            tx,
        };
        search.g_score.insert(start, 0.0);
        search.open.push(Node {
            cell: start,
            f_score: heuristic(start, goal),
        });
        search
    }

    fn advance(&mut self, grid: &WalkGrid, walkable: &[u16], budget: &mut u32) -> SearchStep {
        while *budget > 0 {
            let Some(current) = self.open.pop() else {
                return SearchStep::Done(None);
            };
            *budget -= 1;

            if current.cell == self.goal {
                return SearchStep::Done(Some(self.reconstruct(current.cell)));
            }

            if !self.closed.insert(current.cell) {
                continue;
            }

            let current_g = *self.g_score.get(&current.cell).unwrap_or(&f32::MAX);

            for (dx, dy) in NEIGHBORS {
                let neighbor = (current.cell.0 + dx, current.cell.1 + dy);
                if self.closed.contains(&neighbor) {
                    continue;
                }
                let Some(value) = grid.cell(neighbor.0, neighbor.1) else {
                    continue;
                };
                if !walkable.contains(&value) {
                    continue;
                }

                let step = if dx != 0 && dy != 0 { SQRT_2 } else { 1.0 };
                let tentative = current_g + step;
                if tentative < *self.g_score.get(&neighbor).unwrap_or(&f32::MAX) {
                    self.came_from.insert(neighbor, current.cell);
                    self.g_score.insert(neighbor, tentative);
                    self.open.push(Node {
                        cell: neighbor,
                        f_score: tentative + heuristic(neighbor, self.goal),
                    });
                }
            }
        }
        SearchStep::Paused
    }

    fn reconstruct(&self, end: (i32, i32)) -> Vec<(i32, i32)> {
        let mut cells = vec![end];
        let mut current = end;
        while let Some(&prev) = self.came_from.get(&current) {
            cells.push(prev);
            current = prev;
        }
        cells.reverse();
        cells
    }
}

const NEIGHBORS: [(i32, i32); 8] = [
    (-1, 0),
    (1, 0),
    (0, -1),
    (0, 1),
    (-1, -1),
    (1, -1),
    (-1, 1),
    (1, 1),
];

fn heuristic(a: (i32, i32), b: (i32, i32)) -> f32 {
    let dx = (a.0 - b.0) as f32;
    let dy = (a.1 - b.1) as f32;
    (dx * dx + dy * dy).sqrt()
}

/// Asynchronous grid pathfinder.
///
/// Becomes ready once a grid is installed and the search engine
/// initialized successfully; a failed initialization is permanent and
/// every request thereafter resolves to `None` without erroring.
pub struct PathPlanner {
    tile_size: f32,
    engine: Option<SearchEngine>,
    grid: Option<WalkGrid>,
    walkable: Vec<u16>,
    queue: VecDeque<Search>,
}

impl PathPlanner {
    /// Create a planner for a tile size with a per-pump iteration budget
    pub fn new(tile_size: f32, iterations_per_pump: u32) -> Self {
        let engine = match SearchEngine::initialize(iterations_per_pump) {
            Ok(engine) => Some(engine),
            Err(e) => {
                log::warn!("search engine unavailable, pathfinding disabled: {e}");
                None
            }
        };
        Self {
            tile_size,
            engine,
            grid: None,
            walkable: Vec::new(),
            queue: VecDeque::new(),
        }
    }

    /// Install or replace the walkability grid
    pub fn configure(&mut self, grid: WalkGrid, walkable: Vec<u16>) {
        if self.engine.is_none() {
            log::debug!("configure ignored: engine failed to initialize");
            return;
        }
        self.grid = Some(grid);
        self.walkable = walkable;
    }

    /// Whether requests can currently be served
    pub fn is_ready(&self) -> bool {
        self.engine.is_some() && self.grid.is_some()
    }

    /// Number of searches waiting on pump budget
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Request a path between two world positions.
    ///
    /// Resolves immediately to `None` when the planner is not ready or
    /// either endpoint falls outside the grid; otherwise the returned
    /// ticket resolves on a later pump.
    pub fn request_path(&mut self, start: Vec2, end: Vec2) -> PathTicket {
        if !self.is_ready() {
            return PathTicket::resolved(None);
        }

        let start_cell = self.to_cell(start);
        let end_cell = self.to_cell(end);
        let grid = self.grid.as_ref().expect("ready planner has a grid");

        if !grid.has_row(start_cell.1)
            || !grid.has_row(end_cell.1)
            || !grid.contains(start_cell.0, start_cell.1)
            || !grid.contains(end_cell.0, end_cell.1)
        {
            return PathTicket::resolved(None);
        }

        let (tx, ticket) = PathTicket::pending();
        self.queue.push_back(Search::new(start_cell, end_cell, tx));
        ticket
    }

    /// Advance queued searches under the engine's iteration budget.
    ///
    /// Called once per frame by the orchestrator. Searches resolve in
    /// arrival order; a search that exhausts the budget resumes on the
    /// next pump.
    pub fn pump(&mut self) {
        let Some(engine) = &self.engine else {
            // A degraded planner accepted no requests; resolve any stragglers
            while let Some(search) = self.queue.pop_front() {
                let _ = search.tx.send(None);
            }
            return;
        };

        let mut budget = engine.iterations_per_pump;
        while budget > 0 {
            let Some(grid) = self.grid.as_ref() else {
                break;
            };
            let Some(search) = self.queue.front_mut() else {
                break;
            };

            match search.advance(grid, &self.walkable, &mut budget) {
                SearchStep::Paused => break,
                SearchStep::Done(cells) => {
                    let result = cells.map(|cells| {
                        cells
                            .into_iter()
                            .map(|cell| self.cell_center(cell))
                            .collect()
                    });
                    let search = self.queue.pop_front().expect("front search exists");
                    let _ = search.tx.send(result);
                }
            }
        }
    }

    fn to_cell(&self, pos: Vec2) -> (i32, i32) {
        (
            (pos.x / self.tile_size).floor() as i32,
            (pos.y / self.tile_size).floor() as i32,
        )
    }

    fn cell_center(&self, cell: (i32, i32)) -> Vec2 {
        Vec2::new(
            cell.0 as f32 * self.tile_size + self.tile_size / 2.0,
            cell.1 as f32 * self.tile_size + self.tile_size / 2.0,
        )
    }
}
