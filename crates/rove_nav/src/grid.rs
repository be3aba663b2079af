//! Walkability grid
//!
//! A rectangular field of tile ids in world tile coordinates. The planner
//! treats a cell as walkable when its id is in the configured walkable set;
//! cells outside the grid do not exist and reject requests.

/// Rectangular walkability field
#[derive(Clone, Debug, PartialEq)]
pub struct WalkGrid {
    origin_x: i32,
    origin_y: i32,
    width: usize,
    height: usize,
    rows: Vec<Vec<u16>>,
}

impl WalkGrid {
    /// Build a grid from row-major rows anchored at an origin in world
    /// tile coordinates. Ragged rows are padded to the widest row.
    pub fn new(origin_x: i32, origin_y: i32, mut rows: Vec<Vec<u16>>) -> Self {
        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        for row in &mut rows {
            if row.len() != width {
                log::warn!("padding ragged grid row ({} -> {} cells)", row.len(), width);
                row.resize(width, u16::MAX);
            }
        }
        let height = rows.len();
        Self {
            origin_x,
            origin_y,
            width,
            height,
            rows,
        }
    }

    /// Grid width in cells
    pub fn width(&self) -> usize {
        self.width
    }

    /// Grid height in cells
    pub fn height(&self) -> usize {
        self.height
    }

    /// Whether a world tile coordinate falls inside the grid
    pub fn contains(&self, cell_x: i32, cell_y: i32) -> bool {
        let local_x = cell_x - self.origin_x;
        let local_y = cell_y - self.origin_y;
        local_x >= 0 && local_y >= 0 && (local_x as usize) < self.width && (local_y as usize) < self.height
    }

    /// Whether the grid has a row at a world tile y
    pub fn has_row(&self, cell_y: i32) -> bool {
        let local_y = cell_y - self.origin_y;
        local_y >= 0 && (local_y as usize) < self.height
    }

    /// Tile id at a world tile coordinate
    pub fn cell(&self, cell_x: i32, cell_y: i32) -> Option<u16> {
        if !self.contains(cell_x, cell_y) {
            return None;
        }
        let local_x = (cell_x - self.origin_x) as usize;
        let local_y = (cell_y - self.origin_y) as usize;
        Some(self.rows[local_y][local_x])
    }
}
