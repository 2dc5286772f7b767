// Uniform collision grid used as the broad phase of the grid manager.

use std::ops::Range;

use tracing::debug;

use super::contact::{collide, collide_with_static, Contact};
use super::body_pair_mut;
use crate::common::{GridConfig, PhysicsError, Result};
use crate::math::vec2::Vec2;
use crate::objects::Body;

/// One cell of the grid. Both lists hold indices into the owning manager's body lists.
#[derive(Debug, Default, Clone)]
pub struct CollisionCell {
    pub dynamics: Vec<usize>,
    pub statics: Vec<usize>,
}

/// `columns × rows` cells stored column-major: cell `(x, y)` lives at `x * rows + y`.
///
/// Dynamic bodies are reloaded every sub-step, one cell each, by their position.
/// Static bodies are seeded once and stay until removed.
#[derive(Debug)]
pub struct CollisionGrid {
    columns: usize,
    rows: usize,
    cell_width: f64,
    cell_height: f64,
    cells: Vec<CollisionCell>,
}

impl CollisionGrid {
    pub fn new(config: &GridConfig) -> Result<Self> {
        config.validate()?;
        let total_cells = config.columns * config.rows;
        debug!(
            columns = config.columns,
            rows = config.rows,
            cell_width = config.cell_width(),
            cell_height = config.cell_height(),
            total_cells,
            "creating collision grid"
        );
        Ok(Self {
            columns: config.columns,
            rows: config.rows,
            cell_width: config.cell_width(),
            cell_height: config.cell_height(),
            cells: vec![CollisionCell::default(); total_cells],
        })
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cell(&self, index: usize) -> Option<&CollisionCell> {
        self.cells.get(index)
    }

    /// Cell coordinates of a world position, or `None` outside the grid.
    pub fn cell_coords(&self, position: Vec2) -> Option<(usize, usize)> {
        let x = (position.x / self.cell_width).floor();
        let y = (position.y / self.cell_height).floor();
        if !(x >= 0.0 && y >= 0.0) || x >= self.columns as f64 || y >= self.rows as f64 {
            return None;
        }
        Some((x as usize, y as usize))
    }

    #[inline]
    fn linear_index(&self, x: usize, y: usize) -> usize {
        x * self.rows + y
    }

    pub fn cell_index(&self, position: Vec2) -> Option<usize> {
        self.cell_coords(position).map(|(x, y)| self.linear_index(x, y))
    }

    /// Sort key grouping bodies by cell, column by column. Out-of-grid positions sort last.
    pub fn sort_key(&self, position: Vec2) -> usize {
        self.cell_index(position).unwrap_or(usize::MAX)
    }

    /// Places dynamic body `index` in the cell under `position`.
    /// Returns `false` when the position is outside the grid and the body was skipped.
    pub fn load_body(&mut self, index: usize, position: Vec2) -> bool {
        match self.cell_index(position) {
            Some(cell) => {
                self.cells[cell].dynamics.push(index);
                true
            }
            None => false,
        }
    }

    /// Clears the dynamic bodies of every cell; statics stay seeded.
    pub fn unload_bodies(&mut self) {
        for cell in &mut self.cells {
            cell.dynamics.clear();
        }
    }

    /// Seeds static body `index` into every cell its bounding box covers.
    /// Returns the number of cells it landed in.
    pub fn seed_static(&mut self, index: usize, body: &Body) -> usize {
        let reach = body.shape().bounding_radius();
        let min = body.position - Vec2::new(reach, reach);
        let max = body.position + Vec2::new(reach, reach);

        let max_x = self.columns as f64 - 1.0;
        let max_y = self.rows as f64 - 1.0;
        let min_col = (min.x / self.cell_width).floor().clamp(0.0, max_x) as usize;
        let max_col = (max.x / self.cell_width).floor().clamp(0.0, max_x) as usize;
        let min_row = (min.y / self.cell_height).floor().clamp(0.0, max_y) as usize;
        let max_row = (max.y / self.cell_height).floor().clamp(0.0, max_y) as usize;

        // Entirely outside the grid.
        if max.x < 0.0
            || max.y < 0.0
            || min.x >= self.columns as f64 * self.cell_width
            || min.y >= self.rows as f64 * self.cell_height
        {
            return 0;
        }

        let mut seeded = 0;
        for x in min_col..=max_col {
            for y in min_row..=max_row {
                let cell = self.linear_index(x, y);
                self.cells[cell].statics.push(index);
                seeded += 1;
            }
        }
        seeded
    }

    /// Seeds static body `index` into explicit `(x, y)` cells.
    pub fn seed_static_at(&mut self, index: usize, cells: &[(usize, usize)]) -> Result<()> {
        let outside = |&&(x, y): &&(usize, usize)| x >= self.columns || y >= self.rows;
        if let Some(&(x, y)) = cells.iter().find(outside) {
            return Err(PhysicsError::InvalidOperation(format!(
                "cell ({x}, {y}) is outside the {}x{} grid",
                self.columns, self.rows
            )));
        }
        for &(x, y) in cells {
            let cell = self.linear_index(x, y);
            self.cells[cell].statics.push(index);
        }
        Ok(())
    }

    /// Removes every static seed.
    pub fn clear_statics(&mut self) {
        for cell in &mut self.cells {
            cell.statics.clear();
        }
    }

    /// The cell itself and its up to eight neighbours. Neighbours past the grid border
    /// are left out rather than wrapped into the next column.
    pub fn neighbourhood(&self, index: usize) -> impl Iterator<Item = usize> + '_ {
        let x = index / self.rows;
        let y = index % self.rows;
        let cols = x.saturating_sub(1)..(x + 2).min(self.columns);
        cols.flat_map(move |nx| {
            let rows = y.saturating_sub(1)..(y + 2).min(self.rows);
            rows.map(move |ny| self.linear_index(nx, ny))
        })
    }

    /// Resolves every dynamic body of `cell` against the dynamic and static bodies of
    /// its neighbourhood.
    ///
    /// `bodies` is a window onto the dynamic body list starting at global index `offset`;
    /// it must contain every body loaded into the neighbourhood.
    /// Returns the number of contacts resolved.
    pub fn check_collision(
        &self,
        cell: usize,
        bodies: &mut [Body],
        offset: usize,
        statics: &[Body],
        resting_threshold: f64,
    ) -> usize {
        let Some(home) = self.cells.get(cell) else {
            return 0;
        };
        let mut resolved = 0;
        let mut nearby_statics = Vec::new();
        for &i in &home.dynamics {
            nearby_statics.clear();
            for neighbour in self.neighbourhood(cell) {
                let other = &self.cells[neighbour];
                for &j in &other.dynamics {
                    if i == j {
                        continue;
                    }
                    let (local_i, local_j) = (i.wrapping_sub(offset), j.wrapping_sub(offset));
                    let Some((a, b)) = body_pair_mut(bodies, local_i, local_j) else {
                        continue;
                    };
                    if collide(a, b).is_some() {
                        resolved += 1;
                    }
                }
                nearby_statics.extend_from_slice(&other.statics);
            }

            // A static spanning several cells is still resolved once.
            nearby_statics.sort_unstable();
            nearby_statics.dedup();
            let Some(body) = bodies.get_mut(i.wrapping_sub(offset)) else {
                continue;
            };
            for &s in &nearby_statics {
                let Some(fixed) = statics.get(s) else {
                    continue;
                };
                if collide_with_static(body, fixed, resting_threshold).is_some() {
                    resolved += 1;
                }
            }
        }
        resolved
    }

    /// Index pairs `(dynamic, dynamic)` and `(dynamic, static)` whose bodies intersect,
    /// without resolving them. Dynamic pairs are reported once with the smaller index first.
    pub fn intersecting_pairs(
        &self,
        dynamics: &[Body],
        statics: &[Body],
    ) -> (Vec<(usize, usize)>, Vec<(usize, usize)>) {
        let mut dynamic_pairs = Vec::new();
        let mut static_pairs = Vec::new();
        for (cell, home) in self.cells.iter().enumerate() {
            for &i in &home.dynamics {
                let mut nearby_statics = Vec::new();
                for neighbour in self.neighbourhood(cell) {
                    let other = &self.cells[neighbour];
                    for &j in other.dynamics.iter().filter(|&&j| j > i) {
                        if Contact::detect(&dynamics[i], &dynamics[j]).intersecting {
                            dynamic_pairs.push((i, j));
                        }
                    }
                    nearby_statics.extend_from_slice(&other.statics);
                }
                nearby_statics.sort_unstable();
                nearby_statics.dedup();
                for s in nearby_statics {
                    if Contact::detect(&dynamics[i], &statics[s]).intersecting {
                        static_pairs.push((i, s));
                    }
                }
            }
        }
        (dynamic_pairs, static_pairs)
    }

    /// Cells belonging to column strip `strip` of `width` columns.
    pub fn strip_cells(&self, strip: usize, width: usize) -> Range<usize> {
        let first = (strip * width).min(self.columns);
        let last = (strip * width + width).min(self.columns);
        self.linear_index(first, 0)..self.linear_index(last, 0)
    }

    /// Sort keys of the bodies a strip can touch: its own columns plus one column on
    /// either side.
    pub fn strip_reach(&self, strip: usize, width: usize) -> Range<usize> {
        let first = (strip * width).saturating_sub(1).min(self.columns);
        let last = (strip * width + width + 1).min(self.columns);
        self.linear_index(first, 0)..self.linear_index(last, 0)
    }

    /// Number of column strips of `width` columns covering the grid.
    pub fn strip_count(&self, width: usize) -> usize {
        self.columns.div_ceil(width)
    }
}
