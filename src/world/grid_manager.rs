use std::ops::Range;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Instant;

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use tracing::{debug, trace, warn};

use super::body_set::BodyHandle;
use super::simulation::{ordered, Simulation, SimulationState};
use crate::collision::CollisionGrid;
use crate::common::{GridConfig, PhysicsConfig, PhysicsError, Result};
use crate::objects::Body;

/// Width in columns of the strips a wave hands to its workers. Two columns keep the
/// neighbourhoods of same-wave strips apart.
const STRIP_WIDTH: usize = 2;

/// How a static body is placed in the grid.
#[derive(Debug, Clone, PartialEq)]
enum StaticSeed {
    /// Every cell under its bounding box.
    Bounds,
    /// Explicit `(x, y)` cells.
    Cells(Vec<(usize, usize)>),
}

#[derive(Debug)]
struct GridState {
    sim: SimulationState,
    grid: CollisionGrid,
    grid_config: GridConfig,
    /// One entry per static body, in the same order.
    seeds: Vec<StaticSeed>,
    /// Grid sort key of every dynamic body, ascending, as of the last rebuild.
    keys: Vec<usize>,
}

impl GridState {
    /// Sorts the dynamic bodies by cell and reloads them into the grid.
    fn rebuild_grid(&mut self) {
        let grid = &mut self.grid;
        grid.unload_bodies();
        self.sim.bodies.sort_dynamics_by_key(|body| grid.sort_key(body.position));

        self.keys.clear();
        let mut skipped = 0;
        for (index, body) in self.sim.bodies.dynamics().iter().enumerate() {
            self.keys.push(grid.sort_key(body.position));
            if !grid.load_body(index, body.position) {
                skipped += 1;
            }
        }
        if skipped > 0 {
            trace!(skipped, "bodies outside the grid left out of this sub-step");
        }
    }

    fn reseed_statics(&mut self) {
        self.grid.clear_statics();
        for (index, (seed, body)) in self.seeds.iter().zip(self.sim.bodies.statics()).enumerate() {
            match seed {
                StaticSeed::Bounds => {
                    self.grid.seed_static(index, body);
                }
                StaticSeed::Cells(cells) => {
                    // Validated when the body was added.
                    let _ = self.grid.seed_static_at(index, cells);
                }
            }
        }
    }

    /// Broad-phase contact pass in two waves: even column strips, then odd ones.
    /// Each strip only touches the bodies sorted into its own columns and the column on
    /// either side, so the strips of one wave work on disjoint body slices.
    fn resolve_waves(&mut self) -> usize {
        let grid = &self.grid;
        let keys = &self.keys;
        let threshold = self.sim.config.resting_threshold;
        let (dynamics, statics) = self.sim.bodies.split_mut();
        let strips = grid.strip_count(STRIP_WIDTH);

        let mut resolved = 0;
        for parity in 0..2 {
            let wave: Vec<usize> = (parity..strips).step_by(2).collect();
            let ranges: Vec<Range<usize>> = wave
                .iter()
                .map(|&strip| {
                    let reach = grid.strip_reach(strip, STRIP_WIDTH);
                    let start = keys.partition_point(|&k| k < reach.start);
                    let end = keys.partition_point(|&k| k < reach.end);
                    start..end
                })
                .collect();
            let offsets = ranges.iter().map(|range| range.start);
            let jobs: Vec<(usize, usize, &mut [Body])> = wave
                .iter()
                .copied()
                .zip(offsets)
                .zip(split_disjoint(dynamics, &ranges))
                .map(|((strip, offset), window)| (strip, offset, window))
                .collect();

            let run = |(strip, offset, window): (usize, usize, &mut [Body])| {
                run_strip(grid, strip, window, offset, statics, threshold)
            };
            #[cfg(feature = "parallel")]
            let wave_resolved: usize = jobs.into_par_iter().map(run).sum();
            #[cfg(not(feature = "parallel"))]
            let wave_resolved: usize = jobs.into_iter().map(run).sum();

            resolved += wave_resolved;
        }
        resolved
    }

    fn intersecting_pairs(&mut self) -> Vec<(BodyHandle, BodyHandle)> {
        self.rebuild_grid();
        let bodies = &self.sim.bodies;
        let (dynamic_pairs, static_pairs) =
            self.grid.intersecting_pairs(bodies.dynamics(), bodies.statics());
        let dynamic_handles = bodies.dynamic_handles();
        let static_handles = bodies.static_handles();

        let mut pairs: Vec<(BodyHandle, BodyHandle)> = dynamic_pairs
            .into_iter()
            .map(|(i, j)| ordered(dynamic_handles[i], dynamic_handles[j]))
            .chain(
                static_pairs
                    .into_iter()
                    .map(|(i, s)| ordered(dynamic_handles[i], static_handles[s])),
            )
            .collect();
        pairs.sort_unstable();
        pairs
    }
}

fn run_strip(
    grid: &CollisionGrid,
    strip: usize,
    window: &mut [Body],
    offset: usize,
    statics: &[Body],
    threshold: f64,
) -> usize {
    let mut resolved = 0;
    for cell in grid.strip_cells(strip, STRIP_WIDTH) {
        resolved += grid.check_collision(cell, window, offset, statics, threshold);
    }
    resolved
}

/// Cuts `bodies` into the given ascending, non-overlapping ranges.
fn split_disjoint<'a>(mut bodies: &'a mut [Body], ranges: &[Range<usize>]) -> Vec<&'a mut [Body]> {
    let mut windows = Vec::with_capacity(ranges.len());
    let mut consumed = 0;
    for range in ranges {
        let start = range.start.max(consumed);
        let end = range.end.max(start);
        let (_, tail) = std::mem::take(&mut bodies).split_at_mut(start - consumed);
        let (window, tail) = tail.split_at_mut(end - start);
        windows.push(window);
        bodies = tail;
        consumed = end;
    }
    windows
}

/// Manager that narrows contact candidates with a [`CollisionGrid`].
///
/// Each tick runs `sub_steps` sub-steps of `dt / sub_steps`: rebuild the grid, resolve
/// contacts in two waves of column strips, then integrate. With the `parallel` feature
/// the strips of a wave run on the rayon pool.
///
/// Bodies are assumed to be smaller than a cell; a dynamic body is indexed by its
/// position only and bodies outside the grid get no contacts.
#[derive(Debug)]
pub struct GridPhysicsManager {
    state: Mutex<GridState>,
}

impl GridPhysicsManager {
    pub fn new(config: PhysicsConfig, grid_config: GridConfig) -> Result<Self> {
        let sim = SimulationState::new(config)?;
        let grid = CollisionGrid::new(&grid_config)?;
        debug!(
            tick_rate = sim.config.tick_rate,
            sub_steps = grid_config.sub_steps,
            "grid physics manager created"
        );
        Ok(Self {
            state: Mutex::new(GridState {
                sim,
                grid,
                grid_config,
                seeds: Vec::new(),
                keys: Vec::new(),
            }),
        })
    }

    fn lock(&self) -> MutexGuard<'_, GridState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn grid_config(&self) -> GridConfig {
        self.lock().grid_config.clone()
    }

    /// Adds a static body seeded into explicit grid cells instead of its bounding box.
    pub fn add_static_at(&self, body: Body, cells: &[(usize, usize)]) -> Result<BodyHandle> {
        if !body.is_static() {
            return Err(PhysicsError::InvalidOperation(
                "only static bodies can be pinned to grid cells".into(),
            ));
        }
        let mut state = self.lock();
        let index = state.sim.bodies.statics().len();
        state.grid.seed_static_at(index, cells)?;
        state.seeds.push(StaticSeed::Cells(cells.to_vec()));
        let handle = state.sim.bodies.insert(body);
        debug!(%handle, cells = cells.len(), "static body added to explicit cells");
        Ok(handle)
    }
}

impl Simulation for GridPhysicsManager {
    fn with_state<R>(&self, f: impl FnOnce(&mut SimulationState) -> R) -> R {
        f(&mut self.lock().sim)
    }

    fn add_body(&self, body: Body) -> BodyHandle {
        let kind = body.kind();
        let mut state = self.lock();
        if body.is_static() {
            let index = state.sim.bodies.statics().len();
            if state.grid.seed_static(index, &body) == 0 {
                warn!("static body lies outside the grid and will never collide");
            }
            state.seeds.push(StaticSeed::Bounds);
        }
        let handle = state.sim.bodies.insert(body);
        debug!(%handle, ?kind, "body added");
        handle
    }

    fn remove_body(&self, handle: BodyHandle) -> Result<Body> {
        let mut state = self.lock();
        let (index, body) = state
            .sim
            .bodies
            .remove(handle)
            .ok_or(PhysicsError::UnknownBody(handle))?;
        if body.is_static() {
            state.seeds.remove(index);
            state.reseed_statics();
        }
        debug!(%handle, "body removed");
        Ok(body)
    }

    fn step(&self) {
        let mut state = self.lock();
        let start = Instant::now();
        let sub_steps = state.grid_config.sub_steps;
        let dt = state.sim.config.dt() / sub_steps as f64;
        let mut contacts = 0;
        for _ in 0..sub_steps {
            state.rebuild_grid();
            contacts += state.resolve_waves();
            state.sim.integrate_all(dt);
        }
        state.sim.frame_time = start.elapsed();
        trace!(contacts, sub_steps, frame_time = ?state.sim.frame_time, "tick");
    }

    fn intersecting_pairs(&self) -> Vec<(BodyHandle, BodyHandle)> {
        self.lock().intersecting_pairs()
    }
}
