use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use tracing::{debug, trace};

use super::body_set::BodyHandle;
use super::simulation::{Simulation, SimulationState};
use crate::common::{PhysicsConfig, PhysicsError, Result};
use crate::objects::Body;

/// Manager that tests every dynamic body against every other body each tick.
///
/// Suited to small scenes. For large ones use
/// [`GridPhysicsManager`](super::GridPhysicsManager).
#[derive(Debug)]
pub struct PhysicsManager {
    state: Mutex<SimulationState>,
}

impl PhysicsManager {
    pub fn new(config: PhysicsConfig) -> Result<Self> {
        let state = SimulationState::new(config)?;
        debug!(tick_rate = state.config.tick_rate, "physics manager created");
        Ok(Self {
            state: Mutex::new(state),
        })
    }

    fn lock(&self) -> MutexGuard<'_, SimulationState> {
        // A panic mid-tick leaves the bodies in a usable state; keep going.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for PhysicsManager {
    fn default() -> Self {
        Self {
            state: Mutex::new(SimulationState::default()),
        }
    }
}

impl Simulation for PhysicsManager {
    fn with_state<R>(&self, f: impl FnOnce(&mut SimulationState) -> R) -> R {
        f(&mut self.lock())
    }

    fn add_body(&self, body: Body) -> BodyHandle {
        let kind = body.kind();
        let handle = self.lock().bodies.insert(body);
        debug!(%handle, ?kind, "body added");
        handle
    }

    fn remove_body(&self, handle: BodyHandle) -> Result<Body> {
        let (_, body) = self
            .lock()
            .bodies
            .remove(handle)
            .ok_or(PhysicsError::UnknownBody(handle))?;
        debug!(%handle, "body removed");
        Ok(body)
    }

    fn step(&self) {
        let mut state = self.lock();
        let start = Instant::now();
        let contacts = state.resolve_contacts();
        let dt = state.config.dt();
        state.integrate_all(dt);
        state.frame_time = start.elapsed();
        trace!(contacts, frame_time = ?state.frame_time, "tick");
    }

    fn intersecting_pairs(&self) -> Vec<(BodyHandle, BodyHandle)> {
        self.lock().brute_force_pairs()
    }
}
