use std::time::Duration;

use tracing::{debug, warn};

use super::body_set::{BodyHandle, BodySet, BodySnapshot};
use crate::collision::{body_pair_mut, collide, collide_with_static, Contact};
use crate::common::{Material, PhysicsConfig, PhysicsError, Result};
use crate::integration::integrate;
use crate::math::vec2::Vec2;
use crate::objects::Body;

/// Everything a manager guards behind its lock: the bodies, the global parameters and
/// the timing of the last tick.
#[derive(Debug, Default)]
pub struct SimulationState {
    pub(crate) bodies: BodySet,
    pub(crate) config: PhysicsConfig,
    pub(crate) frame_time: Duration,
}

impl SimulationState {
    pub fn new(config: PhysicsConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            bodies: BodySet::new(),
            config,
            frame_time: Duration::ZERO,
        })
    }

    pub fn bodies(&self) -> &BodySet {
        &self.bodies
    }

    pub fn config(&self) -> &PhysicsConfig {
        &self.config
    }

    pub fn frame_time(&self) -> Duration {
        self.frame_time
    }

    fn body_mut(&mut self, handle: BodyHandle) -> Result<&mut Body> {
        self.bodies.get_mut(handle).ok_or(PhysicsError::UnknownBody(handle))
    }

    /// Applies `impulse` at world `point` to a body. Impulses on static bodies are
    /// dropped.
    pub fn apply_impulse(&mut self, handle: BodyHandle, point: Vec2, impulse: Vec2) -> Result<()> {
        let body = self.body_mut(handle)?;
        if body.is_static() {
            warn!(%handle, "dropping impulse on a static body");
            return Ok(());
        }
        body.apply_impulse(point, impulse);
        Ok(())
    }

    pub fn set_velocity(&mut self, handle: BodyHandle, velocity: Vec2) -> Result<()> {
        self.body_mut(handle)?.set_linear_velocity(velocity)
    }

    pub fn set_material(&mut self, handle: BodyHandle, material: Material) -> Result<()> {
        self.body_mut(handle)?.material = material;
        Ok(())
    }

    pub fn set_restitution(&mut self, handle: BodyHandle, restitution: f64) -> Result<()> {
        self.body_mut(handle)?.set_restitution(restitution);
        Ok(())
    }

    pub fn set_friction(&mut self, handle: BodyHandle, friction: f64) -> Result<()> {
        self.body_mut(handle)?.set_friction(friction);
        Ok(())
    }

    /// Replaces the global parameters if the new ones are valid.
    pub fn update_config(&mut self, change: impl FnOnce(&mut PhysicsConfig)) -> Result<()> {
        let mut config = self.config.clone();
        change(&mut config);
        config.validate()?;
        debug!(?config, "physics config updated");
        self.config = config;
        Ok(())
    }

    /// Contact phase over every candidate pair: ordered pairs of dynamic bodies whose
    /// bounding circles overlap, then each dynamic body against every static body.
    /// Returns the number of contacts resolved.
    pub(crate) fn resolve_contacts(&mut self) -> usize {
        let threshold = self.config.resting_threshold;
        let (dynamics, statics) = self.bodies.split_mut();
        let mut resolved = 0;
        for i in 0..dynamics.len() {
            for j in 0..dynamics.len() {
                let Some((a, b)) = body_pair_mut(dynamics, i, j) else {
                    continue;
                };
                if bounds_overlap(a, b) && collide(a, b).is_some() {
                    resolved += 1;
                }
            }
            for fixed in statics {
                if collide_with_static(&mut dynamics[i], fixed, threshold).is_some() {
                    resolved += 1;
                }
            }
        }
        resolved
    }

    /// Movement phase for every dynamic body.
    pub(crate) fn integrate_all(&mut self, dt: f64) {
        let config = &self.config;
        for body in self.bodies.dynamics_mut() {
            integrate(body, dt, config);
        }
    }

    /// Every intersecting pair, found by testing all pairs. Nothing is resolved.
    pub(crate) fn brute_force_pairs(&self) -> Vec<(BodyHandle, BodyHandle)> {
        let dynamics = self.bodies.dynamics();
        let dynamic_handles = self.bodies.dynamic_handles();
        let mut pairs = Vec::new();
        for (i, a) in dynamics.iter().enumerate() {
            for (j, b) in dynamics.iter().enumerate().skip(i + 1) {
                if Contact::detect(a, b).intersecting {
                    pairs.push(ordered(dynamic_handles[i], dynamic_handles[j]));
                }
            }
            let statics = self.bodies.statics().iter();
            for (fixed, &handle) in statics.zip(self.bodies.static_handles()) {
                if Contact::detect(a, fixed).intersecting {
                    pairs.push(ordered(dynamic_handles[i], handle));
                }
            }
        }
        pairs.sort_unstable();
        pairs
    }
}

/// Bounding-circle pre-filter `|d|² ≤ (rA + rB)²`.
fn bounds_overlap(a: &Body, b: &Body) -> bool {
    let reach = a.shape().bounding_radius() + b.shape().bounding_radius();
    a.position.distance_squared(b.position) <= reach * reach
}

pub(crate) fn ordered(a: BodyHandle, b: BodyHandle) -> (BodyHandle, BodyHandle) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// A physics manager: owns the bodies and advances them one tick per `step`.
///
/// All methods take `&self` and serialize on the manager's internal lock, so bodies can
/// be added, removed and pushed from other threads while a driver is stepping.
pub trait Simulation: Send + Sync {
    /// Runs `f` with exclusive access to the manager's state.
    fn with_state<R>(&self, f: impl FnOnce(&mut SimulationState) -> R) -> R;

    fn add_body(&self, body: Body) -> BodyHandle;

    fn remove_body(&self, handle: BodyHandle) -> Result<Body>;

    /// Advances the simulation by one tick of `1 / tick_rate` seconds.
    fn step(&self);

    /// Pairs of bodies intersecting right now, smaller handle first, sorted.
    fn intersecting_pairs(&self) -> Vec<(BodyHandle, BodyHandle)>;

    fn apply_impulse(&self, handle: BodyHandle, point: Vec2, impulse: Vec2) -> Result<()> {
        self.with_state(|state| state.apply_impulse(handle, point, impulse))
    }

    fn set_velocity(&self, handle: BodyHandle, velocity: Vec2) -> Result<()> {
        self.with_state(|state| state.set_velocity(handle, velocity))
    }

    fn set_material(&self, handle: BodyHandle, material: Material) -> Result<()> {
        self.with_state(|state| state.set_material(handle, material))
    }

    fn set_restitution(&self, handle: BodyHandle, restitution: f64) -> Result<()> {
        self.with_state(|state| state.set_restitution(handle, restitution))
    }

    fn set_friction(&self, handle: BodyHandle, friction: f64) -> Result<()> {
        self.with_state(|state| state.set_friction(handle, friction))
    }

    fn set_tick_rate(&self, tick_rate: u32) -> Result<()> {
        self.with_state(|state| {
            state.update_config(|config| config.tick_rate = tick_rate)
        })
    }

    fn set_global_friction(&self, global_friction: f64) -> Result<()> {
        self.with_state(|state| {
            state.update_config(|config| config.global_friction = global_friction)
        })
    }

    /// Sets the gravity magnitude and, optionally, the point it pulls toward.
    fn set_gravity(&self, gravity: f64, center: Option<Vec2>) -> Result<()> {
        self.with_state(|state| {
            state.update_config(|config| {
                config.gravity = gravity;
                config.gravity_center = center;
            })
        })
    }

    fn config(&self) -> PhysicsConfig {
        self.with_state(|state| state.config.clone())
    }

    fn body(&self, handle: BodyHandle) -> Option<Body> {
        self.with_state(|state| state.bodies.get(handle).cloned())
    }

    fn body_count(&self) -> usize {
        self.with_state(|state| state.bodies.len())
    }

    fn snapshot(&self) -> Vec<BodySnapshot> {
        self.with_state(|state| state.bodies.snapshot())
    }

    /// Wall-clock time the last `step` took.
    fn frame_time(&self) -> Duration {
        self.with_state(|state| state.frame_time)
    }

    fn tick_interval(&self) -> Duration {
        self.with_state(|state| state.config.tick_interval())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::{Circle, Edge};

    fn ball(radius: f64, x: f64, y: f64) -> Body {
        Body::new_dynamic(Circle::new(radius).unwrap(), Vec2::new(x, y))
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let config = PhysicsConfig {
            tick_rate: 0,
            ..Default::default()
        };
        let result = SimulationState::new(config);
        assert!(matches!(result, Err(PhysicsError::InvalidConfig(_))));
    }

    #[test]
    fn test_unknown_handle() {
        let mut state = SimulationState::new(PhysicsConfig::default()).unwrap();
        let handle = state.bodies.insert(ball(1.0, 0.0, 0.0));
        state.bodies.remove(handle);
        assert_eq!(
            state.apply_impulse(handle, Vec2::ZERO, Vec2::new(1.0, 0.0)),
            Err(PhysicsError::UnknownBody(handle))
        );
        assert!(state.set_material(handle, Material::default()).is_err());
    }

    #[test]
    fn test_impulse_on_static_is_dropped() {
        let mut state = SimulationState::new(PhysicsConfig::default()).unwrap();
        let wall = state
            .bodies
            .insert(Body::new_static(Edge::new(Vec2::new(5.0, 0.0)).unwrap(), Vec2::ZERO));
        assert!(state.apply_impulse(wall, Vec2::ZERO, Vec2::new(0.0, 10.0)).is_ok());
        assert_eq!(state.bodies.get(wall).unwrap().linear_velocity(), Vec2::ZERO);
        assert!(state.set_velocity(wall, Vec2::new(1.0, 0.0)).is_err());
    }

    #[test]
    fn test_update_config_is_atomic() {
        let mut state = SimulationState::new(PhysicsConfig::default()).unwrap();
        let result = state.update_config(|config| {
            config.gravity = 5.0;
            config.tick_rate = 0;
        });
        assert!(result.is_err());
        assert_eq!(state.config, PhysicsConfig::default());
    }

    #[test]
    fn test_resolve_contacts_skips_distant_pairs() {
        let mut state = SimulationState::new(PhysicsConfig::default()).unwrap();
        state.bodies.insert(ball(1.0, 0.0, 0.0));
        state.bodies.insert(ball(1.0, 5.0, 0.0));
        assert_eq!(state.resolve_contacts(), 0);
    }

    #[test]
    fn test_resolve_contacts_separates_overlap() {
        let mut state = SimulationState::new(PhysicsConfig::default()).unwrap();
        let a = state.bodies.insert(ball(1.0, 0.0, 0.0));
        let b = state.bodies.insert(ball(1.0, 1.0, 0.0));
        assert!(state.resolve_contacts() >= 1);
        let gap = state.bodies.get(b).unwrap().position.x - state.bodies.get(a).unwrap().position.x;
        assert!((gap - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_brute_force_pairs_are_ordered() {
        let mut state = SimulationState::new(PhysicsConfig::default()).unwrap();
        let wall = state.bodies.insert(Body::new_static(
            Edge::new(Vec2::new(10.0, 0.0)).unwrap(),
            Vec2::new(0.0, 0.0),
        ));
        let a = state.bodies.insert(ball(1.0, 3.0, 0.5));
        let b = state.bodies.insert(ball(1.0, 4.0, 0.5));
        state.bodies.insert(ball(1.0, 8.0, 5.0));
        assert_eq!(state.brute_force_pairs(), vec![(wall, a), (wall, b), (a, b)]);
    }
}
