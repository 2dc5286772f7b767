use std::f64::consts::TAU;

use serde::{Deserialize, Serialize};

use crate::common::{Material, PhysicsError, Result};
use crate::math::vec2::{Vec2, EPSILON};
use crate::shapes::{Shape, ShapeKind};

/// Whether a body takes part in dynamics or is fixed in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BodyKind {
    /// Infinite mass and inertia; never moves and never receives impulses.
    Static,
    Dynamic,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Body {
    shape: Shape,
    kind: BodyKind,
    pub material: Material,

    /// World position of the shape's local origin (the first endpoint for an edge).
    pub position: Vec2,
    /// Radians, kept in [0, 2π).
    pub orientation: f64,
    pub(crate) linear_velocity: Vec2,
    pub(crate) angular_velocity: f64,

    inv_mass: f64,
    inv_inertia: f64,
}

impl Body {
    /// Creates a body at the origin. Dynamic bodies start with unit mass.
    pub fn new(shape: impl Into<Shape>, kind: BodyKind) -> Self {
        let mut body = Self {
            shape: shape.into(),
            kind,
            material: Material::default(),
            position: Vec2::ZERO,
            orientation: 0.0,
            linear_velocity: Vec2::ZERO,
            angular_velocity: 0.0,
            inv_mass: 0.0,
            inv_inertia: 0.0,
        };
        if kind == BodyKind::Dynamic {
            body.assign_mass(1.0);
        }
        body
    }

    pub fn new_dynamic(shape: impl Into<Shape>, position: Vec2) -> Self {
        Self::new(shape, BodyKind::Dynamic).with_position(position)
    }

    pub fn new_static(shape: impl Into<Shape>, position: Vec2) -> Self {
        Self::new(shape, BodyKind::Static).with_position(position)
    }

    pub fn with_position(mut self, position: Vec2) -> Self {
        self.position = position;
        self
    }

    pub fn with_orientation(mut self, orientation: f64) -> Self {
        self.orientation = wrap_angle(orientation);
        self
    }

    pub fn with_material(mut self, material: Material) -> Self {
        self.material = material;
        self
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn shape_kind(&self) -> ShapeKind {
        self.shape.kind()
    }

    pub fn kind(&self) -> BodyKind {
        self.kind
    }

    pub fn is_static(&self) -> bool {
        self.kind == BodyKind::Static
    }

    pub fn inv_mass(&self) -> f64 {
        self.inv_mass
    }

    pub fn inv_inertia(&self) -> f64 {
        self.inv_inertia
    }

    /// Mass of the body; infinite for static bodies.
    pub fn mass(&self) -> f64 {
        if self.inv_mass == 0.0 {
            f64::INFINITY
        } else {
            1.0 / self.inv_mass
        }
    }

    /// Sets the mass and derives the inverse inertia from the shape.
    ///
    /// The rotational inertia is `m·I_shape − m·|c|²`, with `c` the local center of
    /// mass. Note the parallel-axis term is subtracted, not added.
    pub fn set_mass(&mut self, mass: f64) -> Result<()> {
        if self.is_static() {
            return Err(PhysicsError::InvalidOperation(
                "mass is unavailable on a static body".into(),
            ));
        }
        if !(mass > 0.0) || !mass.is_finite() {
            return Err(PhysicsError::InvalidOperation(format!(
                "mass must be positive and finite, got {mass}"
            )));
        }
        self.assign_mass(mass);
        Ok(())
    }

    fn assign_mass(&mut self, mass: f64) {
        self.inv_mass = 1.0 / (mass + EPSILON);
        let inertia = mass * self.shape.inertia_tensor()
            - mass * self.shape.center_of_mass().length_squared();
        self.inv_inertia = 1.0 / (inertia + EPSILON);
    }

    pub fn linear_velocity(&self) -> Vec2 {
        self.linear_velocity
    }

    pub fn angular_velocity(&self) -> f64 {
        self.angular_velocity
    }

    pub fn set_linear_velocity(&mut self, velocity: Vec2) -> Result<()> {
        if self.is_static() {
            return Err(PhysicsError::InvalidOperation(
                "cannot set the velocity of a static body".into(),
            ));
        }
        self.linear_velocity = velocity;
        Ok(())
    }

    pub fn set_angular_velocity(&mut self, angular_velocity: f64) -> Result<()> {
        if self.is_static() {
            return Err(PhysicsError::InvalidOperation(
                "cannot set the angular velocity of a static body".into(),
            ));
        }
        self.angular_velocity = angular_velocity;
        Ok(())
    }

    pub fn set_restitution(&mut self, restitution: f64) {
        self.material = Material::new(restitution, self.material.friction);
    }

    pub fn set_friction(&mut self, friction: f64) {
        self.material = Material::new(self.material.restitution, friction);
    }

    /// World-space center of mass.
    pub fn center(&self) -> Vec2 {
        self.point_local_to_world(self.shape.center_of_mass())
    }

    pub fn point_local_to_world(&self, local_point: Vec2) -> Vec2 {
        self.position + local_point.rotate(self.orientation)
    }

    fn accepts_impulses(&self) -> bool {
        self.kind == BodyKind::Dynamic && self.inv_mass != 0.0
    }

    pub fn apply_impulse_linear(&mut self, impulse: Vec2) {
        if !self.accepts_impulses() {
            return;
        }
        self.linear_velocity += impulse * self.inv_mass;
    }

    pub fn apply_impulse_angular(&mut self, impulse: f64) {
        if !self.accepts_impulses() {
            return;
        }
        self.angular_velocity += self.inv_inertia * impulse;
    }

    /// Applies `impulse` at the world-space `point`, changing both linear and angular
    /// velocity.
    pub fn apply_impulse(&mut self, point: Vec2, impulse: Vec2) {
        if !self.accepts_impulses() {
            return;
        }
        self.linear_velocity += impulse * self.inv_mass;
        let arm = point - self.center();
        self.angular_velocity += self.inv_inertia * arm.cross(impulse);
    }

    /// Advances position and orientation by `dt` seconds.
    pub fn update(&mut self, dt: f64) {
        if self.is_static() {
            return;
        }
        self.position += self.linear_velocity * dt;
        self.orientation = wrap_angle(self.orientation + self.angular_velocity * dt);
    }
}

/// Maps an angle into [0, 2π). `rem_euclid` rounds tiny negative angles up to exactly 2π.
fn wrap_angle(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(TAU);
    if wrapped >= TAU {
        0.0
    } else {
        wrapped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::{Circle, Edge};
    use std::f64::consts::PI;
    const EPSILON: f64 = 1e-6;

    fn circle(radius: f64) -> Shape {
        Shape::Circle(Circle::new(radius).unwrap())
    }

    #[test]
    fn test_dynamic_body_defaults() {
        let body = Body::new(circle(2.0), BodyKind::Dynamic);
        assert_eq!(body.kind(), BodyKind::Dynamic);
        assert_eq!(body.position, Vec2::ZERO);
        assert_eq!(body.material, Material::default());
        assert!((body.mass() - 1.0).abs() < EPSILON);
        assert!(body.inv_mass() > 0.0);
        // I = 1 * 0.5 * 2^2 = 2
        assert!((body.inv_inertia() - 0.5).abs() < EPSILON);
    }

    #[test]
    fn test_static_body_is_massless() {
        let body = Body::new_static(circle(1.0), Vec2::new(3.0, 4.0));
        assert_eq!(body.inv_mass(), 0.0);
        assert_eq!(body.inv_inertia(), 0.0);
        assert!(body.mass().is_infinite());
        assert_eq!(body.position, Vec2::new(3.0, 4.0));
    }

    #[test]
    fn test_set_mass_on_static_fails() {
        let mut body = Body::new(circle(1.0), BodyKind::Static);
        assert!(matches!(body.set_mass(2.0), Err(PhysicsError::InvalidOperation(_))));
        assert_eq!(body.inv_mass(), 0.0);
        assert_eq!(body.inv_inertia(), 0.0);
    }

    #[test]
    fn test_set_mass_rejects_non_positive() {
        let mut body = Body::new(circle(1.0), BodyKind::Dynamic);
        let before = body.inv_mass();
        assert!(body.set_mass(0.0).is_err());
        assert!(body.set_mass(-3.0).is_err());
        assert!(body.set_mass(f64::NAN).is_err());
        assert_eq!(body.inv_mass(), before);
    }

    #[test]
    fn test_set_mass_circle() {
        let mut body = Body::new(circle(2.0), BodyKind::Dynamic);
        body.set_mass(10.0).unwrap();
        assert!((body.inv_mass() - 0.1).abs() < EPSILON);
        // I = 10 * 0.5 * 4 = 20
        assert!((body.inv_inertia() - 1.0 / 20.0).abs() < EPSILON);
    }

    #[test]
    fn test_set_mass_edge_subtracts_offset_term() {
        let mut body = Body::new(Edge::new(Vec2::new(4.0, 0.0)).unwrap(), BodyKind::Dynamic);
        body.set_mass(2.0).unwrap();
        // I = 2 * 0 - 2 * |(2, 0)|^2 = -8
        assert!((body.inv_inertia() + 1.0 / 8.0).abs() < 1e-6);
    }

    #[test]
    fn test_static_rejects_velocity() {
        let mut body = Body::new(circle(1.0), BodyKind::Static);
        assert!(body.set_linear_velocity(Vec2::new(1.0, 0.0)).is_err());
        assert!(body.set_angular_velocity(1.0).is_err());
        assert_eq!(body.linear_velocity(), Vec2::ZERO);
    }

    #[test]
    fn test_static_ignores_impulses() {
        let mut body = Body::new(circle(1.0), BodyKind::Static);
        body.apply_impulse_linear(Vec2::new(5.0, 5.0));
        body.apply_impulse_angular(3.0);
        body.apply_impulse(Vec2::new(0.0, 1.0), Vec2::new(5.0, 0.0));
        assert_eq!(body.linear_velocity(), Vec2::ZERO);
        assert_eq!(body.angular_velocity(), 0.0);
    }

    #[test]
    fn test_apply_impulse_linear_and_angular() {
        let mut body = Body::new(circle(1.0), BodyKind::Dynamic);
        body.set_mass(2.0).unwrap();
        body.apply_impulse_linear(Vec2::new(4.0, 0.0));
        assert!((body.linear_velocity().x - 2.0).abs() < EPSILON);

        // I = 2 * 0.5 = 1
        body.apply_impulse_angular(3.0);
        assert!((body.angular_velocity() - 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_apply_impulse_off_center_spins() {
        let mut body = Body::new_dynamic(circle(1.0), Vec2::new(5.0, 5.0));
        // Unit mass, I = 0.5. Push +x one unit above the center.
        body.apply_impulse(Vec2::new(5.0, 6.0), Vec2::new(1.0, 0.0));
        assert!((body.linear_velocity().x - 1.0).abs() < 1e-6);
        // r x J = (0, 1) x (1, 0) = -1, scaled by 1 / 0.5
        assert!((body.angular_velocity() + 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_update_integrates_and_wraps() {
        let mut body = Body::new(circle(1.0), BodyKind::Dynamic);
        body.set_linear_velocity(Vec2::new(10.0, -5.0)).unwrap();
        body.set_angular_velocity(PI).unwrap();
        body.orientation = 1.5 * PI;
        body.update(1.0);
        assert!((body.position.x - 10.0).abs() < EPSILON);
        assert!((body.position.y + 5.0).abs() < EPSILON);
        assert!((body.orientation - 0.5 * PI).abs() < EPSILON);

        body.set_angular_velocity(-PI).unwrap();
        body.update(1.0);
        assert!((body.orientation - 1.5 * PI).abs() < EPSILON);
        assert!(body.orientation >= 0.0 && body.orientation < TAU);
    }

    #[test]
    fn test_tiny_negative_spin_stays_below_tau() {
        let mut body = Body::new(circle(1.0), BodyKind::Dynamic);
        body.set_angular_velocity(-1e-18).unwrap();
        body.update(1.0 / 60.0);
        assert!(body.orientation >= 0.0 && body.orientation < TAU);
        assert_eq!(body.orientation, 0.0);

        let turned = Body::new(circle(1.0), BodyKind::Dynamic).with_orientation(-1e-18);
        assert!(turned.orientation < TAU);
    }

    #[test]
    fn test_update_static_does_not_move() {
        let mut body = Body::new_static(circle(1.0), Vec2::new(1.0, 1.0));
        let before = body.clone();
        body.update(0.5);
        assert_eq!(body, before);
    }

    #[test]
    fn test_center_and_local_to_world() {
        let body = Body::new_static(Edge::new(Vec2::new(2.0, 0.0)).unwrap(), Vec2::new(1.0, 1.0))
            .with_orientation(PI / 2.0);
        let center = body.center();
        assert!((center.x - 1.0).abs() < EPSILON);
        assert!((center.y - 2.0).abs() < EPSILON);

        let tip = body.point_local_to_world(Vec2::new(2.0, 0.0));
        assert!((tip.x - 1.0).abs() < EPSILON);
        assert!((tip.y - 3.0).abs() < EPSILON);
    }

    #[test]
    fn test_material_overrides() {
        let mut body = Body::new(circle(1.0), BodyKind::Dynamic);
        body.set_restitution(0.3);
        body.set_friction(0.0);
        assert_eq!(body.material, Material::new(0.3, 0.0));
    }
}
