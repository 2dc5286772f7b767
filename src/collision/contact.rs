//! Narrow phase: contact detection between two bodies and impulse-based resolution.

use tracing::trace;

use crate::common::{PhysicsError, Result};
use crate::math::vec2::{Vec2, EPSILON};
use crate::objects::Body;
use crate::shapes::{Circle, Edge, Shape};

/// Contact geometry between body A and body B for the current tick.
///
/// A contact is rebuilt from scratch every tick and never outlives it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    pub intersecting: bool,
    /// Deepest point of body A inside body B, in world coordinates.
    pub point_a: Vec2,
    /// Deepest point of body B inside body A, in world coordinates.
    pub point_b: Vec2,
    /// Unit normal pointing from A toward B.
    pub normal: Vec2,
    /// Penetration depth along the normal.
    pub depth: f64,
}

impl Default for Contact {
    fn default() -> Self {
        Self {
            intersecting: false,
            point_a: Vec2::ZERO,
            point_b: Vec2::ZERO,
            normal: Vec2::ZERO,
            depth: 0.0,
        }
    }
}

impl Contact {
    /// Detects a contact between `a` and `b`.
    ///
    /// Pairs without a detection rule are reported as not intersecting.
    pub fn detect(a: &Body, b: &Body) -> Contact {
        match Self::try_detect(a, b) {
            Ok(contact) => contact,
            Err(err) => {
                trace!(%err, "no contact rule, treating pair as separated");
                Contact::default()
            }
        }
    }

    /// Like [`Contact::detect`], but reports shape pairs without a detection rule as
    /// [`PhysicsError::UnsupportedPair`].
    pub fn try_detect(a: &Body, b: &Body) -> Result<Contact> {
        if std::ptr::eq(a, b) {
            return Ok(Contact::default());
        }
        match (a.shape(), b.shape()) {
            (Shape::Circle(ca), Shape::Circle(cb)) => Ok(circle_circle(a, ca, b, cb)),
            (Shape::Circle(circle), Shape::Edge(edge)) => Ok(circle_edge(a, circle, b, edge)),
            (Shape::Edge(edge), Shape::Circle(circle)) => {
                Ok(circle_edge(b, circle, a, edge).mirrored())
            }
            (Shape::Edge(_), Shape::Edge(_)) => {
                Err(PhysicsError::UnsupportedPair(a.shape_kind(), b.shape_kind()))
            }
        }
    }

    /// Swaps the roles of A and B.
    fn mirrored(self) -> Contact {
        Contact {
            point_a: self.point_b,
            point_b: self.point_a,
            normal: -self.normal,
            ..self
        }
    }

    /// Applies the collision impulse, the friction impulse and the positional
    /// correction for this contact. Does nothing if the bodies do not intersect.
    ///
    /// `a` and `b` must be the bodies this contact was detected for, in the same order.
    pub fn resolve(&self, a: &mut Body, b: &mut Body) {
        if let Some(response) = self.response(a, b) {
            response.apply_to_a(self, a);
            response.apply_to_b(self, b);
        }
    }

    /// Impulses and positional correction for this contact, computed from the bodies'
    /// current state without changing either of them.
    fn response(&self, a: &Body, b: &Body) -> Option<Response> {
        if !self.intersecting {
            return None;
        }
        let sum_inv_mass = a.inv_mass() + b.inv_mass();
        if sum_inv_mass == 0.0 {
            return None;
        }
        let mut response = Response {
            impulses: [Vec2::ZERO; 2],
            correction: self.point_b - self.point_a,
            sum_inv_mass,
        };

        let n = self.normal;
        let ra = self.point_a - a.center();
        let rb = self.point_b - b.center();

        let vel_a = a.linear_velocity() + Vec2::scalar_cross(a.angular_velocity(), ra);
        let vel_b = b.linear_velocity() + Vec2::scalar_cross(b.angular_velocity(), rb);
        let vel_ab = vel_a - vel_b;
        let approach = vel_ab.dot(n);

        // Separating pairs keep their velocities and only get pushed apart.
        if approach < 0.0 {
            return Some(response);
        }

        let angular_factor =
            (angular_term(a.inv_inertia(), ra, n) + angular_term(b.inv_inertia(), rb, n)).dot(n);
        let denominator = sum_inv_mass + angular_factor;
        if denominator.abs() > EPSILON {
            let elasticity = a.material.restitution * b.material.restitution;
            let impulse = n * ((1.0 + elasticity) * approach / denominator);
            trace!(?impulse, approach, "contact impulse");
            response.impulses[0] = impulse;
        }

        // Kinetic friction against the pre-impulse tangential velocity.
        let friction = a.material.friction * b.material.friction;
        let vel_tangent = vel_ab - n * n.dot(vel_ab);
        let tangent = vel_tangent.normalize();
        let angular_factor = (angular_term(a.inv_inertia(), ra, tangent)
            + angular_term(b.inv_inertia(), rb, tangent))
        .dot(tangent);
        let denominator = sum_inv_mass + angular_factor;
        if friction > 0.0 && denominator.abs() > EPSILON {
            response.impulses[1] = vel_tangent * (friction / denominator);
        }
        Some(response)
    }
}

/// What resolving one contact does to each side. The normal and friction impulses act
/// on B and, negated, on A.
struct Response {
    impulses: [Vec2; 2],
    /// Separation vector from A's contact point to B's.
    correction: Vec2,
    sum_inv_mass: f64,
}

impl Response {
    fn apply_to_a(&self, contact: &Contact, a: &mut Body) {
        for &impulse in &self.impulses {
            a.apply_impulse(contact.point_a, -impulse);
        }
        if !a.is_static() {
            a.position += self.correction * (a.inv_mass() / self.sum_inv_mass);
        }
    }

    fn apply_to_b(&self, contact: &Contact, b: &mut Body) {
        for &impulse in &self.impulses {
            b.apply_impulse(contact.point_b, impulse);
        }
        if !b.is_static() {
            b.position -= self.correction * (b.inv_mass() / self.sum_inv_mass);
        }
    }
}

/// Detects and resolves a contact between `a` and `b` in one go.
/// Returns the contact if the bodies were intersecting.
pub fn collide(a: &mut Body, b: &mut Body) -> Option<Contact> {
    let contact = Contact::detect(a, b);
    if !contact.intersecting {
        return None;
    }
    contact.resolve(a, b);
    Some(contact)
}

/// Resolves a dynamic `body` against a static `fixed` body. Only `body` is changed.
///
/// If the body was barely moving along the contact normal before resolution, its normal
/// velocity is removed afterwards so resting bodies do not jitter.
pub fn collide_with_static(
    body: &mut Body,
    fixed: &Body,
    resting_threshold: f64,
) -> Option<Contact> {
    let contact = Contact::detect(body, fixed);
    if !contact.intersecting {
        return None;
    }
    let normal_speed = body.linear_velocity().dot(contact.normal);
    if let Some(response) = contact.response(body, fixed) {
        response.apply_to_a(&contact, body);
    }
    if normal_speed.abs() < resting_threshold && !body.is_static() {
        let velocity = body.linear_velocity;
        body.linear_velocity = velocity - contact.normal * velocity.dot(contact.normal);
    }
    Some(contact)
}

/// `(invI · (r × axis)) × r`, the rotational share of the effective mass along `axis`.
fn angular_term(inv_inertia: f64, r: Vec2, axis: Vec2) -> Vec2 {
    Vec2::scalar_cross(inv_inertia * r.cross(axis), r)
}

fn within_radius(distance_squared: f64, radius: f64) -> bool {
    distance_squared > EPSILON && distance_squared <= radius * radius
}

fn circle_circle(a: &Body, circle_a: &Circle, b: &Body, circle_b: &Circle) -> Contact {
    let a_to_b = b.position - a.position;
    let dist_sq = a_to_b.length_squared();
    let radii = circle_a.radius() + circle_b.radius();
    if !within_radius(dist_sq, radii) {
        return Contact::default();
    }
    let normal = a_to_b.normalize();
    Contact {
        intersecting: true,
        point_a: a.position + normal * circle_a.radius(),
        point_b: b.position - normal * circle_b.radius(),
        normal,
        depth: radii - dist_sq.sqrt(),
    }
}

/// Circle against the segment `b1 → b2` of an edge body. The circle is body A.
fn circle_edge(circle_body: &Body, circle: &Circle, edge_body: &Body, edge: &Edge) -> Contact {
    let radius = circle.radius();
    let center = circle_body.position;
    let edge_vec = edge.vector().rotate(edge_body.orientation);
    let b1 = edge_body.position;
    let b2 = b1 + edge_vec;
    let from_b1 = center - b1;

    if from_b1.dot(edge_vec) < 0.0 {
        return circle_point(center, radius, b1);
    }
    if (center - b2).dot(-edge_vec) < 0.0 {
        return circle_point(center, radius, b2);
    }

    let along = edge_vec.normalize();
    let foot = b1 + along * from_b1.dot(along);
    let dist_sq = center.distance_squared(foot);
    if !within_radius(dist_sq, radius) {
        return Contact::default();
    }
    // Perpendicular pointing from the circle's side of the line toward the line.
    let perpendicular = Vec2::new(edge_vec.y, -edge_vec.x).normalize();
    let normal = if perpendicular.dot(from_b1) < 0.0 {
        perpendicular
    } else {
        -perpendicular
    };
    Contact {
        intersecting: true,
        point_a: center + normal * radius,
        point_b: foot,
        normal,
        depth: radius - dist_sq.sqrt(),
    }
}

/// Circle against a single point feature (an edge endpoint).
fn circle_point(center: Vec2, radius: f64, point: Vec2) -> Contact {
    let to_point = point - center;
    let dist_sq = to_point.length_squared();
    if !within_radius(dist_sq, radius) {
        return Contact::default();
    }
    let normal = to_point.normalize();
    Contact {
        intersecting: true,
        point_a: center + normal * radius,
        point_b: point,
        normal,
        depth: radius - dist_sq.sqrt(),
    }
}
