pub mod circle;
pub mod edge;

pub use circle::Circle;
pub use edge::Edge;

use serde::{Deserialize, Serialize};

use crate::math::Vec2;

/// Discriminant of [`Shape`], used to pick a contact rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShapeKind {
    Circle,
    Edge,
}

/// The geometric shape of a body.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape {
    Circle(Circle),
    Edge(Edge),
}

impl Shape {
    pub fn kind(&self) -> ShapeKind {
        match self {
            Shape::Circle(_) => ShapeKind::Circle,
            Shape::Edge(_) => ShapeKind::Edge,
        }
    }

    /// Rotational inertia per unit mass. A segment has none about its own axis.
    pub fn inertia_tensor(&self) -> f64 {
        match self {
            Shape::Circle(circle) => circle.inertia_tensor(),
            Shape::Edge(_) => 0.0,
        }
    }

    /// Center of mass in the body's local frame.
    pub fn center_of_mass(&self) -> Vec2 {
        match self {
            Shape::Circle(_) => Vec2::ZERO,
            Shape::Edge(edge) => edge.center_of_mass(),
        }
    }

    /// Radius around the body position that contains the whole shape.
    pub fn bounding_radius(&self) -> f64 {
        match self {
            Shape::Circle(circle) => circle.radius(),
            Shape::Edge(edge) => edge.length(),
        }
    }
}

impl From<Circle> for Shape {
    fn from(circle: Circle) -> Self {
        Shape::Circle(circle)
    }
}

impl From<Edge> for Shape {
    fn from(edge: Edge) -> Self {
        Shape::Edge(edge)
    }
}
