//! A 2D impulse-based rigid-body engine for circles and line segments.
//!
//! Bodies live inside a manager ([`PhysicsManager`] or the grid-accelerated
//! [`GridPhysicsManager`]) and are addressed by [`BodyHandle`]. Each call to
//! [`Simulation::step`] resolves contacts and then integrates motion over one tick.

pub mod collision;
pub mod common;
pub mod integration;
pub mod math;
pub mod objects;
pub mod shapes;
pub mod world;

pub use collision::{CollisionGrid, Contact};
pub use common::{GridConfig, Material, PhysicsConfig, PhysicsError, Result};
pub use math::vec2::Vec2;
pub use objects::{Body, BodyKind};
pub use shapes::{Circle, Edge, Shape, ShapeKind};
pub use world::{BodyHandle, BodySnapshot, Driver, GridPhysicsManager, PhysicsManager, Simulation};
