//! Error types for the engine.

use thiserror::Error;

use crate::shapes::ShapeKind;
use crate::world::BodyHandle;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PhysicsError {
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    #[error("no contact rule for {0:?} against {1:?}")]
    UnsupportedPair(ShapeKind, ShapeKind),

    #[error("unknown body {0:?}")]
    UnknownBody(BodyHandle),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, PhysicsError>;
