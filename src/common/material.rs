//! Defines physical material properties.

use serde::{Deserialize, Serialize};

/// Surface properties of a body that feed contact resolution.
///
/// Both coefficients are combined multiplicatively between the two bodies of a
/// contact, so a value of 1.0 leaves the partner's coefficient untouched.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Material {
    /// Coefficient of restitution (bounciness). Range [0, 1].
    pub restitution: f64,
    /// Kinetic friction coefficient. Range [0, infinity).
    pub friction: f64,
}

impl Material {
    /// Creates a new material, clamping both coefficients into their valid ranges.
    pub fn new(restitution: f64, friction: f64) -> Self {
        Material {
            restitution: restitution.clamp(0.0, 1.0),
            friction: friction.max(0.0),
        }
    }
}

impl Default for Material {
    fn default() -> Self {
        Material {
            restitution: 0.9,
            friction: 0.5,
        }
    }
}
