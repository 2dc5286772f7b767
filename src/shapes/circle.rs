use crate::common::{PhysicsError, Result};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Circle {
    radius: f64,
}

impl Circle {
    pub fn new(radius: f64) -> Result<Self> {
        if !(radius > 0.0) || !radius.is_finite() {
            return Err(PhysicsError::InvalidGeometry(format!(
                "circle radius must be positive and finite, got {radius}"
            )));
        }
        Ok(Self { radius })
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// Moment of inertia per unit mass about the center.
    pub fn inertia_tensor(&self) -> f64 {
        0.5 * self.radius * self.radius
    }
}
