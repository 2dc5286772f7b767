use crate::common::{PhysicsError, Result};
use crate::math::vec2::{Vec2, EPSILON};

/// A line segment running from the owning body's position along `vector`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    vector: Vec2,
}

impl Edge {
    pub fn new(vector: Vec2) -> Result<Self> {
        if !vector.is_finite() || vector.length_squared() <= EPSILON {
            return Err(PhysicsError::InvalidGeometry(format!(
                "edge vector must be finite and non-zero, got {vector:?}"
            )));
        }
        Ok(Self { vector })
    }

    /// Builds the edge between two world points; the body must be placed at `start`.
    pub fn between(start: Vec2, end: Vec2) -> Result<Self> {
        Self::new(end - start)
    }

    /// Local-frame vector from the first endpoint to the second.
    pub fn vector(&self) -> Vec2 {
        self.vector
    }

    pub fn length(&self) -> f64 {
        self.vector.length()
    }

    /// Midpoint of the segment in the body's local frame.
    pub fn center_of_mass(&self) -> Vec2 {
        self.vector / 2.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    const EPSILON: f64 = 1e-10;

    #[test]
    fn test_edge_new() {
        let edge = Edge::new(Vec2::new(3.0, 4.0)).unwrap();
        assert_eq!(edge.vector(), Vec2::new(3.0, 4.0));
        assert!((edge.length() - 5.0).abs() < EPSILON);
        assert_eq!(edge.center_of_mass(), Vec2::new(1.5, 2.0));
    }

    #[test]
    fn test_edge_between_points() {
        let edge = Edge::between(Vec2::new(1.0, 2.0), Vec2::new(4.0, 6.0)).unwrap();
        assert_eq!(edge.vector(), Vec2::new(3.0, 4.0));
    }

    #[test]
    fn test_edge_rejects_zero_vector() {
        assert!(matches!(Edge::new(Vec2::ZERO), Err(PhysicsError::InvalidGeometry(_))));
        let p = Vec2::new(7.0, 7.0);
        assert!(Edge::between(p, p).is_err());
        assert!(Edge::new(Vec2::new(f64::NAN, 1.0)).is_err());
    }
}
