//! Simulation parameters.
//!
//! Both structs deserialize with every field optional, so an embedding application can
//! keep only the values it wants to tune in its own settings file.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::error::{PhysicsError, Result};
use crate::math::Vec2;

/// Global parameters shared by both manager variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Ticks per second; the tick delta is `1 / tick_rate`.
    pub tick_rate: u32,

    /// Global velocity damping factor. 0 disables damping.
    pub global_friction: f64,

    /// Gravity magnitude. 0 disables gravity.
    pub gravity: f64,

    /// When set, gravity pulls toward this point with inverse-square falloff instead of
    /// acting uniformly along +y.
    pub gravity_center: Option<Vec2>,

    /// Multiplier applied to point gravity.
    pub gravity_center_scale: f64,

    /// Distances to the gravity center are clamped to at least this value.
    pub gravity_min_distance: f64,

    /// Normal speeds against static bodies below this are zeroed after resolution.
    pub resting_threshold: f64,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            tick_rate: 60,
            global_friction: 0.0,
            gravity: 0.0,
            gravity_center: None,
            gravity_center_scale: 20_000.0,
            gravity_min_distance: 10.0,
            resting_threshold: 0.01,
        }
    }
}

impl PhysicsConfig {
    pub fn validate(&self) -> Result<()> {
        if self.tick_rate == 0 {
            return Err(PhysicsError::InvalidConfig("tick rate must be positive".into()));
        }
        if !(self.global_friction >= 0.0) || !self.global_friction.is_finite() {
            return Err(PhysicsError::InvalidConfig(format!(
                "global friction must be non-negative and finite, got {}",
                self.global_friction
            )));
        }
        if !self.gravity.is_finite() {
            return Err(PhysicsError::InvalidConfig("gravity must be finite".into()));
        }
        if let Some(center) = self.gravity_center {
            if !center.is_finite() {
                return Err(PhysicsError::InvalidConfig("gravity center must be finite".into()));
            }
        }
        if !self.gravity_center_scale.is_finite() {
            return Err(PhysicsError::InvalidConfig(format!(
                "gravity center scale must be finite, got {}",
                self.gravity_center_scale
            )));
        }
        if !(self.gravity_min_distance > 0.0) || !self.gravity_min_distance.is_finite() {
            return Err(PhysicsError::InvalidConfig(
                "gravity minimum distance must be positive and finite".into(),
            ));
        }
        if !(self.resting_threshold >= 0.0) || !self.resting_threshold.is_finite() {
            return Err(PhysicsError::InvalidConfig(
                "resting threshold must be non-negative".into(),
            ));
        }
        Ok(())
    }

    /// Simulated seconds advanced by one tick.
    pub fn dt(&self) -> f64 {
        1.0 / self.tick_rate as f64
    }

    /// Wall-clock cadence a driver should call `step` at.
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs_f64(self.dt())
    }
}

/// Layout of the broad-phase grid and the sub-stepping of the grid manager.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub world_width: f64,
    pub world_height: f64,
    /// Number of cells along x.
    pub columns: usize,
    /// Number of cells along y.
    pub rows: usize,
    /// Sub-steps per tick; each integrates `dt / sub_steps`.
    pub sub_steps: usize,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            world_width: 1000.0,
            world_height: 1000.0,
            columns: 50,
            rows: 50,
            sub_steps: 2,
        }
    }
}

impl GridConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.world_width > 0.0 && self.world_height > 0.0)
            || !self.world_width.is_finite()
            || !self.world_height.is_finite()
        {
            return Err(PhysicsError::InvalidConfig(format!(
                "world size must be positive, got {}x{}",
                self.world_width, self.world_height
            )));
        }
        if self.columns == 0 || self.rows == 0 {
            return Err(PhysicsError::InvalidConfig(format!(
                "grid must have at least one cell, got {}x{}",
                self.columns, self.rows
            )));
        }
        if self.sub_steps == 0 {
            return Err(PhysicsError::InvalidConfig("sub-steps must be positive".into()));
        }
        Ok(())
    }

    pub fn cell_width(&self) -> f64 {
        self.world_width / self.columns as f64
    }

    pub fn cell_height(&self) -> f64 {
        self.world_height / self.rows as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = PhysicsConfig::default();
        assert!(config.validate().is_ok());
        assert!((config.dt() - 1.0 / 60.0).abs() < 1e-12);
        assert!(GridConfig::default().validate().is_ok());
    }

    #[test]
    fn test_zero_tick_rate_rejected() {
        let config = PhysicsConfig {
            tick_rate: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(PhysicsError::InvalidConfig(_))));
    }

    #[test]
    fn test_negative_or_nan_damping_rejected() {
        let config = PhysicsConfig {
            global_friction: -0.5,
            ..Default::default()
        };
        assert!(config.validate().is_err());
        let config = PhysicsConfig {
            global_friction: f64::NAN,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_non_finite_values_rejected() {
        let invalid = [
            PhysicsConfig {
                global_friction: f64::INFINITY,
                ..Default::default()
            },
            PhysicsConfig {
                gravity_center_scale: f64::NAN,
                ..Default::default()
            },
            PhysicsConfig {
                gravity_center_scale: f64::NEG_INFINITY,
                ..Default::default()
            },
            PhysicsConfig {
                gravity_min_distance: f64::INFINITY,
                ..Default::default()
            },
            PhysicsConfig {
                resting_threshold: f64::INFINITY,
                ..Default::default()
            },
        ];
        for config in invalid {
            assert!(
                matches!(config.validate(), Err(PhysicsError::InvalidConfig(_))),
                "{config:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_grid_config_rejects_empty_grid() {
        let grid = GridConfig {
            columns: 0,
            ..Default::default()
        };
        assert!(grid.validate().is_err());
        let grid = GridConfig {
            sub_steps: 0,
            ..Default::default()
        };
        assert!(grid.validate().is_err());
        let grid = GridConfig {
            world_width: -1.0,
            ..Default::default()
        };
        assert!(grid.validate().is_err());
    }

    #[test]
    fn test_grid_cell_size() {
        let grid = GridConfig {
            world_width: 400.0,
            world_height: 300.0,
            columns: 20,
            rows: 10,
            sub_steps: 2,
        };
        assert_eq!(grid.cell_width(), 20.0);
        assert_eq!(grid.cell_height(), 30.0);
    }
}
