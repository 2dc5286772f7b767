use crate::common::PhysicsConfig;
use crate::math::vec2::Vec2;
use crate::objects::Body;

/// Movement phase for one body: advance the pose by `dt`, then apply global damping and
/// gravity to the velocity used by the next step. Static bodies are left alone.
pub fn integrate(body: &mut Body, dt: f64, config: &PhysicsConfig) {
    if body.is_static() {
        return;
    }
    body.update(dt);

    if config.global_friction > 0.0 {
        apply_damping(body, dt, config.global_friction);
    }
    if config.gravity != 0.0 {
        apply_gravity(body, dt, config);
    }
}

/// `v' = v − (1 − g·μ)·dt·v − g·dt·v̂`. A body whose damped velocity would point
/// backwards is stopped instead.
fn apply_damping(body: &mut Body, dt: f64, global_friction: f64) {
    let velocity = body.linear_velocity;
    let proportional = velocity * ((1.0 - global_friction * body.material.friction) * dt);
    let constant = velocity.normalize() * (global_friction * dt);
    let damped = velocity - proportional - constant;
    body.linear_velocity = if damped.dot(velocity) > 0.0 { damped } else { Vec2::ZERO };
}

fn apply_gravity(body: &mut Body, dt: f64, config: &PhysicsConfig) {
    match config.gravity_center {
        None => body.linear_velocity.y += config.gravity * dt,
        Some(center) => {
            let offset = center - body.position;
            let min_distance_sq = config.gravity_min_distance * config.gravity_min_distance;
            let distance_sq = offset.length_squared().max(min_distance_sq);
            let pull = config.gravity * config.gravity_center_scale * dt / distance_sq;
            body.linear_velocity += offset.normalize() * pull;
        }
    }
}
