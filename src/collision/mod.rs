pub mod contact;
pub mod grid;

pub use contact::{collide, collide_with_static, Contact};
pub use grid::{CollisionCell, CollisionGrid};

use crate::objects::Body;

/// Mutable references to two different bodies of the same slice.
/// Returns `None` if the indices are equal or out of bounds.
pub(crate) fn body_pair_mut(
    bodies: &mut [Body],
    idx_a: usize,
    idx_b: usize,
) -> Option<(&mut Body, &mut Body)> {
    if idx_a == idx_b || idx_a >= bodies.len() || idx_b >= bodies.len() {
        return None;
    }
    if idx_a < idx_b {
        let (head, tail) = bodies.split_at_mut(idx_b);
        Some((&mut head[idx_a], &mut tail[0]))
    } else {
        let (head, tail) = bodies.split_at_mut(idx_a);
        Some((&mut tail[0], &mut head[idx_b]))
    }
}
