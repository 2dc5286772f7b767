use std::fmt;

use serde::{Deserialize, Serialize};

use crate::math::vec2::Vec2;
use crate::objects::{Body, BodyKind};
use crate::shapes::ShapeKind;

/// Identifier of a body inside one manager. Handles are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BodyHandle(u64);

impl BodyHandle {
    pub fn id(self) -> u64 {
        self.0
    }
}

impl fmt::Display for BodyHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "body#{}", self.0)
    }
}

/// Read-only copy of the externally visible state of one body.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BodySnapshot {
    pub handle: BodyHandle,
    pub kind: BodyKind,
    pub shape: ShapeKind,
    pub position: Vec2,
    pub orientation: f64,
    pub linear_velocity: Vec2,
    pub speed: f64,
    pub angular_velocity: f64,
}

impl BodySnapshot {
    pub fn new(handle: BodyHandle, body: &Body) -> Self {
        Self {
            handle,
            kind: body.kind(),
            shape: body.shape_kind(),
            position: body.position,
            orientation: body.orientation,
            linear_velocity: body.linear_velocity(),
            speed: body.linear_velocity().length(),
            angular_velocity: body.angular_velocity(),
        }
    }
}

/// Bodies of one kind, kept contiguous so they can be handed out as slices.
#[derive(Debug, Default)]
struct BodyList {
    handles: Vec<BodyHandle>,
    bodies: Vec<Body>,
}

impl BodyList {
    fn position(&self, handle: BodyHandle) -> Option<usize> {
        self.handles.iter().position(|&h| h == handle)
    }

    fn push(&mut self, handle: BodyHandle, body: Body) {
        self.handles.push(handle);
        self.bodies.push(body);
    }

    fn remove(&mut self, index: usize) -> Body {
        self.handles.remove(index);
        self.bodies.remove(index)
    }
}

/// The dynamic and static bodies of a manager.
///
/// Removal keeps the relative order of the remaining bodies, so static indices only
/// shift down past the removed one.
#[derive(Debug, Default)]
pub struct BodySet {
    dynamics: BodyList,
    statics: BodyList,
    next_id: u64,
}

impl BodySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, body: Body) -> BodyHandle {
        let handle = BodyHandle(self.next_id);
        self.next_id += 1;
        match body.kind() {
            BodyKind::Dynamic => self.dynamics.push(handle, body),
            BodyKind::Static => self.statics.push(handle, body),
        }
        handle
    }

    /// Removes a body and returns it together with its index in its kind's list.
    pub fn remove(&mut self, handle: BodyHandle) -> Option<(usize, Body)> {
        if let Some(index) = self.dynamics.position(handle) {
            return Some((index, self.dynamics.remove(index)));
        }
        let index = self.statics.position(handle)?;
        Some((index, self.statics.remove(index)))
    }

    pub fn get(&self, handle: BodyHandle) -> Option<&Body> {
        if let Some(index) = self.dynamics.position(handle) {
            return self.dynamics.bodies.get(index);
        }
        let index = self.statics.position(handle)?;
        self.statics.bodies.get(index)
    }

    pub fn get_mut(&mut self, handle: BodyHandle) -> Option<&mut Body> {
        if let Some(index) = self.dynamics.position(handle) {
            return self.dynamics.bodies.get_mut(index);
        }
        let index = self.statics.position(handle)?;
        self.statics.bodies.get_mut(index)
    }

    pub fn contains(&self, handle: BodyHandle) -> bool {
        self.dynamics.position(handle).is_some() || self.statics.position(handle).is_some()
    }

    pub fn len(&self) -> usize {
        self.dynamics.bodies.len() + self.statics.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn dynamics(&self) -> &[Body] {
        &self.dynamics.bodies
    }

    pub fn statics(&self) -> &[Body] {
        &self.statics.bodies
    }

    pub fn dynamic_handles(&self) -> &[BodyHandle] {
        &self.dynamics.handles
    }

    pub fn static_handles(&self) -> &[BodyHandle] {
        &self.statics.handles
    }

    pub fn dynamics_mut(&mut self) -> &mut [Body] {
        &mut self.dynamics.bodies
    }

    /// Mutable dynamic bodies alongside shared static bodies.
    pub fn split_mut(&mut self) -> (&mut [Body], &[Body]) {
        (&mut self.dynamics.bodies, &self.statics.bodies)
    }

    /// Dynamic bodies first, then static bodies.
    pub fn iter(&self) -> impl Iterator<Item = (BodyHandle, &Body)> {
        let dynamics = self.dynamics.handles.iter().copied().zip(&self.dynamics.bodies);
        let statics = self.statics.handles.iter().copied().zip(&self.statics.bodies);
        dynamics.chain(statics)
    }

    /// Reorders the dynamic bodies by `key`; equal keys keep their relative order.
    pub fn sort_dynamics_by_key<K: Ord>(&mut self, mut key: impl FnMut(&Body) -> K) {
        let list = &mut self.dynamics;
        let mut paired: Vec<(BodyHandle, Body)> =
            list.handles.drain(..).zip(list.bodies.drain(..)).collect();
        paired.sort_by_key(|(_, body)| key(body));
        (list.handles, list.bodies) = paired.into_iter().unzip();
    }

    pub fn snapshot(&self) -> Vec<BodySnapshot> {
        self.iter().map(|(handle, body)| BodySnapshot::new(handle, body)).collect()
    }
}
