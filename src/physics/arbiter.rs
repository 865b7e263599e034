//! Contact arbiters and the collision handler table
//!
//! Handlers are looked up by an ordered pair of collision types. When a
//! contact is found for `(b, a)` but only `(a, b)` is registered, the arbiter
//! is oriented so that `shapes()[0]` always carries the first type of the
//! registered pair.

use std::collections::HashMap;

use glam::Vec2;

use super::collide::{ContactPoint, Manifold};
use super::shape::{CollisionType, ShapeHandle};
use super::space::Space;

/// Per-contact data handed to collision callbacks
#[derive(Debug, Clone)]
pub struct Arbiter {
    shapes: [ShapeHandle; 2],
    manifold: Manifold,
    first_contact: bool,
    friction: f32,
    elasticity: f32,
    pub(crate) normal_impulses: Vec<f32>,
    pub(crate) tangent_impulses: Vec<f32>,
}

impl Arbiter {
    pub fn new(shapes: [ShapeHandle; 2], manifold: Manifold, first_contact: bool) -> Self {
        let n = manifold.points.len();
        Self {
            shapes,
            manifold,
            first_contact,
            friction: 1.0,
            elasticity: 0.0,
            normal_impulses: vec![0.0; n],
            tangent_impulses: vec![0.0; n],
        }
    }

    pub(crate) fn with_material(mut self, friction: f32, elasticity: f32) -> Self {
        self.friction = friction;
        self.elasticity = elasticity;
        self
    }

    /// Arbiter carrying a precomputed total impulse along the contact normal
    pub fn with_normal_impulse(mut self, impulse: f32) -> Self {
        let n = self.normal_impulses.len().max(1) as f32;
        for j in &mut self.normal_impulses {
            *j = impulse / n;
        }
        self
    }

    pub fn shapes(&self) -> [ShapeHandle; 2] {
        self.shapes
    }

    /// True only on the step where the two shapes started touching
    pub fn is_first_contact(&self) -> bool {
        self.first_contact
    }

    pub fn normal(&self) -> Vec2 {
        self.manifold.normal
    }

    pub fn contact_points(&self) -> &[ContactPoint] {
        &self.manifold.points
    }

    pub fn friction(&self) -> f32 {
        self.friction
    }

    pub fn elasticity(&self) -> f32 {
        self.elasticity
    }

    /// Sum of normal and friction impulses applied by the solver this step
    pub fn total_impulse(&self) -> Vec2 {
        let n = self.manifold.normal;
        let t = n.perp();
        self.normal_impulses
            .iter()
            .zip(&self.tangent_impulses)
            .map(|(&jn, &jt)| n * jn + t * jt)
            .sum()
    }

    pub(crate) fn manifold(&self) -> &Manifold {
        &self.manifold
    }
}

/// Callbacks for one pair of collision types
///
/// `C` is the context the owner of the space threads through
/// [`Space::step`]; callbacks may mutate it and the space freely. Removals
/// made on the space during a step are deferred until the step ends.
pub trait CollisionHandler<C> {
    /// Called once when two shapes start touching. Returning `false` ignores
    /// the contact until the shapes separate.
    fn begin(&mut self, _arbiter: &Arbiter, _space: &mut Space, _ctx: &mut C) -> bool {
        true
    }

    /// Called after the solver ran, every step the shapes stay in contact
    fn post_solve(&mut self, _arbiter: &Arbiter, _space: &mut Space, _ctx: &mut C) {}
}

/// Handlers keyed by ordered collision type pair
pub struct HandlerTable<C> {
    handlers: HashMap<(CollisionType, CollisionType), Box<dyn CollisionHandler<C>>>,
}

impl<C> Default for HandlerTable<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> HandlerTable<C> {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    pub fn register(
        &mut self,
        a: CollisionType,
        b: CollisionType,
        handler: impl CollisionHandler<C> + 'static,
    ) {
        self.handlers.insert((a, b), Box::new(handler));
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    pub fn contains(&self, a: CollisionType, b: CollisionType) -> bool {
        self.handlers.contains_key(&(a, b))
    }

    /// Whether a contact between types `(a, b)` must be swapped to match a
    /// registered `(b, a)` handler
    pub fn needs_swap(&self, a: CollisionType, b: CollisionType) -> bool {
        !self.handlers.contains_key(&(a, b)) && self.handlers.contains_key(&(b, a))
    }

    /// Run the begin callback for an oriented arbiter (accepts when unhandled)
    pub fn begin(&mut self, arbiter: &Arbiter, types: (CollisionType, CollisionType), space: &mut Space, ctx: &mut C) -> bool {
        match self.handlers.get_mut(&types) {
            Some(handler) => handler.begin(arbiter, space, ctx),
            None => true,
        }
    }

    /// Run the post-solve callback for an oriented arbiter
    pub fn post_solve(&mut self, arbiter: &Arbiter, types: (CollisionType, CollisionType), space: &mut Space, ctx: &mut C) {
        if let Some(handler) = self.handlers.get_mut(&types) {
            handler.post_solve(arbiter, space, ctx);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::arena::Index;

    struct Counter;

    impl CollisionHandler<u32> for Counter {
        fn post_solve(&mut self, _arbiter: &Arbiter, _space: &mut Space, ctx: &mut u32) {
            *ctx += 1;
        }
    }

    fn handle(slot: u32) -> ShapeHandle {
        ShapeHandle(Index { slot, generation: 0 })
    }

    fn manifold() -> Manifold {
        Manifold {
            normal: Vec2::Y,
            points: vec![ContactPoint {
                point_a: Vec2::ZERO,
                point_b: Vec2::ZERO,
                depth: 0.1,
            }],
        }
    }

    #[test]
    fn test_swap_follows_registration_order() {
        let mut table: HandlerTable<u32> = HandlerTable::new();
        table.register(CollisionType::Player, CollisionType::Base, Counter);
        assert!(!table.needs_swap(CollisionType::Player, CollisionType::Base));
        assert!(table.needs_swap(CollisionType::Base, CollisionType::Player));
        assert!(!table.needs_swap(CollisionType::Floor, CollisionType::Planet));
    }

    #[test]
    fn test_dispatch_only_hits_registered_pair() {
        let mut table: HandlerTable<u32> = HandlerTable::new();
        table.register(CollisionType::Player, CollisionType::Base, Counter);
        let mut space = Space::new(Vec2::ZERO);
        let arb = Arbiter::new([handle(0), handle(1)], manifold(), true);
        let mut hits = 0;
        table.post_solve(&arb, (CollisionType::Player, CollisionType::Base), &mut space, &mut hits);
        table.post_solve(&arb, (CollisionType::Player, CollisionType::Floor), &mut space, &mut hits);
        assert_eq!(hits, 1);
        assert!(table.begin(&arb, (CollisionType::Player, CollisionType::Floor), &mut space, &mut hits));
    }

    #[test]
    fn test_total_impulse_sums_contacts() {
        let arb = Arbiter::new([handle(0), handle(1)], manifold(), true).with_normal_impulse(10.0);
        assert!((arb.total_impulse() - Vec2::new(0.0, 10.0)).length() < 1e-5);
    }
}
