//! The simulation space: body/shape storage, stepping and contact solving

use std::collections::HashMap;

use glam::Vec2;

use super::arbiter::{Arbiter, HandlerTable};
use super::arena::Arena;
use super::body::{Body, BodyHandle};
use super::collide::collide;
use super::shape::{Aabb, CollisionType, Shape, ShapeHandle, WorldGeometry};

/// Solver iterations per step
pub const DEFAULT_ITERATIONS: u32 = 10;
/// Fraction of penetration corrected per second of simulated time
const BIAS_COEF: f32 = 0.2;
/// Allowed penetration before position correction kicks in
const COLLISION_SLOP: f32 = 0.1;

/// Contact pair key, independent of orientation
type PairKey = (ShapeHandle, ShapeHandle);

#[inline]
fn pair_key(a: ShapeHandle, b: ShapeHandle) -> PairKey {
    if a <= b { (a, b) } else { (b, a) }
}

#[derive(Debug, Clone, Copy)]
struct ContactState {
    /// Begin callback rejected this pair; ignored until separation
    rejected: bool,
}

#[derive(Debug, Clone, Copy)]
struct ContactConstraint {
    arbiter: usize,
    point: usize,
    r_a: Vec2,
    r_b: Vec2,
    normal_mass: f32,
    tangent_mass: f32,
    bias: f32,
    bounce: f32,
    bias_impulse: f32,
}

/// Broad-phase entry for one shape
struct Proxy {
    shape: ShapeHandle,
    body: BodyHandle,
    is_static: bool,
    aabb: Aabb,
    geometry: WorldGeometry,
}

/// Owns every body and shape; advances them with [`Space::step`]
pub struct Space {
    bodies: Arena<Body>,
    shapes: Arena<Shape>,
    static_body: BodyHandle,
    /// World gravity (acceleration)
    pub gravity: Vec2,
    /// Fraction of velocity kept per second (1.0 = no damping)
    pub damping: f32,
    /// Friction given to shapes created through the space helpers
    pub default_friction: f32,
    pub iterations: u32,
    contacts: HashMap<PairKey, ContactState>,
    locked: bool,
    pending_shapes: Vec<ShapeHandle>,
    pending_bodies: Vec<BodyHandle>,
}

impl Space {
    pub fn new(gravity: Vec2) -> Self {
        let mut bodies = Arena::new();
        let static_body = BodyHandle(bodies.insert(Body::new_static()));
        Self {
            bodies,
            shapes: Arena::new(),
            static_body,
            gravity,
            damping: 1.0,
            default_friction: 1.0,
            iterations: DEFAULT_ITERATIONS,
            contacts: HashMap::new(),
            locked: false,
            pending_shapes: Vec::new(),
            pending_bodies: Vec::new(),
        }
    }

    pub fn with_friction(mut self, friction: f32) -> Self {
        self.default_friction = friction;
        self
    }

    /// World-fixed body used for terrain geometry
    pub fn static_body(&self) -> BodyHandle {
        self.static_body
    }

    pub fn add_body(&mut self, body: Body) -> BodyHandle {
        BodyHandle(self.bodies.insert(body))
    }

    pub fn add_shape(&mut self, shape: Shape) -> ShapeHandle {
        debug_assert!(self.bodies.contains(shape.body.0), "shape attached to a missing body");
        ShapeHandle(self.shapes.insert(shape))
    }

    /// Add a body with a single shape; the shape's body field is filled in
    pub fn add_body_with_shape(&mut self, body: Body, shape: impl FnOnce(BodyHandle) -> Shape) -> (BodyHandle, ShapeHandle) {
        let body = self.add_body(body);
        let shape = self.add_shape(shape(body));
        (body, shape)
    }

    pub fn body(&self, handle: BodyHandle) -> Option<&Body> {
        self.bodies.get(handle.0)
    }

    pub fn body_mut(&mut self, handle: BodyHandle) -> Option<&mut Body> {
        self.bodies.get_mut(handle.0)
    }

    pub fn shape(&self, handle: ShapeHandle) -> Option<&Shape> {
        self.shapes.get(handle.0)
    }

    pub fn shape_mut(&mut self, handle: ShapeHandle) -> Option<&mut Shape> {
        self.shapes.get_mut(handle.0)
    }

    pub fn contains_body(&self, handle: BodyHandle) -> bool {
        self.bodies.contains(handle.0)
    }

    pub fn contains_shape(&self, handle: ShapeHandle) -> bool {
        self.shapes.contains(handle.0)
    }

    /// Body count, including the static body
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    pub fn shape_count(&self) -> usize {
        self.shapes.len()
    }

    pub fn shapes(&self) -> impl Iterator<Item = (ShapeHandle, &Shape)> {
        self.shapes.iter().map(|(i, s)| (ShapeHandle(i), s))
    }

    pub fn shapes_of(&self, body: BodyHandle) -> Vec<ShapeHandle> {
        self.shapes
            .iter()
            .filter(|(_, s)| s.body == body)
            .map(|(i, _)| ShapeHandle(i))
            .collect()
    }

    /// True while [`Space::step`] is running
    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Whether the shape (or its body) is queued for removal at step end
    pub fn is_pending_removal(&self, shape: ShapeHandle) -> bool {
        if self.pending_shapes.contains(&shape) {
            return true;
        }
        self.shape(shape)
            .is_some_and(|s| self.pending_bodies.contains(&s.body))
    }

    /// Remove a shape; deferred to the end of the step when called from a callback
    pub fn remove_shape(&mut self, shape: ShapeHandle) {
        if self.locked {
            if !self.pending_shapes.contains(&shape) {
                self.pending_shapes.push(shape);
            }
            return;
        }
        if self.shapes.remove(shape.0).is_some() {
            self.contacts.retain(|&(a, b), _| a != shape && b != shape);
        }
    }

    /// Remove a body together with every shape attached to it
    pub fn remove_body(&mut self, body: BodyHandle) {
        if body == self.static_body {
            log::warn!("Refusing to remove the static body");
            return;
        }
        if self.locked {
            if !self.pending_bodies.contains(&body) {
                self.pending_bodies.push(body);
            }
            return;
        }
        for shape in self.shapes_of(body) {
            self.remove_shape(shape);
        }
        self.bodies.remove(body.0);
    }

    fn flush_removals(&mut self) {
        debug_assert!(!self.locked);
        for shape in std::mem::take(&mut self.pending_shapes) {
            self.remove_shape(shape);
        }
        for body in std::mem::take(&mut self.pending_bodies) {
            self.remove_body(body);
        }
    }

    /// Advance the simulation by `dt`, split into `sub_steps` equal steps
    ///
    /// Collision callbacks in `handlers` run synchronously with `ctx`. Any
    /// body or shape removal they request is applied once the sub-step ends.
    pub fn step<C>(&mut self, dt: f32, sub_steps: u32, handlers: &mut HandlerTable<C>, ctx: &mut C) {
        let sub_steps = sub_steps.max(1);
        let h = dt / sub_steps as f32;
        for _ in 0..sub_steps {
            self.substep(h, handlers, ctx);
        }
    }

    fn substep<C>(&mut self, dt: f32, handlers: &mut HandlerTable<C>, ctx: &mut C) {
        self.locked = true;

        for (_, body) in self.bodies.iter_mut() {
            body.update_position(dt);
        }

        let mut arbiters = self.find_contacts(handlers);

        // Begin callbacks for new contacts
        let mut next_contacts = HashMap::with_capacity(arbiters.len());
        let mut accepted = Vec::with_capacity(arbiters.len());
        for arbiter in arbiters.drain(..) {
            let [a, b] = arbiter.shapes();
            let key = pair_key(a, b);
            if let Some(state) = self.contacts.get(&key)
                && state.rejected
            {
                next_contacts.insert(key, *state);
                continue;
            }
            let mut state = ContactState { rejected: false };
            if arbiter.is_first_contact() && !self.is_pending_removal(a) && !self.is_pending_removal(b) {
                let types = self.types_of(&arbiter);
                state.rejected = !handlers.begin(&arbiter, types, self, ctx);
            }
            next_contacts.insert(key, state);
            if !state.rejected {
                accepted.push(arbiter);
            }
        }

        let damping = self.damping.powf(dt);
        let gravity = self.gravity;
        for (_, body) in self.bodies.iter_mut() {
            body.update_velocity(gravity, damping, dt);
        }

        self.solve(&mut accepted, dt);

        for arbiter in &accepted {
            let [a, b] = arbiter.shapes();
            if self.is_pending_removal(a) || self.is_pending_removal(b) {
                continue;
            }
            let types = self.types_of(arbiter);
            handlers.post_solve(arbiter, types, self, ctx);
        }

        for (_, body) in self.bodies.iter_mut() {
            body.reset_forces();
        }
        self.contacts = next_contacts;
        log::trace!(
            "substep: {} bodies, {} shapes, {} contacts",
            self.bodies.len(),
            self.shapes.len(),
            accepted.len()
        );

        self.locked = false;
        self.flush_removals();
    }

    fn types_of(&self, arbiter: &Arbiter) -> (CollisionType, CollisionType) {
        let [a, b] = arbiter.shapes();
        let ty = |s: ShapeHandle| {
            self.shape(s)
                .map(|s| s.collision_type)
                .unwrap_or_default()
        };
        (ty(a), ty(b))
    }

    /// Sweep-and-prune broad phase followed by narrow-phase tests
    fn find_contacts<C>(&self, handlers: &HandlerTable<C>) -> Vec<Arbiter> {
        let mut proxies: Vec<Proxy> = self
            .shapes
            .iter()
            .filter_map(|(index, shape)| {
                let body = self.bodies.get(shape.body.0)?;
                let geometry = shape.world_geometry(body);
                Some(Proxy {
                    shape: ShapeHandle(index),
                    body: shape.body,
                    is_static: body.is_static(),
                    aabb: geometry.bounding_box(),
                    geometry,
                })
            })
            .collect();
        proxies.sort_by(|a, b| a.aabb.min.x.total_cmp(&b.aabb.min.x));

        let mut arbiters = Vec::new();
        for i in 0..proxies.len() {
            let pa = &proxies[i];
            for pb in &proxies[i + 1..] {
                if pb.aabb.min.x > pa.aabb.max.x {
                    break;
                }
                if pa.body == pb.body || (pa.is_static && pb.is_static) || !pa.aabb.overlaps(&pb.aabb) {
                    continue;
                }
                let (Some(sa), Some(sb)) = (self.shape(pa.shape), self.shape(pb.shape)) else {
                    continue;
                };
                if sa.filter.rejects(&sb.filter) {
                    continue;
                }
                let Some(manifold) = collide(&pa.geometry, &pb.geometry) else {
                    continue;
                };

                let (shapes, manifold) = if handlers.needs_swap(sa.collision_type, sb.collision_type) {
                    ([pb.shape, pa.shape], manifold.flipped())
                } else {
                    ([pa.shape, pb.shape], manifold)
                };
                let first_contact = !self.contacts.contains_key(&pair_key(pa.shape, pb.shape));
                arbiters.push(
                    Arbiter::new(shapes, manifold, first_contact)
                        .with_material(sa.friction * sb.friction, sa.elasticity * sb.elasticity),
                );
            }
        }
        arbiters
    }

    fn bodies_of(&self, arbiter: &Arbiter) -> Option<(BodyHandle, BodyHandle)> {
        let [a, b] = arbiter.shapes();
        Some((self.shape(a)?.body, self.shape(b)?.body))
    }

    /// Sequential impulses with split-impulse position correction
    fn solve(&mut self, arbiters: &mut [Arbiter], dt: f32) {
        let mut constraints = Vec::new();
        for (index, arbiter) in arbiters.iter().enumerate() {
            let Some((ha, hb)) = self.bodies_of(arbiter) else {
                continue;
            };
            let (Some(a), Some(b)) = (self.body(ha), self.body(hb)) else {
                continue;
            };
            let n = arbiter.normal();
            let t = n.perp();
            for (point, contact) in arbiter.manifold().points.iter().enumerate() {
                let p = contact.midpoint();
                let r_a = p - a.position;
                let r_b = p - b.position;
                let k_n = effective_mass(a, b, r_a, r_b, n);
                let k_t = effective_mass(a, b, r_a, r_b, t);
                if k_n <= 0.0 {
                    continue;
                }
                let vr = b.velocity_at_world_point(p) - a.velocity_at_world_point(p);
                constraints.push(ContactConstraint {
                    arbiter: index,
                    point,
                    r_a,
                    r_b,
                    normal_mass: 1.0 / k_n,
                    tangent_mass: if k_t > 0.0 { 1.0 / k_t } else { 0.0 },
                    bias: BIAS_COEF / dt * (contact.depth - COLLISION_SLOP).max(0.0),
                    bounce: vr.dot(n) * arbiter.elasticity(),
                    bias_impulse: 0.0,
                });
            }
        }

        for _ in 0..self.iterations {
            for c in &mut constraints {
                let arbiter = &mut arbiters[c.arbiter];
                let Some((ha, hb)) = self.bodies_of(arbiter) else {
                    continue;
                };
                let (Some(a), Some(b)) = (self.bodies.get(ha.0), self.bodies.get(hb.0)) else {
                    continue;
                };
                let n = arbiter.normal();
                let t = n.perp();

                let vb_a = a.bias_velocity + a.bias_angular_velocity * c.r_a.perp();
                let vb_b = b.bias_velocity + b.bias_angular_velocity * c.r_b.perp();
                let vbn = (vb_b - vb_a).dot(n);
                let old_bias = c.bias_impulse;
                c.bias_impulse = (old_bias + (c.bias - vbn) * c.normal_mass).max(0.0);
                let jb = n * (c.bias_impulse - old_bias);

                let v_a = a.velocity + a.angular_velocity * c.r_a.perp();
                let v_b = b.velocity + b.angular_velocity * c.r_b.perp();
                let vr = v_b - v_a;

                let old_n = arbiter.normal_impulses[c.point];
                let jn_acc = (old_n - (c.bounce + vr.dot(n)) * c.normal_mass).max(0.0);
                arbiter.normal_impulses[c.point] = jn_acc;

                let jt_max = arbiter.friction() * jn_acc;
                let old_t = arbiter.tangent_impulses[c.point];
                let jt_acc = (old_t - vr.dot(t) * c.tangent_mass).clamp(-jt_max, jt_max);
                arbiter.tangent_impulses[c.point] = jt_acc;

                let j = n * (jn_acc - old_n) + t * (jt_acc - old_t);
                if let Some(a) = self.bodies.get_mut(ha.0) {
                    a.apply_bias_impulse(-jb, c.r_a);
                    a.apply_impulse(-j, c.r_a);
                }
                if let Some(b) = self.bodies.get_mut(hb.0) {
                    b.apply_bias_impulse(jb, c.r_b);
                    b.apply_impulse(j, c.r_b);
                }
            }
        }
    }
}

#[inline]
fn effective_mass(a: &Body, b: &Body, r_a: Vec2, r_b: Vec2, axis: Vec2) -> f32 {
    let rn_a = r_a.perp_dot(axis);
    let rn_b = r_b.perp_dot(axis);
    a.inv_mass() + b.inv_mass() + a.inv_moment() * rn_a * rn_a + b.inv_moment() * rn_b * rn_b
}
