//! Rigid bodies and their integration rules

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::arena::Index;

/// Handle to a body stored in a [`super::Space`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BodyHandle(pub(crate) Index);

/// How a body responds to the simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BodyKind {
    /// Integrated every step, responds to forces and contacts
    Dynamic,
    /// Never moves; infinite mass and moment
    Static,
}

/// Velocity integration strategy consulted per body
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum VelocityRule {
    /// World gravity and world damping
    Standard,
    /// Gravity scaled by `gravity_scale`, velocity multiplied by `damping` every step
    Damped { gravity_scale: f32, damping: f32 },
}

impl VelocityRule {
    /// Drifting debris: half gravity, strong per-step damping
    pub const DAMPED_HALF_GRAVITY: VelocityRule = VelocityRule::Damped {
        gravity_scale: 0.5,
        damping: 0.99,
    };
}

/// A rigid body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Body {
    pub kind: BodyKind,
    pub position: Vec2,
    pub velocity: Vec2,
    /// Rotation in radians, counter-clockwise
    pub angle: f32,
    /// Radians per second
    pub angular_velocity: f32,
    pub mass: f32,
    /// Moment of inertia; `f32::INFINITY` disables rotational response
    pub moment: f32,
    pub velocity_rule: VelocityRule,
    pub(crate) force: Vec2,
    pub(crate) torque: f32,
    /// Split-impulse position correction, cleared after every position update
    #[serde(skip)]
    pub(crate) bias_velocity: Vec2,
    #[serde(skip)]
    pub(crate) bias_angular_velocity: f32,
}

impl Body {
    pub fn new_dynamic(mass: f32, moment: f32) -> Self {
        Self {
            kind: BodyKind::Dynamic,
            position: Vec2::ZERO,
            velocity: Vec2::ZERO,
            angle: 0.0,
            angular_velocity: 0.0,
            mass,
            moment,
            velocity_rule: VelocityRule::Standard,
            force: Vec2::ZERO,
            torque: 0.0,
            bias_velocity: Vec2::ZERO,
            bias_angular_velocity: 0.0,
        }
    }

    pub fn new_static() -> Self {
        Self {
            kind: BodyKind::Static,
            mass: f32::INFINITY,
            moment: f32::INFINITY,
            ..Self::new_dynamic(1.0, 1.0)
        }
    }

    pub fn with_position(mut self, position: Vec2) -> Self {
        self.position = position;
        self
    }

    pub fn with_velocity(mut self, velocity: Vec2) -> Self {
        self.velocity = velocity;
        self
    }

    pub fn with_velocity_rule(mut self, rule: VelocityRule) -> Self {
        self.velocity_rule = rule;
        self
    }

    pub fn is_static(&self) -> bool {
        self.kind == BodyKind::Static
    }

    #[inline]
    pub fn inv_mass(&self) -> f32 {
        if self.is_static() || !self.mass.is_finite() || self.mass <= 0.0 {
            0.0
        } else {
            1.0 / self.mass
        }
    }

    #[inline]
    pub fn inv_moment(&self) -> f32 {
        if self.is_static() || !self.moment.is_finite() || self.moment <= 0.0 {
            0.0
        } else {
            1.0 / self.moment
        }
    }

    /// Unit vector of the body's local +x axis in world space
    #[inline]
    pub fn rotation_vector(&self) -> Vec2 {
        Vec2::from_angle(self.angle)
    }

    /// Unit vector of the body's local +y axis ("up" for the craft)
    #[inline]
    pub fn heading(&self) -> Vec2 {
        self.rotation_vector().perp()
    }

    #[inline]
    pub fn local_to_world(&self, point: Vec2) -> Vec2 {
        self.position + self.rotation_vector().rotate(point)
    }

    #[inline]
    pub fn world_to_local(&self, point: Vec2) -> Vec2 {
        Vec2::from_angle(-self.angle).rotate(point - self.position)
    }

    /// Velocity of a world-space point rigidly attached to the body
    #[inline]
    pub fn velocity_at_world_point(&self, point: Vec2) -> Vec2 {
        let r = point - self.position;
        self.velocity + self.angular_velocity * r.perp()
    }

    /// Accumulate a force given in body coordinates, applied at a body-local point
    pub fn apply_force_at_local_point(&mut self, force: Vec2, point: Vec2) {
        let rot = self.rotation_vector();
        let world_force = rot.rotate(force);
        let r = rot.rotate(point);
        self.force += world_force;
        self.torque += r.perp_dot(world_force);
    }

    /// Accumulate a world-space force applied at a world-space point
    pub fn apply_force_at_world_point(&mut self, force: Vec2, point: Vec2) {
        self.force += force;
        self.torque += (point - self.position).perp_dot(force);
    }

    /// Apply a world-space impulse at a point offset `r` from the center of mass
    #[inline]
    pub(crate) fn apply_impulse(&mut self, impulse: Vec2, r: Vec2) {
        self.velocity += impulse * self.inv_mass();
        self.angular_velocity += r.perp_dot(impulse) * self.inv_moment();
    }

    #[inline]
    pub(crate) fn apply_bias_impulse(&mut self, impulse: Vec2, r: Vec2) {
        self.bias_velocity += impulse * self.inv_mass();
        self.bias_angular_velocity += r.perp_dot(impulse) * self.inv_moment();
    }

    /// Integrate forces and gravity into velocity using the body's rule
    pub(crate) fn update_velocity(&mut self, gravity: Vec2, damping: f32, dt: f32) {
        if self.is_static() {
            return;
        }
        let (gravity, damping) = match self.velocity_rule {
            VelocityRule::Standard => (gravity, damping),
            VelocityRule::Damped {
                gravity_scale,
                damping,
            } => (gravity * gravity_scale, damping),
        };
        self.velocity = self.velocity * damping + (gravity + self.force * self.inv_mass()) * dt;
        self.angular_velocity =
            self.angular_velocity * damping + self.torque * self.inv_moment() * dt;
    }

    pub(crate) fn update_position(&mut self, dt: f32) {
        if self.is_static() {
            return;
        }
        self.position += (self.velocity + self.bias_velocity) * dt;
        self.angle += (self.angular_velocity + self.bias_angular_velocity) * dt;
        self.bias_velocity = Vec2::ZERO;
        self.bias_angular_velocity = 0.0;
    }

    pub(crate) fn reset_forces(&mut self) {
        self.force = Vec2::ZERO;
        self.torque = 0.0;
    }
}

/// Moment of inertia of a solid disc (or ring when `inner > 0`)
pub fn moment_for_circle(mass: f32, inner: f32, outer: f32, offset: Vec2) -> f32 {
    mass * (0.5 * (inner * inner + outer * outer) + offset.length_squared())
}
