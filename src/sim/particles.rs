//! Thrust exhaust, explosion and debris particles
//!
//! Each particle is a tiny physics circle that shares the craft's filter
//! group, so it never hits the craft or other particles but still bounces off
//! terrain, the base and hazards. Particles integrate with a damped,
//! reduced-gravity velocity rule so they drift instead of falling.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::consts::PARTICLE_GROUP;
use crate::physics::{Body, BodyHandle, Geometry, Shape, ShapeFilter, Space, VelocityRule};
use crate::renderer::{Camera, Canvas, Color};
use crate::rotated_degrees;
use crate::tuning::Tuning;

/// A live particle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    pub body: BodyHandle,
    /// Remaining lifetime in frames
    pub duration: f32,
}

/// Color ramp by remaining lifetime
pub fn particle_color(duration: f32) -> Color {
    if duration > 95.0 {
        Color::White
    } else if duration > 80.0 {
        Color::Yellow
    } else if duration > 65.0 {
        Color::Red
    } else if duration > 40.0 {
        Color::Purple
    } else if duration > 25.0 {
        Color::Brown
    } else {
        Color::Gray
    }
}

/// Owns every live particle and the bodies backing them
pub struct ParticleSystem {
    particles: Vec<Particle>,
    rng: Pcg32,
    lifetime: f32,
    lifetime_decay: f32,
    mass: f32,
    radius: f32,
    friction: f32,
    spark_chance: f64,
    jitter: f32,
    velocity_rule: VelocityRule,
}

impl ParticleSystem {
    pub fn new(seed: u64, tuning: &Tuning) -> Self {
        Self {
            particles: Vec::new(),
            rng: Pcg32::seed_from_u64(seed),
            lifetime: tuning.particle_lifetime,
            lifetime_decay: tuning.particle_lifetime_decay,
            mass: tuning.particle_mass,
            radius: tuning.particle_radius,
            friction: tuning.friction,
            spark_chance: tuning.spark_chance,
            jitter: tuning.particle_jitter,
            velocity_rule: VelocityRule::Damped {
                gravity_scale: tuning.particle_gravity_scale,
                damping: tuning.particle_damping,
            },
        }
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// Lifetime in frames: the ceiling minus an exponential draw
    fn sample_lifetime(&mut self) -> f32 {
        let u: f32 = self.rng.random();
        self.lifetime + self.lifetime_decay * (1.0 - u).ln()
    }

    /// Spawn one particle at `position` moving with `velocity`
    pub fn emit(&mut self, space: &mut Space, position: Vec2, velocity: Vec2) -> BodyHandle {
        let duration = self.sample_lifetime();
        let body = Body::new_dynamic(self.mass, f32::INFINITY)
            .with_position(position)
            .with_velocity(velocity)
            .with_velocity_rule(self.velocity_rule);
        let (radius, friction) = (self.radius, self.friction);
        let (body, _) = space.add_body_with_shape(body, |b| {
            Shape::new(b, Geometry::Circle { offset: Vec2::ZERO, radius })
                .with_filter(ShapeFilter::group(PARTICLE_GROUP))
                .with_friction(friction)
        });
        self.particles.push(Particle { body, duration });
        body
    }

    /// Spawn `count` particles flying against `direction` at a speed drawn
    /// from `speed`; `origin` picks each spawn point
    pub fn emit_burst(
        &mut self,
        space: &mut Space,
        count: usize,
        speed: [f32; 2],
        direction: Vec2,
        mut origin: impl FnMut(&mut Pcg32) -> Vec2,
    ) {
        for _ in 0..count {
            let position = origin(&mut self.rng);
            let velocity = -self.rng.random_range(speed[0]..=speed[1]) * direction;
            self.emit(space, position, velocity);
        }
    }

    /// Wobble velocities, age particles and cull the expired ones
    pub fn update(&mut self, space: &mut Space) {
        let jitter = self.jitter;
        for particle in &mut self.particles {
            if let Some(body) = space.body_mut(particle.body) {
                let angle = if jitter > 0.0 {
                    self.rng.random_range(-jitter..=jitter)
                } else {
                    0.0
                };
                body.velocity = rotated_degrees(body.velocity, angle);
            }
            particle.duration -= 1.0;
        }
        self.particles.retain(|particle| {
            let alive = particle.duration > 0.0 && space.contains_body(particle.body);
            if !alive {
                space.remove_body(particle.body);
            }
            alive
        });
    }

    /// Render each particle as a pixel, or occasionally a 2x2 spark
    pub fn draw(&mut self, camera: &Camera, canvas: &mut impl Canvas, space: &Space) {
        for particle in &self.particles {
            let Some(body) = space.body(particle.body) else {
                continue;
            };
            let color = particle_color(particle.duration);
            if self.rng.random_bool(self.spark_chance) {
                camera.rect(canvas, body.position, Vec2::splat(2.0), color);
            } else {
                camera.pset(canvas, body.position, color);
            }
        }
    }

    /// Remove every particle from the space
    pub fn clear(&mut self, space: &mut Space) {
        for particle in self.particles.drain(..) {
            space.remove_body(particle.body);
        }
    }
}
