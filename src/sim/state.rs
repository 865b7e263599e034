//! Game state shared with the collision handlers
//!
//! [`LanderState`] is the context threaded through
//! [`Space::step`](crate::physics::Space::step): everything a handler may
//! read or change lives here, while the space itself is passed alongside.

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;

use super::particles::ParticleSystem;
use super::terrain::Terrain;
use crate::physics::{Body, BodyHandle, ShapeHandle, Space};
use crate::renderer::Color;
use crate::tuning::Tuning;

/// Local-frame point the exhaust and crash bursts come from (x is jittered)
pub const ENGINE_POINT: Vec2 = Vec2::new(0.0, -3.0);
/// Horizontal spread of the engine point
pub const ENGINE_SPREAD: f32 = 2.0;

/// The craft outline in its local frame
pub const PLAYER_VERTS: [Vec2; 3] = [
    Vec2::new(0.0, 6.0),
    Vec2::new(-3.0, -3.0),
    Vec2::new(3.0, -3.0),
];

/// Position and orientation snapshot of a body
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Pose {
    pub position: Vec2,
    pub angle: f32,
}

impl Pose {
    pub fn of(body: &Body) -> Self {
        Self {
            position: body.position,
            angle: body.angle,
        }
    }

    pub fn local_to_world(&self, point: Vec2) -> Vec2 {
        self.position + Vec2::from_angle(self.angle).rotate(point)
    }

    /// Perpendicular of the rotation vector (the craft's "up")
    pub fn heading(&self) -> Vec2 {
        Vec2::from_angle(self.angle).perp()
    }

    /// Random point on the engine nozzle
    pub fn engine_point(&self, rng: &mut impl Rng) -> Vec2 {
        let x = rng.random_range(-ENGINE_SPREAD..=ENGINE_SPREAD);
        self.local_to_world(ENGINE_POINT + Vec2::new(x, 0.0))
    }
}

/// The player's craft
#[derive(Debug, Clone, Copy)]
pub struct Player {
    pub body: BodyHandle,
    pub shape: ShapeHandle,
    /// Last known pose; kept after the body is destroyed
    pub pose: Pose,
}

/// The landing pad
#[derive(Debug, Clone, Copy)]
pub struct Base {
    pub body: BodyHandle,
    pub shape: ShapeHandle,
}

/// A falling hazard
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Planet {
    pub body: BodyHandle,
    pub shape: ShapeHandle,
    pub radius: u32,
    pub color: Color,
}

/// Display color of a hazard by radius
pub fn planet_color(radius: u32) -> Color {
    match radius {
        1..=2 => Color::Cyan,
        3..=5 => Color::Navy,
        6..=8 => Color::Yellow,
        9..=11 => Color::Purple,
        12 => Color::Red,
        _ => Color::Gray,
    }
}

/// How the round ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Outcome {
    /// Set once and never cleared
    pub landed: bool,
    pub victory: bool,
}

impl Outcome {
    /// Touch-down on the base; only the first one decides the result
    pub fn touch_down(&mut self, soft: bool) {
        if !self.landed {
            self.victory = soft;
        }
        self.landed = true;
    }

    pub fn crash(&mut self) {
        self.landed = true;
        self.victory = false;
    }
}

/// Mutable game state visible to collision handlers
pub struct LanderState {
    pub tuning: Tuning,
    pub player: Player,
    pub base: Base,
    pub terrain: Terrain,
    /// Live hazards in spawn order
    pub planets: Vec<Planet>,
    pub outcome: Outcome,
    pub particles: ParticleSystem,
    pub rng: Pcg32,
}

impl LanderState {
    /// Destroy the craft and throw a burst of wreckage from `origin`
    pub fn crash_player(&mut self, space: &mut Space, origin: Option<Vec2>) {
        self.outcome.crash();
        if let Some(body) = space.body(self.player.body) {
            self.player.pose = Pose::of(body);
        }
        space.remove_body(self.player.body);

        let pose = self.player.pose;
        log::info!("Craft destroyed at ({:.1}, {:.1})", pose.position.x, pose.position.y);
        self.particles.emit_burst(
            space,
            self.tuning.crash_burst,
            self.tuning.crash_speed,
            pose.heading(),
            |rng| origin.unwrap_or_else(|| pose.engine_point(rng)),
        );
    }

    /// Forget a hazard and take its body out of the space
    pub fn remove_planet(&mut self, space: &mut Space, shape: ShapeHandle) -> Option<Planet> {
        let Some(index) = self.planets.iter().position(|p| p.shape == shape) else {
            space.remove_shape(shape);
            return None;
        };
        let planet = self.planets.remove(index);
        space.remove_body(planet.body);
        log::debug!("Hazard removed ({} left)", self.planets.len());
        Some(planet)
    }

    /// Remove every tracked hazard
    pub fn clear_planets(&mut self, space: &mut Space) {
        for planet in self.planets.drain(..) {
            space.remove_body(planet.body);
        }
    }
}
