//! Gameplay tuning
//!
//! Every balance constant lives here so hosts can override them from JSON.
//! Missing keys fall back to the defaults.

use std::path::Path;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::error::{LanderError, Result};

/// Data-driven gameplay constants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // === World ===
    /// World gravity (acceleration)
    pub gravity: Vec2,
    /// Friction for every gameplay shape
    pub friction: f32,
    /// Physics sub-steps per frame
    pub sub_steps: u32,

    // === Craft ===
    pub player_mass: f32,
    pub player_moment: f32,
    /// Base thrust is `-thrust_factor * gravity`
    pub thrust_factor: f32,
    /// Multiplier applied to the base thrust while the engine fires
    pub thrust_multiplier: f32,
    /// Turn rate in degrees per second
    pub angular_speed: f32,
    /// Landing impulse at or above this is a crash
    pub max_impulse: f32,

    // === Base and terrain ===
    pub base_size: Vec2,
    /// Base sits this fraction of the screen height below the start point
    pub base_drop: f32,
    /// Horizontal distance between terrain points
    pub floor_step: f32,
    /// Maximum vertical jitter between terrain points
    pub floor_dy: f32,
    /// Segments per terrain chain
    pub floor_n: usize,
    pub floor_radius: f32,

    // === Hazards ===
    /// Probability of a hazard spawn per frame
    pub planet_spawn_chance: f64,
    pub planet_min_radius: u32,
    pub planet_max_radius: u32,

    // === Particles ===
    /// Lifetime ceiling in frames
    pub particle_lifetime: f32,
    /// Mean of the exponential lifetime reduction
    pub particle_lifetime_decay: f32,
    pub particle_mass: f32,
    pub particle_radius: f32,
    /// Chance a particle renders as a 2x2 spark
    pub spark_chance: f64,
    /// Maximum per-frame velocity wobble in degrees
    pub particle_jitter: f32,
    /// Fraction of world gravity applied to particles
    pub particle_gravity_scale: f32,
    /// Per-step velocity damping of particles
    pub particle_damping: f32,

    // === Bursts ===
    pub crash_burst: usize,
    pub crash_speed: [f32; 2],
    pub exhaust_burst: usize,
    pub exhaust_speed: [f32; 2],
    pub debris_burst: usize,
    pub debris_speed: [f32; 2],
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            gravity: Vec2::new(0.0, -25.0),
            friction: 1.0,
            sub_steps: 4,

            player_mass: 1.0,
            player_moment: 2.0,
            thrust_factor: 3.0,
            thrust_multiplier: 4.0,
            angular_speed: 180.0,
            max_impulse: 30.0,

            base_size: Vec2::new(25.0, 5.0),
            base_drop: 0.45,
            floor_step: 30.0,
            floor_dy: 15.0,
            floor_n: 42,
            floor_radius: 1.0,

            planet_spawn_chance: 1.0 / 8.0,
            planet_min_radius: 1,
            planet_max_radius: 12,

            particle_lifetime: 105.0,
            particle_lifetime_decay: 10.0,
            particle_mass: 0.1,
            particle_radius: 1.0,
            spark_chance: 0.15,
            particle_jitter: 5.0,
            particle_gravity_scale: 0.5,
            particle_damping: 0.99,

            crash_burst: 200,
            crash_speed: [100.0, 200.0],
            exhaust_burst: 2,
            exhaust_speed: [50.0, 90.0],
            debris_burst: 20,
            debris_speed: [100.0, 200.0],
        }
    }
}

impl Tuning {
    /// Base engine thrust (before the firing multiplier)
    pub fn thrust(&self) -> Vec2 {
        -self.thrust_factor * self.gravity
    }

    /// Parse from JSON and validate
    pub fn from_json(json: &str) -> Result<Self> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Load from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path.as_ref())?;
        let tuning = Self::from_json(&json)?;
        log::info!("Loaded tuning from {}", path.as_ref().display());
        Ok(tuning)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject values the simulation cannot run with
    pub fn validate(&self) -> Result<()> {
        fn invalid(field: &'static str, reason: impl Into<String>) -> Result<()> {
            Err(LanderError::InvalidConfig {
                field,
                reason: reason.into(),
            })
        }

        let non_positive = |x: f32| x.is_nan() || x <= 0.0;

        if self.sub_steps == 0 {
            return invalid("sub_steps", "must be at least 1");
        }
        if non_positive(self.player_mass) {
            return invalid("player_mass", "must be positive");
        }
        if non_positive(self.player_moment) {
            return invalid("player_moment", "must be positive");
        }
        if non_positive(self.max_impulse) {
            return invalid("max_impulse", "must be positive");
        }
        if self.floor_n == 0 {
            return invalid("floor_n", "terrain needs at least one segment");
        }
        if non_positive(self.floor_step) || self.floor_dy.is_nan() || self.floor_dy < 0.0 {
            return invalid("floor_step", "step must be positive and jitter non-negative");
        }
        if !(0.0..=1.0).contains(&self.planet_spawn_chance) {
            return invalid("planet_spawn_chance", "must be a probability");
        }
        if self.planet_min_radius == 0 || self.planet_min_radius > self.planet_max_radius {
            return invalid("planet_min_radius", "need 1 <= min <= max");
        }
        if !(0.0..=1.0).contains(&self.spark_chance) {
            return invalid("spark_chance", "must be a probability");
        }
        if non_positive(self.particle_mass) {
            return invalid("particle_mass", "must be positive");
        }
        for (field, [lo, hi]) in [
            ("crash_speed", self.crash_speed),
            ("exhaust_speed", self.exhaust_speed),
            ("debris_speed", self.debris_speed),
        ] {
            if lo > hi {
                return invalid(field, format!("range {lo}..{hi} is empty"));
            }
        }
        Ok(())
    }
}
