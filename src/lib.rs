//! Moon Lander - a physics-driven lunar lander arcade game
//!
//! Core modules:
//! - `physics`: Rigid bodies, shapes, contact solving and collision handlers
//! - `sim`: Game controller, collision state machine, terrain and particles
//! - `renderer`: Drawing contract (palette, canvas, camera) and software canvases
//! - `tuning`: Data-driven gameplay constants
//! - `error`: Errors for configuration loading and frame export

pub mod error;
pub mod physics;
pub mod renderer;
pub mod sim;
pub mod tuning;

pub use error::LanderError;
pub use sim::{FrameInput, Game, Outcome};
pub use tuning::Tuning;

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Frames per second of the fixed-rate frame driver
    pub const FPS: u32 = 30;
    /// Fixed simulation timestep per frame
    pub const FRAME_DT: f32 = 1.0 / FPS as f32;

    /// Screen dimensions in pixels
    pub const WIDTH: f32 = 256.0;
    pub const HEIGHT: f32 = 196.0;

    /// Filter group shared by the craft and all particles
    pub const PARTICLE_GROUP: u32 = 1;

    /// Status line shown after a soft landing
    pub const VICTORY_MESSAGE: &str = "PARABENS!";
    /// Status line shown after a crash or hard landing
    pub const DEFEAT_MESSAGE: &str = "PERDEU :(";
}

/// Screen size as a vector
#[inline]
pub fn screen() -> Vec2 {
    Vec2::new(consts::WIDTH, consts::HEIGHT)
}

/// Rotate a vector counter-clockwise by `degrees`
#[inline]
pub fn rotated_degrees(v: Vec2, degrees: f32) -> Vec2 {
    Vec2::from_angle(degrees.to_radians()).rotate(v)
}
