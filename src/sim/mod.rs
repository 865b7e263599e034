//! Deterministic game simulation
//!
//! All gameplay logic lives here:
//! - Fixed timestep only (one call to [`Game::update`] per frame)
//! - Seeded RNG only
//! - No platform dependencies; drawing goes through the `Canvas` trait

pub mod autopilot;
pub mod game;
pub mod handlers;
pub mod particles;
pub mod state;
pub mod terrain;

pub use autopilot::autopilot;
pub use game::{FrameInput, Game};
pub use handlers::lander_handlers;
pub use particles::{Particle, ParticleSystem, particle_color};
pub use state::{LanderState, Outcome, Planet, Player, Pose, planet_color};
pub use terrain::{Chain, Terrain, random_walk};
