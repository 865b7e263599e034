//! Rigid-body physics
//!
//! A compact 2D engine covering what the game needs from a physics
//! collaborator:
//! - Bodies with mass/moment/velocity and per-body velocity rules
//! - Circle, polygon, box and segment shapes with collision types and group filters
//! - Sub-stepped simulation with a sequential-impulse contact solver
//! - Collision handlers keyed by collision type pair (begin / post-solve)
//! - Removal requests during a step are deferred until the step ends

pub mod arbiter;
pub mod arena;
pub mod body;
pub mod collide;
pub mod shape;
pub mod space;

pub use arbiter::{Arbiter, CollisionHandler, HandlerTable};
pub use body::{Body, BodyHandle, BodyKind, VelocityRule, moment_for_circle};
pub use collide::{ContactPoint, Manifold, collide};
pub use shape::{Aabb, CollisionType, Geometry, Shape, ShapeFilter, ShapeHandle, WorldGeometry};
pub use space::Space;
