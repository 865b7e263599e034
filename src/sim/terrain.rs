//! Procedural terrain
//!
//! Two random-walk chains of thick segments leave the base's bottom corners,
//! one heading right and one heading left. Each step moves a fixed distance
//! horizontally and a uniformly random amount vertically.

use glam::Vec2;
use rand::Rng;

use crate::physics::{Aabb, CollisionType, Geometry, Shape, ShapeHandle, Space};
use crate::tuning::Tuning;

/// One chain of connected floor segments
#[derive(Debug, Clone, Default)]
pub struct Chain {
    /// `n + 1` points for `n` segments
    pub points: Vec<Vec2>,
    pub shapes: Vec<ShapeHandle>,
}

impl Chain {
    pub fn segments(&self) -> impl Iterator<Item = (Vec2, Vec2)> + '_ {
        self.points.windows(2).map(|w| (w[0], w[1]))
    }
}

/// The floor on both sides of the base
#[derive(Debug, Clone, Default)]
pub struct Terrain {
    pub right: Chain,
    pub left: Chain,
}

impl Terrain {
    /// Generate both chains from the base's bounding box and attach them to
    /// the space's static body
    pub fn generate(space: &mut Space, base: &Aabb, tuning: &Tuning, rng: &mut impl Rng) -> Self {
        let right = random_walk(
            Vec2::new(base.right(), base.bottom()),
            tuning.floor_step,
            tuning.floor_dy,
            tuning.floor_n,
            rng,
        );
        let left = random_walk(
            Vec2::new(base.left(), base.bottom()),
            -tuning.floor_step,
            tuning.floor_dy,
            tuning.floor_n,
            rng,
        );
        let terrain = Self {
            right: attach(space, right, tuning),
            left: attach(space, left, tuning),
        };
        log::debug!(
            "Terrain: {} segments right, {} left",
            terrain.right.shapes.len(),
            terrain.left.shapes.len()
        );
        terrain
    }

    pub fn segment_count(&self) -> usize {
        self.right.shapes.len() + self.left.shapes.len()
    }

    pub fn shapes(&self) -> impl Iterator<Item = ShapeHandle> + '_ {
        self.right.shapes.iter().chain(&self.left.shapes).copied()
    }
}

/// `n + 1` points starting at `start`, each `step` further along x and up to
/// `dy` higher or lower than the previous one
pub fn random_walk(start: Vec2, step: f32, dy: f32, n: usize, rng: &mut impl Rng) -> Vec<Vec2> {
    let mut points = Vec::with_capacity(n + 1);
    points.push(start);
    let mut p = start;
    for _ in 0..n {
        let jitter = if dy > 0.0 { rng.random_range(-dy..=dy) } else { 0.0 };
        p += Vec2::new(step, jitter);
        points.push(p);
    }
    points
}

fn attach(space: &mut Space, points: Vec<Vec2>, tuning: &Tuning) -> Chain {
    let body = space.static_body();
    let shapes = points
        .windows(2)
        .map(|w| {
            space.add_shape(
                Shape::new(
                    body,
                    Geometry::Segment {
                        a: w[0],
                        b: w[1],
                        radius: tuning.floor_radius,
                    },
                )
                .with_collision_type(CollisionType::Floor)
                .with_friction(tuning.friction),
            )
        })
        .collect();
    Chain { points, shapes }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::{any, prop_assert, prop_assert_eq, proptest};
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_generate_attaches_floor_segments() {
        let tuning = Tuning::default();
        let mut space = Space::new(tuning.gravity);
        let base = Aabb {
            min: Vec2::new(-12.5, -2.5),
            max: Vec2::new(12.5, 2.5),
        };
        let mut rng = Pcg32::seed_from_u64(3);
        let terrain = Terrain::generate(&mut space, &base, &tuning, &mut rng);

        assert_eq!(terrain.segment_count(), 84);
        assert_eq!(terrain.right.shapes.len(), 42);
        assert_eq!(terrain.left.shapes.len(), 42);
        assert_eq!(terrain.right.points[0], Vec2::new(12.5, -2.5));
        assert_eq!(terrain.left.points[0], Vec2::new(-12.5, -2.5));
        // Right chain walks right, left chain walks left
        for (a, b) in terrain.right.segments() {
            assert!((b.x - a.x - 30.0).abs() < 1e-3);
            assert!((b.y - a.y).abs() <= 15.0 + 1e-3);
        }
        for (a, b) in terrain.left.segments() {
            assert!((b.x - a.x + 30.0).abs() < 1e-3);
            assert!((b.y - a.y).abs() <= 15.0 + 1e-3);
        }
        for shape in terrain.shapes() {
            let shape = space.shape(shape).expect("segment in space");
            assert_eq!(shape.collision_type, CollisionType::Floor);
            assert_eq!(shape.body, space.static_body());
            assert_eq!(shape.geometry.radius(), 1.0);
        }
        // Segments chain end to end
        let ends: Vec<_> = terrain.left.segments().collect();
        for pair in ends.windows(2) {
            assert_eq!(pair[0].1, pair[1].0);
        }
    }

    proptest! {
        #[test]
        fn prop_walk_steps_are_bounded(seed in any::<u64>(), n in 1usize..64, rightward in any::<bool>()) {
            let mut rng = Pcg32::seed_from_u64(seed);
            let start = Vec2::new(4.0, -7.0);
            let step = if rightward { 30.0 } else { -30.0 };
            let points = random_walk(start, step, 15.0, n, &mut rng);
            prop_assert_eq!(points.len(), n + 1);
            prop_assert_eq!(points[0], start);
            for w in points.windows(2) {
                let d = w[1] - w[0];
                prop_assert!((d.x - step).abs() < 1e-3);
                prop_assert!(d.y.abs() <= 15.0 + 1e-3);
            }
        }
    }
}
