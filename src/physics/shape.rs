//! Collision shapes attached to bodies

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::arena::Index;
use super::body::{Body, BodyHandle};
use crate::renderer::Color;

/// Handle to a shape stored in a [`super::Space`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ShapeHandle(pub(crate) Index);

/// Tag selecting which collision handler applies to a pair of shapes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CollisionType {
    /// Untagged (debris); collides physically but never triggers handlers
    #[default]
    Default,
    Player,
    Base,
    Floor,
    Planet,
}

/// Group filter: shapes sharing a non-zero group never collide with each other
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ShapeFilter {
    pub group: u32,
}

impl ShapeFilter {
    pub const NONE: ShapeFilter = ShapeFilter { group: 0 };

    pub fn group(group: u32) -> Self {
        Self { group }
    }

    #[inline]
    pub fn rejects(&self, other: &ShapeFilter) -> bool {
        self.group != 0 && self.group == other.group
    }
}

/// Shape geometry in body-local coordinates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Geometry {
    Circle { offset: Vec2, radius: f32 },
    /// Convex polygon, counter-clockwise winding
    Poly { verts: Vec<Vec2>, radius: f32 },
    Segment { a: Vec2, b: Vec2, radius: f32 },
}

impl Geometry {
    /// Axis-aligned box centered on the body origin
    pub fn boxed(width: f32, height: f32) -> Self {
        let (hw, hh) = (width / 2.0, height / 2.0);
        Geometry::Poly {
            verts: vec![
                Vec2::new(-hw, -hh),
                Vec2::new(hw, -hh),
                Vec2::new(hw, hh),
                Vec2::new(-hw, hh),
            ],
            radius: 0.0,
        }
    }

    /// Polygon from arbitrary vertex order; reorders to counter-clockwise
    pub fn poly(verts: &[Vec2]) -> Self {
        let mut verts = verts.to_vec();
        let mut area = 0.0;
        for i in 0..verts.len() {
            let j = (i + 1) % verts.len();
            area += verts[i].perp_dot(verts[j]);
        }
        if area < 0.0 {
            verts.reverse();
        }
        Geometry::Poly { verts, radius: 0.0 }
    }

    pub fn radius(&self) -> f32 {
        match self {
            Geometry::Circle { radius, .. }
            | Geometry::Poly { radius, .. }
            | Geometry::Segment { radius, .. } => *radius,
        }
    }
}

/// World-space bounding box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec2,
    pub max: Vec2,
}

impl Aabb {
    pub fn from_points(points: &[Vec2], radius: f32) -> Self {
        let mut min = Vec2::splat(f32::INFINITY);
        let mut max = Vec2::splat(f32::NEG_INFINITY);
        for &p in points {
            min = min.min(p);
            max = max.max(p);
        }
        Self {
            min: min - Vec2::splat(radius),
            max: max + Vec2::splat(radius),
        }
    }

    #[inline]
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
    }

    pub fn left(&self) -> f32 {
        self.min.x
    }

    pub fn right(&self) -> f32 {
        self.max.x
    }

    pub fn bottom(&self) -> f32 {
        self.min.y
    }

    pub fn top(&self) -> f32 {
        self.max.y
    }
}

/// A shape attached to exactly one body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shape {
    pub body: BodyHandle,
    pub geometry: Geometry,
    pub collision_type: CollisionType,
    pub filter: ShapeFilter,
    pub friction: f32,
    /// Restitution; zero means perfectly inelastic
    pub elasticity: f32,
    /// Display color override used by the camera
    pub color: Option<Color>,
}

impl Shape {
    pub fn new(body: BodyHandle, geometry: Geometry) -> Self {
        Self {
            body,
            geometry,
            collision_type: CollisionType::Default,
            filter: ShapeFilter::NONE,
            friction: 1.0,
            elasticity: 0.0,
            color: None,
        }
    }

    pub fn with_collision_type(mut self, collision_type: CollisionType) -> Self {
        self.collision_type = collision_type;
        self
    }

    pub fn with_filter(mut self, filter: ShapeFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_friction(mut self, friction: f32) -> Self {
        self.friction = friction;
        self
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = Some(color);
        self
    }

    /// Geometry transformed into world space
    pub fn world_geometry(&self, body: &Body) -> WorldGeometry {
        match &self.geometry {
            Geometry::Circle { offset, radius } => WorldGeometry::Circle {
                center: body.local_to_world(*offset),
                radius: *radius,
            },
            Geometry::Poly { verts, radius } => WorldGeometry::Hull {
                verts: verts.iter().map(|&v| body.local_to_world(v)).collect(),
                radius: *radius,
            },
            Geometry::Segment { a, b, radius } => WorldGeometry::Hull {
                verts: vec![body.local_to_world(*a), body.local_to_world(*b)],
                radius: *radius,
            },
        }
    }

    pub fn bounding_box(&self, body: &Body) -> Aabb {
        self.world_geometry(body).bounding_box()
    }
}

/// Shape geometry resolved to world space for narrow-phase tests
///
/// Segments become two-vertex hulls, so every non-circle is a rounded
/// convex hull.
#[derive(Debug, Clone, PartialEq)]
pub enum WorldGeometry {
    Circle { center: Vec2, radius: f32 },
    Hull { verts: Vec<Vec2>, radius: f32 },
}

impl WorldGeometry {
    pub fn bounding_box(&self) -> Aabb {
        match self {
            WorldGeometry::Circle { center, radius } => Aabb::from_points(&[*center], *radius),
            WorldGeometry::Hull { verts, radius } => Aabb::from_points(verts, *radius),
        }
    }
}
