//! World-to-screen camera with vertical flip

use glam::Vec2;

use super::{Canvas, Color};
use crate::physics::{BodyHandle, ShapeHandle, Space, WorldGeometry};

/// Maps world coordinates (y up) onto the screen (y down)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    /// World point shown at the bottom-left corner of the screen
    pub offset: Vec2,
    /// Screen size in pixels
    pub screen: Vec2,
    pub flip_y: bool,
}

impl Camera {
    pub fn new(screen: Vec2) -> Self {
        Self {
            offset: Vec2::ZERO,
            screen,
            flip_y: true,
        }
    }

    /// Recenter the view on `target`
    pub fn follow(&mut self, target: Vec2) {
        self.offset = target - self.screen / 2.0;
    }

    pub fn to_screen(&self, world: Vec2) -> Vec2 {
        let p = world - self.offset;
        if self.flip_y {
            Vec2::new(p.x, self.screen.y - p.y)
        } else {
            p
        }
    }

    pub fn to_world(&self, screen: Vec2) -> Vec2 {
        let p = if self.flip_y {
            Vec2::new(screen.x, self.screen.y - screen.y)
        } else {
            screen
        };
        p + self.offset
    }

    /// Rectangle anchored at its bottom-left world corner
    pub fn rect(&self, canvas: &mut impl Canvas, pos: Vec2, size: Vec2, color: Color) {
        let corner = if self.flip_y {
            pos + Vec2::new(0.0, size.y)
        } else {
            pos
        };
        canvas.rect(self.to_screen(corner), size, color);
    }

    pub fn pset(&self, canvas: &mut impl Canvas, pos: Vec2, color: Color) {
        canvas.pset(self.to_screen(pos), color);
    }

    pub fn line(&self, canvas: &mut impl Canvas, from: Vec2, to: Vec2, color: Color) {
        canvas.line(self.to_screen(from), self.to_screen(to), color);
    }

    pub fn circ(&self, canvas: &mut impl Canvas, center: Vec2, radius: f32, color: Color) {
        canvas.circ(self.to_screen(center), radius, color);
    }

    /// Filled convex polygon given in world coordinates (triangle fan)
    pub fn poly(&self, canvas: &mut impl Canvas, verts: &[Vec2], color: Color) {
        match verts {
            [] => {}
            [p] => self.pset(canvas, *p, color),
            [a, b] => self.line(canvas, *a, *b, color),
            [first, rest @ ..] => {
                let origin = self.to_screen(*first);
                for pair in rest.windows(2) {
                    canvas.tri(origin, self.to_screen(pair[0]), self.to_screen(pair[1]), color);
                }
            }
        }
    }

    pub fn draw_geometry(&self, canvas: &mut impl Canvas, geometry: &WorldGeometry, color: Color) {
        match geometry {
            WorldGeometry::Circle { center, radius } => self.circ(canvas, *center, *radius, color),
            WorldGeometry::Hull { verts, .. } => self.poly(canvas, verts, color),
        }
    }

    /// Draw one shape using its own color, or `fallback` when it has none
    pub fn draw_shape(&self, canvas: &mut impl Canvas, space: &Space, shape: ShapeHandle, fallback: Color) {
        let Some(shape) = space.shape(shape) else {
            return;
        };
        let Some(body) = space.body(shape.body) else {
            return;
        };
        let color = shape.color.unwrap_or(fallback);
        self.draw_geometry(canvas, &shape.world_geometry(body), color);
    }

    /// Draw every shape attached to `body`
    pub fn draw_body(&self, canvas: &mut impl Canvas, space: &Space, body: BodyHandle, fallback: Color) {
        for shape in space.shapes_of(body) {
            self.draw_shape(canvas, space, shape, fallback);
        }
    }
}
