//! Canvas that records draw calls instead of rasterizing them

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::{Canvas, Color};

/// One recorded canvas call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DrawCommand {
    Cls(Color),
    Rect { pos: Vec2, size: Vec2, color: Color },
    Pset { pos: Vec2, color: Color },
    Line { from: Vec2, to: Vec2, color: Color },
    Tri { a: Vec2, b: Vec2, c: Vec2, color: Color },
    Circ { center: Vec2, radius: f32, color: Color },
    Text { pos: Vec2, text: String, color: Color },
}

/// Recording canvas, handy for hosts that batch draw calls and for tests
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DrawList {
    pub width: u32,
    pub height: u32,
    pub commands: Vec<DrawCommand>,
}

impl DrawList {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            commands: Vec::new(),
        }
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }

    /// Every string drawn so far
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.commands.iter().filter_map(|c| match c {
            DrawCommand::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }

    /// Number of commands drawn with `color`
    pub fn count_color(&self, color: Color) -> usize {
        self.commands
            .iter()
            .filter(|c| match c {
                DrawCommand::Cls(c) => *c == color,
                DrawCommand::Rect { color: c, .. }
                | DrawCommand::Pset { color: c, .. }
                | DrawCommand::Line { color: c, .. }
                | DrawCommand::Tri { color: c, .. }
                | DrawCommand::Circ { color: c, .. }
                | DrawCommand::Text { color: c, .. } => *c == color,
            })
            .count()
    }
}

impl Canvas for DrawList {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn cls(&mut self, color: Color) {
        self.commands.push(DrawCommand::Cls(color));
    }

    fn rect(&mut self, pos: Vec2, size: Vec2, color: Color) {
        self.commands.push(DrawCommand::Rect { pos, size, color });
    }

    fn pset(&mut self, pos: Vec2, color: Color) {
        self.commands.push(DrawCommand::Pset { pos, color });
    }

    fn line(&mut self, from: Vec2, to: Vec2, color: Color) {
        self.commands.push(DrawCommand::Line { from, to, color });
    }

    fn tri(&mut self, a: Vec2, b: Vec2, c: Vec2, color: Color) {
        self.commands.push(DrawCommand::Tri { a, b, c, color });
    }

    fn circ(&mut self, center: Vec2, radius: f32, color: Color) {
        self.commands.push(DrawCommand::Circ { center, radius, color });
    }

    fn text(&mut self, pos: Vec2, text: &str, color: Color) {
        self.commands.push(DrawCommand::Text {
            pos,
            text: text.to_owned(),
            color,
        });
    }
}
