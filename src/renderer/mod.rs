//! Rendering contract
//!
//! The game draws through the [`Canvas`] trait using a fixed 16-color
//! palette. [`Camera`] maps world coordinates (y up) to screen coordinates
//! (y down). Two canvases ship with the crate: [`DrawList`] records calls and
//! [`Framebuffer`] rasterizes them in software.

pub mod camera;
pub mod draw_list;
pub mod framebuffer;

pub use camera::Camera;
pub use draw_list::{DrawCommand, DrawList};
pub use framebuffer::Framebuffer;

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Width of one character cell of the built-in font
pub const FONT_WIDTH: f32 = 4.0;
/// Height of one character cell of the built-in font
pub const FONT_HEIGHT: f32 = 6.0;

/// Fixed 16-color palette
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum Color {
    #[default]
    Black = 0,
    Navy,
    Purple,
    Green,
    Brown,
    DarkBlue,
    LightBlue,
    White,
    Red,
    Orange,
    Yellow,
    Lime,
    Cyan,
    Gray,
    Pink,
    Peach,
}

impl Color {
    pub const ALL: [Color; 16] = [
        Color::Black,
        Color::Navy,
        Color::Purple,
        Color::Green,
        Color::Brown,
        Color::DarkBlue,
        Color::LightBlue,
        Color::White,
        Color::Red,
        Color::Orange,
        Color::Yellow,
        Color::Lime,
        Color::Cyan,
        Color::Gray,
        Color::Pink,
        Color::Peach,
    ];

    pub fn from_index(index: u8) -> Option<Self> {
        Self::ALL.get(index as usize).copied()
    }

    pub fn index(self) -> u8 {
        self as u8
    }

    pub fn rgb(self) -> [u8; 3] {
        match self {
            Color::Black => [0x00, 0x00, 0x00],
            Color::Navy => [0x2b, 0x33, 0x5f],
            Color::Purple => [0x7e, 0x20, 0x72],
            Color::Green => [0x19, 0x95, 0x9c],
            Color::Brown => [0x8b, 0x48, 0x52],
            Color::DarkBlue => [0x39, 0x5c, 0x98],
            Color::LightBlue => [0xa9, 0xc1, 0xff],
            Color::White => [0xee, 0xee, 0xee],
            Color::Red => [0xd4, 0x18, 0x6c],
            Color::Orange => [0xd3, 0x84, 0x41],
            Color::Yellow => [0xe9, 0xc3, 0x5b],
            Color::Lime => [0x70, 0xc6, 0xa9],
            Color::Cyan => [0x76, 0x96, 0xde],
            Color::Gray => [0xa3, 0xa3, 0xa3],
            Color::Pink => [0xff, 0x97, 0x98],
            Color::Peach => [0xed, 0xc7, 0xb0],
        }
    }
}

/// Screen-space drawing primitives provided by the host
pub trait Canvas {
    fn width(&self) -> u32;
    fn height(&self) -> u32;
    fn cls(&mut self, color: Color);
    /// Filled rectangle with top-left corner at `pos`
    fn rect(&mut self, pos: Vec2, size: Vec2, color: Color);
    fn pset(&mut self, pos: Vec2, color: Color);
    fn line(&mut self, from: Vec2, to: Vec2, color: Color);
    /// Filled triangle
    fn tri(&mut self, a: Vec2, b: Vec2, c: Vec2, color: Color);
    /// Filled circle
    fn circ(&mut self, center: Vec2, radius: f32, color: Color);
    fn text(&mut self, pos: Vec2, text: &str, color: Color);
}
