//! Software rasterizer over the 16-color palette

use std::io::Write;
use std::path::Path;

use glam::Vec2;

use super::{Canvas, Color, FONT_WIDTH};
use crate::error::Result;

/// 3x5 glyphs, one row per byte, most significant of the low 3 bits on the left
fn glyph(c: char) -> [u8; 5] {
    match c.to_ascii_uppercase() {
        'A' => [2, 5, 7, 5, 5],
        'B' => [6, 5, 6, 5, 6],
        'C' => [3, 4, 4, 4, 3],
        'D' => [6, 5, 5, 5, 6],
        'E' => [7, 4, 6, 4, 7],
        'F' => [7, 4, 6, 4, 4],
        'G' => [3, 4, 5, 5, 3],
        'H' => [5, 5, 7, 5, 5],
        'I' => [7, 2, 2, 2, 7],
        'J' => [1, 1, 1, 5, 2],
        'K' => [5, 5, 6, 5, 5],
        'L' => [4, 4, 4, 4, 7],
        'M' => [5, 7, 7, 5, 5],
        'N' => [6, 5, 5, 5, 5],
        'O' => [2, 5, 5, 5, 2],
        'P' => [6, 5, 6, 4, 4],
        'Q' => [2, 5, 5, 6, 3],
        'R' => [6, 5, 6, 5, 5],
        'S' => [3, 4, 2, 1, 6],
        'T' => [7, 2, 2, 2, 2],
        'U' => [5, 5, 5, 5, 7],
        'V' => [5, 5, 5, 5, 2],
        'W' => [5, 5, 7, 7, 5],
        'X' => [5, 5, 2, 5, 5],
        'Y' => [5, 5, 2, 2, 2],
        'Z' => [7, 1, 2, 4, 7],
        '0' => [7, 5, 5, 5, 7],
        '1' => [2, 6, 2, 2, 7],
        '2' => [6, 1, 2, 4, 7],
        '3' => [6, 1, 2, 1, 6],
        '4' => [5, 5, 7, 1, 1],
        '5' => [7, 4, 6, 1, 6],
        '6' => [3, 4, 6, 5, 2],
        '7' => [7, 1, 2, 2, 2],
        '8' => [2, 5, 2, 5, 2],
        '9' => [2, 5, 3, 1, 6],
        '!' => [2, 2, 2, 0, 2],
        ':' => [0, 2, 0, 2, 0],
        '(' => [1, 2, 2, 2, 1],
        ')' => [4, 2, 2, 2, 4],
        '.' => [0, 0, 0, 0, 2],
        '-' => [0, 0, 7, 0, 0],
        ' ' => [0; 5],
        _ => [7; 5],
    }
}

/// Indexed-color pixel buffer
#[derive(Debug, Clone, PartialEq)]
pub struct Framebuffer {
    width: u32,
    height: u32,
    pixels: Vec<Color>,
}

impl Framebuffer {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![Color::Black; (width * height) as usize],
        }
    }

    pub fn pixel(&self, x: i32, y: i32) -> Option<Color> {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return None;
        }
        Some(self.pixels[(y as u32 * self.width + x as u32) as usize])
    }

    /// Number of pixels currently holding `color`
    pub fn count(&self, color: Color) -> usize {
        self.pixels.iter().filter(|&&c| c == color).count()
    }

    #[inline]
    fn put(&mut self, x: i32, y: i32, color: Color) {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return;
        }
        self.pixels[(y as u32 * self.width + x as u32) as usize] = color;
    }

    /// Binary PPM (P6) encoding of the current frame
    pub fn write_ppm(&self, out: &mut impl Write) -> std::io::Result<()> {
        write!(out, "P6\n{} {}\n255\n", self.width, self.height)?;
        let mut bytes = Vec::with_capacity(self.pixels.len() * 3);
        for color in &self.pixels {
            bytes.extend_from_slice(&color.rgb());
        }
        out.write_all(&bytes)
    }

    pub fn save_ppm(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = std::io::BufWriter::new(std::fs::File::create(path.as_ref())?);
        self.write_ppm(&mut file)?;
        file.flush()?;
        log::info!("Frame written to {}", path.as_ref().display());
        Ok(())
    }
}

impl Canvas for Framebuffer {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn cls(&mut self, color: Color) {
        self.pixels.fill(color);
    }

    fn rect(&mut self, pos: Vec2, size: Vec2, color: Color) {
        let (x0, y0) = (pos.x.floor() as i32, pos.y.floor() as i32);
        let (w, h) = (size.x.round() as i32, size.y.round() as i32);
        for y in y0..y0 + h {
            for x in x0..x0 + w {
                self.put(x, y, color);
            }
        }
    }

    fn pset(&mut self, pos: Vec2, color: Color) {
        self.put(pos.x.floor() as i32, pos.y.floor() as i32, color);
    }

    fn line(&mut self, from: Vec2, to: Vec2, color: Color) {
        let delta = to - from;
        let steps = delta.abs().max_element().ceil().max(1.0) as i32;
        for i in 0..=steps {
            let p = from + delta * (i as f32 / steps as f32);
            self.pset(p, color);
        }
    }

    fn tri(&mut self, a: Vec2, b: Vec2, c: Vec2, color: Color) {
        let min = a.min(b).min(c).floor();
        let max = a.max(b).max(c).ceil();
        let area = (b - a).perp_dot(c - a);
        if area.abs() < f32::EPSILON {
            self.line(a, b, color);
            self.line(b, c, color);
            return;
        }
        for y in min.y as i32..=max.y as i32 {
            for x in min.x as i32..=max.x as i32 {
                let p = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
                let w0 = (b - a).perp_dot(p - a) / area;
                let w1 = (c - b).perp_dot(p - b) / area;
                let w2 = (a - c).perp_dot(p - c) / area;
                if w0 >= 0.0 && w1 >= 0.0 && w2 >= 0.0 {
                    self.put(x, y, color);
                }
            }
        }
        // Thin slivers would otherwise vanish
        self.pset(a, color);
        self.pset(b, color);
        self.pset(c, color);
    }

    fn circ(&mut self, center: Vec2, radius: f32, color: Color) {
        let (cx, cy) = (center.x.floor() as i32, center.y.floor() as i32);
        let r = radius.round() as i32;
        for dy in -r..=r {
            for dx in -r..=r {
                if dx * dx + dy * dy <= r * r {
                    self.put(cx + dx, cy + dy, color);
                }
            }
        }
    }

    fn text(&mut self, pos: Vec2, text: &str, color: Color) {
        let (x0, y0) = (pos.x.floor() as i32, pos.y.floor() as i32);
        for (i, c) in text.chars().enumerate() {
            let gx = x0 + i as i32 * FONT_WIDTH as i32;
            for (row, bits) in glyph(c).iter().enumerate() {
                for col in 0..3 {
                    if bits & (4 >> col) != 0 {
                        self.put(gx + col, y0 + row as i32, color);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_and_pset_clip_to_bounds() {
        let mut fb = Framebuffer::new(8, 8);
        fb.rect(Vec2::new(6.0, 6.0), Vec2::new(4.0, 4.0), Color::Red);
        assert_eq!(fb.count(Color::Red), 4);
        fb.pset(Vec2::new(-1.0, 3.0), Color::White);
        assert_eq!(fb.count(Color::White), 0);
    }

    #[test]
    fn test_triangle_fill_covers_interior() {
        let mut fb = Framebuffer::new(16, 16);
        fb.tri(Vec2::new(1.0, 1.0), Vec2::new(14.0, 1.0), Vec2::new(1.0, 14.0), Color::Pink);
        assert_eq!(fb.pixel(3, 3), Some(Color::Pink));
        assert_eq!(fb.pixel(13, 13), Some(Color::Black));
    }

    #[test]
    fn test_text_draws_glyph_pixels() {
        let mut fb = Framebuffer::new(64, 8);
        fb.text(Vec2::new(0.0, 0.0), "PERDEU :(", Color::Red);
        assert!(fb.count(Color::Red) > 30);
        // 'P' top row is 110
        assert_eq!(fb.pixel(0, 0), Some(Color::Red));
        assert_eq!(fb.pixel(2, 0), Some(Color::Black));
    }

    #[test]
    fn test_ppm_header_and_size() {
        let fb = Framebuffer::new(3, 2);
        let mut out = Vec::new();
        fb.write_ppm(&mut out).expect("write to vec");
        let header = b"P6\n3 2\n255\n";
        assert!(out.starts_with(header));
        assert_eq!(out.len(), header.len() + 3 * 2 * 3);
    }
}
