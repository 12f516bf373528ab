//! Draw-command rasterizer: paints an ordered display list onto a pixel
//! surface with the painter's algorithm.
//!
//! Commands are painted strictly in sequence order, each composited on top
//! of everything painted before it, so later opaque shapes fully occlude
//! earlier ones at overlapping pixels. Coordinates arrive already resolved
//! into one flat space; the rasterizer clips to the surface and never
//! transforms.
//!
//! An unrecognized command is a fatal [`RasterError`] for the whole pass —
//! skipping it would produce a visually wrong but undetected result, so the
//! caller is expected to treat the error like a pipeline failure and keep
//! the previous canvas.

pub mod font;

use crate::model::{Color, DrawCommand, Edges, Point, Rect};
use thiserror::Error;

/// Background the surface is cleared to before each pass.
pub const BACKGROUND: Color = Color::rgb(255, 255, 255);

/// Fallback text size when a font string cannot be parsed.
const DEFAULT_FONT_SIZE: f32 = 10.0;

/// Errors raised while painting a display list.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RasterError {
    #[error("unrecognized draw command kind `{kind}`")]
    UnknownCommand { kind: String },
}

/// A width x height grid of straight-alpha RGBA pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelSurface {
    width: u32,
    height: u32,
    pixels: Vec<Color>,
}

impl PixelSurface {
    /// A surface cleared to the default background.
    pub fn new(width: u32, height: u32) -> Self {
        PixelSurface {
            width,
            height,
            pixels: vec![BACKGROUND; (width as usize) * (height as usize)],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// The pixel at (x, y). Panics if out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> Color {
        assert!(x < self.width && y < self.height, "pixel out of bounds");
        self.pixels[(y as usize) * (self.width as usize) + (x as usize)]
    }

    /// Fill every pixel with `color`.
    pub fn clear(&mut self, color: Color) {
        self.pixels.fill(color);
    }

    /// Composite `src` over the pixel at (x, y); out-of-bounds writes are
    /// clipped silently.
    fn blend_pixel(&mut self, x: i64, y: i64, src: Color) {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return;
        }
        let idx = (y as usize) * (self.width as usize) + (x as usize);
        self.pixels[idx] = blend(self.pixels[idx], src);
    }

    fn fill_rect(&mut self, bounds: &Rect, color: Color) {
        let x0 = bounds.x.floor() as i64;
        let y0 = bounds.y.floor() as i64;
        let x1 = (bounds.x + bounds.width).ceil() as i64;
        let y1 = (bounds.y + bounds.height).ceil() as i64;
        for y in y0.max(0)..y1.min(self.height as i64) {
            for x in x0.max(0)..x1.min(self.width as i64) {
                self.blend_pixel(x, y, color);
            }
        }
    }
}

/// Source-over compositing with straight alpha. The destination is treated
/// as opaque (the surface is cleared to an opaque background first).
fn blend(dst: Color, src: Color) -> Color {
    if src.a == 255 {
        return src;
    }
    if src.a == 0 {
        return dst;
    }
    let a = src.a as u32;
    let inv = 255 - a;
    let channel = |s: u8, d: u8| (((s as u32) * a + (d as u32) * inv + 127) / 255) as u8;
    Color {
        r: channel(src.r, dst.r),
        g: channel(src.g, dst.g),
        b: channel(src.b, dst.b),
        a: dst.a,
    }
}

/// Paint `list` onto `surface` in order. The surface is cleared to the
/// background first so nothing ghosts through from a previous render.
pub fn rasterize(list: &[DrawCommand], surface: &mut PixelSurface) -> Result<(), RasterError> {
    surface.clear(BACKGROUND);
    for command in list {
        paint_command(surface, command)?;
    }
    Ok(())
}

fn paint_command(surface: &mut PixelSurface, command: &DrawCommand) -> Result<(), RasterError> {
    match command {
        DrawCommand::Rect { bounds, fill } => {
            surface.fill_rect(bounds, *fill);
            Ok(())
        }
        DrawCommand::Border {
            bounds,
            color,
            widths,
        } => {
            paint_border(surface, bounds, *color, widths);
            Ok(())
        }
        DrawCommand::Text {
            content,
            position,
            color,
            font,
        } => {
            paint_text(surface, content, position, *color, font_size(font));
            Ok(())
        }
        DrawCommand::Unknown { kind } => Err(RasterError::UnknownCommand { kind: kind.clone() }),
    }
}

/// Four edge strips inside the border box.
fn paint_border(surface: &mut PixelSurface, bounds: &Rect, color: Color, widths: &Edges) {
    // Left
    surface.fill_rect(
        &Rect::new(bounds.x, bounds.y, widths.left, bounds.height),
        color,
    );
    // Right
    surface.fill_rect(
        &Rect::new(
            bounds.x + bounds.width - widths.right,
            bounds.y,
            widths.right,
            bounds.height,
        ),
        color,
    );
    // Top
    surface.fill_rect(
        &Rect::new(bounds.x, bounds.y, bounds.width, widths.top),
        color,
    );
    // Bottom
    surface.fill_rect(
        &Rect::new(
            bounds.x,
            bounds.y + bounds.height - widths.bottom,
            bounds.width,
            widths.bottom,
        ),
        color,
    );
}

/// Paint a run of bitmap glyphs from the top-left of `position` ("hanging"
/// baseline, like the original canvas painter).
fn paint_text(surface: &mut PixelSurface, text: &str, position: &Point, color: Color, size: f32) {
    let scale = ((size / font::GLYPH_HEIGHT as f32).round() as i64).max(1);
    let advance = (font::GLYPH_WIDTH as i64 + 1) * scale;
    let mut pen_x = position.x.round() as i64;
    let pen_y = position.y.round() as i64;

    for ch in text.chars() {
        let rows = font::glyph(ch);
        for (row, bits) in rows.iter().enumerate() {
            for col in 0..font::GLYPH_WIDTH {
                if (bits >> (font::GLYPH_WIDTH - 1 - col)) & 1 == 0 {
                    continue;
                }
                // One glyph pixel becomes a scale x scale block.
                for dy in 0..scale {
                    for dx in 0..scale {
                        surface.blend_pixel(
                            pen_x + (col as i64) * scale + dx,
                            pen_y + (row as i64) * scale + dy,
                            color,
                        );
                    }
                }
            }
        }
        pen_x += advance;
    }
}

/// Parse the leading pixel size out of strings like `10px serif`.
fn font_size(font: &str) -> f32 {
    font.trim()
        .split("px")
        .next()
        .and_then(|n| n.trim().parse::<f32>().ok())
        .filter(|n| *n > 0.0)
        .unwrap_or(DEFAULT_FONT_SIZE)
}
