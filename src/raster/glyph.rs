//! Bitmap text drawing with the Spleen console fonts.
//!
//! Spleen glyphs are a 1:2 cell. A CSS font size of `s` pixels maps to a
//! cell `s` tall and `s / 2` wide, scaled nearest-neighbour from the closest
//! source face. Bold is a second strike one stem to the right, italic a
//! shear of one fifth of the cell height.

use std::collections::HashMap;

use image::{Rgba, RgbaImage};
use spleen_font::{PSF2Font, FONT_12X24, FONT_6X12};

use crate::error::PrintError;

/// Horizontal advance of one character, as a fraction of the font size.
pub const ADVANCE_RATIO: f64 = 0.5;
/// Line box height, as a multiple of the font size.
pub const LINE_HEIGHT: f64 = 1.25;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Face {
    /// 6x12, for small type.
    Small,
    /// 12x24.
    Large,
}

impl Face {
    fn for_height(px: usize) -> Self {
        if px <= 12 {
            Face::Small
        } else {
            Face::Large
        }
    }

    fn data(self) -> &'static [u8] {
        match self {
            Face::Small => FONT_6X12,
            Face::Large => FONT_12X24,
        }
    }

    fn cell(self) -> (usize, usize) {
        match self {
            Face::Small => (6, 12),
            Face::Large => (12, 24),
        }
    }
}

/// A decoded source glyph, row-major.
#[derive(Debug, Clone)]
struct Bitmap {
    width: usize,
    height: usize,
    bits: Vec<bool>,
}

impl Bitmap {
    fn get(&self, x: usize, y: usize) -> bool {
        self.bits.get(y * self.width + x).copied().unwrap_or(false)
    }

    /// Outline box drawn for characters the font doesn't cover.
    fn missing(width: usize, height: usize) -> Self {
        let mut bits = vec![false; width * height];
        for y in 1..height.saturating_sub(1) {
            for x in 1..width.saturating_sub(1) {
                if y == 1 || y == height - 2 || x == 1 || x == width - 2 {
                    bits[y * width + x] = true;
                }
            }
        }
        Self { width, height, bits }
    }
}

/// How a run of text is drawn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlyphStyle {
    /// Font size in device pixels.
    pub size: f64,
    pub bold: bool,
    pub italic: bool,
    pub color: [u8; 4],
}

impl GlyphStyle {
    pub fn advance(&self) -> f64 {
        self.size * ADVANCE_RATIO
    }

    pub fn line_height(&self) -> f64 {
        self.size * LINE_HEIGHT
    }
}

/// Decoded glyphs, kept for one render.
#[derive(Default)]
pub struct GlyphCache {
    glyphs: HashMap<(Face, char), Bitmap>,
}

impl GlyphCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn bitmap(&mut self, face: Face, ch: char) -> Result<&Bitmap, PrintError> {
        let key = (face, ch);
        if !self.glyphs.contains_key(&key) {
            let bitmap = decode(face, ch)?;
            self.glyphs.insert(key, bitmap);
        }
        self.glyphs
            .get(&key)
            .ok_or_else(|| PrintError::Raster(format!("glyph cache lost '{}'", ch)))
    }

    /// Draw `text` on one line with its cell's top-left at `(x, y)`.
    /// Returns the x just past the last character.
    pub fn draw_str(
        &mut self,
        canvas: &mut RgbaImage,
        text: &str,
        x: f64,
        y: f64,
        style: &GlyphStyle,
    ) -> Result<f64, PrintError> {
        let mut cursor = x;
        for ch in text.chars() {
            if !ch.is_whitespace() {
                self.draw_char(canvas, ch, cursor, y, style)?;
            }
            cursor += style.advance();
        }
        Ok(cursor)
    }

    fn draw_char(
        &mut self,
        canvas: &mut RgbaImage,
        ch: char,
        x: f64,
        y: f64,
        style: &GlyphStyle,
    ) -> Result<(), PrintError> {
        let cell_h = cell_px(style.size);
        let cell_w = cell_px(style.advance());
        let glyph = self.bitmap(Face::for_height(cell_h as usize), ch)?;
        let (gw, gh) = (glyph.width as i64, glyph.height as i64);
        let stem = if style.bold { cell_px(style.size / 14.0) } else { 0 };
        let color = Rgba(style.color);
        let (x0, y0) = (x.round() as i64, y.round() as i64);
        let (canvas_w, canvas_h) = (canvas.width() as i64, canvas.height() as i64);

        // Only rows that land on the canvas.
        let first = y0.saturating_neg().max(0);
        let last = canvas_h.saturating_sub(y0).min(cell_h);
        for ty in first..last {
            let sy = ty * gh / cell_h;
            let shear = if style.italic {
                ((cell_h - ty) as f64 * 0.2).round() as i64
            } else {
                0
            };
            let left = x0.saturating_add(shear);
            let py = y0 + ty;
            // Each lit source column covers a run of cell columns, widened by
            // the bold stem, clipped to the canvas.
            for sx in 0..gw {
                if !glyph.get(sx as usize, sy as usize) {
                    continue;
                }
                let tx0 = (sx * cell_w + gw - 1) / gw;
                let tx1 = ((sx + 1) * cell_w + gw - 1) / gw;
                if tx1 <= tx0 {
                    continue;
                }
                let run_start = left.saturating_add(tx0).max(0);
                let run_end = left.saturating_add(tx1).saturating_add(stem).min(canvas_w);
                for px in run_start..run_end {
                    put(canvas, px, py, color);
                }
            }
        }
        Ok(())
    }
}

/// Largest glyph cell side, in device pixels.
const MAX_CELL: i64 = 1 << 30;

fn cell_px(size: f64) -> i64 {
    if size.is_nan() {
        return 1;
    }
    (size.round() as i64).clamp(1, MAX_CELL)
}

fn decode(face: Face, ch: char) -> Result<Bitmap, PrintError> {
    let mut font = PSF2Font::new(face.data())
        .map_err(|_| PrintError::Raster("failed to load bitmap font".to_string()))?;
    let (width, height) = face.cell();
    let utf8 = ch.to_string();
    let Some(glyph) = font.glyph_for_utf8(utf8.as_bytes()) else {
        return Ok(Bitmap::missing(width, height));
    };

    let mut bits = vec![false; width * height];
    for (row_y, row) in glyph.enumerate() {
        for (col_x, on) in row.enumerate() {
            if row_y < height && col_x < width {
                bits[row_y * width + col_x] = on;
            }
        }
    }
    Ok(Bitmap { width, height, bits })
}

/// Set one pixel, ignoring anything off the canvas.
fn put(canvas: &mut RgbaImage, x: i64, y: i64, color: Rgba<u8>) {
    if x < 0 || y < 0 || x >= canvas.width() as i64 || y >= canvas.height() as i64 {
        return;
    }
    canvas.put_pixel(x as u32, y as u32, color);
}
