//! Drawing of data-block markup: headings, tables, bullet lists and prose
//! stacked top to bottom inside the element's rectangle.
//!
//! Spacing follows the HTML serialization: blocks are separated by half the
//! base font size, cells are padded 4px by 6px, list items are indented by
//! one and a half times the base size.

use image::RgbaImage;

use super::glyph::GlyphCache;
use super::text::{draw_text, fill, glyph_style, wrap, TextBox};
use crate::datablock::{Block, Markup, Table, TableLayout};
use crate::error::PrintError;
use crate::model::PixelRect;
use crate::style::{Color, TextStyle};

const CELL_PAD_X: f64 = 6.0;
const CELL_PAD_Y: f64 = 4.0;

/// Draw `markup` into `area` (device pixels). Returns the height used.
pub fn draw_markup(
    canvas: &mut RgbaImage,
    cache: &mut GlyphCache,
    markup: &Markup,
    area: PixelRect,
    scale: f64,
) -> Result<f64, PrintError> {
    let gap = markup.font_size * 0.5 * scale;
    let mut y = area.y;

    for block in &markup.blocks {
        let text_box = TextBox { x: area.x, y, width: area.width };
        match block {
            Block::Heading { text, style } | Block::Paragraph { text, style } => {
                y += draw_text(canvas, cache, text, text_box, style, scale)? + gap;
            }
            Block::List { items, style } => {
                y += draw_list(canvas, cache, items, style, text_box, markup.font_size * scale, scale)?;
            }
            Block::Table(table) => {
                y += draw_table(canvas, cache, table, text_box, scale)? + gap;
            }
        }
    }
    Ok(y - area.y)
}

fn draw_list(
    canvas: &mut RgbaImage,
    cache: &mut GlyphCache,
    items: &[String],
    style: &TextStyle,
    area: TextBox,
    base: f64,
    scale: f64,
) -> Result<f64, PrintError> {
    let indent = base * 1.5;
    let line_height = glyph_style(style, scale).line_height();
    let dot = (style.font_size * scale * 0.3).max(2.0);
    let mut y = area.y;

    for item in items {
        let bullet_x = area.x + indent * 0.5 - dot / 2.0;
        let bullet_y = y + (line_height - dot) / 2.0;
        fill(canvas, bullet_x, bullet_y, dot, dot, style.color.to_rgba8());

        let text_box = TextBox {
            x: area.x + indent,
            y,
            width: (area.width - indent).max(1.0),
        };
        y += draw_text(canvas, cache, item, text_box, style, scale)?;
    }
    Ok(y - area.y)
}

/// Height of a row whose cells are wrapped into their columns.
fn row_height(cells: &[String], widths: &[f64], style: &TextStyle, scale: f64) -> f64 {
    let glyphs = glyph_style(style, scale);
    let lines = cells
        .iter()
        .zip(widths)
        .map(|(cell, w)| {
            let inner = (w - 2.0 * CELL_PAD_X * scale).max(glyphs.advance());
            let max_chars = (inner / glyphs.advance()).floor().max(1.0) as usize;
            wrap(cell, max_chars).len()
        })
        .max()
        .unwrap_or(1);
    lines as f64 * glyphs.line_height() + 2.0 * CELL_PAD_Y * scale
}

fn draw_table(
    canvas: &mut RgbaImage,
    cache: &mut GlyphCache,
    table: &Table,
    area: TextBox,
    scale: f64,
) -> Result<f64, PrintError> {
    let widths: Vec<f64> = table.column_widths.iter().map(|f| f * area.width).collect();
    let black = Color::BLACK.to_rgba8();
    let hair = scale.max(1.0);
    let rule = 2.0 * scale;
    let mut y = area.y;

    let rows = std::iter::once((&table.header, &table.header_style, true))
        .chain(table.rows.iter().map(|r| (r, &table.body_style, false)));

    for (row, style, is_header) in rows {
        let height = row_height(&row.cells, &widths, style, scale);
        if let Some(bg) = row.background {
            fill(canvas, area.x, y, area.width, height, bg.to_rgba8());
        }

        let mut x = area.x;
        for (cell, w) in row.cells.iter().zip(&widths) {
            let text_box = TextBox {
                x: x + CELL_PAD_X * scale,
                y: y + CELL_PAD_Y * scale,
                width: (w - 2.0 * CELL_PAD_X * scale).max(1.0),
            };
            draw_text(canvas, cache, cell, text_box, style, scale)?;
            if table.layout == TableLayout::Grid {
                stroke(canvas, x, y, *w, height, hair, black);
            }
            x += w;
        }

        match (table.layout, is_header) {
            (TableLayout::Grid, _) | (TableLayout::Banded, false) => {}
            (TableLayout::Ruled, false) => fill(canvas, area.x, y + height - hair, area.width, hair, black),
            (_, true) => fill(canvas, area.x, y + height - rule, area.width, rule, black),
        }
        y += height;
    }
    Ok(y - area.y)
}

/// Outline a rectangle with lines `t` pixels thick.
fn stroke(canvas: &mut RgbaImage, x: f64, y: f64, w: f64, h: f64, t: f64, color: [u8; 4]) {
    fill(canvas, x, y, w, t, color);
    fill(canvas, x, y + h - t, w, t, color);
    fill(canvas, x, y, t, h, color);
    fill(canvas, x + w - t, y, t, h, color);
}
