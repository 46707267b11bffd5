//! Line breaking and aligned text drawing.
//!
//! Text keeps its whitespace the way `white-space: pre-wrap` does: explicit
//! newlines always break, runs of spaces are kept inside a line, and only
//! the spaces a line is broken on are dropped. Words wider than the box are
//! split at the box edge.

use image::{Rgba, RgbaImage};

use super::glyph::{GlyphCache, GlyphStyle};
use crate::error::PrintError;
use crate::style::{Align, TextStyle};

/// One wrapped line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub text: String,
    /// Last line of its paragraph. Justified text leaves these ragged.
    pub ends_paragraph: bool,
}

/// Break `text` into lines of at most `max_chars` characters.
pub fn wrap(text: &str, max_chars: usize) -> Vec<Line> {
    let max_chars = max_chars.max(1);
    let mut lines = Vec::new();

    for paragraph in text.split('\n') {
        let mut current = String::new();
        let mut len = 0usize;
        let start = lines.len();

        for token in tokens(paragraph) {
            let token_len = token.chars().count();
            if len + token_len <= max_chars {
                current.push_str(token);
                len += token_len;
                continue;
            }
            if token.starts_with(' ') {
                // Break on the run of spaces and drop it.
                lines.push(Line { text: std::mem::take(&mut current), ends_paragraph: false });
                len = 0;
                continue;
            }
            if len > 0 {
                let text = current.trim_end_matches(' ').to_string();
                current.clear();
                lines.push(Line { text, ends_paragraph: false });
                len = 0;
            }
            let chars: Vec<char> = token.chars().collect();
            let mut chunks = chars.chunks(max_chars).peekable();
            while let Some(chunk) = chunks.next() {
                if chunks.peek().is_some() {
                    lines.push(Line { text: chunk.iter().collect(), ends_paragraph: false });
                } else {
                    current = chunk.iter().collect();
                    len = chunk.len();
                }
            }
        }

        if len > 0 || lines.len() == start {
            lines.push(Line { text: current, ends_paragraph: true });
        } else if let Some(last) = lines.last_mut() {
            last.ends_paragraph = true;
        }
    }
    lines
}

/// Alternating runs of spaces and non-spaces.
fn tokens(s: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut in_space = None;
    for (i, ch) in s.char_indices() {
        let space = ch == ' ';
        match in_space {
            Some(prev) if prev != space => {
                out.push(&s[start..i]);
                start = i;
            }
            _ => {}
        }
        in_space = Some(space);
    }
    if start < s.len() {
        out.push(&s[start..]);
    }
    out
}

/// Device-space text box.
#[derive(Debug, Clone, Copy)]
pub struct TextBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
}

pub fn glyph_style(style: &TextStyle, scale: f64) -> GlyphStyle {
    GlyphStyle {
        size: style.font_size.max(1.0) * scale,
        bold: style.bold,
        italic: style.italic,
        color: style.color.to_rgba8(),
    }
}

/// Draw wrapped, aligned text. Returns the height used.
pub fn draw_text(
    canvas: &mut RgbaImage,
    cache: &mut GlyphCache,
    text: &str,
    area: TextBox,
    style: &TextStyle,
    scale: f64,
) -> Result<f64, PrintError> {
    let glyphs = glyph_style(style, scale);
    let advance = glyphs.advance();
    let line_height = glyphs.line_height();
    let max_chars = (area.width / advance).floor().max(1.0) as usize;
    let top_pad = (line_height - glyphs.size) / 2.0;

    let lines = wrap(text, max_chars);
    for (i, line) in lines.iter().enumerate() {
        let y = area.y + i as f64 * line_height + top_pad;
        let used = line.text.chars().count() as f64 * advance;
        let slack = (area.width - used).max(0.0);

        let end = match style.align {
            Align::Justify if !line.ends_paragraph => {
                draw_justified(canvas, cache, &line.text, area.x, y, slack, &glyphs)?
            }
            Align::Center => cache.draw_str(canvas, &line.text, area.x + slack / 2.0, y, &glyphs)?,
            Align::Right => cache.draw_str(canvas, &line.text, area.x + slack, y, &glyphs)?,
            Align::Left | Align::Justify => cache.draw_str(canvas, &line.text, area.x, y, &glyphs)?,
        };

        if style.underline {
            let start = match style.align {
                Align::Center => area.x + slack / 2.0,
                Align::Right => area.x + slack,
                _ => area.x,
            };
            let thickness = (glyphs.size / 14.0).round().max(1.0);
            fill(canvas, start, y + glyphs.size - thickness, end - start, thickness, glyphs.color);
        }
    }
    Ok(lines.len() as f64 * line_height)
}

/// Spread `slack` over the gaps between words.
fn draw_justified(
    canvas: &mut RgbaImage,
    cache: &mut GlyphCache,
    line: &str,
    x: f64,
    y: f64,
    slack: f64,
    glyphs: &GlyphStyle,
) -> Result<f64, PrintError> {
    let runs = tokens(line);
    let gaps = runs.iter().filter(|t| t.starts_with(' ')).count();
    if gaps == 0 {
        return cache.draw_str(canvas, line, x, y, glyphs);
    }
    let extra = slack / gaps as f64;
    let mut cursor = x;
    for run in runs {
        cursor = cache.draw_str(canvas, run, cursor, y, glyphs)?;
        if run.starts_with(' ') {
            cursor += extra;
        }
    }
    Ok(cursor)
}

/// Fill a device-space rectangle, clipped to the canvas.
pub fn fill(canvas: &mut RgbaImage, x: f64, y: f64, width: f64, height: f64, color: [u8; 4]) {
    if !(width > 0.0 && height > 0.0) {
        return;
    }
    let (x0, y0) = (x.round() as i64, y.round() as i64);
    let x1 = ((x + width).round() as i64).max(x0.saturating_add(1));
    let y1 = ((y + height).round() as i64).max(y0.saturating_add(1));
    let (x0, x1) = (x0.max(0), x1.min(canvas.width() as i64));
    let (y0, y1) = (y0.max(0), y1.min(canvas.height() as i64));
    let color = Rgba(color);
    for py in y0..y1 {
        for px in x0..x1 {
            canvas.put_pixel(px as u32, py as u32, color);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn texts(lines: &[Line]) -> Vec<&str> {
        lines.iter().map(|l| l.text.as_str()).collect()
    }

    #[test]
    fn test_wrap_on_spaces() {
        let lines = wrap("the quick brown fox", 10);
        assert_eq!(texts(&lines), vec!["the quick", "brown fox"]);
        assert!(!lines[0].ends_paragraph);
        assert!(lines[1].ends_paragraph);
    }

    #[test]
    fn test_newlines_and_inner_spaces_are_kept() {
        let lines = wrap("a  b\n\n  c", 20);
        assert_eq!(texts(&lines), vec!["a  b", "", "  c"]);
        assert!(lines.iter().all(|l| l.ends_paragraph));
    }

    #[test]
    fn test_long_word_is_split() {
        let lines = wrap("abcdefghij k", 4);
        assert_eq!(texts(&lines), vec!["abcd", "efgh", "ij k"]);
    }

    #[test]
    fn test_empty_text_is_one_empty_line() {
        assert_eq!(texts(&wrap("", 5)), vec![""]);
    }

    #[test]
    fn test_tokens_alternate() {
        assert_eq!(tokens(" ab  c"), vec![" ", "ab", "  ", "c"]);
    }

    #[test]
    fn test_draw_text_height() {
        let mut canvas = RgbaImage::from_pixel(100, 100, Rgba([255, 255, 255, 255]));
        let area = TextBox { x: 0.0, y: 0.0, width: 70.0 };
        let h = draw_text(&mut canvas, &mut GlyphCache::new(), "aaaa bbbb", area, &TextStyle::sized(14.0), 1.0)
            .unwrap();
        // 70px holds ten 7px cells, so both words fit on one line.
        assert_eq!(h, 14.0 * 1.25);
    }

    #[test]
    fn test_right_aligned_ink_hugs_the_edge() {
        let mut canvas = RgbaImage::from_pixel(200, 40, Rgba([255, 255, 255, 255]));
        let area = TextBox { x: 0.0, y: 0.0, width: 200.0 };
        let style = TextStyle::sized(20.0).aligned(Align::Right);
        draw_text(&mut canvas, &mut GlyphCache::new(), "MM", area, &style, 1.0).unwrap();
        let min_x = canvas
            .enumerate_pixels()
            .filter(|(_, _, p)| p.0[0] < 128)
            .map(|(x, _, _)| x)
            .min()
            .unwrap();
        assert!(min_x >= 180, "leftmost ink at {}", min_x);
    }

    #[test]
    fn test_fill_is_clipped_to_canvas() {
        let mut canvas = RgbaImage::from_pixel(8, 4, Rgba([255, 255, 255, 255]));
        fill(&mut canvas, -1e15, 2.0, 1e300, 1e12, [0, 0, 0, 255]);
        assert!((0..8).all(|x| canvas.get_pixel(x, 3).0 == [0, 0, 0, 255]));
        assert_eq!(canvas.get_pixel(0, 1).0, [255, 255, 255, 255]);

        fill(&mut canvas, 100.0, 0.0, 5.0, 5.0, [9, 9, 9, 255]);
        fill(&mut canvas, 0.0, 0.0, f64::NAN, 5.0, [9, 9, 9, 255]);
        assert!(canvas.pixels().all(|p| p.0 != [9, 9, 9, 255]));
    }
}
