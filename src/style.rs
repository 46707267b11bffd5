//! Inline style values shared by the data-block markup and the rasterizer.

/// An RGBA color.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f64, // 0.0 - 1.0
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl Color {
    pub const BLACK: Color = Color {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 1.0,
    };
    pub const WHITE: Color = Color {
        r: 1.0,
        g: 1.0,
        b: 1.0,
        a: 1.0,
    };

    pub fn rgb(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Parse `#rgb` or `#rrggbb`. Anything else is black.
    pub fn hex(hex: &str) -> Self {
        let digits = hex.trim_start_matches('#');
        let value = match u32::from_str_radix(digits, 16) {
            Ok(v) if digits.len() == 6 => v,
            // #abc -> #aabbcc
            Ok(v) if digits.len() == 3 => {
                let (r, g, b) = ((v >> 8) & 0xf, (v >> 4) & 0xf, v & 0xf);
                (r * 0x11) << 16 | (g * 0x11) << 8 | b * 0x11
            }
            _ => 0,
        };
        let channel = |shift: u32| ((value >> shift) & 0xff) as f64 / 255.0;
        Self::rgb(channel(16), channel(8), channel(0))
    }

    /// `#rrggbb`, alpha dropped.
    pub fn to_css(&self) -> String {
        let [r, g, b, _] = self.to_rgba8();
        format!("#{:02x}{:02x}{:02x}", r, g, b)
    }

    pub fn to_rgba8(&self) -> [u8; 4] {
        let c = |v: f64| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        [c(self.r), c(self.g), c(self.b), c(self.a)]
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::BLACK
    }
}

/// Horizontal text alignment inside a block.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
    Justify,
}

impl Align {
    pub fn css(&self) -> &'static str {
        match self {
            Align::Left => "left",
            Align::Center => "center",
            Align::Right => "right",
            Align::Justify => "justify",
        }
    }
}

impl From<crate::model::TextAlign> for Align {
    fn from(a: crate::model::TextAlign) -> Self {
        match a {
            crate::model::TextAlign::Left => Align::Left,
            crate::model::TextAlign::Center => Align::Center,
            crate::model::TextAlign::Right => Align::Right,
        }
    }
}

/// Typography for one run of text. Color is always black on printed output.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub font_size: f64,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub align: Align,
    pub color: Color,
}

impl TextStyle {
    pub fn sized(font_size: f64) -> Self {
        Self {
            font_size,
            bold: false,
            italic: false,
            underline: false,
            align: Align::Left,
            color: Color::BLACK,
        }
    }

    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    pub fn italic(mut self) -> Self {
        self.italic = true;
        self
    }

    pub fn underline(mut self) -> Self {
        self.underline = true;
        self
    }

    pub fn aligned(mut self, align: Align) -> Self {
        self.align = align;
        self
    }

    /// Inline CSS for this style.
    pub fn css(&self) -> String {
        let mut css = format!("font-size:{}px;color:{};", fmt_px(self.font_size), self.color.to_css());
        if self.bold {
            css.push_str("font-weight:bold;");
        }
        if self.italic {
            css.push_str("font-style:italic;");
        }
        if self.underline {
            css.push_str("text-decoration:underline;");
        }
        if self.align != Align::Left {
            css.push_str(&format!("text-align:{};", self.align.css()));
        }
        css
    }
}

/// Format a pixel value without trailing zeros.
pub(crate) fn fmt_px(v: f64) -> String {
    let s = format!("{:.2}", v);
    s.trim_end_matches('0').trim_end_matches('.').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_round_trip() {
        assert_eq!(Color::hex("#f2f2f2").to_css(), "#f2f2f2");
        assert_eq!(Color::hex("fff").to_css(), "#ffffff");
        assert_eq!(Color::BLACK.to_css(), "#000000");
    }

    #[test]
    fn test_text_style_css() {
        let css = TextStyle::sized(28.0).bold().italic().css();
        assert_eq!(css, "font-size:28px;color:#000000;font-weight:bold;font-style:italic;");
        let centered = TextStyle::sized(12.5).aligned(Align::Center).css();
        assert!(centered.contains("font-size:12.5px"));
        assert!(centered.contains("text-align:center;"));
    }
}
