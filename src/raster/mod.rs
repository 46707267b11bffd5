//! # Rasterization
//!
//! Captures a [`ComposedPage`] to an RGBA bitmap. The export pipeline only
//! knows the [`Rasterizer`] trait; [`BitmapRasterizer`] is the built-in
//! backend, drawing everything itself with Spleen bitmap glyphs and the
//! `image` crate for decoding and scaling pictures.
//!
//! Drawing order is fixed: white paper, the background stretched to the full
//! page, then every layer in paint order. Layers are not clipped to their
//! rectangles, only to the page.

mod block;
mod glyph;
mod text;

pub use glyph::{ADVANCE_RATIO, LINE_HEIGHT};
pub use text::{wrap, Line};

use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use tracing::{debug, warn};

use crate::compose::{ComposedPage, LayerContent};
use crate::error::PrintError;
use crate::image_loader::load_image;
use crate::model::PixelRect;
use glyph::GlyphCache;
use text::TextBox;

/// Largest bitmap side a backend is asked to produce.
pub const MAX_DIMENSION: u32 = 16_384;

pub trait Rasterizer {
    /// Render `page` at `scale` device pixels per CSS pixel.
    fn render_template_to_pixels(&self, page: &ComposedPage, scale: f64) -> Result<RgbaImage, PrintError>;
}

impl<R: Rasterizer + ?Sized> Rasterizer for &R {
    fn render_template_to_pixels(&self, page: &ComposedPage, scale: f64) -> Result<RgbaImage, PrintError> {
        (**self).render_template_to_pixels(page, scale)
    }
}

/// Pure-Rust software backend.
#[derive(Debug, Clone, Copy, Default)]
pub struct BitmapRasterizer;

impl BitmapRasterizer {
    pub fn new() -> Self {
        Self
    }
}

impl Rasterizer for BitmapRasterizer {
    fn render_template_to_pixels(&self, page: &ComposedPage, scale: f64) -> Result<RgbaImage, PrintError> {
        let (width, height) = device_size(page, scale)?;
        let mut canvas = RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 255]));

        if let Some(src) = &page.background {
            match load_image(src) {
                Ok(img) => {
                    let stretched = imageops::resize(&img, width, height, FilterType::Triangle);
                    composite(&mut canvas, &stretched, 0, 0);
                }
                Err(e) => warn!(error = %e, "background image skipped"),
            }
        }

        let mut cache = GlyphCache::new();
        for layer in &page.layers {
            let rect = layer.rect.scaled(scale);
            match &layer.content {
                LayerContent::Text { text, style } => {
                    let area = TextBox { x: rect.x, y: rect.y, width: rect.width };
                    text::draw_text(&mut canvas, &mut cache, text, area, style, scale)?;
                }
                LayerContent::Image { src } => match load_image(src) {
                    Ok(img) => draw_contained(&mut canvas, &img, rect),
                    Err(e) => warn!(element = %layer.element_id, error = %e, "image skipped"),
                },
                LayerContent::DataBlock(markup) => {
                    block::draw_markup(&mut canvas, &mut cache, markup, rect, scale)?;
                }
            }
        }

        debug!(width, height, layers = page.layers.len(), "page rasterized");
        Ok(canvas)
    }
}

fn device_size(page: &ComposedPage, scale: f64) -> Result<(u32, u32), PrintError> {
    if !(scale.is_finite() && scale > 0.0) {
        return Err(PrintError::Raster(format!("invalid raster scale {}", scale)));
    }
    let width = (page.width_px as f64 * scale).round();
    let height = (page.height_px as f64 * scale).round();
    if width < 1.0 || height < 1.0 || width > MAX_DIMENSION as f64 || height > MAX_DIMENSION as f64 {
        return Err(PrintError::Raster(format!(
            "page of {}x{} px is outside the supported range",
            width, height
        )));
    }
    Ok((width as u32, height as u32))
}

/// Where an image of `img_w`x`img_h` lands when fitted inside `rect`
/// without cropping or distortion, centred.
pub fn contain_fit(img_w: u32, img_h: u32, rect: PixelRect) -> PixelRect {
    if img_w == 0 || img_h == 0 || rect.width <= 0.0 || rect.height <= 0.0 {
        return PixelRect { width: 0.0, height: 0.0, ..rect };
    }
    let factor = (rect.width / img_w as f64).min(rect.height / img_h as f64);
    let width = img_w as f64 * factor;
    let height = img_h as f64 * factor;
    PixelRect {
        x: rect.x + (rect.width - width) / 2.0,
        y: rect.y + (rect.height - height) / 2.0,
        width,
        height,
    }
}

fn draw_contained(canvas: &mut RgbaImage, img: &RgbaImage, rect: PixelRect) {
    let fit = contain_fit(img.width(), img.height(), rect);
    let (x0, y0) = (fit.x.round(), fit.y.round());
    let (w, h) = (fit.width.round(), fit.height.round());
    if !(w >= 1.0 && h >= 1.0) {
        return;
    }

    // Resample only the part of the fitted image that lands on the page.
    let (vx0, vy0) = (x0.max(0.0), y0.max(0.0));
    let vx1 = (x0 + w).min(canvas.width() as f64);
    let vy1 = (y0 + h).min(canvas.height() as f64);
    if vx1 <= vx0 || vy1 <= vy0 {
        return;
    }
    let (out_w, out_h) = ((vx1 - vx0) as u32, (vy1 - vy0) as u32);
    if vx0 == x0 && vy0 == y0 && out_w as f64 == w && out_h as f64 == h {
        let scaled = imageops::resize(img, out_w, out_h, FilterType::Triangle);
        composite(canvas, &scaled, x0 as i64, y0 as i64);
        return;
    }

    let (per_x, per_y) = (img.width() as f64 / w, img.height() as f64 / h);
    let src_x0 = (((vx0 - x0) * per_x).floor() as u32).min(img.width() - 1);
    let src_y0 = (((vy0 - y0) * per_y).floor() as u32).min(img.height() - 1);
    let src_x1 = (((vx1 - x0) * per_x).ceil() as u32).clamp(src_x0 + 1, img.width());
    let src_y1 = (((vy1 - y0) * per_y).ceil() as u32).clamp(src_y0 + 1, img.height());
    let visible = imageops::crop_imm(img, src_x0, src_y0, src_x1 - src_x0, src_y1 - src_y0).to_image();
    let scaled = imageops::resize(&visible, out_w, out_h, FilterType::Triangle);
    composite(canvas, &scaled, vx0 as i64, vy0 as i64);
}

/// Source-over `img` onto `canvas` with its top-left at `(x, y)`.
fn composite(canvas: &mut RgbaImage, img: &RgbaImage, x: i64, y: i64) {
    for (ix, iy, src) in img.enumerate_pixels() {
        let (cx, cy) = (x + ix as i64, y + iy as i64);
        if cx < 0 || cy < 0 || cx >= canvas.width() as i64 || cy >= canvas.height() as i64 {
            continue;
        }
        let alpha = src.0[3] as u32;
        if alpha == 0 {
            continue;
        }
        let dst = canvas.get_pixel_mut(cx as u32, cy as u32);
        if alpha == 255 {
            *dst = *src;
            continue;
        }
        for c in 0..3 {
            let blended = (src.0[c] as u32 * alpha + dst.0[c] as u32 * (255 - alpha) + 127) / 255;
            dst.0[c] = blended as u8;
        }
        dst.0[3] = 255;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compose::{compose_default, Layer};
    use crate::datablock::BlockOptions;
    use crate::image_loader::to_png_data_uri;
    use crate::model::{DocumentKind, DocumentTemplate, PaperSize, PrintSettings};
    use crate::patient::PatientRecord;
    use crate::style::TextStyle;

    fn page(layers: Vec<Layer>) -> ComposedPage {
        ComposedPage {
            paper_size: PaperSize::A5,
            width_px: 100,
            height_px: 140,
            background: None,
            layers,
        }
    }

    fn near(a: [u8; 4], b: [u8; 4]) -> bool {
        a.iter().zip(b.iter()).all(|(x, y)| (*x as i16 - *y as i16).abs() <= 1)
    }

    fn solid_uri(w: u32, h: u32, rgba: [u8; 4]) -> String {
        to_png_data_uri(&RgbaImage::from_pixel(w, h, Rgba(rgba))).unwrap()
    }

    #[test]
    fn test_contain_fit_letterboxes() {
        let rect = PixelRect { x: 0.0, y: 0.0, width: 200.0, height: 100.0 };
        let fit = contain_fit(50, 50, rect);
        assert_eq!((fit.x, fit.y, fit.width, fit.height), (50.0, 0.0, 100.0, 100.0));
        let tall = contain_fit(10, 40, PixelRect { x: 10.0, y: 10.0, width: 40.0, height: 40.0 });
        assert_eq!((tall.x, tall.width, tall.height), (25.0, 10.0, 40.0));
    }

    #[test]
    fn test_blank_page_is_white_at_double_scale() {
        let img = BitmapRasterizer.render_template_to_pixels(&page(vec![]), 2.0).unwrap();
        assert_eq!(img.dimensions(), (200, 280));
        assert!(img.pixels().all(|p| p.0 == [255, 255, 255, 255]));
    }

    #[test]
    fn test_background_covers_page() {
        let mut p = page(vec![]);
        p.background = Some(solid_uri(3, 3, [10, 200, 30, 255]));
        let img = BitmapRasterizer.render_template_to_pixels(&p, 1.0).unwrap();
        assert!(near(img.get_pixel(0, 0).0, [10, 200, 30, 255]));
        assert!(near(img.get_pixel(99, 139).0, [10, 200, 30, 255]));
    }

    #[test]
    fn test_image_is_contained_in_its_rect() {
        let layer = Layer {
            element_id: "logo".into(),
            rect: PixelRect { x: 10.0, y: 10.0, width: 40.0, height: 20.0 },
            content: LayerContent::Image { src: solid_uri(4, 4, [255, 0, 0, 255]) },
        };
        let img = BitmapRasterizer.render_template_to_pixels(&page(vec![layer]), 1.0).unwrap();
        assert!(near(img.get_pixel(30, 20).0, [255, 0, 0, 255]));
        assert_eq!(img.get_pixel(12, 20).0, [255, 255, 255, 255]);
        assert_eq!(img.get_pixel(48, 20).0, [255, 255, 255, 255]);
    }

    #[test]
    fn test_image_larger_than_page_is_cropped_not_dropped() {
        let layer = Layer {
            element_id: "poster".into(),
            rect: PixelRect { x: -9950.0, y: -9930.0, width: 20000.0, height: 20000.0 },
            content: LayerContent::Image { src: solid_uri(4, 4, [255, 0, 0, 255]) },
        };
        let img = BitmapRasterizer.render_template_to_pixels(&page(vec![layer]), 1.0).unwrap();
        assert!(near(img.get_pixel(0, 0).0, [255, 0, 0, 255]));
        assert!(near(img.get_pixel(99, 139).0, [255, 0, 0, 255]));
    }

    #[test]
    fn test_huge_geometry_only_paints_the_page() {
        let patient = PatientRecord {
            prescription: vec![crate::patient::PrescriptionItem {
                drug: "Amoxicillin".into(),
                frequency: "Daily".into(),
                ..Default::default()
            }],
            ..Default::default()
        };
        let wide = PixelRect { x: 0.0, y: 0.0, width: 1e12, height: 1e12 };
        let mut layers = vec![Layer {
            element_id: "giant-text".into(),
            rect: PixelRect { x: -5.0, y: -5.0, width: 1e12, height: 1e12 },
            content: LayerContent::Text { text: "Hi there".into(), style: TextStyle::sized(1e7).bold().italic() },
        }];
        for layout in [1, 3] {
            let options = BlockOptions { data_layout: layout, show_section_header: false, ..BlockOptions::default() };
            layers.push(Layer {
                element_id: format!("table-{}", layout),
                rect: wide,
                content: LayerContent::DataBlock(crate::datablock::render(DocumentKind::Rx, &patient, &options)),
            });
        }
        let img = BitmapRasterizer.render_template_to_pixels(&page(layers), 1.0).unwrap();
        // The banded table is drawn last; its header band runs across the page.
        assert_eq!(img.get_pixel(50, 1).0, [0x8c, 0x8c, 0x8c, 255]);
    }

    #[test]
    fn test_composite_blends_translucent_pixels() {
        let mut canvas = RgbaImage::from_pixel(2, 1, Rgba([255, 255, 255, 255]));
        let top = RgbaImage::from_pixel(1, 1, Rgba([0, 0, 0, 128]));
        composite(&mut canvas, &top, 1, 0);
        composite(&mut canvas, &top, 5, 5);
        assert_eq!(canvas.get_pixel(0, 0).0, [255, 255, 255, 255]);
        assert_eq!(canvas.get_pixel(1, 0).0, [127, 127, 127, 255]);
    }

    #[test]
    fn test_broken_image_is_skipped() {
        let layer = Layer {
            element_id: "bad".into(),
            rect: PixelRect { x: 0.0, y: 0.0, width: 50.0, height: 50.0 },
            content: LayerContent::Image { src: "data:image/png;base64,AAAA".into() },
        };
        assert!(BitmapRasterizer.render_template_to_pixels(&page(vec![layer]), 1.0).is_ok());
    }

    #[test]
    fn test_text_is_black() {
        let layer = Layer {
            element_id: "t".into(),
            rect: PixelRect { x: 0.0, y: 0.0, width: 100.0, height: 30.0 },
            content: LayerContent::Text { text: "Hello".into(), style: TextStyle::sized(20.0) },
        };
        let img = BitmapRasterizer.render_template_to_pixels(&page(vec![layer]), 1.0).unwrap();
        let inked: Vec<_> = img.pixels().filter(|p| p.0 != [255, 255, 255, 255]).collect();
        assert!(!inked.is_empty());
        assert!(inked.iter().all(|p| p.0 == [0, 0, 0, 255]));
    }

    #[test]
    fn test_rejects_bad_scale() {
        assert!(matches!(
            BitmapRasterizer.render_template_to_pixels(&page(vec![]), 0.0),
            Err(PrintError::Raster(_))
        ));
        assert!(BitmapRasterizer.render_template_to_pixels(&page(vec![]), f64::NAN).is_err());
    }

    #[test]
    fn test_default_templates_render() {
        let settings = PrintSettings::default();
        for kind in DocumentKind::ALL {
            let tpl: &DocumentTemplate = settings.template(kind);
            let composed = compose_default(tpl, &PatientRecord::sample(), &settings, kind);
            let img = BitmapRasterizer.render_template_to_pixels(&composed, 1.0).unwrap();
            assert_eq!(img.dimensions(), (composed.width_px, composed.height_px));
            assert!(img.pixels().any(|p| p.0[0] < 128), "{} rendered blank", kind);
        }
    }
}
