//! # Page Composition
//!
//! Turns a template into the off-screen page the rasterizer captures. Each
//! element becomes a [`Layer`] at its pixel rectangle with its final content:
//! placeholders resolved for text, the data URI for images, and rendered
//! [`Markup`] for data blocks. Layers are stored in paint order, so a backend
//! only has to draw them front to back.
//!
//! Composition never fails. Bad geometry is placed literally, a missing value
//! resolves to an empty string and an empty image source yields no layer.

use crate::config::DEFAULT_PX_PER_MM;
use crate::datablock::{self, Markup};
use crate::model::{DocumentKind, DocumentTemplate, ElementKind, FontWeight, PaperSize, PixelRect, PrintSettings};
use crate::patient::PatientRecord;
use crate::placeholder::{self, Substitution};
use crate::style::TextStyle;

/// Content of one composed layer.
#[derive(Debug, Clone, PartialEq)]
pub enum LayerContent {
    /// Resolved text. Whitespace and line breaks are kept as written.
    Text { text: String, style: TextStyle },
    /// Image source, fitted inside the rectangle keeping its aspect ratio.
    Image { src: String },
    DataBlock(Markup),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    pub element_id: String,
    pub rect: PixelRect,
    pub content: LayerContent,
}

/// The page exactly as it is handed to a [`Rasterizer`](crate::raster::Rasterizer).
#[derive(Debug, Clone, PartialEq)]
pub struct ComposedPage {
    pub paper_size: PaperSize,
    pub width_px: u32,
    pub height_px: u32,
    /// Stretched over the whole page beneath every layer.
    pub background: Option<String>,
    /// Bottom to top.
    pub layers: Vec<Layer>,
}

/// Compose `template` for `patient` at `px_per_mm` CSS pixels per millimetre.
pub fn compose(
    template: &DocumentTemplate,
    patient: &PatientRecord,
    settings: &PrintSettings,
    kind: DocumentKind,
    px_per_mm: f64,
) -> ComposedPage {
    compose_with(template, patient, settings, kind, px_per_mm, Substitution::All)
}

pub fn compose_with(
    template: &DocumentTemplate,
    patient: &PatientRecord,
    settings: &PrintSettings,
    kind: DocumentKind,
    px_per_mm: f64,
    mode: Substitution,
) -> ComposedPage {
    let (width_px, height_px) = template.paper_size.dimensions_px(px_per_mm);
    let (page_w, page_h) = (width_px as f64, height_px as f64);

    let layers = template
        .paint_order()
        .into_iter()
        .filter_map(|element| {
            let content = match &element.kind {
                ElementKind::Text {
                    content,
                    font_size,
                    font_weight,
                    align,
                } => {
                    let mut style = TextStyle::sized(*font_size).aligned((*align).into());
                    if *font_weight == FontWeight::Bold {
                        style = style.bold();
                    }
                    LayerContent::Text {
                        text: placeholder::resolve_with(content, patient, settings, mode),
                        style,
                    }
                }
                ElementKind::Image { content } => {
                    if content.trim().is_empty() {
                        return None;
                    }
                    LayerContent::Image { src: content.clone() }
                }
                ElementKind::DataBlock { .. } => {
                    LayerContent::DataBlock(datablock::render_element(kind, patient, element)?)
                }
            };
            Some(Layer {
                element_id: element.id.clone(),
                rect: element.rect.to_pixels(page_w, page_h),
                content,
            })
        })
        .collect();

    ComposedPage {
        paper_size: template.paper_size,
        width_px,
        height_px,
        background: template
            .background_url
            .as_ref()
            .filter(|url| !url.trim().is_empty())
            .cloned(),
        layers,
    }
}

/// Compose with the default 96 DPI density.
pub fn compose_default(
    template: &DocumentTemplate,
    patient: &PatientRecord,
    settings: &PrintSettings,
    kind: DocumentKind,
) -> ComposedPage {
    compose(template, patient, settings, kind, DEFAULT_PX_PER_MM)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{PrintableElement, Rect, TextAlign};
    use crate::style::Align;

    fn settings() -> PrintSettings {
        PrintSettings {
            clinic_name: "Riverside Clinic".into(),
            ..PrintSettings::default()
        }
    }

    fn template_with(elements: Vec<PrintableElement>) -> DocumentTemplate {
        let mut tpl = DocumentTemplate::new(PaperSize::A5);
        tpl.elements = elements;
        tpl
    }

    #[test]
    fn test_page_size_at_96_dpi() {
        let page = compose_default(&template_with(vec![]), &PatientRecord::default(), &settings(), DocumentKind::Rx);
        assert_eq!((page.width_px, page.height_px), (559, 794));
        assert!(page.layers.is_empty());
    }

    #[test]
    fn test_text_is_resolved_and_styled() {
        let mut el = PrintableElement::text("t", Rect::new(10.0, 10.0, 50.0, 10.0), "{{CLINIC_NAME}}\n  Est. 1990");
        if let ElementKind::Text { font_weight, align, font_size, .. } = &mut el.kind {
            *font_weight = FontWeight::Bold;
            *align = TextAlign::Center;
            *font_size = 22.0;
        }
        let page = compose_default(&template_with(vec![el]), &PatientRecord::default(), &settings(), DocumentKind::Rx);
        match &page.layers[0].content {
            LayerContent::Text { text, style } => {
                assert_eq!(text, "Riverside Clinic\n  Est. 1990");
                assert!(style.bold);
                assert_eq!(style.align, Align::Center);
                assert_eq!(style.font_size, 22.0);
            }
            other => panic!("expected text, got {:?}", other),
        }
        let rect = page.layers[0].rect;
        assert!((rect.x - 55.9).abs() < 1e-9);
        assert!((rect.height - 79.4).abs() < 1e-9);
    }

    #[test]
    fn test_layers_follow_z_order() {
        let mut top = PrintableElement::text("top", Rect::new(0.0, 0.0, 10.0, 10.0), "a");
        top.z_index = 9;
        let bottom = PrintableElement::text("bottom", Rect::new(0.0, 0.0, 10.0, 10.0), "b");
        let page = compose_default(&template_with(vec![top, bottom]), &PatientRecord::default(), &settings(), DocumentKind::Rx);
        let ids: Vec<&str> = page.layers.iter().map(|l| l.element_id.as_str()).collect();
        assert_eq!(ids, vec!["bottom", "top"]);
    }

    #[test]
    fn test_empty_image_is_skipped() {
        let el = PrintableElement::image("i", Rect::new(0.0, 0.0, 10.0, 10.0), "");
        let page = compose_default(&template_with(vec![el]), &PatientRecord::default(), &settings(), DocumentKind::Rx);
        assert!(page.layers.is_empty());
    }

    #[test]
    fn test_data_block_uses_document_kind() {
        let el = PrintableElement::data_block("d", Rect::new(5.0, 30.0, 90.0, 40.0));
        let page = compose_default(&template_with(vec![el]), &PatientRecord::sample(), &settings(), DocumentKind::Rx);
        match &page.layers[0].content {
            LayerContent::DataBlock(markup) => assert_eq!(markup.table().map(|t| t.rows.len()), Some(3)),
            other => panic!("expected data block, got {:?}", other),
        }
    }

    #[test]
    fn test_out_of_bounds_rect_is_literal() {
        let el = PrintableElement::text("o", Rect::new(90.0, 0.0, 40.0, 10.0), "x");
        let page = compose_default(&template_with(vec![el]), &PatientRecord::default(), &settings(), DocumentKind::Rx);
        assert!(page.layers[0].rect.right() > page.width_px as f64);
    }

    #[test]
    fn test_blank_background_is_dropped() {
        let mut tpl = template_with(vec![]);
        tpl.background_url = Some("  ".into());
        let page = compose_default(&tpl, &PatientRecord::default(), &settings(), DocumentKind::Rx);
        assert!(page.background.is_none());
    }
}
