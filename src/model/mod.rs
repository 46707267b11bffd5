//! # Template Model
//!
//! The stored representation of a clinic's print layouts. A template is a
//! page (paper size + optional background) with free-form elements placed on
//! it. Every element's rectangle lives in **percentage space**: `x`, `y`, `w`
//! and `h` are percentages of the page width and height, so the editor's
//! preview canvas and the export page render the same layout at different
//! pixel sizes.
//!
//! Elements are a tagged union on `type`. A text element carries typography,
//! an image carries its data URI, a data block carries the layout knobs of
//! the generated table/list/prose. The JSON shape is flat:
//!
//! ```text
//! { "id": "…", "type": "text", "x": 10, "y": 5, "w": 80, "h": 6,
//!   "zIndex": 1, "content": "{{CLINIC_NAME}}", "fontSize": 22,
//!   "fontWeight": "bold", "align": "center" }
//! ```
//!
//! Geometry is never validated at rest. An element stored with `x + w > 100`
//! renders at its literal bounds; clamping only happens while dragging.

mod defaults;
pub mod geometry;

pub use geometry::{PixelRect, Rect};

use serde::{Deserialize, Serialize};

/// Physical output size of a template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaperSize {
    A4,
    A5,
}

impl PaperSize {
    /// Returns (width, height) in millimetres.
    pub fn dimensions_mm(&self) -> (f64, f64) {
        match self {
            PaperSize::A4 => (210.0, 297.0),
            PaperSize::A5 => (148.0, 210.0),
        }
    }

    /// Returns (width, height) in PDF points (1/72 inch).
    pub fn dimensions_pt(&self) -> (f64, f64) {
        let (w, h) = self.dimensions_mm();
        (mm_to_pt(w), mm_to_pt(h))
    }

    /// Returns (width, height) in whole pixels for the given density.
    pub fn dimensions_px(&self, px_per_mm: f64) -> (u32, u32) {
        let (w, h) = self.dimensions_mm();
        ((w * px_per_mm).round() as u32, (h * px_per_mm).round() as u32)
    }
}

/// Millimetres to PDF points.
pub fn mm_to_pt(mm: f64) -> f64 {
    mm * 72.0 / 25.4
}

/// The three printable document kinds, each with its own template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Rx,
    Requests,
    Reports,
}

impl DocumentKind {
    pub const ALL: [DocumentKind; 3] = [DocumentKind::Rx, DocumentKind::Requests, DocumentKind::Reports];

    /// The key this kind is stored under.
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentKind::Rx => "rx",
            DocumentKind::Requests => "requests",
            DocumentKind::Reports => "reports",
        }
    }

    /// Paper size a fresh template for this kind starts with.
    pub fn default_paper_size(&self) -> PaperSize {
        match self {
            DocumentKind::Rx | DocumentKind::Requests => PaperSize::A5,
            DocumentKind::Reports => PaperSize::A4,
        }
    }
}

impl std::fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DocumentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "rx" => Ok(DocumentKind::Rx),
            "requests" => Ok(DocumentKind::Requests),
            "reports" => Ok(DocumentKind::Reports),
            other => Err(format!(
                "unknown document kind '{}' (expected rx, requests or reports)",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontWeight {
    #[default]
    Normal,
    Bold,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

pub const DEFAULT_FONT_SIZE: f64 = 14.0;
pub const DEFAULT_Z_INDEX: i32 = 1;

fn default_font_size() -> f64 {
    DEFAULT_FONT_SIZE
}

fn default_z_index() -> i32 {
    DEFAULT_Z_INDEX
}

fn default_data_layout() -> u8 {
    1
}

fn default_true() -> bool {
    true
}

/// One placeable unit on a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrintableElement {
    /// Stable opaque identifier, unique within its template.
    pub id: String,

    /// Position and size in page percentages.
    #[serde(flatten)]
    pub rect: Rect,

    /// Paint order. Equal values paint in array order.
    #[serde(default = "default_z_index")]
    pub z_index: i32,

    #[serde(flatten)]
    pub kind: ElementKind,
}

/// What an element draws, with the fields that only make sense for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ElementKind {
    /// Free text. `content` may contain `{{TOKEN}}` placeholders.
    #[serde(rename_all = "camelCase")]
    Text {
        #[serde(default)]
        content: String,
        #[serde(default = "default_font_size")]
        font_size: f64,
        #[serde(default)]
        font_weight: FontWeight,
        #[serde(default)]
        align: TextAlign,
    },

    /// An image, stored as a data URI.
    Image {
        #[serde(default)]
        content: String,
    },

    /// Generated table / list / prose for the template's document kind.
    #[serde(rename_all = "camelCase")]
    DataBlock {
        /// Editor-only label, never rendered.
        #[serde(default)]
        content: String,
        #[serde(default = "default_font_size")]
        font_size: f64,
        /// Table variant (1-3), used by prescription blocks.
        #[serde(default = "default_data_layout")]
        data_layout: u8,
        #[serde(default = "default_true")]
        show_section_header: bool,
    },
}

impl ElementKind {
    /// The wire name of this kind.
    pub fn name(&self) -> &'static str {
        match self {
            ElementKind::Text { .. } => "text",
            ElementKind::Image { .. } => "image",
            ElementKind::DataBlock { .. } => "data_block",
        }
    }

    pub fn content(&self) -> &str {
        match self {
            ElementKind::Text { content, .. }
            | ElementKind::Image { content }
            | ElementKind::DataBlock { content, .. } => content,
        }
    }
}

impl PrintableElement {
    pub fn new(id: impl Into<String>, rect: Rect, kind: ElementKind) -> Self {
        Self {
            id: id.into(),
            rect,
            z_index: DEFAULT_Z_INDEX,
            kind,
        }
    }

    /// A text element with default typography.
    pub fn text(id: impl Into<String>, rect: Rect, content: &str) -> Self {
        Self::new(
            id,
            rect,
            ElementKind::Text {
                content: content.to_string(),
                font_size: DEFAULT_FONT_SIZE,
                font_weight: FontWeight::Normal,
                align: TextAlign::Left,
            },
        )
    }

    pub fn image(id: impl Into<String>, rect: Rect, data_uri: &str) -> Self {
        Self::new(
            id,
            rect,
            ElementKind::Image {
                content: data_uri.to_string(),
            },
        )
    }

    /// A data block with layout 1 and its section header shown.
    pub fn data_block(id: impl Into<String>, rect: Rect) -> Self {
        Self::new(
            id,
            rect,
            ElementKind::DataBlock {
                content: "Data Block".to_string(),
                font_size: DEFAULT_FONT_SIZE,
                data_layout: 1,
                show_section_header: true,
            },
        )
    }
}

/// The full design for one document kind (`TabPrintConfig` on the wire).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentTemplate {
    pub paper_size: PaperSize,

    /// Full-bleed background image (data URI), stretched to the page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_url: Option<String>,

    #[serde(default)]
    pub elements: Vec<PrintableElement>,
}

impl DocumentTemplate {
    pub fn new(paper_size: PaperSize) -> Self {
        Self {
            paper_size,
            background_url: None,
            elements: Vec::new(),
        }
    }

    /// The generic starting layout for a document kind.
    pub fn generic(kind: DocumentKind) -> Self {
        defaults::generic_template(kind)
    }

    pub fn element(&self, id: &str) -> Option<&PrintableElement> {
        self.elements.iter().find(|e| e.id == id)
    }

    pub fn element_mut(&mut self, id: &str) -> Option<&mut PrintableElement> {
        self.elements.iter_mut().find(|e| e.id == id)
    }

    /// Remove an element, returning it if it existed.
    pub fn remove(&mut self, id: &str) -> Option<PrintableElement> {
        let idx = self.elements.iter().position(|e| e.id == id)?;
        Some(self.elements.remove(idx))
    }

    /// Elements in paint order: ascending `zIndex`, ties in array order.
    pub fn paint_order(&self) -> Vec<&PrintableElement> {
        let mut ordered: Vec<&PrintableElement> = self.elements.iter().collect();
        // sort_by_key is stable, which keeps array order for equal z.
        ordered.sort_by_key(|e| e.z_index);
        ordered
    }

    pub fn max_z(&self) -> i32 {
        self.elements.iter().map(|e| e.z_index).max().unwrap_or(DEFAULT_Z_INDEX)
    }

    pub fn min_z(&self) -> i32 {
        self.elements.iter().map(|e| e.z_index).min().unwrap_or(DEFAULT_Z_INDEX)
    }
}

/// Tenant-wide print configuration: one template per document kind and the
/// clinic metadata every template's placeholders draw from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrintSettings {
    #[serde(default)]
    pub clinic_name: String,
    #[serde(default)]
    pub doctor_name: String,
    #[serde(default)]
    pub specialty: String,
    #[serde(default)]
    pub phones: Vec<String>,
    #[serde(default)]
    pub addresses: Vec<String>,
    /// Stored with the settings for the host UI. Templates place logos as image elements.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,

    #[serde(default = "rx_template")]
    pub rx: DocumentTemplate,
    #[serde(default = "requests_template")]
    pub requests: DocumentTemplate,
    #[serde(default = "reports_template")]
    pub reports: DocumentTemplate,
}

fn rx_template() -> DocumentTemplate {
    DocumentTemplate::generic(DocumentKind::Rx)
}

fn requests_template() -> DocumentTemplate {
    DocumentTemplate::generic(DocumentKind::Requests)
}

fn reports_template() -> DocumentTemplate {
    DocumentTemplate::generic(DocumentKind::Reports)
}

impl Default for PrintSettings {
    fn default() -> Self {
        Self {
            clinic_name: String::new(),
            doctor_name: String::new(),
            specialty: String::new(),
            phones: Vec::new(),
            addresses: Vec::new(),
            logo_url: None,
            rx: rx_template(),
            requests: requests_template(),
            reports: reports_template(),
        }
    }
}

impl PrintSettings {
    pub fn template(&self, kind: DocumentKind) -> &DocumentTemplate {
        match kind {
            DocumentKind::Rx => &self.rx,
            DocumentKind::Requests => &self.requests,
            DocumentKind::Reports => &self.reports,
        }
    }

    pub fn template_mut(&mut self, kind: DocumentKind) -> &mut DocumentTemplate {
        match kind {
            DocumentKind::Rx => &mut self.rx,
            DocumentKind::Requests => &mut self.requests,
            DocumentKind::Reports => &mut self.reports,
        }
    }

    /// Replace one kind's template wholesale.
    pub fn set_template(&mut self, kind: DocumentKind, template: DocumentTemplate) {
        *self.template_mut(kind) = template;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_paper_dimensions() {
        assert_eq!(PaperSize::A4.dimensions_mm(), (210.0, 297.0));
        assert_eq!(PaperSize::A5.dimensions_mm(), (148.0, 210.0));
        let (w, h) = PaperSize::A5.dimensions_pt();
        assert!((w - 419.53).abs() < 0.01);
        assert!((h - 595.28).abs() < 0.01);
    }

    #[test]
    fn test_paper_pixels_at_96_dpi() {
        let px_per_mm = 96.0 / 25.4;
        assert_eq!(PaperSize::A4.dimensions_px(px_per_mm), (794, 1123));
        assert_eq!(PaperSize::A5.dimensions_px(px_per_mm), (559, 794));
    }

    #[test]
    fn test_default_paper_per_kind() {
        assert_eq!(DocumentKind::Rx.default_paper_size(), PaperSize::A5);
        assert_eq!(DocumentKind::Requests.default_paper_size(), PaperSize::A5);
        assert_eq!(DocumentKind::Reports.default_paper_size(), PaperSize::A4);
    }

    #[test]
    fn test_kind_from_str() {
        assert_eq!("reports".parse::<DocumentKind>(), Ok(DocumentKind::Reports));
        assert!("invoice".parse::<DocumentKind>().is_err());
    }

    #[test]
    fn test_element_wire_shape_is_flat() {
        let el = PrintableElement::text("t1", Rect::new(10.0, 5.0, 80.0, 6.0), "{{CLINIC_NAME}}");
        let v = serde_json::to_value(&el).unwrap();
        assert_eq!(v["type"], "text");
        assert_eq!(v["x"], 10.0);
        assert_eq!(v["fontSize"], 14.0);
        assert_eq!(v["fontWeight"], "normal");
        assert_eq!(v["zIndex"], 1);
    }

    #[test]
    fn test_data_block_defaults_on_sparse_input() {
        let el: PrintableElement = serde_json::from_str(
            r#"{"id":"d","type":"data_block","x":5,"y":30,"w":90,"h":40}"#,
        )
        .unwrap();
        match el.kind {
            ElementKind::DataBlock {
                font_size,
                data_layout,
                show_section_header,
                ..
            } => {
                assert_eq!(font_size, DEFAULT_FONT_SIZE);
                assert_eq!(data_layout, 1);
                assert!(show_section_header);
            }
            other => panic!("expected data block, got {:?}", other),
        }
        assert_eq!(el.z_index, DEFAULT_Z_INDEX);
    }

    #[test]
    fn test_out_of_bounds_geometry_is_kept() {
        let el: PrintableElement = serde_json::from_str(
            r#"{"id":"o","type":"text","x":90,"y":-5,"w":40,"h":10,"content":"x"}"#,
        )
        .unwrap();
        assert_eq!(el.rect, Rect::new(90.0, -5.0, 40.0, 10.0));
    }

    #[test]
    fn test_paint_order_is_stable_for_equal_z() {
        let mut tpl = DocumentTemplate::new(PaperSize::A5);
        let mut a = PrintableElement::text("a", Rect::new(0.0, 0.0, 10.0, 10.0), "a");
        a.z_index = 5;
        tpl.elements.push(a);
        tpl.elements.push(PrintableElement::text("b", Rect::new(0.0, 0.0, 10.0, 10.0), "b"));
        tpl.elements.push(PrintableElement::text("c", Rect::new(0.0, 0.0, 10.0, 10.0), "c"));
        let ids: Vec<&str> = tpl.paint_order().iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c", "a"]);
    }

    #[test]
    fn test_settings_default_has_three_templates() {
        let settings = PrintSettings::default();
        for kind in DocumentKind::ALL {
            let tpl = settings.template(kind);
            assert_eq!(tpl.paper_size, kind.default_paper_size());
            assert!(!tpl.elements.is_empty());
        }
    }

    #[test]
    fn test_settings_missing_templates_fill_in() {
        let settings: PrintSettings =
            serde_json::from_str(r#"{"clinicName":"Riverside Clinic"}"#).unwrap();
        assert_eq!(settings.clinic_name, "Riverside Clinic");
        assert_eq!(settings.reports.paper_size, PaperSize::A4);
    }

    #[test]
    fn test_set_template_replaces_whole() {
        let mut settings = PrintSettings::default();
        settings.set_template(DocumentKind::Requests, DocumentTemplate::new(PaperSize::A4));
        assert!(settings.requests.elements.is_empty());
        assert_eq!(settings.requests.paper_size, PaperSize::A4);
        assert!(!settings.rx.elements.is_empty());
    }
}
