//! # Data Blocks
//!
//! A data block is the part of a template that isn't free text: the
//! prescription table, the list of requested investigations, the narrative
//! of a medical report. The template only says *where* the block sits and how
//! big its type is; the content comes from the patient record at print time.
//!
//! Rendering produces a [`Markup`], a small tree of styled blocks. The same
//! tree is drawn by the rasterizer and serialized to self-contained,
//! inline-styled HTML by [`Markup::to_html`]. Every text color in it is pure
//! black. The output is printed on white paper and must not pick up whatever
//! theme the editor happens to be showing.
//!
//! Empty inputs render nothing beyond the optional section header. There is
//! no "no medications" placeholder text.

mod html;

use crate::model::{DocumentKind, ElementKind, PrintableElement, DEFAULT_FONT_SIZE};
use crate::patient::{non_empty, PatientRecord};
use crate::style::{Align, Color, TextStyle};

/// Header row of the prescription table.
pub const RX_COLUMNS: [&str; 3] = ["Drug Name", "Frequency", "Duration"];

/// Width of each prescription column as a fraction of the block.
pub const RX_COLUMN_WIDTHS: [f64; 3] = [0.5, 0.3, 0.2];

/// The data-block knobs of an element.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlockOptions {
    pub font_size: f64,
    pub data_layout: u8,
    pub show_section_header: bool,
}

impl Default for BlockOptions {
    fn default() -> Self {
        Self {
            font_size: DEFAULT_FONT_SIZE,
            data_layout: 1,
            show_section_header: true,
        }
    }
}

impl BlockOptions {
    /// Options of a data-block element; `None` for other kinds.
    pub fn of(element: &PrintableElement) -> Option<BlockOptions> {
        match element.kind {
            ElementKind::DataBlock {
                font_size,
                data_layout,
                show_section_header,
                ..
            } => Some(BlockOptions {
                font_size,
                data_layout,
                show_section_header,
            }),
            _ => None,
        }
    }
}

/// Cosmetic variants of the prescription table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableLayout {
    /// Every cell boxed.
    Grid,
    /// Heavy rule under the header, hairline under each row.
    Ruled,
    /// Shaded header band and alternating row shading.
    Banded,
}

impl TableLayout {
    /// Out-of-range selectors fall back to the grid.
    pub fn from_selector(n: u8) -> Self {
        match n {
            2 => TableLayout::Ruled,
            3 => TableLayout::Banded,
            _ => TableLayout::Grid,
        }
    }

    pub fn header_background(&self) -> Option<Color> {
        match self {
            TableLayout::Banded => Some(Color::hex("#8c8c8c")),
            _ => None,
        }
    }

    /// Background of the body row at `index` (0-based).
    pub fn row_background(&self, index: usize) -> Option<Color> {
        match self {
            TableLayout::Banded if index % 2 == 0 => Some(Color::WHITE),
            TableLayout::Banded => Some(Color::hex("#ececec")),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableRow {
    pub cells: Vec<String>,
    pub background: Option<Color>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub layout: TableLayout,
    pub header: TableRow,
    pub rows: Vec<TableRow>,
    pub column_widths: Vec<f64>,
    pub header_style: TextStyle,
    pub body_style: TextStyle,
}

/// One block in rendered markup, stacked top to bottom.
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Heading { text: String, style: TextStyle },
    Table(Table),
    /// Bulleted list.
    List { items: Vec<String>, style: TextStyle },
    Paragraph { text: String, style: TextStyle },
}

/// Rendered data-block content.
#[derive(Debug, Clone, PartialEq)]
pub struct Markup {
    pub font_size: f64,
    pub blocks: Vec<Block>,
}

impl Markup {
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn table(&self) -> Option<&Table> {
        self.blocks.iter().find_map(|b| match b {
            Block::Table(t) => Some(t),
            _ => None,
        })
    }

    /// Self-contained HTML with inline styles only.
    pub fn to_html(&self) -> String {
        html::to_html(self)
    }
}

/// Title of each kind's block, with its styling relative to the base size.
fn section_header(kind: DocumentKind, font_size: f64) -> Block {
    let (text, style) = match kind {
        DocumentKind::Rx => ("Rx", TextStyle::sized(font_size * 2.0).bold().italic()),
        DocumentKind::Requests => (
            "Requested Investigations",
            TextStyle::sized(font_size * 1.2).bold().underline(),
        ),
        DocumentKind::Reports => (
            "MEDICAL REPORT",
            TextStyle::sized(font_size * 1.4).bold().aligned(Align::Center),
        ),
    };
    Block::Heading {
        text: text.to_string(),
        style,
    }
}

/// Render the data block of a `kind` template for `patient`.
pub fn render(kind: DocumentKind, patient: &PatientRecord, options: &BlockOptions) -> Markup {
    let mut blocks = Vec::new();
    if options.show_section_header {
        blocks.push(section_header(kind, options.font_size));
    }

    match kind {
        DocumentKind::Rx => {
            if let Some(table) = prescription_table(patient, options) {
                blocks.push(Block::Table(table));
            }
        }
        DocumentKind::Requests => {
            let items: Vec<String> = patient
                .investigation_items
                .iter()
                .chain(patient.scans.iter())
                .map(|i| i.name.clone())
                .collect();
            if !items.is_empty() {
                blocks.push(Block::List {
                    items,
                    style: TextStyle::sized(options.font_size).bold(),
                });
            }
        }
        DocumentKind::Reports => {
            if let Some(history) = non_empty(&patient.past_history) {
                blocks.push(Block::Paragraph {
                    text: history.to_string(),
                    style: TextStyle::sized(options.font_size).aligned(Align::Justify),
                });
            }
            if let Some(diagnosis) = non_empty(&patient.diagnosis) {
                blocks.push(Block::Paragraph {
                    text: format!("Diagnosis: {}", diagnosis),
                    style: TextStyle::sized(options.font_size).bold(),
                });
            }
        }
    }

    Markup {
        font_size: options.font_size,
        blocks,
    }
}

/// Render a template element, or `None` if it isn't a data block.
pub fn render_element(kind: DocumentKind, patient: &PatientRecord, element: &PrintableElement) -> Option<Markup> {
    BlockOptions::of(element).map(|options| render(kind, patient, &options))
}

fn prescription_table(patient: &PatientRecord, options: &BlockOptions) -> Option<Table> {
    if patient.prescription.is_empty() {
        return None;
    }
    let layout = TableLayout::from_selector(options.data_layout);
    let rows = patient
        .prescription
        .iter()
        .enumerate()
        .map(|(i, item)| TableRow {
            cells: vec![
                item.display_name(),
                item.frequency.clone(),
                item.display_duration().to_string(),
            ],
            background: layout.row_background(i),
        })
        .collect();

    Some(Table {
        layout,
        header: TableRow {
            cells: RX_COLUMNS.iter().map(|c| c.to_string()).collect(),
            background: layout.header_background(),
        },
        rows,
        column_widths: RX_COLUMN_WIDTHS.to_vec(),
        header_style: TextStyle::sized(options.font_size).bold(),
        body_style: TextStyle::sized(options.font_size),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Rect;
    use crate::patient::{InvestigationItem, PrescriptionItem};

    fn drug(name: &str, dose: Option<&str>, duration: Option<&str>) -> PrescriptionItem {
        PrescriptionItem {
            drug: name.to_string(),
            dose: dose.map(str::to_string),
            frequency: "Twice daily".to_string(),
            duration: duration.map(str::to_string),
        }
    }

    fn options(layout: u8) -> BlockOptions {
        BlockOptions {
            data_layout: layout,
            ..BlockOptions::default()
        }
    }

    #[test]
    fn test_empty_prescription_only_header() {
        let markup = render(DocumentKind::Rx, &PatientRecord::default(), &options(1));
        assert_eq!(markup.blocks.len(), 1);
        assert!(matches!(&markup.blocks[0], Block::Heading { text, .. } if text == "Rx"));
        assert!(markup.table().is_none());
    }

    #[test]
    fn test_empty_prescription_no_header_renders_nothing() {
        let opts = BlockOptions {
            show_section_header: false,
            ..BlockOptions::default()
        };
        assert!(render(DocumentKind::Rx, &PatientRecord::default(), &opts).is_empty());
    }

    #[test]
    fn test_rx_cells() {
        let patient = PatientRecord {
            prescription: vec![drug("Amoxicillin", Some("500mg"), None)],
            ..Default::default()
        };
        let markup = render(DocumentKind::Rx, &patient, &options(1));
        let table = markup.table().unwrap();
        assert_eq!(table.header.cells, vec!["Drug Name", "Frequency", "Duration"]);
        assert_eq!(table.rows[0].cells, vec!["Amoxicillin (500mg)", "Twice daily", "-"]);
    }

    #[test]
    fn test_banded_rows_alternate_by_parity() {
        let patient = PatientRecord {
            prescription: vec![drug("A", None, None), drug("B", None, None), drug("C", None, None)],
            ..Default::default()
        };
        let markup = render(DocumentKind::Rx, &patient, &options(3));
        let table = markup.table().unwrap();
        assert_eq!(table.layout, TableLayout::Banded);
        assert_eq!(table.rows.len(), 3);
        assert_eq!(table.rows[0].background, table.rows[2].background);
        assert_ne!(table.rows[0].background, table.rows[1].background);
        let header = table.header.background.unwrap().to_rgba8();
        for row in &table.rows {
            let band = row.background.unwrap().to_rgba8();
            assert!(header[0] < band[0], "header {:?} not darker than {:?}", header, band);
        }
        assert_eq!(Color::hex("#8c8c8c").to_rgba8(), header);
    }

    #[test]
    fn test_unknown_layout_falls_back_to_grid() {
        assert_eq!(TableLayout::from_selector(0), TableLayout::Grid);
        assert_eq!(TableLayout::from_selector(9), TableLayout::Grid);
        assert_eq!(TableLayout::from_selector(2), TableLayout::Ruled);
    }

    #[test]
    fn test_requests_labs_then_scans() {
        let patient = PatientRecord {
            investigation_items: vec![InvestigationItem::new("CBC"), InvestigationItem::new("HbA1c")],
            scans: vec![InvestigationItem::new("Chest X-Ray")],
            ..Default::default()
        };
        let markup = render(DocumentKind::Requests, &patient, &BlockOptions::default());
        match &markup.blocks[1] {
            Block::List { items, style } => {
                assert_eq!(items, &vec!["CBC", "HbA1c", "Chest X-Ray"]);
                assert!(style.bold);
            }
            other => panic!("expected list, got {:?}", other),
        }
    }

    #[test]
    fn test_requests_empty_renders_header_only() {
        let markup = render(DocumentKind::Requests, &PatientRecord::default(), &BlockOptions::default());
        assert_eq!(markup.blocks.len(), 1);
    }

    #[test]
    fn test_report_prose_then_diagnosis() {
        let patient = PatientRecord {
            past_history: Some("Long history.".into()),
            diagnosis: Some("Asthma".into()),
            ..Default::default()
        };
        let markup = render(DocumentKind::Reports, &patient, &BlockOptions::default());
        assert_eq!(markup.blocks.len(), 3);
        match &markup.blocks[1] {
            Block::Paragraph { style, .. } => assert_eq!(style.align, Align::Justify),
            other => panic!("expected paragraph, got {:?}", other),
        }
        assert!(matches!(&markup.blocks[2], Block::Paragraph { text, style } if text == "Diagnosis: Asthma" && style.bold));
    }

    #[test]
    fn test_header_sizes_follow_font_size() {
        let opts = BlockOptions {
            font_size: 10.0,
            ..BlockOptions::default()
        };
        let markup = render(DocumentKind::Rx, &PatientRecord::default(), &opts);
        match &markup.blocks[0] {
            Block::Heading { style, .. } => {
                assert_eq!(style.font_size, 20.0);
                assert!(style.italic);
            }
            other => panic!("expected heading, got {:?}", other),
        }
    }

    #[test]
    fn test_all_text_is_black() {
        let markup = render(DocumentKind::Rx, &PatientRecord::sample(), &options(3));
        for block in &markup.blocks {
            let colors = match block {
                Block::Heading { style, .. } | Block::List { style, .. } | Block::Paragraph { style, .. } => vec![style.color],
                Block::Table(t) => vec![t.header_style.color, t.body_style.color],
            };
            assert!(colors.iter().all(|c| *c == Color::BLACK));
        }
    }

    #[test]
    fn test_render_element_skips_non_blocks() {
        let text = PrintableElement::text("t", Rect::new(0.0, 0.0, 10.0, 10.0), "x");
        assert!(render_element(DocumentKind::Rx, &PatientRecord::default(), &text).is_none());
        let block = PrintableElement::data_block("d", Rect::new(0.0, 0.0, 10.0, 10.0));
        assert!(render_element(DocumentKind::Rx, &PatientRecord::default(), &block).is_some());
    }
}
