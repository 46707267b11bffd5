//! # clinic-print
//!
//! A print-layout engine for clinic documents: prescriptions, investigation
//! requests and medical reports.
//!
//! Each clinic designs its own layouts by placing text, images and data
//! blocks anywhere on an A4 or A5 page. Positions are stored as percentages
//! of the page, so the same template drives the on-screen editor and the
//! exported PDF. At print time, `{{TOKEN}}` placeholders are filled from the
//! patient and the clinic, data blocks are generated from the patient's
//! prescription, investigations or history, and the page is rasterized into a
//! single full-bleed PDF page.
//!
//! ## Architecture
//!
//! ```text
//! PrintSettings (JSON)  ←→  [persistence]
//!       ↓                        ↑
//!   [editor]  — selection, drag/resize, property panel, palette
//!       ↓
//!   [compose] — placeholders + data blocks → off-screen page
//!       ↓
//!   [raster]  — page → RGBA bitmap
//!       ↓
//!   [pdf]     — bitmap → one-page PDF
//!       ↓
//!   [export]  — filename, sink, failure reporting
//! ```

pub mod compose;
pub mod config;
pub mod datablock;
pub mod editor;
pub mod error;
pub mod export;
pub mod image_loader;
pub mod model;
pub mod patient;
pub mod pdf;
pub mod persistence;
pub mod placeholder;
pub mod raster;
pub mod style;

use config::ExportOptions;
use error::PrintError;
use export::{Exporter, MemorySink, StderrNotifier};
use model::{DocumentKind, DocumentTemplate, PrintSettings};
use patient::PatientRecord;
use raster::BitmapRasterizer;

/// Render one document to PDF bytes with the default options.
pub fn render(
    template: &DocumentTemplate,
    patient: &PatientRecord,
    settings: &PrintSettings,
    kind: DocumentKind,
) -> Result<Vec<u8>, PrintError> {
    render_with(template, patient, settings, kind, &ExportOptions::default())
}

/// Render one document to PDF bytes.
pub fn render_with(
    template: &DocumentTemplate,
    patient: &PatientRecord,
    settings: &PrintSettings,
    kind: DocumentKind,
    options: &ExportOptions,
) -> Result<Vec<u8>, PrintError> {
    let exporter = Exporter::new(BitmapRasterizer, MemorySink::new(), StderrNotifier, options.clone());
    exporter.render_pdf(patient, template, settings, kind)
}

/// Render from JSON settings and patient documents, using the settings'
/// own template for `kind`.
pub fn render_json(settings_json: &str, patient_json: &str, kind: DocumentKind) -> Result<Vec<u8>, PrintError> {
    let settings: PrintSettings = serde_json::from_str(settings_json)?;
    let patient: PatientRecord = serde_json::from_str(patient_json)?;
    render(settings.template(kind), &patient, &settings, kind)
}
