//! # Export Pipeline
//!
//! ```text
//! template + patient + settings
//!       ↓
//!   [compose]   off-screen page, attached as a scratch surface
//!       ↓
//!   [raster]    captured at 2x
//!       ↓
//!   [pdf]       one full-bleed page, MediaBox = paper size
//!       ↓
//!   [sink]      {Prefix}_{NameOrSample}.pdf
//! ```
//!
//! The scratch surface is held by a guard and detached on every path out of
//! the pipeline. [`Exporter::export_pdf`] is the call-site boundary: failures
//! are logged, reported once through the [`Notifier`] and swallowed. Use
//! [`Exporter::try_export_pdf`] to get the error instead.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;

use tracing::{error, info, info_span};

use crate::compose::{compose, ComposedPage};
use crate::config::ExportOptions;
use crate::error::PrintError;
use crate::model::{DocumentKind, DocumentTemplate, PrintSettings};
use crate::patient::PatientRecord;
use crate::pdf::{Metadata, PdfWriter};
use crate::raster::{BitmapRasterizer, Rasterizer};

/// Leading part of an export filename, chosen by the call site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportPrefix {
    Rx,
    Requests,
    Session,
    Report,
    SampleRx,
    SampleRequests,
    SampleReports,
}

impl ExportPrefix {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportPrefix::Rx => "Rx",
            ExportPrefix::Requests => "Requests",
            ExportPrefix::Session => "Session",
            ExportPrefix::Report => "Report",
            ExportPrefix::SampleRx => "Sample_rx",
            ExportPrefix::SampleRequests => "Sample_requests",
            ExportPrefix::SampleReports => "Sample_reports",
        }
    }

    /// Prefix for printing a real patient's document.
    pub fn for_kind(kind: DocumentKind) -> Self {
        match kind {
            DocumentKind::Rx => ExportPrefix::Rx,
            DocumentKind::Requests => ExportPrefix::Requests,
            DocumentKind::Reports => ExportPrefix::Report,
        }
    }

    /// Prefix for the editor's "Download Sample".
    pub fn sample(kind: DocumentKind) -> Self {
        match kind {
            DocumentKind::Rx => ExportPrefix::SampleRx,
            DocumentKind::Requests => ExportPrefix::SampleRequests,
            DocumentKind::Reports => ExportPrefix::SampleReports,
        }
    }
}

impl std::fmt::Display for ExportPrefix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ExportPrefix {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [
            ExportPrefix::Rx,
            ExportPrefix::Requests,
            ExportPrefix::Session,
            ExportPrefix::Report,
            ExportPrefix::SampleRx,
            ExportPrefix::SampleRequests,
            ExportPrefix::SampleReports,
        ]
        .into_iter()
        .find(|p| p.as_str() == s)
        .ok_or_else(|| format!("unknown export prefix '{}'", s))
    }
}

/// `{Prefix}_{Name}.pdf`, with `Sample` standing in for a missing name.
pub fn export_filename(prefix: ExportPrefix, name: Option<&str>) -> String {
    let name = name.map(str::trim).filter(|n| !n.is_empty()).unwrap_or("Sample");
    format!("{}_{}.pdf", prefix, sanitize_filename(name))
}

/// Replace path separators and control characters with `_`.
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| if c == '/' || c == '\\' || c.is_control() { '_' } else { c })
        .collect()
}

// ============================================================================
// Scratch surfaces
// ============================================================================

/// Identifier of an attached off-screen page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SurfaceId(u64);

/// Registry of off-screen pages currently attached for capture.
#[derive(Debug, Default)]
pub struct ScratchHost {
    next: AtomicU64,
    attached: Mutex<HashSet<SurfaceId>>,
}

impl ScratchHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach `page` for capture. It stays attached until the returned
    /// guard is dropped.
    pub fn attach(&self, page: ComposedPage) -> ScratchSurface<'_> {
        let id = SurfaceId(self.next.fetch_add(1, Ordering::Relaxed));
        self.lock().insert(id);
        ScratchSurface { host: self, id, page }
    }

    /// Number of surfaces currently attached.
    pub fn attached(&self) -> usize {
        self.lock().len()
    }

    fn detach(&self, id: SurfaceId) {
        self.lock().remove(&id);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashSet<SurfaceId>> {
        // A panic elsewhere can't leave the set half-updated.
        self.attached.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// An attached off-screen page. Detaches itself on drop.
pub struct ScratchSurface<'a> {
    host: &'a ScratchHost,
    id: SurfaceId,
    page: ComposedPage,
}

impl ScratchSurface<'_> {
    pub fn id(&self) -> SurfaceId {
        self.id
    }

    pub fn page(&self) -> &ComposedPage {
        &self.page
    }
}

impl Drop for ScratchSurface<'_> {
    fn drop(&mut self) {
        self.host.detach(self.id);
    }
}

// ============================================================================
// Sinks and notifications
// ============================================================================

/// Where finished PDFs go.
pub trait FileSink {
    /// Save `bytes` under `filename`, returning where it ended up.
    fn save(&self, filename: &str, bytes: &[u8]) -> Result<PathBuf, PrintError>;
}

/// Writes files into a directory, creating it on first use.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl FileSink for DirectorySink {
    fn save(&self, filename: &str, bytes: &[u8]) -> Result<PathBuf, PrintError> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(sanitize_filename(filename));
        std::fs::write(&path, bytes)?;
        Ok(path)
    }
}

/// Keeps saved files in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    files: Mutex<Vec<(String, Vec<u8>)>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Saved files in save order.
    pub fn files(&self) -> Vec<(String, Vec<u8>)> {
        self.files.lock().map(|f| f.clone()).unwrap_or_default()
    }
}

impl FileSink for MemorySink {
    fn save(&self, filename: &str, bytes: &[u8]) -> Result<PathBuf, PrintError> {
        self.files
            .lock()
            .map_err(|_| PrintError::Io(std::io::Error::other("memory sink poisoned")))?
            .push((filename.to_string(), bytes.to_vec()));
        Ok(PathBuf::from(filename))
    }
}

/// User-facing failure reporting.
pub trait Notifier {
    fn notify_failure(&self, message: &str);
}

/// Reports failures on stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct StderrNotifier;

impl Notifier for StderrNotifier {
    fn notify_failure(&self, message: &str) {
        eprintln!("✗ {}", message);
    }
}

/// Remembers every message it was given.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    messages: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().map(|m| m.clone()).unwrap_or_default()
    }
}

impl Notifier for RecordingNotifier {
    fn notify_failure(&self, message: &str) {
        if let Ok(mut m) = self.messages.lock() {
            m.push(message.to_string());
        }
    }
}

impl<T: Notifier + ?Sized> Notifier for &T {
    fn notify_failure(&self, message: &str) {
        (**self).notify_failure(message)
    }
}

impl<T: FileSink + ?Sized> FileSink for &T {
    fn save(&self, filename: &str, bytes: &[u8]) -> Result<PathBuf, PrintError> {
        (**self).save(filename, bytes)
    }
}

// ============================================================================
// Exporter
// ============================================================================

/// Runs the pipeline. One export at a time per exporter.
pub struct Exporter<R = BitmapRasterizer, S = DirectorySink, N = StderrNotifier> {
    rasterizer: R,
    sink: S,
    notifier: N,
    options: ExportOptions,
    scratch: ScratchHost,
    busy: AtomicBool,
}

impl Exporter {
    /// Bitmap backend, writing into `options.output_dir`, reporting on stderr.
    pub fn with_options(options: ExportOptions) -> Self {
        let sink = DirectorySink::new(options.output_dir.clone());
        Exporter::new(BitmapRasterizer, sink, StderrNotifier, options)
    }
}

/// Clears the busy flag when an export ends, however it ends.
struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl<R: Rasterizer, S: FileSink, N: Notifier> Exporter<R, S, N> {
    pub fn new(rasterizer: R, sink: S, notifier: N, options: ExportOptions) -> Self {
        Self {
            rasterizer,
            sink,
            notifier,
            options,
            scratch: ScratchHost::new(),
            busy: AtomicBool::new(false),
        }
    }

    pub fn options(&self) -> &ExportOptions {
        &self.options
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    pub fn scratch(&self) -> &ScratchHost {
        &self.scratch
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Render and save. Never fails: errors are logged and reported once
    /// through the notifier, and `None` is returned.
    pub fn export_pdf(
        &self,
        patient: &PatientRecord,
        template: &DocumentTemplate,
        settings: &PrintSettings,
        filename: &str,
        kind: DocumentKind,
    ) -> Option<PathBuf> {
        match self.try_export_pdf(patient, template, settings, filename, kind) {
            Ok(path) => Some(path),
            Err(e) => {
                error!(kind = %kind, filename, error = %e, "PDF export failed");
                self.notifier
                    .notify_failure(&format!("Could not generate {}: {}", filename, e));
                None
            }
        }
    }

    /// Render and save, returning any failure.
    pub fn try_export_pdf(
        &self,
        patient: &PatientRecord,
        template: &DocumentTemplate,
        settings: &PrintSettings,
        filename: &str,
        kind: DocumentKind,
    ) -> Result<PathBuf, PrintError> {
        let bytes = self.render_pdf(patient, template, settings, kind)?;
        let path = self.sink.save(filename, &bytes)?;
        info!(path = %path.display(), bytes = bytes.len(), "PDF written");
        Ok(path)
    }

    /// Run the pipeline up to the finished PDF bytes.
    pub fn render_pdf(
        &self,
        patient: &PatientRecord,
        template: &DocumentTemplate,
        settings: &PrintSettings,
        kind: DocumentKind,
    ) -> Result<Vec<u8>, PrintError> {
        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(PrintError::Busy);
        }
        let _busy = BusyGuard(&self.busy);
        let _span = info_span!("export", kind = %kind, paper = ?template.paper_size).entered();

        let page = compose(template, patient, settings, kind, self.options.px_per_mm);
        let surface = self.scratch.attach(page);
        let bitmap = self
            .rasterizer
            .render_template_to_pixels(surface.page(), self.options.raster_scale)?;
        drop(surface);

        let metadata = Metadata {
            title: Some(document_title(kind, patient)),
            author: Some(settings.clinic_name.clone()).filter(|n| !n.is_empty()),
            subject: None,
        };
        PdfWriter::new().write_page(&bitmap, template.paper_size, &metadata)
    }

    /// The editor's "Download Sample": the draft template printed for the
    /// built-in sample patient.
    pub fn download_sample(&self, settings: &PrintSettings, kind: DocumentKind) -> Option<PathBuf> {
        let filename = export_filename(ExportPrefix::sample(kind), None);
        self.export_pdf(&PatientRecord::sample(), settings.template(kind), settings, &filename, kind)
    }

    /// Print `kind` for a real patient with the default prefix for the kind.
    pub fn print_for(&self, patient: &PatientRecord, settings: &PrintSettings, kind: DocumentKind) -> Option<PathBuf> {
        let filename = export_filename(ExportPrefix::for_kind(kind), patient.display_name());
        self.export_pdf(patient, settings.template(kind), settings, &filename, kind)
    }
}

fn document_title(kind: DocumentKind, patient: &PatientRecord) -> String {
    let label = match kind {
        DocumentKind::Rx => "Prescription",
        DocumentKind::Requests => "Investigation Requests",
        DocumentKind::Reports => "Medical Report",
    };
    match patient.display_name() {
        Some(name) => format!("{} - {}", label, name),
        None => label.to_string(),
    }
}
