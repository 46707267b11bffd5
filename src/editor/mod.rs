//! # Template Editor Session
//!
//! One interactive editing session over a tenant's [`PrintSettings`]. The
//! session keeps a draft of all three templates, tracks which document kind
//! is on screen, which element is selected and whether a drag is in flight.
//!
//! ```text
//!   Idle ──select──▶ Selected(id) ──pointer_down──▶ Dragging(id, mode)
//!    ▲                 │    ▲                             │
//!    └─background/─────┘    └──────── pointer_up ─────────┘
//!       delete/switch_kind
//! ```
//!
//! Switching kinds from any state lands in `Idle` and keeps each kind's
//! draft. A drag holds a pointer capture from the host; the capture is
//! released on every path out of `Dragging`, including the session being
//! dropped mid-drag.
//!
//! Saving writes the whole draft. A failed save leaves the draft untouched
//! and the session dirty, so the user can retry.

pub mod capture;
pub mod drag;

pub use capture::{CaptureId, CountingCapture, NoCapture, PointerCapture};
pub use drag::{ContainerSize, DragAnchor, DragMode, Point, MIN_HEIGHT, MIN_WIDTH};

use tracing::{debug, warn};

use crate::error::PrintError;
use crate::model::{
    DocumentKind, DocumentTemplate, ElementKind, FontWeight, PaperSize, PrintSettings, PrintableElement, Rect,
    TextAlign,
};
use crate::persistence::PrintSettingsStore;
use crate::placeholder::Token;

/// Observable state of the session.
#[derive(Debug, Clone, PartialEq)]
pub enum EditorState {
    Idle,
    Selected(String),
    Dragging { element_id: String, mode: DragMode },
}

#[derive(Debug)]
enum DragState {
    Idle,
    Dragging {
        element_id: String,
        mode: DragMode,
        anchor: DragAnchor,
        capture: CaptureId,
    },
}

/// A property-panel edit applied to the selected element.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyChange {
    /// Text, image data URI, or data-block label.
    Content(String),
    FontSize(f64),
    FontWeight(FontWeight),
    Align(TextAlign),
    /// Table variant, clamped to 1-3.
    DataLayout(u8),
    ShowSectionHeader(bool),
    ZIndex(i32),
    /// Typed-in geometry. Not clamped.
    Geometry(Rect),
}

impl PropertyChange {
    fn name(&self) -> &'static str {
        match self {
            PropertyChange::Content(_) => "content",
            PropertyChange::FontSize(_) => "fontSize",
            PropertyChange::FontWeight(_) => "fontWeight",
            PropertyChange::Align(_) => "align",
            PropertyChange::DataLayout(_) => "dataLayout",
            PropertyChange::ShowSectionHeader(_) => "showSectionHeader",
            PropertyChange::ZIndex(_) => "zIndex",
            PropertyChange::Geometry(_) => "geometry",
        }
    }
}

pub struct EditorSession<C: PointerCapture = NoCapture> {
    draft: PrintSettings,
    active: DocumentKind,
    selection: Option<String>,
    drag: DragState,
    capture: C,
    dirty: bool,
}

impl EditorSession<NoCapture> {
    /// A session with no host listeners to manage.
    pub fn headless(settings: PrintSettings) -> Self {
        Self::new(settings, NoCapture::default())
    }
}

impl<C: PointerCapture> EditorSession<C> {
    pub fn new(settings: PrintSettings, capture: C) -> Self {
        Self {
            draft: settings,
            active: DocumentKind::Rx,
            selection: None,
            drag: DragState::Idle,
            capture,
            dirty: false,
        }
    }

    /// Open a session on a tenant's stored settings, or the defaults.
    pub fn open(store: &dyn PrintSettingsStore, tenant: &str, capture: C) -> Result<Self, PrintError> {
        let settings = store.load_or_default(tenant)?;
        Ok(Self::new(settings, capture))
    }

    pub fn state(&self) -> EditorState {
        match (&self.drag, &self.selection) {
            (DragState::Dragging { element_id, mode, .. }, _) => EditorState::Dragging {
                element_id: element_id.clone(),
                mode: *mode,
            },
            (DragState::Idle, Some(id)) => EditorState::Selected(id.clone()),
            (DragState::Idle, None) => EditorState::Idle,
        }
    }

    pub fn draft(&self) -> &PrintSettings {
        &self.draft
    }

    /// Edit clinic metadata shared by all templates.
    pub fn update_clinic<F: FnOnce(&mut PrintSettings)>(&mut self, f: F) {
        f(&mut self.draft);
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn pointer_capture(&self) -> &C {
        &self.capture
    }

    pub fn active_kind(&self) -> DocumentKind {
        self.active
    }

    pub fn template(&self) -> &DocumentTemplate {
        self.draft.template(self.active)
    }

    fn template_mut(&mut self) -> &mut DocumentTemplate {
        self.dirty = true;
        self.draft.template_mut(self.active)
    }

    /// Show another document kind. Clears selection and ends any drag.
    pub fn switch_kind(&mut self, kind: DocumentKind) {
        self.end_drag();
        self.selection = None;
        self.active = kind;
    }

    // ── Selection ───────────────────────────────────────────────────

    pub fn select(&mut self, id: &str) -> Result<(), PrintError> {
        if self.template().element(id).is_none() {
            return Err(PrintError::ElementNotFound(id.to_string()));
        }
        if self.dragging_id().is_some_and(|d| d != id) {
            self.end_drag();
        }
        self.selection = Some(id.to_string());
        Ok(())
    }

    /// A click on empty canvas.
    pub fn clear_selection(&mut self) {
        self.end_drag();
        self.selection = None;
    }

    pub fn selected_id(&self) -> Option<&str> {
        self.selection.as_deref()
    }

    pub fn selected(&self) -> Option<&PrintableElement> {
        self.selection.as_deref().and_then(|id| self.template().element(id))
    }

    /// Topmost element under a point given in page percent.
    pub fn hit_test(&self, x: f64, y: f64) -> Option<&str> {
        self.template()
            .paint_order()
            .into_iter()
            .rev()
            .find(|e| e.rect.contains(x, y))
            .map(|e| e.id.as_str())
    }

    /// Click at a point in page percent: select what's there, or clear.
    pub fn click_at(&mut self, x: f64, y: f64) {
        match self.hit_test(x, y).map(str::to_string) {
            Some(id) => self.selection = Some(id),
            None => self.clear_selection(),
        }
    }

    // ── Dragging ────────────────────────────────────────────────────

    /// Press on an element (or its resize handle). Selects it and starts a drag.
    pub fn pointer_down(
        &mut self,
        id: &str,
        mode: DragMode,
        pointer: Point,
        container: ContainerSize,
    ) -> Result<(), PrintError> {
        let start = self
            .template()
            .element(id)
            .map(|e| e.rect)
            .ok_or_else(|| PrintError::ElementNotFound(id.to_string()))?;
        self.end_drag();

        let capture = self.capture.attach();
        debug!(element = id, ?mode, "drag started");
        self.selection = Some(id.to_string());
        self.drag = DragState::Dragging {
            element_id: id.to_string(),
            mode,
            anchor: DragAnchor {
                start,
                pointer,
                container,
            },
            capture,
        };
        Ok(())
    }

    /// Pointer moved while captured. Returns the element's new rectangle,
    /// or `None` when no drag is in progress.
    pub fn pointer_move(&mut self, pointer: Point) -> Option<Rect> {
        let (id, rect) = match &self.drag {
            DragState::Dragging {
                element_id,
                mode,
                anchor,
                ..
            } => (element_id.clone(), anchor.apply(*mode, pointer)),
            DragState::Idle => return None,
        };
        let updated = self.template_mut().element_mut(&id).map(|el| {
            el.rect = rect;
            rect
        });
        if updated.is_none() {
            warn!(element = %id, "dragged element vanished");
            self.end_drag();
        }
        updated
    }

    /// Pointer released: the drag ends, the element stays selected.
    pub fn pointer_up(&mut self) {
        self.end_drag();
    }

    fn dragging_id(&self) -> Option<&str> {
        match &self.drag {
            DragState::Dragging { element_id, .. } => Some(element_id),
            DragState::Idle => None,
        }
    }

    fn end_drag(&mut self) {
        if let DragState::Dragging { element_id, capture, .. } =
            std::mem::replace(&mut self.drag, DragState::Idle)
        {
            self.capture.detach(capture);
            debug!(element = %element_id, "drag ended");
        }
    }

    // ── Palette ─────────────────────────────────────────────────────

    fn insert(&mut self, element: PrintableElement) -> String {
        let id = element.id.clone();
        let mut element = element;
        element.z_index = self.template().max_z();
        self.template_mut().elements.push(element);
        self.selection = Some(id.clone());
        id
    }

    pub fn add_text(&mut self) -> String {
        self.insert(PrintableElement::text(new_id(), Rect::new(10.0, 10.0, 30.0, 5.0), "New Text"))
    }

    pub fn add_image(&mut self, data_uri: &str) -> String {
        self.insert(PrintableElement::image(new_id(), Rect::new(10.0, 10.0, 20.0, 15.0), data_uri))
    }

    pub fn add_data_block(&mut self) -> String {
        self.insert(PrintableElement::data_block(new_id(), Rect::new(5.0, 30.0, 90.0, 40.0)))
    }

    /// A text element holding just the token's placeholder.
    pub fn add_placeholder(&mut self, token: Token) -> String {
        self.insert(PrintableElement::text(
            new_id(),
            Rect::new(10.0, 10.0, 30.0, 5.0),
            &token.placeholder(),
        ))
    }

    // ── Property panel ──────────────────────────────────────────────

    pub fn apply(&mut self, change: PropertyChange) -> Result<(), PrintError> {
        let id = self
            .selection
            .clone()
            .ok_or_else(|| PrintError::ElementNotFound("<no selection>".to_string()))?;
        self.apply_to(&id, change)
    }

    pub fn apply_to(&mut self, id: &str, change: PropertyChange) -> Result<(), PrintError> {
        let element = self
            .draft
            .template_mut(self.active)
            .element_mut(id)
            .ok_or_else(|| PrintError::ElementNotFound(id.to_string()))?;
        apply_change(element, change)?;
        self.dirty = true;
        Ok(())
    }

    pub fn delete_selected(&mut self) -> Option<PrintableElement> {
        let id = self.selection.clone()?;
        self.delete(&id)
    }

    pub fn delete(&mut self, id: &str) -> Option<PrintableElement> {
        if self.dragging_id() == Some(id) {
            self.end_drag();
        }
        let removed = self.template_mut().remove(id);
        if self.selection.as_deref() == Some(id) {
            self.selection = None;
        }
        removed
    }

    pub fn bring_to_front(&mut self, id: &str) -> Result<(), PrintError> {
        let others_top = self
            .template()
            .elements
            .iter()
            .filter(|e| e.id != id)
            .map(|e| e.z_index)
            .max();
        let el = self
            .template_mut()
            .element_mut(id)
            .ok_or_else(|| PrintError::ElementNotFound(id.to_string()))?;
        if let Some(top) = others_top {
            if el.z_index <= top {
                el.z_index = top + 1;
            }
        }
        Ok(())
    }

    pub fn send_to_back(&mut self, id: &str) -> Result<(), PrintError> {
        let bottom = self.template().min_z();
        let el = self
            .template_mut()
            .element_mut(id)
            .ok_or_else(|| PrintError::ElementNotFound(id.to_string()))?;
        el.z_index = bottom - 1;
        Ok(())
    }

    // ── Template-level ──────────────────────────────────────────────

    pub fn set_background(&mut self, data_uri: Option<String>) {
        self.template_mut().background_url = data_uri;
    }

    pub fn set_paper_size(&mut self, paper_size: PaperSize) {
        self.template_mut().paper_size = paper_size;
    }

    /// Replace the active kind's template, e.g. "reset to generic".
    pub fn replace_template(&mut self, template: DocumentTemplate) {
        self.end_drag();
        self.selection = None;
        *self.template_mut() = template;
    }

    // ── Persistence ─────────────────────────────────────────────────

    /// Commit the draft. On failure the draft is kept and stays dirty.
    pub fn save(&mut self, store: &mut dyn PrintSettingsStore, tenant: &str) -> Result<(), PrintError> {
        match store.save(tenant, &self.draft) {
            Ok(()) => {
                self.dirty = false;
                Ok(())
            }
            Err(e) => {
                warn!(tenant, error = %e, "saving print settings failed; draft kept");
                Err(e)
            }
        }
    }

    /// End the session and take the draft.
    pub fn into_settings(mut self) -> PrintSettings {
        self.end_drag();
        std::mem::take(&mut self.draft)
    }
}

impl<C: PointerCapture> Drop for EditorSession<C> {
    fn drop(&mut self) {
        self.end_drag();
    }
}

fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

fn apply_change(element: &mut PrintableElement, change: PropertyChange) -> Result<(), PrintError> {
    let invalid = |change: &PropertyChange, kind: &ElementKind| PrintError::InvalidProperty {
        property: change.name(),
        kind: kind.name(),
    };

    match change {
        PropertyChange::Geometry(rect) => element.rect = rect,
        PropertyChange::ZIndex(z) => element.z_index = z,
        PropertyChange::Content(value) => match &mut element.kind {
            ElementKind::Text { content, .. }
            | ElementKind::Image { content }
            | ElementKind::DataBlock { content, .. } => *content = value,
        },
        PropertyChange::FontSize(size) => match &mut element.kind {
            ElementKind::Text { font_size, .. } | ElementKind::DataBlock { font_size, .. } => {
                *font_size = size.max(1.0);
            }
            other => return Err(invalid(&change, other)),
        },
        PropertyChange::FontWeight(weight) => match &mut element.kind {
            ElementKind::Text { font_weight, .. } => *font_weight = weight,
            other => return Err(invalid(&change, other)),
        },
        PropertyChange::Align(a) => match &mut element.kind {
            ElementKind::Text { align, .. } => *align = a,
            other => return Err(invalid(&change, other)),
        },
        PropertyChange::DataLayout(n) => match &mut element.kind {
            ElementKind::DataBlock { data_layout, .. } => *data_layout = n.clamp(1, 3),
            other => return Err(invalid(&change, other)),
        },
        PropertyChange::ShowSectionHeader(show) => match &mut element.kind {
            ElementKind::DataBlock {
                show_section_header, ..
            } => *show_section_header = show,
            other => return Err(invalid(&change, other)),
        },
    }
    Ok(())
}
