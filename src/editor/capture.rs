//! Pointer capture for the duration of a drag.
//!
//! While an element is being dragged, pointer-move and pointer-up must reach
//! the editor even after the pointer leaves the element. The host UI
//! implements [`PointerCapture`] by installing window-level listeners; the
//! editor session attaches exactly when a drag starts and detaches on every
//! way out of it (release, tab switch, deleting the dragged element, or the
//! session being dropped).

/// Handle of an attached listener pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureId(pub u64);

pub trait PointerCapture {
    /// Start routing global pointer-move/up events to the editor.
    fn attach(&mut self) -> CaptureId;
    /// Stop routing events for a previously attached handle.
    fn detach(&mut self, id: CaptureId);
}

/// A host with no listeners to manage, e.g. headless use and scripted edits.
#[derive(Debug, Default)]
pub struct NoCapture {
    next: u64,
}

impl PointerCapture for NoCapture {
    fn attach(&mut self) -> CaptureId {
        self.next += 1;
        CaptureId(self.next)
    }

    fn detach(&mut self, _id: CaptureId) {}
}

/// Counts attached handles. Useful for asserting a host never leaks listeners.
#[derive(Debug, Default)]
pub struct CountingCapture {
    next: u64,
    active: Vec<CaptureId>,
    pub attached_total: usize,
    pub detached_total: usize,
}

impl CountingCapture {
    pub fn active(&self) -> usize {
        self.active.len()
    }
}

impl PointerCapture for CountingCapture {
    fn attach(&mut self) -> CaptureId {
        self.next += 1;
        let id = CaptureId(self.next);
        self.active.push(id);
        self.attached_total += 1;
        id
    }

    fn detach(&mut self, id: CaptureId) {
        if let Some(pos) = self.active.iter().position(|a| *a == id) {
            self.active.remove(pos);
            self.detached_total += 1;
        }
    }
}

impl<C: PointerCapture + ?Sized> PointerCapture for &mut C {
    fn attach(&mut self) -> CaptureId {
        (**self).attach()
    }

    fn detach(&mut self, id: CaptureId) {
        (**self).detach(id)
    }
}
