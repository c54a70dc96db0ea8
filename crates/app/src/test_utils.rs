//! Shared helpers for unit tests: a recording highlight sink and a small
//! sample page.

use crate::reader::document::{DisplayKind, Document, NodeId, Rect};
use crate::reader::selection::HighlightSink;
use parking_lot::Mutex;
use std::sync::Arc;

#[derive(Default)]
struct RecordingInner {
    ops: Vec<String>,
    current: Option<(NodeId, Option<(u32, u32)>)>,
}

/// Highlight sink that records every operation. Clones share the record,
/// so a test can keep one half while the controller owns the other.
#[derive(Clone, Default)]
pub struct RecordingHighlight {
    inner: Arc<Mutex<RecordingInner>>,
}

impl RecordingHighlight {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ops(&self) -> Vec<String> {
        self.inner.lock().ops.clone()
    }

    pub fn current(&self) -> Option<(NodeId, Option<(u32, u32)>)> {
        self.inner.lock().current
    }
}

impl HighlightSink for RecordingHighlight {
    fn apply(&mut self, node: NodeId, span: Option<(u32, u32)>) {
        let mut inner = self.inner.lock();
        // Exclusivity: a second highlight without an intervening clear
        // would mean two visible ranges.
        assert!(
            inner.current.is_none(),
            "highlight applied over an existing one"
        );
        match span {
            None => inner.ops.push(format!("apply {} whole", node)),
            Some((start, end)) => inner.ops.push(format!("apply {} {}..{}", node, start, end)),
        }
        inner.current = Some((node, span));
    }

    fn clear(&mut self) {
        let mut inner = self.inner.lock();
        inner.ops.push("clear".to_string());
        inner.current = None;
    }
}

/// Two paragraphs; the first holds two fragments ("Hello" and, inside an
/// inline span, "world"), the second a single "Again".
pub struct SamplePage {
    pub doc: Document,
    pub p1: NodeId,
    pub hello: NodeId,
    pub world: NodeId,
    pub p2: NodeId,
    pub again: NodeId,
}

pub fn sample_page() -> SamplePage {
    let mut doc = Document::new();
    let p1 = doc.element(doc.root(), "p", DisplayKind::Block);
    let hello = doc.text(p1, "Hello", Rect::new(0.0, 0.0, 50.0, 10.0));
    let span = doc.element(p1, "span", DisplayKind::Inline);
    let world = doc.text(span, "world", Rect::new(80.0, 0.0, 120.0, 10.0));
    let p2 = doc.element(doc.root(), "p", DisplayKind::Block);
    let again = doc.text(p2, "Again", Rect::new(0.0, 20.0, 50.0, 30.0));
    SamplePage { doc, p1, hello, world, p2, again }
}
