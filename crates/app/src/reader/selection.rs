//! Live highlight synchronization.
//!
//! At most one range is ever highlighted. Applying a marker clears the
//! previous one first, selecting the session's end sentinel only clears,
//! and markers for ids outside the live session are ignored entirely —
//! they are the normal residue of superseded sessions, not errors.

use super::document::NodeId;
use super::session::ReadingSession;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerKind {
    /// Highlight the whole fragment.
    Whole,
    /// Highlight chars `[start, end)` within the fragment.
    Span { start: u32, end: u32 },
}

/// The currently applied highlight descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Marker {
    pub id: u64,
    pub kind: MarkerKind,
}

/// Document selection capability: the host applies and removes the one
/// visible highlight range.
pub trait HighlightSink {
    /// Highlight `span` (char offsets, half-open) within the text node,
    /// or the whole node when `span` is `None`.
    fn apply(&mut self, node: NodeId, span: Option<(u32, u32)>);

    /// Remove the current highlight, if any.
    fn clear(&mut self);
}

/// Tracks the applied marker and enforces the exclusivity rules above.
#[derive(Debug, Default)]
pub struct SelectionSync {
    last: Option<Marker>,
}

impl SelectionSync {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last(&self) -> Option<Marker> {
        self.last
    }

    /// Apply `marker` against the live session.
    pub fn select<H: HighlightSink>(
        &mut self,
        session: &ReadingSession,
        marker: Marker,
        sink: &mut H,
    ) {
        let range = session.range();
        // Stale ids (from a superseded session) leave the current
        // highlight untouched.
        if marker.id < range.start() || marker.id > range.sentinel() {
            debug!("Ignoring marker for stale fragment {}", marker.id);
            return;
        }
        self.clear(sink);
        if marker.id == range.sentinel() {
            return;
        }
        let Some(fragment) = session.fragment(marker.id) else {
            return;
        };
        let span = match marker.kind {
            MarkerKind::Whole => None,
            MarkerKind::Span { start, end } => Some((start, end)),
        };
        sink.apply(fragment.node, span);
        self.last = Some(marker);
    }

    /// Drop the highlight. Safe to call with nothing selected.
    pub fn clear<H: HighlightSink>(&mut self, sink: &mut H) {
        if self.last.take().is_some() {
            sink.clear();
        }
    }
}

/// Highlight sink for running without a rendered page: resolves the
/// fragment text and writes what would be highlighted to the log.
pub struct LoggingHighlight {
    document: Arc<super::document::Document>,
}

impl LoggingHighlight {
    pub fn new(document: Arc<super::document::Document>) -> Self {
        Self { document }
    }
}

impl HighlightSink for LoggingHighlight {
    fn apply(&mut self, node: NodeId, span: Option<(u32, u32)>) {
        let content = self.document.text_content(node).unwrap_or_default();
        match span {
            None => tracing::info!("Reading: \u{201c}{}\u{201d}", content),
            Some((start, end)) => {
                let word: String = content
                    .chars()
                    .skip(start as usize)
                    .take(end.saturating_sub(start) as usize)
                    .collect();
                tracing::info!("  word: \u{201c}{}\u{201d}", word);
            }
        }
    }

    fn clear(&mut self) {
        tracing::debug!("Highlight cleared");
    }
}
