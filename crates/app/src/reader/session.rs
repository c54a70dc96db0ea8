//! Reading sessions and the per-session state machine.

use super::document::NodeId;
use super::ids::IdRange;

/// Atomic narratable unit: one text leaf's content, snapshotted when the
/// session was built. The snapshot stays valid even if the page mutates
/// underneath a running narration.
#[derive(Debug, Clone)]
pub struct TextFragment {
    pub id: u64,
    pub node: NodeId,
    pub content: String,
}

/// One hover-triggered narration attempt over one block. Fragments and
/// their id range are fixed for the session's lifetime.
#[derive(Debug)]
pub struct ReadingSession {
    target: NodeId,
    range: IdRange,
    fragments: Vec<TextFragment>,
    generation: u64,
}

impl ReadingSession {
    pub fn new(target: NodeId, range: IdRange, fragments: Vec<TextFragment>, generation: u64) -> Self {
        debug_assert_eq!(range.len(), fragments.len());
        Self {
            target,
            range,
            fragments,
            generation,
        }
    }

    /// The hovered block element that triggered segmentation.
    pub fn target(&self) -> NodeId {
        self.target
    }

    pub fn range(&self) -> IdRange {
        self.range
    }

    pub fn fragments(&self) -> &[TextFragment] {
        &self.fragments
    }

    /// Fragment by id; `None` for the sentinel and anything stale.
    pub fn fragment(&self, id: u64) -> Option<&TextFragment> {
        self.range.index_of(id).map(|index| &self.fragments[index])
    }

    /// Identifies the debounce timer armed for this session; a timer
    /// firing with any other generation is stale.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Session lifecycle. Transitions are guarded by the controller:
/// Idle -> Pending on a qualifying hover, Pending -> Speaking when the
/// debounce fires, anything -> Idle on cancellation or completion.
#[derive(Debug, Default)]
pub enum ReaderState {
    /// No live session.
    #[default]
    Idle,
    /// Hover settled, debounce armed, nothing spoken yet.
    Pending(ReadingSession),
    /// Speak commands emitted; the highlight follows narration events.
    Speaking(ReadingSession),
}

impl ReaderState {
    pub fn session(&self) -> Option<&ReadingSession> {
        match self {
            ReaderState::Idle => None,
            ReaderState::Pending(session) | ReaderState::Speaking(session) => Some(session),
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, ReaderState::Idle)
    }
}
