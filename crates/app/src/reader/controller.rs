//! Reading-surface controller.
//!
//! Turns pointer movement into narration requests and keeps the visible
//! highlight truthful to narration state. This is a pure state machine:
//! inputs are pointer events, debounce expiry, and host events; outputs
//! are bridge commands plus an instruction for the debounce timer. The
//! surrounding task owns the actual timer and channels.

use super::document::{Document, GeometryQuery, Point};
use super::ids::IdAllocator;
use super::selection::{HighlightSink, Marker, MarkerKind, SelectionSync};
use super::session::{ReaderState, ReadingSession, TextFragment};
use crate::reader::document::NodeId;
use pagevox_protocol::{HostEvent, SurfaceCommand};
use tracing::{debug, trace};

/// Pointer movement over the rendered page.
#[derive(Debug, Clone, Copy)]
pub struct PointerEvent {
    /// Node under the pointer, as reported by the page.
    pub target: NodeId,
    pub point: Point,
}

/// What the owning task should do with the debounce timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebounceControl {
    /// Leave the timer as it is.
    Keep,
    /// Disarm any pending timer.
    Disarm,
    /// (Re)arm the timer; on expiry, call
    /// [`ReaderController::debounce_elapsed`] with this generation.
    Arm { generation: u64 },
}

/// Outcome of one controller step: commands to put on the bridge, and
/// the timer instruction.
#[derive(Debug)]
pub struct SurfaceEffects {
    pub commands: Vec<SurfaceCommand>,
    pub debounce: DebounceControl,
}

impl SurfaceEffects {
    fn none() -> Self {
        Self {
            commands: Vec::new(),
            debounce: DebounceControl::Keep,
        }
    }
}

pub struct ReaderController<H: HighlightSink> {
    enabled: bool,
    initialize_sent: bool,
    language: String,
    voice_label: Option<String>,
    state: ReaderState,
    ids: IdAllocator,
    selection: SelectionSync,
    sink: H,
    next_generation: u64,
}

impl<H: HighlightSink> ReaderController<H> {
    pub fn new(language: impl Into<String>, sink: H) -> Self {
        Self {
            enabled: false,
            initialize_sent: false,
            language: language.into(),
            voice_label: None,
            state: ReaderState::Idle,
            ids: IdAllocator::new(),
            selection: SelectionSync::new(),
            sink,
            next_generation: 0,
        }
    }

    /// Toggle the whole reading feature. Enabling sends the initialize
    /// command at most once per enabled span; disabling tears down any
    /// live session. Repeating the current setting is a no-op.
    pub fn set_enabled(&mut self, on: bool) -> SurfaceEffects {
        if on == self.enabled {
            return SurfaceEffects::none();
        }
        self.enabled = on;
        if on {
            debug!("Reader enabled");
            let mut effects = SurfaceEffects::none();
            if !self.initialize_sent {
                self.initialize_sent = true;
                effects.commands.push(SurfaceCommand::Initialize {
                    language: self.language.clone(),
                });
            }
            effects
        } else {
            debug!("Reader disabled");
            let effects = self.teardown();
            self.initialize_sent = false;
            effects
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// The narrator's resolved voice name, once reported.
    pub fn voice_label(&self) -> Option<&str> {
        self.voice_label.as_deref()
    }

    pub fn state(&self) -> &ReaderState {
        &self.state
    }

    pub fn selected_marker(&self) -> Option<Marker> {
        self.selection.last()
    }

    /// React to pointer movement: resolve the hovered block, and when it
    /// differs from the live session's target, tear the session down and
    /// try to start a new one.
    pub fn pointer_moved<G: GeometryQuery>(
        &mut self,
        document: &Document,
        geometry: &G,
        event: PointerEvent,
    ) -> SurfaceEffects {
        if !self.enabled {
            return SurfaceEffects::none();
        }

        let block = document.block_ancestor(event.target);
        if self.state.session().map(|s| s.target()) == Some(block) {
            return SurfaceEffects::none();
        }

        let mut effects = self.teardown();

        let leaves = document.text_leaves(block);
        let hit = leaves.iter().any(|&node| {
            geometry
                .node_rect(node)
                .is_some_and(|rect| rect.contains(event.point))
        });
        if leaves.is_empty() || !hit {
            // Hovering non-text padding starts nothing.
            return effects;
        }

        let range = self.ids.reserve(leaves.len());
        let fragments = range
            .iter()
            .zip(&leaves)
            .map(|(id, &node)| TextFragment {
                id,
                node,
                content: document.text_content(node).unwrap_or_default().to_string(),
            })
            .collect();
        self.next_generation += 1;
        let generation = self.next_generation;
        debug!(
            "Session pending over block {} with ids [{}, {})",
            block,
            range.start(),
            range.sentinel()
        );
        self.state = ReaderState::Pending(ReadingSession::new(block, range, fragments, generation));
        effects.debounce = DebounceControl::Arm { generation };
        effects
    }

    /// The debounce timer fired. A stale generation (the session it was
    /// armed for is gone) is a no-op; otherwise emit one speak per
    /// fragment and highlight the first one.
    pub fn debounce_elapsed(&mut self, generation: u64) -> Vec<SurfaceCommand> {
        let session = match std::mem::take(&mut self.state) {
            ReaderState::Pending(session) if session.generation() == generation => session,
            other => {
                trace!("Stale debounce (generation {})", generation);
                self.state = other;
                return Vec::new();
            }
        };

        let commands = session
            .fragments()
            .iter()
            .map(|fragment| SurfaceCommand::Speak {
                id: fragment.id,
                text: fragment.content.clone(),
            })
            .collect();
        self.selection.select(
            &session,
            Marker {
                id: session.range().start(),
                kind: MarkerKind::Whole,
            },
            &mut self.sink,
        );
        debug!("Session speaking, {} fragment(s)", session.fragments().len());
        self.state = ReaderState::Speaking(session);
        commands
    }

    /// Tear down any live session: cancel narration, clear the
    /// highlight, disarm the timer. Safe to call with no session.
    pub fn cancel_all(&mut self) -> SurfaceEffects {
        self.teardown()
    }

    fn teardown(&mut self) -> SurfaceEffects {
        if self.state.is_idle() {
            return SurfaceEffects::none();
        }
        self.state = ReaderState::Idle;
        self.selection.clear(&mut self.sink);
        SurfaceEffects {
            commands: vec![SurfaceCommand::SpeakCancelAll],
            debounce: DebounceControl::Disarm,
        }
    }

    /// Host events: progress and completion move the highlight, stale
    /// ids are silently ignored, and the initialized reply records the
    /// voice label.
    pub fn handle_host_event(&mut self, event: HostEvent) {
        match event {
            HostEvent::Initialized { voice } => {
                debug!("Narrator ready with voice {:?}", voice);
                self.voice_label = Some(voice);
            }
            HostEvent::SpeakComplete { id } => {
                let ReaderState::Speaking(session) = &self.state else {
                    return;
                };
                if !session.range().contains(id) {
                    trace!("Completion for stale fragment {}", id);
                    return;
                }
                let next = id + 1;
                let sentinel = session.range().sentinel();
                self.selection.select(
                    session,
                    Marker { id: next, kind: MarkerKind::Whole },
                    &mut self.sink,
                );
                if next == sentinel {
                    debug!("Session complete");
                    self.state = ReaderState::Idle;
                }
            }
            HostEvent::SpeakProgress { id, position, count } => {
                let ReaderState::Speaking(session) = &self.state else {
                    return;
                };
                if !session.range().contains(id) {
                    trace!("Progress for stale fragment {}", id);
                    return;
                }
                self.selection.select(
                    session,
                    Marker {
                        id,
                        kind: MarkerKind::Span {
                            start: position,
                            end: position + count,
                        },
                    },
                    &mut self.sink,
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::document::{DisplayKind, Rect};
    use crate::test_utils::{sample_page, RecordingHighlight};

    fn controller() -> ReaderController<RecordingHighlight> {
        let mut c = ReaderController::new("en", RecordingHighlight::new());
        c.set_enabled(true);
        c
    }

    fn hover(target: NodeId, x: f32, y: f32) -> PointerEvent {
        PointerEvent { target, point: Point { x, y } }
    }

    #[test]
    fn enabling_sends_initialize_once() {
        let mut c = ReaderController::new("de", RecordingHighlight::new());
        let fx = c.set_enabled(true);
        assert_eq!(
            fx.commands,
            vec![SurfaceCommand::Initialize { language: "de".into() }]
        );
        // Enabling again before (or after) the reply re-sends nothing.
        assert!(c.set_enabled(true).commands.is_empty());
    }

    #[test]
    fn disable_then_enable_reinitializes() {
        let mut c = controller();
        c.set_enabled(false);
        let fx = c.set_enabled(true);
        assert_eq!(fx.commands.len(), 1);
    }

    #[test]
    fn hover_over_text_arms_debounce_and_speaks_in_order() {
        let page = sample_page();
        let mut c = controller();

        // Scenario 1: settle over the first paragraph ("Hello", "world").
        let fx = c.pointer_moved(&page.doc, &page.doc, hover(page.hello, 10.0, 5.0));
        assert!(fx.commands.is_empty());
        let DebounceControl::Arm { generation } = fx.debounce else {
            panic!("expected armed debounce, got {:?}", fx.debounce);
        };

        let commands = c.debounce_elapsed(generation);
        assert_eq!(
            commands,
            vec![
                SurfaceCommand::Speak { id: 1, text: "Hello".into() },
                SurfaceCommand::Speak { id: 2, text: "world".into() },
            ]
        );
        // First fragment selected whole.
        assert_eq!(
            c.selected_marker(),
            Some(Marker { id: 1, kind: MarkerKind::Whole })
        );
    }

    #[test]
    fn progress_highlights_sub_range() {
        let page = sample_page();
        let mut c = controller();
        let fx = c.pointer_moved(&page.doc, &page.doc, hover(page.hello, 10.0, 5.0));
        let DebounceControl::Arm { generation } = fx.debounce else { panic!() };
        c.debounce_elapsed(generation);

        // Scenario 2.
        c.handle_host_event(HostEvent::SpeakProgress { id: 1, position: 0, count: 5 });
        assert_eq!(
            c.selected_marker(),
            Some(Marker { id: 1, kind: MarkerKind::Span { start: 0, end: 5 } })
        );
    }

    #[test]
    fn completion_advances_and_sentinel_ends_session() {
        let page = sample_page();
        let mut c = controller();
        let fx = c.pointer_moved(&page.doc, &page.doc, hover(page.hello, 10.0, 5.0));
        let DebounceControl::Arm { generation } = fx.debounce else { panic!() };
        c.debounce_elapsed(generation);

        // Scenario 3: completing fragment 1 selects fragment 2 whole.
        c.handle_host_event(HostEvent::SpeakComplete { id: 1 });
        assert_eq!(
            c.selected_marker(),
            Some(Marker { id: 2, kind: MarkerKind::Whole })
        );

        // Scenario 4: completing the last fragment clears and ends.
        c.handle_host_event(HostEvent::SpeakComplete { id: 2 });
        assert_eq!(c.selected_marker(), None);
        assert!(c.state().is_idle());
    }

    #[test]
    fn supersession_tears_down_before_arming() {
        let page = sample_page();
        let mut c = controller();
        let fx = c.pointer_moved(&page.doc, &page.doc, hover(page.hello, 10.0, 5.0));
        let DebounceControl::Arm { generation: first } = fx.debounce else { panic!() };
        c.debounce_elapsed(first);

        // Scenario 5: mid-speech move to the second paragraph.
        let fx = c.pointer_moved(&page.doc, &page.doc, hover(page.again, 10.0, 25.0));
        assert_eq!(fx.commands, vec![SurfaceCommand::SpeakCancelAll]);
        let DebounceControl::Arm { generation: second } = fx.debounce else {
            panic!("expected a new debounce, got {:?}", fx.debounce);
        };
        assert_ne!(first, second);
        assert_eq!(c.selected_marker(), None);

        // Late progress for the dead session's id is dropped.
        c.handle_host_event(HostEvent::SpeakProgress { id: 1, position: 0, count: 5 });
        assert_eq!(c.selected_marker(), None);

        // The new session speaks with fresh, higher ids.
        let commands = c.debounce_elapsed(second);
        assert_eq!(
            commands,
            vec![SurfaceCommand::Speak { id: 3, text: "Again".into() }]
        );
    }

    #[test]
    fn hovering_the_active_block_is_a_no_op() {
        let page = sample_page();
        let mut c = controller();
        let fx = c.pointer_moved(&page.doc, &page.doc, hover(page.hello, 10.0, 5.0));
        let DebounceControl::Arm { generation } = fx.debounce else { panic!() };

        // Moving within the same block, even onto the other fragment,
        // keeps the pending timer.
        let fx = c.pointer_moved(&page.doc, &page.doc, hover(page.world, 90.0, 5.0));
        assert!(fx.commands.is_empty());
        assert_eq!(fx.debounce, DebounceControl::Keep);

        // The original timer still fires normally.
        assert_eq!(c.debounce_elapsed(generation).len(), 2);
    }

    #[test]
    fn hover_over_non_text_padding_starts_nothing() {
        let page = sample_page();
        let mut c = controller();
        // Inside the paragraph but outside every fragment rectangle.
        let fx = c.pointer_moved(&page.doc, &page.doc, hover(page.hello, 500.0, 5.0));
        assert!(fx.commands.is_empty());
        assert_eq!(fx.debounce, DebounceControl::Keep);
        assert!(c.state().is_idle());
    }

    #[test]
    fn empty_block_starts_nothing() {
        let mut page = sample_page();
        let empty = page.doc.element(page.doc.root(), "div", DisplayKind::Block);
        let mut c = controller();
        let fx = c.pointer_moved(&page.doc, &page.doc, hover(empty, 1.0, 1.0));
        assert!(fx.commands.is_empty());
        assert!(c.state().is_idle());
    }

    #[test]
    fn stale_debounce_generation_is_a_no_op() {
        let page = sample_page();
        let mut c = controller();
        let fx = c.pointer_moved(&page.doc, &page.doc, hover(page.hello, 10.0, 5.0));
        let DebounceControl::Arm { generation: first } = fx.debounce else { panic!() };

        // Supersede before the timer fires.
        let fx = c.pointer_moved(&page.doc, &page.doc, hover(page.again, 10.0, 25.0));
        let DebounceControl::Arm { generation: second } = fx.debounce else { panic!() };

        // The first timer fires late: nothing is spoken for it.
        assert!(c.debounce_elapsed(first).is_empty());
        // The live one still works.
        assert!(!c.debounce_elapsed(second).is_empty());
    }

    #[test]
    fn toggling_off_while_pending_suppresses_speech() {
        let page = sample_page();
        let mut c = controller();
        let fx = c.pointer_moved(&page.doc, &page.doc, hover(page.hello, 10.0, 5.0));
        let DebounceControl::Arm { generation } = fx.debounce else { panic!() };

        // Scenario 6.
        let fx = c.set_enabled(false);
        assert_eq!(fx.commands, vec![SurfaceCommand::SpeakCancelAll]);
        assert_eq!(fx.debounce, DebounceControl::Disarm);
        assert!(c.debounce_elapsed(generation).is_empty());
    }

    #[test]
    fn pointer_while_disabled_is_inert() {
        let page = sample_page();
        let mut c = ReaderController::new("en", RecordingHighlight::new());
        let fx = c.pointer_moved(&page.doc, &page.doc, hover(page.hello, 10.0, 5.0));
        assert!(fx.commands.is_empty());
        assert_eq!(fx.debounce, DebounceControl::Keep);
    }

    #[test]
    fn cancel_all_without_session_is_safe() {
        let mut c = controller();
        let fx = c.cancel_all();
        assert!(fx.commands.is_empty());
        assert_eq!(fx.debounce, DebounceControl::Keep);
    }

    #[test]
    fn id_ranges_grow_across_sessions() {
        let page = sample_page();
        let mut c = controller();

        for _ in 0..3 {
            let fx = c.pointer_moved(&page.doc, &page.doc, hover(page.hello, 10.0, 5.0));
            let DebounceControl::Arm { generation } = fx.debounce else { panic!() };
            c.debounce_elapsed(generation);
            let fx = c.pointer_moved(&page.doc, &page.doc, hover(page.again, 10.0, 25.0));
            let DebounceControl::Arm { generation } = fx.debounce else { panic!() };
            c.debounce_elapsed(generation);
        }
        // Three two-fragment sessions and three one-fragment sessions.
        let ReaderState::Speaking(session) = c.state() else { panic!() };
        assert_eq!(session.range().start(), 9);
    }

    #[test]
    fn initialized_records_voice_label() {
        let mut c = controller();
        assert_eq!(c.voice_label(), None);
        c.handle_host_event(HostEvent::Initialized { voice: "English (America)".into() });
        assert_eq!(c.voice_label(), Some("English (America)"));
    }

    #[test]
    fn geometry_failures_never_qualify() {
        struct NoGeometry;
        impl GeometryQuery for NoGeometry {
            fn node_rect(&self, _node: NodeId) -> Option<Rect> {
                None
            }
        }
        let page = sample_page();
        let mut c = controller();
        let fx = c.pointer_moved(&page.doc, &NoGeometry, hover(page.hello, 10.0, 5.0));
        assert!(fx.commands.is_empty());
        assert!(c.state().is_idle());
    }
}
