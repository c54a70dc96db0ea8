//! Built-in demo page and drivers for running PageVox without a browser.
//!
//! The binary replays a scripted pointer path over a small article so the
//! whole path — hover, debounce, speak, progress, highlight, complete —
//! is observable from the terminal.

use pagevox_app::reader::{
    DisplayKind, Document, NodeId, Point, PointerEvent, ReaderInput, Rect,
};
use pagevox_tts::mock::MockNarratorHandle;
use std::time::Duration;
use tokio::sync::mpsc;

pub struct PointerStop {
    pub target: NodeId,
    pub point: Point,
    pub dwell: Duration,
}

/// A short article with two narratable paragraphs and one script element
/// that must stay silent.
pub fn sample_page() -> (Document, Vec<PointerStop>) {
    let mut doc = Document::new();

    let heading = doc.element(doc.root(), "h1", DisplayKind::Block);
    let title = doc.text(heading, "Welcome back", Rect::new(0.0, 0.0, 160.0, 24.0));

    let p1 = doc.element(doc.root(), "p", DisplayKind::Block);
    let intro = doc.text(
        p1,
        "Hover over any paragraph and it will be read aloud. ",
        Rect::new(0.0, 30.0, 320.0, 44.0),
    );
    let em = doc.element(p1, "em", DisplayKind::Inline);
    doc.text(
        em,
        "The highlighted word follows the voice.",
        Rect::new(0.0, 44.0, 260.0, 58.0),
    );

    let p2 = doc.element(doc.root(), "p", DisplayKind::Block);
    let outro = doc.text(
        p2,
        "Moving to another paragraph cancels the current narration.",
        Rect::new(0.0, 64.0, 360.0, 78.0),
    );

    let script = doc.element(doc.root(), "script", DisplayKind::Block);
    doc.detached_text(script, "console.log('never narrated')");

    let stops = vec![
        PointerStop {
            target: title,
            point: Point { x: 20.0, y: 10.0 },
            dwell: Duration::from_secs(4),
        },
        PointerStop {
            target: intro,
            point: Point { x: 40.0, y: 36.0 },
            dwell: Duration::from_secs(10),
        },
        PointerStop {
            target: outro,
            point: Point { x: 40.0, y: 70.0 },
            dwell: Duration::from_secs(8),
        },
    ];
    (doc, stops)
}

/// Replay the pointer path: enable the reader, then rest over each stop
/// long enough for narration to start.
pub async fn pointer_path(input: mpsc::Sender<ReaderInput>, stops: Vec<PointerStop>) {
    tokio::time::sleep(Duration::from_millis(300)).await;
    if input.send(ReaderInput::SetEnabled(true)).await.is_err() {
        return;
    }
    for stop in stops {
        let moved = input
            .send(ReaderInput::PointerMoved(PointerEvent {
                target: stop.target,
                point: stop.point,
            }))
            .await;
        if moved.is_err() {
            return;
        }
        tokio::time::sleep(stop.dwell).await;
    }
    tracing::info!("Demo pointer script finished; Ctrl-C to exit");
}

/// Stand-in narrator clock for engine-less runs: walks every submitted
/// utterance word by word at the configured rate, emitting progress and
/// completion just like a real engine would.
pub async fn drive_mock(mock: MockNarratorHandle, speech_rate: u32) {
    let word_gap = Duration::from_millis(60_000 / speech_rate.max(1) as u64);
    let mut narrated = 0usize;
    loop {
        let spoken = mock.spoken();
        for (handle, text) in spoken.iter().skip(narrated) {
            let mut word_start: Option<u32> = None;
            let mut offset = 0u32;
            for ch in text.chars().chain(std::iter::once(' ')) {
                if ch.is_whitespace() {
                    if let Some(start) = word_start.take() {
                        mock.progress(*handle, start, offset - start).await;
                        tokio::time::sleep(word_gap).await;
                    }
                } else if word_start.is_none() {
                    word_start = Some(offset);
                }
                offset += 1;
            }
            mock.complete(*handle).await;
        }
        narrated = spoken.len();
        tokio::time::sleep(Duration::from_millis(200)).await;
    }
}
