//! Async shell around the reader controller.
//!
//! The surface is one single-threaded loop: pointer/toggle input, host
//! events off the bridge, and the debounce timer all funnel through one
//! `select`. The timer is just a deadline; the controller's generation
//! check makes a late firing harmless even if the select races.

use super::controller::{DebounceControl, PointerEvent, ReaderController};
use super::document::Document;
use super::selection::HighlightSink;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::debug;

use crate::bridge::SurfaceEndpoint;

/// User-facing input to the reading surface.
#[derive(Debug, Clone, Copy)]
pub enum ReaderInput {
    PointerMoved(PointerEvent),
    SetEnabled(bool),
}

pub fn spawn_reader<H>(
    document: Arc<Document>,
    mut controller: ReaderController<H>,
    mut input_rx: mpsc::Receiver<ReaderInput>,
    bridge: SurfaceEndpoint,
    hover_delay: Duration,
) -> JoinHandle<()>
where
    H: HighlightSink + Send + 'static,
{
    tokio::spawn(async move {
        let SurfaceEndpoint { commands, mut events } = bridge;
        // Deadline plus the generation the timer was armed for.
        let mut deadline: Option<(Instant, u64)> = None;

        'run: loop {
            let sleep_until = deadline.map(|(at, _)| at);
            tokio::select! {
                maybe_input = input_rx.recv() => {
                    let Some(input) = maybe_input else { break };
                    let effects = match input {
                        ReaderInput::SetEnabled(on) => controller.set_enabled(on),
                        ReaderInput::PointerMoved(event) => {
                            controller.pointer_moved(&document, &*document, event)
                        }
                    };
                    for command in &effects.commands {
                        if commands.send(command).await.is_err() {
                            debug!("Host endpoint gone, stopping reader");
                            break 'run;
                        }
                    }
                    match effects.debounce {
                        DebounceControl::Keep => {}
                        DebounceControl::Disarm => deadline = None,
                        DebounceControl::Arm { generation } => {
                            deadline = Some((Instant::now() + hover_delay, generation));
                        }
                    }
                }
                maybe_event = events.recv() => {
                    let Some(event) = maybe_event else { break };
                    controller.handle_host_event(event);
                }
                _ = tokio::time::sleep_until(sleep_until.unwrap_or_else(Instant::now)),
                        if sleep_until.is_some() => {
                    if let Some((_, generation)) = deadline.take() {
                        for command in controller.debounce_elapsed(generation) {
                            if commands.send(&command).await.is_err() {
                                debug!("Host endpoint gone, stopping reader");
                                break 'run;
                            }
                        }
                    }
                }
            }
        }
        debug!("Reader task finished");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::bridge;
    use crate::reader::document::Point;
    use crate::test_utils::{sample_page, RecordingHighlight};
    use pagevox_protocol::{HostEvent, SurfaceCommand};

    async fn recv_command(
        host: &mut crate::bridge::HostEndpoint,
    ) -> Option<SurfaceCommand> {
        tokio::time::timeout(Duration::from_secs(5), host.commands.recv())
            .await
            .expect("timed out waiting for a command")
    }

    #[tokio::test(start_paused = true)]
    async fn debounce_waits_the_hover_delay() {
        let page = sample_page();
        let document = Arc::new(page.doc);
        let (surface, mut host) = bridge(16);
        let (input_tx, input_rx) = mpsc::channel(16);
        let sink = RecordingHighlight::new();
        let controller = ReaderController::new("en", sink);
        let _task = spawn_reader(
            Arc::clone(&document),
            controller,
            input_rx,
            surface,
            Duration::from_millis(500),
        );

        input_tx.send(ReaderInput::SetEnabled(true)).await.unwrap();
        assert_eq!(
            recv_command(&mut host).await,
            Some(SurfaceCommand::Initialize { language: "en".into() })
        );

        input_tx
            .send(ReaderInput::PointerMoved(PointerEvent {
                target: page.hello,
                point: Point { x: 10.0, y: 5.0 },
            }))
            .await
            .unwrap();

        // Paused time auto-advances once the task is idle, firing the
        // debounce; both fragments then come out in order.
        assert_eq!(
            recv_command(&mut host).await,
            Some(SurfaceCommand::Speak { id: 1, text: "Hello".into() })
        );
        assert_eq!(
            recv_command(&mut host).await,
            Some(SurfaceCommand::Speak { id: 2, text: "world".into() })
        );
    }

    #[tokio::test(start_paused = true)]
    async fn moving_away_before_the_delay_cancels_the_pending_session() {
        let page = sample_page();
        let document = Arc::new(page.doc);
        let (surface, mut host) = bridge(16);
        let (input_tx, input_rx) = mpsc::channel(16);
        let controller = ReaderController::new("en", RecordingHighlight::new());
        let _task = spawn_reader(
            Arc::clone(&document),
            controller,
            input_rx,
            surface,
            Duration::from_millis(500),
        );

        input_tx.send(ReaderInput::SetEnabled(true)).await.unwrap();
        assert!(matches!(
            recv_command(&mut host).await,
            Some(SurfaceCommand::Initialize { .. })
        ));

        input_tx
            .send(ReaderInput::PointerMoved(PointerEvent {
                target: page.hello,
                point: Point { x: 10.0, y: 5.0 },
            }))
            .await
            .unwrap();
        // Move to the other paragraph before the debounce fires.
        input_tx
            .send(ReaderInput::PointerMoved(PointerEvent {
                target: page.again,
                point: Point { x: 10.0, y: 25.0 },
            }))
            .await
            .unwrap();

        // First observable command is the cancel from the supersession,
        // then only the new block's fragment is spoken. Ids 1 and 2 were
        // burned by the dead session and never appear.
        assert_eq!(
            recv_command(&mut host).await,
            Some(SurfaceCommand::SpeakCancelAll)
        );
        assert_eq!(
            recv_command(&mut host).await,
            Some(SurfaceCommand::Speak { id: 3, text: "Again".into() })
        );
    }

    #[tokio::test(start_paused = true)]
    async fn host_events_drive_the_highlight() {
        let page = sample_page();
        let hello_node = page.hello;
        let world_node = page.world;
        let document = Arc::new(page.doc);
        let (surface, mut host) = bridge(16);
        let (input_tx, input_rx) = mpsc::channel(16);
        let sink = RecordingHighlight::new();
        let observer = sink.clone();
        let controller = ReaderController::new("en", sink);
        let _task = spawn_reader(
            Arc::clone(&document),
            controller,
            input_rx,
            surface,
            Duration::from_millis(500),
        );

        input_tx.send(ReaderInput::SetEnabled(true)).await.unwrap();
        input_tx
            .send(ReaderInput::PointerMoved(PointerEvent {
                target: hello_node,
                point: Point { x: 10.0, y: 5.0 },
            }))
            .await
            .unwrap();
        // Wait for both speaks so the session is live.
        let _ = recv_command(&mut host).await; // initialize
        let _ = recv_command(&mut host).await; // speak 1
        let _ = recv_command(&mut host).await; // speak 2
        assert_eq!(observer.current(), Some((hello_node, None)));

        host.events
            .send(&HostEvent::SpeakProgress { id: 1, position: 0, count: 5 })
            .await
            .unwrap();
        host.events.send(&HostEvent::SpeakComplete { id: 1 }).await.unwrap();
        host.events.send(&HostEvent::SpeakComplete { id: 2 }).await.unwrap();

        // Drain: give the reader loop a chance to process all three.
        tokio::task::yield_now().await;
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(observer.current(), None);
        let ops = observer.ops();
        assert!(ops.contains(&format!("apply {} 0..5", hello_node)));
        assert!(ops.contains(&format!("apply {} whole", world_node)));
    }
}
