//! Runtime assembly: builds the bridge and spawns the surface and host
//! loops.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::info;

use pagevox_tts::{EngineEvent, NarratorEngine};

use crate::bridge::bridge;
use crate::narration::{NarrationCoordinator, ViewportControl};
use crate::reader::{spawn_reader, Document, HighlightSink, ReaderController, ReaderInput};
use crate::Settings;

/// Handle to the running reader/coordinator pair.
pub struct AppHandle {
    input_tx: mpsc::Sender<ReaderInput>,
    reader_handle: JoinHandle<()>,
    coordinator_handle: JoinHandle<()>,
}

impl AppHandle {
    /// Sender for pointer movement and the feature toggle.
    pub fn input(&self) -> mpsc::Sender<ReaderInput> {
        self.input_tx.clone()
    }

    /// Gracefully stop both loops and wait for them.
    pub async fn shutdown(self) {
        info!("Shutting down PageVox runtime...");
        drop(self.input_tx);
        self.reader_handle.abort();
        self.coordinator_handle.abort();
        let _ = self.reader_handle.await;
        let _ = self.coordinator_handle.await;
        info!("PageVox runtime shutdown complete");
    }
}

/// Wire the reading surface and the narration coordinator together over
/// a fresh bridge and start both.
///
/// `engine_rx` must be the receiving end of the channel the `engine`
/// delivers its callbacks on.
pub fn start<E, H>(
    settings: &Settings,
    document: Arc<Document>,
    engine: E,
    engine_rx: mpsc::Receiver<EngineEvent>,
    sink: H,
    viewport: Box<dyn ViewportControl>,
) -> AppHandle
where
    E: NarratorEngine + 'static,
    H: HighlightSink + Send + 'static,
{
    let (surface, host) = bridge(settings.channel_capacity);
    let (input_tx, input_rx) = mpsc::channel(settings.channel_capacity);

    let controller = ReaderController::new(settings.language.clone(), sink);
    let reader_handle = spawn_reader(
        document,
        controller,
        input_rx,
        surface,
        Duration::from_millis(settings.hover_delay_ms),
    );

    let coordinator = NarrationCoordinator::new(engine, engine_rx, host, viewport);
    let coordinator_handle = tokio::spawn(coordinator.run());

    info!(
        "PageVox runtime started (hover delay {} ms)",
        settings.hover_delay_ms
    );
    AppHandle {
        input_tx,
        reader_handle,
        coordinator_handle,
    }
}
