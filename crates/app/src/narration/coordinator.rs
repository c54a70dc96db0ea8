//! Narration coordinator.
//!
//! Executes speak requests against the narrator engine in arrival order
//! and translates engine callbacks into outbound progress/completion
//! events. Bridge commands and engine events share one select loop, so
//! everything is handled sequentially no matter which thread the engine
//! runs its callbacks on.

use crate::bridge::HostEndpoint;
use crate::narration::viewport::ViewportControl;
use pagevox_protocol::{HostEvent, SurfaceCommand};
use pagevox_tts::{EngineEvent, EngineEventKind, NarratorEngine, SpeechHandle};
use std::collections::HashMap;
use tokio::sync::mpsc;
use tracing::{debug, error, trace, warn};

enum Pumped {
    Command(SurfaceCommand),
    Engine(EngineEvent),
    Closed,
}

pub struct NarrationCoordinator<E: NarratorEngine> {
    engine: E,
    engine_rx: mpsc::Receiver<EngineEvent>,
    bridge: HostEndpoint,
    viewport: Box<dyn ViewportControl>,
    /// Maps the engine's speech handle to the originating fragment id.
    /// At most one entry per id: a fragment is never queued twice.
    prompts: HashMap<SpeechHandle, u64>,
    configured: bool,
}

impl<E: NarratorEngine> NarrationCoordinator<E> {
    pub fn new(
        engine: E,
        engine_rx: mpsc::Receiver<EngineEvent>,
        bridge: HostEndpoint,
        viewport: Box<dyn ViewportControl>,
    ) -> Self {
        Self {
            engine,
            engine_rx,
            bridge,
            viewport,
            prompts: HashMap::new(),
            configured: false,
        }
    }

    pub async fn run(mut self) {
        loop {
            let pumped = tokio::select! {
                maybe = self.bridge.commands.recv() => {
                    maybe.map_or(Pumped::Closed, Pumped::Command)
                }
                maybe = self.engine_rx.recv() => {
                    maybe.map_or(Pumped::Closed, Pumped::Engine)
                }
            };
            match pumped {
                Pumped::Command(command) => self.handle_command(command).await,
                Pumped::Engine(event) => self.handle_engine_event(event).await,
                Pumped::Closed => break,
            }
        }
        debug!("Coordinator finished");
    }

    async fn handle_command(&mut self, command: SurfaceCommand) {
        match command {
            SurfaceCommand::Initialize { language } => {
                match self.engine.configure(&language).await {
                    Ok(voice) => {
                        debug!("Narrator configured: {} for {:?}", voice.name, language);
                        self.configured = true;
                        let _ = self
                            .bridge
                            .events
                            .send(&HostEvent::Initialized { voice: voice.name })
                            .await;
                    }
                    Err(e) => {
                        // Fatal to this initialize request; narration
                        // stays inert until a later one succeeds.
                        error!("Narrator initialization failed: {}", e);
                    }
                }
            }
            SurfaceCommand::Speak { id, text } => {
                if !self.configured {
                    warn!("Dropping speak for fragment {}: narrator not initialized", id);
                    return;
                }
                if self.prompts.values().any(|&queued| queued == id) {
                    warn!("Fragment {} is already queued, dropping duplicate", id);
                    return;
                }
                match self.engine.speak(&text).await {
                    Ok(handle) => {
                        trace!("Fragment {} queued as {}", id, handle);
                        self.prompts.insert(handle, id);
                    }
                    Err(e) => {
                        // Not retried; re-hovering re-triggers narration.
                        error!("Failed to queue fragment {}: {}", id, e);
                    }
                }
            }
            SurfaceCommand::SpeakCancelAll => {
                if let Err(e) = self.engine.cancel_all().await {
                    warn!("Cancel-all failed: {}", e);
                }
                // Cancellation is silent: dropping the mappings ensures
                // no event for these fragments ever goes out, even if
                // the engine still reports something.
                self.prompts.clear();
                debug!("All narration cancelled");
            }
            SurfaceCommand::Zoom { factor } => {
                self.viewport.set_zoom(factor / 100.0);
            }
        }
    }

    async fn handle_engine_event(&mut self, event: EngineEvent) {
        match event.kind {
            EngineEventKind::Progress { position, count } => {
                let Some(&id) = self.prompts.get(&event.handle) else {
                    trace!("Progress for retired {}", event.handle);
                    return;
                };
                let _ = self
                    .bridge
                    .events
                    .send(&HostEvent::SpeakProgress { id, position, count })
                    .await;
            }
            EngineEventKind::Completed => {
                let Some(id) = self.prompts.remove(&event.handle) else {
                    trace!("Completion for retired {}", event.handle);
                    return;
                };
                let _ = self.bridge.events.send(&HostEvent::SpeakComplete { id }).await;
            }
        }
    }
}
