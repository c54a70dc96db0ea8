//! Scripted narrator for tests and engine-less environments.
//!
//! `MockNarrator` records everything submitted to it and plays no audio;
//! the paired `MockNarratorHandle` lets a test (or the demo driver) emit
//! progress and completion events on the engine channel at will and
//! inspect what the coordinator asked for.

use crate::engine::{EngineEvent, EngineEventKind, NarratorEngine, SpeechHandle};
use crate::error::{TtsError, TtsResult};
use crate::types::VoiceInfo;
use crate::next_speech_handle;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::mpsc;

#[derive(Default)]
struct MockState {
    configured_languages: Vec<String>,
    spoken: Vec<(SpeechHandle, String)>,
    cancel_count: u32,
}

pub struct MockNarrator {
    state: Arc<Mutex<MockState>>,
    events: mpsc::Sender<EngineEvent>,
    fail_configure: bool,
}

impl MockNarrator {
    pub fn new(events: mpsc::Sender<EngineEvent>) -> (Self, MockNarratorHandle) {
        let state = Arc::new(Mutex::new(MockState::default()));
        let narrator = Self {
            state: Arc::clone(&state),
            events: events.clone(),
            fail_configure: false,
        };
        (narrator, MockNarratorHandle { state, events })
    }

    /// A narrator whose `configure` always fails, for exercising the
    /// engine-unavailable path.
    pub fn failing(events: mpsc::Sender<EngineEvent>) -> (Self, MockNarratorHandle) {
        let (mut narrator, handle) = Self::new(events);
        narrator.fail_configure = true;
        (narrator, handle)
    }
}

#[async_trait]
impl NarratorEngine for MockNarrator {
    fn name(&self) -> &str {
        "mock"
    }

    async fn is_available(&self) -> bool {
        true
    }

    async fn configure(&mut self, language: &str) -> TtsResult<VoiceInfo> {
        if self.fail_configure {
            return Err(TtsError::EngineNotAvailable("mock configured to fail".into()));
        }
        self.state.lock().configured_languages.push(language.to_string());
        Ok(VoiceInfo {
            id: format!("mock-{language}"),
            name: format!("Mock Voice ({language})"),
            language: language.to_string(),
        })
    }

    async fn speak(&mut self, text: &str) -> TtsResult<SpeechHandle> {
        let handle = next_speech_handle();
        self.state.lock().spoken.push((handle, text.to_string()));
        Ok(handle)
    }

    async fn cancel_all(&mut self) -> TtsResult<()> {
        self.state.lock().cancel_count += 1;
        Ok(())
    }
}

/// Test-side view of a [`MockNarrator`] that has been moved into a
/// coordinator.
#[derive(Clone)]
pub struct MockNarratorHandle {
    state: Arc<Mutex<MockState>>,
    events: mpsc::Sender<EngineEvent>,
}

impl MockNarratorHandle {
    pub fn spoken(&self) -> Vec<(SpeechHandle, String)> {
        self.state.lock().spoken.clone()
    }

    pub fn spoken_texts(&self) -> Vec<String> {
        self.state.lock().spoken.iter().map(|(_, t)| t.clone()).collect()
    }

    pub fn handle_for(&self, text: &str) -> Option<SpeechHandle> {
        self.state
            .lock()
            .spoken
            .iter()
            .find(|(_, t)| t == text)
            .map(|(h, _)| *h)
    }

    pub fn cancel_count(&self) -> u32 {
        self.state.lock().cancel_count
    }

    pub fn configured_languages(&self) -> Vec<String> {
        self.state.lock().configured_languages.clone()
    }

    pub async fn progress(&self, handle: SpeechHandle, position: u32, count: u32) {
        let _ = self
            .events
            .send(EngineEvent {
                handle,
                kind: EngineEventKind::Progress { position, count },
            })
            .await;
    }

    pub async fn complete(&self, handle: SpeechHandle) {
        let _ = self
            .events
            .send(EngineEvent {
                handle,
                kind: EngineEventKind::Completed,
            })
            .await;
    }
}
