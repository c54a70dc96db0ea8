//! Narrator engine abstraction and engine events

use crate::error::TtsResult;
use crate::types::VoiceInfo;
use async_trait::async_trait;

/// Opaque reference to one submitted utterance.
///
/// Minted by [`crate::next_speech_handle`]; the numeric value has no
/// meaning outside equality and ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SpeechHandle(pub(crate) u64);

impl std::fmt::Display for SpeechHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "speech#{}", self.0)
    }
}

/// Callback events produced by an engine while narrating.
///
/// Per handle the contract is: zero or more `Progress` events in
/// ascending position order, then exactly one `Completed` — unless the
/// utterance is cancelled, in which case nothing further is delivered.
#[derive(Debug, Clone)]
pub struct EngineEvent {
    pub handle: SpeechHandle,
    pub kind: EngineEventKind,
}

#[derive(Debug, Clone)]
pub enum EngineEventKind {
    /// `count` characters starting at `position` of the submitted text
    /// are currently being vocalized.
    Progress { position: u32, count: u32 },
    /// The utterance finished playing (or failed mid-stream; a failed
    /// utterance is retired like a finished one, never retried).
    Completed,
}

/// Core narrator interface
///
/// Implementations drive a specific speech engine (espeak, a mock, ...).
/// Engines receive an `mpsc::Sender<EngineEvent>` at construction and
/// deliver all callbacks through it, so the coordinator observes them on
/// its own loop regardless of which thread the engine uses internally.
#[async_trait]
pub trait NarratorEngine: Send {
    /// Engine name/identifier.
    fn name(&self) -> &str;

    /// Whether the underlying engine can run on this system.
    async fn is_available(&self) -> bool;

    /// Bind the output device and select a voice for the given language
    /// tag, falling back to the engine default when no match exists.
    /// Errors are fatal to the initialize request that triggered them.
    /// May be called again at any time to reconfigure; reconfiguration is
    /// not queued behind pending speech.
    async fn configure(&mut self, language: &str) -> TtsResult<VoiceInfo>;

    /// Enqueue one utterance. The engine serializes submissions into a
    /// single audio stream played in submission order.
    async fn speak(&mut self, text: &str) -> TtsResult<SpeechHandle>;

    /// Abandon all queued and in-flight speech immediately. Silent: no
    /// events are delivered for abandoned utterances.
    async fn cancel_all(&mut self) -> TtsResult<()>;
}

#[async_trait]
impl<T: NarratorEngine + ?Sized + Sync> NarratorEngine for Box<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    async fn is_available(&self) -> bool {
        (**self).is_available().await
    }

    async fn configure(&mut self, language: &str) -> TtsResult<VoiceInfo> {
        (**self).configure(language).await
    }

    async fn speak(&mut self, text: &str) -> TtsResult<SpeechHandle> {
        (**self).speak(text).await
    }

    async fn cancel_all(&mut self) -> TtsResult<()> {
        (**self).cancel_all().await
    }
}
