//! Narrator abstraction layer for PageVox
//!
//! This crate provides the types and traits for driving an external
//! speech engine: the `NarratorEngine` trait, opaque speech handles, and
//! the engine events (progress, completion) that flow back from whatever
//! thread the engine runs on into the coordinator's single loop.

use std::sync::atomic::{AtomicU64, Ordering};

pub mod engine;
pub mod error;
pub mod mock;
pub mod types;

pub use engine::{EngineEvent, EngineEventKind, NarratorEngine, SpeechHandle};
pub use error::{TtsError, TtsResult};
pub use types::{NarratorConfig, VoiceInfo};

/// Generates unique speech handles
static SPEECH_HANDLE_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Mint a new process-wide unique speech handle.
///
/// Handles identify one submitted utterance for its whole lifetime; they
/// are never reused, so a handle that has been retired (completed or
/// cancelled) can be recognized as stale forever after.
pub fn next_speech_handle() -> SpeechHandle {
    SpeechHandle(SPEECH_HANDLE_COUNTER.fetch_add(1, Ordering::SeqCst))
}
