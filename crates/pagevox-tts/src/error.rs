//! Error types for narration

use thiserror::Error;

/// Narrator error types
#[derive(Error, Debug)]
pub enum TtsError {
    /// Engine is not available or not installed
    #[error("Narrator engine not available: {0}")]
    EngineNotAvailable(String),

    /// Configuration error (output device, engine options)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Voice not found or not supported
    #[error("Voice not found: {0}")]
    VoiceNotFound(String),

    /// Speak was called before a successful configure
    #[error("Narrator not configured")]
    NotConfigured,

    /// Utterance submission failed
    #[error("Synthesis failed: {0}")]
    Synthesis(String),

    /// IO error (process spawning, pipes)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for narrator operations
pub type TtsResult<T> = Result<T, TtsError>;
