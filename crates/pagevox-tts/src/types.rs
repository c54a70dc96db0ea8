//! Core types for narrator configuration

use serde::{Deserialize, Serialize};

/// Narrator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NarratorConfig {
    /// Voice to fall back to when no language match exists.
    pub default_voice: Option<String>,
    /// Speaking rate (words per minute, typically 100-300).
    pub speech_rate: u32,
    /// Volume (0.0-1.0).
    pub volume: f32,
}

impl Default for NarratorConfig {
    fn default() -> Self {
        Self {
            default_voice: None,
            speech_rate: 180,
            volume: 0.8,
        }
    }
}

/// Voice information
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceInfo {
    /// Engine-specific voice identifier.
    pub id: String,
    /// Human-readable voice name, shown next to the reader toggle.
    pub name: String,
    /// Language code (e.g., "en-US", "de").
    pub language: String,
}
