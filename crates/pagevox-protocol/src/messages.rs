//! Named messages carried by the bridge, one enum per direction.

use serde::{Deserialize, Serialize};

/// Commands flowing surface -> host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name")]
pub enum SurfaceCommand {
    /// (Re)configure the narrator voice for the given language tag.
    #[serde(rename = "ttsInitialize")]
    Initialize { language: String },

    /// Enqueue one text fragment for narration, correlated by `id`.
    #[serde(rename = "ttsSpeak")]
    Speak { id: u64, text: String },

    /// Abandon all queued and in-flight speech. Silent: no completion or
    /// progress events follow for the cancelled fragments.
    #[serde(rename = "ttsSpeakCancelAll")]
    SpeakCancelAll,

    /// Set the page zoom, in percent (100 = unscaled).
    #[serde(rename = "zoom")]
    Zoom { factor: f64 },
}

/// Events flowing host -> surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name")]
pub enum HostEvent {
    /// Voice configuration completed; carries the resolved voice's
    /// display name.
    #[serde(rename = "ttsInitialized")]
    Initialized { voice: String },

    /// The narrator is currently vocalizing `count` characters starting
    /// at `position` within fragment `id`.
    #[serde(rename = "ttsSpeakProgress")]
    SpeakProgress { id: u64, position: u32, count: u32 },

    /// Fragment `id` finished narrating. Never emitted for cancelled
    /// fragments.
    #[serde(rename = "ttsSpeakComplete")]
    SpeakComplete { id: u64 },
}
