use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::Path;
use tracing;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Language tag requested from the narrator.
    pub language: String,
    /// Milliseconds the pointer must rest over a block before narration
    /// starts.
    pub hover_delay_ms: u64,
    /// Speaking rate in words per minute.
    pub speech_rate: u32,
    /// Output volume, 0.0..=1.0.
    pub volume: f32,
    /// Narrator engine: "espeak" or "mock".
    pub engine: String,
    /// Bounded capacity of the bridge and input channels.
    pub channel_capacity: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            language: "en".to_string(),
            hover_delay_ms: 500,
            speech_rate: 180,
            volume: 0.8,
            engine: "espeak".to_string(),
            channel_capacity: 64,
        }
    }
}

impl Settings {
    /// Load settings from a specific config file path (for tests)
    pub fn from_path(config_path: impl AsRef<Path>) -> Result<Self, String> {
        let mut builder = Config::builder();

        builder = Self::with_defaults(builder);
        builder = builder.add_source(File::from(config_path.as_ref()).required(true));
        builder = builder.add_source(
            Environment::with_prefix("PAGEVOX").separator("__"),
        );

        let config = builder
            .build()
            .map_err(|e| format!("Failed to build config: {}", e))?;
        let mut settings: Settings = config
            .try_deserialize()
            .map_err(|e| format!("Failed to deserialize settings: {}", e))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn new() -> Result<Self, String> {
        let mut builder = Config::builder();

        builder = Self::with_defaults(builder);

        let config_path = Path::new("config/default.toml");
        if config_path.exists() {
            tracing::info!("Loading configuration from: {}", config_path.display());
            builder = builder.add_source(File::from(config_path).required(true));
        } else {
            tracing::warn!(
                "No configuration file at 'config/default.toml'. Using defaults and environment variables."
            );
        }

        builder = builder.add_source(
            Environment::with_prefix("PAGEVOX").separator("__"),
        );

        let config = builder
            .build()
            .map_err(|e| format!("Failed to build config: {}", e))?;
        let mut settings: Settings = config
            .try_deserialize()
            .map_err(|e| format!("Failed to deserialize settings: {}", e))?;
        settings.validate()?;
        Ok(settings)
    }

    fn with_defaults(builder: config::ConfigBuilder<config::builder::DefaultState>) -> config::ConfigBuilder<config::builder::DefaultState> {
        let defaults = Settings::default();
        builder
            .set_default("language", defaults.language).unwrap()
            .set_default("hover_delay_ms", defaults.hover_delay_ms).unwrap()
            .set_default("speech_rate", defaults.speech_rate as u64).unwrap()
            .set_default("volume", defaults.volume as f64).unwrap()
            .set_default("engine", defaults.engine).unwrap()
            .set_default("channel_capacity", defaults.channel_capacity as u64).unwrap()
    }

    pub fn validate(&mut self) -> Result<(), String> {
        let mut errors = Vec::new();

        if self.hover_delay_ms == 0 {
            errors.push("hover_delay_ms must be >0".to_string());
        }
        if self.channel_capacity == 0 {
            errors.push("channel_capacity must be >0".to_string());
        }
        if self.language.trim().is_empty() {
            errors.push("language must not be empty".to_string());
        }

        if !["espeak", "mock"].contains(&self.engine.to_lowercase().as_str()) {
            tracing::warn!("Invalid engine '{}'. Defaulting to 'espeak'.", self.engine);
            self.engine = "espeak".to_string();
        }
        if !(80..=450).contains(&self.speech_rate) {
            tracing::warn!("Speech rate {} out of range. Clamping to 80..=450.", self.speech_rate);
            self.speech_rate = self.speech_rate.clamp(80, 450);
        }
        if !(0.0..=1.0).contains(&self.volume) {
            tracing::warn!("Volume {} out of range. Clamping to 0.0..=1.0.", self.volume);
            self.volume = self.volume.clamp(0.0, 1.0);
        }

        if !errors.is_empty() {
            return Err(format!("Critical config validation errors: {:?}", errors));
        }
        Ok(())
    }
}

pub mod bridge;
pub mod narration;
pub mod reader;
pub mod runtime;

#[cfg(test)]
pub mod test_utils;
