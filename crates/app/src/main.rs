use pagevox_app::narration::LoggingViewport;
use pagevox_app::reader::LoggingHighlight;
use pagevox_app::{runtime, Settings};
use pagevox_foundation::{AppState, ShutdownHandler, StateManager};
use pagevox_tts::mock::MockNarrator;
use pagevox_tts::{NarratorConfig, NarratorEngine};
use pagevox_tts_espeak::EspeakNarrator;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::writer::MakeWriterExt;

mod demo;

fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    std::fs::create_dir_all("logs")?;
    let file_appender = RollingFileAppender::new(Rotation::DAILY, "logs", "pagevox.log");
    let (non_blocking_file, _guard) = tracing_appender::non_blocking(file_appender);
    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_writer(std::io::stdout.and(non_blocking_file))
        .with_env_filter(log_level)
        .init();
    std::mem::forget(_guard);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging()?;
    tracing::info!("Starting PageVox");

    let settings = Settings::new()?;
    let state_manager = StateManager::new();
    let shutdown = ShutdownHandler::new().install().await;

    state_manager.transition(AppState::Running)?;
    tracing::info!("Application state: {:?}", state_manager.current());

    let (document, stops) = demo::sample_page();
    let document = Arc::new(document);

    // One channel carries every engine callback into the coordinator.
    let (engine_tx, engine_rx) = mpsc::channel(64);

    let narrator_config = NarratorConfig {
        default_voice: None,
        speech_rate: settings.speech_rate,
        volume: settings.volume,
    };
    let espeak = EspeakNarrator::new(narrator_config, engine_tx.clone());
    let engine: Box<dyn NarratorEngine + Sync> =
        if settings.engine == "espeak" && espeak.is_available().await {
            tracing::info!("Using the eSpeak narrator");
            Box::new(espeak)
        } else {
            if settings.engine == "espeak" {
                tracing::warn!("espeak not found, falling back to the mock narrator");
            }
            let (mock, mock_handle) = MockNarrator::new(engine_tx.clone());
            tokio::spawn(demo::drive_mock(mock_handle, settings.speech_rate));
            Box::new(mock)
        };

    let handle = runtime::start(
        &settings,
        Arc::clone(&document),
        engine,
        engine_rx,
        LoggingHighlight::new(Arc::clone(&document)),
        Box::new(LoggingViewport),
    );

    let script = tokio::spawn(demo::pointer_path(handle.input(), stops));

    // --- Main application loop ---
    let mut stats_interval = tokio::time::interval(Duration::from_secs(30));
    loop {
        tokio::select! {
            _ = shutdown.wait() => {
                tracing::info!("Shutdown signal received");
                break;
            }
            _ = stats_interval.tick() => {
                tracing::debug!("Reader running...");
            }
        }
    }

    // --- Graceful shutdown ---
    tracing::info!("Beginning graceful shutdown");
    state_manager.transition(AppState::Stopping)?;

    script.abort();
    let _ = script.await;
    handle.shutdown().await;

    state_manager.transition(AppState::Stopped)?;
    tracing::info!("Shutdown complete");

    Ok(())
}
