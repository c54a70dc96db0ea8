use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Bridge error: {0}")]
    Bridge(#[from] BridgeError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Narration error: {0}")]
    Narration(String),

    #[error("Shutdown requested")]
    ShutdownRequested,

    #[error("Fatal error, cannot recover: {0}")]
    Fatal(String),

    #[error("Transient error, will retry: {0}")]
    Transient(String),
}

/// Errors on the surface/host message channel.
#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Channel closed: {direction}")]
    ChannelClosed { direction: &'static str },

    #[error("Send timed out after {timeout:?}")]
    SendTimeout { timeout: Duration },
}

#[derive(Debug, Clone)]
pub enum RecoveryStrategy {
    Retry { max_attempts: u32, delay: Duration },
    Ignore,
    Restart,
    Fatal,
}

impl AppError {
    pub fn recovery_strategy(&self) -> RecoveryStrategy {
        match self {
            // A closed bridge means the peer task is gone; only a restart
            // re-establishes both endpoints.
            AppError::Bridge(BridgeError::ChannelClosed { .. }) => RecoveryStrategy::Restart,
            AppError::Bridge(BridgeError::SendTimeout { .. }) => RecoveryStrategy::Retry {
                max_attempts: 3,
                delay: Duration::from_millis(200),
            },
            // The user gesture (re-hover, re-toggle) is the retry mechanism
            // for narration problems.
            AppError::Narration(_) => RecoveryStrategy::Ignore,
            AppError::Transient(_) => RecoveryStrategy::Retry {
                max_attempts: 5,
                delay: Duration::from_secs(1),
            },
            AppError::Fatal(_) | AppError::ShutdownRequested => RecoveryStrategy::Fatal,
            AppError::Config(_) => RecoveryStrategy::Fatal,
        }
    }
}
