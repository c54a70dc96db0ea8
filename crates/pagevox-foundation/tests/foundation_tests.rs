//! Foundation crate tests
//!
//! Tests cover:
//! - Lifecycle state machine (valid and rejected transitions, subscription)
//! - Error types (display formatting, recovery strategy mapping)

use pagevox_foundation::error::{AppError, BridgeError, RecoveryStrategy};
use pagevox_foundation::state::{AppState, StateManager};
use std::time::Duration;

// ─── StateManager Tests ─────────────────────────────────────────────

#[test]
fn state_manager_starts_booting() {
    let mgr = StateManager::new();
    assert_eq!(mgr.current(), AppState::Booting);
}

#[test]
fn state_manager_full_lifecycle() {
    let mgr = StateManager::new();
    mgr.transition(AppState::Running).unwrap();
    mgr.transition(AppState::Stopping).unwrap();
    mgr.transition(AppState::Stopped).unwrap();
    assert_eq!(mgr.current(), AppState::Stopped);
}

#[test]
fn state_manager_degraded_excursion() {
    let mgr = StateManager::new();
    mgr.transition(AppState::Running).unwrap();
    mgr.transition(AppState::Degraded {
        reason: "narrator unavailable".into(),
    })
    .unwrap();
    mgr.transition(AppState::Running).unwrap();
    assert_eq!(mgr.current(), AppState::Running);
}

#[test]
fn state_manager_rejects_skipping_boot() {
    let mgr = StateManager::new();
    let err = mgr.transition(AppState::Stopping).unwrap_err();
    assert!(matches!(err, AppError::Fatal(_)));
    // State is unchanged after a rejected transition.
    assert_eq!(mgr.current(), AppState::Booting);
}

#[test]
fn state_manager_rejects_restart_after_stop() {
    let mgr = StateManager::new();
    mgr.transition(AppState::Running).unwrap();
    mgr.transition(AppState::Stopping).unwrap();
    mgr.transition(AppState::Stopped).unwrap();
    assert!(mgr.transition(AppState::Running).is_err());
}

#[test]
fn state_manager_publishes_transitions() {
    let mgr = StateManager::new();
    let rx = mgr.subscribe();
    mgr.transition(AppState::Running).unwrap();
    mgr.transition(AppState::Stopping).unwrap();
    assert_eq!(rx.try_recv().unwrap(), AppState::Running);
    assert_eq!(rx.try_recv().unwrap(), AppState::Stopping);
}

// ─── Error Type Tests ───────────────────────────────────────────────

#[test]
fn bridge_error_channel_closed_display() {
    let err = AppError::Bridge(BridgeError::ChannelClosed { direction: "surface->host" });
    let msg = format!("{}", err);
    assert!(msg.contains("surface->host"));
}

#[test]
fn bridge_error_send_timeout_display() {
    let err = BridgeError::SendTimeout {
        timeout: Duration::from_millis(250),
    };
    assert!(format!("{}", err).contains("250ms"));
}

#[test]
fn narration_errors_are_ignored() {
    let err = AppError::Narration("voice not found".into());
    assert!(matches!(err.recovery_strategy(), RecoveryStrategy::Ignore));
}

#[test]
fn closed_bridge_requires_restart() {
    let err = AppError::Bridge(BridgeError::ChannelClosed { direction: "host->surface" });
    assert!(matches!(err.recovery_strategy(), RecoveryStrategy::Restart));
}

#[test]
fn fatal_and_shutdown_are_fatal() {
    assert!(matches!(
        AppError::Fatal("boom".into()).recovery_strategy(),
        RecoveryStrategy::Fatal
    ));
    assert!(matches!(
        AppError::ShutdownRequested.recovery_strategy(),
        RecoveryStrategy::Fatal
    ));
}

#[test]
fn transient_errors_retry() {
    match AppError::Transient("hiccup".into()).recovery_strategy() {
        RecoveryStrategy::Retry { max_attempts, .. } => assert!(max_attempts > 0),
        other => panic!("expected retry, got {:?}", other),
    }
}
