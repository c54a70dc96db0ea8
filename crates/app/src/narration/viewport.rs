//! Page-view capability consumed by zoom commands.

/// The host shell owns the rendered view; the coordinator only asks it
/// to scale.
pub trait ViewportControl: Send {
    /// Scale the rendered page; 1.0 is unscaled.
    fn set_zoom(&mut self, factor: f64);
}

/// Default viewport for running without a shell: the action is recorded
/// in the log and nothing else happens.
pub struct LoggingViewport;

impl ViewportControl for LoggingViewport {
    fn set_zoom(&mut self, factor: f64) {
        tracing::info!("Page zoom set to {:.0}%", factor * 100.0);
    }
}
