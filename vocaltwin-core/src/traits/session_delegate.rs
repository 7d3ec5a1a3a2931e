use crate::models::analysis::AnalysisReport;
use crate::models::error::SessionError;
use crate::models::metrics::FrameMetrics;
use crate::models::state::RecordingState;
use crate::session::visual::VisualFrame;

/// Event delegate for recording session notifications.
///
/// All methods are called from the session driver task, not the UI thread.
/// Implementations should marshal to the UI thread if needed.
pub trait SessionDelegate: Send + Sync {
    /// Called when the session state changes.
    fn on_state_changed(&self, state: &RecordingState);

    /// Called once per frame while capturing, with the metric sample and the
    /// visual state derived from it. Frame N's visuals always reflect frame
    /// N's metrics, never a stale or future sample.
    fn on_frame(&self, metrics: &FrameMetrics, visual: &VisualFrame);

    /// Called once per second with the elapsed countdown.
    fn on_tick(&self, elapsed_secs: u32);

    /// Called when an error occurs during the session.
    fn on_error(&self, error: &SessionError);

    /// Called exactly once per session with the analysis outcome, real or
    /// fallback (check `report.origin`).
    fn on_result(&self, report: &AnalysisReport);
}
