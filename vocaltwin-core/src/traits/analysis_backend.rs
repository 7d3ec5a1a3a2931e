use async_trait::async_trait;

use crate::models::analysis::AnalysisReport;
use crate::models::audio::EncodedAudio;
use crate::models::error::SessionError;

/// Port to the remote voice-analysis service.
///
/// The production implementation is `analysis::client::HttpAnalysisClient`;
/// tests substitute scripted backends.
#[async_trait]
pub trait AnalysisBackend: Send + Sync {
    /// Submit a finalized recording for analysis.
    ///
    /// `filename` carries the extension matching `audio.encoding`, e.g.
    /// `recording_1712345678901.wav`. Server-side feature extraction is
    /// CPU-bound, so implementations use a generous timeout.
    async fn analyze(
        &self,
        audio: EncodedAudio,
        filename: &str,
    ) -> Result<AnalysisReport, SessionError>;
}
