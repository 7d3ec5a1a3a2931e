use thiserror::Error;

/// Errors that can occur during a recording session.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("microphone permission denied")]
    PermissionDenied,

    #[error("no microphone device available")]
    DeviceUnavailable,

    #[error("a capturing session is already active")]
    AlreadyCapturing,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("recorder was never started")]
    NotRecording,

    #[error("encoding failed: {0}")]
    EncodingFailed(String),

    #[error("capture failed: {0}")]
    CaptureFailed(String),

    #[error("voice analysis failed: {0}")]
    AnalysisFailed(String),
}
