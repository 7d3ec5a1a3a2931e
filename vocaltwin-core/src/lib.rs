//! # vocaltwin-core
//!
//! Platform-agnostic core of the "find your vocal twin" recording flow:
//! microphone session orchestration, live clarity/stability metrics, an
//! in-memory WAV sink, and the analysis-submission client.
//!
//! Platform backends implement the `CaptureProvider` trait (see the
//! `vocaltwin-capture` crate for the cpal microphone) and plug into the
//! generic `SessionController`.
//!
//! ## Architecture
//!
//! ```text
//! vocaltwin-core (this crate)
//! ├── traits/       ← CaptureProvider, SessionDelegate, AnalysisBackend
//! ├── models/       ← SessionError, RecordingState, SessionConfig, FrameMetrics, AnalysisReport
//! ├── processing/   ← SampleTap, Spectrum (256-point transform), resampling math
//! ├── session/      ← CaptureSession, RecordingSink, LiveAnalyzer, VisualDriver, SessionController
//! └── analysis/     ← HttpAnalysisClient, fallback report synthesis
//! ```
//!
//! Data flows one way from the microphone into both the sink and the
//! analyzer; the visual driver reads only from the analyzer; the controller
//! starts and stops everything and owns the countdown.

pub mod analysis;
pub mod models;
pub mod processing;
pub mod session;
pub mod traits;

// Re-export key types at crate root for convenience.
pub use analysis::client::HttpAnalysisClient;
pub use models::analysis::{AnalysisReport, MatchedSinger, RadarPoint, ReportOrigin};
pub use models::audio::{AudioEncoding, EncodedAudio, MicrophoneInfo, SampleSpec};
pub use models::config::SessionConfig;
pub use models::error::SessionError;
pub use models::metrics::{Clarity, FrameMetrics};
pub use models::state::RecordingState;
pub use session::analyzer::LiveAnalyzer;
pub use session::capture::CaptureSession;
pub use session::controller::SessionController;
pub use session::sink::RecordingSink;
pub use session::visual::{VisualDriver, VisualFrame};
pub use traits::analysis_backend::AnalysisBackend;
pub use traits::capture_provider::{AudioBufferCallback, CaptureConstraints, CaptureProvider};
pub use traits::session_delegate::SessionDelegate;
