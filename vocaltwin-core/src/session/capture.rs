use crate::models::audio::MicrophoneInfo;
use crate::models::error::SessionError;
use crate::traits::capture_provider::{AudioBufferCallback, CaptureConstraints, CaptureProvider};

/// One open microphone lease.
///
/// At most one lease is open per recording attempt, and it must be closed on
/// every exit path (manual stop, timeout, user close) before the session is
/// considered terminated.
pub struct CaptureSession {
    provider: Box<dyn CaptureProvider>,
    open: bool,
}

impl CaptureSession {
    pub fn new(provider: Box<dyn CaptureProvider>) -> Self {
        Self {
            provider,
            open: false,
        }
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn device_info(&self) -> MicrophoneInfo {
        self.provider.device_info()
    }

    /// Acquire the microphone and begin delivering buffers to `callback`.
    ///
    /// Fails with `PermissionDenied`/`DeviceUnavailable` when the platform
    /// refuses; the lease stays closed and the caller aborts the attempt.
    pub fn open(
        &mut self,
        constraints: &CaptureConstraints,
        callback: AudioBufferCallback,
    ) -> Result<(), SessionError> {
        if self.open {
            return Err(SessionError::AlreadyCapturing);
        }
        if !self.provider.is_available() {
            return Err(SessionError::DeviceUnavailable);
        }

        self.provider.start(constraints, callback)?;
        self.open = true;
        log::info!("microphone lease opened: {}", self.provider.device_info().name);
        Ok(())
    }

    /// Release the microphone. Idempotent: double-close and never-opened are
    /// silently ignored, and backend stop failures are logged, not raised.
    pub fn close(&mut self) {
        if !self.open {
            return;
        }
        self.open = false;
        if let Err(e) = self.provider.stop() {
            log::warn!("error while releasing microphone: {}", e);
        }
        log::info!("microphone lease closed");
    }
}
