use std::sync::Arc;

use crate::models::audio::MicrophoneInfo;
use crate::models::error::SessionError;

/// Callback invoked when an audio buffer is available.
///
/// Parameters:
/// - `samples`: interleaved f32 samples.
/// - `sample_rate`: the actual sample rate of the delivered audio.
/// - `channels`: number of channels (1 = mono, 2 = stereo interleaved).
///
/// The callback fires on a dedicated audio thread; keep processing minimal.
pub type AudioBufferCallback = Arc<dyn Fn(&[f32], f64, u16) + Send + Sync + 'static>;

/// Constraints requested when acquiring the microphone.
///
/// Echo cancellation and noise suppression are requests, not guarantees.
/// Backends that cannot honor them must still deliver audio and log the gap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureConstraints {
    pub sample_rate: u32,
    pub echo_cancellation: bool,
    pub noise_suppression: bool,
}

/// Interface for platform-specific microphone capture backends.
///
/// Implemented by `CpalMicrophone` in `vocaltwin-capture`; tests plug in
/// scripted providers.
pub trait CaptureProvider: Send + Sync {
    /// Whether a capture device is currently available.
    fn is_available(&self) -> bool;

    /// Acquire the microphone and start delivering buffers via `callback`.
    ///
    /// Fails with `PermissionDenied` or `DeviceUnavailable` when the platform
    /// refuses or lacks a microphone. While capturing, the OS shows its
    /// microphone-in-use indicator; that is an external effect this layer
    /// never attempts to suppress.
    fn start(
        &mut self,
        constraints: &CaptureConstraints,
        callback: AudioBufferCallback,
    ) -> Result<(), SessionError>;

    /// Stop capturing and release the device.
    fn stop(&mut self) -> Result<(), SessionError>;

    /// Information about the device backing this provider.
    fn device_info(&self) -> MicrophoneInfo;
}
