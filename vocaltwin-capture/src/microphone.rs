use std::sync::mpsc;
use std::thread;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, SampleFormat, SampleRate, SizedSample, Stream, StreamConfig};

use vocaltwin_core::models::audio::MicrophoneInfo;
use vocaltwin_core::models::error::SessionError;
use vocaltwin_core::traits::capture_provider::{
    AudioBufferCallback, CaptureConstraints, CaptureProvider,
};

/// Default-input microphone backend built on cpal.
///
/// cpal streams are not `Send`, so each capture runs on a dedicated thread
/// that owns the stream for its whole lifetime; `stop()` signals that thread
/// and joins it. Startup errors are reported back synchronously so
/// `PermissionDenied`/`DeviceUnavailable` surface from `start()` itself.
pub struct CpalMicrophone {
    worker: Option<Worker>,
}

struct Worker {
    stop_tx: mpsc::Sender<()>,
    handle: thread::JoinHandle<()>,
}

impl CpalMicrophone {
    pub fn new() -> Self {
        Self { worker: None }
    }
}

impl Default for CpalMicrophone {
    fn default() -> Self {
        Self::new()
    }
}

impl CaptureProvider for CpalMicrophone {
    fn is_available(&self) -> bool {
        cpal::default_host().default_input_device().is_some()
    }

    fn start(
        &mut self,
        constraints: &CaptureConstraints,
        callback: AudioBufferCallback,
    ) -> Result<(), SessionError> {
        if self.worker.is_some() {
            return Err(SessionError::AlreadyCapturing);
        }

        let constraints = *constraints;
        let (ready_tx, ready_rx) = mpsc::channel();
        let (stop_tx, stop_rx) = mpsc::channel();

        let handle = thread::Builder::new()
            .name("mic-capture".into())
            .spawn(move || match build_and_play(&constraints, callback) {
                Ok(stream) => {
                    let _ = ready_tx.send(Ok(()));
                    // The stream is !Send; it lives and dies on this thread.
                    let _ = stop_rx.recv();
                    drop(stream);
                    log::debug!("microphone stream released");
                }
                Err(e) => {
                    let _ = ready_tx.send(Err(e));
                }
            })
            .map_err(|e| SessionError::CaptureFailed(e.to_string()))?;

        match ready_rx.recv() {
            Ok(Ok(())) => {
                self.worker = Some(Worker { stop_tx, handle });
                Ok(())
            }
            Ok(Err(e)) => {
                let _ = handle.join();
                Err(e)
            }
            Err(_) => {
                let _ = handle.join();
                Err(SessionError::CaptureFailed(
                    "capture thread exited before starting".into(),
                ))
            }
        }
    }

    fn stop(&mut self) -> Result<(), SessionError> {
        if let Some(worker) = self.worker.take() {
            let _ = worker.stop_tx.send(());
            if worker.handle.join().is_err() {
                return Err(SessionError::CaptureFailed(
                    "capture thread panicked".into(),
                ));
            }
        }
        Ok(())
    }

    fn device_info(&self) -> MicrophoneInfo {
        let name = cpal::default_host()
            .default_input_device()
            .and_then(|d| d.name().ok())
            .unwrap_or_else(|| "unknown".to_string());
        MicrophoneInfo {
            id: name.clone(),
            name,
            is_default: true,
        }
    }
}

fn build_and_play(
    constraints: &CaptureConstraints,
    callback: AudioBufferCallback,
) -> Result<Stream, SessionError> {
    let host = cpal::default_host();
    let device = host
        .default_input_device()
        .ok_or(SessionError::DeviceUnavailable)?;

    log::info!(
        "using microphone: {}",
        device.name().unwrap_or_else(|_| "unknown".into())
    );

    let supported = device
        .default_input_config()
        .map_err(|_| SessionError::DeviceUnavailable)?;
    let sample_format = supported.sample_format();
    let mut config: StreamConfig = supported.into();

    // Prefer the requested rate when the device supports it; otherwise the
    // core resamples from whatever rate we report.
    if let Ok(mut ranges) = device.supported_input_configs() {
        let wanted = constraints.sample_rate;
        if ranges.any(|r| {
            r.sample_format() == sample_format
                && r.min_sample_rate().0 <= wanted
                && wanted <= r.max_sample_rate().0
        }) {
            config.sample_rate = SampleRate(wanted);
        }
    }

    if constraints.echo_cancellation || constraints.noise_suppression {
        // cpal exposes no toggle for these; whatever processing the OS input
        // chain applies is what the stream gets.
        log::debug!("echo cancellation/noise suppression requested; relying on OS input processing");
    }

    log::info!(
        "microphone config: {} Hz, {} ch, {:?}",
        config.sample_rate.0,
        config.channels,
        sample_format
    );

    let stream = match sample_format {
        SampleFormat::F32 => build_stream::<f32>(&device, &config, callback),
        SampleFormat::I16 => build_stream::<i16>(&device, &config, callback),
        SampleFormat::U16 => build_stream::<u16>(&device, &config, callback),
        other => Err(SessionError::CaptureFailed(format!(
            "unsupported sample format: {:?}",
            other
        ))),
    }?;

    stream
        .play()
        .map_err(|e| SessionError::CaptureFailed(e.to_string()))?;
    Ok(stream)
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &StreamConfig,
    callback: AudioBufferCallback,
) -> Result<Stream, SessionError>
where
    T: SizedSample,
    f32: FromSample<T>,
{
    let sample_rate = config.sample_rate.0 as f64;
    let channels = config.channels;
    let err_fn = |err| log::error!("microphone stream error: {}", err);

    device
        .build_input_stream(
            config,
            move |data: &[T], _: &cpal::InputCallbackInfo| {
                let samples: Vec<f32> = data.iter().map(|&s| f32::from_sample(s)).collect();
                callback(&samples, sample_rate, channels);
            },
            err_fn,
            None,
        )
        .map_err(map_build_error)
}

fn map_build_error(err: cpal::BuildStreamError) -> SessionError {
    match err {
        cpal::BuildStreamError::DeviceNotAvailable => SessionError::DeviceUnavailable,
        cpal::BuildStreamError::BackendSpecific { err } => classify_backend_message(&err.description),
        other => SessionError::CaptureFailed(other.to_string()),
    }
}

/// Backends report permission problems as free-form messages; sniff for the
/// usual wording so the UI can show the right hint.
fn classify_backend_message(message: &str) -> SessionError {
    let lower = message.to_lowercase();
    if lower.contains("permission") || lower.contains("denied") || lower.contains("not allowed") {
        SessionError::PermissionDenied
    } else {
        SessionError::CaptureFailed(message.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permission_wording_maps_to_permission_denied() {
        assert_eq!(
            classify_backend_message("Access denied by the user"),
            SessionError::PermissionDenied
        );
        assert_eq!(
            classify_backend_message("operation not allowed"),
            SessionError::PermissionDenied
        );
    }

    #[test]
    fn other_backend_errors_stay_capture_failures() {
        assert_eq!(
            classify_backend_message("device busy"),
            SessionError::CaptureFailed("device busy".into())
        );
    }

    #[test]
    fn stop_without_start_is_harmless() {
        let mut mic = CpalMicrophone::new();
        assert!(mic.stop().is_ok());
    }
}
