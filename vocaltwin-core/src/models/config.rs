use crate::models::audio::AudioEncoding;

/// Configuration for a recording session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Target sample rate in Hz (default: 44100).
    pub sample_rate: u32,

    /// Request echo cancellation from the capture backend (best-effort).
    pub echo_cancellation: bool,

    /// Request noise suppression from the capture backend (best-effort).
    pub noise_suppression: bool,

    /// Fixed recording cap in seconds; the countdown auto-stops here.
    pub max_duration_secs: u32,

    /// Cadence of the metric/visual frame loop in milliseconds (~30 fps).
    pub frame_interval_ms: u64,

    /// Resolution of the frequency-domain transform. Must be a power of two.
    pub fft_size: usize,

    /// Upload encodings in preference order; the sink probes runtime support
    /// before committing to one.
    pub encoding_preferences: Vec<AudioEncoding>,
}

impl SessionConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.sample_rate == 0 {
            return Err("sample rate must be positive".into());
        }
        if self.max_duration_secs == 0 {
            return Err("max duration must be at least one second".into());
        }
        if self.frame_interval_ms == 0 {
            return Err("frame interval must be positive".into());
        }
        if !self.fft_size.is_power_of_two() || self.fft_size < 32 {
            return Err(format!("invalid fft size: {}", self.fft_size));
        }
        if self.encoding_preferences.is_empty() {
            return Err("encoding preference list must not be empty".into());
        }
        Ok(())
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44_100,
            echo_cancellation: true,
            noise_suppression: true,
            max_duration_secs: 10,
            frame_interval_ms: 33,
            fft_size: 256,
            encoding_preferences: vec![
                AudioEncoding::OggOpus,
                AudioEncoding::Flac,
                AudioEncoding::Wav,
            ],
        }
    }
}
