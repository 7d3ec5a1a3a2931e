use std::sync::Arc;

use parking_lot::Mutex;

use crate::models::metrics::{Clarity, FrameMetrics};
use crate::processing::spectrum::Spectrum;
use crate::processing::tap::SampleTap;

/// Internal smoothing constant of the frequency transform.
const SPECTRUM_SMOOTHING: f32 = 0.5;

/// Average energy at or below which the signal counts as near-silence.
const SILENCE_GATE: f32 = 10.0;

/// How strongly a frame-to-frame energy jump penalizes stability.
const INSTABILITY_WEIGHT: f32 = 5.0;

/// Per-frame interpolation factor pulling displayed stability toward target.
const STABILITY_LERP: f32 = 0.1;

/// Clarity/stability recurrence, separated from the transform so the numeric
/// policy is testable with plain energy series.
///
/// Stability: `target = max(0, 100 − 5·|avg_t − avg_{t−1}|)` when the frame is
/// above the silence gate, else 0; the displayed value moves one tenth of the
/// way toward the target each frame. Near-silence therefore pulls stability
/// down over several frames rather than snapping to zero. Intentional.
#[derive(Debug)]
pub struct MetricsTracker {
    last_average: f32,
    stability: f32,
}

impl MetricsTracker {
    pub fn new() -> Self {
        Self {
            last_average: 0.0,
            stability: 0.0,
        }
    }

    pub fn update(&mut self, average_energy: f32) -> FrameMetrics {
        let volume_percent = (average_energy / 120.0 * 100.0).min(100.0);
        let clarity = Clarity::from_volume_percent(volume_percent);

        let diff = (average_energy - self.last_average).abs();
        self.last_average = average_energy;

        let target = if average_energy > SILENCE_GATE {
            (100.0 - diff * INSTABILITY_WEIGHT).max(0.0)
        } else {
            0.0
        };
        self.stability += (target - self.stability) * STABILITY_LERP;

        FrameMetrics {
            average_energy,
            volume_percent,
            clarity,
            stability: self.stability,
            stability_display: self.stability.round() as u8,
        }
    }
}

impl Default for MetricsTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// Turns the raw stream into a continuous sequence of frame metric samples
/// without persisting any audio.
///
/// Constructed fresh per session: the smoothing state never leaks across
/// sessions. The capture callback feeds the tap; the frame loop calls
/// `sample()` once per frame for the lifetime of one capturing session.
pub struct LiveAnalyzer {
    tap: Arc<Mutex<SampleTap>>,
    spectrum: Spectrum,
    tracker: MetricsTracker,
}

impl LiveAnalyzer {
    pub fn new(fft_size: usize) -> Self {
        Self {
            tap: Arc::new(Mutex::new(SampleTap::new(fft_size))),
            spectrum: Spectrum::new(fft_size, SPECTRUM_SMOOTHING),
            tracker: MetricsTracker::new(),
        }
    }

    /// Shared handle the capture callback pushes samples into.
    pub fn tap(&self) -> Arc<Mutex<SampleTap>> {
        Arc::clone(&self.tap)
    }

    /// Derive the next frame metric sample from the latest audio window.
    pub fn sample(&mut self) -> FrameMetrics {
        let window = self.tap.lock().window(self.spectrum.fft_size());
        let bins = self.spectrum.byte_frequency_data(&window);
        let average = bins.iter().map(|&b| b as f32).sum::<f32>() / bins.len() as f32;
        self.tracker.update(average)
    }
}
