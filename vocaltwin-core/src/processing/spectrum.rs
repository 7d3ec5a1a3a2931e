use std::sync::Arc;

use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};

/// Decibel range mapped onto the 0–255 byte scale.
const MIN_DECIBELS: f32 = -100.0;
const MAX_DECIBELS: f32 = -30.0;

/// Fixed-resolution frequency-domain transform with internal time smoothing.
///
/// Models a Web-Audio analyser node: a Blackman window, a forward FFT of
/// `fft_size` points, magnitudes normalized by the FFT size and exponentially
/// smoothed across invocations (constant 0.5), then mapped from decibels onto
/// a 0–255 byte scale. Exposes `fft_size / 2` bins.
pub struct Spectrum {
    fft: Arc<dyn Fft<f32>>,
    fft_size: usize,
    window: Vec<f32>,
    smoothing: f32,
    smoothed: Vec<f32>,
}

impl Spectrum {
    pub fn new(fft_size: usize, smoothing: f32) -> Self {
        debug_assert!(fft_size.is_power_of_two());
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(fft_size);
        Self {
            fft,
            fft_size,
            window: blackman_window(fft_size),
            smoothing,
            smoothed: vec![0.0; fft_size / 2],
        }
    }

    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    pub fn bin_count(&self) -> usize {
        self.fft_size / 2
    }

    /// Transform the latest time-domain window into byte frequency bins.
    ///
    /// `samples` must hold exactly `fft_size` samples (the analyzer's tap
    /// zero-pads short windows).
    pub fn byte_frequency_data(&mut self, samples: &[f32]) -> Vec<u8> {
        debug_assert_eq!(samples.len(), self.fft_size);

        let mut buffer: Vec<Complex<f32>> = samples
            .iter()
            .zip(self.window.iter())
            .map(|(&s, &w)| Complex::new(s * w, 0.0))
            .collect();
        self.fft.process(&mut buffer);

        let scale = 1.0 / self.fft_size as f32;
        let mut bytes = Vec::with_capacity(self.bin_count());
        for (bin, value) in buffer.iter().take(self.bin_count()).enumerate() {
            let magnitude = value.norm() * scale;
            // Exponential smoothing over time, applied on linear magnitudes.
            self.smoothed[bin] =
                self.smoothing * self.smoothed[bin] + (1.0 - self.smoothing) * magnitude;

            let db = 20.0 * self.smoothed[bin].max(f32::MIN_POSITIVE).log10();
            let scaled = 255.0 * (db - MIN_DECIBELS) / (MAX_DECIBELS - MIN_DECIBELS);
            bytes.push(scaled.clamp(0.0, 255.0) as u8);
        }
        bytes
    }

    /// Drop accumulated smoothing state.
    pub fn reset(&mut self) {
        self.smoothed.fill(0.0);
    }
}

/// Blackman window, the shape analyser nodes apply before transforming.
fn blackman_window(size: usize) -> Vec<f32> {
    let n = size as f32;
    (0..size)
        .map(|i| {
            let x = i as f32 / n;
            0.42 - 0.5 * (2.0 * std::f32::consts::PI * x).cos()
                + 0.08 * (4.0 * std::f32::consts::PI * x).cos()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq_bin: usize, fft_size: usize, sample_rate: f32) -> Vec<f32> {
        let freq = freq_bin as f32 * sample_rate / fft_size as f32;
        (0..fft_size)
            .map(|i| (2.0 * std::f32::consts::PI * freq * i as f32 / sample_rate).sin())
            .collect()
    }

    #[test]
    fn silence_maps_to_zero_bins() {
        let mut spectrum = Spectrum::new(256, 0.5);
        let bins = spectrum.byte_frequency_data(&vec![0.0; 256]);
        assert_eq!(bins.len(), 128);
        assert!(bins.iter().all(|&b| b == 0));
    }

    #[test]
    fn sine_peaks_at_its_bin() {
        let mut spectrum = Spectrum::new(256, 0.5);
        let samples = sine(16, 256, 44_100.0);
        // Run a few frames so smoothing settles.
        let mut bins = Vec::new();
        for _ in 0..4 {
            bins = spectrum.byte_frequency_data(&samples);
        }

        let peak_bin = bins
            .iter()
            .enumerate()
            .max_by_key(|(_, &v)| v)
            .map(|(i, _)| i)
            .unwrap();
        assert!(
            (15..=17).contains(&peak_bin),
            "expected peak near bin 16, got {}",
            peak_bin
        );
        assert!(bins[peak_bin] > 200);
    }

    #[test]
    fn smoothing_carries_energy_across_frames() {
        let mut spectrum = Spectrum::new(256, 0.5);
        let samples = sine(16, 256, 44_100.0);
        for _ in 0..4 {
            spectrum.byte_frequency_data(&samples);
        }

        // After the tone stops, the smoothed bins decay rather than vanish.
        let after = spectrum.byte_frequency_data(&vec![0.0; 256]);
        assert!(after[16] > 0, "smoothing should leave residual energy");

        spectrum.reset();
        let cleared = spectrum.byte_frequency_data(&vec![0.0; 256]);
        assert_eq!(cleared[16], 0);
    }

    #[test]
    fn window_tapers_to_near_zero_at_edges() {
        let window = blackman_window(256);
        assert!(window[0].abs() < 1e-3);
        assert!((window[128] - 1.0).abs() < 1e-2);
    }
}
