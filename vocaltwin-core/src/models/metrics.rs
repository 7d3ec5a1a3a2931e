use serde::{Deserialize, Serialize};

/// Discretized loudness-derived readability label.
///
/// Ordered categorical: `Low < Medium < High < VeryHigh`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Clarity {
    Low,
    Medium,
    High,
    VeryHigh,
}

impl Clarity {
    /// Threshold map from volume-percent (0–100) to a clarity label.
    ///
    /// The breakpoints are product policy, not incidental:
    /// >85 → very high, >60 → high, >30 → medium, else → low.
    pub fn from_volume_percent(volume_percent: f32) -> Self {
        if volume_percent > 85.0 {
            Self::VeryHigh
        } else if volume_percent > 60.0 {
            Self::High
        } else if volume_percent > 30.0 {
            Self::Medium
        } else {
            Self::Low
        }
    }

    /// Human-readable label shown in the clarity readout.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
            Self::VeryHigh => "Very High",
        }
    }
}

/// One frame's derived acoustic readout.
///
/// `stability` depends on the previous frame (exponential smoothing), so a
/// sequence of these is a stateful time series, not independent observations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameMetrics {
    /// Arithmetic mean of the frequency-bin magnitudes, 0–255.
    pub average_energy: f32,

    /// `min(100, average_energy / 120 × 100)`.
    pub volume_percent: f32,

    /// Clarity label derived from `volume_percent`.
    pub clarity: Clarity,

    /// Smoothed stability, 0–100, before rounding.
    pub stability: f32,

    /// `stability` rounded for presentation.
    pub stability_display: u8,
}
