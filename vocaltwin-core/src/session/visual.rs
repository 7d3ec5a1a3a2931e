use crate::models::metrics::FrameMetrics;

/// Minimum visible bar width in percent; the bars never fully disappear.
const MIN_BAR_PERCENT: f32 = 5.0;

/// Renderable state for one frame: orb scale, two bar widths, two readouts.
#[derive(Debug, Clone, PartialEq)]
pub struct VisualFrame {
    /// `1 + (avg/255) * 1.5`, linear and intentionally oversensitive.
    pub orb_scale: f32,
    pub clarity_bar_percent: f32,
    pub stability_bar_percent: f32,
    pub clarity_label: &'static str,
    pub stability_percent: u8,
}

/// Maps each frame metric sample to renderable state.
///
/// A pure function of the latest sample; all time-dependent state lives in
/// the live analyzer. Runs on the same cadence as the analyzer, so frame N's
/// visuals always reflect metric sample N.
pub struct VisualDriver;

impl VisualDriver {
    pub fn render(metrics: &FrameMetrics) -> VisualFrame {
        let display = metrics.stability_display as f32;
        VisualFrame {
            orb_scale: 1.0 + (metrics.average_energy / 255.0) * 1.5,
            clarity_bar_percent: metrics.volume_percent.max(MIN_BAR_PERCENT),
            stability_bar_percent: display.max(MIN_BAR_PERCENT),
            clarity_label: metrics.clarity.label(),
            stability_percent: metrics.stability_display,
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use crate::models::metrics::Clarity;

    use super::*;

    fn metrics(average_energy: f32, volume_percent: f32, stability: f32) -> FrameMetrics {
        FrameMetrics {
            average_energy,
            volume_percent,
            clarity: Clarity::from_volume_percent(volume_percent),
            stability,
            stability_display: stability.round() as u8,
        }
    }

    #[test]
    fn orb_scale_follows_energy() {
        let frame = VisualDriver::render(&metrics(0.0, 0.0, 0.0));
        assert_relative_eq!(frame.orb_scale, 1.0);

        let frame = VisualDriver::render(&metrics(255.0, 100.0, 100.0));
        assert_relative_eq!(frame.orb_scale, 2.5);

        let frame = VisualDriver::render(&metrics(127.5, 100.0, 100.0));
        assert_relative_eq!(frame.orb_scale, 1.75);
    }

    #[test]
    fn bars_never_drop_below_minimum_width() {
        let frame = VisualDriver::render(&metrics(0.0, 0.0, 0.0));
        assert_relative_eq!(frame.clarity_bar_percent, 5.0);
        assert_relative_eq!(frame.stability_bar_percent, 5.0);
    }

    #[test]
    fn readouts_mirror_the_sample() {
        let frame = VisualDriver::render(&metrics(100.0, 83.3, 91.6));
        assert_eq!(frame.clarity_label, "High");
        assert_eq!(frame.stability_percent, 92);
        assert_relative_eq!(frame.clarity_bar_percent, 83.3);
        assert_relative_eq!(frame.stability_bar_percent, 92.0);
    }
}
