//! Locally synthesized analysis results.
//!
//! When the remote call fails (or the recorder never produced a buffer), the
//! session still delivers a plausible result seeded from the last live
//! readings, so the flow never hangs in finalizing. Unlike the service's
//! answer it is explicitly marked `ReportOrigin::Fallback`, so callers can
//! tell a degraded/offline result from a real match.

use rand::Rng;

use crate::models::analysis::{AnalysisReport, MatchedSinger, RadarPoint, ReportOrigin};
use crate::models::metrics::Clarity;

const RADAR_FULL_MARK: f32 = 150.0;

const FALLBACK_SINGER_NAME: &str = "Adele";
const FALLBACK_SINGER_DESCRIPTION: &str = "Mezzo-soprano • Soul • Pop";
const FALLBACK_SINGER_AVATAR: &str = "https://static.vocaltwin.app/singers/adele.jpg";

/// Radar base value a clarity label maps to.
fn clarity_base(clarity: Clarity) -> f32 {
    match clarity {
        Clarity::VeryHigh => 95.0,
        Clarity::High => 85.0,
        Clarity::Medium => 70.0,
        Clarity::Low => 50.0,
    }
}

/// Centered random offset in `[-range/2, range/2)`.
fn offset<R: Rng>(rng: &mut R, range: f32) -> f32 {
    (rng.gen_range(0.0..range) - range / 2.0).floor()
}

fn clamp(value: f32, min: f32, max: f32) -> f32 {
    value.clamp(min, max)
}

/// Synthesize a fallback report seeded from the session's final live readings.
pub fn synthesize(
    clarity: Clarity,
    stability_display: u8,
    user_avatar_url: Option<String>,
) -> AnalysisReport {
    synthesize_with(&mut rand::thread_rng(), clarity, stability_display, user_avatar_url)
}

pub fn synthesize_with<R: Rng>(
    rng: &mut R,
    clarity: Clarity,
    stability_display: u8,
    user_avatar_url: Option<String>,
) -> AnalysisReport {
    let stability = if stability_display == 0 {
        92
    } else {
        stability_display
    };
    let base = clarity_base(clarity);
    let stability_val = stability as f32;

    let radar = vec![
        // Warmth correlates with stability.
        RadarPoint {
            subject: "Warmth".into(),
            user: clamp(stability_val + offset(rng, 15.0), 40.0, 100.0),
            reference: 95.0,
            full_mark: RADAR_FULL_MARK,
        },
        // Brightness and power correlate with clarity.
        RadarPoint {
            subject: "Brightness".into(),
            user: clamp(base + offset(rng, 10.0), 40.0, 100.0),
            reference: 90.0,
            full_mark: RADAR_FULL_MARK,
        },
        RadarPoint {
            subject: "Power".into(),
            user: clamp(base - 5.0 + offset(rng, 15.0), 40.0, 100.0),
            reference: 85.0,
            full_mark: RADAR_FULL_MARK,
        },
        // No pitch detection locally, so range is mostly random.
        RadarPoint {
            subject: "Range".into(),
            user: clamp(70.0 + offset(rng, 30.0), 50.0, 100.0),
            reference: 80.0,
            full_mark: RADAR_FULL_MARK,
        },
        RadarPoint {
            subject: "Breath".into(),
            user: clamp(80.0 + offset(rng, 20.0), 50.0, 100.0),
            reference: 80.0,
            full_mark: RADAR_FULL_MARK,
        },
    ];

    AnalysisReport {
        score: rng.gen_range(85..=99),
        clarity: clarity.label().to_string(),
        stability: format!("{}%", stability),
        radar,
        matched_singer: MatchedSinger {
            name: FALLBACK_SINGER_NAME.into(),
            description: FALLBACK_SINGER_DESCRIPTION.into(),
            avatar_url: FALLBACK_SINGER_AVATAR.into(),
        },
        user_avatar_url,
        origin: ReportOrigin::Fallback,
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    #[test]
    fn score_stays_in_plausible_band() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let report = synthesize_with(&mut rng, Clarity::High, 88, None);
            assert!((85..=99).contains(&report.score));
        }
    }

    #[test]
    fn radar_has_five_clamped_axes() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..200 {
            let report = synthesize_with(&mut rng, Clarity::Low, 3, None);
            assert_eq!(report.radar.len(), 5);
            for point in &report.radar {
                assert!((40.0..=100.0).contains(&point.user), "axis {}", point.subject);
                assert_eq!(point.full_mark, 150.0);
            }
        }
    }

    #[test]
    fn zero_stability_reading_uses_default() {
        let mut rng = StdRng::seed_from_u64(3);
        let report = synthesize_with(&mut rng, Clarity::Medium, 0, None);
        assert_eq!(report.stability, "92%");
    }

    #[test]
    fn marked_as_fallback_with_seeded_labels() {
        let mut rng = StdRng::seed_from_u64(3);
        let report = synthesize_with(&mut rng, Clarity::VeryHigh, 77, Some("https://a/me.png".into()));
        assert_eq!(report.origin, ReportOrigin::Fallback);
        assert_eq!(report.clarity, "Very High");
        assert_eq!(report.stability, "77%");
        assert_eq!(report.user_avatar_url.as_deref(), Some("https://a/me.png"));
        assert_eq!(report.matched_singer.name, "Adele");
    }
}
