use serde::{Deserialize, Serialize};

/// Where an analysis report came from.
///
/// The session always delivers exactly one report, even when the remote call
/// fails. A synthesized report is marked `Fallback` so callers can distinguish
/// a degraded/offline result from a genuine backend match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportOrigin {
    Remote,
    Fallback,
}

/// One axis of the 5-axis user-vs-reference radar comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RadarPoint {
    pub subject: String,
    /// The user's value on this axis.
    #[serde(rename = "A")]
    pub user: f32,
    /// The matched reference singer's value.
    #[serde(rename = "B")]
    pub reference: f32,
    #[serde(rename = "fullMark")]
    pub full_mark: f32,
}

/// Descriptor of the matched reference singer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchedSinger {
    pub name: String,
    pub description: String,
    pub avatar_url: String,
}

/// The structured outcome of one voice analysis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    pub score: u32,
    pub clarity: String,
    pub stability: String,
    pub radar: Vec<RadarPoint>,
    pub matched_singer: MatchedSinger,
    pub user_avatar_url: Option<String>,
    pub origin: ReportOrigin,
}

/// Wire shape of the backend's `/api/analysis/analyze` response.
#[derive(Debug, Deserialize)]
pub struct BackendAnalysisResponse {
    pub score: u32,
    pub clarity: String,
    pub stability: String,
    pub radar_data: Vec<RadarPoint>,
    pub matched_singer: MatchedSinger,
    #[serde(default)]
    pub user_avatar_url: Option<String>,
}

impl BackendAnalysisResponse {
    pub fn into_report(self) -> AnalysisReport {
        AnalysisReport {
            score: self.score,
            clarity: self.clarity,
            stability: self.stability,
            radar: self.radar_data,
            matched_singer: self.matched_singer,
            user_avatar_url: self.user_avatar_url,
            origin: ReportOrigin::Remote,
        }
    }
}
