use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;

use crate::models::analysis::{AnalysisReport, BackendAnalysisResponse};
use crate::models::audio::EncodedAudio;
use crate::models::error::SessionError;
use crate::traits::analysis_backend::AnalysisBackend;

/// Server-side feature extraction is CPU-bound; give it minutes, not seconds.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(180);

/// HTTP client for the remote voice-analysis service.
pub struct HttpAnalysisClient {
    http: Client,
    base_url: String,
}

impl HttpAnalysisClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, SessionError> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, SessionError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SessionError::AnalysisFailed(e.to_string()))?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/api/analysis/analyze", self.base_url)
    }
}

#[async_trait]
impl AnalysisBackend for HttpAnalysisClient {
    async fn analyze(
        &self,
        audio: EncodedAudio,
        filename: &str,
    ) -> Result<AnalysisReport, SessionError> {
        log::info!(
            "submitting {} ({:.2} KiB) for analysis",
            filename,
            audio.len() as f64 / 1024.0
        );

        let mime = audio.encoding.mime_type();
        let part = Part::bytes(audio.data)
            .file_name(filename.to_string())
            .mime_str(mime)
            .map_err(|e| SessionError::AnalysisFailed(e.to_string()))?;
        let form = Form::new().part("audio_file", part);

        let response = self
            .http
            .post(self.endpoint())
            .multipart(form)
            .send()
            .await
            .map_err(|e| SessionError::AnalysisFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            log::error!("analysis service error ({}): {}", status.as_u16(), body);
            return Err(SessionError::AnalysisFailed(format!(
                "server returned {}: {}",
                status.as_u16(),
                body
            )));
        }

        let backend: BackendAnalysisResponse = response
            .json()
            .await
            .map_err(|e| SessionError::AnalysisFailed(e.to_string()))?;

        let report = backend.into_report();
        log::info!(
            "analysis complete: score {}, matched {}",
            report.score,
            report.matched_singer.name
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_joins_without_double_slash() {
        let client = HttpAnalysisClient::new("https://api.example.com/").unwrap();
        assert_eq!(
            client.endpoint(),
            "https://api.example.com/api/analysis/analyze"
        );

        let client = HttpAnalysisClient::new("https://api.example.com").unwrap();
        assert_eq!(
            client.endpoint(),
            "https://api.example.com/api/analysis/analyze"
        );
    }
}
