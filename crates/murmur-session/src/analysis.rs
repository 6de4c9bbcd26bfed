use crate::config::AnalysisConfig;
use crate::error::SessionError;
use async_trait::async_trait;
use murmur_types::SessionId;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Body of an analysis request: which summary to analyze.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRequest {
    pub session_id: SessionId,
    pub summary_bucket: String,
    pub summary_key: String,
}

/// Starts downstream analysis of a merged session.
#[async_trait]
pub trait AnalysisTrigger: Send + Sync {
    async fn trigger(&self, request: &AnalysisRequest) -> Result<(), SessionError>;
}

/// Posts the request as JSON to a configured URL.
#[derive(Debug, Clone)]
pub struct HttpAnalysisTrigger {
    url: String,
    http: reqwest::Client,
}

impl HttpAnalysisTrigger {
    pub fn new(config: &AnalysisConfig) -> Result<Self, SessionError> {
        if !config.is_enabled() {
            return Err(SessionError::Config("analysis url is not configured".to_string()));
        }
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            url: config.url.clone(),
            http,
        })
    }
}

#[async_trait]
impl AnalysisTrigger for HttpAnalysisTrigger {
    async fn trigger(&self, request: &AnalysisRequest) -> Result<(), SessionError> {
        let response = self.http.post(&self.url).json(request).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SessionError::Analysis {
                status: status.as_u16(),
                body,
            });
        }
        tracing::info!(
            session_id = %request.session_id,
            key = %request.summary_key,
            "analysis triggered"
        );
        Ok(())
    }
}

/// Records the request in the log and does nothing else.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingAnalysisTrigger;

#[async_trait]
impl AnalysisTrigger for LoggingAnalysisTrigger {
    async fn trigger(&self, request: &AnalysisRequest) -> Result<(), SessionError> {
        tracing::info!(
            session_id = %request.session_id,
            bucket = %request.summary_bucket,
            key = %request.summary_key,
            "analysis requested; no analysis url configured"
        );
        Ok(())
    }
}
