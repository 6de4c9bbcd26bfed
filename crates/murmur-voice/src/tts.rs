use crate::config::SynthesisConfig;
use crate::error::VoiceError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use murmur_storage::UrlSigner;
use murmur_types::SessionId;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// Maximum text input size for TTS (64 KiB). Prevents resource exhaustion from
/// oversized synthesis requests.
const MAX_TTS_INPUT_BYTES: usize = 64 * 1024;

/// Body sent to the synthesis endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SynthesisRequest {
    pub text: String,
    pub ref_audio_bucket: String,
    pub ref_audio_key: String,
    pub output_bucket: String,
    pub output_key: String,
}

/// A remote speech-synthesis endpoint.
///
/// The endpoint reads the reference voice and writes the rendered audio to
/// the buckets and keys named in the request; it returns metadata only.
#[async_trait]
pub trait SynthesisEndpoint: Send + Sync {
    async fn invoke(&self, request: &SynthesisRequest) -> Result<Value, VoiceError>;
}

/// Synthesis endpoint reached over HTTP at
/// `POST {endpoint_url}/endpoints/{endpoint_name}/invocations`.
#[derive(Debug, Clone)]
pub struct HttpSynthesisEndpoint {
    url: String,
    api_key: String,
    http: reqwest::Client,
}

impl HttpSynthesisEndpoint {
    pub fn new(config: &SynthesisConfig) -> Result<Self, VoiceError> {
        if !config.is_enabled() {
            return Err(VoiceError::Config(
                "synthesis endpoint_url is not configured".to_string(),
            ));
        }
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            url: format!(
                "{}/endpoints/{}/invocations",
                config.endpoint_url.trim_end_matches('/'),
                config.endpoint_name
            ),
            api_key: config.api_key.clone(),
            http,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl SynthesisEndpoint for HttpSynthesisEndpoint {
    async fn invoke(&self, request: &SynthesisRequest) -> Result<Value, VoiceError> {
        let mut builder = self.http.post(&self.url).json(request);
        if !self.api_key.is_empty() {
            builder = builder.bearer_auth(&self.api_key);
        }
        let response = builder.send().await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(VoiceError::Endpoint {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body)
            .map_err(|e| VoiceError::Tts(format!("endpoint returned invalid JSON: {}", e)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SynthesisStatus {
    Success,
    Error,
}

impl SynthesisStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
        }
    }
}

/// Result of a synthesis attempt. Failures are data, not errors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SynthesisOutcome {
    pub status: SynthesisStatus,
    pub audio_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub s3_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SynthesisOutcome {
    fn failed(error: &VoiceError) -> Self {
        Self {
            status: SynthesisStatus::Error,
            audio_url: None,
            s3_path: None,
            details: None,
            error: Some(error.to_string()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == SynthesisStatus::Success
    }
}

/// Returns `audio/<sessionId>/<YYYYmmddHHMMSS>.wav`, or
/// `audio/<YYYYmmddHHMMSS>.wav` without a session.
pub fn default_output_key(session_id: Option<&SessionId>, now: DateTime<Utc>) -> String {
    let timestamp = now.format("%Y%m%d%H%M%S");
    match session_id {
        Some(sid) => format!("audio/{}/{}.wav", sid, timestamp),
        None => format!("audio/{}.wav", timestamp),
    }
}

/// Service for rendering reply text to audio.
#[derive(Clone)]
pub struct SpeechSynthesizer {
    endpoint: Arc<dyn SynthesisEndpoint>,
    signer: Arc<UrlSigner>,
    config: SynthesisConfig,
}

impl SpeechSynthesizer {
    pub fn new(
        endpoint: Arc<dyn SynthesisEndpoint>,
        signer: Arc<UrlSigner>,
        config: SynthesisConfig,
    ) -> Self {
        Self {
            endpoint,
            signer,
            config,
        }
    }

    pub fn config(&self) -> &SynthesisConfig {
        &self.config
    }

    /// Synthesizes `text` and returns a signed URL for the audio.
    ///
    /// `output_key` defaults to [`default_output_key`]. Never fails; see
    /// [`SynthesisOutcome`].
    pub async fn synthesize(
        &self,
        text: &str,
        session_id: Option<&SessionId>,
        output_key: Option<&str>,
    ) -> SynthesisOutcome {
        let output_key = match output_key {
            Some(key) => key.to_string(),
            None => default_output_key(session_id, Utc::now()),
        };

        match self.try_synthesize(text, &output_key).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::warn!(
                    session_id = session_id.map(SessionId::as_str).unwrap_or("<none>"),
                    output_key = %output_key,
                    error = %e,
                    "speech synthesis failed; continuing without audio"
                );
                SynthesisOutcome::failed(&e)
            }
        }
    }

    async fn try_synthesize(
        &self,
        text: &str,
        output_key: &str,
    ) -> Result<SynthesisOutcome, VoiceError> {
        if text.len() > MAX_TTS_INPUT_BYTES {
            return Err(VoiceError::Tts(format!(
                "text exceeds maximum size: {} bytes (limit: {} bytes)",
                text.len(),
                MAX_TTS_INPUT_BYTES
            )));
        }

        let request = SynthesisRequest {
            text: text.to_string(),
            ref_audio_bucket: self.config.input_bucket.clone(),
            ref_audio_key: self.config.ref_audio_key.clone(),
            output_bucket: self.config.output_bucket.clone(),
            output_key: output_key.to_string(),
        };

        tracing::info!(text_len = text.len(), output_key, "calling synthesis endpoint");
        let details = self.endpoint.invoke(&request).await?;
        tracing::info!(output_key, details = %details, "synthesis complete");

        let audio_url = self.signer.presign_get(
            &self.config.output_bucket,
            output_key,
            Duration::from_secs(self.config.url_ttl_secs),
        )?;

        Ok(SynthesisOutcome {
            status: SynthesisStatus::Success,
            audio_url: Some(audio_url),
            s3_path: Some(format!("s3://{}/{}", self.config.output_bucket, output_key)),
            details: Some(details),
            error: None,
        })
    }
}

impl std::fmt::Debug for SpeechSynthesizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpeechSynthesizer")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
