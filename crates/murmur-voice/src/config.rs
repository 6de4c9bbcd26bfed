use serde::{Deserialize, Serialize};
use std::fmt;

fn default_endpoint_name() -> String {
    "f5tts-endpoint".to_string()
}

fn default_input_bucket() -> String {
    "f5tts-input-m4a".to_string()
}

fn default_output_bucket() -> String {
    "f5tts-output-wav".to_string()
}

fn default_ref_audio_key() -> String {
    "reference_voice.wav".to_string()
}

fn default_url_ttl_secs() -> u64 {
    900
}

fn default_timeout_secs() -> u64 {
    120
}

#[derive(Clone, Serialize, Deserialize)]
pub struct SynthesisConfig {
    /// Base URL of the endpoint hosting runtime.
    #[serde(default)]
    pub endpoint_url: String,
    #[serde(default = "default_endpoint_name")]
    pub endpoint_name: String,
    /// Bucket holding the reference voice sample.
    #[serde(default = "default_input_bucket")]
    pub input_bucket: String,
    /// Bucket the endpoint writes synthesized audio to.
    #[serde(default = "default_output_bucket")]
    pub output_bucket: String,
    #[serde(default = "default_ref_audio_key")]
    pub ref_audio_key: String,
    /// Validity of signed audio URLs in seconds. Default: 900 (15 minutes).
    #[serde(default = "default_url_ttl_secs")]
    pub url_ttl_secs: u64,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default, skip_serializing)]
    pub api_key: String,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            endpoint_url: String::new(),
            endpoint_name: default_endpoint_name(),
            input_bucket: default_input_bucket(),
            output_bucket: default_output_bucket(),
            ref_audio_key: default_ref_audio_key(),
            url_ttl_secs: default_url_ttl_secs(),
            timeout_secs: default_timeout_secs(),
            api_key: String::new(),
        }
    }
}

impl fmt::Debug for SynthesisConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SynthesisConfig")
            .field("endpoint_url", &self.endpoint_url)
            .field("endpoint_name", &self.endpoint_name)
            .field("input_bucket", &self.input_bucket)
            .field("output_bucket", &self.output_bucket)
            .field("ref_audio_key", &self.ref_audio_key)
            .field("url_ttl_secs", &self.url_ttl_secs)
            .field("timeout_secs", &self.timeout_secs)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

impl SynthesisConfig {
    pub fn new(endpoint_url: impl Into<String>) -> Self {
        Self {
            endpoint_url: endpoint_url.into(),
            ..Self::default()
        }
    }

    pub fn is_enabled(&self) -> bool {
        !self.endpoint_url.is_empty()
    }
}
