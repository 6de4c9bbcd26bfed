use serde::{Deserialize, Serialize};

fn default_timeout_secs() -> u64 {
    120
}

/// Where to send analysis requests once a session has been merged.
///
/// An empty `url` selects [`crate::LoggingAnalysisTrigger`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl AnalysisConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    pub fn is_enabled(&self) -> bool {
        !self.url.is_empty()
    }
}
