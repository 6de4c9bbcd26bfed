use serde::{Deserialize, Serialize};
use std::fmt;

fn default_timeout_secs() -> u64 {
    120
}

#[derive(Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Base URL of the agent runtime.
    #[serde(default)]
    pub endpoint: String,
    #[serde(default)]
    pub agent_id: String,
    #[serde(default)]
    pub agent_alias_id: String,
    /// Bearer token sent with every request. Empty disables the header.
    #[serde(default, skip_serializing)]
    pub api_key: String,
    /// Whole-request timeout in seconds, including the streamed reply. Default: 120.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            agent_id: String::new(),
            agent_alias_id: String::new(),
            api_key: String::new(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl fmt::Debug for AgentConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentConfig")
            .field("endpoint", &self.endpoint)
            .field("agent_id", &self.agent_id)
            .field("agent_alias_id", &self.agent_alias_id)
            .field("api_key", &"[REDACTED]")
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl AgentConfig {
    pub fn new(
        endpoint: impl Into<String>,
        agent_id: impl Into<String>,
        agent_alias_id: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            agent_id: agent_id.into(),
            agent_alias_id: agent_alias_id.into(),
            ..Self::default()
        }
    }

    pub fn is_enabled(&self) -> bool {
        !self.endpoint.is_empty()
    }
}
