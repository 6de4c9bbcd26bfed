//! Construction of the application state from configuration.

use crate::config::{Config, StorageBackend};
use crate::orchestrator::Orchestrator;
use crate::AppState;
use async_trait::async_trait;
use murmur_agent::{AgentClient, AgentError, AgentRuntime, CompletionStream, HttpAgentRuntime};
use murmur_session::{
    AnalysisTrigger, HttpAnalysisTrigger, LoggingAnalysisTrigger, SessionError, SessionFinisher,
    StoreMerger,
};
use murmur_storage::{
    FsObjectStore, LogStore, MemoryObjectStore, ObjectStore, StorageError, UrlSigner,
};
use murmur_types::SessionId;
use murmur_voice::{
    HttpSynthesisEndpoint, SpeechSynthesizer, SynthesisEndpoint, SynthesisRequest, VoiceError,
};
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

/// Errors that prevent the server from starting.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("storage setup failed: {0}")]
    Storage(#[from] StorageError),
    #[error("agent setup failed: {0}")]
    Agent(#[from] AgentError),
    #[error("synthesis setup failed: {0}")]
    Voice(#[from] VoiceError),
    #[error("analysis setup failed: {0}")]
    Session(#[from] SessionError),
}

/// Agent runtime used when no agent endpoint is configured.
#[derive(Debug, Default)]
pub struct UnconfiguredAgent;

#[async_trait]
impl AgentRuntime for UnconfiguredAgent {
    async fn invoke(
        &self,
        _session_id: &SessionId,
        _input_text: &str,
    ) -> Result<CompletionStream, AgentError> {
        Err(AgentError::NotConfigured)
    }
}

/// Synthesis endpoint used when no endpoint URL is configured. Every call
/// fails, which leaves replies without audio.
#[derive(Debug, Default)]
pub struct UnconfiguredSynthesis;

#[async_trait]
impl SynthesisEndpoint for UnconfiguredSynthesis {
    async fn invoke(&self, _request: &SynthesisRequest) -> Result<Value, VoiceError> {
        Err(VoiceError::Config(
            "synthesis endpoint_url is not configured".to_string(),
        ))
    }
}

/// Builds the object store selected by `storage.backend`.
pub fn object_store(config: &Config) -> Arc<dyn ObjectStore> {
    match config.storage.backend {
        StorageBackend::Memory => {
            tracing::warn!("using in-memory object storage; data is lost on restart");
            Arc::new(MemoryObjectStore::new())
        }
        StorageBackend::Fs => {
            tracing::info!(root = %config.storage.root, "using filesystem object storage");
            Arc::new(FsObjectStore::new(&config.storage.root))
        }
    }
}

/// Builds the URL signer, generating a process-local secret if none is set.
pub fn url_signer(config: &Config) -> Result<UrlSigner, StorageError> {
    let secret = if config.storage.signing_secret.is_empty() {
        tracing::warn!("storage.signing_secret is empty; signed urls will not survive a restart");
        uuid::Uuid::new_v4().simple().to_string()
    } else {
        config.storage.signing_secret.clone()
    };
    UrlSigner::new(secret, &config.server.public_url)
}

/// Wires every collaborator named in `config` into an [`AppState`].
///
/// Unconfigured collaborators are replaced by stand-ins: `invoke_agent`
/// fails without an agent, replies carry no audio without a synthesis
/// endpoint, and analysis requests are only logged without an analysis URL.
///
/// # Errors
///
/// Returns `StartupError` if a configured collaborator cannot be built.
pub fn build_state(config: &Config) -> Result<AppState, StartupError> {
    let objects = object_store(config);
    let signer = Arc::new(url_signer(config)?);
    build_state_with(config, objects, signer)
}

/// Like [`build_state`], with a caller-supplied store and signer.
pub fn build_state_with(
    config: &Config,
    objects: Arc<dyn ObjectStore>,
    signer: Arc<UrlSigner>,
) -> Result<AppState, StartupError> {
    let runtime: Arc<dyn AgentRuntime> = if config.agent.is_enabled() {
        Arc::new(HttpAgentRuntime::new(config.agent.clone())?)
    } else {
        tracing::warn!("agent.endpoint is empty; invoke_agent will fail");
        Arc::new(UnconfiguredAgent)
    };

    let endpoint: Arc<dyn SynthesisEndpoint> = if config.synthesis.is_enabled() {
        Arc::new(HttpSynthesisEndpoint::new(&config.synthesis)?)
    } else {
        tracing::warn!("synthesis.endpoint_url is empty; replies will have no audio");
        Arc::new(UnconfiguredSynthesis)
    };

    let trigger: Arc<dyn AnalysisTrigger> = if config.analysis.is_enabled() {
        Arc::new(HttpAnalysisTrigger::new(&config.analysis)?)
    } else {
        Arc::new(LoggingAnalysisTrigger)
    };

    let logs = LogStore::new(objects.clone(), config.storage.log_bucket.clone());
    let finisher = SessionFinisher::new(Arc::new(StoreMerger::new(logs.clone())), trigger);
    let synthesizer = SpeechSynthesizer::new(endpoint, signer.clone(), config.synthesis.clone());

    Ok(AppState {
        orchestrator: Orchestrator::new(AgentClient::new(runtime), synthesizer, logs, finisher),
        signer,
        objects,
    })
}
