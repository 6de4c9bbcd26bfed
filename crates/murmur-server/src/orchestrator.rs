//! Action handlers behind `POST /api/actions`.

use murmur_agent::{AgentClient, AgentError};
use murmur_session::{SessionError, SessionFinisher};
use murmur_storage::{LogStore, PurgeReport, StorageError};
use murmur_types::{InvokeAgentResponse, LogRecord, SessionId, MANUAL_LOG_REPLY};
use murmur_voice::SpeechSynthesizer;
use thiserror::Error;

/// Failure of one of the collaborators an action depends on.
#[derive(Debug, Error)]
pub enum ActionError {
    #[error(transparent)]
    Agent(#[from] AgentError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Session(#[from] SessionError),
}

/// Wires the agent, speech synthesis, log store and session finisher
/// together, one method per action.
#[derive(Debug, Clone)]
pub struct Orchestrator {
    agent: AgentClient,
    synthesizer: SpeechSynthesizer,
    logs: LogStore,
    finisher: SessionFinisher,
}

impl Orchestrator {
    pub fn new(
        agent: AgentClient,
        synthesizer: SpeechSynthesizer,
        logs: LogStore,
        finisher: SessionFinisher,
    ) -> Self {
        Self {
            agent,
            synthesizer,
            logs,
            finisher,
        }
    }

    pub fn logs(&self) -> &LogStore {
        &self.logs
    }

    /// Asks the agent, voices the reply and records the turn.
    ///
    /// A synthesis failure only clears the audio URL; agent and log store
    /// failures fail the action.
    pub async fn invoke_agent(
        &self,
        session_id: SessionId,
        message: &str,
    ) -> Result<InvokeAgentResponse, ActionError> {
        let reply = self.agent.ask(&session_id, message).await?;
        let audio = self
            .synthesizer
            .synthesize(&reply, Some(&session_id), None)
            .await;

        self.logs
            .append(&LogRecord::new(session_id.clone(), message, reply.clone()))
            .await?;

        Ok(InvokeAgentResponse {
            reply,
            session_id,
            audio_url: audio.audio_url,
            audio_status: audio.status.as_str().to_string(),
        })
    }

    /// Records a turn typed by the user without consulting the agent.
    pub async fn log_conversation(
        &self,
        session_id: SessionId,
        message: &str,
    ) -> Result<String, ActionError> {
        let record = LogRecord::new(session_id, message, MANUAL_LOG_REPLY);
        Ok(self.logs.append(&record).await?)
    }

    /// Merges the session's logs, then triggers analysis.
    pub async fn end_session(&self, session_id: &SessionId) -> Result<(), ActionError> {
        self.finisher.end(session_id).await?;
        Ok(())
    }

    /// Deletes every log record of the session.
    pub async fn delete_session(&self, session_id: &SessionId) -> Result<PurgeReport, ActionError> {
        Ok(self.logs.delete_session(session_id).await?)
    }
}
