use crate::error::AgentError;
use crate::runtime::{AgentRuntime, CompletionEvent};
use futures_util::StreamExt;
use murmur_types::SessionId;
use std::sync::Arc;
use tracing::{debug, info};

/// Reassembles streamed agent completions into whole replies.
#[derive(Clone)]
pub struct AgentClient {
    runtime: Arc<dyn AgentRuntime>,
}

impl AgentClient {
    pub fn new(runtime: Arc<dyn AgentRuntime>) -> Self {
        Self { runtime }
    }

    /// Sends `message` to the agent and returns the full reply.
    ///
    /// Chunk bytes are concatenated in arrival order and decoded once at the
    /// end, so a multi-byte character split across chunks survives intact.
    /// There is no bound on reply length.
    pub async fn ask(&self, session_id: &SessionId, message: &str) -> Result<String, AgentError> {
        info!(session_id = %session_id, input_len = message.len(), "forwarding message to agent");

        let mut events = self.runtime.invoke(session_id, message).await?;
        let mut reply = Vec::new();
        let mut chunks = 0usize;

        while let Some(event) = events.next().await {
            match event? {
                CompletionEvent::Chunk(bytes) => {
                    reply.extend_from_slice(&bytes);
                    chunks += 1;
                }
                CompletionEvent::Other { kind, .. } => {
                    debug!(session_id = %session_id, kind = %kind, "ignoring non-chunk agent event");
                }
            }
        }

        let reply = String::from_utf8(reply)?;
        info!(
            session_id = %session_id,
            chunks,
            reply_len = reply.len(),
            "agent reply received"
        );
        Ok(reply)
    }
}

impl std::fmt::Debug for AgentClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentClient").finish_non_exhaustive()
    }
}
