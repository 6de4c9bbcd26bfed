use crate::config::AgentConfig;
use crate::error::AgentError;
use async_trait::async_trait;
use base64::Engine;
use futures_util::stream::{self, Stream, StreamExt};
use murmur_types::SessionId;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::pin::Pin;
use std::time::Duration;

/// One event of a streamed agent completion.
#[derive(Debug, Clone, PartialEq)]
pub enum CompletionEvent {
    /// A fragment of the reply text, as raw bytes.
    Chunk(Vec<u8>),
    /// Any other event (traces, return-control requests, ...), keyed by its
    /// top-level field name.
    Other { kind: String, payload: Value },
}

pub type CompletionStream = Pin<Box<dyn Stream<Item = Result<CompletionEvent, AgentError>> + Send>>;

/// Transport to a remote conversational agent.
#[async_trait]
pub trait AgentRuntime: Send + Sync {
    /// Starts a completion for `input_text` within the session and returns
    /// its event stream.
    async fn invoke(
        &self,
        session_id: &SessionId,
        input_text: &str,
    ) -> Result<CompletionStream, AgentError>;
}

/// Incremental decoder for newline-delimited JSON completion events.
///
/// Each line is one event object. Text chunks have the form
/// `{"chunk": {"bytes": "<base64>"}}`; a top-level key ending in
/// `Exception` is an in-stream failure; anything else is passed through as
/// [`CompletionEvent::Other`]. Network reads may split lines anywhere, so
/// partial lines are buffered until their newline arrives.
#[derive(Debug, Default)]
pub struct EventDecoder {
    buffer: Vec<u8>,
}

impl EventDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds raw bytes and returns every event completed by them.
    pub fn push(&mut self, bytes: &[u8]) -> Result<Vec<CompletionEvent>, AgentError> {
        self.buffer.extend_from_slice(bytes);
        let mut events = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            if let Some(event) = decode_line(&line)? {
                events.push(event);
            }
        }
        Ok(events)
    }

    /// Decodes whatever remains after the stream ends without a trailing newline.
    pub fn finish(&mut self) -> Result<Option<CompletionEvent>, AgentError> {
        let rest = std::mem::take(&mut self.buffer);
        decode_line(&rest)
    }
}

fn decode_line(line: &[u8]) -> Result<Option<CompletionEvent>, AgentError> {
    let text = std::str::from_utf8(line)
        .map_err(|e| AgentError::MalformedEvent(format!("event line is not UTF-8: {}", e)))?
        .trim();
    if text.is_empty() {
        return Ok(None);
    }

    let value: Value =
        serde_json::from_str(text).map_err(|e| AgentError::MalformedEvent(e.to_string()))?;
    let Value::Object(map) = value else {
        return Err(AgentError::MalformedEvent(
            "event is not a JSON object".to_string(),
        ));
    };

    if let Some(chunk) = map.get("chunk") {
        let encoded = chunk
            .get("bytes")
            .and_then(Value::as_str)
            .ok_or_else(|| AgentError::MalformedEvent("chunk event without bytes".to_string()))?;
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .map_err(|e| AgentError::MalformedEvent(format!("chunk bytes: {}", e)))?;
        return Ok(Some(CompletionEvent::Chunk(bytes)));
    }

    if let Some((kind, detail)) = map.iter().find(|(k, _)| k.ends_with("Exception")) {
        let message = detail
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| detail.to_string());
        return Err(AgentError::Remote {
            kind: kind.clone(),
            message,
        });
    }

    let kind = map.keys().next().cloned().unwrap_or_default();
    Ok(Some(CompletionEvent::Other {
        kind,
        payload: Value::Object(map),
    }))
}

/// Agent runtime reached over HTTP.
///
/// Request: `POST {endpoint}/agents/{agentId}/agentAliases/{aliasId}/sessions/{sessionId}/text`
/// with body `{"inputText": ...}`. The response body is decoded with
/// [`EventDecoder`] as it arrives.
#[derive(Debug, Clone)]
pub struct HttpAgentRuntime {
    config: AgentConfig,
    http: reqwest::Client,
}

impl HttpAgentRuntime {
    pub fn new(config: AgentConfig) -> Result<Self, AgentError> {
        if !config.is_enabled() {
            return Err(AgentError::NotConfigured);
        }
        if config.agent_id.is_empty() || config.agent_alias_id.is_empty() {
            return Err(AgentError::Config(
                "agent_id and agent_alias_id are required".to_string(),
            ));
        }
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { config, http })
    }

    fn invoke_url(&self, session_id: &SessionId) -> String {
        format!(
            "{}/agents/{}/agentAliases/{}/sessions/{}/text",
            self.config.endpoint.trim_end_matches('/'),
            self.config.agent_id,
            self.config.agent_alias_id,
            session_id
        )
    }
}

struct DecodeState<S> {
    bytes: S,
    decoder: EventDecoder,
    pending: VecDeque<CompletionEvent>,
    finished: bool,
}

#[async_trait]
impl AgentRuntime for HttpAgentRuntime {
    async fn invoke(
        &self,
        session_id: &SessionId,
        input_text: &str,
    ) -> Result<CompletionStream, AgentError> {
        let url = self.invoke_url(session_id);
        tracing::debug!(%url, input_len = input_text.len(), "invoking agent");

        let mut request = self.http.post(&url).json(&json!({ "inputText": input_text }));
        if !self.config.api_key.is_empty() {
            request = request.bearer_auth(&self.config.api_key);
        }
        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AgentError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let state = DecodeState {
            bytes: Box::pin(response.bytes_stream()),
            decoder: EventDecoder::new(),
            pending: VecDeque::new(),
            finished: false,
        };

        let events = stream::unfold(state, |mut st| async move {
            loop {
                if let Some(event) = st.pending.pop_front() {
                    return Some((Ok(event), st));
                }
                if st.finished {
                    return None;
                }
                match st.bytes.next().await {
                    Some(Ok(bytes)) => match st.decoder.push(&bytes) {
                        Ok(events) => st.pending.extend(events),
                        Err(e) => {
                            st.finished = true;
                            return Some((Err(e), st));
                        }
                    },
                    Some(Err(e)) => {
                        st.finished = true;
                        return Some((Err(AgentError::Http(e)), st));
                    }
                    None => {
                        st.finished = true;
                        match st.decoder.finish() {
                            Ok(Some(event)) => st.pending.push_back(event),
                            Ok(None) => {}
                            Err(e) => return Some((Err(e), st)),
                        }
                    }
                }
            }
        });

        Ok(Box::pin(events))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk_line(text: &str) -> String {
        format!(
            "{{\"chunk\":{{\"bytes\":\"{}\"}}}}\n",
            base64::engine::general_purpose::STANDARD.encode(text)
        )
    }

    #[test]
    fn decodes_lines_split_across_reads() {
        let mut decoder = EventDecoder::new();
        let line = chunk_line("hello");
        let (a, b) = line.split_at(10);

        assert!(decoder.push(a.as_bytes()).unwrap().is_empty());
        let events = decoder.push(b.as_bytes()).unwrap();
        assert_eq!(events, vec![CompletionEvent::Chunk(b"hello".to_vec())]);
    }

    #[test]
    fn passes_through_non_chunk_events() {
        let mut decoder = EventDecoder::new();
        let events = decoder
            .push(b"{\"trace\":{\"step\":1}}\n\n")
            .unwrap();
        assert_eq!(events.len(), 1);
        assert!(matches!(&events[0], CompletionEvent::Other { kind, .. } if kind == "trace"));
    }

    #[test]
    fn trailing_line_without_newline_is_decoded_on_finish() {
        let mut decoder = EventDecoder::new();
        let line = chunk_line("tail");
        assert!(decoder.push(line.trim_end().as_bytes()).unwrap().is_empty());
        assert_eq!(
            decoder.finish().unwrap(),
            Some(CompletionEvent::Chunk(b"tail".to_vec()))
        );
        assert_eq!(decoder.finish().unwrap(), None);
    }

    #[test]
    fn exception_events_become_errors() {
        let mut decoder = EventDecoder::new();
        let err = decoder
            .push(b"{\"throttlingException\":{\"message\":\"slow down\"}}\n")
            .unwrap_err();
        match err {
            AgentError::Remote { kind, message } => {
                assert_eq!(kind, "throttlingException");
                assert_eq!(message, "slow down");
            }
            other => panic!("expected Remote error, got {:?}", other),
        }
    }

    #[test]
    fn rejects_garbage() {
        let mut decoder = EventDecoder::new();
        assert!(matches!(
            decoder.push(b"not json\n"),
            Err(AgentError::MalformedEvent(_))
        ));
        let mut decoder = EventDecoder::new();
        assert!(matches!(
            decoder.push(b"{\"chunk\":{}}\n"),
            Err(AgentError::MalformedEvent(_))
        ));
    }

    #[test]
    fn runtime_requires_configuration() {
        assert!(matches!(
            HttpAgentRuntime::new(AgentConfig::default()),
            Err(AgentError::NotConfigured)
        ));
        assert!(matches!(
            HttpAgentRuntime::new(AgentConfig::new("http://agent", "", "")),
            Err(AgentError::Config(_))
        ));
    }

    #[test]
    fn invoke_url_layout() {
        let runtime =
            HttpAgentRuntime::new(AgentConfig::new("http://agent.local/", "AGENT1", "ALIAS1"))
                .unwrap();
        let sid = SessionId::parse("s1").unwrap();
        assert_eq!(
            runtime.invoke_url(&sid),
            "http://agent.local/agents/AGENT1/agentAliases/ALIAS1/sessions/s1/text"
        );
    }
}
