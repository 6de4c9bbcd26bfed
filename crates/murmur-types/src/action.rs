//! Inbound action requests and their response bodies.
//!
//! Requests arrive as loosely-typed JSON (`{action, sessionId?, message?}`)
//! and are converted into a validated [`ActionRequest`] before dispatch, so
//! handlers never see a malformed payload.

use crate::session::{InvalidSessionId, SessionId};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// The four actions the router recognises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    InvokeAgent,
    LogConversation,
    EndSession,
    DeleteSession,
}

impl Action {
    /// Returns the canonical wire name of this action.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InvokeAgent => "invoke_agent",
            Self::LogConversation => "log_conversation",
            Self::EndSession => "end_session",
            Self::DeleteSession => "delete_session",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = UnknownAction;

    /// Matches case-insensitively, ignoring surrounding whitespace.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "invoke_agent" => Ok(Self::InvokeAgent),
            "log_conversation" => Ok(Self::LogConversation),
            "end_session" => Ok(Self::EndSession),
            "delete_session" => Ok(Self::DeleteSession),
            _ => Err(UnknownAction(s.to_string())),
        }
    }
}

/// Error returned when parsing an unrecognised action string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown action: {0:?}")]
pub struct UnknownAction(pub String);

/// The request body exactly as received, before validation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawActionRequest {
    #[serde(default)]
    pub action: String,
    #[serde(rename = "sessionId", default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// A validated request, one variant per action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionRequest {
    InvokeAgent { session_id: SessionId, message: String },
    LogConversation { session_id: SessionId, message: String },
    EndSession { session_id: SessionId },
    DeleteSession { session_id: SessionId },
}

/// Reasons a request body is rejected before dispatch.
#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error("Unknown action")]
    UnknownAction(#[from] UnknownAction),

    #[error("malformed request body: {0}")]
    Malformed(String),

    #[error(transparent)]
    InvalidSessionId(#[from] InvalidSessionId),

    #[error("message is required for {0}")]
    MissingMessage(Action),
}

impl ActionRequest {
    /// Parses and validates a request body.
    ///
    /// Accepts either the request object itself or a gateway envelope whose
    /// `body` field holds the request as a JSON string.
    pub fn from_json(bytes: &[u8]) -> Result<Self, RequestError> {
        let mut value: Value =
            serde_json::from_slice(bytes).map_err(|e| RequestError::Malformed(e.to_string()))?;

        if let Some(obj) = value.as_object() {
            if !obj.contains_key("action") {
                if let Some(Value::String(inner)) = obj.get("body") {
                    value = serde_json::from_str(inner)
                        .map_err(|e| RequestError::Malformed(format!("envelope body: {}", e)))?;
                }
            }
        }

        if !value.is_object() {
            return Err(RequestError::Malformed(
                "request body must be a JSON object".to_string(),
            ));
        }

        let raw: RawActionRequest =
            serde_json::from_value(value).map_err(|e| RequestError::Malformed(e.to_string()))?;
        Self::try_from(raw)
    }

    pub fn action(&self) -> Action {
        match self {
            Self::InvokeAgent { .. } => Action::InvokeAgent,
            Self::LogConversation { .. } => Action::LogConversation,
            Self::EndSession { .. } => Action::EndSession,
            Self::DeleteSession { .. } => Action::DeleteSession,
        }
    }

    pub fn session_id(&self) -> &SessionId {
        match self {
            Self::InvokeAgent { session_id, .. }
            | Self::LogConversation { session_id, .. }
            | Self::EndSession { session_id }
            | Self::DeleteSession { session_id } => session_id,
        }
    }
}

impl TryFrom<RawActionRequest> for ActionRequest {
    type Error = RequestError;

    fn try_from(raw: RawActionRequest) -> Result<Self, Self::Error> {
        let action: Action = raw.action.parse()?;

        // A blank id is treated the same as a missing one.
        let session_id = match raw.session_id.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() => SessionId::parse(id)?,
            _ => SessionId::generate(),
        };
        let message = raw.message.unwrap_or_default();

        Ok(match action {
            Action::InvokeAgent => {
                if message.trim().is_empty() {
                    return Err(RequestError::MissingMessage(action));
                }
                Self::InvokeAgent { session_id, message }
            }
            Action::LogConversation => Self::LogConversation { session_id, message },
            Action::EndSession => Self::EndSession { session_id },
            Action::DeleteSession => Self::DeleteSession { session_id },
        })
    }
}

/// Response body for `invoke_agent`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvokeAgentResponse {
    pub reply: String,
    pub session_id: SessionId,
    /// Signed download link for the synthesized audio; `null` when synthesis failed.
    pub audio_url: Option<String>,
    pub audio_status: String,
}

/// Response body for actions that only report completion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
