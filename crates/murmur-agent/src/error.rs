use thiserror::Error;

#[derive(Error, Debug)]
pub enum AgentError {
    #[error("agent endpoint is not configured")]
    NotConfigured,

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("agent request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("agent returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The agent reported a failure inside the completion stream.
    #[error("agent {kind}: {message}")]
    Remote { kind: String, message: String },

    #[error("malformed completion event: {0}")]
    MalformedEvent(String),

    #[error("agent reply is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),
}
