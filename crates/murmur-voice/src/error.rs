use thiserror::Error;

#[derive(Error, Debug)]
pub enum VoiceError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("TTS error: {0}")]
    Tts(String),

    #[error("synthesis request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("synthesis endpoint returned HTTP {status}: {body}")]
    Endpoint { status: u16, body: String },

    #[error("audio url signing failed: {0}")]
    Signing(#[from] murmur_storage::StorageError),
}
