//! Speech synthesis for Murmur agent replies.
//!
//! Agent replies are rendered to audio by a remote synthesis endpoint that
//! conditions on a fixed reference voice and writes the waveform straight
//! into object storage. This crate builds the endpoint request, picks the
//! output key, and hands back a time-limited signed URL for the result.
//!
//! Synthesis is best-effort: [`SpeechSynthesizer::synthesize`] never fails.
//! Any error is reported inside the returned [`SynthesisOutcome`] with a
//! `null` audio URL, so a broken voice pipeline never hides the text reply.

pub mod config;
pub mod error;
pub mod tts;

pub use config::SynthesisConfig;
pub use error::VoiceError;
pub use tts::{
    default_output_key, HttpSynthesisEndpoint, SpeechSynthesizer, SynthesisEndpoint,
    SynthesisOutcome, SynthesisRequest, SynthesisStatus,
};
