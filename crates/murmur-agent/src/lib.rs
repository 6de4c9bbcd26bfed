//! Conversational agent client for Murmur.
//!
//! Sends a user message and session identifier to a remote conversational
//! agent and reassembles the streamed reply into one string. The agent
//! itself is an external service; [`AgentRuntime`] is the seam between the
//! transport ([`HttpAgentRuntime`]) and the reassembly logic
//! ([`AgentClient`]), so tests can script a reply stream directly.

pub mod client;
pub mod config;
pub mod error;
pub mod runtime;

pub use client::AgentClient;
pub use config::AgentConfig;
pub use error::AgentError;
pub use runtime::{AgentRuntime, CompletionEvent, CompletionStream, EventDecoder, HttpAgentRuntime};
