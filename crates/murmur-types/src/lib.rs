//! Shared types for the Murmur conversation service.
//!
//! This crate provides the foundational types used across all Murmur crates:
//! session identifiers, the per-turn log record and merged summary record
//! persisted to object storage, the validated action requests accepted by the
//! router, and the response bodies it returns.
//!
//! It also owns the object key layout, so every crate that reads or writes
//! session data agrees on where it lives:
//!
//! | Object | Key |
//! |--------|-----|
//! | Per-turn log record | `logs/<sessionId>/<uuid>.json` |
//! | Synthesized audio | `audio/<sessionId>/<YYYYmmddHHMMSS>.wav` |
//! | Session summary | `summaries/<sessionId>/summary.json` |

mod action;
mod record;
mod session;

pub use action::{
    Action, ActionRequest, InvokeAgentResponse, MessageResponse, RawActionRequest, RequestError,
    UnknownAction,
};
pub use record::{LogRecord, SummaryRecord, MANUAL_LOG_REPLY};
pub use session::{InvalidSessionId, SessionId};

/// Returns the key prefix under which all log records of a session live.
pub fn log_prefix(session_id: &SessionId) -> String {
    format!("logs/{}/", session_id)
}

/// Returns a fresh, unique log record key for the session.
pub fn new_log_key(session_id: &SessionId) -> String {
    format!("{}{}.json", log_prefix(session_id), uuid::Uuid::new_v4())
}

/// Returns the key of the merged summary object for the session.
pub fn summary_key(session_id: &SessionId) -> String {
    format!("summaries/{}/summary.json", session_id)
}
