//! Log and summary records persisted to object storage.

use crate::session::SessionId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Agent reply recorded for turns logged without calling the agent.
pub const MANUAL_LOG_REPLY: &str = "手動紀錄";

/// One conversation turn, written once and never modified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogRecord {
    /// UTC time at which the record was written.
    pub timestamp: DateTime<Utc>,
    pub session_id: SessionId,
    pub user_input: String,
    pub agent_reply: String,
}

impl LogRecord {
    /// Creates a record stamped with the current UTC time.
    pub fn new(
        session_id: SessionId,
        user_input: impl Into<String>,
        agent_reply: impl Into<String>,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            session_id,
            user_input: user_input.into(),
            agent_reply: agent_reply.into(),
        }
    }
}

/// All turns of a session collapsed into one object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryRecord {
    pub session_id: SessionId,
    pub turn_count: usize,
    /// Timestamp of the earliest turn, if any.
    pub started_at: Option<DateTime<Utc>>,
    /// Timestamp of the latest turn, if any.
    pub ended_at: Option<DateTime<Utc>>,
    pub merged_at: DateTime<Utc>,
    /// Objects under the session prefix that were not valid log records.
    pub skipped_records: usize,
    pub turns: Vec<LogRecord>,
}

impl SummaryRecord {
    /// Builds a summary from `(key, record)` pairs.
    ///
    /// Turns are ordered by timestamp; records written in the same instant
    /// keep key order.
    pub fn from_turns(
        session_id: SessionId,
        mut turns: Vec<(String, LogRecord)>,
        skipped_records: usize,
    ) -> Self {
        turns.sort_by(|(ka, a), (kb, b)| a.timestamp.cmp(&b.timestamp).then_with(|| ka.cmp(kb)));
        let turns: Vec<LogRecord> = turns.into_iter().map(|(_, record)| record).collect();
        Self {
            session_id,
            turn_count: turns.len(),
            started_at: turns.first().map(|t| t.timestamp),
            ended_at: turns.last().map(|t| t.timestamp),
            merged_at: Utc::now(),
            skipped_records,
            turns,
        }
    }
}
