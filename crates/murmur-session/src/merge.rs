use crate::error::SessionError;
use async_trait::async_trait;
use murmur_storage::{LogStore, StorageError};
use murmur_types::{summary_key, LogRecord, SessionId, SummaryRecord};

/// Location of a written summary object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryLocation {
    pub bucket: String,
    pub key: String,
    pub turn_count: usize,
    pub skipped_records: usize,
}

/// Collapses a session's per-turn log records into a single summary.
#[async_trait]
pub trait SessionMerger: Send + Sync {
    async fn merge(&self, session_id: &SessionId) -> Result<SummaryLocation, SessionError>;
}

/// Merger that reads records from a [`LogStore`] and writes the summary
/// back into the same bucket under `summaries/<sessionId>/summary.json`.
#[derive(Debug, Clone)]
pub struct StoreMerger {
    logs: LogStore,
}

impl StoreMerger {
    pub fn new(logs: LogStore) -> Self {
        Self { logs }
    }

    async fn load_turns(
        &self,
        session_id: &SessionId,
    ) -> Result<(Vec<(String, LogRecord)>, usize), SessionError> {
        let keys = self.logs.session_keys(session_id).await?;
        let mut turns = Vec::with_capacity(keys.len());
        let mut skipped = 0;

        for key in keys {
            match self.logs.read_record(&key).await {
                Ok(record) => turns.push((key, record)),
                Err(StorageError::Serialization(e)) => {
                    tracing::warn!(session_id = %session_id, key = %key, error = %e, "skipping invalid log record");
                    skipped += 1;
                }
                // Deleted between listing and reading.
                Err(StorageError::NotFound { .. }) => {
                    tracing::warn!(session_id = %session_id, key = %key, "log record vanished during merge");
                    skipped += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }

        Ok((turns, skipped))
    }
}

#[async_trait]
impl SessionMerger for StoreMerger {
    async fn merge(&self, session_id: &SessionId) -> Result<SummaryLocation, SessionError> {
        let (turns, skipped) = self.load_turns(session_id).await?;
        let summary = SummaryRecord::from_turns(session_id.clone(), turns, skipped);

        let key = summary_key(session_id);
        let body = serde_json::to_vec(&summary).map_err(StorageError::from)?;
        self.logs
            .object_store()
            .put_object(self.logs.bucket(), &key, body, "application/json")
            .await?;

        tracing::info!(
            session_id = %session_id,
            key = %key,
            turn_count = summary.turn_count,
            skipped_records = skipped,
            "session logs merged"
        );

        Ok(SummaryLocation {
            bucket: self.logs.bucket().to_string(),
            key,
            turn_count: summary.turn_count,
            skipped_records: skipped,
        })
    }
}
