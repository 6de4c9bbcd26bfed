//! Per-turn conversation log records.
//!
//! Each turn is written once, as its own JSON object under
//! `logs/<sessionId>/`. Sessions have no stored representation beyond that
//! prefix, so "all of a session's logs" always means "every key under the
//! prefix", and removing a session means paging through the prefix and
//! deleting what is found.

use crate::error::StorageError;
use crate::object_store::{ObjectStore, MAX_KEYS_PER_REQUEST};
use murmur_types::{log_prefix, new_log_key, LogRecord, SessionId};
use std::sync::Arc;

/// Outcome of deleting a session's log records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PurgeReport {
    /// Number of objects removed.
    pub objects_deleted: usize,
    /// Number of non-empty listing pages processed.
    pub pages: usize,
}

/// Reads and writes log records in a single bucket.
#[derive(Clone)]
pub struct LogStore {
    store: Arc<dyn ObjectStore>,
    bucket: String,
}

impl LogStore {
    pub fn new(store: Arc<dyn ObjectStore>, bucket: impl Into<String>) -> Self {
        Self {
            store,
            bucket: bucket.into(),
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn object_store(&self) -> &Arc<dyn ObjectStore> {
        &self.store
    }

    /// Writes one record under a freshly generated key and returns the key.
    pub async fn append(&self, record: &LogRecord) -> Result<String, StorageError> {
        let key = new_log_key(&record.session_id);
        let body = serde_json::to_vec(record)?;
        self.store
            .put_object(&self.bucket, &key, body, "application/json")
            .await?;
        tracing::info!(
            session_id = %record.session_id,
            bucket = %self.bucket,
            key = %key,
            "conversation turn logged"
        );
        Ok(key)
    }

    /// Returns every key under the session's prefix, in key order.
    pub async fn session_keys(&self, session_id: &SessionId) -> Result<Vec<String>, StorageError> {
        let prefix = log_prefix(session_id);
        let mut keys = Vec::new();
        let mut token: Option<String> = None;

        loop {
            let page = self
                .store
                .list_objects(&self.bucket, &prefix, token.as_deref(), MAX_KEYS_PER_REQUEST)
                .await?;
            keys.extend(page.keys);
            match page.next_continuation_token {
                Some(next) => token = Some(next),
                None => break,
            }
        }

        Ok(keys)
    }

    /// Reads and decodes one record.
    pub async fn read_record(&self, key: &str) -> Result<LogRecord, StorageError> {
        let object = self.store.get_object(&self.bucket, key).await?;
        Ok(serde_json::from_slice(&object.body)?)
    }

    /// Deletes every object under the session's prefix.
    ///
    /// Pages through the listing until the cursor is exhausted, deleting each
    /// page in one batch call. A session without objects is a no-op, not an
    /// error. Keys outside the prefix are never touched.
    pub async fn delete_session(&self, session_id: &SessionId) -> Result<PurgeReport, StorageError> {
        let prefix = log_prefix(session_id);
        let mut report = PurgeReport::default();
        let mut token: Option<String> = None;

        loop {
            let page = self
                .store
                .list_objects(&self.bucket, &prefix, token.as_deref(), MAX_KEYS_PER_REQUEST)
                .await?;

            if page.keys.is_empty() {
                if report.pages == 0 {
                    tracing::warn!(session_id = %session_id, prefix = %prefix, "no log objects found to delete");
                }
                break;
            }

            let deleted = self.store.delete_objects(&self.bucket, &page.keys).await?;
            report.objects_deleted += deleted;
            report.pages += 1;
            tracing::info!(
                session_id = %session_id,
                count = deleted,
                page = report.pages,
                "deleted page of session log objects"
            );

            match page.next_continuation_token {
                Some(next) => token = Some(next),
                None => break,
            }
        }

        tracing::info!(
            session_id = %session_id,
            objects_deleted = report.objects_deleted,
            "session logs deleted"
        );
        Ok(report)
    }
}

impl std::fmt::Debug for LogStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogStore")
            .field("bucket", &self.bucket)
            .finish_non_exhaustive()
    }
}
