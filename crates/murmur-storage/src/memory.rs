//! In-memory object store.

use crate::error::StorageError;
use crate::object_store::{
    effective_cursor, page_from_sorted, validate_bucket, validate_key, ListPage, ObjectStore,
    StoredObject, MAX_KEYS_PER_REQUEST,
};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;
use std::sync::Arc;
use tokio::sync::RwLock;

type Bucket = BTreeMap<String, StoredObject>;

/// Object store backed by ordered in-process maps.
///
/// Cloning shares the underlying data. Contents are lost when the last clone
/// is dropped.
#[derive(Debug, Clone, Default)]
pub struct MemoryObjectStore {
    buckets: Arc<RwLock<HashMap<String, Bucket>>>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every key in the bucket that starts with `prefix`.
    pub async fn keys(&self, bucket: &str, prefix: &str) -> Vec<String> {
        self.buckets
            .read()
            .await
            .get(bucket)
            .map(|objects| {
                objects
                    .keys()
                    .filter(|key| key.starts_with(prefix))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StorageError> {
        validate_bucket(bucket)?;
        validate_key(key)?;
        self.buckets
            .write()
            .await
            .entry(bucket.to_string())
            .or_default()
            .insert(
                key.to_string(),
                StoredObject {
                    body,
                    content_type: content_type.to_string(),
                },
            );
        Ok(())
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<StoredObject, StorageError> {
        self.buckets
            .read()
            .await
            .get(bucket)
            .and_then(|objects| objects.get(key))
            .cloned()
            .ok_or_else(|| StorageError::NotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            })
    }

    async fn list_objects(
        &self,
        bucket: &str,
        prefix: &str,
        continuation_token: Option<&str>,
        max_keys: usize,
    ) -> Result<ListPage, StorageError> {
        let buckets = self.buckets.read().await;
        let Some(objects) = buckets.get(bucket) else {
            return Ok(ListPage::default());
        };

        let lower = match effective_cursor(prefix, continuation_token) {
            Some(cursor) => Bound::Excluded(cursor),
            None => Bound::Included(prefix),
        };

        let keys = objects
            .range::<str, _>((lower, Bound::Unbounded))
            .map(|(key, _)| key.as_str())
            .take_while(|key| key.starts_with(prefix));

        Ok(page_from_sorted(keys, max_keys))
    }

    async fn delete_objects(&self, bucket: &str, keys: &[String]) -> Result<usize, StorageError> {
        if keys.len() > MAX_KEYS_PER_REQUEST {
            return Err(StorageError::BatchTooLarge(keys.len()));
        }
        let mut buckets = self.buckets.write().await;
        let Some(objects) = buckets.get_mut(bucket) else {
            return Ok(0);
        };
        Ok(keys
            .iter()
            .filter(|key| objects.remove(key.as_str()).is_some())
            .count())
    }
}
