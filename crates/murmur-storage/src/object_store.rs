//! The object store abstraction shared by all backends.

use crate::error::StorageError;
use async_trait::async_trait;

/// Maximum number of keys returned by one list call or accepted by one
/// batch delete.
pub const MAX_KEYS_PER_REQUEST: usize = 1000;

/// An object body together with its content type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub body: Vec<u8>,
    pub content_type: String,
}

/// One page of a prefix listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListPage {
    /// Matching keys in lexicographic order.
    pub keys: Vec<String>,
    /// Cursor for the next page; `None` once the listing is exhausted.
    pub next_continuation_token: Option<String>,
}

impl ListPage {
    pub fn is_truncated(&self) -> bool {
        self.next_continuation_token.is_some()
    }
}

/// Bucket/key object storage.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Writes an object, replacing any existing object at the same key.
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StorageError>;

    /// Reads an object.
    ///
    /// Returns `StorageError::NotFound` if no object exists at the key.
    async fn get_object(&self, bucket: &str, key: &str) -> Result<StoredObject, StorageError>;

    /// Lists keys starting with `prefix`.
    ///
    /// Pass the previous page's `next_continuation_token` to continue.
    /// `max_keys` is clamped to `1..=MAX_KEYS_PER_REQUEST`.
    async fn list_objects(
        &self,
        bucket: &str,
        prefix: &str,
        continuation_token: Option<&str>,
        max_keys: usize,
    ) -> Result<ListPage, StorageError>;

    /// Deletes the named objects in one call and returns how many existed.
    ///
    /// Keys that do not exist are ignored. Returns
    /// `StorageError::BatchTooLarge` for more than `MAX_KEYS_PER_REQUEST` keys.
    async fn delete_objects(&self, bucket: &str, keys: &[String]) -> Result<usize, StorageError>;
}

/// Builds a page from keys that are already sorted and filtered to the
/// prefix and cursor.
pub(crate) fn page_from_sorted<I, S>(keys: I, max_keys: usize) -> ListPage
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let max_keys = max_keys.clamp(1, MAX_KEYS_PER_REQUEST);
    let mut keys: Vec<String> = keys.into_iter().take(max_keys + 1).map(Into::into).collect();

    let next_continuation_token = if keys.len() > max_keys {
        keys.truncate(max_keys);
        keys.last().cloned()
    } else {
        None
    };

    ListPage {
        keys,
        next_continuation_token,
    }
}

/// Returns the exclusive lower bound for a listing: the cursor if it lies
/// inside the prefix range, otherwise nothing.
pub(crate) fn effective_cursor<'a>(prefix: &str, continuation_token: Option<&'a str>) -> Option<&'a str> {
    continuation_token.filter(|token| *token >= prefix)
}

/// Rejects keys that cannot be mapped to a path safely.
pub(crate) fn validate_key(key: &str) -> Result<(), StorageError> {
    let valid = !key.is_empty()
        && !key.starts_with('/')
        && key
            .split('/')
            .all(|segment| !segment.is_empty() && segment != "." && segment != "..");
    if valid {
        Ok(())
    } else {
        Err(StorageError::InvalidKey(key.to_string()))
    }
}

pub(crate) fn validate_bucket(bucket: &str) -> Result<(), StorageError> {
    let valid = !bucket.is_empty()
        && bucket != "."
        && bucket != ".."
        && bucket
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if valid {
        Ok(())
    } else {
        Err(StorageError::InvalidKey(format!("bucket {:?}", bucket)))
    }
}
