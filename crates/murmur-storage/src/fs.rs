//! Filesystem-backed object store.
//!
//! Objects are plain files at `<root>/<bucket>/<key>`, with `/` in keys
//! mapped to directories. Content types are not persisted; they are derived
//! from the key's extension on read.

use crate::error::StorageError;
use crate::object_store::{
    effective_cursor, page_from_sorted, validate_bucket, validate_key, ListPage, ObjectStore,
    StoredObject, MAX_KEYS_PER_REQUEST,
};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Object store rooted at a local directory.
#[derive(Debug, Clone)]
pub struct FsObjectStore {
    root: PathBuf,
}

impl FsObjectStore {
    /// Creates a store rooted at `root`. The directory is created lazily on
    /// first write.
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn object_path(&self, bucket: &str, key: &str) -> Result<PathBuf, StorageError> {
        validate_bucket(bucket)?;
        validate_key(key)?;
        let mut path = self.root.join(bucket);
        path.extend(key.split('/'));
        Ok(path)
    }

    /// Directory holding every object whose key starts with `prefix`.
    ///
    /// Only the whole segments before the prefix's last `/` narrow the walk;
    /// a trailing partial segment is matched by filtering.
    fn listing_root(&self, bucket: &str, prefix: &str) -> PathBuf {
        let mut dir = self.root.join(bucket);
        if let Some((dirs, _)) = prefix.rsplit_once('/') {
            if validate_key(dirs).is_ok() {
                dir.extend(dirs.split('/'));
            }
        }
        dir
    }

    /// Collects every key under `prefix`'s directory, unsorted and unfiltered.
    async fn keys_under(&self, bucket: &str, prefix: &str) -> Result<Vec<String>, StorageError> {
        validate_bucket(bucket)?;
        let bucket_dir = self.root.join(bucket);
        let mut keys = Vec::new();
        let mut pending = vec![self.listing_root(bucket, prefix)];

        while let Some(dir) = pending.pop() {
            let mut entries = match tokio::fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => return Err(StorageError::Io(e)),
            };
            while let Some(entry) = entries.next_entry().await? {
                let path = entry.path();
                if entry.file_type().await?.is_dir() {
                    pending.push(path);
                    continue;
                }
                let Ok(relative) = path.strip_prefix(&bucket_dir) else {
                    continue;
                };
                let segments: Option<Vec<&str>> =
                    relative.components().map(|c| c.as_os_str().to_str()).collect();
                match segments {
                    Some(segments) => keys.push(segments.join("/")),
                    None => tracing::warn!(path = %path.display(), "skipping non-UTF-8 object path"),
                }
            }
        }

        Ok(keys)
    }

    /// Removes now-empty directories between `path` and the bucket directory.
    async fn prune_empty_parents(&self, bucket: &str, path: &Path) {
        let bucket_dir = self.root.join(bucket);
        let mut current = path.parent();
        while let Some(dir) = current {
            if dir == bucket_dir || !dir.starts_with(&bucket_dir) {
                break;
            }
            // Fails on non-empty directories, which ends the climb.
            if tokio::fs::remove_dir(dir).await.is_err() {
                break;
            }
            current = dir.parent();
        }
    }
}

fn content_type_for(key: &str) -> &'static str {
    match key.rsplit('.').next() {
        Some("json") => "application/json",
        Some("wav") => "audio/wav",
        Some("txt") => "text/plain",
        _ => "application/octet-stream",
    }
}

#[async_trait]
impl ObjectStore for FsObjectStore {
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        _content_type: &str,
    ) -> Result<(), StorageError> {
        let path = self.object_path(bucket, key)?;
        let Some(parent) = path.parent() else {
            return Err(StorageError::InvalidKey(key.to_string()));
        };
        tokio::fs::create_dir_all(parent).await?;
        match tokio::fs::write(&path, &body).await {
            // A concurrent delete pruned the directory; recreate it once.
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tokio::fs::create_dir_all(parent).await?;
                tokio::fs::write(&path, &body).await?;
            }
            result => result?,
        }
        Ok(())
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<StoredObject, StorageError> {
        let path = self.object_path(bucket, key)?;
        match tokio::fs::read(&path).await {
            Ok(body) => Ok(StoredObject {
                body,
                content_type: content_type_for(key).to_string(),
            }),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(StorageError::NotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            }),
            Err(e) => Err(StorageError::Io(e)),
        }
    }

    async fn list_objects(
        &self,
        bucket: &str,
        prefix: &str,
        continuation_token: Option<&str>,
        max_keys: usize,
    ) -> Result<ListPage, StorageError> {
        let cursor = effective_cursor(prefix, continuation_token);
        let mut keys: Vec<String> = self
            .keys_under(bucket, prefix)
            .await?
            .into_iter()
            .filter(|key| key.starts_with(prefix))
            .filter(|key| cursor.map_or(true, |c| key.as_str() > c))
            .collect();
        keys.sort_unstable();
        Ok(page_from_sorted(keys, max_keys))
    }

    async fn delete_objects(&self, bucket: &str, keys: &[String]) -> Result<usize, StorageError> {
        if keys.len() > MAX_KEYS_PER_REQUEST {
            return Err(StorageError::BatchTooLarge(keys.len()));
        }
        let mut deleted = 0;
        let mut paths = Vec::with_capacity(keys.len());
        for key in keys {
            let path = self.object_path(bucket, key)?;
            match tokio::fs::remove_file(&path).await {
                Ok(()) => deleted += 1,
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(StorageError::Io(e)),
            }
            paths.push(path);
        }
        for path in &paths {
            self.prune_empty_parents(bucket, path).await;
        }
        Ok(deleted)
    }
}
