//! Object storage for Murmur session data.
//!
//! Every piece of state Murmur keeps lives in an object store addressed by
//! bucket and key. This crate defines the [`ObjectStore`] trait the rest of
//! the workspace programs against, two backends, the HMAC [`UrlSigner`] that
//! produces time-limited download links, and the [`LogStore`] that owns the
//! per-turn log record layout.
//!
//! # Backends
//!
//! | Backend | Use |
//! |---------|-----|
//! | [`MemoryObjectStore`] | tests and throwaway development servers |
//! | [`FsObjectStore`] | single-host deployments; objects are files under `<root>/<bucket>/<key>` |
//!
//! Listing is lexicographic by key and paginated with an opaque continuation
//! token, at most [`MAX_KEYS_PER_REQUEST`] keys per page. Batch deletes accept
//! the same maximum, so one listed page is always deletable in one call.

mod error;
mod fs;
mod log_store;
mod memory;
mod object_store;
mod signer;

pub use error::StorageError;
pub use fs::FsObjectStore;
pub use log_store::{LogStore, PurgeReport};
pub use memory::MemoryObjectStore;
pub use object_store::{ListPage, ObjectStore, StoredObject, MAX_KEYS_PER_REQUEST};
pub use signer::{SignedUrlParams, UrlSigner};
