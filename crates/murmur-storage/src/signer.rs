//! Time-limited signed download URLs.
//!
//! URL format: `{base}/objects/<bucket>/<key>?expires=<unix_secs>&signature=<hex>`
//! where the signature is `HMAC-SHA256(secret, "GET\n<bucket>\n<key>\n<expires>")`.
//! The server's object route verifies the signature and expiry before
//! serving the object, so a URL grants read access to exactly one object
//! until it expires.

use crate::error::StorageError;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use url::Url;

type HmacSha256 = Hmac<Sha256>;

/// Query parameters carried by a signed URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedUrlParams {
    pub expires: u64,
    pub signature: String,
}

/// Produces and verifies signed object URLs.
#[derive(Clone)]
pub struct UrlSigner {
    secret: Vec<u8>,
    base_url: Url,
}

impl fmt::Debug for UrlSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UrlSigner")
            .field("secret", &"[REDACTED]")
            .field("base_url", &self.base_url.as_str())
            .finish()
    }
}

fn now_unix() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

impl UrlSigner {
    /// Creates a signer for URLs rooted at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Signature` if the secret is empty or the base
    /// URL cannot carry a path.
    pub fn new(secret: impl AsRef<[u8]>, base_url: &str) -> Result<Self, StorageError> {
        let secret = secret.as_ref().to_vec();
        if secret.is_empty() {
            return Err(StorageError::Signature("signing secret is empty".to_string()));
        }
        let base_url = Url::parse(base_url)
            .map_err(|e| StorageError::Signature(format!("invalid base url {:?}: {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(StorageError::Signature(format!(
                "base url cannot carry a path: {}",
                base_url
            )));
        }
        Ok(Self { secret, base_url })
    }

    /// Signs a GET URL for the object, valid for `expires_in` from now.
    ///
    /// Lifetimes past the end of the `u64` clock are clamped to it.
    pub fn presign_get(
        &self,
        bucket: &str,
        key: &str,
        expires_in: Duration,
    ) -> Result<String, StorageError> {
        self.presign_get_until(bucket, key, now_unix().saturating_add(expires_in.as_secs()))
    }

    /// Signs a GET URL for the object that expires at the given unix time.
    pub fn presign_get_until(
        &self,
        bucket: &str,
        key: &str,
        expires: u64,
    ) -> Result<String, StorageError> {
        let signature = hex::encode(self.mac(bucket, key, expires)?.finalize().into_bytes());

        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| StorageError::Signature("base url cannot carry a path".to_string()))?
            .pop_if_empty()
            .push("objects")
            .push(bucket)
            .extend(key.split('/'));
        url.query_pairs_mut()
            .append_pair("expires", &expires.to_string())
            .append_pair("signature", &signature);
        Ok(url.into())
    }

    /// Checks a signature presented for the object.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Signature` if the signature does not match or
    /// the URL has expired.
    pub fn verify(
        &self,
        bucket: &str,
        key: &str,
        params: &SignedUrlParams,
    ) -> Result<(), StorageError> {
        let provided = hex::decode(&params.signature)
            .map_err(|_| StorageError::Signature("signature is not hex".to_string()))?;
        self.mac(bucket, key, params.expires)?
            .verify_slice(&provided)
            .map_err(|_| StorageError::Signature("signature mismatch".to_string()))?;

        if now_unix() > params.expires {
            return Err(StorageError::Signature("url has expired".to_string()));
        }
        Ok(())
    }

    fn mac(&self, bucket: &str, key: &str, expires: u64) -> Result<HmacSha256, StorageError> {
        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .map_err(|e| StorageError::Signature(format!("invalid signing key: {}", e)))?;
        mac.update(format!("GET\n{}\n{}\n{}", bucket, key, expires).as_bytes());
        Ok(mac)
    }
}
