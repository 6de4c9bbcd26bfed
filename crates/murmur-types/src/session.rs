//! Session identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Opaque identifier of a conversation session.
///
/// Identifiers are 1 to [`SessionId::MAX_LEN`] characters drawn from
/// `[A-Za-z0-9._:-]`. Excluding `/` keeps every session's key prefix disjoint
/// from every other session's.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SessionId(String);

impl SessionId {
    /// Maximum identifier length accepted by the agent runtime.
    pub const MAX_LEN: usize = 100;

    /// Generates a fresh random identifier (UUID v4).
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Validates a caller-supplied identifier.
    pub fn parse(value: impl Into<String>) -> Result<Self, InvalidSessionId> {
        let value = value.into();
        if value.is_empty() || value.len() > Self::MAX_LEN {
            return Err(InvalidSessionId(value));
        }
        let allowed = |c: char| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | ':' | '-');
        if !value.chars().all(allowed) || value == "." || value == ".." {
            return Err(InvalidSessionId(value));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SessionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for SessionId {
    type Err = InvalidSessionId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for SessionId {
    type Error = InvalidSessionId;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<SessionId> for String {
    fn from(id: SessionId) -> Self {
        id.0
    }
}

/// Error returned when a session identifier fails validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid session id: {0:?}")]
pub struct InvalidSessionId(pub String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_agent_runtime_charset() {
        for id in ["s1", "abc-DEF_123", "2026.10.19:session", "a"] {
            assert!(SessionId::parse(id).is_ok(), "{id} should be valid");
        }
    }

    #[test]
    fn rejects_path_like_and_oversized_ids() {
        let too_long = "x".repeat(SessionId::MAX_LEN + 1);
        for id in ["", "s1/other", "..", ".", "has space", "ünïcode", too_long.as_str()] {
            assert!(SessionId::parse(id).is_err(), "{id:?} should be rejected");
        }
    }

    #[test]
    fn generated_ids_are_valid_and_distinct() {
        let a = SessionId::generate();
        let b = SessionId::generate();
        assert_ne!(a, b);
        assert!(SessionId::parse(a.as_str()).is_ok());
    }

    #[test]
    fn deserialization_validates() {
        let ok: SessionId = serde_json::from_str("\"s1\"").unwrap();
        assert_eq!(ok.as_str(), "s1");
        assert!(serde_json::from_str::<SessionId>("\"a/b\"").is_err());
    }
}
