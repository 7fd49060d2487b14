//! Internal implementation of [`UniqueId`].

use crate::{IdError, IdResult};
use std::{fmt, str::FromStr};

/// Maximum identifier length accepted by the backend.
pub const MAX_ID_LEN: usize = 36;

/// A validated backend identifier.
///
/// # Construction
/// - [`UniqueId::generate`] allocates a new identifier for create operations.
/// - [`UniqueId::parse`] validates an externally supplied identifier.
///
/// # Display format
/// Displays exactly the validated string.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct UniqueId(String);

impl UniqueId {
    /// Generates a new identifier in 32-character lowercase hex form.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().simple().to_string())
    }

    /// Validates and wraps an identifier string.
    ///
    /// # Errors
    ///
    /// Returns [`IdError::InvalidInput`] if `input` is empty, longer than [`MAX_ID_LEN`],
    /// contains characters outside `a-zA-Z0-9._-`, or starts with `.`, `-` or `_`.
    pub fn parse(input: &str) -> IdResult<Self> {
        if Self::is_valid(input) {
            return Ok(Self(input.to_owned()));
        }
        Err(IdError::InvalidInput(format!(
            "identifier must be 1-{} characters of a-z, A-Z, 0-9, '.', '-', '_' and must not start with a special character, got: '{}'",
            MAX_ID_LEN, input
        )))
    }

    /// Returns true if `input` satisfies the backend identifier rules.
    pub fn is_valid(input: &str) -> bool {
        let bytes = input.as_bytes();
        let Some(first) = bytes.first() else {
            return false;
        };

        bytes.len() <= MAX_ID_LEN
            && first.is_ascii_alphanumeric()
            && bytes
                .iter()
                .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'.' | b'-' | b'_'))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UniqueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for UniqueId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for UniqueId {
    type Err = IdError;

    /// Equivalent to calling [`UniqueId::parse`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        UniqueId::parse(s)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for UniqueId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        UniqueId::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_produces_32_lowercase_hex() {
        let id = UniqueId::generate();
        let s = id.as_str();

        assert_eq!(s.len(), 32);
        assert!(s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')));
        assert!(UniqueId::is_valid(s));
    }

    #[test]
    fn test_generate_is_unique() {
        assert_ne!(UniqueId::generate(), UniqueId::generate());
    }

    #[test]
    fn test_parse_accepts_backend_assigned_ids() {
        for input in ["64a1f2c3e4b5d6", "user.1", "Patient_01-a", "a"] {
            let id = UniqueId::parse(input).expect("parse should succeed");
            assert_eq!(id.as_str(), input);
        }
    }

    #[test]
    fn test_parse_rejects_empty() {
        assert!(UniqueId::parse("").is_err());
    }

    #[test]
    fn test_parse_rejects_leading_special_character() {
        for input in ["_abc", "-abc", ".abc"] {
            let result = UniqueId::parse(input);
            match result {
                Err(IdError::InvalidInput(msg)) => {
                    assert!(msg.contains("must not start with a special character"));
                }
                _ => panic!("Expected InvalidInput error for {input}"),
            }
        }
    }

    #[test]
    fn test_parse_rejects_too_long() {
        let input = "a".repeat(MAX_ID_LEN + 1);
        assert!(UniqueId::parse(&input).is_err());
        assert!(UniqueId::parse(&"a".repeat(MAX_ID_LEN)).is_ok());
    }

    #[test]
    fn test_parse_rejects_invalid_characters() {
        for input in ["abc/def", "abc def", "abc?x", "ünïcode"] {
            assert!(UniqueId::parse(input).is_err(), "{input} should be rejected");
        }
    }

    #[test]
    fn test_from_str_matches_parse() {
        let id: UniqueId = "abc123".parse().expect("from_str should succeed");
        assert_eq!(id, UniqueId::parse("abc123").unwrap());
    }

    #[test]
    fn test_serde_round_trip_is_transparent() {
        let id = UniqueId::parse("abc123").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"abc123\"");

        let bad: Result<UniqueId, _> = serde_json::from_str("\"_bad\"");
        assert!(bad.is_err());
    }
}
