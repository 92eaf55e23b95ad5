//! # Credential Identifiers
//!
//! The credential ID is the public, unguessable key a third party uses to
//! verify a certificate. It is the only identifier ever shown outside the
//! registry; the internal UUID never leaves the management surface.
//!
//! ## Format
//!
//! Freshly generated IDs are `CRED-` followed by 32 lowercase hex characters
//! (128 bits drawn from the operating system CSPRNG). At that width a
//! brute-force walk over the public verification endpoint is hopeless even
//! without rate limiting.
//!
//! Stored IDs are only required to be URL-safe (`[A-Za-z0-9_-]`, at most
//! [`MAX_CREDENTIAL_ID_LEN`] characters), so that records issued under an
//! earlier format keep resolving.

use rand_core::{OsRng, RngCore};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Prefix carried by every generated credential ID.
pub const CREDENTIAL_PREFIX: &str = "CRED-";

/// Upper bound on the length of any credential ID.
///
/// Lookups for longer strings can be answered "not found" without a store
/// round-trip, since no stored ID can match.
pub const MAX_CREDENTIAL_ID_LEN: usize = 128;

/// Number of random bytes behind a generated credential ID.
const RANDOM_BYTES: usize = 16;

/// Public credential identifier of an issued certificate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct CredentialId(String);

impl CredentialId {
    /// Generate a fresh credential ID from the operating system CSPRNG.
    pub fn random() -> Self {
        Self::random_from(&mut OsRng)
    }

    /// Generate a credential ID from the supplied random source.
    pub fn random_from<R: RngCore>(rng: &mut R) -> Self {
        let mut bytes = [0u8; RANDOM_BYTES];
        rng.fill_bytes(&mut bytes);
        let hex: String = bytes.iter().map(|b| format!("{b:02x}")).collect();
        Self(format!("{CREDENTIAL_PREFIX}{hex}"))
    }

    /// Parse a credential ID, checking that it is URL-safe.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidCredentialId`] if the value is
    /// empty, longer than [`MAX_CREDENTIAL_ID_LEN`], or contains characters
    /// outside `[A-Za-z0-9_-]`.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let s = value.into();
        if s.is_empty()
            || s.len() > MAX_CREDENTIAL_ID_LEN
            || !s
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(ValidationError::InvalidCredentialId(s));
        }
        Ok(Self(s))
    }

    /// Access the credential ID string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the identifier, returning the inner string.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Display for CredentialId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for CredentialId {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<CredentialId> for String {
    fn from(id: CredentialId) -> Self {
        id.0
    }
}

impl AsRef<str> for CredentialId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<&str> for CredentialId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    fn is_generated_format(id: &CredentialId) -> bool {
        let Some(hex) = id.as_str().strip_prefix(CREDENTIAL_PREFIX) else {
            return false;
        };
        hex.len() == RANDOM_BYTES * 2
            && hex
                .chars()
                .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
    }

    #[test]
    fn random_id_has_expected_shape() {
        let id = CredentialId::random();
        assert!(is_generated_format(&id), "unexpected format: {id}");
        assert_eq!(id.as_str().len(), CREDENTIAL_PREFIX.len() + 32);
    }

    #[test]
    fn random_ids_parse_back() {
        let id = CredentialId::random();
        let parsed = CredentialId::new(id.as_str()).unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn ten_thousand_random_ids_are_distinct() {
        let ids: HashSet<CredentialId> = (0..10_000).map(|_| CredentialId::random()).collect();
        assert_eq!(ids.len(), 10_000);
    }

    #[test]
    fn short_legacy_id_is_accepted() {
        let id = CredentialId::new("CRED-7f3a9c").unwrap();
        assert_eq!(id, "CRED-7f3a9c");
    }

    #[test]
    fn rejects_empty() {
        assert!(CredentialId::new("").is_err());
    }

    #[test]
    fn rejects_path_and_query_characters() {
        for bad in ["CRED/1", "CRED?x=1", "CRED 1", "CRED#1", "CRÉD-1", "../etc"] {
            assert!(CredentialId::new(bad).is_err(), "accepted {bad:?}");
        }
    }

    #[test]
    fn rejects_overlong() {
        let long = "A".repeat(MAX_CREDENTIAL_ID_LEN + 1);
        assert!(CredentialId::new(long).is_err());
        let max = "A".repeat(MAX_CREDENTIAL_ID_LEN);
        assert!(CredentialId::new(max).is_ok());
    }

    #[test]
    fn serializes_as_plain_string() {
        let id = CredentialId::new("CRED-abc123").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"CRED-abc123\"");
    }

    #[test]
    fn deserializing_validates() {
        let id: CredentialId = serde_json::from_str("\"CRED-abc123\"").unwrap();
        assert_eq!(id, "CRED-abc123");
        assert!(serde_json::from_str::<CredentialId>("\"has space\"").is_err());
        assert!(serde_json::from_str::<CredentialId>("\"\"").is_err());
    }

    struct ZeroRng;

    impl RngCore for ZeroRng {
        fn next_u32(&mut self) -> u32 {
            0
        }
        fn next_u64(&mut self) -> u64 {
            0
        }
        fn fill_bytes(&mut self, dest: &mut [u8]) {
            dest.fill(0);
        }
        fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand_core::Error> {
            dest.fill(0);
            Ok(())
        }
    }

    #[test]
    fn random_from_uses_supplied_source() {
        let id = CredentialId::random_from(&mut ZeroRng);
        assert_eq!(id.as_str(), "CRED-00000000000000000000000000000000");
    }

    proptest! {
        #[test]
        fn generated_ids_always_match_format(_seed in any::<u64>()) {
            let id = CredentialId::random();
            prop_assert!(is_generated_format(&id));
            prop_assert!(CredentialId::new(id.as_str()).is_ok());
        }

        #[test]
        fn url_safe_strings_parse(s in "[A-Za-z0-9_-]{1,128}") {
            let id = CredentialId::new(s.clone()).unwrap();
            prop_assert_eq!(id.as_str(), s.as_str());
        }
    }
}
