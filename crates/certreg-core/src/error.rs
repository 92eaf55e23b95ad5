//! # Error Hierarchy
//!
//! Validation errors for the registry's domain types, built with `thiserror`.
//!
//! Each variant carries the offending field and, where useful, the limit
//! that was exceeded, so a rejected issuance request can be diagnosed from
//! the error message alone.

use thiserror::Error;

/// Validation errors raised when constructing domain types.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required text field was empty after trimming.
    #[error("{field} must not be empty")]
    EmptyField {
        /// Name of the field that was empty.
        field: &'static str,
    },

    /// A text field exceeded its maximum length.
    #[error("{field} must not exceed {max} characters (got {actual})")]
    FieldTooLong {
        /// Name of the offending field.
        field: &'static str,
        /// Maximum permitted length in characters.
        max: usize,
        /// Actual length in characters.
        actual: usize,
    },

    /// A stored or supplied credential identifier is not URL-safe.
    #[error("invalid credential ID: \"{0}\" (expected 1-128 characters of [A-Za-z0-9_-])")]
    InvalidCredentialId(String),

    /// A template color is not a `#RRGGBB` hex string.
    #[error("invalid color: \"{0}\" (expected #RRGGBB)")]
    InvalidColor(String),

    /// A URL field is not a well-formed http or https URL with a host.
    #[error("invalid {field}: \"{value}\" (expected an http:// or https:// URL)")]
    InvalidUrl {
        /// Name of the offending field.
        field: &'static str,
        /// The rejected value.
        value: String,
    },

    /// The stored revocation state is inconsistent.
    #[error("revocation state inconsistent: is_revoked={is_revoked}, revoked_at present={has_timestamp}")]
    InconsistentRevocation {
        /// The stored revocation flag.
        is_revoked: bool,
        /// Whether a revocation timestamp was stored.
        has_timestamp: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_field_display() {
        let err = ValidationError::EmptyField {
            field: "student_name",
        };
        assert_eq!(err.to_string(), "student_name must not be empty");
    }

    #[test]
    fn too_long_display_carries_limits() {
        let err = ValidationError::FieldTooLong {
            field: "course_name",
            max: 255,
            actual: 300,
        };
        let msg = err.to_string();
        assert!(msg.contains("course_name"));
        assert!(msg.contains("255"));
        assert!(msg.contains("300"));
    }

    #[test]
    fn inconsistent_revocation_display() {
        let err = ValidationError::InconsistentRevocation {
            is_revoked: true,
            has_timestamp: false,
        };
        assert!(err.to_string().contains("is_revoked=true"));
    }
}
