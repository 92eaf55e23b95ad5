//! # Registry Errors
//!
//! Two layers: [`StoreError`] is what a record store reports, and
//! [`RegistryError`] is what the registry surfaces to its callers.
//!
//! Verification has no "not found" error. An unknown credential ID is a
//! normal [`VerificationResult::NotFound`](crate::VerificationResult::NotFound)
//! outcome, so only infrastructure failures ever escape `verify`.

use thiserror::Error;
use uuid::Uuid;

use certreg_core::ValidationError;

/// Errors reported by a [`CertificateStore`](crate::CertificateStore) or
/// [`ReferenceResolver`](crate::ReferenceResolver).
#[derive(Error, Debug)]
pub enum StoreError {
    /// The credential ID is already taken. Issuance regenerates on this.
    #[error("credential ID already exists")]
    DuplicateCredential,

    /// A stored record failed validation when read back.
    #[error("corrupt record: {0}")]
    Corrupt(String),

    /// The backing store is unavailable or failed.
    #[error("store backend error: {0}")]
    Backend(String),
}

/// Errors surfaced by [`CertificateRegistry`](crate::CertificateRegistry).
#[derive(Error, Debug)]
pub enum RegistryError {
    /// No certificate has the requested credential ID.
    #[error("certificate not found")]
    NotFound,

    /// Caller-supplied input failed validation.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// The issuance request named a course the resolver does not know.
    #[error("unknown course: {0}")]
    UnknownCourse(Uuid),

    /// The issuance request named a template the resolver does not know.
    #[error("unknown template: {0}")]
    UnknownTemplate(Uuid),

    /// Every generated credential ID collided with an existing one.
    ///
    /// With 128-bit random IDs this only happens if the generator is broken.
    #[error("credential ID generation exhausted after {attempts} attempts")]
    CredentialGenerationExhausted {
        /// Number of IDs tried.
        attempts: u32,
    },

    /// Store or resolver failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}
