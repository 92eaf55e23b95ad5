#![deny(missing_docs)]

//! # certreg-core — Foundational Types for the Certificate Registry
//!
//! This crate defines the types every other crate in the workspace depends
//! on. It has no internal crate dependencies, only `serde`, `thiserror`,
//! `chrono`, `uuid`, `url`, and `rand_core` from the external ecosystem.
//!
//! ## Design Principles
//!
//! 1. **Newtype wrappers for public identifiers.** A [`CredentialId`] is not a
//!    `String`; it can only be produced by the CSPRNG generator or by
//!    validated parsing of a stored value.
//!
//! 2. **Snapshot-at-write.** [`CertificateFacts`] is copied onto the
//!    [`IssuedCertificate`] at issuance and never recomputed from live course
//!    or user records. There is no setter for any certified fact.
//!
//! 3. **Revocation is a single optional record.** `revoked_at` exists if and
//!    only if the certificate is revoked, because both live inside one
//!    [`Revocation`] value.
//!
//! 4. **[`ValidationError`] hierarchy.** Structured errors with `thiserror`,
//!    no `.unwrap()` outside tests.

pub mod certificate;
pub mod error;
pub mod identity;
pub mod reference;

pub use certificate::{
    stored_now, CertificateFacts, CertificateLinks, CertificateParts, IssuedCertificate,
    Revocation, MAX_NAME_LEN, MAX_REASON_LEN,
};
pub use error::ValidationError;
pub use identity::{CredentialId, CREDENTIAL_PREFIX, MAX_CREDENTIAL_ID_LEN};
pub use reference::{CertificateTemplate, CourseReference, HexColor};
