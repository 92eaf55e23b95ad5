//! # certreg-registry — The Certificate Registry
//!
//! Owns the lifecycle of issued certificates: issuance, anonymous
//! verification by credential ID, and revocation. It is the sole source of
//! truth; course management, instructor tooling, and the public
//! verification page are read-only or write-once consumers.
//!
//! ## Collaborators
//!
//! The registry never reaches for ambient state. Its collaborators are
//! injected at construction:
//!
//! - [`CertificateStore`] — durable record store with a unique-constrained
//!   insert, exact-key lookup, and an atomic set-if-not-revoked update.
//! - [`ReferenceResolver`] — read-only course and template lookup, used only
//!   to decorate a verification response.
//! - [`CredentialIdGenerator`] — source of fresh credential IDs
//!   ([`RandomCredentialIds`] in production).
//!
//! [`MemoryCertificateStore`] and [`MemoryReferences`] implement the store
//! traits for development and tests. The PostgreSQL implementation lives in
//! `certreg-api`.

pub mod error;
pub mod generator;
pub mod memory;
pub mod registry;
pub mod store;

pub use error::{RegistryError, StoreError};
pub use generator::{CredentialIdGenerator, RandomCredentialIds};
pub use memory::{MemoryCertificateStore, MemoryReferences};
pub use registry::{
    CertificateRegistry, IssueRequest, VerificationResult, VerifiedCertificate,
    MAX_ISSUE_ATTEMPTS,
};
pub use store::{CertificateStore, ReferenceResolver, RevokeOutcome};
