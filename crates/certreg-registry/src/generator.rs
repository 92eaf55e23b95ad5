//! Credential ID generation.

use certreg_core::CredentialId;

/// Source of fresh credential IDs for issuance.
pub trait CredentialIdGenerator: Send + Sync {
    /// Produce a candidate credential ID. Uniqueness is enforced by the
    /// store, not here.
    fn generate(&self) -> CredentialId;
}

/// Generates 128-bit random IDs from the operating system CSPRNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomCredentialIds;

impl CredentialIdGenerator for RandomCredentialIds {
    fn generate(&self) -> CredentialId {
        CredentialId::random()
    }
}
