//! Password-hash agility.
//!
//! Exposes the `PasswordHasher` capability injected into seed application,
//! plus the production implementation used by the rest of the service. The
//! hash string is opaque outside this crate but always carries a
//! self-describing scheme tag (`{BCRYPT}…`), matching how OpenLDAP's own
//! `userPassword` attribute is conventionally tagged (`{CRYPT}`, `{SSHA}`,
//! …) so a directory administrator inspecting the store can tell at a
//! glance which scheme produced a given hash.

use thiserror::Error;

/// Current production scheme tag. Any stored hash not carrying this tag is
/// considered weak and is rehashed on next seed apply.
pub const CURRENT_SCHEME_TAG: &str = "{BCRYPT}";
const CURRENT_COST: u32 = bcrypt::DEFAULT_COST;

#[derive(Debug, Error)]
pub enum HashError {
    #[error("failed to hash password: {0}")]
    Hash(String),
}

/// Capability injected into seed application. Implementors
/// must be safe to share across threads: the nexus may call into it from
/// any `Update` caller.
pub trait PasswordHasher: Send + Sync {
    /// Hashes a plaintext password into a new, opaque, self-describing hash.
    fn hash_password(&self, plaintext: &str) -> Result<String, HashError>;

    /// Checks whether `plaintext` matches the given stored hash.
    fn check_password_hash(&self, plaintext: &str, hash: &str) -> bool;

    /// Reports whether `hash` was produced by a scheme weaker than the
    /// current production scheme and should be upgraded.
    fn is_weak_hash(&self, hash: &str) -> bool;
}

/// Production hasher: bcrypt, tagged `{BCRYPT}` so the scheme is
/// self-describing in the stored string.
#[derive(Debug, Clone, Copy, Default)]
pub struct BcryptHasher;

impl BcryptHasher {
    pub fn new() -> Self {
        Self
    }

    fn strip_tag(hash: &str) -> Option<&str> {
        hash.strip_prefix(CURRENT_SCHEME_TAG)
    }
}

impl PasswordHasher for BcryptHasher {
    fn hash_password(&self, plaintext: &str) -> Result<String, HashError> {
        let raw = bcrypt::hash(plaintext, CURRENT_COST).map_err(|e| HashError::Hash(e.to_string()))?;
        Ok(format!("{}{}", CURRENT_SCHEME_TAG, raw))
    }

    fn check_password_hash(&self, plaintext: &str, hash: &str) -> bool {
        match Self::strip_tag(hash) {
            Some(raw) => bcrypt::verify(plaintext, raw).unwrap_or(false),
            // Unknown scheme: cannot verify, so password checks always fail.
            // This still allows `is_weak_hash` to trigger a rehash on next
            // seed apply.
            None => false,
        }
    }

    fn is_weak_hash(&self, hash: &str) -> bool {
        match Self::strip_tag(hash) {
            None => true,
            Some(raw) => bcrypt::get_cost(raw)
                .map(|cost| cost < CURRENT_COST)
                .unwrap_or(true),
        }
    }
}
