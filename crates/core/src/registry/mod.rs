//! Authorization registry: which principals may use the gateway.
//!
//! The set starts with exactly the admin principal and grows only through
//! [`AuthorizationRegistry::add`] called by that admin. Implementations are
//! injected at construction; nothing in the workspace reaches for a global.

pub mod file;
pub mod memory;

use std::collections::BTreeSet;

use async_trait::async_trait;

use crate::error::CoreError;
use crate::types::PrincipalId;

pub use file::FileRegistry;
pub use memory::MemoryRegistry;

/// Pluggable membership store for allowed principals.
#[async_trait]
pub trait AuthorizationRegistry: Send + Sync {
    /// The configured admin principal.
    fn admin(&self) -> PrincipalId;

    /// Whether `id` is in the allowed set (latest committed state).
    async fn contains(&self, id: PrincipalId) -> bool;

    /// Add `new_id` on behalf of `requester`.
    ///
    /// Fails with [`CoreError::Authorization`] when `requester` is not the
    /// admin and with [`CoreError::Validation`] when `new_id` is not a
    /// well-formed identity. Adding an existing member is a no-op.
    async fn add(&self, requester: PrincipalId, new_id: i64) -> Result<(), CoreError>;

    /// All members, ascending.
    async fn members(&self) -> Vec<PrincipalId>;
}

/// Shared admission check used by every implementation before mutating.
pub(crate) fn authorize_add(
    admin: PrincipalId,
    requester: PrincipalId,
    new_id: i64,
) -> Result<PrincipalId, CoreError> {
    if requester != admin {
        tracing::warn!(%requester, new_id, "Non-admin attempted to add a principal");
        return Err(CoreError::Authorization(
            "Only the admin may add principals".to_string(),
        ));
    }
    PrincipalId::new(new_id)
}

/// Initial allowed set: exactly the admin.
pub(crate) fn seed(admin: PrincipalId) -> BTreeSet<PrincipalId> {
    BTreeSet::from([admin])
}
