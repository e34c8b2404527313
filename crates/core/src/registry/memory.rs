//! In-memory registry. Membership is lost on restart.

use std::collections::BTreeSet;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{authorize_add, seed, AuthorizationRegistry};
use crate::error::CoreError;
use crate::types::PrincipalId;

/// Registry backed by a lock-protected set.
#[derive(Debug)]
pub struct MemoryRegistry {
    admin: PrincipalId,
    members: RwLock<BTreeSet<PrincipalId>>,
}

impl MemoryRegistry {
    pub fn new(admin: PrincipalId) -> Self {
        Self {
            admin,
            members: RwLock::new(seed(admin)),
        }
    }
}

#[async_trait]
impl AuthorizationRegistry for MemoryRegistry {
    fn admin(&self) -> PrincipalId {
        self.admin
    }

    async fn contains(&self, id: PrincipalId) -> bool {
        self.members.read().await.contains(&id)
    }

    async fn add(&self, requester: PrincipalId, new_id: i64) -> Result<(), CoreError> {
        let new_id = authorize_add(self.admin, requester, new_id)?;
        let inserted = self.members.write().await.insert(new_id);
        if inserted {
            tracing::info!(principal = %new_id, "Principal added");
        }
        Ok(())
    }

    async fn members(&self) -> Vec<PrincipalId> {
        self.members.read().await.iter().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn id(raw: i64) -> PrincipalId {
        PrincipalId::new(raw).expect("valid id")
    }

    #[tokio::test]
    async fn starts_with_only_the_admin() {
        let registry = MemoryRegistry::new(id(1));
        assert!(registry.contains(id(1)).await);
        assert!(!registry.contains(id(2)).await);
        assert_eq!(registry.members().await, vec![id(1)]);
    }

    #[tokio::test]
    async fn admin_add_is_idempotent() {
        let registry = MemoryRegistry::new(id(1));
        registry.add(id(1), 2).await.expect("first add");
        registry.add(id(1), 2).await.expect("repeat add");
        assert!(registry.contains(id(2)).await);
        assert_eq!(registry.members().await, vec![id(1), id(2)]);
    }

    #[tokio::test]
    async fn non_admin_add_fails_and_leaves_set_unchanged() {
        let registry = MemoryRegistry::new(id(1));
        registry.add(id(1), 2).await.expect("admin add");

        let result = registry.add(id(2), 3).await;
        assert_matches!(result, Err(CoreError::Authorization(_)));
        assert_eq!(registry.members().await, vec![id(1), id(2)]);
    }

    #[tokio::test]
    async fn malformed_id_is_a_validation_error() {
        let registry = MemoryRegistry::new(id(1));
        assert_matches!(registry.add(id(1), 0).await, Err(CoreError::Validation(_)));
        assert_matches!(registry.add(id(1), -4).await, Err(CoreError::Validation(_)));
        assert_eq!(registry.members().await, vec![id(1)]);
    }

    #[tokio::test]
    async fn authorization_is_checked_before_validation() {
        let registry = MemoryRegistry::new(id(1));
        assert_matches!(registry.add(id(5), 0).await, Err(CoreError::Authorization(_)));
    }

    #[tokio::test]
    async fn concurrent_adds_all_land() {
        let registry = std::sync::Arc::new(MemoryRegistry::new(id(1)));
        let mut handles = Vec::new();
        for n in 2..=50 {
            let registry = std::sync::Arc::clone(&registry);
            handles.push(tokio::spawn(async move { registry.add(id(1), n).await }));
        }
        for handle in handles {
            handle.await.expect("join").expect("add");
        }
        assert_eq!(registry.members().await.len(), 50);
    }
}
