//! Durable registry persisted as a small JSON document.
//!
//! Every successful add rewrites the document through a temp file and an
//! atomic rename while the write lock is held, so the file on disk never
//! lags behind a membership that readers can already observe.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::sync::RwLock;

use super::{authorize_add, seed, AuthorizationRegistry};
use crate::error::CoreError;
use crate::types::PrincipalId;

/// On-disk layout of the registry file.
#[derive(Debug, Serialize, Deserialize)]
struct RegistryDocument {
    admin: PrincipalId,
    principals: BTreeSet<PrincipalId>,
}

/// Registry whose membership survives restarts.
#[derive(Debug)]
pub struct FileRegistry {
    admin: PrincipalId,
    path: PathBuf,
    members: RwLock<BTreeSet<PrincipalId>>,
}

impl FileRegistry {
    /// Open (or lazily create) the registry at `path`.
    ///
    /// The configured admin is always a member, even if the file was written
    /// under a different admin.
    pub async fn open(path: impl Into<PathBuf>, admin: PrincipalId) -> Result<Self, CoreError> {
        let path = path.into();
        let mut members = seed(admin);

        match fs::read(&path).await {
            Ok(bytes) => {
                let doc: RegistryDocument = serde_json::from_slice(&bytes).map_err(|e| {
                    CoreError::Infrastructure(format!(
                        "Registry file {} is corrupt: {e}",
                        path.display()
                    ))
                })?;
                if doc.admin != admin {
                    tracing::warn!(
                        stored = %doc.admin,
                        configured = %admin,
                        "Registry file was written under a different admin"
                    );
                }
                members.extend(doc.principals);
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "Registry file absent, starting from admin only");
            }
            Err(e) => return Err(CoreError::io("read registry file", e)),
        }

        let registry = Self {
            admin,
            path,
            members: RwLock::new(members),
        };
        {
            let members = registry.members.read().await;
            registry.persist(&members).await?;
            tracing::info!(count = members.len(), "Registry loaded");
        }
        Ok(registry)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn persist(&self, members: &BTreeSet<PrincipalId>) -> Result<(), CoreError> {
        let doc = RegistryDocument {
            admin: self.admin,
            principals: members.clone(),
        };
        let bytes = serde_json::to_vec_pretty(&doc)
            .map_err(|e| CoreError::Infrastructure(format!("Serialize registry: {e}")))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| CoreError::io("create registry directory", e))?;
        }

        let tmp = self
            .path
            .with_extension(format!("tmp-{}", uuid::Uuid::new_v4().simple()));
        fs::write(&tmp, &bytes)
            .await
            .map_err(|e| CoreError::io("write registry file", e))?;
        if let Err(e) = fs::rename(&tmp, &self.path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(CoreError::io("commit registry file", e));
        }
        Ok(())
    }
}

#[async_trait]
impl AuthorizationRegistry for FileRegistry {
    fn admin(&self) -> PrincipalId {
        self.admin
    }

    async fn contains(&self, id: PrincipalId) -> bool {
        self.members.read().await.contains(&id)
    }

    async fn add(&self, requester: PrincipalId, new_id: i64) -> Result<(), CoreError> {
        let new_id = authorize_add(self.admin, requester, new_id)?;

        let mut members = self.members.write().await;
        if members.contains(&new_id) {
            return Ok(());
        }

        let mut next = members.clone();
        next.insert(new_id);
        self.persist(&next).await?;
        *members = next;

        tracing::info!(principal = %new_id, path = %self.path.display(), "Principal added");
        Ok(())
    }

    async fn members(&self) -> Vec<PrincipalId> {
        self.members.read().await.iter().copied().collect()
    }
}
