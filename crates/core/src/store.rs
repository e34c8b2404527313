//! Tenant script store.
//!
//! Each principal owns one namespace directory `<root>/<principal id>/`.
//! Every externally supplied file name is reduced to its basename by
//! [`sanitize_file_name`] before it touches the filesystem, on upload and
//! again on every resolve. Only the basename survives, so no input can name
//! a path outside the caller's namespace.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::fs;
use tokio::sync::Mutex;

use crate::error::CoreError;
use crate::types::PrincipalId;

/// Metadata of one stored script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScriptRecord {
    pub owner: PrincipalId,
    pub file_name: String,
    #[serde(skip)]
    pub storage_path: PathBuf,
    pub uploaded_at: DateTime<Utc>,
    pub size_bytes: u64,
}

/// Reduce a raw, client-supplied file name to a bare basename.
///
/// Directory components (with either separator) and parent references are
/// stripped, never merely flagged: `"../b/x.php"` becomes `"x.php"`. Names
/// that reduce to nothing, `.` or `..`, or that contain NUL, are rejected.
pub fn sanitize_file_name(raw: &str) -> Result<String, CoreError> {
    if raw.contains('\0') {
        return Err(CoreError::Validation(
            "File name must not contain NUL bytes".to_string(),
        ));
    }

    let base = raw
        .rsplit(|c: char| c == '/' || c == '\\')
        .next()
        .unwrap_or_default()
        .trim();

    if base.is_empty() || base == "." || base == ".." {
        return Err(CoreError::Validation(format!(
            "'{raw}' does not contain a usable file name"
        )));
    }
    Ok(base.to_string())
}

/// Per-principal script storage rooted at a single directory.
pub struct TenantScriptStore {
    root: PathBuf,
    extension: String,
    /// Serializes writers; readers rely on atomic renames instead.
    write_lock: Mutex<()>,
}

impl TenantScriptStore {
    /// `extension` includes the leading dot, e.g. `".php"`.
    pub fn new(root: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            extension: extension.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Whether `file_name` carries the configured extension (case-sensitive).
    pub fn has_allowed_extension(&self, file_name: &str) -> bool {
        file_name.len() > self.extension.len() && file_name.ends_with(&self.extension)
    }

    /// Directory holding `principal`'s scripts. May not exist yet.
    pub fn namespace_dir(&self, principal: PrincipalId) -> PathBuf {
        self.root.join(principal.to_string())
    }

    /// Store `content` as `principal`'s script named after `raw_name`'s basename.
    ///
    /// Overwrites an existing script of the same name.
    pub async fn upload(
        &self,
        principal: PrincipalId,
        raw_name: &str,
        content: &[u8],
    ) -> Result<ScriptRecord, CoreError> {
        let file_name = sanitize_file_name(raw_name)?;
        if !self.has_allowed_extension(&file_name) {
            return Err(CoreError::Validation(format!(
                "'{file_name}' must end with {}",
                self.extension
            )));
        }
        // Dot-prefixed names are reserved for in-flight temp files.
        if file_name.starts_with('.') {
            return Err(CoreError::Validation(format!(
                "'{file_name}' must not start with a dot"
            )));
        }

        let _guard = self.write_lock.lock().await;

        let namespace = self.namespace_dir(principal);
        self.ensure_namespace(&namespace).await?;

        let target = namespace.join(&file_name);
        let tmp = namespace.join(format!(".upload-{}", uuid::Uuid::new_v4().simple()));
        fs::write(&tmp, content)
            .await
            .map_err(|e| CoreError::io("write script", e))?;
        // rename replaces a symlink at `target` instead of following it.
        if let Err(e) = fs::rename(&tmp, &target).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(CoreError::io("commit script", e));
        }

        let record = self.record_for(principal, file_name, target).await?;
        tracing::info!(
            owner = %principal,
            file = %record.file_name,
            size = record.size_bytes,
            "Script uploaded"
        );
        Ok(record)
    }

    /// All of `principal`'s scripts, sorted by file name.
    pub async fn list(&self, principal: PrincipalId) -> Result<Vec<ScriptRecord>, CoreError> {
        let namespace = self.namespace_dir(principal);
        if !is_real_dir(&namespace).await {
            return Ok(Vec::new());
        }

        let mut entries = fs::read_dir(&namespace)
            .await
            .map_err(|e| CoreError::io("read namespace", e))?;
        let mut records = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| CoreError::io("read namespace entry", e))?
        {
            let Ok(file_name) = entry.file_name().into_string() else {
                continue;
            };
            if file_name.starts_with('.') || !self.has_allowed_extension(&file_name) {
                continue;
            }
            let Ok(meta) = fs::symlink_metadata(entry.path()).await else {
                continue;
            };
            if !meta.file_type().is_file() {
                continue;
            }
            records.push(ScriptRecord {
                owner: principal,
                file_name,
                storage_path: entry.path(),
                uploaded_at: modified_at(&meta),
                size_bytes: meta.len(),
            });
        }

        records.sort_by(|a, b| a.file_name.cmp(&b.file_name));
        Ok(records)
    }

    /// Number of scripts `principal` owns.
    pub async fn count(&self, principal: PrincipalId) -> Result<usize, CoreError> {
        Ok(self.list(principal).await?.len())
    }

    /// Map `(principal, raw_name)` to the path of an existing script.
    ///
    /// The only place the gateway obtains a filesystem path from. The name
    /// is sanitized again here regardless of any earlier validation; symlinks
    /// (namespace or file) never resolve.
    pub async fn resolve(&self, principal: PrincipalId, raw_name: &str) -> Result<PathBuf, CoreError> {
        let not_found = || CoreError::NotFound {
            owner: principal,
            file_name: raw_name.to_string(),
        };

        let file_name = sanitize_file_name(raw_name).map_err(|_| not_found())?;
        if !self.has_allowed_extension(&file_name) || file_name.starts_with('.') {
            return Err(not_found());
        }

        let namespace = self.namespace_dir(principal);
        if !is_real_dir(&namespace).await {
            return Err(not_found());
        }

        let path = namespace.join(&file_name);
        match fs::symlink_metadata(&path).await {
            Ok(meta) if meta.file_type().is_file() => Ok(path),
            Ok(_) => {
                tracing::warn!(owner = %principal, file = %file_name, "Refusing non-regular script entry");
                Err(not_found())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(not_found()),
            Err(e) => Err(CoreError::io("stat script", e)),
        }
    }

    async fn ensure_namespace(&self, namespace: &Path) -> Result<(), CoreError> {
        match fs::symlink_metadata(namespace).await {
            Ok(meta) if meta.file_type().is_dir() => Ok(()),
            Ok(_) => Err(CoreError::Infrastructure(format!(
                "Namespace {} is not a plain directory",
                namespace.display()
            ))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => fs::create_dir_all(namespace)
                .await
                .map_err(|e| CoreError::io("create namespace", e)),
            Err(e) => Err(CoreError::io("stat namespace", e)),
        }
    }

    async fn record_for(
        &self,
        owner: PrincipalId,
        file_name: String,
        storage_path: PathBuf,
    ) -> Result<ScriptRecord, CoreError> {
        let meta = fs::symlink_metadata(&storage_path)
            .await
            .map_err(|e| CoreError::io("stat uploaded script", e))?;
        Ok(ScriptRecord {
            owner,
            file_name,
            storage_path,
            uploaded_at: modified_at(&meta),
            size_bytes: meta.len(),
        })
    }
}

async fn is_real_dir(path: &Path) -> bool {
    fs::symlink_metadata(path)
        .await
        .map(|m| m.file_type().is_dir())
        .unwrap_or(false)
}

fn modified_at(meta: &std::fs::Metadata) -> DateTime<Utc> {
    meta.modified().map(DateTime::<Utc>::from).unwrap_or_else(|_| Utc::now())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
