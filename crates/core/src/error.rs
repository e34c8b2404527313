use crate::types::PrincipalId;

/// Error taxonomy shared by the registry, the store and the gateway.
///
/// `Authorization` and `Validation` are raised before a request reaches the
/// gateway. `Timeout` and `Execution` describe terminal invocation outcomes
/// and are normally carried by a [`Classification`] rather than returned.
///
/// [`Classification`]: crate::scripting::executor::Classification
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Not authorized: {0}")]
    Authorization(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Script not found: {file_name} for principal {owner}")]
    NotFound { owner: PrincipalId, file_name: String },

    #[error("Script timed out after {elapsed_ms}ms")]
    Timeout { elapsed_ms: u64 },

    #[error("Script exited with code {exit_code}")]
    Execution { exit_code: i32 },

    #[error("Infrastructure error: {0}")]
    Infrastructure(String),
}

impl CoreError {
    /// Wrap an I/O failure with a short description of what was attempted.
    pub fn io(context: &str, err: std::io::Error) -> Self {
        Self::Infrastructure(format!("{context}: {err}"))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
