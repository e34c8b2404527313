//! Script execution interface and shared types.
//!
//! Defines [`ScriptExecutor`], implemented by the interpreter runner, the
//! per-process [`ScriptInput`] / [`ScriptOutput`] / [`ScriptError`] types,
//! and the request/result types the [`Gateway`](super::gateway::Gateway)
//! exchanges with its callers.

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::Serialize;

use crate::error::CoreError;
use crate::types::PrincipalId;

// ---------------------------------------------------------------------------
// Process-level types
// ---------------------------------------------------------------------------

/// Input for one child process.
#[derive(Debug, Clone)]
pub struct ScriptInput {
    /// Bytes piped to stdin. `None` connects stdin to the null device.
    pub stdin: Option<Vec<u8>>,
    /// Extra environment variables on top of the inherited environment.
    pub env_vars: Vec<(String, String)>,
    /// Maximum wall-clock time before the process group is killed.
    pub timeout: Duration,
}

/// Captured output of a process that exited on its own.
#[derive(Debug, Clone)]
pub struct ScriptOutput {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    /// Process exit code (`-1` if killed by a signal).
    pub exit_code: i32,
    pub duration_ms: u64,
}

/// Failures that prevent a normal exit from being observed.
#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    /// The interpreter could not be started at all.
    #[error("Failed to spawn interpreter: {0}")]
    Spawn(#[source] std::io::Error),

    /// The budget expired and the process group was killed.
    #[error("Script timed out after {elapsed_ms}ms")]
    Timeout { elapsed_ms: u64 },

    /// Waiting on the child failed.
    #[error("I/O error: {0}")]
    Io(#[source] std::io::Error),
}

/// Trait implemented by script runtimes.
pub trait ScriptExecutor: Send + Sync {
    /// Run the script at `script_path` with the given `input`.
    fn execute(
        &self,
        script_path: &Path,
        input: ScriptInput,
    ) -> impl std::future::Future<Output = Result<ScriptOutput, ScriptError>> + Send;
}

// ---------------------------------------------------------------------------
// Gateway-level types
// ---------------------------------------------------------------------------

/// HTTP response header naming the invocation's [`Classification`].
pub const OUTCOME_HEADER: &str = "x-script-outcome";

/// Terminal outcome of one invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    Success,
    ScriptError,
    Timeout,
    NotFound,
    ServerError,
}

impl Classification {
    pub const ALL: [Classification; 5] = [
        Self::Success,
        Self::ScriptError,
        Self::Timeout,
        Self::NotFound,
        Self::ServerError,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::ScriptError => "script_error",
            Self::Timeout => "timeout",
            Self::NotFound => "not_found",
            Self::ServerError => "server_error",
        }
    }
}

impl FromStr for Classification {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| CoreError::Validation(format!("Unknown classification '{s}'")))
    }
}

/// One request to run a stored script.
#[derive(Debug, Clone)]
pub struct InvocationRequest {
    pub principal: PrincipalId,
    /// Raw, untrusted file name as received from the client.
    pub file_name: String,
    /// Upper-case HTTP method.
    pub method: String,
    pub body: Vec<u8>,
}

impl InvocationRequest {
    /// Whether the request body is forwarded to the script's stdin.
    pub fn carries_body(&self) -> bool {
        matches!(self.method.as_str(), "POST" | "PUT" | "PATCH")
    }
}

/// Classified result, produced and consumed once per request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationResult {
    pub classification: Classification,
    pub output: Vec<u8>,
    /// Always `false` when produced by the gateway; set by presentation layers
    /// that cap the output.
    pub truncated: bool,
}

impl InvocationResult {
    pub fn new(classification: Classification, output: impl Into<Vec<u8>>) -> Self {
        Self {
            classification,
            output: output.into(),
            truncated: false,
        }
    }
}
