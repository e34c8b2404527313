//! Execution gateway.
//!
//! Ties the [`TenantScriptStore`] to the [`InterpreterExecutor`]. Every
//! invocation walks the same path and ends in exactly one
//! [`Classification`]:
//!
//! ```text
//! Received -> Resolving -> NotFound
//!                       -> Spawning -> Running -> Success | ScriptError | Timeout
//!                                   -> ServerError (spawn failed)
//! ```
//!
//! Invocations share nothing but the store and the stats counters, and are
//! never retried.

use std::sync::Arc;
use std::time::Duration;

use crate::error::CoreError;
use crate::store::TenantScriptStore;

use super::executor::{
    Classification, InvocationRequest, InvocationResult, ScriptError, ScriptExecutor, ScriptInput,
};
use super::interpreter::InterpreterExecutor;
use super::stats::GatewayStats;

/// Body returned for [`Classification::NotFound`].
pub const NOT_FOUND_MESSAGE: &str = "Script not found";

/// Body returned for [`Classification::ServerError`]; carries no internal detail.
pub const SERVER_ERROR_MESSAGE: &str = "The script could not be executed";

/// Resolves, runs and classifies script invocations.
pub struct Gateway {
    store: Arc<TenantScriptStore>,
    executor: InterpreterExecutor,
    timeout: Duration,
    stats: Arc<GatewayStats>,
}

impl Gateway {
    pub fn new(store: Arc<TenantScriptStore>, executor: InterpreterExecutor, timeout: Duration) -> Self {
        Self {
            store,
            executor,
            timeout,
            stats: Arc::new(GatewayStats::new()),
        }
    }

    pub fn store(&self) -> &Arc<TenantScriptStore> {
        &self.store
    }

    pub fn stats(&self) -> &Arc<GatewayStats> {
        &self.stats
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run one invocation to its terminal classification.
    pub async fn invoke(&self, request: InvocationRequest) -> InvocationResult {
        let result = self.run(&request).await;
        self.stats.record(result.classification);
        tracing::info!(
            owner = %request.principal,
            file = %request.file_name,
            method = %request.method,
            classification = result.classification.as_str(),
            output_bytes = result.output.len(),
            "Invocation finished"
        );
        result
    }

    async fn run(&self, request: &InvocationRequest) -> InvocationResult {
        let script_path = match self.store.resolve(request.principal, &request.file_name).await {
            Ok(path) => path,
            Err(CoreError::NotFound { .. }) => {
                return InvocationResult::new(Classification::NotFound, NOT_FOUND_MESSAGE);
            }
            Err(e) => {
                tracing::error!(error = %e, owner = %request.principal, "Failed to resolve script");
                return InvocationResult::new(Classification::ServerError, SERVER_ERROR_MESSAGE);
            }
        };

        let input = ScriptInput {
            stdin: request.carries_body().then(|| request.body.clone()),
            env_vars: vec![
                ("REQUEST_METHOD".to_string(), request.method.clone()),
                ("SCRIPT_OWNER_ID".to_string(), request.principal.to_string()),
            ],
            timeout: self.timeout,
        };

        match self.executor.execute(&script_path, input).await {
            Ok(output) if output.exit_code == 0 => {
                InvocationResult::new(Classification::Success, output.stdout)
            }
            Ok(output) => {
                tracing::debug!(exit_code = output.exit_code, duration_ms = output.duration_ms, "Script failed");
                let body = if output.stderr.is_empty() {
                    output.stdout
                } else {
                    output.stderr
                };
                InvocationResult::new(Classification::ScriptError, body)
            }
            Err(ScriptError::Timeout { elapsed_ms }) => {
                tracing::warn!(owner = %request.principal, elapsed_ms, "Script timed out");
                InvocationResult::new(
                    Classification::Timeout,
                    format!(
                        "Script exceeded the {}s execution budget",
                        self.timeout.as_secs_f64()
                    ),
                )
            }
            Err(e) => {
                tracing::error!(
                    error = %e,
                    interpreter = %self.executor.interpreter_path(),
                    "Script could not be executed"
                );
                InvocationResult::new(Classification::ServerError, SERVER_ERROR_MESSAGE)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
