//! On-demand script execution.
//!
//! [`gateway::Gateway`] resolves a stored script through the tenant store,
//! runs it under [`interpreter::InterpreterExecutor`] in its own process
//! group with a hard wall-clock budget, and classifies the outcome. All
//! subprocess management lives in [`subprocess`].

pub mod executor;
pub mod gateway;
pub mod interpreter;
pub mod stats;
pub mod subprocess;

pub use executor::{Classification, InvocationRequest, InvocationResult};
pub use gateway::Gateway;
pub use stats::{GatewayStats, StatsSnapshot};
