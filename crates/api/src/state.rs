use std::sync::Arc;

use scriptgate_core::registry::AuthorizationRegistry;
use scriptgate_core::scripting::Gateway;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (everything is behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    /// Allowed principals; shared with the control plane.
    pub registry: Arc<dyn AuthorizationRegistry>,
    /// Execution gateway. Owns the tenant store handle.
    pub gateway: Arc<Gateway>,
}
