use scriptgate_core::config::{parse_or, GatewayConfig};
use scriptgate_core::error::CoreError;

/// Server configuration loaded from environment variables.
///
/// Wraps the [`GatewayConfig`] shared with the control plane and adds the
/// listener settings.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `8000`).
    pub port: u16,
    /// HTTP request timeout in seconds (default: script timeout + 5).
    pub request_timeout_secs: u64,
    /// Store, registry and gateway settings.
    pub gateway: GatewayConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                  |
    /// |------------------------|--------------------------|
    /// | `HOST`                 | `0.0.0.0`                |
    /// | `PORT`                 | `8000`                   |
    /// | `REQUEST_TIMEOUT_SECS` | `SCRIPT_TIMEOUT_SECS + 5`|
    ///
    /// See [`GatewayConfig::from_env`] for the remaining variables.
    pub fn from_env() -> Result<Self, CoreError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, CoreError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let gateway = GatewayConfig::from_lookup(&lookup)?;
        let request_timeout_secs = parse_or(
            &lookup,
            "REQUEST_TIMEOUT_SECS",
            gateway.timeout.as_secs() + 5,
        )?;
        if request_timeout_secs <= gateway.timeout.as_secs() {
            tracing::warn!(
                request_timeout_secs,
                script_timeout_secs = gateway.timeout.as_secs(),
                "REQUEST_TIMEOUT_SECS is not above the script budget"
            );
        }

        Ok(Self {
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port: parse_or(&lookup, "PORT", 8000)?,
            request_timeout_secs,
            gateway,
        })
    }
}
