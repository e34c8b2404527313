//! Gateway configuration loaded from environment variables.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::CoreError;
use crate::types::PrincipalId;

/// Default interpreter binary used to run uploaded scripts.
pub const DEFAULT_INTERPRETER: &str = "php";

/// Default extension every uploaded script must carry.
pub const DEFAULT_EXTENSION: &str = ".php";

/// Default wall-clock execution budget per invocation.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Default size of the output preview shown on the control plane.
pub const DEFAULT_OUTPUT_CAP_BYTES: usize = 4000;

/// Settings shared by the store, the gateway and the control plane.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Binary used to run scripts (`INTERPRETER_PATH`).
    pub interpreter_path: String,
    /// Required script extension including the dot (`SCRIPT_EXTENSION`).
    pub script_extension: String,
    /// Hard execution budget (`SCRIPT_TIMEOUT_SECS`).
    pub timeout: Duration,
    /// Presentation-layer cap; never enforced by the gateway (`OUTPUT_CAP_BYTES`).
    pub output_cap_bytes: usize,
    /// The only principal allowed to grow the registry (`ADMIN_PRINCIPAL_ID`).
    pub admin_principal_id: PrincipalId,
    /// Root of all tenant namespaces (`SCRIPTS_DIR`).
    pub scripts_dir: PathBuf,
    /// Durable registry file; memory-only registry when unset (`REGISTRY_PATH`).
    pub registry_path: Option<PathBuf>,
    /// Base of the live links shown to uploaders (`PUBLIC_BASE_URL`).
    pub public_base_url: String,
}

impl GatewayConfig {
    /// Load configuration from the process environment.
    ///
    /// | Env Var               | Default                   |
    /// |-----------------------|---------------------------|
    /// | `INTERPRETER_PATH`    | `php`                     |
    /// | `SCRIPT_EXTENSION`    | `.php`                    |
    /// | `SCRIPT_TIMEOUT_SECS` | `10`                      |
    /// | `OUTPUT_CAP_BYTES`    | `4000`                    |
    /// | `ADMIN_PRINCIPAL_ID`  | required                  |
    /// | `SCRIPTS_DIR`         | `uploads`                 |
    /// | `REGISTRY_PATH`       | unset                     |
    /// | `PUBLIC_BASE_URL`     | `http://localhost:{PORT}` |
    pub fn from_env() -> Result<Self, CoreError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup (used by tests).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, CoreError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let admin_raw = lookup("ADMIN_PRINCIPAL_ID").ok_or_else(|| {
            CoreError::Validation("ADMIN_PRINCIPAL_ID must be set".to_string())
        })?;
        let admin_principal_id: PrincipalId = admin_raw.parse()?;

        let mut script_extension =
            lookup("SCRIPT_EXTENSION").unwrap_or_else(|| DEFAULT_EXTENSION.into());
        if !script_extension.starts_with('.') {
            script_extension.insert(0, '.');
        }
        if script_extension.len() < 2 {
            return Err(CoreError::Validation(
                "SCRIPT_EXTENSION must not be empty".to_string(),
            ));
        }

        let timeout_secs: u64 = parse_or(&lookup, "SCRIPT_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?;
        if timeout_secs == 0 {
            return Err(CoreError::Validation(
                "SCRIPT_TIMEOUT_SECS must be greater than zero".to_string(),
            ));
        }

        let port: u16 = parse_or(&lookup, "PORT", 8000)?;
        let public_base_url = lookup("PUBLIC_BASE_URL")
            .unwrap_or_else(|| format!("http://localhost:{port}"))
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            interpreter_path: lookup("INTERPRETER_PATH")
                .unwrap_or_else(|| DEFAULT_INTERPRETER.into()),
            script_extension,
            timeout: Duration::from_secs(timeout_secs),
            output_cap_bytes: parse_or(&lookup, "OUTPUT_CAP_BYTES", DEFAULT_OUTPUT_CAP_BYTES)?,
            admin_principal_id,
            scripts_dir: lookup("SCRIPTS_DIR")
                .unwrap_or_else(|| "uploads".into())
                .into(),
            registry_path: lookup("REGISTRY_PATH").map(PathBuf::from),
            public_base_url,
        })
    }
}

/// Parse `key` if present, otherwise fall back to `default`.
pub fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, CoreError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| CoreError::Validation(format!("{key} has an invalid value '{raw}'"))),
        None => Ok(default),
    }
}
