use scriptgate_core::error::CoreError;

use crate::client::GatewayClientError;

/// Failures surfaced to the sender as a reply.
#[derive(Debug, thiserror::Error)]
pub enum ControlError {
    /// Domain error from the registry or the store.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Rejected at the upload front door, before the store is touched.
    #[error("{0}")]
    Rejected(String),

    /// The gateway could not be reached.
    #[error(transparent)]
    Gateway(#[from] GatewayClientError),
}

impl ControlError {
    /// Text shown to the sender. Infrastructure details stay in the logs.
    pub fn reply_text(&self) -> String {
        match self {
            ControlError::Core(CoreError::Authorization(_)) => {
                "You are not authorized to do that.".to_string()
            }
            ControlError::Core(CoreError::Validation(msg)) => msg.clone(),
            ControlError::Core(CoreError::NotFound { file_name, .. }) => {
                format!("No script named {file_name}.")
            }
            ControlError::Core(other) => {
                tracing::error!(error = %other, "Control command failed");
                "Something went wrong, please try again later.".to_string()
            }
            ControlError::Rejected(msg) => msg.clone(),
            ControlError::Gateway(err) => {
                tracing::error!(error = %err, "Gateway unreachable");
                "The gateway is not reachable right now.".to_string()
            }
        }
    }
}
