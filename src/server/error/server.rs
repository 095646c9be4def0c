use thiserror::Error;

use crate::server::model::game_server::ServerStatus;

#[derive(Error, Debug)]
pub enum ServerError {
    /// The owner already has a server with this name.
    #[error("You already have a server named '{name}'")]
    DuplicateName {
        /// Conflicting server name
        name: String,
    },

    /// The requested operation is not valid from the server's current status.
    #[error("Cannot {action} server '{server}' while it is {status}")]
    InvalidState {
        /// Server name
        server: String,
        /// Status at the time of the request
        status: ServerStatus,
        /// Operation that was refused
        action: &'static str,
    },

    /// The orchestrator failed or timed out while provisioning or terminating.
    ///
    /// The server record is moved to `error` so it stays inspectable.
    #[error("Provisioning failed for server {server_id}: {reason}")]
    ProvisioningFailed {
        /// ID of the affected server
        server_id: i32,
        /// Failure reported by the orchestrator
        reason: String,
    },

    /// The delete confirmation token is unknown, expired or already used.
    #[error("Delete confirmation not found or expired")]
    ConfirmationNotFound,
}
