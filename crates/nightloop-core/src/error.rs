//! Error types for the simulation kernel.
//!
//! Nothing here is fatal: callers at component boundaries log the error and
//! degrade the affected branch for the rest of the loop.

use thiserror::Error;

/// Errors raised by core helpers.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A reference the caller needed (player, waypoint, door) is absent.
    #[error("Missing collaborator: {0}")]
    MissingCollaborator(String),

    /// Configuration failed validation.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl CoreError {
    /// Creates a missing-collaborator error.
    pub fn missing(what: impl Into<String>) -> Self {
        Self::MissingCollaborator(what.into())
    }

    /// Creates an invalid-configuration error.
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }
}
