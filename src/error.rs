use thiserror::Error;

use crate::dns::ApiError;

/// Exit status for a command line the program cannot act on (`EX_USAGE`).
pub const EXIT_USAGE: u8 = 64;
pub const EXIT_FAILURE: u8 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad command line; detected before any I/O.
    Usage,
    /// Credentials or client could not be set up.
    Setup,
    /// Listing or change submission failed.
    Operation,
}

#[derive(Debug, Error)]
pub enum UpdateError {
    #[error("error: {reason}\n\n{usage}")]
    Usage { reason: String, usage: String },

    #[error("Could not get Application Default Credentials: {0:#}")]
    Credentials(#[source] anyhow::Error),

    #[error("Could not create Cloud DNS client: {0}")]
    Client(#[source] ApiError),

    #[error("Error occurred while looping through resource records: {0}")]
    List(#[source] ApiError),

    #[error("Could not change: {0}")]
    Change(#[source] ApiError),
}

impl UpdateError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            UpdateError::Usage { .. } => ErrorKind::Usage,
            UpdateError::Credentials(_) | UpdateError::Client(_) => ErrorKind::Setup,
            UpdateError::List(_) | UpdateError::Change(_) => ErrorKind::Operation,
        }
    }

    pub fn exit_code(&self) -> u8 {
        match self.kind() {
            ErrorKind::Usage => EXIT_USAGE,
            ErrorKind::Setup | ErrorKind::Operation => EXIT_FAILURE,
        }
    }
}
