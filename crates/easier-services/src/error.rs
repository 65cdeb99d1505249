use std::path::PathBuf;

use easier_client::error::ClientError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Client(#[from] ClientError),

    #[error("{0}")]
    Validation(String),

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("a newer request replaced this one")]
    Superseded,
}

impl From<reqwest::Error> for ServiceError {
    fn from(e: reqwest::Error) -> Self {
        ServiceError::Client(ClientError::from(e))
    }
}

impl ServiceError {
    /// Status code the service answered with, if it got that far.
    pub fn status(&self) -> Option<u16> {
        match self {
            ServiceError::Client(ClientError::Status { status, .. }) => Some(*status),
            _ => None,
        }
    }
}
