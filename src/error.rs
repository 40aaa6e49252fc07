use crate::net::RequestError;
use thiserror::Error;

/// Why a fragment load did not append anything to the document.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The server answered with anything other than `200 OK`.
    #[error("fragment loading failed with status code {status}")]
    Status { status: u16 },

    /// The exchange never produced a status. Reported as status 0, the way a
    /// browser reports a request that failed below HTTP.
    #[error("fragment loading failed with status code 0: {0}")]
    Transport(#[from] RequestError),

    #[error("`{tag}` is not a valid container tag name")]
    InvalidContainerTag { tag: String },
}

impl LoadError {
    /// The HTTP status this failure corresponds to, if it came from the network.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            LoadError::Status { status } => Some(*status),
            LoadError::Transport(_) => Some(0),
            LoadError::InvalidContainerTag { .. } => None,
        }
    }
}
