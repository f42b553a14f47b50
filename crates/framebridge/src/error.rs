//! # Error Definitions
//!
//! Everything the bridge can report, split by who is at fault: the caller
//! (`Usage`), the remote end (`Application`), or the network (`Transport`).

use crate::transport::TransportError;
use crate::translate::ApplicationError;

/// Failures surfaced by the bridge.
#[derive(Debug, Clone)]
pub enum Error {
    /// The bridge was driven in a way its contract forbids (partial reads,
    /// double retrieval, flushing without a concrete transport, ...).
    /// These are programming errors and must not be retried.
    Usage(String),
    /// The remote end answered with an error frame.
    Application(ApplicationError),
    /// The call/response layer failed. Passed through untouched.
    Transport(TransportError),
    /// The call was closed before any frame was delivered to it.
    Closed,
    /// A framed payload could not be read with the byte primitives.
    Pack(framepack::Error),
    /// A framed payload was readable but carried nonsense.
    Protocol(String),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Usage(msg) => write!(f, "Usage error: {}", msg),
            Self::Application(e) => write!(f, "Application error: {}", e),
            Self::Transport(e) => write!(f, "Transport error: {}", e),
            Self::Closed => write!(f, "Call closed before a response frame was delivered"),
            Self::Pack(e) => write!(f, "Framepack error: {}", e),
            Self::Protocol(msg) => write!(f, "Protocol violation: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

impl From<TransportError> for Error {
    fn from(e: TransportError) -> Self {
        Self::Transport(e)
    }
}

impl From<ApplicationError> for Error {
    fn from(e: ApplicationError) -> Self {
        Self::Application(e)
    }
}

impl From<framepack::Error> for Error {
    fn from(e: framepack::Error) -> Self {
        Self::Pack(e)
    }
}

/// A specialized Result type for bridge operations.
pub type Result<T> = std::result::Result<T, Error>;
