//! Error types for overql.

use crate::transport::TransportError;
use std::fmt;

/// The main error type for overql operations.
///
/// Every variant is raised at the call that violates an invariant.
/// Rendering a validly constructed term never fails.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Invalid argument passed to a term constructor or setter
    InvalidArgument(String),

    /// Element ranks that do not name a selector
    InvalidSelector(String),

    /// Incompatible terms combined
    Composition(String),

    /// State change forbidden by an invariant
    InvalidStateTransition(String),

    /// Failure surfaced by the transport collaborator
    Transport(TransportError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidArgument(msg) => write!(f, "Invalid argument: {}", msg),
            Error::InvalidSelector(msg) => write!(f, "Invalid selector: {}", msg),
            Error::Composition(msg) => write!(f, "Composition error: {}", msg),
            Error::InvalidStateTransition(msg) => write!(f, "Invalid state transition: {}", msg),
            Error::Transport(e) => write!(f, "Transport error: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Transport(e) => Some(e),
            _ => None,
        }
    }
}

impl From<TransportError> for Error {
    fn from(err: TransportError) -> Self {
        Error::Transport(err)
    }
}

/// A specialized `Result` type for overql operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_display_prefixes() {
        let err = Error::InvalidArgument("bad bbox".to_string());
        assert_eq!(err.to_string(), "Invalid argument: bad bbox");

        let err = Error::InvalidStateTransition("tags locked".to_string());
        assert_eq!(err.to_string(), "Invalid state transition: tags locked");
    }

    #[test]
    fn test_transport_source() {
        let err: Error = TransportError::Connection("refused".to_string()).into();
        assert!(err.source().is_some());
        assert!(Error::Composition("x".to_string()).source().is_none());
    }
}
