//! Boundary between the renderer and whatever ships the program text.
//!
//! The core issues at most one `submit` per builder request and never
//! retries or inspects the response body.

use std::fmt;

/// Reply returned by a transport for one submitted program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    /// HTTP-style status code
    pub status: u16,
    /// Content type reported by the endpoint, if any
    pub content_type: Option<String>,
    /// Undecoded response body
    pub body: String,
}

impl RawResponse {
    /// Whether the status code is in the 2xx range
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Opaque failure reported by a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The request could not be sent or no reply arrived
    Connection(String),
    /// The endpoint answered with a non-success status
    Status {
        /// Status code of the reply
        code: u16,
        /// Body of the reply, usually an error page
        body: String,
    },
    /// The reply body could not be read
    Body(String),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::Connection(msg) => write!(f, "connection failed: {}", msg),
            TransportError::Status { code, .. } => write!(f, "endpoint returned status {}", code),
            TransportError::Body(msg) => write!(f, "unreadable response body: {}", msg),
        }
    }
}

impl std::error::Error for TransportError {}

/// Ships a rendered program to a query endpoint.
pub trait Transport {
    /// Submit one program and return the raw reply.
    fn submit(&self, program: &str) -> Result<RawResponse, TransportError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn submit(&self, program: &str) -> Result<RawResponse, TransportError> {
        (**self).submit(program)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn submit(&self, program: &str) -> Result<RawResponse, TransportError> {
        (**self).submit(program)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo;

    impl Transport for Echo {
        fn submit(&self, program: &str) -> Result<RawResponse, TransportError> {
            Ok(RawResponse {
                status: 200,
                content_type: None,
                body: program.to_string(),
            })
        }
    }

    #[test]
    fn test_forwarding_impls() {
        let boxed: Box<dyn Transport> = Box::new(Echo);
        assert_eq!(boxed.submit("out;").unwrap().body, "out;");
        assert_eq!((&Echo).submit("node;").unwrap().body, "node;");
    }

    #[test]
    fn test_is_success() {
        let mut resp = RawResponse {
            status: 204,
            content_type: None,
            body: String::new(),
        };
        assert!(resp.is_success());
        resp.status = 400;
        assert!(!resp.is_success());
    }
}
