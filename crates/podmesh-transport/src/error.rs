use std::time::Duration;

use crate::PeerId;

/// Errors returned by the podmesh transport layer.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("connection to {peer} failed: {source}")]
    Connect {
        peer: PeerId,
        #[source]
        source: std::io::Error,
    },

    #[error("connection to {peer} timed out after {after:?}")]
    Timeout { peer: PeerId, after: Duration },

    #[error("invalid peer id: {0}")]
    InvalidPeerId(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_timeout() {
        let err = TransportError::Timeout {
            peer: PeerId::new("app", "10.0.0.9"),
            after: Duration::from_secs(5),
        };
        assert_eq!(err.to_string(), "connection to app@10.0.0.9 timed out after 5s");
    }

    #[test]
    fn display_connect() {
        let err = TransportError::Connect {
            peer: PeerId::new("app", "10.0.0.9"),
            source: std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused"),
        };
        assert_eq!(err.to_string(), "connection to app@10.0.0.9 failed: refused");
        assert!(std::error::Error::source(&err).is_some());
    }
}
