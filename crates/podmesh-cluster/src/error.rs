use podmesh_transport::TransportError;

/// Errors from one discovery round against the control plane.
///
/// None of these ever leave the reconciliation loop: `DiscoverySource::fetch`
/// logs them and degrades to an empty peer set.
#[derive(Debug, thiserror::Error)]
pub enum DiscoveryError {
    #[error("control plane rejected service account authorization: {body}")]
    Unauthorized { body: String },

    #[error("control plane query failed with status {status}: {body}")]
    Query { status: u16, body: String },

    #[error("control plane unreachable: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("undecodable control plane response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid discovery query: {0}")]
    InvalidQuery(String),
}

/// Plain discriminant of a [`DiscoveryError`], cheap to copy into events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiscoveryErrorKind {
    Unauthorized,
    Query,
    Transport,
    Decode,
    InvalidQuery,
}

impl DiscoveryError {
    pub fn kind(&self) -> DiscoveryErrorKind {
        match self {
            DiscoveryError::Unauthorized { .. } => DiscoveryErrorKind::Unauthorized,
            DiscoveryError::Query { .. } => DiscoveryErrorKind::Query,
            DiscoveryError::Transport(_) => DiscoveryErrorKind::Transport,
            DiscoveryError::Decode(_) => DiscoveryErrorKind::Decode,
            DiscoveryError::InvalidQuery(_) => DiscoveryErrorKind::InvalidQuery,
        }
    }
}

impl From<url::ParseError> for DiscoveryError {
    fn from(e: url::ParseError) -> Self {
        DiscoveryError::InvalidQuery(e.to_string())
    }
}

/// A failed connect attempt for one peer.
#[derive(Debug, thiserror::Error)]
pub enum ConnectError {
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
}

/// Invalid cluster configuration, reported before anything is spawned.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("node basename must not be empty")]
    EmptyBasename,

    #[error("node basename {0:?} must not contain '@'")]
    InvalidBasename(String),

    #[error("control plane host must not be empty")]
    EmptyMaster,

    #[error("poll interval must be greater than zero")]
    ZeroPollInterval,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_unauthorized() {
        let err = DiscoveryError::Unauthorized {
            body: "forbidden".into(),
        };
        assert_eq!(
            err.to_string(),
            "control plane rejected service account authorization: forbidden"
        );
        assert_eq!(err.kind(), DiscoveryErrorKind::Unauthorized);
    }

    #[test]
    fn display_query() {
        let err = DiscoveryError::Query {
            status: 500,
            body: "etcd down".into(),
        };
        assert_eq!(
            err.to_string(),
            "control plane query failed with status 500: etcd down"
        );
        assert_eq!(err.kind(), DiscoveryErrorKind::Query);
    }

    #[test]
    fn decode_from_serde() {
        let serde_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: DiscoveryError = serde_err.into();
        assert_eq!(err.kind(), DiscoveryErrorKind::Decode);
    }

    #[test]
    fn url_error_is_invalid_query() {
        let err: DiscoveryError = url::Url::parse("https://").unwrap_err().into();
        assert_eq!(err.kind(), DiscoveryErrorKind::InvalidQuery);
    }

    #[test]
    fn connect_error_wraps_transport() {
        let err: ConnectError = TransportError::Timeout {
            peer: podmesh_transport::PeerId::new("app", "10.0.0.2"),
            after: std::time::Duration::from_secs(5),
        }
        .into();
        assert_eq!(
            err.to_string(),
            "transport error: connection to app@10.0.0.2 timed out after 5s"
        );
    }

    #[test]
    fn display_config() {
        assert_eq!(
            ConfigError::InvalidBasename("a@b".into()).to_string(),
            "node basename \"a@b\" must not contain '@'"
        );
    }
}
