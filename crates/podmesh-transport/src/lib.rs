//! podmesh transport layer.
//!
//! Peer identities plus a connect-by-identifier primitive backed by a
//! pool of TCP connections. The reconciliation loop in `podmesh-cluster`
//! only needs "connect to this peer, tell me if it worked"; this crate
//! provides that and nothing more.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use podmesh_transport::{ConnectorConfig, PeerId, TcpConnector};
//!
//! # async fn example() -> Result<(), podmesh_transport::TransportError> {
//! let connector = TcpConnector::new(ConnectorConfig::new().port(9000));
//!
//! let peer: PeerId = "app@10.0.3.7".parse()?;
//! connector.connect(&peer).await?;
//!
//! // Already connected: no new socket is opened.
//! connector.connect(&peer).await?;
//! assert_eq!(connector.connected_peers().await, vec![peer]);
//! # Ok(())
//! # }
//! ```

mod config;
mod connection;
mod connector;
mod error;

pub use config::ConnectorConfig;
pub use connector::TcpConnector;
pub use error::TransportError;

use std::fmt;
use std::str::FromStr;

/// Separator between base name and host in the textual form of a [`PeerId`].
pub const PEER_ID_SEPARATOR: char = '@';

/// Identity of a cluster peer: configured base name plus network address.
///
/// Displayed and parsed as `basename@host`. Two identities are equal iff
/// both halves match.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PeerId {
    basename: String,
    host: String,
}

impl PeerId {
    /// Build an identity from its two halves.
    pub fn new(basename: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            basename: basename.into(),
            host: host.into(),
        }
    }

    /// The configured base name (left half).
    pub fn basename(&self) -> &str {
        &self.basename
    }

    /// The discovered host or IP (right half).
    pub fn host(&self) -> &str {
        &self.host
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{PEER_ID_SEPARATOR}{}", self.basename, self.host)
    }
}

impl fmt::Debug for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PeerId({self})")
    }
}

impl FromStr for PeerId {
    type Err = TransportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let Some((basename, host)) = s.split_once(PEER_ID_SEPARATOR) else {
            return Err(TransportError::InvalidPeerId(s.to_string()));
        };
        if basename.is_empty() || host.is_empty() || host.contains(PEER_ID_SEPARATOR) {
            return Err(TransportError::InvalidPeerId(s.to_string()));
        }
        Ok(Self::new(basename, host))
    }
}

impl serde::Serialize for PeerId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> serde::Deserialize<'de> for PeerId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
