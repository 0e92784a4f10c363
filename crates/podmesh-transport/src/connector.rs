use crate::config::ConnectorConfig;
use crate::connection::{Checkout, ConnectionPool};
use crate::{PeerId, TransportError};

use std::sync::Arc;

/// Connect-by-identifier over TCP.
///
/// Each [`PeerId`] host is dialed on the configured port. Successful
/// connections are kept in a pool, so connecting to an already connected
/// peer is a no-op. Cheap to clone; clones share the pool.
#[derive(Clone)]
pub struct TcpConnector {
    pool: Arc<ConnectionPool>,
    config: ConnectorConfig,
}

impl TcpConnector {
    /// Create a connector with an empty pool.
    pub fn new(config: ConnectorConfig) -> Self {
        let pool = Arc::new(ConnectionPool::new(config.port, config.connect_timeout));
        Self { pool, config }
    }

    /// Ensure a live connection to `peer` exists.
    ///
    /// Returns immediately when the peer is our own identity or a live
    /// connection is already pooled.
    pub async fn connect(&self, peer: &PeerId) -> Result<(), TransportError> {
        if self.config.local.as_ref() == Some(peer) {
            tracing::debug!("transport: {peer} is the local node, nothing to dial");
            return Ok(());
        }

        match self.pool.get_or_connect(peer).await? {
            Checkout::Reused => tracing::debug!("transport: reusing connection to {peer}"),
            Checkout::Opened => tracing::debug!(
                port = self.config.port,
                "transport: opened connection to {peer}"
            ),
        }
        Ok(())
    }

    /// Force-evict a peer connection from the pool.
    /// The next `connect()` dials again.
    pub async fn disconnect(&self, peer: &PeerId) -> bool {
        self.pool.remove(peer).await
    }

    /// List all currently connected peers, sorted.
    pub async fn connected_peers(&self) -> Vec<PeerId> {
        self.pool.connected_peers().await
    }
}

impl std::fmt::Debug for TcpConnector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TcpConnector")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
