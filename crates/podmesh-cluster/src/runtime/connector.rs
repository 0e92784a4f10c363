use crate::error::ConnectError;
use crate::types::PeerId;

/// Connect-by-identifier primitive used by the reconciler.
///
/// In production: impl for [`podmesh_transport::TcpConnector`].
/// In tests: impl by `MockConnector` (records attempts).
#[async_trait::async_trait]
pub trait Connector: Send + Sync {
    /// Attempt a transport-level connection to `peer`.
    ///
    /// Must be harmless for an already connected peer.
    async fn try_connect(&self, peer: &PeerId) -> Result<(), ConnectError>;

    /// Attempt a connection and report only whether it worked.
    ///
    /// Entry point for hosts driving a connector by hand; the reconciler
    /// goes through the same logging via [`attempt`].
    async fn connect(&self, peer: &PeerId) -> bool {
        attempt(self, peer).await.is_ok()
    }
}

/// `try_connect` plus the outcome log line.
pub(crate) async fn attempt<C: Connector + ?Sized>(
    connector: &C,
    peer: &PeerId,
) -> Result<(), ConnectError> {
    let result = connector.try_connect(peer).await;
    match &result {
        Ok(()) => tracing::debug!("connect: {peer} ok"),
        Err(e) => tracing::debug!("connect: {peer} failed: {e}"),
    }
    result
}

// ── Impl for TcpConnector (production) ──────────────────────────────

#[async_trait::async_trait]
impl Connector for podmesh_transport::TcpConnector {
    async fn try_connect(&self, peer: &PeerId) -> Result<(), ConnectError> {
        podmesh_transport::TcpConnector::connect(self, peer)
            .await
            .map_err(ConnectError::from)
    }
}

// ── MockConnector (tests) ───────────────────────────────────────────
