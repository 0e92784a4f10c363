//! Discovery module for podmesh.
//!
//! One discovery round asks the control plane which peers currently exist.
//! Handles: service account credentials, the label-selected query, and
//! decoding the response into peer identities.

pub mod kubernetes;
pub mod response;
pub mod service_account;

pub use kubernetes::{query_url, KubernetesSource};
pub use response::decode_response;
pub use service_account::ServiceAccount;

use crate::error::{DiscoveryError, DiscoveryErrorKind};
use crate::types::PeerSet;

/// A source of candidate peers, queried once per tick.
///
/// In production: [`KubernetesSource`].
/// In tests: any fake that returns canned sets or errors.
#[async_trait::async_trait]
pub trait DiscoverySource: Send + Sync {
    /// Run one discovery round, reporting the failure kind if it fails.
    async fn try_fetch(&self) -> Result<PeerSet, DiscoveryError>;

    /// Run one discovery round. Never fails: errors are logged and
    /// become the empty set.
    async fn fetch(&self) -> PeerSet {
        degrade(self.try_fetch().await).0
    }
}

/// Collapse a round result into the set the reconciler acts on, logging
/// the failure at the severity its kind calls for.
pub(crate) fn degrade(
    result: Result<PeerSet, DiscoveryError>,
) -> (PeerSet, Option<DiscoveryErrorKind>) {
    match result {
        Ok(peers) => (peers, None),
        Err(e) => {
            log_failure(&e);
            (PeerSet::new(), Some(e.kind()))
        }
    }
}

fn log_failure(err: &DiscoveryError) {
    match err {
        DiscoveryError::Unauthorized { body } => {
            tracing::warn!(
                "discovery: unauthorized, service account lacks permission to list peers: {body}"
            );
        }
        DiscoveryError::Query { status, body } => {
            tracing::warn!(status, "discovery: query failed: {body}");
        }
        DiscoveryError::Transport(e) => {
            tracing::error!("discovery: request failed: {e}");
        }
        DiscoveryError::Decode(e) => {
            tracing::error!("discovery: bad response body: {e}");
        }
        DiscoveryError::InvalidQuery(reason) => {
            tracing::error!("discovery: cannot build query: {reason}");
        }
    }
}
