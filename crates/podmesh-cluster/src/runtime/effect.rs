use crate::types::PeerId;

/// Intent produced by the pure logic of [`ReconcilerState`](super::ReconcilerState).
///
/// Planning a tick returns `Vec<ReconcileEffect>`; the executor then carries
/// the effects out through the connector and the event channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileEffect {
    /// A peer vanished from discovery. Logged, never disconnected.
    ObserveRemoved(PeerId),

    /// A peer appeared in discovery. Attempt a connection.
    Connect(PeerId),
}
