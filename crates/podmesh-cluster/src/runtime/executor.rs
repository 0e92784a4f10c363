//! Effect executor: the only place that touches I/O.
//!
//! Takes the planned effects of one tick and executes them in order:
//! - ObserveRemoved -> log + PeerRemoved event
//! - Connect -> connector::attempt(), PeerConnected / PeerConnectFailed event
//!
//! A failed connect never stops the remaining effects.

use tokio::sync::mpsc;

use crate::types::PeerId;

use super::connector::{attempt, Connector};
use super::effect::ReconcileEffect;
use super::MeshEvent;

/// What happened to the connect effects of one tick.
#[derive(Debug, Default)]
pub(super) struct ExecutionOutcome {
    pub connected: Vec<PeerId>,
    pub failed: Vec<PeerId>,
}

/// Execute a list of effects using the given connector and event channel.
pub(super) async fn execute_effects<C: Connector + ?Sized>(
    effects: Vec<ReconcileEffect>,
    connector: &C,
    event_tx: Option<&mpsc::Sender<MeshEvent>>,
) -> ExecutionOutcome {
    let mut outcome = ExecutionOutcome::default();

    for effect in effects {
        match effect {
            ReconcileEffect::ObserveRemoved(peer) => {
                tracing::info!("reconcile: {peer} no longer discovered, leaving its connection to the transport");
                emit(event_tx, MeshEvent::PeerRemoved { peer });
            }
            ReconcileEffect::Connect(peer) => match attempt(connector, &peer).await {
                Ok(()) => {
                    outcome.connected.push(peer.clone());
                    emit(event_tx, MeshEvent::PeerConnected { peer });
                }
                Err(e) => {
                    outcome.failed.push(peer.clone());
                    emit(
                        event_tx,
                        MeshEvent::PeerConnectFailed {
                            peer,
                            reason: e.to_string(),
                        },
                    );
                }
            },
        }
    }

    outcome
}

/// try_send: never stall the tick on a slow event consumer.
pub(super) fn emit(event_tx: Option<&mpsc::Sender<MeshEvent>>, event: MeshEvent) {
    if let Some(tx) = event_tx {
        let _ = tx.try_send(event);
    }
}
