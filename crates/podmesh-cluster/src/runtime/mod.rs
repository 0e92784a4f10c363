//! Reconciliation runtime: drives the reconciler on a fixed cadence.
//!
//! The runtime owns a discovery source, a connector and the known peer set.
//! It exposes a channel-based API so the host application never touches
//! reconciler internals.

mod connector;
mod effect;
mod executor;
mod r#loop;
mod reconciler;
mod state;

pub use connector::Connector;
pub use effect::ReconcileEffect;
pub use reconciler::{Reconciler, TickReport};
pub use state::{diff, PeerDiff, ReconcilerState};

use std::time::Duration;

use tokio::sync::{mpsc, oneshot};

use crate::discovery::DiscoverySource;
use crate::error::DiscoveryErrorKind;
use crate::types::{PeerId, PeerSet, DEFAULT_POLL_INTERVAL_MS};

// ── Configuration ─────────────────────────────────────────────────────

/// Configuration for the reconciliation runtime.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Delay between the end of one tick and the start of the next.
    pub poll_interval: Duration,
    /// Capacity of the event channel. Events beyond it are dropped.
    pub event_buffer: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            event_buffer: 256,
        }
    }
}

// ── Commands (app → runtime) ──────────────────────────────────────────

/// Commands the application sends to the runtime event loop.
pub enum RuntimeCommand {
    /// Request the current known peer set.
    GetKnownPeers { reply: oneshot::Sender<PeerSet> },
    /// Stop the loop. The pending next tick is dropped.
    Shutdown,
}

// ── Events (runtime → app) ───────────────────────────────────────────

/// Reconciliation events the application may want to observe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MeshEvent {
    /// A newly discovered peer was connected.
    PeerConnected { peer: PeerId },
    /// A connect attempt to a newly discovered peer failed.
    PeerConnectFailed { peer: PeerId, reason: String },
    /// A known peer is no longer discovered. No disconnect was issued.
    PeerRemoved { peer: PeerId },
    /// Discovery failed; the round used the empty set.
    DiscoveryFailed { kind: DiscoveryErrorKind },
    /// A tick finished and the known set was replaced.
    TickCompleted {
        tick: u64,
        known: usize,
        added: usize,
        removed: usize,
    },
}

// ── RuntimeHandle (app-facing API) ───────────────────────────────────

/// Handle to communicate with a running MeshRuntime.
///
/// Cheap to clone. The loop stops once every handle is dropped.
#[derive(Clone)]
pub struct RuntimeHandle {
    cmd_tx: mpsc::Sender<RuntimeCommand>,
}

impl RuntimeHandle {
    /// Current known peer set, as of the last completed tick.
    ///
    /// Empty if the runtime has stopped.
    pub async fn known_peers(&self) -> PeerSet {
        let (tx, rx) = oneshot::channel();
        let _ = self
            .cmd_tx
            .send(RuntimeCommand::GetKnownPeers { reply: tx })
            .await;
        rx.await.unwrap_or_default()
    }

    /// Graceful shutdown.
    pub async fn shutdown(&self) {
        let _ = self.cmd_tx.send(RuntimeCommand::Shutdown).await;
    }

    /// Whether the loop has stopped.
    pub fn is_closed(&self) -> bool {
        self.cmd_tx.is_closed()
    }
}

// ── RuntimeChannels ──────────────────────────────────────────────────

/// Channels returned to the application when the runtime starts.
pub struct RuntimeChannels {
    /// Handle to send commands to the runtime.
    pub handle: RuntimeHandle,
    /// Receive reconciliation events.
    pub events: mpsc::Receiver<MeshEvent>,
}

// ── MeshRuntime ──────────────────────────────────────────────────────

/// The reconciliation runtime: spawn it and communicate via channels.
pub struct MeshRuntime;

impl MeshRuntime {
    /// Create and start the runtime.
    ///
    /// Takes ownership of the discovery source and connector. The first
    /// tick runs immediately. Spawns the event loop as a tokio task.
    pub fn spawn<S, C>(source: S, connector: C, config: RuntimeConfig) -> RuntimeChannels
    where
        S: DiscoverySource + 'static,
        C: Connector + 'static,
    {
        // Command channel (app → runtime)
        let (cmd_tx, cmd_rx) = mpsc::channel::<RuntimeCommand>(16);

        // Event channel (runtime → app)
        let (event_tx, event_rx) = mpsc::channel::<MeshEvent>(config.event_buffer.max(1));

        let reconciler = Reconciler::new(source, connector).with_events(event_tx);

        tokio::spawn(r#loop::runtime_loop(reconciler, config.poll_interval, cmd_rx));

        RuntimeChannels {
            handle: RuntimeHandle { cmd_tx },
            events: event_rx,
        }
    }
}
