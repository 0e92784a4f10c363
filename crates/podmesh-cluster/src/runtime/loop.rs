//! The reconciliation event loop.
//!
//! A single async task that owns the reconciler and multiplexes over the
//! next-tick timer and application commands. A tick runs to completion
//! before anything else is looked at, so ticks never overlap and commands
//! always observe a committed peer set.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::discovery::DiscoverySource;

use super::connector::Connector;
use super::reconciler::Reconciler;
use super::RuntimeCommand;

/// Main event loop: first tick immediately, then `poll_interval` after
/// each completed tick.
pub(super) async fn runtime_loop<S: DiscoverySource, C: Connector>(
    mut reconciler: Reconciler<S, C>,
    poll_interval: Duration,
    mut cmd_rx: mpsc::Receiver<RuntimeCommand>,
) {
    let next_tick = tokio::time::sleep(Duration::ZERO);
    tokio::pin!(next_tick);

    loop {
        tokio::select! {
            // ── 1. Timer: reconciliation round ──────────────────
            () = &mut next_tick => {
                let report = reconciler.tick().await;
                tracing::trace!(?report, "runtime: tick done");
                next_tick.as_mut().reset(Instant::now() + poll_interval);
            }

            // ── 2. Commands from application ────────────────────
            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(RuntimeCommand::GetKnownPeers { reply }) => {
                        let _ = reply.send(reconciler.known().clone());
                    }
                    Some(RuntimeCommand::Shutdown) => break,
                    None => {
                        tracing::debug!("runtime: all handles dropped");
                        break;
                    }
                }
            }
        }
    }

    tracing::info!(ticks = reconciler.state().ticks(), "runtime: stopped");
}
