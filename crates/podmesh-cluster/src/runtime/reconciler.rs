//! Membership reconciler: one discovery round plus its consequences.
//!
//! Usable on its own (call [`Reconciler::tick`] from any scheduler) or
//! driven by [`MeshRuntime`](super::MeshRuntime).

use tokio::sync::mpsc;

use crate::discovery::{degrade, DiscoverySource};
use crate::error::DiscoveryErrorKind;
use crate::types::{PeerId, PeerSet};

use super::connector::Connector;
use super::executor::{emit, execute_effects};
use super::state::ReconcilerState;
use super::MeshEvent;

/// Summary of one tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    pub added: Vec<PeerId>,
    pub removed: Vec<PeerId>,
    /// Added peers whose connect attempt succeeded.
    pub connected: Vec<PeerId>,
    /// Added peers whose connect attempt failed.
    pub failed: Vec<PeerId>,
    /// Set when discovery failed and the round used the empty set.
    pub discovery_error: Option<DiscoveryErrorKind>,
}

/// Owns the known peer set and reconciles it against a discovery source.
pub struct Reconciler<S, C> {
    state: ReconcilerState,
    source: S,
    connector: C,
    event_tx: Option<mpsc::Sender<MeshEvent>>,
}

impl<S: DiscoverySource, C: Connector> Reconciler<S, C> {
    pub fn new(source: S, connector: C) -> Self {
        Self {
            state: ReconcilerState::new(),
            source,
            connector,
            event_tx: None,
        }
    }

    /// Report peer changes and failures on this channel.
    pub fn with_events(mut self, event_tx: mpsc::Sender<MeshEvent>) -> Self {
        self.event_tx = Some(event_tx);
        self
    }

    pub fn known(&self) -> &PeerSet {
        self.state.known()
    }

    pub fn state(&self) -> &ReconcilerState {
        &self.state
    }

    /// Run one round: discover, diff, observe removals, connect additions,
    /// then replace the known set. Never fails.
    pub async fn tick(&mut self) -> TickReport {
        let (discovered, discovery_error) = degrade(self.source.try_fetch().await);
        if let Some(kind) = discovery_error {
            emit(self.event_tx.as_ref(), MeshEvent::DiscoveryFailed { kind });
        }

        let (diff, effects) = self.state.plan(&discovered);
        let outcome = execute_effects(effects, &self.connector, self.event_tx.as_ref()).await;
        self.state.commit(discovered);

        if !diff.is_empty() {
            tracing::info!(
                added = diff.added.len(),
                removed = diff.removed.len(),
                known = self.state.known().len(),
                "reconcile: peer set changed"
            );
        }
        emit(
            self.event_tx.as_ref(),
            MeshEvent::TickCompleted {
                tick: self.state.ticks(),
                known: self.state.known().len(),
                added: diff.added.len(),
                removed: diff.removed.len(),
            },
        );

        TickReport {
            added: diff.added,
            removed: diff.removed,
            connected: outcome.connected,
            failed: outcome.failed,
            discovery_error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DiscoveryError;
    use crate::runtime::connector::mock::MockConnector;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    enum Round {
        Peers(&'static [&'static str]),
        Unauthorized,
        QueryFailed,
    }

    /// Replays scripted rounds, then keeps returning the empty set.
    struct Scripted(Mutex<VecDeque<Round>>);

    impl Scripted {
        fn new(rounds: Vec<Round>) -> Self {
            Self(Mutex::new(rounds.into()))
        }
    }

    #[async_trait::async_trait]
    impl DiscoverySource for Scripted {
        async fn try_fetch(&self) -> Result<PeerSet, DiscoveryError> {
            match self.0.lock().unwrap().pop_front() {
                Some(Round::Peers(hosts)) => Ok(set(hosts)),
                Some(Round::Unauthorized) => Err(DiscoveryError::Unauthorized {
                    body: "forbidden".into(),
                }),
                Some(Round::QueryFailed) => Err(DiscoveryError::Query {
                    status: 500,
                    body: "oops".into(),
                }),
                None => Ok(PeerSet::new()),
            }
        }
    }

    fn peer(host: &str) -> PeerId {
        PeerId::new("app", host)
    }

    fn set(hosts: &[&str]) -> PeerSet {
        hosts.iter().map(|h| peer(h)).collect()
    }

    #[tokio::test]
    async fn first_round_connects_all() {
        let connector = MockConnector::new();
        let mut reconciler = Reconciler::new(
            Scripted::new(vec![Round::Peers(&["a", "b"])]),
            connector.clone(),
        );

        let report = reconciler.tick().await;
        assert_eq!(report.added, vec![peer("a"), peer("b")]);
        assert!(report.removed.is_empty());
        assert_eq!(report.connected, vec![peer("a"), peer("b")]);
        assert_eq!(report.discovery_error, None);
        assert_eq!(connector.attempts(), vec![peer("a"), peer("b")]);
        assert_eq!(reconciler.known(), &set(&["a", "b"]));
    }

    #[tokio::test]
    async fn repeated_round_is_quiet() {
        let connector = MockConnector::new();
        let mut reconciler = Reconciler::new(
            Scripted::new(vec![Round::Peers(&["a"]), Round::Peers(&["a"])]),
            connector.clone(),
        );

        reconciler.tick().await;
        connector.clear_attempts();
        let report = reconciler.tick().await;

        assert!(report.added.is_empty());
        assert!(report.removed.is_empty());
        assert!(connector.attempts().is_empty());
    }

    #[tokio::test]
    async fn failed_connect_still_commits_peer() {
        let connector = MockConnector::new();
        connector.refuse(peer("a"));
        let mut reconciler = Reconciler::new(
            Scripted::new(vec![Round::Peers(&["a", "b"]), Round::Peers(&["a", "b"])]),
            connector.clone(),
        );

        let report = reconciler.tick().await;
        assert_eq!(report.failed, vec![peer("a")]);
        assert_eq!(report.connected, vec![peer("b")]);
        assert_eq!(reconciler.known(), &set(&["a", "b"]));

        // Known now, so no retry until it drops out of discovery and returns.
        connector.clear_attempts();
        reconciler.tick().await;
        assert!(connector.attempts().is_empty());
    }

    #[tokio::test]
    async fn query_failure_empties_known_set() {
        let (tx, mut rx) = mpsc::channel(16);
        let mut reconciler = Reconciler::new(
            Scripted::new(vec![Round::Peers(&["a"]), Round::QueryFailed]),
            MockConnector::new(),
        )
        .with_events(tx);

        reconciler.tick().await;
        while rx.try_recv().is_ok() {}

        let report = reconciler.tick().await;
        assert_eq!(report.removed, vec![peer("a")]);
        assert_eq!(report.discovery_error, Some(DiscoveryErrorKind::Query));
        assert!(reconciler.known().is_empty());

        assert!(matches!(
            rx.try_recv(),
            Ok(MeshEvent::DiscoveryFailed { kind: DiscoveryErrorKind::Query })
        ));
        assert!(matches!(rx.try_recv(), Ok(MeshEvent::PeerRemoved { .. })));
        assert!(matches!(
            rx.try_recv(),
            Ok(MeshEvent::TickCompleted { tick: 2, known: 0, added: 0, removed: 1 })
        ));
    }

    #[tokio::test]
    async fn peers_come_back_after_outage() {
        let connector = MockConnector::new();
        let mut reconciler = Reconciler::new(
            Scripted::new(vec![
                Round::Peers(&["a"]),
                Round::Unauthorized,
                Round::Peers(&["a"]),
            ]),
            connector.clone(),
        );

        reconciler.tick().await;
        let outage = reconciler.tick().await;
        assert_eq!(outage.discovery_error, Some(DiscoveryErrorKind::Unauthorized));
        assert_eq!(outage.removed, vec![peer("a")]);

        let recovered = reconciler.tick().await;
        assert_eq!(recovered.added, vec![peer("a")]);
        assert_eq!(connector.attempts(), vec![peer("a"), peer("a")]);
        assert_eq!(reconciler.state().ticks(), 3);
    }
}
