use serde::Serialize;
use std::io::Write;
use std::time::{SystemTime, UNIX_EPOCH};

use podmesh_cluster::{DiscoveryErrorKind, MeshEvent};

/// Emit a JSONL event to stdout (flushed immediately for piped output).
pub fn emit<T: Serialize>(event: &T) {
    if let Ok(json) = serde_json::to_string(event) {
        let stdout = std::io::stdout();
        let mut lock = stdout.lock();
        let _ = writeln!(lock, "{json}");
        let _ = lock.flush();
    }
}

pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

// ── Session events ──────────────────────────────────────────────

#[derive(Serialize)]
pub struct EventStarted {
    pub event: &'static str,
    pub basename: String,
    pub selector: String,
    pub master: String,
    pub poll_interval_ms: u64,
    pub timestamp_ms: u64,
}

#[derive(Serialize)]
pub struct EventStopped {
    pub event: &'static str,
    pub known: usize,
    pub timestamp_ms: u64,
}

// ── Mesh events ─────────────────────────────────────────────────

#[derive(Serialize)]
pub struct EventPeer {
    pub event: &'static str,
    pub peer: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub timestamp_ms: u64,
}

#[derive(Serialize)]
pub struct EventDiscoveryFailed {
    pub event: &'static str,
    pub kind: &'static str,
    pub timestamp_ms: u64,
}

#[derive(Serialize)]
pub struct EventTick {
    pub event: &'static str,
    pub tick: u64,
    pub known: usize,
    pub added: usize,
    pub removed: usize,
    pub timestamp_ms: u64,
}

fn kind_name(kind: DiscoveryErrorKind) -> &'static str {
    match kind {
        DiscoveryErrorKind::Unauthorized => "unauthorized",
        DiscoveryErrorKind::Query => "query",
        DiscoveryErrorKind::Transport => "transport",
        DiscoveryErrorKind::Decode => "decode",
        DiscoveryErrorKind::InvalidQuery => "invalid_query",
    }
}

/// Write one runtime event as a JSONL line.
pub fn emit_mesh(event: &MeshEvent) {
    let timestamp_ms = now_ms();
    match event {
        MeshEvent::PeerConnected { peer } => emit(&EventPeer {
            event: "peer_connected",
            peer: peer.to_string(),
            reason: None,
            timestamp_ms,
        }),
        MeshEvent::PeerConnectFailed { peer, reason } => emit(&EventPeer {
            event: "peer_connect_failed",
            peer: peer.to_string(),
            reason: Some(reason.clone()),
            timestamp_ms,
        }),
        MeshEvent::PeerRemoved { peer } => emit(&EventPeer {
            event: "peer_removed",
            peer: peer.to_string(),
            reason: None,
            timestamp_ms,
        }),
        MeshEvent::DiscoveryFailed { kind } => emit(&EventDiscoveryFailed {
            event: "discovery_failed",
            kind: kind_name(*kind),
            timestamp_ms,
        }),
        MeshEvent::TickCompleted {
            tick,
            known,
            added,
            removed,
        } => emit(&EventTick {
            event: "tick",
            tick: *tick,
            known: *known,
            added: *added,
            removed: *removed,
            timestamp_ms,
        }),
    }
}
