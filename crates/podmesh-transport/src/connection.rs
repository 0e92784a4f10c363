use crate::{PeerId, TransportError};

use std::collections::HashMap;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::Mutex;

/// Caches TCP connections per peer. First `get_or_connect()` dials,
/// subsequent calls reuse the cached stream while it is still open.
pub(crate) struct ConnectionPool {
    connections: Mutex<HashMap<PeerId, TcpStream>>,
    port: u16,
    connect_timeout: Duration,
}

/// Result of a pool lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Checkout {
    /// A live cached connection was found.
    Reused,
    /// A new connection was opened.
    Opened,
}

impl ConnectionPool {
    pub fn new(port: u16, connect_timeout: Duration) -> Self {
        Self {
            connections: Mutex::new(HashMap::new()),
            port,
            connect_timeout,
        }
    }

    /// Reuse a live connection or dial a new one.
    pub async fn get_or_connect(&self, target: &PeerId) -> Result<Checkout, TransportError> {
        let mut conns = self.connections.lock().await;

        if let Some(stream) = conns.get(target) {
            if is_alive(stream).await {
                return Ok(Checkout::Reused);
            }
            // Remote closed or socket errored, dial again below
            conns.remove(target);
        }

        let dial = TcpStream::connect((target.host(), self.port));
        let stream = match tokio::time::timeout(self.connect_timeout, dial).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => {
                return Err(TransportError::Connect {
                    peer: target.clone(),
                    source: e,
                })
            }
            Err(_) => {
                return Err(TransportError::Timeout {
                    peer: target.clone(),
                    after: self.connect_timeout,
                })
            }
        };

        conns.insert(target.clone(), stream);
        Ok(Checkout::Opened)
    }

    /// Drop a cached connection. Returns whether one existed.
    pub async fn remove(&self, target: &PeerId) -> bool {
        self.connections.lock().await.remove(target).is_some()
    }

    /// List all peers with a live cached connection.
    pub async fn connected_peers(&self) -> Vec<PeerId> {
        let conns = self.connections.lock().await;
        let mut peers = Vec::with_capacity(conns.len());
        for (id, stream) in conns.iter() {
            if is_alive(stream).await {
                peers.push(id.clone());
            }
        }
        peers.sort();
        peers
    }
}

/// A stream is dead once the remote closed it (peek yields EOF) or the
/// socket carries a pending error. Pending inbound bytes count as alive.
async fn is_alive(stream: &TcpStream) -> bool {
    if !matches!(stream.take_error(), Ok(None)) {
        return false;
    }
    let mut probe = [0u8; 1];
    // Timeout polls the peek once before looking at the (zero) deadline.
    match tokio::time::timeout(Duration::ZERO, stream.peek(&mut probe)).await {
        Ok(Ok(0)) | Ok(Err(_)) => false,
        Ok(Ok(_)) | Err(_) => true,
    }
}
