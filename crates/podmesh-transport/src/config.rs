use std::time::Duration;

use crate::PeerId;

/// Environment variable overriding the default peer port.
pub const PEER_PORT_ENV: &str = "PODMESH_PEER_PORT";

/// Port peers listen on when nothing else is configured.
pub const DEFAULT_PEER_PORT: u16 = 9000;

/// Configuration for a [`TcpConnector`](crate::TcpConnector).
///
/// All fields have sensible defaults. Use the builder pattern:
///
/// ```rust
/// use std::time::Duration;
/// use podmesh_transport::ConnectorConfig;
///
/// let config = ConnectorConfig::new()
///     .port(7946)
///     .connect_timeout(Duration::from_secs(2));
/// ```
#[derive(Debug, Clone)]
pub struct ConnectorConfig {
    /// TCP port every peer listens on.
    pub(crate) port: u16,
    /// Upper bound for a single connect attempt.
    pub(crate) connect_timeout: Duration,
    /// This process's own identity. Connecting to it is a no-op.
    pub(crate) local: Option<PeerId>,
}

impl Default for ConnectorConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectorConfig {
    /// Create a new config with defaults.
    ///
    /// If the `PODMESH_PEER_PORT` environment variable holds a valid port it
    /// is used instead of [`DEFAULT_PEER_PORT`]. This can be overridden with
    /// [`.port()`](Self::port).
    pub fn new() -> Self {
        let port = std::env::var(PEER_PORT_ENV)
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_PEER_PORT);

        Self {
            port,
            connect_timeout: Duration::from_secs(5),
            local: None,
        }
    }

    /// Set the port peers listen on.
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the connect timeout (default: 5s).
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Declare this process's own identity so discovery results that include
    /// it do not open a socket to ourselves.
    pub fn local(mut self, local: PeerId) -> Self {
        self.local = Some(local);
        self
    }

    /// The configured peer port.
    pub fn peer_port(&self) -> u16 {
        self.port
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_overrides_defaults() {
        let local = PeerId::new("app", "10.0.0.1");
        let config = ConnectorConfig::new()
            .port(7000)
            .connect_timeout(Duration::from_millis(250))
            .local(local.clone());

        assert_eq!(config.peer_port(), 7000);
        assert_eq!(config.connect_timeout, Duration::from_millis(250));
        assert_eq!(config.local, Some(local));
    }

    #[test]
    fn default_timeout_is_five_seconds() {
        assert_eq!(ConnectorConfig::default().connect_timeout, Duration::from_secs(5));
    }
}
