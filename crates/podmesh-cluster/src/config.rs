//! Cluster discovery configuration.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;
use crate::runtime::RuntimeConfig;
use crate::types::{
    DEFAULT_CLUSTER_DOMAIN, DEFAULT_MASTER, DEFAULT_POLL_INTERVAL_MS,
    DEFAULT_SERVICE_ACCOUNT_DIR, PEER_ID_SEPARATOR,
};

/// Which control-plane resource lists the candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LookupMode {
    /// `pods`, filtered to the `Running` phase.
    #[default]
    Pods,
    /// `endpoints`, every ready address of every subset.
    Endpoints,
}

impl LookupMode {
    /// Resource segment of the API path.
    pub fn resource(self) -> &'static str {
        match self {
            LookupMode::Pods => "pods",
            LookupMode::Endpoints => "endpoints",
        }
    }
}

/// How a discovered IP becomes the host half of a peer identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AddressMode {
    /// Host is the IP itself.
    #[default]
    Ip,
    /// Host is the pod DNS name: `10-0-0-4.<namespace>.pod.<cluster_domain>`.
    Dns,
}

/// Configuration for Kubernetes-backed discovery.
///
/// Only `node_basename` is required. Use the builder pattern:
///
/// ```rust
/// use std::time::Duration;
/// use podmesh_cluster::{ClusterConfig, LookupMode};
///
/// let config = ClusterConfig::new("app")
///     .selector("app=myapp,tier=backend")
///     .lookup(LookupMode::Endpoints)
///     .poll_interval(Duration::from_secs(10));
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterConfig {
    /// Left half of every discovered peer identity.
    pub node_basename: String,
    /// Raw label selector. Encoded when the query URL is built.
    pub selector: String,
    /// API server host (optionally `host:port`).
    pub master: String,
    /// Namespace override. When unset, read from the service account.
    pub namespace: Option<String>,
    /// Directory holding the `token` and `namespace` files.
    pub service_account_dir: PathBuf,
    pub lookup: LookupMode,
    pub address: AddressMode,
    /// DNS suffix for [`AddressMode::Dns`].
    pub cluster_domain: String,
    /// Delay between the end of one round and the start of the next.
    pub poll_interval: Duration,
}

impl ClusterConfig {
    /// Create a config with defaults for everything except the basename.
    pub fn new(node_basename: impl Into<String>) -> Self {
        Self {
            node_basename: node_basename.into(),
            selector: String::new(),
            master: DEFAULT_MASTER.to_string(),
            namespace: None,
            service_account_dir: PathBuf::from(DEFAULT_SERVICE_ACCOUNT_DIR),
            lookup: LookupMode::default(),
            address: AddressMode::default(),
            cluster_domain: DEFAULT_CLUSTER_DOMAIN.to_string(),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
        }
    }

    pub fn selector(mut self, selector: impl Into<String>) -> Self {
        self.selector = selector.into();
        self
    }

    pub fn master(mut self, master: impl Into<String>) -> Self {
        self.master = master.into();
        self
    }

    /// Query this namespace instead of the service account's.
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn service_account_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.service_account_dir = dir.into();
        self
    }

    pub fn lookup(mut self, lookup: LookupMode) -> Self {
        self.lookup = lookup;
        self
    }

    pub fn address(mut self, address: AddressMode) -> Self {
        self.address = address;
        self
    }

    pub fn cluster_domain(mut self, domain: impl Into<String>) -> Self {
        self.cluster_domain = domain.into();
        self
    }

    /// Set the poll interval (default: 5s).
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Check the invariants discovery relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.node_basename.is_empty() {
            return Err(ConfigError::EmptyBasename);
        }
        if self.node_basename.contains(PEER_ID_SEPARATOR) {
            return Err(ConfigError::InvalidBasename(self.node_basename.clone()));
        }
        if self.master.is_empty() {
            return Err(ConfigError::EmptyMaster);
        }
        if self.poll_interval.is_zero() {
            return Err(ConfigError::ZeroPollInterval);
        }
        Ok(())
    }

    /// Scheduler settings derived from this config.
    pub fn runtime_config(&self) -> RuntimeConfig {
        RuntimeConfig {
            poll_interval: self.poll_interval,
            ..RuntimeConfig::default()
        }
    }
}
