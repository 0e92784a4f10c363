use std::collections::BTreeSet;

pub use podmesh_transport::{PeerId, PEER_ID_SEPARATOR};

/// A set of peers. Ordered so logs and connect attempts are deterministic.
pub type PeerSet = BTreeSet<PeerId>;

/// Interval between the end of one discovery round and the start of the next (5 seconds).
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 5_000;

/// In-cluster DNS name of the API server.
pub const DEFAULT_MASTER: &str = "kubernetes.default.svc.cluster.local";

/// Where Kubernetes mounts the pod's service account.
pub const DEFAULT_SERVICE_ACCOUNT_DIR: &str = "/var/run/secrets/kubernetes.io/serviceaccount";

/// Cluster DNS suffix used by [`AddressMode::Dns`](crate::AddressMode::Dns).
pub const DEFAULT_CLUSTER_DOMAIN: &str = "cluster.local";

/// Pod phase a candidate must report to be connectable.
pub const RUNNING_PHASE: &str = "Running";
