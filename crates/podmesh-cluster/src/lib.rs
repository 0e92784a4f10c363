//! podmesh cluster layer.
//!
//! Keeps a process connected to its peers by periodically asking the
//! Kubernetes API which peers exist and reconciling the known peer set
//! against the answer, on top of `podmesh-transport`.
//!
//! Discovery: label-selected pod (or endpoints) listing, running pods only.
//! Reconciliation: full replacement of the known set each tick; new peers
//! get a connect attempt, vanished peers are only observed.

pub mod config;
pub mod discovery;
pub mod error;
pub mod runtime;
pub mod types;

pub use config::{AddressMode, ClusterConfig, LookupMode};
pub use discovery::{DiscoverySource, KubernetesSource, ServiceAccount};
pub use error::{ConfigError, ConnectError, DiscoveryError, DiscoveryErrorKind};
pub use runtime::{
    Connector, MeshEvent, MeshRuntime, PeerDiff, ReconcileEffect, Reconciler, ReconcilerState,
    RuntimeChannels, RuntimeConfig, RuntimeHandle, TickReport,
};
pub use types::{PeerId, PeerSet};
