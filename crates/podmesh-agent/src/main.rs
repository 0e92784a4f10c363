mod events;

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use podmesh_cluster::types::{
    DEFAULT_CLUSTER_DOMAIN, DEFAULT_MASTER, DEFAULT_POLL_INTERVAL_MS, DEFAULT_SERVICE_ACCOUNT_DIR,
};
use podmesh_cluster::discovery::response::peer_host;
use podmesh_cluster::{
    AddressMode, ClusterConfig, KubernetesSource, LookupMode, MeshEvent, MeshRuntime, PeerId,
    ServiceAccount,
};
use podmesh_transport::{ConnectorConfig, TcpConnector};

#[derive(Parser)]
#[command(
    name = "podmesh-agent",
    about = "Keep this pod connected to its Kubernetes peers"
)]
struct Cli {
    /// Left half of every peer identity (`basename@host`).
    #[arg(long, env = "PODMESH_BASENAME")]
    basename: String,

    /// Label selector choosing the peer pods, e.g. `app=myapp`.
    #[arg(long, env = "PODMESH_SELECTOR", default_value = "")]
    selector: String,

    /// Kubernetes API host.
    #[arg(long, env = "PODMESH_MASTER", default_value = DEFAULT_MASTER)]
    master: String,

    /// Namespace to query. Defaults to the service account's namespace.
    #[arg(long, env = "PODMESH_NAMESPACE")]
    namespace: Option<String>,

    /// Directory holding the service account `token` and `namespace` files.
    #[arg(long, env = "PODMESH_SERVICE_ACCOUNT_DIR", default_value = DEFAULT_SERVICE_ACCOUNT_DIR)]
    service_account_dir: PathBuf,

    /// Resource listing the candidates.
    #[arg(long, env = "PODMESH_LOOKUP", value_enum, default_value_t = Lookup::Pods)]
    lookup: Lookup,

    /// How a discovered IP becomes the peer host.
    #[arg(long, env = "PODMESH_ADDRESS_MODE", value_enum, default_value_t = Address::Ip)]
    address_mode: Address,

    /// Cluster DNS domain, used with `--address-mode dns`.
    #[arg(long, env = "PODMESH_CLUSTER_DOMAIN", default_value = DEFAULT_CLUSTER_DOMAIN)]
    cluster_domain: String,

    /// Delay between reconciliation rounds in ms.
    #[arg(long, env = "PODMESH_POLL_INTERVAL_MS", default_value_t = DEFAULT_POLL_INTERVAL_MS)]
    poll_interval_ms: u64,

    /// Port peers listen on. Falls back to PODMESH_PEER_PORT, then 9000.
    #[arg(long)]
    peer_port: Option<u16>,

    /// Upper bound for one connect attempt in ms.
    #[arg(long, env = "PODMESH_CONNECT_TIMEOUT_MS", default_value = "5000")]
    connect_timeout_ms: u64,

    /// This pod's own address, so it never connects to itself.
    #[arg(long, env = "POD_IP")]
    local_address: Option<String>,

    /// Print runtime events as JSONL on stdout.
    #[arg(long)]
    json: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum Lookup {
    Pods,
    Endpoints,
}

#[derive(Clone, Copy, ValueEnum)]
enum Address {
    Ip,
    Dns,
}

impl Cli {
    fn cluster_config(&self) -> ClusterConfig {
        let mut config = ClusterConfig::new(&self.basename)
            .selector(&self.selector)
            .master(&self.master)
            .service_account_dir(&self.service_account_dir)
            .lookup(match self.lookup {
                Lookup::Pods => LookupMode::Pods,
                Lookup::Endpoints => LookupMode::Endpoints,
            })
            .address(match self.address_mode {
                Address::Ip => AddressMode::Ip,
                Address::Dns => AddressMode::Dns,
            })
            .cluster_domain(&self.cluster_domain)
            .poll_interval(Duration::from_millis(self.poll_interval_ms));
        if let Some(ns) = &self.namespace {
            config = config.namespace(ns);
        }
        config
    }

    /// This pod as discovery will report it, so the connector can skip it.
    ///
    /// In DNS mode the host depends on the namespace: the override if set,
    /// else the service account's.
    async fn local_identity(&self, cluster: &ClusterConfig) -> Option<PeerId> {
        let addr = self.local_address.as_deref()?;
        let namespace = match &cluster.namespace {
            Some(ns) => ns.clone(),
            None => {
                ServiceAccount::new(&cluster.service_account_dir)
                    .namespace()
                    .await
            }
        };
        Some(PeerId::new(
            &cluster.node_basename,
            peer_host(addr, cluster, &namespace),
        ))
    }

    fn connector_config(&self, local: Option<PeerId>) -> ConnectorConfig {
        let mut config =
            ConnectorConfig::new().connect_timeout(Duration::from_millis(self.connect_timeout_ms));
        if let Some(port) = self.peer_port {
            config = config.port(port);
        }
        if let Some(local) = local {
            config = config.local(local);
        }
        config
    }
}

/// Waits for Ctrl-C or, on unix, SIGTERM (how Kubernetes stops a pod).
struct ShutdownSignal {
    #[cfg(unix)]
    terminate: Option<tokio::signal::unix::Signal>,
}

impl ShutdownSignal {
    /// Must be called inside the runtime, before the signal can arrive.
    #[cfg(unix)]
    fn install() -> Self {
        use tokio::signal::unix::{signal, SignalKind};
        let terminate = match signal(SignalKind::terminate()) {
            Ok(s) => Some(s),
            Err(e) => {
                tracing::warn!("agent: cannot listen for SIGTERM: {e}");
                None
            }
        };
        Self { terminate }
    }

    #[cfg(not(unix))]
    fn install() -> Self {
        Self {}
    }

    /// Resolves with the name of the signal received.
    #[cfg(unix)]
    async fn recv(&mut self) -> &'static str {
        match self.terminate.as_mut() {
            Some(terminate) => tokio::select! {
                _ = tokio::signal::ctrl_c() => "interrupt",
                _ = terminate.recv() => "terminate",
            },
            None => {
                let _ = tokio::signal::ctrl_c().await;
                "interrupt"
            }
        }
    }

    #[cfg(not(unix))]
    async fn recv(&mut self) -> &'static str {
        let _ = tokio::signal::ctrl_c().await;
        "interrupt"
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut signals = ShutdownSignal::install();

    let cluster = cli.cluster_config();
    cluster.validate()?;
    let runtime_config = cluster.runtime_config();
    let local = cli.local_identity(&cluster).await;
    if let Some(local) = &local {
        tracing::info!(%local, "agent: local identity");
    }

    eprintln!("podmesh-agent v{}", env!("CARGO_PKG_VERSION"));
    if cli.json {
        events::emit(&events::EventStarted {
            event: "started",
            basename: cluster.node_basename.clone(),
            selector: cluster.selector.clone(),
            master: cluster.master.clone(),
            poll_interval_ms: cli.poll_interval_ms,
            timestamp_ms: events::now_ms(),
        });
    }

    let source = KubernetesSource::new(cluster)?;
    let connector = TcpConnector::new(cli.connector_config(local));
    let mut rt = MeshRuntime::spawn(source, connector, runtime_config);

    loop {
        tokio::select! {
            event = rt.events.recv() => {
                let Some(event) = event else { break };
                if cli.json {
                    events::emit_mesh(&event);
                }
                if let MeshEvent::PeerConnectFailed { peer, reason } = &event {
                    tracing::debug!(%peer, "agent: connect failed: {reason}");
                }
            }
            signal = signals.recv() => {
                tracing::info!(signal, "agent: shutting down");
                break;
            }
        }
    }

    let known = rt.handle.known_peers().await.len();
    rt.handle.shutdown().await;
    if cli.json {
        events::emit(&events::EventStopped {
            event: "stopped",
            known,
            timestamp_ms: events::now_ms(),
        });
    }

    Ok(())
}
