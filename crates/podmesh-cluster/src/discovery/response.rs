//! Control plane response decoding.
//!
//! Only the fields discovery needs are modelled; everything else in the
//! Kubernetes list objects is ignored.

use reqwest::StatusCode;
use serde::Deserialize;

use crate::config::{AddressMode, ClusterConfig, LookupMode};
use crate::error::DiscoveryError;
use crate::types::{PeerId, PeerSet, RUNNING_PHASE};

#[derive(Debug, Deserialize)]
struct PodList {
    #[serde(default)]
    items: Option<Vec<Pod>>,
}

#[derive(Debug, Deserialize)]
struct Pod {
    #[serde(default)]
    status: Option<PodStatus>,
}

#[derive(Debug, Deserialize)]
struct PodStatus {
    #[serde(default)]
    phase: Option<String>,
    #[serde(default, rename = "podIP")]
    pod_ip: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EndpointsList {
    #[serde(default)]
    items: Option<Vec<Endpoints>>,
}

#[derive(Debug, Deserialize)]
struct Endpoints {
    #[serde(default)]
    subsets: Option<Vec<EndpointSubset>>,
}

#[derive(Debug, Deserialize)]
struct EndpointSubset {
    #[serde(default)]
    addresses: Option<Vec<EndpointAddress>>,
}

#[derive(Debug, Deserialize)]
struct EndpointAddress {
    ip: String,
}

/// Turn a control plane reply into the discovered peer set.
///
/// - 2xx: decode the body per the configured lookup mode
/// - 403: [`DiscoveryError::Unauthorized`]
/// - anything else: [`DiscoveryError::Query`] carrying status and body
pub fn decode_response(
    status: StatusCode,
    body: &str,
    config: &ClusterConfig,
    namespace: &str,
) -> Result<PeerSet, DiscoveryError> {
    if status == StatusCode::FORBIDDEN {
        return Err(DiscoveryError::Unauthorized {
            body: body.to_string(),
        });
    }
    if !status.is_success() {
        return Err(DiscoveryError::Query {
            status: status.as_u16(),
            body: body.to_string(),
        });
    }

    let ips = match config.lookup {
        LookupMode::Pods => running_pod_ips(body)?,
        LookupMode::Endpoints => endpoint_ips(body)?,
    };

    Ok(ips
        .into_iter()
        .map(|ip| PeerId::new(config.node_basename.as_str(), peer_host(&ip, config, namespace)))
        .collect())
}

fn running_pod_ips(body: &str) -> Result<Vec<String>, DiscoveryError> {
    let list: PodList = serde_json::from_str(body)?;
    let mut ips = Vec::new();
    for status in list.items.unwrap_or_default().into_iter().filter_map(|p| p.status) {
        if status.phase.as_deref() != Some(RUNNING_PHASE) {
            continue;
        }
        match status.pod_ip {
            Some(ip) if !ip.is_empty() => ips.push(ip),
            _ => tracing::debug!("discovery: running pod has no IP yet, skipping"),
        }
    }
    Ok(ips)
}

fn endpoint_ips(body: &str) -> Result<Vec<String>, DiscoveryError> {
    let list: EndpointsList = serde_json::from_str(body)?;
    Ok(list
        .items
        .unwrap_or_default()
        .into_iter()
        .flat_map(|e| e.subsets.unwrap_or_default())
        .flat_map(|s| s.addresses.unwrap_or_default())
        .map(|a| a.ip)
        .filter(|ip| !ip.is_empty())
        .collect())
}

/// Host half of a peer identity for a discovered IP.
pub fn peer_host(ip: &str, config: &ClusterConfig, namespace: &str) -> String {
    match config.address {
        AddressMode::Ip => ip.to_string(),
        AddressMode::Dns => format!(
            "{}.{namespace}.pod.{}",
            ip.replace(|c: char| c == '.' || c == ':', "-"),
            config.cluster_domain
        ),
    }
}
