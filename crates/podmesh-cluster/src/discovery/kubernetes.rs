//! Kubernetes API discovery source.
//!
//! One round = read credentials, one authenticated GET against the API
//! server, decode. TLS verification is disabled: the in-cluster API server
//! presents a certificate signed by the cluster CA, which we do not load.

use url::Url;

use super::response::decode_response;
use super::service_account::ServiceAccount;
use super::DiscoverySource;
use crate::config::ClusterConfig;
use crate::error::DiscoveryError;
use crate::types::PeerSet;

/// Discovers peers by listing pods (or endpoints) matching a label selector.
pub struct KubernetesSource {
    client: reqwest::Client,
    config: ClusterConfig,
    service_account: ServiceAccount,
}

impl KubernetesSource {
    /// Build the source and its HTTP client.
    pub fn new(config: ClusterConfig) -> Result<Self, DiscoveryError> {
        let client = reqwest::Client::builder()
            .danger_accept_invalid_certs(true)
            .build()?;
        let service_account = ServiceAccount::new(config.service_account_dir.clone());

        Ok(Self {
            client,
            config,
            service_account,
        })
    }

    /// Configured namespace, else the one the service account lives in.
    async fn namespace(&self) -> String {
        match &self.config.namespace {
            Some(ns) => ns.clone(),
            None => self.service_account.namespace().await,
        }
    }

    /// The authenticated list request for one round in `namespace`.
    async fn request(&self, namespace: &str) -> Result<reqwest::Request, DiscoveryError> {
        let token = self.service_account.token().await;
        let url = query_url(&self.config, namespace)?;
        Ok(self.client.get(url).bearer_auth(token).build()?)
    }
}

/// `https://<master>/api/v1/namespaces/<ns>/<resource>?labelSelector=<selector>`
pub fn query_url(config: &ClusterConfig, namespace: &str) -> Result<Url, DiscoveryError> {
    let mut url = Url::parse(&format!(
        "https://{}/api/v1/namespaces/{namespace}/{}",
        config.master,
        config.lookup.resource()
    ))?;
    url.query_pairs_mut()
        .append_pair("labelSelector", &config.selector);
    Ok(url)
}

#[async_trait::async_trait]
impl DiscoverySource for KubernetesSource {
    async fn try_fetch(&self) -> Result<PeerSet, DiscoveryError> {
        let namespace = self.namespace().await;
        let request = self.request(&namespace).await?;

        tracing::debug!(url = %request.url(), "discovery: querying control plane");
        let response = self.client.execute(request).await?;
        let status = response.status();
        let body = response.text().await?;

        let peers = decode_response(status, &body, &self.config, &namespace)?;
        tracing::debug!(count = peers.len(), "discovery: round complete");
        Ok(peers)
    }
}

impl std::fmt::Debug for KubernetesSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubernetesSource")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LookupMode;
    use crate::error::DiscoveryErrorKind;

    #[test]
    fn url_encodes_selector() {
        let config = ClusterConfig::new("app")
            .master("10.96.0.1:443")
            .selector("app=myapp,tier in (web, api)");
        let url = query_url(&config, "prod").unwrap();
        assert_eq!(
            url.as_str(),
            "https://10.96.0.1/api/v1/namespaces/prod/pods?labelSelector=app%3Dmyapp%2Ctier+in+%28web%2C+api%29"
        );
    }

    #[test]
    fn url_keeps_explicit_port_and_resource() {
        let config = ClusterConfig::new("app")
            .master("127.0.0.1:6443")
            .lookup(LookupMode::Endpoints);
        let url = query_url(&config, "default").unwrap();
        assert_eq!(
            url.as_str(),
            "https://127.0.0.1:6443/api/v1/namespaces/default/endpoints?labelSelector="
        );
    }

    #[test]
    fn url_rejects_bad_master() {
        let config = ClusterConfig::new("app").master("bad host");
        let err = query_url(&config, "default").unwrap_err();
        assert_eq!(err.kind(), DiscoveryErrorKind::InvalidQuery);
    }

    #[tokio::test]
    async fn namespace_override_wins() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("namespace"), "from-file").unwrap();

        let config = ClusterConfig::new("app").service_account_dir(dir.path());
        let source = KubernetesSource::new(config.clone()).unwrap();
        assert_eq!(source.namespace().await, "from-file");

        let source = KubernetesSource::new(config.namespace("explicit")).unwrap();
        assert_eq!(source.namespace().await, "explicit");
    }

    #[tokio::test]
    async fn request_carries_token_and_file_namespace() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("token"), "s3cr3t\n").unwrap();
        std::fs::write(dir.path().join("namespace"), "prod\n").unwrap();

        let config = ClusterConfig::new("app")
            .master("10.96.0.1")
            .selector("app=myapp")
            .service_account_dir(dir.path());
        let source = KubernetesSource::new(config).unwrap();

        let namespace = source.namespace().await;
        let request = source.request(&namespace).await.unwrap();

        assert_eq!(request.method(), reqwest::Method::GET);
        assert_eq!(
            request.url().as_str(),
            "https://10.96.0.1/api/v1/namespaces/prod/pods?labelSelector=app%3Dmyapp"
        );
        let auth = request
            .headers()
            .get(reqwest::header::AUTHORIZATION)
            .unwrap()
            .to_str()
            .unwrap();
        assert_eq!(auth, "Bearer s3cr3t");
    }

    #[tokio::test]
    async fn request_without_token_file_sends_empty_bearer() {
        let dir = tempfile::tempdir().unwrap();
        let config = ClusterConfig::new("app")
            .master("10.96.0.1")
            .namespace("prod")
            .service_account_dir(dir.path());
        let source = KubernetesSource::new(config).unwrap();

        let request = source.request("prod").await.unwrap();
        assert_eq!(request.url().path(), "/api/v1/namespaces/prod/pods");
        assert!(request
            .headers()
            .get(reqwest::header::AUTHORIZATION)
            .is_some());
    }

    #[tokio::test]
    async fn unreachable_master_is_transport_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let dir = tempfile::tempdir().unwrap();
        let config = ClusterConfig::new("app")
            .master(format!("127.0.0.1:{port}"))
            .service_account_dir(dir.path());
        let source = KubernetesSource::new(config).unwrap();

        let err = source.try_fetch().await.unwrap_err();
        assert_eq!(err.kind(), DiscoveryErrorKind::Transport);
        assert!(source.fetch().await.is_empty());
    }
}
