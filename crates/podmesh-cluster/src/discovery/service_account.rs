//! Service account credentials mounted into the pod.
//!
//! Both files are optional from our point of view: a missing or unreadable
//! file yields an empty string, and the control plane decides what to do
//! with an empty token or namespace.

use std::path::{Path, PathBuf};

/// File holding the bearer token.
pub const TOKEN_FILE: &str = "token";

/// File holding the pod's namespace.
pub const NAMESPACE_FILE: &str = "namespace";

/// Reads credentials from a service account directory.
#[derive(Debug, Clone)]
pub struct ServiceAccount {
    dir: PathBuf,
}

impl ServiceAccount {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Bearer token, or empty if absent.
    pub async fn token(&self) -> String {
        read_trimmed(&self.dir.join(TOKEN_FILE)).await
    }

    /// Namespace, or empty if absent.
    pub async fn namespace(&self) -> String {
        read_trimmed(&self.dir.join(NAMESPACE_FILE)).await
    }
}

async fn read_trimmed(path: &Path) -> String {
    match tokio::fs::read_to_string(path).await {
        Ok(contents) => contents.trim().to_string(),
        Err(e) => {
            tracing::debug!("service account: cannot read {}: {e}", path.display());
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reads_and_trims_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(TOKEN_FILE), "s3cr3t\n").unwrap();
        std::fs::write(dir.path().join(NAMESPACE_FILE), "  prod \n").unwrap();

        let account = ServiceAccount::new(dir.path());
        assert_eq!(account.token().await, "s3cr3t");
        assert_eq!(account.namespace().await, "prod");
    }

    #[tokio::test]
    async fn missing_files_are_empty() {
        let dir = tempfile::tempdir().unwrap();
        let account = ServiceAccount::new(dir.path().join("nope"));
        assert_eq!(account.token().await, "");
        assert_eq!(account.namespace().await, "");
    }
}
