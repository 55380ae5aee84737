//! Per-scope sync lease
//!
//! A sync pass over one `(vendor, account, region, kind)` scope holds a lock
//! file under the lease directory. The file is created with `create_new`, so
//! exactly one holder wins; it is removed by [`LeaseGuard`] on release or drop.

use crate::request::SyncRequest;
use crate::syncer::Syncer;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hcm_cloud::{CloudError, Kit, ResourceKind, Result, SyncSummary, Vendor};
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::fs;
use tokio::io::AsyncWriteExt;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Lease timing
#[derive(Debug, Clone)]
pub struct LeaseConfig {
    pub dir: PathBuf,
    /// Age after which a lease is considered abandoned
    pub ttl: Duration,
    /// How long acquisition polls before giving up
    pub wait: Duration,
}

impl LeaseConfig {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            ttl: Duration::from_secs(3600),
            wait: Duration::from_secs(30),
        }
    }
}

/// Identity of a leased scope
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LeaseKey {
    pub vendor: Vendor,
    pub account_id: String,
    pub scope: String,
    pub kind: ResourceKind,
}

impl LeaseKey {
    pub fn new(vendor: Vendor, kind: ResourceKind, req: &SyncRequest) -> Self {
        Self {
            vendor,
            account_id: req.account_id.clone(),
            scope: req.scope_name().to_string(),
            kind,
        }
    }

    fn file_name(&self) -> String {
        let raw = format!(
            "{}-{}-{}-{}.lock",
            self.vendor,
            self.account_id,
            self.scope,
            self.kind.path_segment()
        );
        raw.chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                    c
                } else {
                    '_'
                }
            })
            .collect()
    }
}

impl std::fmt::Display for LeaseKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{}/{}/{}",
            self.vendor, self.account_id, self.scope, self.kind
        )
    }
}

/// Content of a lock file
#[derive(Debug, Serialize, Deserialize)]
struct LeaseInfo {
    holder: String,
    rid: String,
    acquired_at: DateTime<Utc>,
}

/// Issues leases from one directory
#[derive(Debug)]
pub struct LeaseManager {
    config: LeaseConfig,
    holder: String,
}

impl LeaseManager {
    pub fn new(config: LeaseConfig) -> Self {
        let holder = std::env::var("HOSTNAME")
            .or_else(|_| std::env::var("HOST"))
            .unwrap_or_else(|_| "unknown".to_string());
        Self {
            config,
            holder: format!("{}:{}", holder, std::process::id()),
        }
    }

    pub fn config(&self) -> &LeaseConfig {
        &self.config
    }

    fn lease_path(&self, key: &LeaseKey) -> PathBuf {
        self.config.dir.join(key.file_name())
    }

    /// Acquire the lease, polling until the configured wait elapses
    pub async fn acquire(&self, kt: &Kit, key: &LeaseKey) -> Result<LeaseGuard> {
        fs::create_dir_all(&self.config.dir).await?;
        let path = self.lease_path(key);
        let deadline = tokio::time::Instant::now() + self.config.wait;

        loop {
            match self.try_create(kt, &path).await {
                Ok(()) => {
                    tracing::debug!(rid = %kt.rid, lease = %key, "acquired sync lease");
                    return Ok(LeaseGuard {
                        path,
                        released: false,
                    });
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    if self.remove_if_stale(&path).await? {
                        continue;
                    }
                }
                Err(e) => return Err(e.into()),
            }

            if tokio::time::Instant::now() >= deadline {
                let holder = read_info(&path)
                    .await
                    .map(|info| format!("{} since {}", info.holder, info.acquired_at))
                    .unwrap_or_else(|| "another holder".to_string());
                return Err(CloudError::LockError(format!(
                    "{} is being synced by {}",
                    key, holder
                )));
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    async fn try_create(&self, kt: &Kit, path: &Path) -> std::io::Result<()> {
        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .await?;

        let info = LeaseInfo {
            holder: self.holder.clone(),
            rid: kt.rid.clone(),
            acquired_at: Utc::now(),
        };
        let content = serde_json::to_vec_pretty(&info)?;
        file.write_all(&content).await?;
        file.flush().await
    }

    /// Remove the lock file when its holder has exceeded the TTL
    async fn remove_if_stale(&self, path: &Path) -> Result<bool> {
        let acquired_at = match read_info(path).await {
            Some(info) => info.acquired_at,
            // Half-written lock: judge by the file's mtime
            None => match fs::metadata(path).await.and_then(|m| m.modified()) {
                Ok(modified) => DateTime::<Utc>::from(modified),
                Err(e) if e.kind() == ErrorKind::NotFound => return Ok(true),
                Err(e) => return Err(e.into()),
            },
        };

        let age = Utc::now()
            .signed_duration_since(acquired_at)
            .to_std()
            .unwrap_or_default();
        if age < self.config.ttl {
            return Ok(false);
        }

        tracing::warn!(path = %path.display(), "removing stale sync lease");
        match fs::remove_file(path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(true),
            Err(e) => Err(e.into()),
        }
    }
}

async fn read_info(path: &Path) -> Option<LeaseInfo> {
    let content = fs::read_to_string(path).await.ok()?;
    serde_json::from_str(&content).ok()
}

/// RAII guard of an acquired lease
#[derive(Debug)]
pub struct LeaseGuard {
    path: PathBuf,
    released: bool,
}

impl LeaseGuard {
    /// Release the lease
    pub async fn release(mut self) -> Result<()> {
        if !self.released {
            match fs::remove_file(&self.path).await {
                Ok(()) => tracing::debug!("released sync lease"),
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
            self.released = true;
        }
        Ok(())
    }
}

impl Drop for LeaseGuard {
    fn drop(&mut self) {
        if !self.released {
            let _ = std::fs::remove_file(&self.path);
        }
    }
}

/// Syncer decorator that holds the scope lease for the whole pass
pub struct LeasedSyncer {
    inner: Arc<dyn Syncer>,
    leases: Arc<LeaseManager>,
}

impl LeasedSyncer {
    pub fn new(inner: Arc<dyn Syncer>, leases: Arc<LeaseManager>) -> Self {
        Self { inner, leases }
    }
}

#[async_trait]
impl Syncer for LeasedSyncer {
    fn vendor(&self) -> Vendor {
        self.inner.vendor()
    }

    fn kind(&self) -> ResourceKind {
        self.inner.kind()
    }

    fn validate_request(&self, req: &SyncRequest) -> Result<()> {
        self.inner.validate_request(req)
    }

    async fn sync(&self, kt: &Kit, req: &SyncRequest) -> Result<SyncSummary> {
        self.inner.validate_request(req)?;
        let key = LeaseKey::new(self.vendor(), self.kind(), req);
        let guard = self.leases.acquire(kt, &key).await?;
        let result = self.inner.sync(kt, req).await;
        guard.release().await?;
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn manager(dir: &Path, wait_ms: u64) -> LeaseManager {
        LeaseManager::new(LeaseConfig {
            dir: dir.to_path_buf(),
            ttl: Duration::from_secs(3600),
            wait: Duration::from_millis(wait_ms),
        })
    }

    fn key(kind: ResourceKind) -> LeaseKey {
        LeaseKey::new(
            Vendor::Azure,
            kind,
            &SyncRequest::new("acc/1", "").with_resource_group("rg-prod"),
        )
    }

    #[tokio::test]
    async fn test_contention_and_release() {
        let temp_dir = tempdir().unwrap();
        let leases = manager(temp_dir.path(), 250);
        let kt = Kit::new();

        let guard = leases.acquire(&kt, &key(ResourceKind::Subnet)).await.unwrap();
        let err = leases
            .acquire(&kt, &key(ResourceKind::Subnet))
            .await
            .unwrap_err();
        assert!(matches!(err, CloudError::LockError(_)));

        // A different kind in the same scope is independent
        let vpc = leases.acquire(&kt, &key(ResourceKind::Vpc)).await.unwrap();

        guard.release().await.unwrap();
        drop(vpc);

        let again = leases.acquire(&kt, &key(ResourceKind::Subnet)).await;
        assert!(again.is_ok());
        let again_vpc = leases.acquire(&kt, &key(ResourceKind::Vpc)).await;
        assert!(again_vpc.is_ok());
    }

    #[tokio::test]
    async fn test_stale_lease_is_taken_over() {
        let temp_dir = tempdir().unwrap();
        let leases = manager(temp_dir.path(), 0);
        let key = key(ResourceKind::Vpc);

        let stale = LeaseInfo {
            holder: "crashed-host".to_string(),
            rid: "r".to_string(),
            acquired_at: Utc::now() - chrono::Duration::hours(2),
        };
        std::fs::write(
            leases.lease_path(&key),
            serde_json::to_string(&stale).unwrap(),
        )
        .unwrap();

        assert!(leases.acquire(&Kit::new(), &key).await.is_ok());
    }

    #[test]
    fn test_file_name_is_sanitized() {
        assert_eq!(
            key(ResourceKind::NetworkInterface).file_name(),
            "azure-acc_1-rg-prod-network_interfaces.lock"
        );
    }
}
