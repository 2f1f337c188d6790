//! Precache loader.
//!
//! Fills the current generation with the manifest at install time. Under
//! [`PrecacheStrategy::PerEntry`] a bad entry is logged and skipped; under
//! [`PrecacheStrategy::Atomic`] the first failure fails the install and
//! nothing is written.

use std::collections::HashSet;
use std::fmt;

use tracing::{debug, info, warn};

use crate::config::{Deployment, PrecacheStrategy};
use crate::error::ProxyResult;
use crate::identity::ResourceIdentity;
use crate::network::Fetcher;
use crate::store::Cache;

/// Why a manifest entry was not cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Entry is in the exclusion set.
    Excluded,

    /// Origin answered with something other than 200.
    Status(u16),

    /// Fetch failed.
    Network(String),

    /// Store rejected the write.
    Store(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Excluded => write!(f, "excluded"),
            Self::Status(status) => write!(f, "HTTP {}", status),
            Self::Network(message) => write!(f, "network: {}", message),
            Self::Store(message) => write!(f, "store: {}", message),
        }
    }
}

/// A skipped manifest entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedEntry {
    pub identity: ResourceIdentity,
    pub reason: SkipReason,
}

/// Outcome of the install phase.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrecacheReport {
    /// Entries now in the cache, in manifest order.
    pub cached: Vec<ResourceIdentity>,

    /// Entries that were not cached.
    pub skipped: Vec<SkippedEntry>,
}

impl PrecacheReport {
    /// Whether every manifest entry was cached.
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }
}

/// Precache the deployment manifest into `cache`.
pub async fn precache(
    cache: &dyn Cache,
    fetcher: &dyn Fetcher,
    deployment: &Deployment,
) -> ProxyResult<PrecacheReport> {
    let mut report = PrecacheReport::default();
    let mut seen = HashSet::new();
    let mut eligible = Vec::with_capacity(deployment.manifest.len());

    for identity in &deployment.manifest {
        if !seen.insert(identity) {
            debug!(identity = %identity, "duplicate manifest entry");
            continue;
        }
        if deployment.is_excluded(identity) {
            warn!(identity = %identity, "skipped (excluded manifest entry)");
            report.skipped.push(SkippedEntry {
                identity: identity.clone(),
                reason: SkipReason::Excluded,
            });
            continue;
        }
        eligible.push(identity.clone());
    }

    info!(
        cache = cache.name(),
        entries = eligible.len(),
        strategy = %deployment.precache_strategy,
        "precaching manifest"
    );

    match deployment.precache_strategy {
        PrecacheStrategy::Atomic => {
            cache.put_all(fetcher, &eligible).await?;
            report.cached = eligible;
        }
        PrecacheStrategy::PerEntry => {
            for identity in eligible {
                match precache_entry(cache, fetcher, &identity).await {
                    Ok(()) => {
                        debug!(identity = %identity, "cached");
                        report.cached.push(identity);
                    }
                    Err(reason) => {
                        warn!(identity = %identity, reason = %reason, "skipped manifest entry");
                        report.skipped.push(SkippedEntry { identity, reason });
                    }
                }
            }
        }
    }

    info!(
        cache = cache.name(),
        cached = report.cached.len(),
        skipped = report.skipped.len(),
        "precache finished"
    );
    Ok(report)
}

async fn precache_entry(
    cache: &dyn Cache,
    fetcher: &dyn Fetcher,
    identity: &ResourceIdentity,
) -> Result<(), SkipReason> {
    let artifact = fetcher
        .fetch(identity)
        .await
        .map_err(|e| SkipReason::Network(e.to_string()))?;

    if artifact.status != 200 {
        return Err(SkipReason::Status(artifact.status));
    }

    cache
        .put(identity, &artifact)
        .await
        .map_err(|e| SkipReason::Store(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ProxyError, ProxyResult};
    use crate::store::{CacheStorage, MemoryStorage};
    use crate::types::Artifact;
    use async_trait::async_trait;

    fn id(path: &str) -> ResourceIdentity {
        ResourceIdentity::parse(path).unwrap()
    }

    /// `/missing*` → 404, `/down*` → network error, `/created` → 201, else 200.
    struct SiteFetcher;

    #[async_trait]
    impl Fetcher for SiteFetcher {
        async fn fetch(&self, identity: &ResourceIdentity) -> ProxyResult<Artifact> {
            let path = identity.path();
            if path.starts_with("/missing") {
                Ok(Artifact::new(404, "nope"))
            } else if path.starts_with("/down") {
                Err(ProxyError::Network {
                    message: "connection refused".to_string(),
                })
            } else if path == "/created" {
                Ok(Artifact::new(201, "created"))
            } else {
                Ok(Artifact::new(200, format!("content of {}", path)))
            }
        }
    }

    fn deployment(manifest: &[&str], exclude: &[&str]) -> Deployment {
        Deployment::new(
            "v1",
            manifest.iter().map(|p| id(p)).collect(),
            exclude.iter().map(|p| id(p)),
            id("/404.html"),
            id("/offline.html"),
        )
    }

    #[tokio::test]
    async fn test_per_entry_isolates_failures() {
        let storage = MemoryStorage::new();
        let cache = storage.open("v1").await.unwrap();
        let deployment = deployment(
            &["/index.html", "/missing.css", "/down.js", "/created", "/404.html"],
            &[],
        );

        let report = precache(cache.as_ref(), &SiteFetcher, &deployment)
            .await
            .unwrap();

        assert_eq!(report.cached, vec![id("/index.html"), id("/404.html")]);
        assert_eq!(report.skipped.len(), 3);
        assert_eq!(report.skipped[0].reason, SkipReason::Status(404));
        assert!(matches!(report.skipped[1].reason, SkipReason::Network(_)));
        assert_eq!(report.skipped[2].reason, SkipReason::Status(201));
        assert!(!report.is_complete());

        assert_eq!(
            cache.keys().await.unwrap(),
            vec![id("/404.html"), id("/index.html")]
        );
    }

    #[tokio::test]
    async fn test_excluded_manifest_entry_never_cached() {
        let storage = MemoryStorage::new();
        let cache = storage.open("v1").await.unwrap();
        let deployment = deployment(&["/index.html", "/no-cache.html"], &["/no-cache.html"]);

        let report = precache(cache.as_ref(), &SiteFetcher, &deployment)
            .await
            .unwrap();

        assert_eq!(report.cached, vec![id("/index.html")]);
        assert_eq!(report.skipped[0].reason, SkipReason::Excluded);
        assert!(cache.get(&id("/no-cache.html")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicates_fetched_once() {
        let storage = MemoryStorage::new();
        let cache = storage.open("v1").await.unwrap();
        let deployment = deployment(&["/a", "/b", "/a"], &[]);

        let report = precache(cache.as_ref(), &SiteFetcher, &deployment)
            .await
            .unwrap();

        assert_eq!(report.cached, vec![id("/a"), id("/b")]);
        assert!(report.is_complete());
    }

    #[tokio::test]
    async fn test_atomic_fails_whole_install() {
        let storage = MemoryStorage::new();
        let cache = storage.open("v1").await.unwrap();
        let deployment = deployment(&["/index.html", "/missing.css"], &[])
            .with_precache_strategy(PrecacheStrategy::Atomic);

        let err = precache(cache.as_ref(), &SiteFetcher, &deployment)
            .await
            .unwrap_err();

        assert!(matches!(err, ProxyError::Precache { .. }));
        assert!(cache.keys().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_atomic_success_caches_everything() {
        let storage = MemoryStorage::new();
        let cache = storage.open("v1").await.unwrap();
        let deployment = deployment(&["/index.html", "/404.html", "/skip.html"], &["/skip.html"])
            .with_precache_strategy(PrecacheStrategy::Atomic);

        let report = precache(cache.as_ref(), &SiteFetcher, &deployment)
            .await
            .unwrap();

        assert_eq!(report.cached, vec![id("/index.html"), id("/404.html")]);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(cache.keys().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_empty_manifest() {
        let storage = MemoryStorage::new();
        let cache = storage.open("v1").await.unwrap();

        let report = precache(cache.as_ref(), &SiteFetcher, &deployment(&[], &[]))
            .await
            .unwrap();

        assert!(report.cached.is_empty());
        assert!(report.is_complete());
    }

    #[test]
    fn test_skip_reason_display() {
        assert_eq!(SkipReason::Excluded.to_string(), "excluded");
        assert_eq!(SkipReason::Status(503).to_string(), "HTTP 503");
        assert_eq!(
            SkipReason::Network("timeout".to_string()).to_string(),
            "network: timeout"
        );
    }
}
