//! Cache version reaper.
//!
//! Deletes every generation except the current one. Deletions run
//! concurrently; a failed delete is logged and reported, never fatal.

use futures::future::join_all;
use tracing::{info, warn};

use crate::error::ProxyResult;
use crate::store::CacheStorage;

/// Outcome of the activation phase.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReapReport {
    /// Generations removed.
    pub deleted: Vec<String>,

    /// Generations that could not be removed, with the error.
    pub failed: Vec<(String, String)>,
}

/// Delete all generations other than `current`.
///
/// Only listing the generations can fail the call.
pub async fn reap_stale_generations(
    storage: &dyn CacheStorage,
    current: &str,
) -> ProxyResult<ReapReport> {
    let stale: Vec<String> = storage
        .names()
        .await?
        .into_iter()
        .filter(|name| name != current)
        .collect();

    if stale.is_empty() {
        info!(current, "no stale generations");
        return Ok(ReapReport::default());
    }

    let outcomes = join_all(stale.into_iter().map(|name| async move {
        info!(cache = %name, "deleting old cache");
        let outcome = storage.delete(&name).await;
        (name, outcome)
    }))
    .await;

    let mut report = ReapReport::default();
    for (name, outcome) in outcomes {
        match outcome {
            Ok(_) => report.deleted.push(name),
            Err(e) => {
                warn!(cache = %name, error = %e, "failed to delete old cache");
                report.failed.push((name, e.to_string()));
            }
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use async_trait::async_trait;

    use crate::error::ProxyError;
    use crate::store::{Cache, MemoryStorage};

    /// Refuses to delete one generation.
    struct StubbornStorage {
        inner: MemoryStorage,
        stubborn: &'static str,
    }

    #[async_trait]
    impl CacheStorage for StubbornStorage {
        async fn open(&self, name: &str) -> ProxyResult<Arc<dyn Cache>> {
            self.inner.open(name).await
        }

        async fn names(&self) -> ProxyResult<Vec<String>> {
            self.inner.names().await
        }

        async fn delete(&self, name: &str) -> ProxyResult<bool> {
            if name == self.stubborn {
                return Err(ProxyError::Cache {
                    message: "permission denied".to_string(),
                });
            }
            self.inner.delete(name).await
        }
    }

    #[tokio::test]
    async fn test_only_current_generation_remains() {
        let storage = MemoryStorage::new();
        storage.open("v1").await.unwrap();
        storage.open("v2").await.unwrap();

        let report = reap_stale_generations(&storage, "v2").await.unwrap();

        assert_eq!(report.deleted, vec!["v1"]);
        assert!(report.failed.is_empty());
        assert_eq!(storage.names().await.unwrap(), vec!["v2"]);
    }

    #[tokio::test]
    async fn test_first_deployment_has_nothing_to_reap() {
        let storage = MemoryStorage::new();

        let report = reap_stale_generations(&storage, "v1").await.unwrap();
        assert_eq!(report, ReapReport::default());

        storage.open("v1").await.unwrap();
        let report = reap_stale_generations(&storage, "v1").await.unwrap();
        assert_eq!(report, ReapReport::default());
        assert_eq!(storage.names().await.unwrap(), vec!["v1"]);
    }

    #[tokio::test]
    async fn test_current_absent_deletes_everything_else() {
        let storage = MemoryStorage::new();
        storage.open("old-a").await.unwrap();
        storage.open("old-b").await.unwrap();

        let report = reap_stale_generations(&storage, "new").await.unwrap();

        assert_eq!(report.deleted.len(), 2);
        assert!(storage.names().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failed_delete_does_not_stop_others() {
        let storage = StubbornStorage {
            inner: MemoryStorage::new(),
            stubborn: "v1",
        };
        for name in ["v0", "v1", "v2", "v3"] {
            storage.open(name).await.unwrap();
        }

        let report = reap_stale_generations(&storage, "v3").await.unwrap();

        assert_eq!(report.deleted, vec!["v0", "v2"]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, "v1");
        assert_eq!(storage.names().await.unwrap(), vec!["v1", "v3"]);
    }
}
