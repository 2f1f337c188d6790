//! Versioned cache store.
//!
//! A [`CacheStorage`] holds any number of named generations. Each
//! generation, opened as a [`Cache`], maps a [`ResourceIdentity`] to an
//! [`Artifact`]. A lookup miss is `Ok(None)`, never an error.
//!
//! Two backends ship with the crate:
//! - [`MemoryStorage`]: process-local maps, for tests and embedding hosts
//! - [`DiskStorage`]: one directory per generation, integrity-checked on read

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::try_join_all;
use tracing::debug;

use crate::error::{ProxyError, ProxyResult};
use crate::identity::ResourceIdentity;
use crate::network::Fetcher;
use crate::types::Artifact;

mod disk;
mod memory;

pub use disk::{DiskCache, DiskStorage, EntryMeta};
pub use memory::{MemoryCache, MemoryStorage};

/// One opened cache generation.
#[async_trait]
pub trait Cache: Send + Sync {
    /// Generation name this handle was opened with.
    fn name(&self) -> &str;

    /// Look up an artifact.
    async fn get(&self, key: &ResourceIdentity) -> ProxyResult<Option<Artifact>>;

    /// Store an artifact, replacing any previous one for the key.
    async fn put(&self, key: &ResourceIdentity, artifact: &Artifact) -> ProxyResult<()>;

    /// All stored identities, sorted.
    async fn keys(&self) -> ProxyResult<Vec<ResourceIdentity>>;

    /// Fetch every key and store the results.
    ///
    /// All fetches must complete with status 200 before anything is
    /// written; the first failure fails the whole call.
    async fn put_all(&self, fetcher: &dyn Fetcher, keys: &[ResourceIdentity]) -> ProxyResult<()> {
        let fetched = try_join_all(keys.iter().map(|key| async move {
            let artifact = fetcher
                .fetch(key)
                .await
                .map_err(|e| ProxyError::Precache {
                    identity: key.to_string(),
                    reason: e.to_string(),
                })?;

            if artifact.status != 200 {
                return Err(ProxyError::Precache {
                    identity: key.to_string(),
                    reason: format!("HTTP {}", artifact.status),
                });
            }

            Ok::<_, ProxyError>((key, artifact))
        }))
        .await?;

        for (key, artifact) in &fetched {
            self.put(key, artifact).await?;
        }

        debug!(cache = self.name(), count = fetched.len(), "stored batch");
        Ok(())
    }
}

/// The set of named generations.
#[async_trait]
pub trait CacheStorage: Send + Sync {
    /// Open a generation, creating it if it does not exist.
    async fn open(&self, name: &str) -> ProxyResult<Arc<dyn Cache>>;

    /// Names of all existing generations, sorted.
    async fn names(&self) -> ProxyResult<Vec<String>>;

    /// Delete a generation. Returns `false` if it did not exist.
    async fn delete(&self, name: &str) -> ProxyResult<bool>;
}
