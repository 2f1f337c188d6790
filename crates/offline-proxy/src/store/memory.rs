//! In-memory cache storage.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::ProxyResult;
use crate::identity::ResourceIdentity;
use crate::types::Artifact;

use super::{Cache, CacheStorage};

/// Process-local storage. Clones share the same generations.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    generations: Arc<RwLock<BTreeMap<String, Arc<MemoryCache>>>>,
}

/// One in-memory generation.
#[derive(Debug)]
pub struct MemoryCache {
    name: String,
    entries: RwLock<HashMap<ResourceIdentity, Artifact>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MemoryCache {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            entries: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl Cache for MemoryCache {
    fn name(&self) -> &str {
        &self.name
    }

    async fn get(&self, key: &ResourceIdentity) -> ProxyResult<Option<Artifact>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn put(&self, key: &ResourceIdentity, artifact: &Artifact) -> ProxyResult<()> {
        self.entries
            .write()
            .await
            .insert(key.clone(), artifact.clone());
        debug!(cache = %self.name, identity = %key, "stored in memory");
        Ok(())
    }

    async fn keys(&self) -> ProxyResult<Vec<ResourceIdentity>> {
        let mut keys: Vec<_> = self.entries.read().await.keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }
}

#[async_trait]
impl CacheStorage for MemoryStorage {
    async fn open(&self, name: &str) -> ProxyResult<Arc<dyn Cache>> {
        let mut generations = self.generations.write().await;
        let cache: Arc<dyn Cache> = generations
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(MemoryCache::new(name)))
            .clone();
        Ok(cache)
    }

    async fn names(&self) -> ProxyResult<Vec<String>> {
        Ok(self.generations.read().await.keys().cloned().collect())
    }

    async fn delete(&self, name: &str) -> ProxyResult<bool> {
        let removed = self.generations.write().await.remove(name).is_some();
        if removed {
            debug!(cache = name, "deleted generation");
        }
        Ok(removed)
    }
}
