//! Disk-backed cache storage.
//!
//! Provides caching with integrity verification on read.
//!
//! # Layout
//!
//! ```text
//! {root}/{generation}/{sha256(identity)}/
//!   entry.rec        # One JSON line (identity, status, headers, body digest), then the body
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ProxyResult;
use crate::identity::ResourceIdentity;
use crate::types::Artifact;

use super::{Cache, CacheStorage};

mod evict;
mod io;
mod keys;
mod put;
mod read;

/// Metadata stored alongside each body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryMeta {
    /// Identity the entry was stored under.
    pub identity: ResourceIdentity,

    /// HTTP status.
    pub status: u16,

    /// Response headers.
    #[serde(default)]
    pub headers: std::collections::BTreeMap<String, String>,

    /// Body digest (sha256:...).
    pub digest: String,

    /// When the entry was written.
    pub stored_at: DateTime<Utc>,
}

/// Storage rooted at a directory; each generation is a subdirectory.
#[derive(Debug, Clone)]
pub struct DiskStorage {
    root: PathBuf,
}

/// One generation on disk.
#[derive(Debug, Clone)]
pub struct DiskCache {
    name: String,
    dir: PathBuf,
}

impl DiskStorage {
    /// Create storage in the default location.
    ///
    /// Default: `{cache_dir}/offline-proxy`
    pub fn new() -> ProxyResult<Self> {
        Ok(Self {
            root: io::default_cache_dir_impl()?,
        })
    }

    /// Create storage rooted at a custom directory.
    pub fn with_dir(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl DiskCache {
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn entry_dir(&self, key: &ResourceIdentity) -> PathBuf {
        keys::entry_dir_impl(&self.dir, key)
    }

    fn entry_file(&self, key: &ResourceIdentity) -> PathBuf {
        self.entry_dir(key).join(keys::ENTRY_FILE)
    }

    /// Read an entry's metadata without loading the body.
    pub async fn metadata(&self, key: &ResourceIdentity) -> Option<EntryMeta> {
        read::read_meta_impl(&self.entry_dir(key)).await
    }
}

#[async_trait]
impl Cache for DiskCache {
    fn name(&self) -> &str {
        &self.name
    }

    async fn get(&self, key: &ResourceIdentity) -> ProxyResult<Option<Artifact>> {
        read::get_impl(self, key).await
    }

    async fn put(&self, key: &ResourceIdentity, artifact: &Artifact) -> ProxyResult<()> {
        put::put_impl(self, key, artifact).await
    }

    async fn keys(&self) -> ProxyResult<Vec<ResourceIdentity>> {
        read::keys_impl(self).await
    }
}

#[async_trait]
impl CacheStorage for DiskStorage {
    async fn open(&self, name: &str) -> ProxyResult<Arc<dyn Cache>> {
        keys::validate_generation_name_impl(name)?;
        let dir = self.root.join(name);
        io::ensure_dir_impl(&dir).await?;
        Ok(Arc::new(DiskCache {
            name: name.to_string(),
            dir,
        }))
    }

    async fn names(&self) -> ProxyResult<Vec<String>> {
        read::generation_names_impl(&self.root).await
    }

    async fn delete(&self, name: &str) -> ProxyResult<bool> {
        keys::validate_generation_name_impl(name)?;
        evict::delete_generation_impl(&self.root, name).await
    }
}
