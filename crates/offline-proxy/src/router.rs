//! Request router.
//!
//! Decides, per intercepted request, where the response comes from:
//! 1. Excluded paths: network only, offline page on failure
//! 2. Cache (current generation)
//! 3. Network, storing 200 GET responses and mapping 404 to the not-found page
//! 4. On network failure: cache again, then not-found page for unknown
//!    paths, offline page for known ones
//!
//! Every branch ends in a concrete response.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::Deployment;
use crate::fallback::FallbackPage;
use crate::identity::ResourceIdentity;
use crate::network::Fetcher;
use crate::store::{Cache, CacheStorage};
use crate::types::Artifact;

/// Where a routed response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteSource {
    /// Current cache generation.
    Cache,

    /// Origin, not stored.
    Network,

    /// Origin, stored in the current generation.
    NetworkStored,

    /// Origin, for an excluded path.
    Passthrough,

    /// A precached fallback page.
    Fallback(FallbackPage),

    /// A fallback page that was missing from the cache and was generated.
    Synthesized(FallbackPage),
}

impl fmt::Display for RouteSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cache => write!(f, "cache"),
            Self::Network => write!(f, "network"),
            Self::NetworkStored => write!(f, "network+stored"),
            Self::Passthrough => write!(f, "passthrough"),
            Self::Fallback(page) => write!(f, "fallback:{}", page),
            Self::Synthesized(page) => write!(f, "synthesized:{}", page),
        }
    }
}

/// A routed response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Routed {
    pub artifact: Artifact,
    pub source: RouteSource,
}

impl Routed {
    fn new(artifact: Artifact, source: RouteSource) -> Self {
        Self { artifact, source }
    }
}

/// The fetch interceptor.
#[derive(Clone)]
pub struct Router {
    storage: Arc<dyn CacheStorage>,
    fetcher: Arc<dyn Fetcher>,
    deployment: Arc<Deployment>,
}

impl Router {
    pub fn new(
        storage: Arc<dyn CacheStorage>,
        fetcher: Arc<dyn Fetcher>,
        deployment: Arc<Deployment>,
    ) -> Self {
        Self {
            storage,
            fetcher,
            deployment,
        }
    }

    /// Produce a response for one intercepted request.
    pub async fn route(&self, identity: &ResourceIdentity) -> Routed {
        let cache = match self.storage.open(&self.deployment.cache_name).await {
            Ok(cache) => Some(cache),
            Err(e) => {
                warn!(cache = %self.deployment.cache_name, error = %e, "cannot open cache, routing uncached");
                None
            }
        };
        let cache = cache.as_deref();

        let routed = if self.deployment.is_excluded(identity) {
            self.route_excluded(cache, identity).await
        } else {
            self.route_cache_first(cache, identity).await
        };

        debug!(identity = %identity, source = %routed.source, status = routed.artifact.status, "routed");
        routed
    }

    async fn route_excluded(&self, cache: Option<&dyn Cache>, identity: &ResourceIdentity) -> Routed {
        match self.fetcher.fetch(identity).await {
            Ok(artifact) => Routed::new(artifact, RouteSource::Passthrough),
            Err(e) => {
                warn!(identity = %identity, error = %e, "fetch failed for excluded path");
                self.fallback(cache, FallbackPage::Offline).await
            }
        }
    }

    async fn route_cache_first(
        &self,
        cache: Option<&dyn Cache>,
        identity: &ResourceIdentity,
    ) -> Routed {
        if let Some(hit) = lookup(cache, identity).await {
            return Routed::new(hit, RouteSource::Cache);
        }

        match self.fetcher.fetch(identity).await {
            Ok(artifact) if artifact.status == 200 && identity.is_get() => {
                let stored = match cache {
                    Some(cache) => match cache.put(identity, &artifact).await {
                        Ok(()) => true,
                        Err(e) => {
                            warn!(identity = %identity, error = %e, "failed to cache response");
                            false
                        }
                    },
                    None => false,
                };
                let source = if stored {
                    RouteSource::NetworkStored
                } else {
                    RouteSource::Network
                };
                Routed::new(artifact, source)
            }
            Ok(artifact) if artifact.status == 404 => {
                debug!(identity = %identity, "origin answered 404");
                self.fallback(cache, FallbackPage::NotFound).await
            }
            Ok(artifact) => Routed::new(artifact, RouteSource::Network),
            Err(e) => {
                warn!(identity = %identity, error = %e, "fetch failed, falling back");
                self.recover(cache, identity).await
            }
        }
    }

    async fn recover(&self, cache: Option<&dyn Cache>, identity: &ResourceIdentity) -> Routed {
        if let Some(hit) = lookup(cache, identity).await {
            return Routed::new(hit, RouteSource::Cache);
        }

        let known =
            self.deployment.in_manifest(identity) || self.deployment.is_excluded(identity);
        if known {
            self.fallback(cache, FallbackPage::Offline).await
        } else {
            self.fallback(cache, FallbackPage::NotFound).await
        }
    }

    async fn fallback(&self, cache: Option<&dyn Cache>, page: FallbackPage) -> Routed {
        let identity = match page {
            FallbackPage::NotFound => &self.deployment.not_found_page,
            FallbackPage::Offline => &self.deployment.offline_page,
        };

        match lookup(cache, identity).await {
            Some(artifact) => Routed::new(artifact, RouteSource::Fallback(page)),
            None => {
                info!(page = %page, identity = %identity, "fallback page not cached, synthesizing");
                Routed::new(page.synthesize(), RouteSource::Synthesized(page))
            }
        }
    }
}

/// Cache lookup where a read error counts as a miss.
async fn lookup(cache: Option<&dyn Cache>, identity: &ResourceIdentity) -> Option<Artifact> {
    let cache = cache?;
    match cache.get(identity).await {
        Ok(hit) => hit,
        Err(e) => {
            warn!(cache = cache.name(), identity = %identity, error = %e, "cache read error");
            None
        }
    }
}
