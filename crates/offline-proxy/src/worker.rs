//! Lifecycle worker.
//!
//! Binds the precache loader, the version reaper and the router to one
//! set of collaborators, and exposes them as the three lifecycle signals a
//! host delivers: install, activate, intercept.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::config::{Deployment, ProxyConfig};
use crate::error::{ProxyError, ProxyResult};
use crate::identity::ResourceIdentity;
use crate::network::{Fetcher, HttpFetcher};
use crate::precache::{precache, PrecacheReport};
use crate::reaper::{reap_stale_generations, ReapReport};
use crate::router::{Routed, Router};
use crate::store::{CacheStorage, DiskStorage};

/// Lifecycle phase of a worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Waiting for (or running) install.
    Installing,

    /// Installed, waiting for activation.
    Installed,

    /// Serving requests from the current generation.
    Active,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Installing => write!(f, "installing"),
            Self::Installed => write!(f, "installed"),
            Self::Active => write!(f, "active"),
        }
    }
}

/// The signals a host delivers.
#[async_trait]
pub trait Lifecycle: Send + Sync {
    /// Populate the current generation.
    async fn on_install(&self) -> ProxyResult<PrecacheReport>;

    /// Remove superseded generations.
    async fn on_activate(&self) -> ProxyResult<ReapReport>;

    /// Answer one intercepted request. Never fails.
    async fn on_intercept(&self, request: &ResourceIdentity) -> Routed;
}

/// Worker over injected storage and fetcher.
pub struct OfflineWorker {
    storage: Arc<dyn CacheStorage>,
    fetcher: Arc<dyn Fetcher>,
    deployment: Arc<Deployment>,
    router: Router,
    phase: Mutex<Phase>,
}

impl OfflineWorker {
    pub fn new(
        storage: Arc<dyn CacheStorage>,
        fetcher: Arc<dyn Fetcher>,
        deployment: Deployment,
    ) -> Self {
        let deployment = Arc::new(deployment);
        let router = Router::new(storage.clone(), fetcher.clone(), deployment.clone());
        Self {
            storage,
            fetcher,
            deployment,
            router,
            phase: Mutex::new(Phase::Installing),
        }
    }

    /// Worker backed by the disk store and the HTTP origin in `config`.
    pub fn from_config(config: &ProxyConfig) -> ProxyResult<Self> {
        let deployment = config.deployment()?;
        let storage = match &config.cache_dir {
            Some(dir) => DiskStorage::with_dir(dir),
            None => DiskStorage::new()?,
        };
        let fetcher = HttpFetcher::new(config)?;
        Ok(Self::new(Arc::new(storage), Arc::new(fetcher), deployment))
    }

    /// Start from a phase the host already reached in an earlier run.
    pub fn resumed(self, phase: Phase) -> Self {
        Self {
            phase: Mutex::new(phase),
            ..self
        }
    }

    pub async fn phase(&self) -> Phase {
        *self.phase.lock().await
    }
}

fn require(expected: Phase, actual: Phase) -> ProxyResult<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(ProxyError::Lifecycle { expected, actual })
    }
}

#[async_trait]
impl Lifecycle for OfflineWorker {
    async fn on_install(&self) -> ProxyResult<PrecacheReport> {
        let mut phase = self.phase.lock().await;
        require(Phase::Installing, *phase)?;

        info!(cache = %self.deployment.cache_name, "worker installing");
        let cache = self.storage.open(&self.deployment.cache_name).await?;
        let report = precache(cache.as_ref(), self.fetcher.as_ref(), &self.deployment).await?;

        *phase = Phase::Installed;
        Ok(report)
    }

    async fn on_activate(&self) -> ProxyResult<ReapReport> {
        let mut phase = self.phase.lock().await;
        require(Phase::Installed, *phase)?;

        info!(cache = %self.deployment.cache_name, "worker activating");
        let report =
            reap_stale_generations(self.storage.as_ref(), &self.deployment.cache_name).await?;

        *phase = Phase::Active;
        Ok(report)
    }

    async fn on_intercept(&self, request: &ResourceIdentity) -> Routed {
        let phase = self.phase().await;
        if phase != Phase::Active {
            warn!(phase = %phase, identity = %request, "request intercepted before activation");
        }
        self.router.route(request).await
    }
}
