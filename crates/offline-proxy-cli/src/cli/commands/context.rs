//! Effective configuration and store location for one invocation.

use std::path::PathBuf;

use offline_proxy::{DiskStorage, OfflineWorker, Phase, ProxyConfig};

use super::super::args::GlobalArgs;
use super::state::{self, WorkerState};

/// Defaults, then the config file, then `OFFLINE_PROXY_*`, then flags.
pub fn load_config(global: &GlobalArgs) -> anyhow::Result<ProxyConfig> {
    let base = match &global.config {
        Some(path) => ProxyConfig::load(path)?,
        None => ProxyConfig::default(),
    };
    let mut config = base.with_env_overrides();

    if let Some(origin) = &global.origin {
        config = config.with_origin(origin.clone());
    }
    if let Some(name) = &global.cache_name {
        config = config.with_cache_name(name.clone());
    }
    if let Some(dir) = &global.cache_dir {
        config = config.with_cache_dir(dir.clone());
    }
    if let Some(strategy) = global.precache {
        config = config.with_precache_strategy(strategy);
    }

    Ok(config)
}

pub struct Context {
    pub config: ProxyConfig,
    pub root: PathBuf,
}

impl Context {
    pub fn load(global: &GlobalArgs) -> anyhow::Result<Self> {
        let mut config = load_config(global)?;
        let root = match &config.cache_dir {
            Some(dir) => dir.clone(),
            None => DiskStorage::new()?.root().to_path_buf(),
        };
        config.cache_dir = Some(root.clone());
        Ok(Self { config, root })
    }

    pub fn storage(&self) -> DiskStorage {
        DiskStorage::with_dir(self.root.clone())
    }

    pub async fn phase(&self) -> Phase {
        let recorded = state::load(&self.root).await;
        state::phase_for(recorded.as_ref(), &self.config.cache_name)
    }

    pub async fn record_phase(&self, phase: Phase) -> anyhow::Result<()> {
        state::save(&self.root, &WorkerState::new(&self.config.cache_name, phase)).await
    }

    /// Worker resumed at the phase an earlier invocation reached.
    pub async fn worker(&self) -> anyhow::Result<OfflineWorker> {
        let phase = self.phase().await;
        Ok(OfflineWorker::from_config(&self.config)?.resumed(phase))
    }
}
