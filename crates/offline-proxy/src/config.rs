//! Proxy configuration.
//!
//! Everything here is fixed for one deployment: the cache generation name,
//! the manifest, the exclusion set and the two fallback pages. Paths are
//! written relative to the site root and prefixed with the effective base
//! path when compiled into a [`Deployment`].

use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ProxyError, ProxyResult};
use crate::identity::ResourceIdentity;

/// Hosts that serve the site from the root, ignoring `base_path`.
const LOCAL_HOSTS: &[&str] = &["localhost", "127.0.0.1"];

/// How the install phase fills the cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PrecacheStrategy {
    /// Fetch and store entries one by one; a bad entry is skipped.
    #[default]
    PerEntry,

    /// Fetch everything first; any failure fails the install.
    Atomic,
}

impl fmt::Display for PrecacheStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PerEntry => write!(f, "per-entry"),
            Self::Atomic => write!(f, "atomic"),
        }
    }
}

impl FromStr for PrecacheStrategy {
    type Err = ProxyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "per-entry" | "per_entry" | "partial" => Ok(Self::PerEntry),
            "atomic" | "all-or-nothing" => Ok(Self::Atomic),
            other => Err(ProxyError::Config {
                message: format!("unknown precache strategy: {}", other),
            }),
        }
    }
}

/// Proxy configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyConfig {
    /// Name of the current cache generation.
    #[serde(default = "default_cache_name")]
    pub cache_name: String,

    /// Origin base URL the network collaborator talks to.
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Path prefix for sub-path deployments (ignored for local origins).
    #[serde(default = "default_base_path")]
    pub base_path: String,

    /// Paths precached at install, in order.
    #[serde(default = "default_manifest")]
    pub manifest: Vec<String>,

    /// Paths never read from or written to the cache.
    #[serde(default = "default_exclude")]
    pub exclude: Vec<String>,

    /// Page served for unknown paths.
    #[serde(default = "default_not_found_page")]
    pub not_found_page: String,

    /// Page served when a known resource is unreachable.
    #[serde(default = "default_offline_page")]
    pub offline_page: String,

    /// Install strategy.
    #[serde(default)]
    pub precache_strategy: PrecacheStrategy,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Maximum retries for transient network failures.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Root directory of the disk store.
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,
}

fn default_cache_name() -> String {
    "pwa-demo-v-1".to_string()
}

fn default_origin() -> String {
    "http://localhost:8080".to_string()
}

fn default_base_path() -> String {
    "/pwa-demo".to_string()
}

fn default_manifest() -> Vec<String> {
    [
        "/",
        "/index.html",
        "/404.html",
        "/pages/offline.html",
        "/pages/cached.html",
        "/styles/main.css",
        "/styles/not-found.css",
        "/styles/offline.css",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_exclude() -> Vec<String> {
    vec!["/pages/no-cache.html".to_string()]
}

fn default_not_found_page() -> String {
    "/404.html".to_string()
}

fn default_offline_page() -> String {
    "/pages/offline.html".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    2
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            cache_name: default_cache_name(),
            origin: default_origin(),
            base_path: default_base_path(),
            manifest: default_manifest(),
            exclude: default_exclude(),
            not_found_page: default_not_found_page(),
            offline_page: default_offline_page(),
            precache_strategy: PrecacheStrategy::default(),
            timeout_secs: default_timeout(),
            max_retries: default_max_retries(),
            cache_dir: None,
        }
    }
}

impl ProxyConfig {
    /// Create config from environment variables, on top of the defaults.
    ///
    /// | Variable | Description |
    /// |----------|-------------|
    /// | `OFFLINE_PROXY_CACHE_NAME` | Current cache generation |
    /// | `OFFLINE_PROXY_ORIGIN` | Origin base URL |
    /// | `OFFLINE_PROXY_BASE_PATH` | Sub-path prefix |
    /// | `OFFLINE_PROXY_PRECACHE` | `per-entry` or `atomic` |
    /// | `OFFLINE_PROXY_TIMEOUT` | Request timeout in seconds |
    /// | `OFFLINE_PROXY_MAX_RETRIES` | Retries for transient failures |
    /// | `OFFLINE_PROXY_CACHE_DIR` | Disk store root |
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Apply environment overrides to an existing config.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(v) = std::env::var("OFFLINE_PROXY_CACHE_NAME") {
            self.cache_name = v;
        }
        if let Ok(v) = std::env::var("OFFLINE_PROXY_ORIGIN") {
            self.origin = v;
        }
        if let Ok(v) = std::env::var("OFFLINE_PROXY_BASE_PATH") {
            self.base_path = v;
        }
        if let Some(strategy) = std::env::var("OFFLINE_PROXY_PRECACHE")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            self.precache_strategy = strategy;
        }
        if let Some(timeout) = std::env::var("OFFLINE_PROXY_TIMEOUT")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            self.timeout_secs = timeout;
        }
        if let Some(retries) = std::env::var("OFFLINE_PROXY_MAX_RETRIES")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            self.max_retries = retries;
        }
        if let Ok(v) = std::env::var("OFFLINE_PROXY_CACHE_DIR") {
            self.cache_dir = Some(PathBuf::from(v));
        }
        self
    }

    /// Parse a YAML document; missing fields take their defaults.
    pub fn from_yaml_str(yaml: &str) -> ProxyResult<Self> {
        serde_yaml::from_str(yaml).map_err(|e| ProxyError::Config {
            message: format!("invalid config: {}", e),
        })
    }

    /// Load a YAML config file.
    pub fn load(path: &Path) -> ProxyResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ProxyError::Config {
            message: format!("failed to read {}: {}", path.display(), e),
        })?;
        Self::from_yaml_str(&content)
    }

    /// Set the cache generation name.
    pub fn with_cache_name(mut self, name: impl Into<String>) -> Self {
        self.cache_name = name.into();
        self
    }

    /// Set the origin URL.
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = origin.into();
        self
    }

    /// Set the base path.
    pub fn with_base_path(mut self, base_path: impl Into<String>) -> Self {
        self.base_path = base_path.into();
        self
    }

    /// Replace the manifest.
    pub fn with_manifest<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.manifest = paths.into_iter().map(Into::into).collect();
        self
    }

    /// Replace the exclusion set.
    pub fn with_exclude<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude = paths.into_iter().map(Into::into).collect();
        self
    }

    /// Set both fallback pages.
    pub fn with_fallbacks(
        mut self,
        not_found_page: impl Into<String>,
        offline_page: impl Into<String>,
    ) -> Self {
        self.not_found_page = not_found_page.into();
        self.offline_page = offline_page.into();
        self
    }

    pub fn with_precache_strategy(mut self, strategy: PrecacheStrategy) -> Self {
        self.precache_strategy = strategy;
        self
    }

    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = Some(dir.into());
        self
    }

    /// Base path actually applied: empty for local origins.
    pub fn effective_base_path(&self) -> String {
        let is_local = url::Url::parse(&self.origin)
            .ok()
            .and_then(|u| u.host_str().map(|h| LOCAL_HOSTS.contains(&h)))
            .unwrap_or(false);

        if is_local {
            return String::new();
        }

        let trimmed = self.base_path.trim().trim_end_matches('/');
        if trimmed.is_empty() {
            String::new()
        } else if trimmed.starts_with('/') {
            trimmed.to_string()
        } else {
            format!("/{}", trimmed)
        }
    }

    /// Resolve a site-relative path to a deployed identity.
    pub fn resolve(&self, path: &str) -> ProxyResult<ResourceIdentity> {
        let path = path.trim();
        let rooted = if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{}", path)
        };
        ResourceIdentity::parse(&format!("{}{}", self.effective_base_path(), rooted))
    }

    /// Validate and compile into a [`Deployment`].
    ///
    /// Hard errors: empty cache name, zero timeout, unparsable paths.
    /// Deployment-contract problems (fallback page not precached, excluded
    /// manifest entry) are logged as warnings.
    pub fn deployment(&self) -> ProxyResult<Deployment> {
        if self.cache_name.trim().is_empty() {
            return Err(ProxyError::Config {
                message: "cache_name must not be empty".to_string(),
            });
        }
        if self.timeout_secs == 0 {
            return Err(ProxyError::Config {
                message: "timeout_secs must be at least 1".to_string(),
            });
        }

        let manifest = self
            .manifest
            .iter()
            .map(|p| self.resolve(p))
            .collect::<ProxyResult<Vec<_>>>()?;
        let exclude = self
            .exclude
            .iter()
            .map(|p| self.resolve(p).map(|id| id.path().to_string()))
            .collect::<ProxyResult<BTreeSet<_>>>()?;

        let deployment = Deployment {
            cache_name: self.cache_name.clone(),
            manifest_paths: manifest.iter().map(|id| id.path().to_string()).collect(),
            manifest,
            exclude,
            not_found_page: self.resolve(&self.not_found_page)?,
            offline_page: self.resolve(&self.offline_page)?,
            precache_strategy: self.precache_strategy,
        };

        for warning in deployment.contract_warnings() {
            warn!(cache = %deployment.cache_name, "{}", warning);
        }

        Ok(deployment)
    }
}

/// A compiled configuration: every path resolved to an identity.
#[derive(Debug, Clone)]
pub struct Deployment {
    pub cache_name: String,
    pub manifest: Vec<ResourceIdentity>,
    pub exclude: BTreeSet<String>,
    pub not_found_page: ResourceIdentity,
    pub offline_page: ResourceIdentity,
    pub precache_strategy: PrecacheStrategy,
    manifest_paths: BTreeSet<String>,
}

impl Deployment {
    /// Build directly from resolved parts.
    pub fn new(
        cache_name: impl Into<String>,
        manifest: Vec<ResourceIdentity>,
        exclude: impl IntoIterator<Item = ResourceIdentity>,
        not_found_page: ResourceIdentity,
        offline_page: ResourceIdentity,
    ) -> Self {
        Self {
            cache_name: cache_name.into(),
            manifest_paths: manifest.iter().map(|id| id.path().to_string()).collect(),
            manifest,
            exclude: exclude.into_iter().map(|id| id.path().to_string()).collect(),
            not_found_page,
            offline_page,
            precache_strategy: PrecacheStrategy::default(),
        }
    }

    pub fn with_precache_strategy(mut self, strategy: PrecacheStrategy) -> Self {
        self.precache_strategy = strategy;
        self
    }

    /// Membership by path; query and method are ignored.
    pub fn is_excluded(&self, identity: &ResourceIdentity) -> bool {
        self.exclude.contains(identity.path())
    }

    /// Membership by path; query and method are ignored.
    pub fn in_manifest(&self, identity: &ResourceIdentity) -> bool {
        self.manifest_paths.contains(identity.path())
    }

    /// Violations of the deployment contract. Not enforced at request time.
    pub fn contract_warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        for (label, page) in [
            ("not-found page", &self.not_found_page),
            ("offline page", &self.offline_page),
        ] {
            if !self.in_manifest(page) {
                warnings.push(format!(
                    "{} {} is not in the manifest and may be missing offline",
                    label,
                    page.path()
                ));
            }
            if self.is_excluded(page) {
                warnings.push(format!(
                    "{} {} is excluded and can never be served from cache",
                    label,
                    page.path()
                ));
            }
        }

        for id in &self.manifest {
            if self.is_excluded(id) {
                warnings.push(format!(
                    "manifest entry {} is excluded and will not be precached",
                    id.path()
                ));
            }
        }

        warnings
    }
}
