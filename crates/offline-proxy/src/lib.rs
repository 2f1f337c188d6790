//! Offline-capable content proxy.
//!
//! Intercepts requests from a web client and answers them cache-first,
//! falling back to a not-found page or an offline page when a resource
//! cannot be produced:
//!
//! - Versioned cache store (in-memory or on disk)
//! - Precache loader for the install phase
//! - Version reaper for the activation phase
//! - Request router for every intercepted request
//!
//! # Quick Start
//!
//! ```no_run
//! use offline_proxy::{Lifecycle, OfflineWorker, ProxyConfig, ResourceIdentity};
//!
//! # async fn example() -> Result<(), offline_proxy::ProxyError> {
//! let config = ProxyConfig::from_env();
//! let worker = OfflineWorker::from_config(&config)?;
//!
//! worker.on_install().await?;
//! worker.on_activate().await?;
//!
//! let routed = worker
//!     .on_intercept(&ResourceIdentity::parse("/pages/cached.html")?)
//!     .await;
//! println!("{} from {}", routed.artifact.status, routed.source);
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration
//!
//! | Environment Variable | Description |
//! |---------------------|-------------|
//! | `OFFLINE_PROXY_CACHE_NAME` | Current cache generation (default: `pwa-demo-v-1`) |
//! | `OFFLINE_PROXY_ORIGIN` | Origin base URL (default: `http://localhost:8080`) |
//! | `OFFLINE_PROXY_BASE_PATH` | Sub-path prefix for non-local origins (default: `/pwa-demo`) |
//! | `OFFLINE_PROXY_PRECACHE` | `per-entry` (default) or `atomic` |
//! | `OFFLINE_PROXY_TIMEOUT` | Request timeout in seconds (default: 30) |
//! | `OFFLINE_PROXY_MAX_RETRIES` | Max retries for transient failures (default: 2) |
//! | `OFFLINE_PROXY_CACHE_DIR` | Disk store root |

pub mod config;
mod digest;
pub mod error;
pub mod fallback;
pub mod identity;
pub mod network;
pub mod precache;
pub mod reaper;
pub mod router;
pub mod store;
pub mod types;
pub mod worker;

// Re-export main types
pub use config::{Deployment, PrecacheStrategy, ProxyConfig};
pub use error::{ProxyError, ProxyResult};
pub use fallback::FallbackPage;
pub use identity::ResourceIdentity;
pub use network::{Fetcher, HttpFetcher, PROXY_USER_AGENT};
pub use precache::{precache, PrecacheReport, SkipReason, SkippedEntry};
pub use reaper::{reap_stale_generations, ReapReport};
pub use router::{RouteSource, Routed, Router};
pub use store::{Cache, CacheStorage, DiskCache, DiskStorage, EntryMeta, MemoryCache, MemoryStorage};
pub use types::Artifact;
pub use worker::{Lifecycle, OfflineWorker, Phase};
