//! Network collaborator: the only egress point to the origin.
//!
//! Public API: no status code knowledge. Statuses are handed back verbatim;
//! the router decides what they mean. Only transport failures are errors.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use tracing::debug;

use crate::config::ProxyConfig;
use crate::error::{ProxyError, ProxyResult};
use crate::identity::ResourceIdentity;
use crate::types::Artifact;

mod http;

use http::HttpBackend;

/// User agent for origin requests.
pub const PROXY_USER_AGENT: &str = concat!("offline-proxy/", env!("CARGO_PKG_VERSION"));

/// Fetch capability.
///
/// `Ok` carries whatever status the origin answered with (404 included).
/// `Err` means the fetch itself failed: the origin is unreachable.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, identity: &ResourceIdentity) -> ProxyResult<Artifact>;
}

/// HTTP fetcher resolving identities against an origin base URL.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    http: HttpBackend,
}

impl HttpFetcher {
    pub fn new(config: &ProxyConfig) -> ProxyResult<Self> {
        Self::with_origin(&config.origin, config.timeout_secs, config.max_retries)
    }

    pub fn with_origin(origin: &str, timeout_secs: u64, max_retries: u32) -> ProxyResult<Self> {
        let parsed = url::Url::parse(origin).map_err(|e| ProxyError::Config {
            message: format!("invalid origin '{}': {}", origin, e),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ProxyError::Config {
                message: format!("origin must be http or https: {}", origin),
            });
        }

        let mut default_headers = HeaderMap::new();
        default_headers.insert(USER_AGENT, HeaderValue::from_static(PROXY_USER_AGENT));

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .default_headers(default_headers)
            .build()
            .map_err(|e| ProxyError::Network {
                message: format!("failed to create HTTP client: {}", e),
            })?;

        // Normalize origin (remove trailing slash)
        let origin = origin.trim_end_matches('/').to_string();

        Ok(Self {
            http: HttpBackend {
                client,
                origin,
                max_retries,
            },
        })
    }

    pub fn origin(&self) -> &str {
        &self.http.origin
    }

    fn url_for(&self, identity: &ResourceIdentity) -> String {
        format!("{}{}", self.http.origin, identity.path_and_query())
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, identity: &ResourceIdentity) -> ProxyResult<Artifact> {
        let url = self.url_for(identity);
        let method = reqwest::Method::from_bytes(identity.method().as_bytes()).map_err(|e| {
            ProxyError::InvalidIdentity {
                input: identity.to_string(),
                reason: e.to_string(),
            }
        })?;

        debug!(url = %url, method = %method, "fetching from origin");
        self.http.fetch(method, &url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_for_joins_origin_and_path() {
        let fetcher = HttpFetcher::with_origin("https://example.com/", 5, 0).unwrap();
        let id = ResourceIdentity::parse("/pwa-demo/index.html?v=1").unwrap();
        assert_eq!(fetcher.origin(), "https://example.com");
        assert_eq!(
            fetcher.url_for(&id),
            "https://example.com/pwa-demo/index.html?v=1"
        );
    }

    #[test]
    fn test_rejects_non_http_origin() {
        let result = HttpFetcher::with_origin("ftp://example.com", 5, 0);
        assert!(matches!(result, Err(ProxyError::Config { .. })));
    }

    #[test]
    fn test_rejects_unparsable_origin() {
        let result = HttpFetcher::with_origin("not a url", 5, 0);
        assert!(matches!(result, Err(ProxyError::Config { .. })));
    }
}
