//! Resource identity parsing.
//!
//! A resource identity is the normalized key used both to address the
//! origin and to look up cache entries. Accepted inputs:
//! - `/pages/cached.html` → absolute path
//! - `pages/cached.html` → relative path, rooted at `/`
//! - `/search?q=rust` → path with query
//! - `https://example.com/index.html#top` → absolute URL, reduced to path + query

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{ProxyError, ProxyResult};

/// Base used to resolve relative paths. Never contacted.
const RESOLVE_BASE: &str = "http://offline-proxy.invalid/";

/// A normalized request descriptor: method, path and optional query.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResourceIdentity {
    method: String,
    path: String,
    #[serde(default)]
    query: Option<String>,
}

impl ResourceIdentity {
    /// Parse a path or URL into a `GET` identity.
    ///
    /// # Examples
    ///
    /// ```
    /// use offline_proxy::ResourceIdentity;
    ///
    /// let id = ResourceIdentity::parse("https://example.com/a/../index.html?v=2#top").unwrap();
    /// assert_eq!(id.path(), "/index.html");
    /// assert_eq!(id.query(), Some("v=2"));
    /// assert_eq!(id.to_string(), "GET /index.html?v=2");
    ///
    /// let rel = ResourceIdentity::parse("styles/main.css").unwrap();
    /// assert_eq!(rel.path(), "/styles/main.css");
    /// ```
    pub fn parse(input: &str) -> ProxyResult<Self> {
        let input = input.trim();

        if input.is_empty() {
            return Err(ProxyError::InvalidIdentity {
                input: input.to_string(),
                reason: "empty identity".to_string(),
            });
        }

        let url = if input.starts_with("http://") || input.starts_with("https://") {
            Url::parse(input)
        } else {
            let rooted = if input.starts_with('/') {
                input.to_string()
            } else {
                format!("/{}", input)
            };
            Url::parse(RESOLVE_BASE).and_then(|base| base.join(&rooted))
        }
        .map_err(|e| ProxyError::InvalidIdentity {
            input: input.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            method: "GET".to_string(),
            path: url.path().to_string(),
            query: url.query().filter(|q| !q.is_empty()).map(String::from),
        })
    }

    /// Replace the method (normalized to upper case).
    pub fn with_method(mut self, method: &str) -> ProxyResult<Self> {
        let method = method.trim();
        if method.is_empty() || !method.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(ProxyError::InvalidIdentity {
                input: method.to_string(),
                reason: "method must be a non-empty alphabetic token".to_string(),
            });
        }
        self.method = method.to_ascii_uppercase();
        Ok(self)
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    pub fn is_get(&self) -> bool {
        self.method == "GET"
    }

    /// Path plus query, as sent to the origin.
    pub fn path_and_query(&self) -> String {
        match &self.query {
            Some(q) => format!("{}?{}", self.path, q),
            None => self.path.clone(),
        }
    }
}

impl fmt::Display for ResourceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.path_and_query())
    }
}

impl FromStr for ResourceIdentity {
    type Err = ProxyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
