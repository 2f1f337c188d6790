//! Response types shared by the network collaborator, the cache store and
//! the router.

use std::borrow::Cow;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A response: status, headers and body.
///
/// The same shape is returned by the network collaborator and stored in the
/// cache, so a stored artifact is byte-identical to what was fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    /// HTTP status code.
    pub status: u16,

    /// Response headers, names lower-cased.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,

    /// Response body.
    #[serde(default)]
    pub body: Vec<u8>,
}

impl Artifact {
    /// Create an artifact with no headers.
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: BTreeMap::new(),
            body: body.into(),
        }
    }

    /// Add a header (name is lower-cased).
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    /// Look up a header by name (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    /// Body as text (lossy for non-UTF-8 content).
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }
}
