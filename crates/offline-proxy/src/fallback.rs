//! Fallback pages and their last-resort in-memory substitutes.

use std::fmt;

use crate::types::Artifact;

/// The two designated fallback pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FallbackPage {
    /// Served for paths the site does not know.
    NotFound,

    /// Served when a known resource cannot be reached.
    Offline,
}

impl FallbackPage {
    /// Minimal page used when the precached copy is itself missing.
    pub fn synthesize(self) -> Artifact {
        let (status, title, message) = match self {
            Self::NotFound => (404, "Not Found", "The page you requested does not exist."),
            Self::Offline => (
                503,
                "Offline",
                "You are offline and this page is not available from the cache.",
            ),
        };

        let body = format!(
            "<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\"><title>{title}</title></head>\
             <body><h1>{title}</h1><p>{message}</p></body></html>\n"
        );

        Artifact::new(status, body)
            .with_header("content-type", "text/html; charset=utf-8")
            .with_header("cache-control", "no-store")
    }
}

impl fmt::Display for FallbackPage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "not-found"),
            Self::Offline => write!(f, "offline"),
        }
    }
}
