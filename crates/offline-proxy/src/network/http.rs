//! HTTP layer: transport, retry, response capture.
//!
//! Retries cover transport failures only. Any status the origin returns,
//! 5xx included, is a response and goes back to the caller untouched.

use std::collections::BTreeMap;
use std::time::Duration;

use tracing::{debug, warn};

use crate::error::{ProxyError, ProxyResult};
use crate::types::Artifact;

/// HTTP backend for making requests (holds reqwest client and retry budget).
#[derive(Debug, Clone)]
pub(crate) struct HttpBackend {
    pub(crate) client: reqwest::Client,
    pub(crate) origin: String,
    pub(crate) max_retries: u32,
}

impl HttpBackend {
    /// Fetch a URL, retrying transient transport failures.
    ///
    /// Only GET, HEAD and OPTIONS are resent after the request may have
    /// reached the origin. Other methods retry connect failures only.
    pub(crate) async fn fetch(&self, method: reqwest::Method, url: &str) -> ProxyResult<Artifact> {
        use rand::Rng;

        let idempotent = is_idempotent(&method);
        let mut retries = 0;
        let max_retries = self.max_retries;

        loop {
            let err = match self.fetch_once(method.clone(), url).await {
                Ok(artifact) => return Ok(artifact),
                Err(err) => err,
            };
            let resend_safe = idempotent || err.is_connect();
            let err = ProxyError::from(err);

            if !(resend_safe && err.is_retryable() && retries < max_retries) {
                return Err(err);
            }
            retries += 1;

            let base_backoff = Duration::from_millis(250 * (1_u64 << retries.min(6)));
            let base_backoff = base_backoff.min(Duration::from_secs(10));
            let jittered_ms = rand::thread_rng().gen_range(0..=base_backoff.as_millis() as u64);
            let backoff = Duration::from_millis(jittered_ms.max(10));

            warn!(
                error = %err,
                method = %method,
                retry = retries,
                max_retries = max_retries,
                backoff_ms = backoff.as_millis(),
                "retrying request"
            );

            tokio::time::sleep(backoff).await;
        }
    }

    async fn fetch_once(
        &self,
        method: reqwest::Method,
        url: &str,
    ) -> Result<Artifact, reqwest::Error> {
        let response = self.client.request(method, url).send().await?;
        let status = response.status().as_u16();

        let headers: BTreeMap<String, String> = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_ascii_lowercase(), v.to_string()))
            })
            .collect();

        let body = response.bytes().await?;

        debug!(url, status, bytes = body.len(), "origin responded");

        Ok(Artifact {
            status,
            headers,
            body: body.to_vec(),
        })
    }
}

fn is_idempotent(method: &reqwest::Method) -> bool {
    [
        reqwest::Method::GET,
        reqwest::Method::HEAD,
        reqwest::Method::OPTIONS,
    ]
    .contains(method)
}
