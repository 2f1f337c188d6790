//! Disk put path.

use chrono::Utc;
use tracing::debug;

use crate::digest::sha256_digest;
use crate::error::{ProxyError, ProxyResult};
use crate::identity::ResourceIdentity;
use crate::types::Artifact;

use super::{io, DiskCache, EntryMeta};

/// Encode an entry record: one line of compact JSON metadata, then the body.
pub(crate) fn encode_record_impl(metadata: &EntryMeta, body: &[u8]) -> ProxyResult<Vec<u8>> {
    // Compact JSON escapes newlines inside strings, so the header is one line.
    let mut record = serde_json::to_vec(metadata).map_err(|e| ProxyError::Cache {
        message: format!("failed to serialize entry metadata: {}", e),
    })?;
    record.reserve(body.len() + 1);
    record.push(b'\n');
    record.extend_from_slice(body);
    Ok(record)
}

pub(crate) async fn put_impl(
    cache: &DiskCache,
    key: &ResourceIdentity,
    artifact: &Artifact,
) -> ProxyResult<()> {
    let entry_dir = cache.entry_dir(key);
    io::ensure_dir_impl(&entry_dir).await?;

    let metadata = EntryMeta {
        identity: key.clone(),
        status: artifact.status,
        headers: artifact.headers.clone(),
        digest: sha256_digest(&artifact.body),
        stored_at: Utc::now(),
    };
    let record = encode_record_impl(&metadata, &artifact.body)?;

    // Single rename is the commit point: concurrent writers of one key
    // replace each other whole, the last rename wins.
    io::write_atomic_impl(&cache.entry_file(key), &record).await?;

    debug!(cache = %cache.name, identity = %key, bytes = artifact.body.len(), "cached entry");
    Ok(())
}
