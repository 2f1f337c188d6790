//! Disk read path.

use std::path::Path;

use tokio::fs;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, warn};

use crate::digest::sha256_digest;
use crate::error::{ProxyError, ProxyResult};
use crate::identity::ResourceIdentity;
use crate::types::Artifact;

use super::keys::ENTRY_FILE;
use super::{DiskCache, EntryMeta};

/// Split a record into its metadata header and body.
pub(crate) fn decode_record_impl(record: &[u8]) -> Option<(EntryMeta, &[u8])> {
    let split = record.iter().position(|&b| b == b'\n')?;
    let metadata = serde_json::from_slice(&record[..split]).ok()?;
    Some((metadata, &record[split + 1..]))
}

/// Read only the header line of an entry record.
pub(crate) async fn read_meta_impl(entry_dir: &Path) -> Option<EntryMeta> {
    let file = fs::File::open(entry_dir.join(ENTRY_FILE)).await.ok()?;
    let mut header = Vec::new();
    BufReader::new(file)
        .read_until(b'\n', &mut header)
        .await
        .ok()?;
    if header.pop() != Some(b'\n') {
        return None;
    }
    serde_json::from_slice(&header).ok()
}

pub(crate) async fn get_impl(
    cache: &DiskCache,
    key: &ResourceIdentity,
) -> ProxyResult<Option<Artifact>> {
    let record = match fs::read(cache.entry_file(key)).await {
        Ok(record) => record,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(cache = %cache.name, identity = %key, "not in cache");
            return Ok(None);
        }
        Err(e) => {
            return Err(ProxyError::Cache {
                message: format!("failed to read cache entry: {}", e),
            })
        }
    };

    let (metadata, body) = match decode_record_impl(&record) {
        Some(decoded) => decoded,
        None => {
            warn!(cache = %cache.name, identity = %key, "unreadable entry record, treating as miss");
            return Ok(None);
        }
    };

    if &metadata.identity != key {
        warn!(
            cache = %cache.name,
            identity = %key,
            stored = %metadata.identity,
            "entry key collision, treating as miss"
        );
        return Ok(None);
    }

    let computed = sha256_digest(body);
    if computed != metadata.digest {
        warn!(
            cache = %cache.name,
            identity = %key,
            expected = %metadata.digest,
            actual = %computed,
            "cache integrity check failed, treating as miss"
        );
        return Ok(None);
    }

    debug!(cache = %cache.name, identity = %key, "cache hit");
    Ok(Some(Artifact {
        status: metadata.status,
        headers: metadata.headers,
        body: body.to_vec(),
    }))
}

pub(crate) async fn keys_impl(cache: &DiskCache) -> ProxyResult<Vec<ResourceIdentity>> {
    let mut result = Vec::new();

    if !cache.dir.exists() {
        return Ok(result);
    }

    let mut entries = fs::read_dir(&cache.dir)
        .await
        .map_err(|e| ProxyError::Cache {
            message: format!("failed to read generation directory: {}", e),
        })?;

    while let Some(entry) = entries.next_entry().await.map_err(|e| ProxyError::Cache {
        message: format!("failed to read directory entry: {}", e),
    })? {
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }

        if let Some(meta) = read_meta_impl(&path).await {
            result.push(meta.identity);
        }
    }

    result.sort();
    Ok(result)
}

pub(crate) async fn generation_names_impl(root: &Path) -> ProxyResult<Vec<String>> {
    let mut names = Vec::new();

    if !root.exists() {
        return Ok(names);
    }

    let mut entries = fs::read_dir(root).await.map_err(|e| ProxyError::Cache {
        message: format!("failed to read cache directory: {}", e),
    })?;

    while let Some(entry) = entries.next_entry().await.map_err(|e| ProxyError::Cache {
        message: format!("failed to read directory entry: {}", e),
    })? {
        let name = entry.file_name().to_string_lossy().to_string();
        if entry.path().is_dir() && !name.starts_with('.') {
            names.push(name);
        }
    }

    names.sort();
    Ok(names)
}
