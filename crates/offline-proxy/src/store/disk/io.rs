//! Filesystem helpers: default location, directory creation, atomic writes.

use std::path::{Path, PathBuf};

use rand::Rng;
use tokio::fs;

use crate::error::{ProxyError, ProxyResult};

pub(crate) fn default_cache_dir_impl() -> ProxyResult<PathBuf> {
    let base = dirs::cache_dir()
        .or_else(dirs::home_dir)
        .ok_or_else(|| ProxyError::Cache {
            message: "could not determine cache directory".to_string(),
        })?;

    Ok(base.join("offline-proxy"))
}

pub(crate) async fn ensure_dir_impl(dir: &Path) -> ProxyResult<()> {
    fs::create_dir_all(dir)
        .await
        .map_err(|e| ProxyError::Cache {
            message: format!("failed to create cache directory: {}", e),
        })
}

/// Write via a uniquely named temp file and rename, so concurrent writers
/// to the same path never observe each other's partial output.
pub(crate) async fn write_atomic_impl(path: &Path, content: &[u8]) -> ProxyResult<()> {
    let suffix: u64 = rand::thread_rng().gen();
    let temp_path = path.with_extension(format!("{:016x}.tmp", suffix));

    fs::write(&temp_path, content)
        .await
        .map_err(|e| ProxyError::Cache {
            message: format!("failed to write temp file: {}", e),
        })?;

    if let Err(e) = fs::rename(&temp_path, path).await {
        let _ = fs::remove_file(&temp_path).await;
        return Err(ProxyError::Cache {
            message: format!("failed to rename temp file: {}", e),
        });
    }

    Ok(())
}
