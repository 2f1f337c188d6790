//! Generation deletion.

use std::path::Path;

use tokio::fs;
use tracing::debug;

use crate::error::{ProxyError, ProxyResult};

pub(crate) async fn delete_generation_impl(root: &Path, name: &str) -> ProxyResult<bool> {
    let dir = root.join(name);

    if !dir.exists() {
        return Ok(false);
    }

    fs::remove_dir_all(&dir)
        .await
        .map_err(|e| ProxyError::Cache {
            message: format!("failed to delete generation '{}': {}", name, e),
        })?;
    debug!(cache = name, "deleted generation");

    Ok(true)
}
