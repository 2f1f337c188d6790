//! Worker phase persisted between CLI invocations.
//!
//! Each command runs in a fresh process, so the lifecycle phase reached by
//! `install` and `activate` is recorded next to the generations. The file
//! name starts with a dot, which no generation name may do.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use chrono::{DateTime, Utc};
use offline_proxy::Phase;
use serde::{Deserialize, Serialize};
use tracing::warn;

const STATE_FILE: &str = ".worker-state.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerState {
    pub cache_name: String,
    pub phase: Phase,
    pub updated_at: DateTime<Utc>,
}

impl WorkerState {
    pub fn new(cache_name: &str, phase: Phase) -> Self {
        Self {
            cache_name: cache_name.to_string(),
            phase,
            updated_at: Utc::now(),
        }
    }
}

fn state_path(root: &Path) -> PathBuf {
    root.join(STATE_FILE)
}

/// Missing or unreadable state means no worker has installed yet.
pub async fn load(root: &Path) -> Option<WorkerState> {
    let path = state_path(root);
    let content = tokio::fs::read_to_string(&path).await.ok()?;
    match serde_json::from_str(&content) {
        Ok(state) => Some(state),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "ignoring unreadable worker state");
            None
        }
    }
}

pub async fn save(root: &Path, state: &WorkerState) -> anyhow::Result<()> {
    tokio::fs::create_dir_all(root)
        .await
        .with_context(|| format!("failed to create {}", root.display()))?;
    let path = state_path(root);
    let json = serde_json::to_string_pretty(state)?;
    tokio::fs::write(&path, json)
        .await
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

pub async fn clear(root: &Path) -> anyhow::Result<()> {
    match tokio::fs::remove_file(state_path(root)).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).context("failed to remove worker state"),
    }
}

/// Phase of the worker for `cache_name`. A state recorded for another
/// generation belongs to a superseded worker.
pub fn phase_for(state: Option<&WorkerState>, cache_name: &str) -> Phase {
    match state {
        Some(state) if state.cache_name == cache_name => state.phase,
        _ => Phase::Installing,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_state_roundtrip() {
        let dir = TempDir::new().unwrap();
        assert!(load(dir.path()).await.is_none());

        let state = WorkerState::new("site-v-2", Phase::Installed);
        save(dir.path(), &state).await.unwrap();

        assert_eq!(load(dir.path()).await, Some(state));

        clear(dir.path()).await.unwrap();
        assert!(load(dir.path()).await.is_none());
        clear(dir.path()).await.unwrap();
    }

    #[tokio::test]
    async fn test_corrupt_state_ignored() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(STATE_FILE), "{not json").unwrap();

        assert!(load(dir.path()).await.is_none());
    }

    #[test]
    fn test_phase_for_other_generation_restarts() {
        let state = WorkerState::new("v1", Phase::Active);

        assert_eq!(phase_for(Some(&state), "v1"), Phase::Active);
        assert_eq!(phase_for(Some(&state), "v2"), Phase::Installing);
        assert_eq!(phase_for(None, "v1"), Phase::Installing);
    }
}
