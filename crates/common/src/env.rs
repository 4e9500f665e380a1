//! Environment/runtime helpers
//!
//! Sanity checks run before a collection file is opened.

use std::path::Path;
use tracing::warn;

/// Ensure the directory that will hold `file` exists.
///
/// Collections never create directories themselves; callers that force file
/// creation run this first.
pub async fn ensure_parent_dir(file: &Path) -> anyhow::Result<()> {
    let Some(dir) = file.parent().filter(|d| !d.as_os_str().is_empty()) else {
        return Ok(());
    };
    if tokio::fs::metadata(dir).await.is_err() {
        warn!(dir = %dir.display(), "collection directory not found; creating it");
    }
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| anyhow::anyhow!("cannot create {}: {e}", dir.display()))?;
    Ok(())
}
