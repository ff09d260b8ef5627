//! Crash-safe file replacement.

use std::io;
use std::path::Path;

use tokio::io::AsyncWriteExt;
use uuid::Uuid;

/// Replace `path` with `content` so readers see either the old or the new
/// bytes, never a mix.
///
/// Writes a uniquely named hidden temp file in the same directory (so the
/// rename stays on one filesystem), syncs it, then renames it over `path`.
/// The temp file is removed if any step fails.
pub async fn atomic_write(path: &Path, content: &str) -> io::Result<()> {
    let dir = path
        .parent()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "path has no parent"))?;
    let name = path
        .file_name()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "path has no file name"))?;
    let tmp = dir.join(format!(".{}.{}.tmp", name.to_string_lossy(), Uuid::now_v7()));

    let result = async {
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(content.as_bytes()).await?;
        file.sync_all().await?;
        drop(file);
        tokio::fs::rename(&tmp, path).await
    }
    .await;

    if result.is_err() {
        let _ = tokio::fs::remove_file(&tmp).await;
    }
    result
}
