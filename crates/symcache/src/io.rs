//! Filesystem side of the commit protocol: temp write, rename, cleanup.

use std::path::Path;

use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::warn;

use crate::error::{SymbolCacheError, SymbolCacheResult};

/// Whether a committed file is present. Errors other than "not found" are
/// reported as absent; the following write surfaces them.
pub(crate) async fn exists(path: &Path) -> bool {
    fs::try_exists(path).await.unwrap_or(false)
}

pub(crate) async fn create_parent_dirs(path: &Path) -> SymbolCacheResult<()> {
    let Some(parent) = path.parent() else {
        return Ok(());
    };
    fs::create_dir_all(parent)
        .await
        .map_err(fs_error(parent, "failed to create directory"))
}

/// Write `body` to `temp_path` and flush it to disk before any rename.
pub(crate) async fn write_temp(temp_path: &Path, body: &[u8]) -> SymbolCacheResult<()> {
    let mut file = fs::File::create(temp_path)
        .await
        .map_err(fs_error(temp_path, "failed to open temp file"))?;

    file.write_all(body)
        .await
        .map_err(fs_error(temp_path, "failed to write temp file"))?;

    file.sync_all()
        .await
        .map_err(fs_error(temp_path, "failed to sync temp file"))
}

/// Atomically move a validated temp file onto its final name.
pub(crate) async fn commit(temp_path: &Path, final_path: &Path) -> SymbolCacheResult<()> {
    fs::rename(temp_path, final_path)
        .await
        .map_err(fs_error(final_path, "failed to rename temp file"))
}

fn fs_error<'a>(
    path: &'a Path,
    what: &'a str,
) -> impl FnOnce(std::io::Error) -> SymbolCacheError + 'a {
    move |e| SymbolCacheError::filesystem(path, format!("{}: {}", what, e))
}

/// Best-effort removal of a rejected temp file.
pub(crate) async fn discard(temp_path: &Path) {
    if let Err(e) = fs::remove_file(temp_path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!(path = %temp_path.display(), error = %e, "failed to remove temp file");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_write_then_commit() {
        let dir = TempDir::new().unwrap();
        let final_path = dir.path().join("a").join("b").join("file.pdb");
        let temp_path = final_path.with_extension("tmp");

        create_parent_dirs(&final_path).await.unwrap();
        write_temp(&temp_path, b"payload").await.unwrap();
        assert!(!exists(&final_path).await);

        commit(&temp_path, &final_path).await.unwrap();
        assert!(exists(&final_path).await);
        assert!(!exists(&temp_path).await);
        assert_eq!(std::fs::read(&final_path).unwrap(), b"payload");
    }

    #[tokio::test]
    async fn test_discard_missing_is_quiet() {
        let dir = TempDir::new().unwrap();
        discard(&dir.path().join("never-written.tmp")).await;
    }

    #[tokio::test]
    async fn test_write_temp_into_missing_dir_fails() {
        let dir = TempDir::new().unwrap();
        let temp_path = dir.path().join("missing").join("file.tmp");
        let err = write_temp(&temp_path, b"x").await.unwrap_err();
        assert!(matches!(err, SymbolCacheError::Filesystem { .. }));
    }
}
