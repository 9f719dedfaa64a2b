//! Snapshot persistence.
//!
//! Every file is replaced wholesale: the new content goes to a hidden
//! temp file next to the target and is renamed over it, so readers
//! only ever see the complete old or the complete new document.

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Serialize, de::DeserializeOwned};
use tokio::io::AsyncWriteExt;

use crate::error::CacheError;

/// Read a JSON snapshot.
///
/// A missing file is `Miss`; unparseable content is `Corrupt`.
pub async fn read_snapshot<T: DeserializeOwned>(path: &Path) -> Result<T, CacheError> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(CacheError::Miss {
                path: path.display().to_string(),
            });
        }
        Err(source) => {
            return Err(CacheError::Io {
                path: path.display().to_string(),
                source,
            });
        }
    };

    serde_json::from_slice(&bytes).map_err(|e| CacheError::Corrupt {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}

/// Write a JSON snapshot with write-temp-then-rename.
///
/// Parent directories are created on demand. On failure the previous
/// file is left untouched.
pub async fn write_atomic<T: Serialize>(path: &Path, value: &T) -> anyhow::Result<()> {
    let json = serde_json::to_vec_pretty(value).context("serialize snapshot")?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("create directory {}", parent.display()))?;
    }

    let tmp = temp_path(path);
    if let Err(e) = write_file(&tmp, &json).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(e);
    }

    if let Err(e) = tokio::fs::rename(&tmp, path).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(e).with_context(|| format!("replace {}", path.display()));
    }

    Ok(())
}

async fn write_file(path: &Path, bytes: &[u8]) -> anyhow::Result<()> {
    let mut file = tokio::fs::File::create(path)
        .await
        .with_context(|| format!("create {}", path.display()))?;
    file.write_all(bytes)
        .await
        .with_context(|| format!("write {}", path.display()))?;
    file.sync_all()
        .await
        .with_context(|| format!("sync {}", path.display()))?;
    Ok(())
}

/// `dir/latest.json` -> `dir/.latest.json.tmp`
fn temp_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "snapshot".to_string());
    path.with_file_name(format!(".{name}.tmp"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    #[tokio::test]
    async fn test_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/combined/latest.json");

        let doc = json!({ "summary": { "total_orders": 3 } });
        write_atomic(&path, &doc).await.unwrap();

        let back: Value = read_snapshot(&path).await.unwrap();
        assert_eq!(back, doc);
        assert!(!temp_path(&path).exists());
    }

    #[tokio::test]
    async fn test_write_replaces_previous_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("orders.json");

        write_atomic(&path, &json!({ "v": 1, "extra": [1, 2, 3] })).await.unwrap();
        write_atomic(&path, &json!({ "v": 2 })).await.unwrap();

        let back: Value = read_snapshot(&path).await.unwrap();
        assert_eq!(back, json!({ "v": 2 }));
    }

    #[tokio::test]
    async fn test_read_missing_is_miss() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_snapshot::<Value>(&dir.path().join("none.json"))
            .await
            .unwrap_err();
        assert!(matches!(err, CacheError::Miss { .. }));
    }

    #[tokio::test]
    async fn test_read_garbage_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("orders.json");
        tokio::fs::write(&path, b"{ \"channel\": ").await.unwrap();

        let err = read_snapshot::<Value>(&path).await.unwrap_err();
        assert!(matches!(err, CacheError::Corrupt { .. }));
    }

    #[tokio::test]
    async fn test_failed_write_keeps_previous_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("latest.json");
        write_atomic(&path, &json!({ "v": 1 })).await.unwrap();

        // A directory squatting on the temp name makes the write fail.
        tokio::fs::create_dir(temp_path(&path)).await.unwrap();
        assert!(write_atomic(&path, &json!({ "v": 2 })).await.is_err());

        let back: Value = read_snapshot(&path).await.unwrap();
        assert_eq!(back, json!({ "v": 1 }));
    }
}
