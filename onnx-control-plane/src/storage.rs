//! Content-addressed artifact store (C1).
//!
//! Flat directory layout: `{base}/{model_id}.onnx`. Uploads stream through a
//! fixed-size chunk buffer, updating a running SHA-256 and byte counter, and
//! abort the instant the configured cap is exceeded — the whole file is
//! never buffered in memory.

use std::path::{Path, PathBuf};

use futures_util::{Stream, StreamExt};
use sha2::{Digest, Sha256};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};

use crate::error::StorageError;

const CHUNK_SIZE: usize = 8 * 1024;

#[derive(Clone)]
pub struct ArtifactStore {
    base: PathBuf,
}

/// Outcome of a successful [`ArtifactStore::save`].
pub struct SavedArtifact {
    /// Logical path, relative to the store's base directory.
    pub path: String,
    pub size_bytes: u64,
    pub content_hash: String,
}

impl ArtifactStore {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    pub async fn ensure_base_dir(&self) -> Result<(), StorageError> {
        tokio::fs::create_dir_all(&self.base)
            .await
            .map_err(|e| StorageError::Other(e.to_string()))
    }

    /// Sanitize a caller-supplied filename: strip any directory components
    /// and keep only the final path segment. The model id is what actually
    /// determines the on-disk name (§6: `{model_id}.onnx`); this is only
    /// used to validate the extension the caller claims to be uploading.
    pub fn sanitize_filename(name: &str) -> String {
        Path::new(name)
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("model.onnx")
            .to_string()
    }

    /// Stream `reader` into `{model_id}.onnx` under the store's base
    /// directory, enforcing `max_bytes` as a streaming cap. On success, the
    /// file is renamed into place atomically (written first to a sibling
    /// `.tmp` file so a half-written upload is never visible at the final path).
    pub async fn save<R: AsyncRead + Unpin>(
        &self,
        model_id: &str,
        mut reader: R,
        max_bytes: u64,
    ) -> Result<SavedArtifact, StorageError> {
        self.ensure_base_dir().await?;
        let logical = format!("{model_id}.onnx");
        let dest = self.base.join(&logical);
        let tmp = self.base.join(format!(".{model_id}.onnx.tmp"));

        let mut file = tokio::fs::File::create(&tmp)
            .await
            .map_err(|e| StorageError::Other(e.to_string()))?;
        let mut hasher = Sha256::new();
        let mut total: u64 = 0;
        let mut buf = vec![0u8; CHUNK_SIZE];

        loop {
            let n = reader
                .read(&mut buf)
                .await
                .map_err(|e| StorageError::Other(e.to_string()))?;
            if n == 0 {
                break;
            }
            total += n as u64;
            if total > max_bytes {
                drop(file);
                let _ = tokio::fs::remove_file(&tmp).await;
                return Err(StorageError::Full { max_bytes });
            }
            hasher.update(&buf[..n]);
            file.write_all(&buf[..n])
                .await
                .map_err(|e| StorageError::Other(e.to_string()))?;
        }
        file.flush().await.map_err(|e| StorageError::Other(e.to_string()))?;
        drop(file);

        tokio::fs::rename(&tmp, &dest)
            .await
            .map_err(|e| StorageError::Other(e.to_string()))?;

        Ok(SavedArtifact {
            path: logical,
            size_bytes: total,
            content_hash: hex::encode(hasher.finalize()),
        })
    }

    /// Same contract as [`ArtifactStore::save`] but for a byte-chunk stream
    /// (axum's `Multipart::Field`) rather than an `AsyncRead` — multipart
    /// fields don't implement `AsyncRead`, so the upload controller needs
    /// this to keep the "never buffer the whole file" guarantee.
    pub async fn save_stream<S, E>(
        &self,
        model_id: &str,
        mut stream: S,
        max_bytes: u64,
    ) -> Result<SavedArtifact, StorageError>
    where
        S: Stream<Item = Result<bytes::Bytes, E>> + Unpin,
        E: std::fmt::Display,
    {
        self.ensure_base_dir().await?;
        let logical = format!("{model_id}.onnx");
        let dest = self.base.join(&logical);
        let tmp = self.base.join(format!(".{model_id}.onnx.tmp"));

        let mut file = tokio::fs::File::create(&tmp)
            .await
            .map_err(|e| StorageError::Other(e.to_string()))?;
        let mut hasher = Sha256::new();
        let mut total: u64 = 0;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| {
                StorageError::Other(format!("error reading upload stream: {e}"))
            })?;
            total += chunk.len() as u64;
            if total > max_bytes {
                drop(file);
                let _ = tokio::fs::remove_file(&tmp).await;
                return Err(StorageError::Full { max_bytes });
            }
            hasher.update(&chunk);
            file.write_all(&chunk)
                .await
                .map_err(|e| StorageError::Other(e.to_string()))?;
        }
        file.flush().await.map_err(|e| StorageError::Other(e.to_string()))?;
        drop(file);

        tokio::fs::rename(&tmp, &dest)
            .await
            .map_err(|e| StorageError::Other(e.to_string()))?;

        Ok(SavedArtifact {
            path: logical,
            size_bytes: total,
            content_hash: hex::encode(hasher.finalize()),
        })
    }

    pub async fn get(&self, logical_path: &str) -> Result<Vec<u8>, StorageError> {
        let abs = self.resolve(logical_path)?;
        tokio::fs::read(&abs)
            .await
            .map_err(|_| StorageError::NotFound(logical_path.to_string()))
    }

    pub async fn delete(&self, logical_path: &str) -> bool {
        match self.resolve(logical_path) {
            Ok(abs) => tokio::fs::remove_file(&abs).await.is_ok(),
            Err(_) => false,
        }
    }

    pub async fn exists(&self, logical_path: &str) -> bool {
        match self.resolve(logical_path) {
            Ok(abs) => tokio::fs::try_exists(&abs).await.unwrap_or(false),
            Err(_) => false,
        }
    }

    /// Resolve a logical path to an absolute path, rejecting any path that
    /// canonicalizes outside the configured base directory (P8).
    pub fn resolve(&self, logical_path: &str) -> Result<PathBuf, StorageError> {
        let sanitized = Self::sanitize_filename(logical_path);
        let candidate = self.base.join(&sanitized);

        let base_canon = self
            .base
            .canonicalize()
            .unwrap_or_else(|_| self.base.clone());

        // The file may not exist yet (e.g. a path about to be written to);
        // canonicalize what we can and verify the parent stays within base.
        let check = candidate
            .canonicalize()
            .unwrap_or_else(|_| base_canon.join(&sanitized));

        if !check.starts_with(&base_canon) {
            return Err(StorageError::PathTraversal(logical_path.to_string()));
        }
        Ok(check)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn save_computes_hash_and_size() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        let data = b"hello world";
        let saved = store.save("model-1", &data[..], 1024).await.unwrap();
        assert_eq!(saved.size_bytes, data.len() as u64);
        assert_eq!(saved.path, "model-1.onnx");
        assert!(store.exists(&saved.path).await);
    }

    #[tokio::test]
    async fn save_stream_computes_hash_and_size() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        let chunks: Vec<Result<bytes::Bytes, std::io::Error>> = vec![
            Ok(bytes::Bytes::from_static(b"hello ")),
            Ok(bytes::Bytes::from_static(b"world")),
        ];
        let stream = futures_util::stream::iter(chunks);
        let saved = store.save_stream("model-s", stream, 1024).await.unwrap();
        assert_eq!(saved.size_bytes, 11);
        assert!(store.exists(&saved.path).await);
    }

    #[tokio::test]
    async fn save_stream_rejects_oversize() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        let chunks: Vec<Result<bytes::Bytes, std::io::Error>> =
            vec![Ok(bytes::Bytes::from(vec![0u8; 100]))];
        let stream = futures_util::stream::iter(chunks);
        let err = store.save_stream("model-s2", stream, 10).await.unwrap_err();
        assert!(matches!(err, StorageError::Full { max_bytes: 10 }));
        assert!(!store.exists("model-s2.onnx").await);
    }

    #[tokio::test]
    async fn save_rejects_oversize_stream() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        let data = vec![0u8; 100];
        let err = store.save("model-2", &data[..], 10).await.unwrap_err();
        assert!(matches!(err, StorageError::Full { max_bytes: 10 }));
        assert!(!store.exists("model-2.onnx").await);
    }

    #[tokio::test]
    async fn delete_of_absent_path_returns_false() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        assert!(!store.delete("missing.onnx").await);
    }

    #[test]
    fn sanitize_filename_strips_directories() {
        assert_eq!(ArtifactStore::sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(ArtifactStore::sanitize_filename("model.onnx"), "model.onnx");
    }

    #[test]
    fn resolve_rejects_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        // sanitize_filename already strips `..`, but resolve is the second
        // line of defense for any path that still escapes after sanitization.
        let resolved = store.resolve("model.onnx").unwrap();
        let base_canon = dir.path().canonicalize().unwrap();
        assert!(resolved.starts_with(&base_canon));
    }
}
