//! Shared storage volume
//!
//! Files are streamed straight into the storage root. Until a write is
//! committed the destination is owned by a [`PartialFile`] guard, so a
//! failed, timed out or cancelled upload never leaves a truncated file
//! behind for the backend to pick up.

use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::time::Duration;

use bytes::Bytes;
use futures::{Stream, StreamExt};
use sha2::{Digest, Sha256};
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncWriteExt, BufWriter};
use uuid::Uuid;

use super::name::{numbered_name, sanitize_file_name};
use super::types::{StorageError, StoredFile, MAX_RENAME_ATTEMPTS};
use crate::config::{CollisionPolicy, StorageConfig};

#[derive(Debug, Clone)]
pub struct SharedStorage {
    root: PathBuf,
    policy: CollisionPolicy,
    timeout: Duration,
}

/// An opened destination that has not been committed yet
struct Destination {
    file: File,
    /// Where the bytes are being written
    write_path: PathBuf,
    /// Where the file ends up once committed
    final_path: PathBuf,
    final_name: String,
}

impl SharedStorage {
    pub fn new(config: StorageConfig) -> Self {
        Self {
            root: config.root,
            policy: config.collision_policy,
            timeout: config.timeout,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn policy(&self) -> CollisionPolicy {
        self.policy
    }

    /// Create the storage root if it does not exist and return its canonical path
    pub async fn ensure_root(&self) -> Result<PathBuf, StorageError> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(StorageError::io("Failed to create storage root"))?;

        tokio::fs::canonicalize(&self.root)
            .await
            .map_err(StorageError::io("Failed to resolve storage root"))
    }

    /// Stream `content` into the storage root under a name derived from
    /// `file_name`.
    ///
    /// Nothing touches the filesystem until the first non-empty chunk has
    /// arrived; an upload without content fails with [`StorageError::Empty`].
    /// The storage deadline starts before that first chunk is awaited.
    pub async fn store<S, E>(&self, file_name: &str, content: S) -> Result<StoredFile, StorageError>
    where
        S: Stream<Item = Result<Bytes, E>> + Send,
        E: Display + Send,
    {
        let name = sanitize_file_name(file_name)?;

        let stored = tokio::time::timeout(self.timeout, self.copy(&name, file_name, content))
            .await
            .map_err(|_| StorageError::Timeout(self.timeout))??;

        tracing::info!(
            path = %stored.absolute_path.display(),
            original_name = %stored.original_name,
            size = stored.size,
            "File saved to shared storage"
        );

        Ok(stored)
    }

    async fn copy<S, E>(&self, name: &str, original_name: &str, content: S) -> Result<StoredFile, StorageError>
    where
        S: Stream<Item = Result<Bytes, E>> + Send,
        E: Display + Send,
    {
        let mut content = std::pin::pin!(content);

        let first = loop {
            match content.next().await {
                Some(Ok(chunk)) if chunk.is_empty() => continue,
                Some(Ok(chunk)) => break chunk,
                Some(Err(e)) => return Err(StorageError::Stream(e.to_string())),
                None => return Err(StorageError::Empty),
            }
        };

        let root = self.ensure_root().await?;

        let destination = self.open_destination(&root, name).await?;
        let guard = PartialFile::new(destination.write_path.clone());

        let (size, sha256) = write_stream(destination.file, first, content).await?;

        if destination.write_path != destination.final_path {
            tokio::fs::rename(&destination.write_path, &destination.final_path)
                .await
                .map_err(StorageError::io("Failed to move upload into place"))?;
        }
        guard.commit();

        Ok(StoredFile {
            relative_path: destination.final_name,
            absolute_path: destination.final_path,
            original_name: original_name.to_string(),
            size,
            sha256,
        })
    }

    async fn open_destination(&self, root: &Path, name: &str) -> Result<Destination, StorageError> {
        match self.policy {
            CollisionPolicy::Reject => {
                let path = root.join(name);
                match create_new(&path).await {
                    Ok(file) => Ok(Destination {
                        file,
                        write_path: path.clone(),
                        final_path: path,
                        final_name: name.to_string(),
                    }),
                    Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                        Err(StorageError::Conflict(name.to_string()))
                    }
                    Err(e) => Err(StorageError::io("Failed to create file")(e)),
                }
            }
            CollisionPolicy::Rename => {
                for n in 0..MAX_RENAME_ATTEMPTS {
                    let candidate = numbered_name(name, n);
                    let path = root.join(&candidate);
                    match create_new(&path).await {
                        Ok(file) => {
                            if n > 0 {
                                tracing::debug!(requested = %name, stored = %candidate, "Name taken, renamed upload");
                            }
                            return Ok(Destination {
                                file,
                                write_path: path.clone(),
                                final_path: path,
                                final_name: candidate,
                            });
                        }
                        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => continue,
                        Err(e) => return Err(StorageError::io("Failed to create file")(e)),
                    }
                }
                Err(StorageError::NameSpaceExhausted(name.to_string()))
            }
            CollisionPolicy::Overwrite => {
                let temp_path = root.join(format!(".upload-{}.partial", Uuid::new_v4()));
                let file = create_new(&temp_path)
                    .await
                    .map_err(StorageError::io("Failed to create temporary file"))?;
                Ok(Destination {
                    file,
                    write_path: temp_path,
                    final_path: root.join(name),
                    final_name: name.to_string(),
                })
            }
        }
    }
}

async fn create_new(path: &Path) -> std::io::Result<File> {
    OpenOptions::new().write(true).create_new(true).open(path).await
}

/// Copy `first` and the rest of `content` into `file`, returning the byte
/// count and hex SHA-256. The file is synced before returning.
async fn write_stream<S, E>(file: File, first: Bytes, mut content: S) -> Result<(u64, String), StorageError>
where
    S: Stream<Item = Result<Bytes, E>> + Unpin,
    E: Display + Send,
{
    let mut writer = BufWriter::new(file);
    let mut hasher = Sha256::new();
    let mut size = 0u64;

    let mut chunk = Some(first);
    loop {
        if let Some(bytes) = chunk.take() {
            hasher.update(&bytes);
            size += bytes.len() as u64;
            writer
                .write_all(&bytes)
                .await
                .map_err(StorageError::io("Failed to write upload"))?;
        }

        match content.next().await {
            Some(Ok(bytes)) => chunk = Some(bytes),
            Some(Err(e)) => return Err(StorageError::Stream(e.to_string())),
            None => break,
        }
    }

    writer
        .flush()
        .await
        .map_err(StorageError::io("Failed to flush upload"))?;
    writer
        .into_inner()
        .sync_all()
        .await
        .map_err(StorageError::io("Failed to sync upload"))?;

    Ok((size, hex::encode(hasher.finalize())))
}

/// Removes the file at `path` on drop unless committed
struct PartialFile {
    path: PathBuf,
    committed: bool,
}

impl PartialFile {
    fn new(path: PathBuf) -> Self {
        Self {
            path,
            committed: false,
        }
    }

    fn commit(mut self) {
        self.committed = true;
    }
}

impl Drop for PartialFile {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        match std::fs::remove_file(&self.path) {
            Ok(()) => tracing::debug!(path = %self.path.display(), "Removed partial upload"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(path = %self.path.display(), error = %e, "Failed to remove partial upload"),
        }
    }
}
