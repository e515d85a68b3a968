//! Filesystem-backed resource operations.
//!
//! [`FileStore`] implements the three operations exposed over HTTP:
//!
//! - [`FileStore::read_resource`]: whole-file read plus fingerprint (GET)
//! - [`FileStore::list_directory`]: one-level listing with per-entry stat (PROPFIND)
//! - [`FileStore::write_resource`]: create/overwrite, optionally conditional (PUT)
//!
//! # Conditional writes
//!
//! A PUT carrying `If-Match` first reads the resource to obtain its current
//! fingerprint and only writes when the token matches. Without
//! [`DavConfig::lock_writes`] the check and the write are separate steps, so
//! another writer may change the file in between: the guarantee is optimistic
//! concurrency with a narrow race window, not linearizability.

use std::future::Future;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use bytes::Bytes;
use futures::future::try_join_all;
use tracing::{debug, error};

use crate::config::DavConfig;
use crate::error::{DavError, DavResult};
use crate::fingerprint::Fingerprint;
use crate::locks::{WriteGuard, WriteLocks};
use crate::path::{ResolvedPath, resolve_path};

/// The only `Depth` value PROPFIND accepts.
pub const SUPPORTED_DEPTH: &str = "1";

/// A file read in full, together with its fingerprint.
#[derive(Debug, Clone)]
pub struct Resource {
    /// The path the file was read from.
    pub path: ResolvedPath,
    /// Fingerprint of `contents`.
    pub fingerprint: Fingerprint,
    /// The file's bytes, exactly as read.
    pub contents: Bytes,
}

/// One immediate child of a listed directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
    /// The entry's file name.
    pub name: String,
    /// The listed directory's path joined with `name`.
    pub path: ResolvedPath,
    /// Whether the entry is a directory (a WebDAV collection).
    pub is_collection: bool,
}

/// How a write locates its target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteMode {
    /// Resolve the target from the request URL.
    Unconditional,
    /// The precondition already passed; write to the path it was checked against.
    Conditional {
        /// The path whose fingerprint matched.
        resolved: ResolvedPath,
    },
}

/// Resource operations over a directory tree.
///
/// Cloning is cheap; clones share the write lock registry.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
    write_locks: Option<Arc<WriteLocks>>,
}

impl FileStore {
    /// Create a store serving `root`, without write locking.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            write_locks: None,
        }
    }

    /// Create a store from configuration.
    #[must_use]
    pub fn from_config(config: &DavConfig) -> Self {
        let store = Self::new(config.root_dir.clone());
        if config.lock_writes {
            store.with_write_locks()
        } else {
            store
        }
    }

    /// Serialize writes per path (see [`WriteLocks`]).
    #[must_use]
    pub fn with_write_locks(mut self) -> Self {
        self.write_locks = Some(Arc::new(WriteLocks::new()));
        self
    }

    /// Read the file at `url` and fingerprint it.
    ///
    /// Every read failure (missing file, directory, permissions) is reported
    /// as [`DavError::NotFound`].
    pub async fn read_resource(&self, url: &str) -> DavResult<Resource> {
        let path = resolve_path(url)?;
        self.read_resolved(path).await
    }

    async fn read_resolved(&self, path: ResolvedPath) -> DavResult<Resource> {
        match tokio::fs::read(path.under(&self.root)).await {
            Ok(contents) => {
                let fingerprint = Fingerprint::of(&contents);
                debug!(path = %path, %fingerprint, size = contents.len(), "read resource");
                Ok(Resource {
                    path,
                    fingerprint,
                    contents: Bytes::from(contents),
                })
            }
            Err(source) => Err(DavError::NotFound {
                path: path.as_path().to_path_buf(),
                source,
            }),
        }
    }

    /// List the immediate children of the directory at `url`.
    ///
    /// `depth` is the raw `Depth` header. Anything but `1` is rejected before
    /// the filesystem is touched. Each entry is stat'ed concurrently; the
    /// listing fails as a whole if any stat fails. Entries come back in
    /// directory enumeration order.
    pub async fn list_directory(
        &self,
        url: &str,
        depth: Option<&str>,
    ) -> DavResult<Vec<DirectoryEntry>> {
        if depth != Some(SUPPORTED_DEPTH) {
            return Err(DavError::UnsupportedDepth {
                depth: depth.map(ToOwned::to_owned),
            });
        }

        let dir = resolve_path(url)?;
        let names = self
            .read_dir_names(&dir)
            .await
            .map_err(|source| DavError::DirectoryNotFound {
                path: dir.as_path().to_path_buf(),
                source,
            })?;

        let stats = names.into_iter().map(|name| {
            let path = dir.join_entry(&name);
            async move {
                match tokio::fs::metadata(path.under(&self.root)).await {
                    Ok(meta) => Ok(DirectoryEntry {
                        name,
                        path,
                        is_collection: meta.is_dir(),
                    }),
                    Err(source) => {
                        error!(path = %path, error = %source, "failed to stat directory entry");
                        Err(DavError::EntryStat {
                            path: path.as_path().to_path_buf(),
                            source,
                        })
                    }
                }
            }
        });
        let entries = try_join_all(stats).await?;

        debug!(path = %dir, entries = entries.len(), "listed directory");
        Ok(entries)
    }

    async fn read_dir_names(&self, dir: &ResolvedPath) -> io::Result<Vec<String>> {
        let mut read_dir = tokio::fs::read_dir(dir.under(&self.root)).await?;
        let mut names = Vec::new();
        while let Some(entry) = read_dir.next_entry().await? {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        Ok(names)
    }

    /// Create or overwrite the file at `url` with the bytes produced by `body`.
    ///
    /// With `if_match`, the current resource is read first and the write only
    /// proceeds if its fingerprint equals the token; a missing resource never
    /// matches. `body` is awaited only once the precondition has passed, so a
    /// rejected request leaves its body unread. If `body` fails, nothing is
    /// written.
    pub async fn write_resource<F, E>(
        &self,
        url: &str,
        if_match: Option<&str>,
        body: F,
    ) -> DavResult<()>
    where
        F: Future<Output = Result<Bytes, E>>,
        E: Into<DavError>,
    {
        let _guard = self.lock_for(url).await?;

        let mode = match if_match {
            None => WriteMode::Unconditional,
            Some(token) => self.check_precondition(url, token).await?,
        };

        self.write_with_mode(url, mode, body).await
    }

    /// Compare `token` against the current fingerprint of the resource at `url`.
    async fn check_precondition(&self, url: &str, token: &str) -> DavResult<WriteMode> {
        match self.read_resource(url).await {
            Ok(current) if current.fingerprint.matches(token) => Ok(WriteMode::Conditional {
                resolved: current.path,
            }),
            Ok(current) => {
                debug!(
                    path = %current.path,
                    expected = token,
                    actual = %current.fingerprint,
                    "If-Match mismatch"
                );
                Err(DavError::PreconditionFailed)
            }
            Err(DavError::NotFound { path, .. }) => {
                debug!(path = %path.display(), expected = token, "If-Match on unreadable resource");
                Err(DavError::PreconditionFailed)
            }
            Err(err) => Err(err),
        }
    }

    /// Collect `body` and write it to the target selected by `mode`.
    pub async fn write_with_mode<F, E>(&self, url: &str, mode: WriteMode, body: F) -> DavResult<()>
    where
        F: Future<Output = Result<Bytes, E>>,
        E: Into<DavError>,
    {
        let path = match mode {
            WriteMode::Unconditional => resolve_path(url)?,
            WriteMode::Conditional { resolved } => resolved,
        };

        let data = body.await.map_err(Into::into)?;

        tokio::fs::write(path.under(&self.root), &data)
            .await
            .map_err(|source| {
                error!(path = %path, error = %source, "failed to write file");
                DavError::WriteFailed {
                    path: path.as_path().to_path_buf(),
                    source,
                }
            })?;

        debug!(path = %path, size = data.len(), "wrote resource");
        Ok(())
    }

    async fn lock_for(&self, url: &str) -> DavResult<Option<WriteGuard<'_>>> {
        match &self.write_locks {
            Some(locks) => {
                let path = resolve_path(url)?;
                Ok(Some(locks.acquire(&path).await))
            }
            None => Ok(None),
        }
    }
}
