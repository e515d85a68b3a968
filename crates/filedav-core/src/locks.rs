//! Per-path write serialization.
//!
//! A conditional PUT reads the current fingerprint and only then writes. Two
//! PUTs to the same path can interleave between those steps. When enabled,
//! [`WriteLocks`] closes that window inside one process by holding an async
//! mutex keyed by resolved path across the check and the write. Writers in
//! other processes are not affected.

use std::path::PathBuf;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::path::ResolvedPath;

/// Registry of per-path write locks.
#[derive(Debug, Default)]
pub struct WriteLocks {
    locks: DashMap<PathBuf, Arc<Mutex<()>>>,
}

impl WriteLocks {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive write access to `path`.
    pub async fn acquire(&self, path: &ResolvedPath) -> WriteGuard<'_> {
        let key = path.as_path().to_path_buf();
        // Clone out of the map so the shard lock is not held across the await.
        let lock = Arc::clone(self.locks.entry(key.clone()).or_default().value());
        let guard = lock.lock_owned().await;
        WriteGuard {
            locks: self,
            key,
            _guard: guard,
        }
    }

    /// Number of paths that currently have a lock entry.
    #[must_use]
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    /// Whether no path currently has a lock entry.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

/// Exclusive write access to one path; released on drop.
#[derive(Debug)]
pub struct WriteGuard<'a> {
    locks: &'a WriteLocks,
    key: PathBuf,
    _guard: OwnedMutexGuard<()>,
}

impl Drop for WriteGuard<'_> {
    fn drop(&mut self) {
        // The map and this guard hold one reference each; anything more is a
        // waiter that still needs the entry.
        self.locks
            .locks
            .remove_if(&self.key, |_, lock| Arc::strong_count(lock) <= 2);
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn test_should_release_entry_when_last_writer_finishes() {
        let locks = WriteLocks::new();
        let path = ResolvedPath::new("docs/a.txt");
        {
            let _guard = locks.acquire(&path).await;
            assert_eq!(locks.len(), 1);
        }
        assert!(locks.is_empty());
    }

    #[tokio::test]
    async fn test_should_serialize_writers_on_same_path() {
        let locks = Arc::new(WriteLocks::new());
        let path = ResolvedPath::new("docs/a.txt");

        let guard = locks.acquire(&path).await;

        let waiter = {
            let locks = Arc::clone(&locks);
            let path = path.clone();
            tokio::spawn(async move {
                let _guard = locks.acquire(&path).await;
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        drop(guard);
        waiter.await.expect("waiter should complete");
        assert!(locks.is_empty());
    }

    #[tokio::test]
    async fn test_should_not_block_other_paths() {
        let locks = WriteLocks::new();
        let _a = locks.acquire(&ResolvedPath::new("a")).await;
        let b = tokio::time::timeout(
            Duration::from_millis(100),
            locks.acquire(&ResolvedPath::new("b")),
        )
        .await;
        assert!(b.is_ok());
    }
}
