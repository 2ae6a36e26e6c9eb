//! The persisted post store.
//!
//! Two JSON files: the full store (an array of posts, newest first, capped) and a
//! recent-posts file holding the store's first few entries. Both are rewritten in
//! full on every merge through a temp file and a rename, so a failed write leaves
//! the previous file in place.

pub mod merge;
pub mod migrate;

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::post::Post;
pub use merge::{dedup_by_id, merge_posts, recent_subset, MergeStats};
pub use migrate::{migrate_all, migrate_record};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialize posts for {}: {source}", path.display())]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// What happened to the recent-posts file during a merge.
#[derive(Debug)]
pub enum RecentWrite {
    /// Written with this many posts.
    Written(usize),
    /// The merged store was empty, nothing to write.
    SkippedEmpty,
    /// The main store write failed, so the recent file was left alone.
    SkippedStoreFailed,
    /// The write itself failed. Does not affect the main store.
    Failed(StoreError),
}

/// Result of [`PostStore::update`].
///
/// `posts` is always the merged in-memory store, whether or not it reached disk.
#[derive(Debug)]
pub struct MergeOutcome {
    pub posts: Vec<Post>,
    pub stats: MergeStats,
    pub store_written: Result<(), StoreError>,
    pub recent: RecentWrite,
}

/// File-backed store of harvested posts.
///
/// Single writer: concurrent runs against the same files must be serialized by the caller.
#[derive(Debug, Clone)]
pub struct PostStore {
    path: PathBuf,
    recent_path: PathBuf,
    cap: usize,
    recent_count: usize,
}

impl PostStore {
    #[must_use]
    pub fn new(
        path: impl Into<PathBuf>,
        recent_path: impl Into<PathBuf>,
        cap: usize,
        recent_count: usize,
    ) -> Self {
        Self {
            path: path.into(),
            recent_path: recent_path.into(),
            cap,
            recent_count,
        }
    }

    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            &config.store_path,
            &config.recent_path,
            config.store_cap,
            config.recent_count,
        )
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn recent_path(&self) -> &Path {
        &self.recent_path
    }

    /// Read and migrate the stored posts.
    ///
    /// A missing, unreadable or malformed file loads as an empty store.
    pub async fn load(&self) -> Vec<Post> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No stored posts yet");
                return Vec::new();
            }
            Err(e) => {
                warn!(path = %self.path.display(), "Failed to read stored posts, starting empty: {e}");
                return Vec::new();
            }
        };

        let raw: Vec<serde_json::Value> = match serde_json::from_slice(&bytes) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(path = %self.path.display(), "Stored posts are not a JSON array, starting empty: {e}");
                return Vec::new();
            }
        };

        let posts = migrate_all(raw);
        info!(path = %self.path.display(), posts = posts.len(), "Loaded stored posts");
        posts
    }

    /// Load, merge `new_posts` in, cap, and write both files.
    pub async fn update(&self, new_posts: Vec<Post>) -> MergeOutcome {
        let existing = self.load().await;
        let (posts, stats) = merge_posts(existing, new_posts, self.cap);
        debug!(?stats, total = posts.len(), "Merged posts");

        let store_written = write_json_atomic(&self.path, &posts).await;

        let recent = match &store_written {
            Err(e) => {
                warn!(path = %self.path.display(), "Failed to save store: {e}");
                RecentWrite::SkippedStoreFailed
            }
            Ok(()) if posts.is_empty() => RecentWrite::SkippedEmpty,
            Ok(()) => {
                info!(path = %self.path.display(), posts = posts.len(), "Store saved");
                let subset = recent_subset(&posts, self.recent_count);
                match write_json_atomic(&self.recent_path, subset).await {
                    Ok(()) => RecentWrite::Written(subset.len()),
                    Err(e) => {
                        warn!(path = %self.recent_path.display(), "Failed to save recent posts: {e}");
                        RecentWrite::Failed(e)
                    }
                }
            }
        };

        MergeOutcome {
            posts,
            stats,
            store_written,
            recent,
        }
    }
}

/// Serialize `value` as pretty JSON and swap it into `path`.
///
/// Writes a sibling temp file first; `path` is only replaced by the final rename.
///
/// # Errors
///
/// Returns an error if serialization, the directory creation, the write, or the
/// rename fails. The temp file is removed on failure.
pub async fn write_json_atomic<T: Serialize + ?Sized>(
    path: &Path,
    value: &T,
) -> Result<(), StoreError> {
    let io_err = |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    };

    let json = serde_json::to_vec_pretty(value).map_err(|source| StoreError::Serialize {
        path: path.to_path_buf(),
        source,
    })?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
    }

    let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);

    let result = async {
        tokio::fs::write(&tmp_path, &json).await?;
        tokio::fs::rename(&tmp_path, path).await
    }
    .await;

    if let Err(e) = result {
        let _ = tokio::fs::remove_file(&tmp_path).await;
        return Err(io_err(e));
    }
    Ok(())
}
