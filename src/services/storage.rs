use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use crate::config::AppConfig;

/// Owns the staging and converted-output directories on local disk.
///
/// Both directories are flat; their contents are the only state this
/// service keeps.
pub struct StorageService {
    uploads_dir: PathBuf,
    converted_dir: PathBuf,
}

/// Outcome of sweeping one directory
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SweepStats {
    pub scanned: usize,
    pub deleted: usize,
}

impl StorageService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            uploads_dir: config.uploads_dir(),
            converted_dir: config.converted_dir(),
        }
    }

    pub fn uploads_dir(&self) -> &Path {
        &self.uploads_dir
    }

    pub fn converted_dir(&self) -> &Path {
        &self.converted_dir
    }

    /// Creates both directories (and parents) if absent. Idempotent.
    ///
    /// The process must not serve requests without writable staging space,
    /// so the caller treats failure as fatal.
    pub async fn ensure_directories(&self) -> io::Result<()> {
        tokio::fs::create_dir_all(&self.uploads_dir).await?;
        tokio::fs::create_dir_all(&self.converted_dir).await?;
        Ok(())
    }

    pub fn staging_path(&self, stored_name: &str) -> PathBuf {
        self.uploads_dir.join(stored_name)
    }

    pub fn converted_path(&self, converted_name: &str) -> PathBuf {
        self.converted_dir.join(converted_name)
    }

    /// Lists the entry names of one directory, sorted
    pub async fn list_directory(dir: &Path) -> io::Result<Vec<String>> {
        let mut entries = tokio::fs::read_dir(dir).await?;
        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        names.sort();
        Ok(names)
    }

    /// Deletes regular files in `dir` whose modification time is older than
    /// `max_age`. Per-entry failures are logged and skipped; a file that is
    /// unreadable today may be reapable on the next pass.
    pub async fn sweep_directory(dir: &Path, max_age: Duration) -> SweepStats {
        let mut stats = SweepStats::default();
        let cutoff = match SystemTime::now().checked_sub(max_age) {
            Some(cutoff) => cutoff,
            // Retention window predates the epoch: nothing can be stale
            None => return stats,
        };

        let mut entries = match tokio::fs::read_dir(dir).await {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!("Sweep cannot read {}: {}", dir.display(), e);
                return stats;
            }
        };

        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(e) => {
                    tracing::warn!("Sweep iteration error in {}: {}", dir.display(), e);
                    break;
                }
            };

            let path = entry.path();
            let modified = match entry.metadata().await.and_then(|m| {
                if m.is_file() {
                    m.modified()
                } else {
                    Err(io::Error::other("not a regular file"))
                }
            }) {
                Ok(modified) => modified,
                Err(_) => continue,
            };

            stats.scanned += 1;
            if modified <= cutoff {
                match tokio::fs::remove_file(&path).await {
                    Ok(()) => stats.deleted += 1,
                    Err(e) => {
                        tracing::warn!("Failed to reap {}: {}", path.display(), e);
                    }
                }
            }
        }

        stats
    }

    /// Sweeps both owned directories with a uniform retention policy
    pub async fn sweep_all(&self, max_age: Duration) -> SweepStats {
        let uploads = Self::sweep_directory(&self.uploads_dir, max_age).await;
        let converted = Self::sweep_directory(&self.converted_dir, max_age).await;
        SweepStats {
            scanned: uploads.scanned + converted.scanned,
            deleted: uploads.deleted + converted.deleted,
        }
    }
}
