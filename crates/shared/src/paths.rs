//! Path utilities for the archive folder.
//!
//! This module centralizes the on-disk layout the tools produce inside an
//! archive folder: the per-replacement backup directories, the scratch
//! download directory, and the default report file location.

use chrono::Local;
use std::path::{Path, PathBuf};

/// Path manager for one archive folder
#[derive(Debug, Clone)]
pub struct ArchivePaths {
    folder: PathBuf,
    backup_root: PathBuf,
}

impl ArchivePaths {
    /// Create a new ArchivePaths rooted at the given archive folder
    ///
    /// `backup_root` overrides the default `<folder>/temp_backup` when set.
    pub fn new(folder: impl AsRef<Path>, backup_root: Option<PathBuf>) -> Self {
        let folder = folder.as_ref().to_path_buf();
        let backup_root = backup_root.unwrap_or_else(|| folder.join("temp_backup"));
        Self {
            folder,
            backup_root,
        }
    }

    /// Get the archive folder (the live file set)
    pub fn folder(&self) -> &Path {
        &self.folder
    }

    /// Get the backup root directory
    pub fn backup_root(&self) -> &Path {
        &self.backup_root
    }

    /// Get the backup directory for one content id, stamped for this run
    ///
    /// Backups are retained indefinitely, so the timestamp keeps repeated
    /// replacements of the same id from colliding.
    pub fn backup_dir(&self, video_id: &str) -> PathBuf {
        let timestamp = Local::now().format("%Y%m%d_%H%M%S");
        self.backup_root.join(format!("{}_{}", video_id, timestamp))
    }

    /// Get the scratch download directory
    pub fn scratch_dir(&self) -> PathBuf {
        self.folder.join("temp_download")
    }

    /// Get the default report file path (used by --log-auto)
    pub fn auto_report_file(&self) -> PathBuf {
        self.folder.join("itag-compare.log")
    }
}
