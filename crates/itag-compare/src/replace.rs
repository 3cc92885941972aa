//! Safe replacement of archived files.
//!
//! Per content id: move the current files into a timestamped backup
//! directory, fetch a fresh copy into the scratch directory under the same
//! warning-discards-attempt discipline as resolution, and commit only when
//! a clean attempt actually produced files. On exhaustion the backup is
//! left intact as the sole recovery point; nothing is ever deleted before a
//! replacement exists.

use anyhow::{Context, Result};
use shared::{ArchivePaths, MediaFetcher};
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// Terminal state of one replacement
#[derive(Debug)]
pub enum ReplaceOutcome {
    /// No local file matched the content id; nothing to protect, nothing
    /// to replace
    NothingToBackUp,
    /// Fresh files are live, backup retained
    Committed {
        backup_dir: PathBuf,
        installed: Vec<String>,
    },
    /// Every attempt exhausted; the backup directory is the recovery point
    /// and the live folder is missing the item until restored manually
    Failed { backup_dir: PathBuf },
}

/// Replacement workflow bound to one archive folder
pub struct ReplaceWorkflow<'a, F: MediaFetcher> {
    fetcher: &'a F,
    paths: &'a ArchivePaths,
    max_retries: u32,
}

impl<'a, F: MediaFetcher> ReplaceWorkflow<'a, F> {
    pub fn new(fetcher: &'a F, paths: &'a ArchivePaths, max_retries: u32) -> Self {
        Self {
            fetcher,
            paths,
            max_retries,
        }
    }

    /// Back up, refetch and swap the files of one content id
    pub async fn replace(&self, video_id: &str) -> Result<ReplaceOutcome> {
        let folder = self.paths.folder();
        let matches = files_matching(folder, video_id)?;
        if matches.is_empty() {
            warn!(video_id, "No files found to back up, skipping");
            return Ok(ReplaceOutcome::NothingToBackUp);
        }

        // The backup directory is created only now that a replacement is
        // actually proceeding, so aborted items leave no empty directories.
        let backup_dir = self.paths.backup_dir(video_id);
        let moved = move_files(folder, &backup_dir, &matches)?;
        info!(
            video_id,
            files = moved.len(),
            backup = %backup_dir.display(),
            "Backed up current files"
        );

        let scratch = self.paths.scratch_dir();
        for attempt in 1..=self.max_retries {
            // Even a failed attempt can leave partial files behind; start
            // each attempt from an empty scratch directory.
            clear_files(&scratch)?;

            let outcome = match self.fetcher.fetch(video_id, &scratch).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    warn!(video_id, attempt, error = %e, "Download failed, retrying");
                    continue;
                }
            };

            if !outcome.is_clean() {
                warn!(
                    video_id,
                    attempt,
                    warnings = outcome.warnings.len(),
                    "Download emitted warnings, retrying"
                );
                continue;
            }

            let downloaded = files_matching(&scratch, video_id)?;
            if downloaded.is_empty() {
                warn!(video_id, attempt, "No files downloaded, retrying");
                continue;
            }

            // Commit: all matched files move in one pass, then scratch is
            // purged of whatever else the attempt produced.
            let installed = move_files(&scratch, folder, &downloaded)?;
            clear_files(&scratch)?;
            info!(
                video_id,
                files = installed.len(),
                "Replacement committed"
            );
            return Ok(ReplaceOutcome::Committed {
                backup_dir,
                installed,
            });
        }

        error!(
            video_id,
            max_retries = self.max_retries,
            backup = %backup_dir.display(),
            "All download attempts failed, backup preserved"
        );
        Ok(ReplaceOutcome::Failed { backup_dir })
    }
}

/// List the files in a directory whose name contains the content id
///
/// Direct children only, sorted for deterministic processing; the backup
/// and scratch subdirectories are directories and thus never match.
fn files_matching(dir: &Path, video_id: &str) -> Result<Vec<String>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read directory: {}", dir.display()))?;

    let mut names: Vec<String> = entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().is_file())
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .filter(|name| name.contains(video_id))
        .collect();
    names.sort();
    Ok(names)
}

/// Move the named files from one directory into another, creating the
/// destination on first use
fn move_files(src: &Path, dest: &Path, names: &[String]) -> Result<Vec<String>> {
    std::fs::create_dir_all(dest)
        .with_context(|| format!("Failed to create directory: {}", dest.display()))?;

    let mut moved = Vec::new();
    for name in names {
        let from = src.join(name);
        let to = dest.join(name);
        std::fs::rename(&from, &to)
            .with_context(|| format!("Failed to move {} to {}", from.display(), to.display()))?;
        moved.push(name.clone());
    }
    Ok(moved)
}

/// Delete all files directly inside a directory, creating it if absent
fn clear_files(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create directory: {}", dir.display()))?;

    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read directory: {}", dir.display()))?
    {
        let entry = entry?;
        if entry.path().is_file() {
            if let Err(e) = std::fs::remove_file(entry.path()) {
                warn!(
                    path = %entry.path().display(),
                    error = %e,
                    "Failed to clean up stale file"
                );
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::bail;
    use shared::FetchOutcome;
    use std::sync::Mutex;
    use tempfile::TempDir;

    const VIDEO_ID: &str = "abc12345678";

    enum Step {
        Fail,
        Warned,
        CleanNoFiles,
        CleanWrite(&'static str),
    }

    struct ScriptedFetcher {
        steps: Mutex<Vec<Step>>,
        fetches: Mutex<u32>,
    }

    impl ScriptedFetcher {
        fn new(mut steps: Vec<Step>) -> Self {
            steps.reverse();
            Self {
                steps: Mutex::new(steps),
                fetches: Mutex::new(0),
            }
        }

        fn fetch_count(&self) -> u32 {
            *self.fetches.lock().unwrap()
        }
    }

    impl MediaFetcher for ScriptedFetcher {
        async fn fetch(&self, _video_id: &str, dest_dir: &Path) -> Result<FetchOutcome> {
            *self.fetches.lock().unwrap() += 1;
            let step = self.steps.lock().unwrap().pop().expect("script exhausted");
            match step {
                Step::Fail => bail!("simulated downloader error"),
                Step::Warned => {
                    // Warned attempts can still produce files
                    std::fs::write(dest_dir.join(format!("partial [{}].mkv", VIDEO_ID)), b"p")?;
                    Ok(FetchOutcome {
                        warnings: vec!["WARNING: requested format unavailable".to_string()],
                    })
                }
                Step::CleanNoFiles => Ok(FetchOutcome { warnings: Vec::new() }),
                Step::CleanWrite(name) => {
                    std::fs::write(dest_dir.join(name), b"fresh")?;
                    // Attempts leave unrelated litter too; commit must purge it
                    std::fs::write(dest_dir.join("fragment.part"), b"junk")?;
                    Ok(FetchOutcome { warnings: Vec::new() })
                }
            }
        }
    }

    fn seed_archive(dir: &Path) -> Vec<String> {
        let names = vec![
            format!("video [{}].mkv", VIDEO_ID),
            format!("video [{}].info.json", VIDEO_ID),
            "unrelated [zzzzzzzzzzz].mkv".to_string(),
        ];
        for name in &names {
            std::fs::write(dir.join(name), b"original").unwrap();
        }
        names
    }

    fn list_files(dir: &Path) -> Vec<String> {
        if !dir.exists() {
            return Vec::new();
        }
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().is_file())
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[tokio::test]
    async fn test_no_matching_files_is_a_no_op() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let paths = ArchivePaths::new(temp_dir.path(), None);
        let fetcher = ScriptedFetcher::new(vec![]);
        let workflow = ReplaceWorkflow::new(&fetcher, &paths, 5);

        std::fs::write(temp_dir.path().join("other [zzzzzzzzzzz].mkv"), b"x")?;

        let outcome = workflow.replace(VIDEO_ID).await?;
        assert!(matches!(outcome, ReplaceOutcome::NothingToBackUp));
        assert_eq!(fetcher.fetch_count(), 0);
        // No backup directory is created for an aborted item
        assert!(!paths.backup_root().exists());
        Ok(())
    }

    #[tokio::test]
    async fn test_commit_moves_fresh_files_and_purges_scratch() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let paths = ArchivePaths::new(temp_dir.path(), None);
        let fresh = "video fresh [abc12345678].webm";
        let fetcher = ScriptedFetcher::new(vec![Step::CleanWrite(fresh)]);
        let workflow = ReplaceWorkflow::new(&fetcher, &paths, 5);

        seed_archive(temp_dir.path());

        let outcome = workflow.replace(VIDEO_ID).await?;
        let ReplaceOutcome::Committed {
            backup_dir,
            installed,
        } = outcome
        else {
            panic!("expected commit");
        };

        assert_eq!(installed, vec![fresh.to_string()]);
        assert!(temp_dir.path().join(fresh).exists());
        // Originals live in the backup, untouched
        assert_eq!(
            list_files(&backup_dir),
            vec![
                format!("video [{}].info.json", VIDEO_ID),
                format!("video [{}].mkv", VIDEO_ID),
            ]
        );
        // Unrelated files stay live, scratch is empty again
        assert!(temp_dir.path().join("unrelated [zzzzzzzzzzz].mkv").exists());
        assert!(list_files(&paths.scratch_dir()).is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_warned_attempts_retry_until_clean() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let paths = ArchivePaths::new(temp_dir.path(), None);
        let fresh = "video fresh [abc12345678].webm";
        let fetcher = ScriptedFetcher::new(vec![Step::Warned, Step::Fail, Step::CleanWrite(fresh)]);
        let workflow = ReplaceWorkflow::new(&fetcher, &paths, 5);

        seed_archive(temp_dir.path());

        let outcome = workflow.replace(VIDEO_ID).await?;
        assert!(matches!(outcome, ReplaceOutcome::Committed { .. }));
        assert_eq!(fetcher.fetch_count(), 3);
        // The warned attempt's partial file was cleared, not committed
        assert!(!temp_dir
            .path()
            .join(format!("partial [{}].mkv", VIDEO_ID))
            .exists());
        Ok(())
    }

    #[tokio::test]
    async fn test_exhaustion_preserves_backup_and_moves_nothing_live() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let paths = ArchivePaths::new(temp_dir.path(), None);
        let fetcher =
            ScriptedFetcher::new(vec![Step::Fail, Step::Warned, Step::CleanNoFiles]);
        let workflow = ReplaceWorkflow::new(&fetcher, &paths, 3);

        seed_archive(temp_dir.path());

        let outcome = workflow.replace(VIDEO_ID).await?;
        let ReplaceOutcome::Failed { backup_dir } = outcome else {
            panic!("expected failure");
        };
        assert_eq!(fetcher.fetch_count(), 3);

        // Everything that was present before the attempt began is in the
        // backup; the live folder lost only the files moved to backup.
        assert_eq!(
            list_files(&backup_dir),
            vec![
                format!("video [{}].info.json", VIDEO_ID),
                format!("video [{}].mkv", VIDEO_ID),
            ]
        );
        assert_eq!(
            list_files(temp_dir.path()),
            vec!["unrelated [zzzzzzzzzzz].mkv".to_string()]
        );
        Ok(())
    }
}
