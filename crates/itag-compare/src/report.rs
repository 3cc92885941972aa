//! Comparison report output.
//!
//! One line per reported item, written to stdout and optionally mirrored
//! into a report file that is rewritten fresh each run.

use crate::decision::{FormatSide, Verdict};
use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Render a rank for display; unresolved ranks read as N/A
fn rank_display(rank: Option<u32>) -> String {
    rank.map(|r| r.to_string())
        .unwrap_or_else(|| "N/A".to_string())
}

/// Format one report line
pub fn format_line(
    source_file: &str,
    local: &FormatSide,
    remote: &FormatSide,
    verdict: &Verdict,
) -> String {
    format!(
        "{}: File Itag: {} (Rank {}), Best Itag: {} (Rank {}) - {}",
        source_file,
        local.itag,
        rank_display(local.rank),
        remote.itag,
        rank_display(remote.rank),
        verdict.label
    )
}

/// Report sink: stdout always, plus an optional file
pub struct Report {
    path: Option<PathBuf>,
    file: Option<BufWriter<File>>,
}

impl Report {
    /// Open the report, truncating any previous run's file
    pub fn create(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(path) => {
                let file = File::create(path)
                    .with_context(|| format!("Failed to create report file: {}", path.display()))?;
                Some(BufWriter::new(file))
            }
            None => None,
        };
        Ok(Self {
            path: path.map(Path::to_path_buf),
            file,
        })
    }

    /// Report file path, when one was requested
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Emit one report line
    pub fn line(&mut self, line: &str) -> Result<()> {
        println!("{}", line);
        if let Some(file) = &mut self.file {
            writeln!(file, "{}", line).context("Failed to write report line")?;
        }
        Ok(())
    }

    /// Flush the report file
    pub fn finish(&mut self) -> Result<()> {
        if let Some(file) = &mut self.file {
            file.flush().context("Failed to flush report file")?;
        }
        Ok(())
    }
}
