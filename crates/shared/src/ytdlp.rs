//! yt-dlp subprocess invocation.
//!
//! All remote work goes through the `yt-dlp` executable: probing the
//! currently offered formats for a video (`-J`, no download) and fetching a
//! fresh copy into a destination directory. Every invocation returns an
//! explicit per-attempt outcome value carrying the warnings yt-dlp emitted
//! on stderr, so callers can apply their own retry discipline. A warning is
//! evidence the result may not reflect true current availability (partial
//! or fallback responses), which is why it is reported per attempt instead
//! of being folded into a hard error.

use crate::config::ToolConfig;
use anyhow::Result;
use serde::Deserialize;
use std::future::Future;
use std::path::Path;
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

/// Errors from a single yt-dlp invocation
#[derive(Debug, Error)]
pub enum YtDlpError {
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("yt-dlp exited with status {code}: {stderr}")]
    Failed { code: i32, stderr: String },

    #[error("failed to parse yt-dlp JSON output: {0}")]
    Parse(#[from] serde_json::Error),
}

/// One format entry from a yt-dlp probe
///
/// yt-dlp lists formats worst-to-best, so the last entry of a probe is the
/// best format currently offered.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RemoteFormat {
    pub format_id: String,
    #[serde(default)]
    pub ext: Option<String>,
    #[serde(default)]
    pub resolution: Option<String>,
    #[serde(default)]
    pub fps: Option<f64>,
    #[serde(default)]
    pub vcodec: Option<String>,
    #[serde(default)]
    pub acodec: Option<String>,
    #[serde(default)]
    pub abr: Option<f64>,
    #[serde(default)]
    pub vbr: Option<f64>,
    #[serde(default)]
    pub tbr: Option<f64>,
    #[serde(default)]
    pub format_note: Option<String>,
}

/// Probe document shape as emitted by `yt-dlp -J`
#[derive(Debug, Deserialize)]
struct ProbeDocument {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    formats: Vec<RemoteFormat>,
}

/// Outcome of one probe attempt
#[derive(Debug)]
pub struct ProbeOutcome {
    /// Warnings yt-dlp emitted during this attempt
    pub warnings: Vec<String>,
    /// Video title, when yt-dlp reported one
    pub title: Option<String>,
    /// Offered formats, worst-to-best
    pub formats: Vec<RemoteFormat>,
}

impl ProbeOutcome {
    /// Whether this attempt completed without warnings
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }

    /// The best currently offered format (the last-listed entry)
    pub fn best(&self) -> Option<&RemoteFormat> {
        self.formats.last()
    }
}

/// Outcome of one fetch attempt
#[derive(Debug)]
pub struct FetchOutcome {
    /// Warnings yt-dlp emitted during this attempt
    pub warnings: Vec<String>,
}

impl FetchOutcome {
    /// Whether this attempt completed without warnings
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}

/// Source of remote format listings
pub trait FormatSource {
    fn probe(&self, video_id: &str) -> impl Future<Output = Result<ProbeOutcome>> + Send;
}

/// Fetcher of fresh media copies into a destination directory
pub trait MediaFetcher {
    fn fetch(
        &self,
        video_id: &str,
        dest_dir: &Path,
    ) -> impl Future<Output = Result<FetchOutcome>> + Send;
}

/// yt-dlp executable wrapper
#[derive(Debug, Clone)]
pub struct YtDlp {
    program: String,
    conf_args: Vec<String>,
}

impl YtDlp {
    /// Create a wrapper carrying the parsed yt-dlp.conf arguments
    ///
    /// The executable defaults to `yt-dlp` on PATH and can be overridden
    /// through the `YTDLP_BIN` environment variable.
    pub fn new(config: &ToolConfig) -> Self {
        let program = std::env::var("YTDLP_BIN").unwrap_or_else(|_| "yt-dlp".to_string());
        Self {
            program,
            conf_args: config.args.clone(),
        }
    }

    /// Build the watch URL for a content id
    ///
    /// Anything that already looks like a URL is passed through unchanged.
    pub fn url_for(target: &str) -> String {
        if target.contains("://") {
            target.to_string()
        } else {
            format!("https://www.youtube.com/watch?v={}", target)
        }
    }

    /// Run yt-dlp with the given arguments appended after the conf arguments
    ///
    /// Returns captured stdout plus the `WARNING:` lines harvested from
    /// stderr. The user's ambient yt-dlp configuration is suppressed so only
    /// the explicitly supplied conf file applies.
    async fn run(&self, extra_args: &[&str], url: &str) -> Result<(String, Vec<String>), YtDlpError> {
        let mut command = Command::new(&self.program);
        command.arg("--ignore-config");
        command.args(&self.conf_args);
        command.args(extra_args);
        command.arg(url);

        debug!(program = %self.program, url = %url, "Running yt-dlp");

        let output = command.output().await.map_err(|source| YtDlpError::Spawn {
            program: self.program.clone(),
            source,
        })?;

        let stderr = String::from_utf8_lossy(&output.stderr);
        let warnings: Vec<String> = stderr
            .lines()
            .filter(|line| line.trim_start().starts_with("WARNING:"))
            .map(|line| line.trim().to_string())
            .collect();

        if !output.status.success() {
            // Keep the tail of stderr: yt-dlp puts the decisive ERROR line last
            let mut lines: Vec<&str> = stderr.lines().rev().take(3).collect();
            lines.reverse();
            let tail = lines.join(" | ");
            return Err(YtDlpError::Failed {
                code: output.status.code().unwrap_or(-1),
                stderr: tail,
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        Ok((stdout, warnings))
    }
}

impl FormatSource for YtDlp {
    /// Probe the formats currently offered for a video, without downloading
    async fn probe(&self, video_id: &str) -> Result<ProbeOutcome> {
        let url = Self::url_for(video_id);
        let (stdout, warnings) = self
            .run(&["--no-download", "--no-progress", "-J"], &url)
            .await?;

        let document: ProbeDocument =
            serde_json::from_str(&stdout).map_err(YtDlpError::Parse)?;

        Ok(ProbeOutcome {
            warnings,
            title: document.title,
            formats: document.formats,
        })
    }
}

impl MediaFetcher for YtDlp {
    /// Fetch a fresh copy of a video into the destination directory
    async fn fetch(&self, video_id: &str, dest_dir: &Path) -> Result<FetchOutcome> {
        let url = Self::url_for(video_id);
        let dest = dest_dir.to_string_lossy();
        let (_stdout, warnings) = self.run(&["--no-progress", "-P", &dest], &url).await?;

        Ok(FetchOutcome { warnings })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_for_bare_id() {
        assert_eq!(
            YtDlp::url_for("dQw4w9WgXcQ"),
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ"
        );
    }

    #[test]
    fn test_url_for_full_url_passthrough() {
        let url = "https://www.youtube.com/watch?v=dQw4w9WgXcQ";
        assert_eq!(YtDlp::url_for(url), url);
    }

    #[test]
    fn test_probe_document_best_is_last() {
        let json = r#"{
            "title": "Example",
            "formats": [
                {"format_id": "140", "acodec": "mp4a.40.2", "abr": 129.5},
                {"format_id": "137", "vcodec": "avc1.640028", "tbr": 4400.0},
                {"format_id": "248", "vcodec": "vp9", "tbr": 2600.0, "vbr": 2600.0}
            ]
        }"#;
        let document: ProbeDocument = serde_json::from_str(json).unwrap();
        let outcome = ProbeOutcome {
            warnings: Vec::new(),
            title: document.title,
            formats: document.formats,
        };

        assert!(outcome.is_clean());
        let best = outcome.best().unwrap();
        assert_eq!(best.format_id, "248");
        assert_eq!(best.vbr, Some(2600.0));
    }

    #[test]
    fn test_probe_outcome_with_warnings_is_not_clean() {
        let outcome = ProbeOutcome {
            warnings: vec!["WARNING: Some formats may be missing".to_string()],
            title: None,
            formats: Vec::new(),
        };
        assert!(!outcome.is_clean());
    }
}
