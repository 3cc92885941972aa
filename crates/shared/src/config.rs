//! yt-dlp configuration file handling.
//!
//! The remote tool is configured through a standard `yt-dlp.conf`:
//! newline-delimited shell-style argument tokens, with blank lines and
//! `#`-prefixed comment lines ignored. The parsed argument list is passed
//! through verbatim to every yt-dlp invocation.

use anyhow::{Context, Result};
use std::path::Path;

/// Parsed yt-dlp configuration
#[derive(Debug, Clone, Default)]
pub struct ToolConfig {
    /// Argument tokens passed through to yt-dlp
    pub args: Vec<String>,
}

impl ToolConfig {
    /// Load configuration from a yt-dlp.conf style file
    ///
    /// If the file doesn't exist, returns an empty argument list so that
    /// yt-dlp runs with its own defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            tracing::warn!(
                path = %path.display(),
                "yt-dlp config file not found, running with no extra arguments"
            );
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::parse(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Parse configuration from file content
    pub fn parse(content: &str) -> Result<Self> {
        let mut args = Vec::new();

        for (lineno, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let tokens = shlex::split(line).with_context(|| {
                format!("Unbalanced quoting on config line {}: {}", lineno + 1, line)
            })?;
            args.extend(tokens);
        }

        Ok(Self { args })
    }
}
