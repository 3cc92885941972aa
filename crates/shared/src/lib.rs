//! Shared library for the itagsync tools.
//!
//! This crate provides common functionality used across the binary crates:
//! - yt-dlp configuration file parsing
//! - yt-dlp subprocess invocation (probe and fetch)
//! - Archive path utilities (backup and scratch directories)
//! - Logging infrastructure

pub mod config;
pub mod logging;
pub mod paths;
pub mod ytdlp;

// Re-export commonly used types
pub use config::ToolConfig;
pub use logging::LogConfig;
pub use paths::ArchivePaths;
pub use ytdlp::{FetchOutcome, FormatSource, MediaFetcher, ProbeOutcome, RemoteFormat, YtDlp};

/// Common result type using anyhow::Error
pub type Result<T> = anyhow::Result<T>;
