//! Redownload decision engine.
//!
//! A pure function from the local/remote comparison to a verdict. The
//! status label is advisory text for the report; the boolean is the
//! authoritative outcome. Lower rank number means more preferred, and the
//! remote side is better only when its rank is strictly lower.

use clap::ValueEnum;
use std::fmt;

/// Selectable redownload strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Strategy {
    /// Redownload if the live format is better
    #[value(name = "better_format")]
    BetterFormat,
    /// Like better_format, but also checks VBR when the formats match
    #[value(name = "better_format_vbr")]
    BetterFormatVbr,
    /// Like better_format, but redownloads if VBR differs in either direction
    #[value(name = "better_format_vbr_diff")]
    BetterFormatVbrDiff,
    /// Redownload if the format doesn't match the live format
    #[value(name = "mismatch")]
    Mismatch,
    /// Like mismatch, but when formats match, redownloads if VBR differs
    #[value(name = "mismatch_vbr_diff")]
    MismatchVbrDiff,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::BetterFormat => write!(f, "better_format"),
            Strategy::BetterFormatVbr => write!(f, "better_format_vbr"),
            Strategy::BetterFormatVbrDiff => write!(f, "better_format_vbr_diff"),
            Strategy::Mismatch => write!(f, "mismatch"),
            Strategy::MismatchVbrDiff => write!(f, "mismatch_vbr_diff"),
        }
    }
}

/// One side of the comparison: an itag with its resolved rank and bitrate
#[derive(Debug, Clone)]
pub struct FormatSide {
    pub itag: String,
    /// `None` when the itag is absent from the rank table
    pub rank: Option<u32>,
    /// `None` when the sidecar or probe carried no bitrate
    pub vbr: Option<f64>,
}

/// Classification of a verdict, used for report filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    Better,
    Worse,
    Match,
    Mismatch,
    VbrDiff,
    Unknown,
}

impl StatusClass {
    /// Notable statuses are reported even without --verbose; plain matches
    /// and worse-than-local results are suppressed
    pub fn is_notable(&self) -> bool {
        !matches!(self, StatusClass::Match | StatusClass::Worse)
    }
}

/// Outcome of the decision engine
#[derive(Debug, Clone)]
pub struct Verdict {
    pub class: StatusClass,
    pub label: String,
    pub redownload: bool,
}

impl Verdict {
    fn new(class: StatusClass, label: impl Into<String>, redownload: bool) -> Self {
        Self {
            class,
            label: label.into(),
            redownload,
        }
    }
}

/// Decide whether the local copy should be replaced with the remote best
///
/// Unresolvable ranks short-circuit every strategy: without both ranks the
/// comparison cannot be trusted, so the verdict is unknown and nothing is
/// redownloaded. The same applies to a missing bitrate where a strategy
/// needs one.
pub fn decide(strategy: Strategy, local: &FormatSide, remote: &FormatSide) -> Verdict {
    let (Some(local_rank), Some(remote_rank)) = (local.rank, remote.rank) else {
        return Verdict::new(StatusClass::Unknown, "UNKNOWN_RANK", false);
    };

    match strategy {
        Strategy::BetterFormat | Strategy::BetterFormatVbr | Strategy::BetterFormatVbrDiff => {
            if remote_rank < local_rank {
                return Verdict::new(
                    StatusClass::Better,
                    format!("BETTER_FORMAT ({} -> {})", local.itag, remote.itag),
                    true,
                );
            }
            if remote_rank > local_rank {
                return Verdict::new(StatusClass::Worse, "WORSE_FORMAT", false);
            }

            match strategy {
                Strategy::BetterFormatVbr => match (local.vbr, remote.vbr) {
                    (Some(local_vbr), Some(remote_vbr)) if remote_vbr > local_vbr => Verdict::new(
                        StatusClass::VbrDiff,
                        format!("BETTER_VBR ({}kbps -> {}kbps)", local_vbr, remote_vbr),
                        true,
                    ),
                    (Some(_), Some(_)) => Verdict::new(StatusClass::Match, "MATCH", false),
                    _ => Verdict::new(StatusClass::Unknown, "UNKNOWN_VBR", false),
                },
                Strategy::BetterFormatVbrDiff => match (local.vbr, remote.vbr) {
                    (Some(local_vbr), Some(remote_vbr)) if remote_vbr != local_vbr => Verdict::new(
                        StatusClass::VbrDiff,
                        format!("DIFFERENT_VBR ({}kbps vs {}kbps)", local_vbr, remote_vbr),
                        true,
                    ),
                    (Some(_), Some(_)) => Verdict::new(StatusClass::Match, "MATCH", false),
                    _ => Verdict::new(StatusClass::Unknown, "UNKNOWN_VBR", false),
                },
                _ => Verdict::new(StatusClass::Match, "MATCH", false),
            }
        }

        Strategy::Mismatch => {
            if local.itag != remote.itag {
                Verdict::new(
                    StatusClass::Mismatch,
                    format!("FORMAT_MISMATCH ({} vs {})", local.itag, remote.itag),
                    true,
                )
            } else {
                Verdict::new(StatusClass::Match, "MATCH", false)
            }
        }

        Strategy::MismatchVbrDiff => {
            if local.itag != remote.itag {
                return Verdict::new(
                    StatusClass::Mismatch,
                    format!("FORMAT_MISMATCH ({} vs {})", local.itag, remote.itag),
                    true,
                );
            }
            match (local.vbr, remote.vbr) {
                (Some(local_vbr), Some(remote_vbr)) if remote_vbr != local_vbr => Verdict::new(
                    StatusClass::VbrDiff,
                    format!("VBR_MISMATCH ({}kbps vs {}kbps)", local_vbr, remote_vbr),
                    true,
                ),
                (Some(_), Some(_)) => Verdict::new(StatusClass::Match, "MATCH", false),
                _ => Verdict::new(StatusClass::Unknown, "UNKNOWN_VBR", false),
            }
        }
    }
}
