//! Remote best-format resolution.
//!
//! One probe per attempt, bounded by the retry count. An attempt that
//! produced any warning is discarded wholesale: a warning means the listing
//! may be a partial or fallback response and must not drive a redownload
//! decision. There is deliberately no delay between attempts.

use crate::decision::FormatSide;
use crate::rank::RankTable;
use shared::FormatSource;
use tracing::{debug, error, warn};

/// Best format currently offered remotely
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteBest {
    pub itag: String,
    pub vbr: Option<f64>,
}

impl RemoteBest {
    /// Pair this result with its rank for the decision engine
    pub fn side(&self, ranks: &RankTable) -> FormatSide {
        FormatSide {
            itag: self.itag.clone(),
            rank: ranks.rank(&self.itag),
            vbr: self.vbr,
        }
    }
}

/// Resolve the best currently offered format for a content id
///
/// Returns `None` when no clean attempt succeeded within the bound; the
/// caller must skip the item, never redownload on unresolved remote state.
pub async fn resolve_best<S: FormatSource>(
    source: &S,
    video_id: &str,
    max_retries: u32,
) -> Option<RemoteBest> {
    for attempt in 1..=max_retries {
        match source.probe(video_id).await {
            Ok(probe) => {
                if !probe.is_clean() {
                    warn!(
                        video_id,
                        attempt,
                        warnings = probe.warnings.len(),
                        "Probe emitted warnings, discarding attempt"
                    );
                    for warning in &probe.warnings {
                        debug!(video_id, "{}", warning);
                    }
                    continue;
                }

                match probe.best() {
                    Some(best) => {
                        debug!(
                            video_id,
                            attempt,
                            itag = %best.format_id,
                            "Resolved best remote format"
                        );
                        return Some(RemoteBest {
                            itag: best.format_id.clone(),
                            vbr: best.vbr,
                        });
                    }
                    None => {
                        warn!(video_id, attempt, "Probe returned no formats, retrying");
                        continue;
                    }
                }
            }
            Err(e) => {
                warn!(video_id, attempt, error = %e, "Probe failed, retrying");
                continue;
            }
        }
    }

    error!(
        video_id,
        max_retries, "Failed to get a clean format listing within the retry bound"
    );
    None
}
