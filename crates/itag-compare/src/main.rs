//! Compare archived downloads against the best currently offered remote
//! format and redownload the ones a selected strategy flags as stale.
//!
//! The run is strictly sequential: one item's resolution and replacement
//! completes before the next item begins. Per-item failures are reported
//! and skipped; only a missing archive folder aborts the run.

use anyhow::{Context, Result};
use clap::Parser;
use indexmap::IndexSet;
use shared::{ArchivePaths, ToolConfig, YtDlp};
use std::path::PathBuf;
use tracing::{debug, error, info, warn};

mod catalog;
mod decision;
mod rank;
mod records;
mod replace;
mod report;
mod resolver;

use catalog::BuiltinCatalog;
use decision::{decide, FormatSide, Strategy};
use rank::RankTable;
use replace::{ReplaceOutcome, ReplaceWorkflow};
use report::Report;

#[derive(Parser, Debug)]
#[command(version, about = "Compare archived downloads against the best live format and redownload stale items", long_about = None)]
struct Args {
    /// Directory containing downloaded videos and their .info.json files
    #[arg(short, long)]
    folder: PathBuf,

    /// Report file path for saving comparison results
    #[arg(short = 'l', long)]
    log: Option<PathBuf>,

    /// Write the report into the input folder automatically
    #[arg(long)]
    log_auto: bool,

    /// Run without making any changes to files
    #[arg(long)]
    dry_run: bool,

    /// yt-dlp configuration file path
    #[arg(long, default_value = "yt-dlp.conf")]
    config: PathBuf,

    /// Custom directory for storing backups of original files
    #[arg(long)]
    backup_dir: Option<PathBuf>,

    /// Show all comparison results, including matches
    #[arg(short, long)]
    verbose: bool,

    /// Redownload strategy
    #[arg(long, value_enum, default_value_t = Strategy::BetterFormat)]
    strategy: Strategy,

    /// Only process items whose local format id is in this list
    #[arg(long, num_args = 1.., value_name = "ITAG")]
    process_format: Option<Vec<String>>,

    /// Retry bound for remote resolution and redownload attempts
    #[arg(long, default_value_t = 5)]
    max_retries: u32,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    shared::logging::init_for_component("itag-compare", log_level)?;

    // The archive folder is the only fatal precondition
    let folder = args
        .folder
        .canonicalize()
        .with_context(|| format!("Archive folder not found: {}", args.folder.display()))?;
    anyhow::ensure!(
        folder.is_dir(),
        "Archive path is not a directory: {}",
        folder.display()
    );

    let config = ToolConfig::from_file(&args.config)?;
    let ytdlp = YtDlp::new(&config);
    let paths = ArchivePaths::new(&folder, args.backup_dir.clone());

    let report_path = if args.log_auto {
        Some(paths.auto_report_file())
    } else {
        args.log.clone()
    };
    let mut report = Report::create(report_path.as_deref())?;
    if let Some(path) = report.path() {
        info!(path = %path.display(), "Writing report");
    }

    let ranks = RankTable::build(&BuiltinCatalog);
    info!(
        folder = %folder.display(),
        strategy = %args.strategy,
        dry_run = args.dry_run,
        ranked_itags = ranks.len(),
        "Starting comparison run"
    );
    if ranks.is_empty() {
        warn!("Format catalog is empty, every comparison will be unresolvable");
    }

    let items = records::scan_folder(&folder)?;
    let workflow = ReplaceWorkflow::new(&ytdlp, &paths, args.max_retries);

    // First-seen-wins across duplicate sidecars, insertion order preserved
    let mut seen_ids: IndexSet<String> = IndexSet::new();
    let mut flagged = 0usize;
    let mut replaced = 0usize;
    let mut failed = 0usize;

    for item in &items {
        if !seen_ids.insert(item.video_id.clone()) {
            continue;
        }

        if let Some(allowed) = &args.process_format {
            if !allowed.contains(&item.itag) {
                debug!(
                    file = %item.source_file,
                    itag = %item.itag,
                    "Skipping, format not in filter list"
                );
                continue;
            }
        }

        let Some(best) = resolver::resolve_best(&ytdlp, &item.video_id, args.max_retries).await
        else {
            error!(
                video_id = %item.video_id,
                "Could not determine best format, skipping"
            );
            continue;
        };

        let local = FormatSide {
            itag: item.itag.clone(),
            rank: ranks.rank(&item.itag),
            vbr: item.vbr,
        };
        let remote = best.side(&ranks);
        let verdict = decide(args.strategy, &local, &remote);

        if args.verbose || verdict.class.is_notable() {
            let line = report::format_line(&item.source_file, &local, &remote, &verdict);
            report.line(&line)?;
        }

        if !verdict.redownload {
            continue;
        }
        flagged += 1;

        if args.dry_run {
            info!(video_id = %item.video_id, "Dry run, skipping redownload");
            continue;
        }

        // Per-item failures are absorbed here; the run continues
        match workflow.replace(&item.video_id).await {
            Ok(ReplaceOutcome::Committed { .. }) => replaced += 1,
            Ok(ReplaceOutcome::Failed { .. }) => failed += 1,
            Ok(ReplaceOutcome::NothingToBackUp) => {}
            Err(e) => {
                failed += 1;
                error!(
                    video_id = %item.video_id,
                    error = format!("{:#}", e),
                    "Replacement aborted"
                );
            }
        }
    }

    // An empty scratch directory is just litter; one with files left behind
    // signals an unresolved problem and is kept for inspection
    if !args.dry_run {
        let scratch = paths.scratch_dir();
        if scratch.exists() {
            let leftovers = std::fs::read_dir(&scratch)?.count();
            if leftovers == 0 {
                std::fs::remove_dir(&scratch)
                    .with_context(|| format!("Failed to remove {}", scratch.display()))?;
            } else {
                warn!(
                    path = %scratch.display(),
                    files = leftovers,
                    "Scratch directory not empty, keeping it"
                );
            }
        }
    }

    report.finish()?;
    if let Some(path) = report.path() {
        info!(path = %path.display(), "Report saved");
    }
    info!(
        items = seen_ids.len(),
        flagged, replaced, failed, "Process completed"
    );

    Ok(())
}
