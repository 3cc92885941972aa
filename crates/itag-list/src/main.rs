//! List the formats currently offered for one video.
//!
//! yt-dlp lists formats worst-to-best, so with `--best` only the
//! bottommost entry is printed.

use anyhow::Result;
use clap::Parser;
use shared::{FormatSource, RemoteFormat, ToolConfig, YtDlp};
use std::path::PathBuf;
use tracing::warn;

#[derive(Parser, Debug)]
#[command(version, about = "List the format ids currently offered for a video", long_about = None)]
struct Args {
    /// Video URL or bare content id
    target: String,

    /// Only show the best (bottommost) format
    #[arg(long)]
    best: bool,

    /// yt-dlp configuration file path
    #[arg(long, default_value = "yt-dlp.conf")]
    config: PathBuf,
}

fn describe(fmt: &RemoteFormat) -> String {
    fn opt<T: std::fmt::Display>(value: &Option<T>) -> String {
        value
            .as_ref()
            .map(|v| v.to_string())
            .unwrap_or_else(|| "-".to_string())
    }

    format!(
        "itag: {}, ext: {}, resolution: {}, fps: {}, vcodec: {}, acodec: {}, abr: {}, tbr: {}, note: {}",
        fmt.format_id,
        opt(&fmt.ext),
        opt(&fmt.resolution),
        opt(&fmt.fps),
        opt(&fmt.vcodec),
        opt(&fmt.acodec),
        opt(&fmt.abr),
        opt(&fmt.tbr),
        opt(&fmt.format_note),
    )
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    shared::logging::init_for_component("itag-list", tracing::Level::INFO)?;

    let config = ToolConfig::from_file(&args.config)?;
    let ytdlp = YtDlp::new(&config);

    let probe = ytdlp.probe(&args.target).await?;
    for warning in &probe.warnings {
        warn!("{}", warning);
    }

    let title = probe.title.clone().unwrap_or_else(|| args.target.clone());
    if args.best {
        match probe.best() {
            Some(best) => {
                println!("Best format for: {}\n", title);
                println!("{}", describe(best));
            }
            None => anyhow::bail!("No formats offered for {}", args.target),
        }
    } else {
        println!("Available formats for: {}\n", title);
        for fmt in &probe.formats {
            println!("{}", describe(fmt));
        }
    }

    Ok(())
}
