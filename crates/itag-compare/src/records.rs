//! Local archive record reading.
//!
//! Each archived item carries a `.info.json` sidecar written at download
//! time. Only three fields matter here: the content id, the recorded
//! format id (a composite like `137+140` is split on `+` and only the video
//! component is used), and the nullable VBR.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, warn};

/// Sidecar fields consumed from a `.info.json` document
#[derive(Debug, Deserialize)]
struct Sidecar {
    #[serde(rename = "_type", default)]
    doc_type: Option<String>,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    format_id: Option<String>,
    #[serde(default)]
    vbr: Option<f64>,
}

/// One archived item as recorded by its sidecar
#[derive(Debug, Clone)]
pub struct ArchivedItem {
    /// Sidecar filename, used verbatim in report lines
    pub source_file: String,
    /// Content id all files of this item share
    pub video_id: String,
    /// Local encoding identifier (first component of the format id)
    pub itag: String,
    /// Recorded bitrate, when the sidecar carried one
    pub vbr: Option<f64>,
}

/// Parse one sidecar file
///
/// Returns `Ok(None)` for documents that are not single videos or that lack
/// the id/format fields; those are skipped silently like the playlist and
/// channel sidecars yt-dlp also writes.
pub fn read_sidecar(path: &Path) -> Result<Option<ArchivedItem>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read sidecar: {}", path.display()))?;
    let sidecar: Sidecar = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse sidecar: {}", path.display()))?;

    if sidecar.doc_type.as_deref() != Some("video") {
        return Ok(None);
    }

    let (Some(video_id), Some(format_id)) = (sidecar.id, sidecar.format_id) else {
        return Ok(None);
    };

    let itag = format_id
        .split('+')
        .next()
        .unwrap_or(format_id.as_str())
        .to_string();

    let source_file = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    Ok(Some(ArchivedItem {
        source_file,
        video_id,
        itag,
        vbr: sidecar.vbr,
    }))
}

/// Scan an archive folder for sidecar records
///
/// Direct children only, in sorted filename order so runs are
/// deterministic. Unparsable sidecars are logged and skipped; they never
/// abort the scan.
pub fn scan_folder(folder: &Path) -> Result<Vec<ArchivedItem>> {
    let entries = std::fs::read_dir(folder)
        .with_context(|| format!("Failed to read archive folder: {}", folder.display()))?;

    let mut sidecars: Vec<_> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path
                    .file_name()
                    .map(|name| name.to_string_lossy().ends_with(".info.json"))
                    .unwrap_or(false)
        })
        .collect();
    sidecars.sort();

    let mut items = Vec::new();
    for path in sidecars {
        match read_sidecar(&path) {
            Ok(Some(item)) => items.push(item),
            Ok(None) => debug!(path = %path.display(), "Skipping non-video sidecar"),
            Err(e) => warn!(path = %path.display(), error = %e, "Skipping unreadable sidecar"),
        }
    }

    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_sidecar(dir: &Path, name: &str, content: &str) {
        std::fs::write(dir.join(name), content).unwrap();
    }

    #[test]
    fn test_read_sidecar_splits_composite_format_id() -> Result<()> {
        let temp_dir = TempDir::new()?;
        write_sidecar(
            temp_dir.path(),
            "clip [abc12345678].info.json",
            r#"{"_type": "video", "id": "abc12345678", "format_id": "137+140", "vbr": 128.0}"#,
        );

        let item = read_sidecar(&temp_dir.path().join("clip [abc12345678].info.json"))?
            .expect("video sidecar");
        assert_eq!(item.video_id, "abc12345678");
        assert_eq!(item.itag, "137");
        assert_eq!(item.vbr, Some(128.0));
        assert_eq!(item.source_file, "clip [abc12345678].info.json");
        Ok(())
    }

    #[test]
    fn test_read_sidecar_skips_non_video_documents() -> Result<()> {
        let temp_dir = TempDir::new()?;
        write_sidecar(
            temp_dir.path(),
            "playlist.info.json",
            r#"{"_type": "playlist", "id": "PL123", "entries": []}"#,
        );

        assert!(read_sidecar(&temp_dir.path().join("playlist.info.json"))?.is_none());
        Ok(())
    }

    #[test]
    fn test_read_sidecar_requires_id_and_format() -> Result<()> {
        let temp_dir = TempDir::new()?;
        write_sidecar(
            temp_dir.path(),
            "partial.info.json",
            r#"{"_type": "video", "id": "abc12345678"}"#,
        );

        assert!(read_sidecar(&temp_dir.path().join("partial.info.json"))?.is_none());
        Ok(())
    }

    #[test]
    fn test_scan_folder_sorted_and_tolerant() -> Result<()> {
        let temp_dir = TempDir::new()?;
        write_sidecar(
            temp_dir.path(),
            "b [bbbbbbbbbbb].info.json",
            r#"{"_type": "video", "id": "bbbbbbbbbbb", "format_id": "248", "vbr": null}"#,
        );
        write_sidecar(
            temp_dir.path(),
            "a [aaaaaaaaaaa].info.json",
            r#"{"_type": "video", "id": "aaaaaaaaaaa", "format_id": "137+140", "vbr": 96.5}"#,
        );
        write_sidecar(temp_dir.path(), "broken.info.json", "{not json");
        std::fs::write(temp_dir.path().join("video [aaaaaaaaaaa].mkv"), b"x")?;

        let items = scan_folder(temp_dir.path())?;
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].video_id, "aaaaaaaaaaa");
        assert_eq!(items[0].vbr, Some(96.5));
        assert_eq!(items[1].video_id, "bbbbbbbbbbb");
        assert_eq!(items[1].vbr, None);
        Ok(())
    }
}
