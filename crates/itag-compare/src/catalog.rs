//! Known-format catalog and comparator.
//!
//! The rank table is derived from a static catalog of known itag
//! descriptors, mirroring the upstream youtube format table, with a
//! comparator that reproduces the downloader's native sort: ascending from
//! worst to best. The catalog sits behind a narrow trait so the rank
//! builder can be exercised against a small synthetic catalog in tests.

use once_cell::sync::Lazy;
use std::cmp::Ordering;

/// One known encoding variant
#[derive(Debug, Clone)]
pub struct FormatDescriptor {
    /// Encoding identifier (itag)
    pub itag: String,
    /// Container extension
    pub ext: String,
    /// Vertical resolution, absent for audio-only variants
    pub height: Option<u32>,
    /// Frame rate, absent where the default 30 applies or for audio-only
    pub fps: Option<f64>,
    /// Video codec, absent for audio-only variants
    pub vcodec: Option<String>,
    /// Audio codec, absent for video-only variants
    pub acodec: Option<String>,
    /// Audio bitrate in kbps
    pub abr: Option<f64>,
    /// Total bitrate in kbps
    pub tbr: Option<f64>,
    /// Free-form note (DASH family, 3D, HLS, ...)
    pub note: Option<String>,
    /// Source location; catalog entries have none and receive a synthetic
    /// placeholder before ranking
    pub url: Option<String>,
}

impl FormatDescriptor {
    fn new(itag: &str, ext: &str) -> Self {
        Self {
            itag: itag.to_string(),
            ext: ext.to_string(),
            height: None,
            fps: None,
            vcodec: None,
            acodec: None,
            abr: None,
            tbr: None,
            note: None,
            url: None,
        }
    }

    /// Progressive variant carrying both video and audio
    pub fn progressive(itag: &str, ext: &str, height: u32, vcodec: &str, acodec: &str, abr: f64) -> Self {
        let mut fmt = Self::new(itag, ext);
        fmt.height = Some(height);
        fmt.vcodec = Some(vcodec.to_string());
        fmt.acodec = Some(acodec.to_string());
        fmt.abr = Some(abr);
        fmt
    }

    /// Video-only variant (DASH video)
    pub fn video_only(itag: &str, ext: &str, height: u32, vcodec: &str) -> Self {
        let mut fmt = Self::new(itag, ext);
        fmt.height = Some(height);
        fmt.vcodec = Some(vcodec.to_string());
        fmt.acodec = Some("none".to_string());
        fmt
    }

    /// Audio-only variant (DASH audio)
    pub fn audio_only(itag: &str, ext: &str, acodec: &str, abr: f64) -> Self {
        let mut fmt = Self::new(itag, ext);
        fmt.vcodec = Some("none".to_string());
        fmt.acodec = Some(acodec.to_string());
        fmt.abr = Some(abr);
        fmt
    }

    /// Set the frame rate
    pub fn fps(mut self, fps: f64) -> Self {
        self.fps = Some(fps);
        self
    }

    /// Set the free-form note
    pub fn note(mut self, note: &str) -> Self {
        self.note = Some(note.to_string());
        self
    }

    /// Whether this variant carries a video track
    pub fn has_video(&self) -> bool {
        !matches!(self.vcodec.as_deref(), None | Some("none"))
    }
}

/// Narrow catalog interface: list known descriptors, compare two of them
///
/// `compare` orders ascending from worst to best, matching the external
/// tool's native format listing order.
pub trait FormatCatalog {
    fn descriptors(&self) -> Vec<FormatDescriptor>;
    fn compare(&self, a: &FormatDescriptor, b: &FormatDescriptor) -> Ordering;
}

/// Codec preference for video tracks, higher is better
fn vcodec_preference(vcodec: Option<&str>) -> u8 {
    match vcodec {
        Some(codec) if codec.starts_with("av01") => 7,
        Some(codec) if codec.starts_with("vp9") || codec.starts_with("vp09") => 6,
        Some(codec) if codec.starts_with("hev") || codec.starts_with("h265") => 5,
        Some(codec) if codec.starts_with("avc") || codec.starts_with("h264") => 4,
        Some(codec) if codec.starts_with("vp8") || codec.starts_with("vp08") => 3,
        Some(codec) if codec.starts_with("h263") || codec.starts_with("mp4v") => 2,
        Some(codec) if codec.starts_with("theora") => 1,
        _ => 0,
    }
}

/// Codec preference for audio tracks, higher is better
fn acodec_preference(acodec: Option<&str>) -> u8 {
    match acodec {
        Some(codec) if codec.starts_with("opus") => 4,
        Some(codec) if codec.starts_with("mp4a") || codec.starts_with("aac") => 3,
        Some(codec) if codec.starts_with("vorbis") => 2,
        Some(codec) if codec.starts_with("mp3") => 1,
        _ => 0,
    }
}

/// Bitrates are compared in integer millikbps to keep the key totally ordered
fn milli(rate: Option<f64>) -> u64 {
    rate.map(|r| (r * 1000.0) as u64).unwrap_or(0)
}

/// Sort key for the native worst-to-best order
///
/// Precedence: video-ness, height, frame rate, video codec, total bitrate,
/// audio codec, audio bitrate. The itag itself is the final tie-break so
/// the order is total and deterministic. The source url never participates.
fn sort_key(fmt: &FormatDescriptor) -> (bool, u32, u32, u8, u64, u8, u64, String) {
    (
        fmt.has_video(),
        fmt.height.unwrap_or(0),
        fmt.fps.unwrap_or(0.0) as u32,
        vcodec_preference(fmt.vcodec.as_deref()),
        milli(fmt.tbr),
        acodec_preference(fmt.acodec.as_deref()),
        milli(fmt.abr),
        fmt.itag.clone(),
    )
}

/// The built-in catalog of known itags
///
/// A representative subset of the upstream table: progressive, HLS and the
/// DASH mp4/webm video and audio families.
#[derive(Debug, Default, Clone, Copy)]
pub struct BuiltinCatalog;

impl FormatCatalog for BuiltinCatalog {
    fn descriptors(&self) -> Vec<FormatDescriptor> {
        KNOWN_FORMATS.clone()
    }

    fn compare(&self, a: &FormatDescriptor, b: &FormatDescriptor) -> Ordering {
        sort_key(a).cmp(&sort_key(b))
    }
}

static KNOWN_FORMATS: Lazy<Vec<FormatDescriptor>> = Lazy::new(|| {
    use FormatDescriptor as F;
    vec![
        // Progressive
        F::progressive("5", "flv", 240, "h263", "mp3", 64.0),
        F::progressive("6", "flv", 270, "h263", "mp3", 64.0),
        F::progressive("17", "3gp", 144, "mp4v", "aac", 24.0),
        F::progressive("18", "mp4", 360, "h264", "aac", 96.0),
        F::progressive("22", "mp4", 720, "h264", "aac", 192.0),
        F::progressive("34", "flv", 360, "h264", "aac", 128.0),
        F::progressive("35", "flv", 480, "h264", "aac", 128.0),
        F::progressive("36", "3gp", 240, "mp4v", "aac", 32.0),
        F::progressive("37", "mp4", 1080, "h264", "aac", 192.0),
        F::progressive("38", "mp4", 3072, "h264", "aac", 192.0),
        F::progressive("43", "webm", 360, "vp8", "vorbis", 128.0),
        F::progressive("44", "webm", 480, "vp8", "vorbis", 128.0),
        F::progressive("45", "webm", 720, "vp8", "vorbis", 192.0),
        F::progressive("46", "webm", 1080, "vp8", "vorbis", 192.0),
        // HLS
        F::progressive("91", "mp4", 144, "h264", "aac", 48.0).note("HLS"),
        F::progressive("92", "mp4", 240, "h264", "aac", 48.0).note("HLS"),
        F::progressive("93", "mp4", 360, "h264", "aac", 128.0).note("HLS"),
        F::progressive("94", "mp4", 480, "h264", "aac", 128.0).note("HLS"),
        F::progressive("95", "mp4", 720, "h264", "aac", 256.0).note("HLS"),
        F::progressive("96", "mp4", 1080, "h264", "aac", 256.0).note("HLS"),
        // DASH mp4 video
        F::video_only("133", "mp4", 240, "h264").note("DASH video"),
        F::video_only("134", "mp4", 360, "h264").note("DASH video"),
        F::video_only("135", "mp4", 480, "h264").note("DASH video"),
        F::video_only("136", "mp4", 720, "h264").note("DASH video"),
        F::video_only("137", "mp4", 1080, "h264").note("DASH video"),
        F::video_only("138", "mp4", 2160, "h264").note("DASH video"),
        F::video_only("160", "mp4", 144, "h264").note("DASH video"),
        F::video_only("212", "mp4", 480, "h264").note("DASH video"),
        F::video_only("264", "mp4", 1440, "h264").note("DASH video"),
        F::video_only("266", "mp4", 2160, "h264").note("DASH video"),
        F::video_only("298", "mp4", 720, "h264").fps(60.0).note("DASH video"),
        F::video_only("299", "mp4", 1080, "h264").fps(60.0).note("DASH video"),
        // DASH mp4 audio
        F::audio_only("139", "m4a", "aac", 48.0).note("DASH audio"),
        F::audio_only("140", "m4a", "aac", 128.0).note("DASH audio"),
        F::audio_only("141", "m4a", "aac", 256.0).note("DASH audio"),
        // DASH webm video
        F::video_only("167", "webm", 360, "vp8").note("DASH video"),
        F::video_only("168", "webm", 480, "vp8").note("DASH video"),
        F::video_only("169", "webm", 720, "vp8").note("DASH video"),
        F::video_only("170", "webm", 1080, "vp8").note("DASH video"),
        F::video_only("218", "webm", 480, "vp8").note("DASH video"),
        F::video_only("219", "webm", 480, "vp8").note("DASH video"),
        F::video_only("278", "webm", 144, "vp9").note("DASH video"),
        F::video_only("242", "webm", 240, "vp9").note("DASH video"),
        F::video_only("243", "webm", 360, "vp9").note("DASH video"),
        F::video_only("244", "webm", 480, "vp9").note("DASH video"),
        F::video_only("247", "webm", 720, "vp9").note("DASH video"),
        F::video_only("248", "webm", 1080, "vp9").note("DASH video"),
        F::video_only("271", "webm", 1440, "vp9").note("DASH video"),
        F::video_only("272", "webm", 2160, "vp9").note("DASH video"),
        F::video_only("302", "webm", 720, "vp9").fps(60.0).note("DASH video"),
        F::video_only("303", "webm", 1080, "vp9").fps(60.0).note("DASH video"),
        F::video_only("308", "webm", 1440, "vp9").fps(60.0).note("DASH video"),
        F::video_only("313", "webm", 2160, "vp9").note("DASH video"),
        F::video_only("315", "webm", 2160, "vp9").fps(60.0).note("DASH video"),
        // DASH webm audio
        F::audio_only("171", "webm", "vorbis", 128.0).note("DASH audio"),
        F::audio_only("172", "webm", "vorbis", 256.0).note("DASH audio"),
        F::audio_only("249", "webm", "opus", 50.0).note("DASH audio"),
        F::audio_only("250", "webm", "opus", 70.0).note("DASH audio"),
        F::audio_only("251", "webm", "opus", 160.0).note("DASH audio"),
    ]
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_itags_are_unique() {
        let catalog = BuiltinCatalog;
        let mut itags: Vec<String> = catalog
            .descriptors()
            .into_iter()
            .map(|f| f.itag)
            .collect();
        let total = itags.len();
        itags.sort();
        itags.dedup();
        assert_eq!(itags.len(), total);
    }

    #[test]
    fn test_video_beats_audio_only() {
        let catalog = BuiltinCatalog;
        let video = FormatDescriptor::video_only("160", "mp4", 144, "h264");
        let audio = FormatDescriptor::audio_only("251", "webm", "opus", 160.0);
        // Ascending order is worst-to-best
        assert_eq!(catalog.compare(&audio, &video), Ordering::Less);
    }

    #[test]
    fn test_height_dominates_codec() {
        let catalog = BuiltinCatalog;
        let hd_h264 = FormatDescriptor::video_only("137", "mp4", 1080, "h264");
        let sd_vp9 = FormatDescriptor::video_only("243", "webm", 360, "vp9");
        assert_eq!(catalog.compare(&sd_vp9, &hd_h264), Ordering::Less);
    }

    #[test]
    fn test_codec_breaks_height_ties() {
        let catalog = BuiltinCatalog;
        let h264 = FormatDescriptor::video_only("137", "mp4", 1080, "h264");
        let vp9 = FormatDescriptor::video_only("248", "webm", 1080, "vp9");
        assert_eq!(catalog.compare(&h264, &vp9), Ordering::Less);
    }

    #[test]
    fn test_fps_beats_equal_height() {
        let catalog = BuiltinCatalog;
        let fps30 = FormatDescriptor::video_only("248", "webm", 1080, "vp9");
        let fps60 = FormatDescriptor::video_only("303", "webm", 1080, "vp9").fps(60.0);
        assert_eq!(catalog.compare(&fps30, &fps60), Ordering::Less);
    }

    #[test]
    fn test_compare_ignores_url() {
        let catalog = BuiltinCatalog;
        let mut a = FormatDescriptor::video_only("137", "mp4", 1080, "h264");
        let b = a.clone();
        a.url = Some("https://dummy/137".to_string());
        assert_eq!(catalog.compare(&a, &b), Ordering::Equal);
    }
}
