//! HLS playlist handling
//!
//! - Signature check used by the verifier
//! - Master playlist -> level list
//! - Media playlist -> duration

mod verify;

pub use verify::ManifestVerifier;

use crate::{error::Error, types::Resolution, Result};
use m3u8_rs::{MasterPlaylist, MediaPlaylist, Playlist};
use serde::{Deserialize, Serialize};
use url::Url;

/// First tag of every HLS playlist
pub const HLS_SIGNATURE: &str = "#EXTM3U";

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// True when the first significant content of `body` is `#EXTM3U`.
///
/// A leading byte-order mark and whitespace are skipped.
pub fn has_hls_signature(body: &[u8]) -> bool {
    let body = body.strip_prefix(UTF8_BOM).unwrap_or(body);
    let start = body
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(body.len());
    body[start..].starts_with(HLS_SIGNATURE.as_bytes())
}

/// A rendition as announced by a master playlist
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelInfo {
    /// Bandwidth in bits per second
    pub bandwidth: u64,
    pub resolution: Option<Resolution>,
    pub codecs: Option<String>,
    pub frame_rate: Option<f64>,
    /// Media playlist for this rendition
    pub uri: Url,
}

/// Result of parsing an entry-point playlist
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedPlaylist {
    /// Multivariant playlist, levels sorted by bandwidth
    Master(Vec<LevelInfo>),
    /// Single-rendition media playlist
    Media(MediaSummary),
}

/// What the player needs from a media playlist
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MediaSummary {
    /// Sum of segment durations in seconds
    pub duration: f64,
    pub segment_count: usize,
    pub is_live: bool,
}

/// Parse an entry-point playlist fetched from `base_url`
pub fn parse_playlist(body: &[u8], base_url: &Url) -> Result<ParsedPlaylist> {
    match m3u8_rs::parse_playlist_res(body) {
        Ok(Playlist::MasterPlaylist(master)) => Ok(ParsedPlaylist::Master(extract_levels(&master, base_url)?)),
        Ok(Playlist::MediaPlaylist(media)) => Ok(ParsedPlaylist::Media(summarize_media(&media))),
        Err(e) => Err(Error::ManifestParse(format!("Failed to parse HLS playlist: {:?}", e))),
    }
}

/// Parse a variant playlist and summarise it
pub fn parse_media_playlist(body: &[u8]) -> Result<MediaSummary> {
    let media = m3u8_rs::parse_media_playlist_res(body)
        .map_err(|e| Error::ManifestParse(format!("Failed to parse HLS media: {:?}", e)))?;
    Ok(summarize_media(&media))
}

/// Extract levels from master playlist, I-frame variants excluded
fn extract_levels(master: &MasterPlaylist, base_url: &Url) -> Result<Vec<LevelInfo>> {
    let mut levels = Vec::with_capacity(master.variants.len());

    for variant in master.variants.iter().filter(|v| !v.is_i_frame) {
        let uri = resolve_uri(base_url, &variant.uri)?;

        let resolution = variant
            .resolution
            .map(|r| Resolution::new(r.width as u32, r.height as u32));

        levels.push(LevelInfo {
            bandwidth: variant.bandwidth,
            resolution,
            codecs: variant.codecs.clone(),
            frame_rate: variant.frame_rate,
            uri,
        });
    }

    if levels.is_empty() {
        return Err(Error::InvalidManifest("no level found in manifest".into()));
    }

    levels.sort_by_key(|l| l.bandwidth);

    Ok(levels)
}

fn summarize_media(media: &MediaPlaylist) -> MediaSummary {
    MediaSummary {
        duration: media.segments.iter().map(|s| f64::from(s.duration)).sum(),
        segment_count: media.segments.len(),
        is_live: !media.end_list,
    }
}

/// Resolve relative URI against base URL
fn resolve_uri(base: &Url, relative: &str) -> Result<Url> {
    base.join(relative)
        .map_err(|e| Error::InvalidManifest(format!("Invalid URI '{}': {}", relative, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const MASTER: &str = "#EXTM3U
#EXT-X-VERSION:3
#EXT-X-STREAM-INF:BANDWIDTH=5000000,RESOLUTION=1920x1080,CODECS=\"avc1.640028,mp4a.40.2\"
1080p/index.m3u8
#EXT-X-STREAM-INF:BANDWIDTH=800000,RESOLUTION=640x360
360p/index.m3u8
#EXT-X-STREAM-INF:BANDWIDTH=2800000,RESOLUTION=1280x720
720p/index.m3u8
";

    const MEDIA: &str = "#EXTM3U
#EXT-X-VERSION:3
#EXT-X-TARGETDURATION:6
#EXTINF:6.0,
seg0.ts
#EXTINF:6.0,
seg1.ts
#EXTINF:3.5,
seg2.ts
#EXT-X-ENDLIST
";

    fn base() -> Url {
        Url::parse("https://example.com/api/videos/stream/abc/master.m3u8").unwrap()
    }

    #[test]
    fn test_signature() {
        assert!(has_hls_signature(b"#EXTM3U\n#EXT-X-VERSION:3"));
        assert!(has_hls_signature(b"\xEF\xBB\xBF\r\n  #EXTM3U\n"));
        assert!(!has_hls_signature(b"<html>#EXTM3U</html>"));
        assert!(!has_hls_signature(b"{\"error\":\"not found\"}"));
        assert!(!has_hls_signature(b""));
    }

    #[test]
    fn test_master_levels_sorted() {
        let parsed = parse_playlist(MASTER.as_bytes(), &base()).unwrap();
        let ParsedPlaylist::Master(levels) = parsed else {
            panic!("expected master playlist");
        };
        let heights: Vec<_> = levels.iter().map(|l| l.resolution.unwrap().height).collect();
        assert_eq!(heights, vec![360, 720, 1080]);
        assert_eq!(
            levels[0].uri.as_str(),
            "https://example.com/api/videos/stream/abc/360p/index.m3u8"
        );
        assert_eq!(levels[2].codecs.as_deref(), Some("avc1.640028,mp4a.40.2"));
    }

    #[test]
    fn test_media_duration() {
        let summary = parse_media_playlist(MEDIA.as_bytes()).unwrap();
        assert_eq!(summary.segment_count, 3);
        assert!((summary.duration - 15.5).abs() < 1e-6);
        assert!(!summary.is_live);
    }

    #[test]
    fn test_media_as_entry_point() {
        let parsed = parse_playlist(MEDIA.as_bytes(), &base()).unwrap();
        assert!(matches!(parsed, ParsedPlaylist::Media(s) if s.segment_count == 3));
    }

    #[test]
    fn test_garbage_is_parse_error() {
        let err = parse_playlist(b"not a playlist", &base()).unwrap_err();
        assert_eq!(err.error_code(), "MANIFEST_PARSE");
    }
}
