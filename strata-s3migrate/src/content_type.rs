//! Content types for uploaded assets.

use std::path::Path;

/// Content type used when nothing better is known.
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// The extension of `path` with its leading dot, or an empty string.
pub fn extension_of(path: &str) -> String {
    Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{}", ext))
        .unwrap_or_default()
}

/// Content type for an asset, inferred from its extension.
pub fn content_type_for(path: &str) -> &'static str {
    let ext = extension_of(path);
    let bare = ext.trim_start_matches('.');
    if bare.is_empty() {
        return DEFAULT_CONTENT_TYPE;
    }

    mime_guess::from_ext(bare)
        .first_raw()
        .or_else(|| fallback(&bare.to_ascii_lowercase()))
        .unwrap_or(DEFAULT_CONTENT_TYPE)
}

fn fallback(ext: &str) -> Option<&'static str> {
    match ext {
        "mp4" => Some("video/mp4"),
        "srt" => Some("text/plain"),
        "zip" => Some("application/zip"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_of() {
        assert_eq!(extension_of("/videos/intro.mp4"), ".mp4");
        assert_eq!(extension_of("archive.tar.gz"), ".gz");
        assert_eq!(extension_of("README"), "");
    }

    #[test]
    fn test_known_types() {
        assert_eq!(content_type_for("a/b.mp4"), "video/mp4");
        assert_eq!(content_type_for("bundle.zip"), "application/zip");
        assert_eq!(content_type_for("state.json"), "application/json");
        assert_eq!(content_type_for("logo.png"), "image/png");
    }

    #[test]
    fn test_subtitles_fall_back_to_text() {
        assert!(content_type_for("movie.srt").contains('/'));
        assert_eq!(fallback("srt"), Some("text/plain"));
    }

    #[test]
    fn test_unknown_extension() {
        assert_eq!(content_type_for("blob"), DEFAULT_CONTENT_TYPE);
        assert_eq!(content_type_for("data.qqqzz"), DEFAULT_CONTENT_TYPE);
    }
}
