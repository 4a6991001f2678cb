//! Source classification from the declared content type.

use stickerforge_core::{MediaKind, MIME_TGS, MIME_WEBM};

/// Decide what kind of sticker a source is from its declared content type.
///
/// Unknown or malformed types classify as [`MediaKind::StaticRaster`]; the
/// raster converter's fallback chain deals with whatever they really are.
pub fn classify(content_type: &str) -> MediaKind {
    match essence(content_type).as_str() {
        MIME_TGS => MediaKind::AnimatedVector,
        MIME_WEBM => MediaKind::VideoLoop,
        _ => MediaKind::StaticRaster,
    }
}

/// Lowercased `type/subtype` with parameters stripped.
pub(crate) fn essence(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vector_and_video_types() {
        assert_eq!(classify("application/x-tgs"), MediaKind::AnimatedVector);
        assert_eq!(classify("video/webm"), MediaKind::VideoLoop);
    }

    #[test]
    fn raster_and_unknown_types_default_to_static() {
        assert_eq!(classify("image/webp"), MediaKind::StaticRaster);
        assert_eq!(classify("image/png"), MediaKind::StaticRaster);
        assert_eq!(classify("application/octet-stream"), MediaKind::StaticRaster);
        assert_eq!(classify(""), MediaKind::StaticRaster);
        assert_eq!(classify("garbage"), MediaKind::StaticRaster);
    }

    #[test]
    fn parameters_and_case_are_ignored() {
        assert_eq!(classify("Video/WebM; codecs=vp9"), MediaKind::VideoLoop);
        assert_eq!(classify("  APPLICATION/X-TGS "), MediaKind::AnimatedVector);
    }
}
