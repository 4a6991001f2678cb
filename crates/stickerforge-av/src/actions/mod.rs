//! Conversion actions: still-image output and motion transcoding.

pub mod motion;
pub mod raster;

pub use motion::{transcode, VideoFormat};
pub use raster::{to_still, ConversionPath, StillFormat};

use std::path::Path;

use stickerforge_core::{Error, Result};

/// ffmpeg filter that pads width and height up to the next even number.
pub const EVEN_PAD_FILTER: &str = "pad=ceil(iw/2)*2:ceil(ih/2)*2";

/// Dimensions after [`EVEN_PAD_FILTER`] is applied.
pub fn padded_dimensions(width: u32, height: u32) -> (u32, u32) {
    (width.div_ceil(2) * 2, height.div_ceil(2) * 2)
}

/// Leading ffmpeg arguments shared by every invocation.
pub(crate) fn ffmpeg_preamble(input: &Path) -> Vec<String> {
    vec![
        "-hide_banner".into(),
        "-loglevel".into(),
        "error".into(),
        "-y".into(),
        "-i".into(),
        input.to_string_lossy().to_string(),
    ]
}

/// Fail unless `path` exists and is non-empty.
pub(crate) fn ensure_output(tool: &str, path: &Path) -> Result<()> {
    match std::fs::metadata(path) {
        Ok(meta) if meta.len() > 0 => Ok(()),
        Ok(_) => Err(Error::transcode(tool, format!("wrote an empty file: {}", path.display()))),
        Err(_) => Err(Error::transcode(tool, format!("produced no output at {}", path.display()))),
    }
}
