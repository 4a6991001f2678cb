//! Video output via ffmpeg (VP9/WebM and H.264/MP4).
//!
//! Pass-through cases (vector sticker to TGS, video sticker to WebM) never
//! reach this module; the dispatcher short-circuits them.

use std::path::Path;

use stickerforge_core::Result;
use tokio_util::sync::CancellationToken;

use super::{ensure_output, ffmpeg_preamble, EVEN_PAD_FILTER};
use crate::tools::ToolRegistry;

/// Video containers produced by transcoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoFormat {
    /// VP9 in WebM.
    Webm,
    /// H.264 in MP4 with the index moved to the front.
    Mp4,
}

impl VideoFormat {
    /// Extension of the derived output file.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Webm => "webm",
            Self::Mp4 => "mp4",
        }
    }
}

/// Arguments for transcoding `input` into `output` as `format`.
pub fn transcode_args(input: &Path, output: &Path, format: VideoFormat) -> Vec<String> {
    let mut args = ffmpeg_preamble(input);
    match format {
        VideoFormat::Webm => {
            args.extend(["-c:v", "libvpx-vp9", "-vf", EVEN_PAD_FILTER, "-f", "webm"].map(String::from));
        }
        VideoFormat::Mp4 => {
            args.extend(
                [
                    "-c:v", "libx264",
                    "-vf", EVEN_PAD_FILTER,
                    "-movflags", "+faststart",
                    "-pix_fmt", "yuv420p",
                    "-f", "mp4",
                ]
                .map(String::from),
            );
        }
    }
    args.push(output.to_string_lossy().to_string());
    args
}

/// Transcode `input` into `output`.
///
/// # Errors
///
/// [`stickerforge_core::Error::Transcode`] with ffmpeg's stderr when it
/// exits non-zero, [`stickerforge_core::Error::ToolNotFound`] when ffmpeg is
/// unavailable, [`stickerforge_core::Error::Cancelled`] when `cancel` fires.
pub async fn transcode(
    tools: &ToolRegistry,
    input: &Path,
    output: &Path,
    format: VideoFormat,
    cancel: &CancellationToken,
) -> Result<()> {
    let ffmpeg = tools.require("ffmpeg")?;

    tracing::info!(
        "transcode {} -> {} ({})",
        input.display(),
        output.display(),
        format.extension()
    );

    let mut cmd = ffmpeg.command();
    cmd.args(transcode_args(input, output, format));
    cmd.execute_cancellable(cancel).await?;

    ensure_output(&ffmpeg.name, output)
}
