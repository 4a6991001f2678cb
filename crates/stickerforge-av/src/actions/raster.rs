//! Still-image output (WebP, PNG, JPEG).
//!
//! Two tiers:
//! 1. Decode the source natively with the `image` crate and re-encode it.
//! 2. If decoding fails (the source is a video or vector sticker, or a
//!    corrupt raster), have ffmpeg extract a single frame, padded to even
//!    dimensions.
//!
//! Native failures are never surfaced on their own; they only select the
//! fallback.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::codecs::webp::WebPEncoder;
use image::{DynamicImage, GenericImageView, ImageReader, Rgb, RgbImage};
use stickerforge_core::config::ConversionConfig;
use stickerforge_core::{Error, Result};
use tokio_util::sync::CancellationToken;

use super::{ensure_output, ffmpeg_preamble, EVEN_PAD_FILTER};
use crate::scratch::ScratchFile;
use crate::tools::ToolRegistry;

/// Still-image encodings produced by this module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StillFormat {
    /// Lossless WebP, alpha preserved.
    Webp,
    /// PNG, alpha preserved.
    Png,
    /// JPEG, alpha composited onto white.
    Jpeg,
}

impl StillFormat {
    /// Extension of the derived output file.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Webp => "webp",
            Self::Png => "png",
            Self::Jpeg => "jpg",
        }
    }
}

/// Which tier produced a still output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversionPath {
    /// Decoded and re-encoded in-process; original dimensions kept.
    Native,
    /// Single frame extracted by ffmpeg; dimensions padded to even.
    Fallback,
}

/// Result of the in-process tier. Errors do not escape this module.
enum NativeAttempt {
    Encoded { width: u32, height: u32 },
    DecodeFailed(String),
}

/// Produce a still image at `output` from `source`.
///
/// `output` travels with the work: the blocking decoder holds it while it
/// writes, so an abandoned request releases the file only after the writer
/// is done with it. On success the guard is handed back still armed.
pub async fn to_still(
    tools: &ToolRegistry,
    config: &ConversionConfig,
    source: &Path,
    output: ScratchFile,
    format: StillFormat,
    cancel: &CancellationToken,
) -> Result<(ScratchFile, ConversionPath)> {
    let (output, attempt) =
        encode_native_blocking(source, output, format, config.jpeg_quality).await;
    match attempt {
        NativeAttempt::Encoded { width, height } => {
            tracing::debug!(
                "native {} encode of {} ({width}x{height})",
                format.extension(),
                source.display()
            );
            return Ok((output, ConversionPath::Native));
        }
        NativeAttempt::DecodeFailed(reason) => {
            tracing::warn!(
                "native decode of {} failed ({reason}); extracting a frame with ffmpeg",
                source.display()
            );
        }
    }

    match extract_frame(tools, config, source, output.path(), format, cancel).await {
        Ok(()) => Ok((output, ConversionPath::Fallback)),
        Err(Error::Cancelled) => Err(Error::Cancelled),
        Err(e) => Err(Error::decode(format!(
            "could not decode {} as an image and frame extraction failed: {e}",
            source.display()
        ))),
    }
}

/// Arguments for extracting one padded frame from `input` into `output`.
pub fn frame_args(input: &Path, output: &Path, format: StillFormat, jpeg_qscale: u8) -> Vec<String> {
    let mut args = ffmpeg_preamble(input);
    args.extend(["-frames:v", "1", "-vf", EVEN_PAD_FILTER].map(String::from));
    match format {
        StillFormat::Jpeg => args.extend([String::from("-q:v"), jpeg_qscale.to_string()]),
        StillFormat::Webp => args.extend(["-c:v", "libwebp", "-lossless", "1"].map(String::from)),
        StillFormat::Png => {}
    }
    args.push(output.to_string_lossy().to_string());
    args
}

async fn extract_frame(
    tools: &ToolRegistry,
    config: &ConversionConfig,
    source: &Path,
    output: &Path,
    format: StillFormat,
    cancel: &CancellationToken,
) -> Result<()> {
    let ffmpeg = tools.require("ffmpeg")?;
    let mut cmd = ffmpeg.command();
    cmd.args(frame_args(source, output, format, config.jpeg_qscale));
    cmd.execute_cancellable(cancel).await?;
    ensure_output(&ffmpeg.name, output)
}

async fn encode_native_blocking(
    source: &Path,
    output: ScratchFile,
    format: StillFormat,
    jpeg_quality: u8,
) -> (ScratchFile, NativeAttempt) {
    let source: PathBuf = source.to_path_buf();
    let output_path = output.path().to_path_buf();
    let joined = tokio::task::spawn_blocking(move || {
        let encoded = encode_native(&source, output.path(), format, jpeg_quality);
        (output, encoded)
    })
    .await;

    match joined {
        Ok((output, Ok((width, height)))) => (output, NativeAttempt::Encoded { width, height }),
        Ok((output, Err(e))) => (output, NativeAttempt::DecodeFailed(e.to_string())),
        // The guard was dropped with the failed task; track the path again
        // in case the fallback writes it.
        Err(e) => (
            ScratchFile::adopt(output_path),
            NativeAttempt::DecodeFailed(format!("decoder task failed: {e}")),
        ),
    }
}

fn encode_native(
    source: &Path,
    output: &Path,
    format: StillFormat,
    jpeg_quality: u8,
) -> image::ImageResult<(u32, u32)> {
    let img = ImageReader::open(source)?.with_guessed_format()?.decode()?;
    let (width, height) = img.dimensions();
    let writer = BufWriter::new(File::create(output)?);

    match format {
        StillFormat::Webp => keep_alpha(img).write_with_encoder(WebPEncoder::new_lossless(writer))?,
        StillFormat::Png => keep_alpha(img).write_with_encoder(PngEncoder::new(writer))?,
        StillFormat::Jpeg => flatten_onto_white(&img)
            .write_with_encoder(JpegEncoder::new_with_quality(writer, jpeg_quality.clamp(1, 100)))?,
    }

    Ok((width, height))
}

/// 8-bit RGBA when the source has transparency, 8-bit RGB otherwise.
fn keep_alpha(img: DynamicImage) -> DynamicImage {
    if img.color().has_alpha() {
        DynamicImage::ImageRgba8(img.into_rgba8())
    } else {
        DynamicImage::ImageRgb8(img.into_rgb8())
    }
}

/// Composite onto an opaque white background using alpha as the mask.
fn flatten_onto_white(img: &DynamicImage) -> RgbImage {
    if !img.color().has_alpha() {
        return img.to_rgb8();
    }

    let rgba = img.to_rgba8();
    let mut out = RgbImage::from_pixel(rgba.width(), rgba.height(), Rgb([255, 255, 255]));
    for (x, y, px) in rgba.enumerate_pixels() {
        let alpha = u32::from(px[3]);
        let blend = |c: u8| ((u32::from(c) * alpha + 255 * (255 - alpha) + 127) / 255) as u8;
        out.put_pixel(x, y, Rgb([blend(px[0]), blend(px[1]), blend(px[2])]));
    }
    out
}
