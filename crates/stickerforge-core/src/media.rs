//! Sticker-domain types: source kinds, target formats, and conversion results.
//!
//! All enums serialize in lowercase and implement `Display` manually for
//! consistent string representation.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::{Error, ErrorKind};

/// Content type of an animated vector sticker.
pub const MIME_TGS: &str = "application/x-tgs";
/// Content type of a video sticker.
pub const MIME_WEBM: &str = "video/webm";
/// Content type of a static sticker.
pub const MIME_WEBP: &str = "image/webp";
/// Content type of a PNG still.
pub const MIME_PNG: &str = "image/png";
/// Content type of a JPEG still.
pub const MIME_JPEG: &str = "image/jpeg";
/// Content type of an MP4 video.
pub const MIME_MP4: &str = "video/mp4";

/// Fixed duration reported for motion outputs, in seconds.
pub const MOTION_DURATION_SECS: u32 = 5;
/// Fixed frame edge reported for motion outputs, in pixels.
pub const MOTION_FRAME_EDGE: u32 = 512;

// ---------------------------------------------------------------------------
// MediaKind
// ---------------------------------------------------------------------------

/// What a source sticker actually is, derived from its declared content type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    StaticRaster,
    AnimatedVector,
    VideoLoop,
}

impl MediaKind {
    /// Targets that make sense to offer for this kind of sticker.
    pub fn offered_targets(&self) -> &'static [TargetFormat] {
        use TargetFormat::*;
        match self {
            Self::StaticRaster => &[RasterContainer, Png, Jpeg],
            Self::AnimatedVector => &[
                RasterContainer,
                Png,
                Jpeg,
                AnimatedVectorContainer,
                WebVideoContainer,
                StandardVideoContainer,
            ],
            Self::VideoLoop => &[
                RasterContainer,
                Png,
                Jpeg,
                WebVideoContainer,
                StandardVideoContainer,
            ],
        }
    }

    /// Whether `target` is among [`offered_targets`](Self::offered_targets).
    pub fn offers(&self, target: TargetFormat) -> bool {
        self.offered_targets().contains(&target)
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StaticRaster => write!(f, "static raster"),
            Self::AnimatedVector => write!(f, "animated vector"),
            Self::VideoLoop => write!(f, "video loop"),
        }
    }
}

// ---------------------------------------------------------------------------
// TargetFormat
// ---------------------------------------------------------------------------

/// Output representation requested by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetFormat {
    /// Lossless, alpha-capable WebP.
    #[serde(rename = "webp")]
    RasterContainer,
    Png,
    #[serde(rename = "jpg", alias = "jpeg")]
    Jpeg,
    /// Telegram animated vector sticker.
    #[serde(rename = "tgs")]
    AnimatedVectorContainer,
    /// VP9 in WebM.
    #[serde(rename = "webm")]
    WebVideoContainer,
    /// H.264 in MP4.
    #[serde(rename = "mp4")]
    StandardVideoContainer,
}

impl TargetFormat {
    /// Every target format, in menu order.
    pub const ALL: [TargetFormat; 6] = [
        TargetFormat::RasterContainer,
        TargetFormat::Png,
        TargetFormat::Jpeg,
        TargetFormat::AnimatedVectorContainer,
        TargetFormat::WebVideoContainer,
        TargetFormat::StandardVideoContainer,
    ];

    /// The content type the caller must attach when delivering the output.
    pub fn content_type(&self) -> &'static str {
        match self {
            Self::RasterContainer => MIME_WEBP,
            Self::Png => MIME_PNG,
            Self::Jpeg => MIME_JPEG,
            Self::AnimatedVectorContainer => MIME_TGS,
            Self::WebVideoContainer => MIME_WEBM,
            Self::StandardVideoContainer => MIME_MP4,
        }
    }

    /// File extension without the leading dot.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::RasterContainer => "webp",
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::AnimatedVectorContainer => "tgs",
            Self::WebVideoContainer => "webm",
            Self::StandardVideoContainer => "mp4",
        }
    }

    /// Suggested delivery file name, e.g. `sticker.webm`.
    pub fn file_name(&self) -> String {
        format!("sticker.{}", self.extension())
    }

    /// Whether this target is produced by the motion transcoder.
    pub fn is_motion(&self) -> bool {
        matches!(
            self,
            Self::AnimatedVectorContainer | Self::WebVideoContainer | Self::StandardVideoContainer
        )
    }
}

impl fmt::Display for TargetFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for TargetFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "webp" => Ok(Self::RasterContainer),
            "png" => Ok(Self::Png),
            "jpg" | "jpeg" => Ok(Self::Jpeg),
            "tgs" => Ok(Self::AnimatedVectorContainer),
            "webm" => Ok(Self::WebVideoContainer),
            "mp4" => Ok(Self::StandardVideoContainer),
            other => Err(Error::Config(format!(
                "unknown target format '{other}' (expected one of webp, png, jpg, tgs, webm, mp4)"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// Presentation hints the caller attaches when delivering the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DisplayAttributes {
    /// Plain still image; nothing to attach.
    #[default]
    None,
    /// Animated document marker for vector pass-through.
    Animated,
    /// Video attributes.
    Video {
        duration_secs: u32,
        width: u32,
        height: u32,
        round_message: bool,
        supports_streaming: bool,
    },
}

impl DisplayAttributes {
    /// Video attributes with the given measurements.
    pub fn video(duration_secs: u32, width: u32, height: u32) -> Self {
        Self::Video {
            duration_secs,
            width,
            height,
            round_message: false,
            supports_streaming: true,
        }
    }

    /// The placeholder video attributes reported for every motion output.
    pub fn fixed_video() -> Self {
        Self::video(MOTION_DURATION_SECS, MOTION_FRAME_EDGE, MOTION_FRAME_EDGE)
    }
}

/// A successfully produced output. The caller owns `output_path` and must
/// delete it once delivered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConversionResult {
    pub output_path: PathBuf,
    pub content_type: &'static str,
    pub file_name: String,
    pub attributes: DisplayAttributes,
}

impl ConversionResult {
    /// Build a result for `target` at `output_path`.
    pub fn new(output_path: PathBuf, target: TargetFormat, attributes: DisplayAttributes) -> Self {
        Self {
            output_path,
            content_type: target.content_type(),
            file_name: target.file_name(),
            attributes,
        }
    }
}

/// Outcome of one conversion request. Never carries a raw error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ConversionOutcome {
    Success(ConversionResult),
    Failure { kind: ErrorKind, message: String },
}

impl ConversionOutcome {
    /// Whether the request succeeded.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// The failure kind, if any.
    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Success(_) => None,
            Self::Failure { kind, .. } => Some(*kind),
        }
    }
}

impl From<Result<ConversionResult, Error>> for ConversionOutcome {
    fn from(result: Result<ConversionResult, Error>) -> Self {
        match result {
            Ok(result) => Self::Success(result),
            Err(e) => e.into(),
        }
    }
}

impl From<Error> for ConversionOutcome {
    fn from(e: Error) -> Self {
        Self::Failure {
            kind: e.kind(),
            message: e.to_string(),
        }
    }
}
