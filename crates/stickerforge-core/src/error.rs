//! Unified error type for the sticker conversion engine.
//!
//! All crates funnel their failures into [`Error`], which carries enough
//! context for the caller to render a structured failure via [`Error::kind`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::media::{MediaKind, TargetFormat};

/// Coarse failure classification reported to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Fetching the source media into local storage failed (caller side).
    DownloadError,
    /// Native still-image decode failed and the frame-extraction fallback failed too.
    DecodeError,
    /// The subprocess transcoder failed, was missing, or timed out.
    TranscodeError,
    /// The requested target cannot be produced from this kind of source.
    UnsupportedCombination,
    /// The request was abandoned before it completed.
    Cancelled,
    /// Scratch storage could not be created, read, or written.
    Io,
    /// Configuration was rejected.
    Config,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::DownloadError => "DownloadError",
            Self::DecodeError => "DecodeError",
            Self::TranscodeError => "TranscodeError",
            Self::UnsupportedCombination => "UnsupportedCombination",
            Self::Cancelled => "Cancelled",
            Self::Io => "IoError",
            Self::Config => "ConfigError",
        };
        f.write_str(s)
    }
}

/// Unified error type covering all failure modes of a conversion request.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The source could not be fetched into local storage.
    #[error("download failed: {0}")]
    Download(String),

    /// The source could not be decoded by either tier of the raster converter.
    #[error("decode failed: {message}")]
    Decode {
        /// Human-readable description, including fallback diagnostics.
        message: String,
    },

    /// An external tool returned an error.
    #[error("transcode failed [{tool}]: {message}")]
    Transcode {
        /// Name of the tool that failed.
        tool: String,
        /// Captured diagnostic output or a generic description.
        message: String,
    },

    /// A required external tool could not be located.
    #[error("transcode failed: {tool} not found; is it installed and in PATH?")]
    ToolNotFound {
        /// Name of the missing tool.
        tool: String,
    },

    /// The target format is structurally incompatible with the source.
    #[error("cannot produce {target} from a {kind} source")]
    UnsupportedCombination {
        /// Classified kind of the source.
        kind: MediaKind,
        /// Requested output format.
        target: TargetFormat,
    },

    /// The request was cancelled by the caller.
    #[error("conversion cancelled")]
    Cancelled,

    /// An I/O operation on scratch storage failed.
    #[error("I/O error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Configuration was invalid.
    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Classify this error for the caller.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Download(_) => ErrorKind::DownloadError,
            Error::Decode { .. } => ErrorKind::DecodeError,
            Error::Transcode { .. } | Error::ToolNotFound { .. } => ErrorKind::TranscodeError,
            Error::UnsupportedCombination { .. } => ErrorKind::UnsupportedCombination,
            Error::Cancelled => ErrorKind::Cancelled,
            Error::Io { .. } => ErrorKind::Io,
            Error::Config(_) => ErrorKind::Config,
        }
    }

    /// Convenience constructor for [`Error::Decode`].
    pub fn decode(message: impl Into<String>) -> Self {
        Error::Decode {
            message: message.into(),
        }
    }

    /// Convenience constructor for [`Error::Transcode`].
    pub fn transcode(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Transcode {
            tool: tool.into(),
            message: message.into(),
        }
    }

    /// Convenience constructor for [`Error::ToolNotFound`].
    pub fn tool_not_found(tool: impl Into<String>) -> Self {
        Error::ToolNotFound { tool: tool.into() }
    }
}

/// Result alias using the crate-level [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_display() {
        let err = Error::decode("not an image");
        assert_eq!(err.to_string(), "decode failed: not an image");
        assert_eq!(err.kind(), ErrorKind::DecodeError);
    }

    #[test]
    fn transcode_display() {
        let err = Error::transcode("ffmpeg", "Invalid data found when processing input");
        assert_eq!(
            err.to_string(),
            "transcode failed [ffmpeg]: Invalid data found when processing input"
        );
        assert_eq!(err.kind(), ErrorKind::TranscodeError);
    }

    #[test]
    fn missing_tool_is_a_transcode_failure() {
        let err = Error::tool_not_found("ffmpeg");
        assert_eq!(err.kind(), ErrorKind::TranscodeError);
        assert!(err.to_string().contains("ffmpeg not found"));
    }

    #[test]
    fn unsupported_combination_display() {
        let err = Error::UnsupportedCombination {
            kind: MediaKind::StaticRaster,
            target: TargetFormat::AnimatedVectorContainer,
        };
        assert_eq!(err.to_string(), "cannot produce tgs from a static raster source");
        assert_eq!(err.kind(), ErrorKind::UnsupportedCombination);
    }

    #[test]
    fn io_from_std() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "scratch missing");
        let err = Error::from(io_err);
        assert!(matches!(err, Error::Io { .. }));
        assert_eq!(err.kind(), ErrorKind::Io);
    }

    #[test]
    fn cancelled_kind() {
        assert_eq!(Error::Cancelled.kind(), ErrorKind::Cancelled);
        assert_eq!(Error::Cancelled.to_string(), "conversion cancelled");
    }

    #[test]
    fn kind_display_and_serde() {
        assert_eq!(ErrorKind::TranscodeError.to_string(), "TranscodeError");
        let json = serde_json::to_string(&ErrorKind::UnsupportedCombination).unwrap();
        assert_eq!(json, "\"unsupported_combination\"");
    }
}
