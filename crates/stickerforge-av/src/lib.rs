//! # stickerforge-av
//!
//! The sticker conversion engine.
//!
//! This crate provides:
//!
//! - **Classification** ([`classify`]) -- map a declared content type onto a
//!   [`MediaKind`](stickerforge_core::MediaKind).
//! - **Scratch files** ([`ScratchSpace`], [`ScratchFile`]) -- uniquely named
//!   working files that delete themselves unless kept.
//! - **Tool discovery** ([`ToolRegistry`]) -- find ffmpeg and ffprobe.
//! - **Command execution** ([`ToolCommand`]) -- async builder with timeout
//!   and cancellation support for running external processes.
//! - **Actions** ([`actions`]) -- still-image output with a native tier and an
//!   ffmpeg fallback, and WebM/MP4 transcoding.
//! - **Dispatch** ([`Converter`]) -- route a [`SourceMedia`] to the right
//!   action for a requested [`TargetFormat`](stickerforge_core::TargetFormat).

pub mod actions;
pub mod classify;
pub mod command;
pub mod dispatch;
pub mod probe;
pub mod scratch;
pub mod tools;

// ---- Re-exports for convenience ----

pub use classify::classify;
pub use command::{ToolCommand, ToolOutput};
pub use dispatch::{Converter, SourceMedia};
pub use scratch::{ScratchFile, ScratchSpace};
pub use tools::{ToolConfig, ToolInfo, ToolRegistry};

pub use actions::{to_still, transcode, ConversionPath, StillFormat, VideoFormat};
