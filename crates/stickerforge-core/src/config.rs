//! Configuration sections consumed by the conversion engine.
//!
//! The binary aggregates these into its top-level config file. Every section
//! defaults sensibly so an empty file is valid.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Default per-subprocess timeout in seconds.
pub const DEFAULT_TOOL_TIMEOUT_SECS: u64 = 120;

/// Paths to external CLI tools.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub ffmpeg_path: Option<PathBuf>,
    pub ffprobe_path: Option<PathBuf>,
    /// Maximum run time of a single transcoder invocation.
    pub timeout_secs: u64,
}

impl ToolsConfig {
    /// The configured timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: None,
            ffprobe_path: None,
            timeout_secs: DEFAULT_TOOL_TIMEOUT_SECS,
        }
    }
}

/// Where per-request working files are created.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScratchConfig {
    /// Scratch directory; `None` means the system temp dir.
    pub dir: Option<PathBuf>,
    pub prefix: String,
}

impl ScratchConfig {
    /// The directory scratch files are created in.
    pub fn resolved_dir(&self) -> PathBuf {
        self.dir.clone().unwrap_or_else(std::env::temp_dir)
    }
}

impl Default for ScratchConfig {
    fn default() -> Self {
        Self {
            dir: None,
            prefix: "sticker-".into(),
        }
    }
}

/// How display attributes of motion outputs are produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayAttributesMode {
    /// Report 5 seconds at 512x512 regardless of the actual output.
    #[default]
    Fixed,
    /// Measure the transcoded output with ffprobe.
    Probed,
}

/// Encoder parameters and request limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversionConfig {
    /// Quality of the native JPEG encoder (1..=100).
    pub jpeg_quality: u8,
    /// `-q:v` used when ffmpeg extracts a JPEG frame (2..=31, lower is better).
    pub jpeg_qscale: u8,
    pub display_attributes: DisplayAttributesMode,
    /// Requests allowed to run at the same time.
    pub max_concurrent: usize,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            jpeg_quality: 95,
            jpeg_qscale: 2,
            display_attributes: DisplayAttributesMode::Fixed,
            max_concurrent: 4,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_encoder_settings() {
        let cfg = ConversionConfig::default();
        assert_eq!(cfg.jpeg_quality, 95);
        assert_eq!(cfg.jpeg_qscale, 2);
        assert_eq!(cfg.display_attributes, DisplayAttributesMode::Fixed);
        assert_eq!(ToolsConfig::default().timeout(), Duration::from_secs(120));
        assert_eq!(ScratchConfig::default().prefix, "sticker-");
    }

    #[test]
    fn empty_sections_use_defaults() {
        let cfg: ConversionConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg.max_concurrent, 4);
        let tools: ToolsConfig = serde_json::from_str("{}").unwrap();
        assert!(tools.ffmpeg_path.is_none());
        assert_eq!(tools.timeout_secs, DEFAULT_TOOL_TIMEOUT_SECS);
    }

    #[test]
    fn display_attributes_mode_parses_lowercase() {
        let cfg: ConversionConfig =
            serde_json::from_str(r#"{"display_attributes": "probed"}"#).unwrap();
        assert_eq!(cfg.display_attributes, DisplayAttributesMode::Probed);
    }

    #[test]
    fn scratch_dir_falls_back_to_temp_dir() {
        assert_eq!(ScratchConfig::default().resolved_dir(), std::env::temp_dir());
        let cfg = ScratchConfig {
            dir: Some(PathBuf::from("/var/scratch")),
            ..Default::default()
        };
        assert_eq!(cfg.resolved_dir(), PathBuf::from("/var/scratch"));
    }
}
