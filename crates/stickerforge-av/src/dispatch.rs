//! Conversion dispatcher: the engine's public entry point.
//!
//! [`Converter::convert`] classifies the source once, routes the request to
//! the raster or motion action for the target, and folds every error into a
//! [`ConversionOutcome::Failure`]. Working files are [`ScratchFile`] guards,
//! so the source and any partially written output are removed on every path
//! except the one file handed back in a [`ConversionResult`].

use std::path::{Path, PathBuf};
use std::time::Instant;

use stickerforge_core::config::{
    ConversionConfig, DisplayAttributesMode, ScratchConfig, ToolsConfig,
};
use stickerforge_core::{
    ConversionOutcome, ConversionResult, DisplayAttributes, Error, MediaKind, Result,
    TargetFormat, MIME_WEBP,
};
use tokio_util::sync::CancellationToken;

use crate::actions::{self, StillFormat, VideoFormat};
use crate::classify::{classify, essence};
use crate::probe;
use crate::scratch::{ScratchFile, ScratchSpace};
use crate::tools::ToolRegistry;

/// A downloaded source sticker, owned by exactly one conversion request.
///
/// The file is deleted when the request ends unless it is passed through
/// unchanged as the output.
#[derive(Debug)]
pub struct SourceMedia {
    file: ScratchFile,
    content_type: String,
    size: u64,
}

impl SourceMedia {
    /// Take ownership of a file already downloaded to local storage.
    pub fn adopt(path: impl Into<PathBuf>, content_type: impl Into<String>) -> Result<Self> {
        let file = ScratchFile::adopt(path);
        let size = std::fs::metadata(file.path())?.len();
        Ok(Self {
            file,
            content_type: content_type.into(),
            size,
        })
    }

    /// Wrap an already-guarded scratch file.
    pub fn from_scratch(file: ScratchFile, content_type: impl Into<String>) -> Result<Self> {
        let size = std::fs::metadata(file.path())?.len();
        Ok(Self {
            file,
            content_type: content_type.into(),
            size,
        })
    }

    /// Location of the source bytes.
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Declared content type.
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// Size in bytes at adoption time.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Classified kind, see [`classify`].
    pub fn kind(&self) -> MediaKind {
        classify(&self.content_type)
    }
}

/// The conversion engine.
///
/// Holds no per-request state, so one instance can serve any number of
/// concurrent requests.
#[derive(Debug, Clone)]
pub struct Converter {
    tools: ToolRegistry,
    scratch: ScratchSpace,
    config: ConversionConfig,
}

impl Converter {
    /// Create a converter from already-resolved parts.
    pub fn new(tools: ToolRegistry, scratch: ScratchSpace, config: ConversionConfig) -> Self {
        Self {
            tools,
            scratch,
            config,
        }
    }

    /// Discover tools and build a converter from configuration sections.
    pub fn from_config(
        tools: &ToolsConfig,
        scratch: &ScratchConfig,
        conversion: &ConversionConfig,
    ) -> Self {
        Self::new(
            ToolRegistry::discover(tools),
            ScratchSpace::new(scratch),
            conversion.clone(),
        )
    }

    /// The tool registry in use.
    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Where source and output files live.
    pub fn scratch(&self) -> &ScratchSpace {
        &self.scratch
    }

    /// Convert `source` into `target`.
    pub async fn convert(&self, source: SourceMedia, target: TargetFormat) -> ConversionOutcome {
        self.convert_cancellable(source, target, &CancellationToken::new())
            .await
    }

    /// Take ownership of a downloaded file at `path` and convert it.
    ///
    /// The file is deleted when the request ends unless it becomes the
    /// output.
    pub async fn convert_path(
        &self,
        path: impl Into<PathBuf>,
        content_type: &str,
        target: TargetFormat,
    ) -> ConversionOutcome {
        match SourceMedia::adopt(path, content_type) {
            Ok(source) => self.convert(source, target).await,
            Err(e) => e.into(),
        }
    }

    /// Convert `source` into `target`, giving up with
    /// [`ErrorKind::Cancelled`](stickerforge_core::ErrorKind::Cancelled) when
    /// `cancel` fires. Working files are released either way.
    pub async fn convert_cancellable(
        &self,
        source: SourceMedia,
        target: TargetFormat,
        cancel: &CancellationToken,
    ) -> ConversionOutcome {
        let started = Instant::now();
        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(Error::Cancelled),
            r = self.dispatch(source, target, cancel) => r,
        };

        match &result {
            Ok(res) => tracing::info!(
                target_format = %target,
                output = %res.output_path.display(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "conversion finished"
            ),
            Err(e) => tracing::warn!(
                target_format = %target,
                kind = %e.kind(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "conversion failed: {e}"
            ),
        }

        ConversionOutcome::from(result)
    }

    async fn dispatch(
        &self,
        source: SourceMedia,
        target: TargetFormat,
        cancel: &CancellationToken,
    ) -> Result<ConversionResult> {
        let kind = source.kind();
        tracing::info!(
            target_format = %target,
            kind = ?kind,
            size = source.size(),
            path = %source.path().display(),
            "converting sticker"
        );

        match target {
            TargetFormat::AnimatedVectorContainer => {
                if kind != MediaKind::AnimatedVector {
                    return Err(Error::UnsupportedCombination { kind, target });
                }
                Ok(pass_through(source, target, DisplayAttributes::Animated))
            }
            TargetFormat::RasterContainer if essence(source.content_type()) == MIME_WEBP => {
                Ok(pass_through(source, target, DisplayAttributes::None))
            }
            TargetFormat::RasterContainer => self.still(source, target, StillFormat::Webp, cancel).await,
            TargetFormat::Png => self.still(source, target, StillFormat::Png, cancel).await,
            TargetFormat::Jpeg => self.still(source, target, StillFormat::Jpeg, cancel).await,
            TargetFormat::WebVideoContainer if kind == MediaKind::VideoLoop => {
                let attributes = self.video_attributes(source.path(), cancel).await?;
                Ok(pass_through(source, target, attributes))
            }
            TargetFormat::WebVideoContainer => {
                self.video(source, target, VideoFormat::Webm, cancel).await
            }
            TargetFormat::StandardVideoContainer => {
                self.video(source, target, VideoFormat::Mp4, cancel).await
            }
        }
    }

    async fn still(
        &self,
        source: SourceMedia,
        target: TargetFormat,
        format: StillFormat,
        cancel: &CancellationToken,
    ) -> Result<ConversionResult> {
        let output = source.file.derive(format.extension());
        let (output, path) = actions::to_still(
            &self.tools,
            &self.config,
            source.path(),
            output,
            format,
            cancel,
        )
        .await?;
        tracing::debug!("{target} produced via {path:?} tier");

        Ok(ConversionResult::new(output.keep(), target, DisplayAttributes::None))
    }

    async fn video(
        &self,
        source: SourceMedia,
        target: TargetFormat,
        format: VideoFormat,
        cancel: &CancellationToken,
    ) -> Result<ConversionResult> {
        let output = source.file.derive(format.extension());
        actions::transcode(&self.tools, source.path(), output.path(), format, cancel).await?;
        let attributes = self.video_attributes(output.path(), cancel).await?;

        Ok(ConversionResult::new(output.keep(), target, attributes))
    }

    async fn video_attributes(
        &self,
        path: &Path,
        cancel: &CancellationToken,
    ) -> Result<DisplayAttributes> {
        match self.config.display_attributes {
            DisplayAttributesMode::Fixed => Ok(DisplayAttributes::fixed_video()),
            DisplayAttributesMode::Probed => {
                match probe::measure_video(&self.tools, path, cancel).await {
                    Ok(attributes) => Ok(attributes),
                    Err(Error::Cancelled) => Err(Error::Cancelled),
                    Err(e) => {
                        tracing::warn!(
                            "could not measure {}: {e}; reporting fixed attributes",
                            path.display()
                        );
                        Ok(DisplayAttributes::fixed_video())
                    }
                }
            }
        }
    }
}

/// Hand the source itself back as the output.
fn pass_through(
    source: SourceMedia,
    target: TargetFormat,
    attributes: DisplayAttributes,
) -> ConversionResult {
    tracing::debug!("{target} pass-through of {}", source.path().display());
    ConversionResult::new(source.file.keep(), target, attributes)
}
