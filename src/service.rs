//! Request runner around the conversion engine.
//!
//! [`StickerService`] is what a bot or the CLI talks to: it copies the
//! caller's file into scratch storage, limits how many conversions run at
//! once, and moves finished outputs to their destination.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use stickerforge_av::scratch::release_path;
use stickerforge_av::{Converter, SourceMedia};
use stickerforge_core::{ConversionOutcome, ConversionResult, Error, TargetFormat};
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

use crate::config::Config;

/// Content type assumed when the file extension says nothing useful.
pub const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// Concurrency-limited front end to a [`Converter`].
///
/// Cheap to clone; clones share the converter and the request limit.
#[derive(Debug, Clone)]
pub struct StickerService {
    converter: Arc<Converter>,
    permits: Arc<Semaphore>,
}

impl StickerService {
    /// Wrap `converter`, allowing at most `max_concurrent` requests at once.
    pub fn new(converter: Converter, max_concurrent: usize) -> Self {
        Self {
            converter: Arc::new(converter),
            permits: Arc::new(Semaphore::new(max_concurrent.max(1))),
        }
    }

    /// Build the engine and the service from a loaded config.
    pub fn from_config(config: &Config) -> Self {
        let converter = Converter::from_config(&config.tools, &config.scratch, &config.conversion);
        Self::new(converter, config.conversion.max_concurrent)
    }

    pub fn converter(&self) -> &Converter {
        &self.converter
    }

    /// Copy `input` into a fresh scratch file and take ownership of the copy.
    ///
    /// The caller's file is never modified or deleted.
    pub async fn download(&self, input: &Path, content_type: &str) -> Result<SourceMedia, Error> {
        let file = self.converter.scratch().acquire(".tmp")?;
        tokio::fs::copy(input, file.path())
            .await
            .map_err(|e| Error::Download(format!("{}: {e}", input.display())))?;

        tracing::debug!(
            "downloaded {} to {}",
            input.display(),
            file.path().display()
        );
        SourceMedia::from_scratch(file, content_type)
    }

    /// Run one conversion request end to end.
    ///
    /// Waits for a free slot, downloads the source and converts it. Every
    /// failure, including cancellation while queued, comes back as
    /// [`ConversionOutcome::Failure`].
    pub async fn request(
        &self,
        input: &Path,
        content_type: &str,
        target: TargetFormat,
        cancel: &CancellationToken,
    ) -> ConversionOutcome {
        let _permit = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Error::Cancelled.into(),
            permit = self.permits.acquire() => match permit {
                Ok(permit) => permit,
                Err(_) => return Error::Cancelled.into(),
            },
        };

        let source = match self.download(input, content_type).await {
            Ok(source) => source,
            Err(e) => {
                tracing::warn!(target_format = %target, "{e}");
                return e.into();
            }
        };

        self.converter
            .convert_cancellable(source, target, cancel)
            .await
    }

    /// Move a finished output to `dest` and return the final path.
    ///
    /// Renames when possible and falls back to copy and delete across
    /// filesystems. The scratch copy is gone afterwards, including when
    /// delivery fails.
    pub fn deliver(&self, result: &ConversionResult, dest: &Path) -> anyhow::Result<PathBuf> {
        deliver(result, dest)
    }
}

/// See [`StickerService::deliver`].
pub fn deliver(result: &ConversionResult, dest: &Path) -> anyhow::Result<PathBuf> {
    let output = &result.output_path;
    if output == dest {
        return Ok(dest.to_path_buf());
    }

    if let Err(e) = std::fs::rename(output, dest) {
        tracing::debug!("rename {:?} -> {:?} failed ({e}); copying", output, dest);
        let copied = std::fs::copy(output, dest);
        if let Err(e) = release_path(output) {
            tracing::warn!("Failed to remove scratch output {:?}: {e}", output);
        }
        copied.with_context(|| format!("Failed to deliver {:?} to {:?}", output, dest))?;
    }

    tracing::info!("delivered {} to {}", result.file_name, dest.display());
    Ok(dest.to_path_buf())
}

/// Guess a content type from a file's extension.
pub fn guess_content_type(path: &Path) -> &'static str {
    path.extension()
        .and_then(|ext| ext.to_str())
        .and_then(|ext| ext.parse::<TargetFormat>().ok())
        .map(|format| format.content_type())
        .unwrap_or(FALLBACK_CONTENT_TYPE)
}
