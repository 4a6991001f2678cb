//! Measuring transcoded outputs with ffprobe.
//!
//! Shells out to `ffprobe -v error -select_streams v:0 -show_entries
//! stream=width,height:format=duration -of json` and maps the result onto
//! [`DisplayAttributes::Video`].

use std::path::Path;

use serde::Deserialize;
use stickerforge_core::{DisplayAttributes, Error, Result};
use tokio_util::sync::CancellationToken;

use crate::tools::ToolRegistry;

/// Measure the first video stream of `path`.
pub async fn measure_video(
    tools: &ToolRegistry,
    path: &Path,
    cancel: &CancellationToken,
) -> Result<DisplayAttributes> {
    let ffprobe = tools.require("ffprobe")?;

    let mut cmd = ffprobe.command();
    cmd.args([
        "-v", "error",
        "-select_streams", "v:0",
        "-show_entries", "stream=width,height:format=duration",
        "-of", "json",
    ]);
    cmd.arg(path.to_string_lossy().as_ref());

    let output = cmd.execute_cancellable(cancel).await?;
    parse_measurements(&output.stdout)
}

fn parse_measurements(json: &str) -> Result<DisplayAttributes> {
    let ff: FfprobeOutput = serde_json::from_str(json)
        .map_err(|e| Error::transcode("ffprobe", format!("JSON parse error: {e}")))?;

    let stream = ff
        .streams
        .into_iter()
        .find(|s| s.width.is_some() && s.height.is_some())
        .ok_or_else(|| Error::transcode("ffprobe", "no video stream with dimensions"))?;

    let duration_secs = ff
        .format
        .and_then(|f| f.duration)
        .and_then(|d| d.parse::<f64>().ok())
        .map(|d| d.ceil().max(0.0) as u32)
        .unwrap_or(0);

    Ok(DisplayAttributes::video(
        duration_secs,
        stream.width.unwrap_or_default(),
        stream.height.unwrap_or_default(),
    ))
}

// ---------------------------------------------------------------------------
// JSON structures
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    streams: Vec<FfprobeStream>,
    format: Option<FfprobeFormat>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    width: Option<u32>,
    height: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}
