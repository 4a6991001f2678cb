//! Converter behaviour against stand-in transcoders.
//!
//! Each test installs a small shell script as "ffmpeg" so failure, success,
//! and hanging transcoders can be exercised without a real installation.
//! Tests run serially: writing an executable while another test forks can
//! fail with ETXTBSY.

#![cfg(unix)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serial_test::serial;
use stickerforge_av::{Converter, ScratchSpace, SourceMedia, ToolRegistry};
use stickerforge_core::config::ConversionConfig;
use stickerforge_core::{ConversionOutcome, DisplayAttributes, ErrorKind, TargetFormat};
use tokio_util::sync::CancellationToken;

const FAILING: &str = "#!/bin/sh\necho 'Invalid data found when processing input' >&2\nexit 1\n";
const WRITING: &str = "#!/bin/sh\nfor last; do :; done\nprintf 'frame' > \"$last\"\n";
const HANGING: &str = "#!/bin/sh\nexec sleep 30\n";

fn install_script(dir: &Path, body: &str) -> PathBuf {
    let path = dir.join("ffmpeg");
    std::fs::write(&path, body).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

/// A converter whose scratch dir is `scratch` and whose ffmpeg runs `body`.
fn converter_with(bin: &Path, scratch: &Path, body: &str) -> Converter {
    let ffmpeg = install_script(bin, body);
    Converter::new(
        ToolRegistry::default().with_tool("ffmpeg", ffmpeg, Duration::from_secs(10)),
        ScratchSpace::in_dir(scratch),
        ConversionConfig::default(),
    )
}

fn source(converter: &Converter, bytes: &[u8], content_type: &str) -> SourceMedia {
    let file = converter.scratch().acquire(".tmp").unwrap();
    std::fs::write(file.path(), bytes).unwrap();
    SourceMedia::from_scratch(file, content_type).unwrap()
}

fn entries(dir: &Path) -> Vec<PathBuf> {
    std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().path())
        .collect()
}

#[tokio::test]
#[serial]
async fn failing_transcoder_reports_diagnostics_and_leaves_nothing_behind() {
    let bin = tempfile::tempdir().unwrap();
    let scratch = tempfile::tempdir().unwrap();
    let conv = converter_with(bin.path(), scratch.path(), FAILING);
    let src = source(&conv, b"\x1f\x8b\x08lottie", "application/x-tgs");
    let src_path = src.path().to_path_buf();

    match conv.convert(src, TargetFormat::StandardVideoContainer).await {
        ConversionOutcome::Failure { kind, message } => {
            assert_eq!(kind, ErrorKind::TranscodeError);
            assert!(message.contains("Invalid data found"), "got: {message}");
        }
        other => panic!("unexpected outcome: {other:?}"),
    }

    assert!(!src_path.exists());
    assert!(entries(scratch.path()).is_empty());
}

#[tokio::test]
#[serial]
async fn failing_fallback_is_a_decode_error() {
    let bin = tempfile::tempdir().unwrap();
    let scratch = tempfile::tempdir().unwrap();
    let conv = converter_with(bin.path(), scratch.path(), FAILING);
    let src = source(&conv, b"not an image at all", "image/webp");

    let outcome = conv.convert(src, TargetFormat::Png).await;
    assert_eq!(outcome.error_kind(), Some(ErrorKind::DecodeError));
    assert!(entries(scratch.path()).is_empty());
}

#[tokio::test]
#[serial]
async fn undecodable_source_falls_back_to_frame_extraction() {
    let bin = tempfile::tempdir().unwrap();
    let scratch = tempfile::tempdir().unwrap();
    let conv = converter_with(bin.path(), scratch.path(), WRITING);
    let src = source(&conv, b"\x1a\x45\xdf\xa3webm", "video/webm");
    let src_path = src.path().to_path_buf();

    let res = match conv.convert(src, TargetFormat::Png).await {
        ConversionOutcome::Success(res) => res,
        other => panic!("unexpected outcome: {other:?}"),
    };

    assert_eq!(res.content_type, "image/png");
    assert_eq!(res.file_name, "sticker.png");
    assert_eq!(res.attributes, DisplayAttributes::None);
    assert_eq!(std::fs::read(&res.output_path).unwrap(), b"frame");
    assert!(!src_path.exists());
    assert_eq!(entries(scratch.path()), vec![res.output_path.clone()]);
}

#[tokio::test]
#[serial]
async fn vector_to_mp4_reports_fixed_display_attributes() {
    let bin = tempfile::tempdir().unwrap();
    let scratch = tempfile::tempdir().unwrap();
    let conv = converter_with(bin.path(), scratch.path(), WRITING);
    let src = source(&conv, b"\x1f\x8b\x08lottie", "application/x-tgs");

    let res = match conv.convert(src, TargetFormat::StandardVideoContainer).await {
        ConversionOutcome::Success(res) => res,
        other => panic!("unexpected outcome: {other:?}"),
    };

    assert_eq!(res.content_type, "video/mp4");
    assert!(res.output_path.to_string_lossy().ends_with(".mp4"));
    assert_eq!(res.attributes, DisplayAttributes::video(5, 512, 512));
}

#[tokio::test]
#[serial]
async fn cancelling_a_running_transcode_kills_it_and_cleans_up() {
    let bin = tempfile::tempdir().unwrap();
    let scratch = tempfile::tempdir().unwrap();
    let conv = converter_with(bin.path(), scratch.path(), HANGING);
    let src = source(&conv, b"\x1f\x8b\x08lottie", "application/x-tgs");

    let token = CancellationToken::new();
    let canceller = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(200)).await;
        canceller.cancel();
    });

    let started = std::time::Instant::now();
    let outcome = conv
        .convert_cancellable(src, TargetFormat::WebVideoContainer, &token)
        .await;

    assert_eq!(outcome.error_kind(), Some(ErrorKind::Cancelled));
    assert!(started.elapsed() < Duration::from_secs(10));
    assert!(entries(scratch.path()).is_empty());
}

/// Frame extraction through a real ffmpeg, when one is installed.
///
/// Y4M is not something the native decoder understands, so this always goes
/// through the fallback and the odd height is padded.
#[tokio::test]
#[serial]
async fn real_ffmpeg_pads_fallback_frames_to_even_dimensions() {
    let Ok(ffmpeg) = which::which("ffmpeg") else {
        eprintln!("ffmpeg not installed; skipping");
        return;
    };

    let scratch = tempfile::tempdir().unwrap();
    let conv = Converter::new(
        ToolRegistry::default().with_tool("ffmpeg", ffmpeg, Duration::from_secs(60)),
        ScratchSpace::in_dir(scratch.path()),
        ConversionConfig::default(),
    );

    let (width, height) = (100usize, 101usize);
    let mut y4m = format!("YUV4MPEG2 W{width} H{height} F25:1 Ip A1:1 C444\nFRAME\n").into_bytes();
    y4m.extend(std::iter::repeat(128u8).take(width * height * 3));
    let src = source(&conv, &y4m, "application/octet-stream");

    let res = match conv.convert(src, TargetFormat::Png).await {
        ConversionOutcome::Success(res) => res,
        other => panic!("unexpected outcome: {other:?}"),
    };

    let decoded = image::open(&res.output_path).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (100, 102));
}
