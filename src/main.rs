mod cli;

use stickerforge::{
    config,
    service::{self, StickerService},
};
use stickerforge_av::{classify, ToolRegistry};
use stickerforge_core::{ConversionOutcome, ErrorKind, TargetFormat};

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;

/// One line of `convert --json` output.
#[derive(Serialize)]
struct Report<'a> {
    target: TargetFormat,
    #[serde(skip_serializing_if = "Option::is_none")]
    delivered_to: Option<PathBuf>,
    #[serde(flatten)]
    outcome: &'a ConversionOutcome,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "stickerforge=trace,stickerforge_av=trace,stickerforge_core=debug".to_string()
        } else {
            "stickerforge=info,stickerforge_av=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Convert {
            input,
            targets,
            content_type,
            out_dir,
            force,
            json,
        } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(convert_file(
                &input,
                &targets,
                content_type,
                out_dir,
                force,
                json,
                cli.config.as_deref(),
            ))
        }
        Commands::Formats { content_type } => list_formats(&content_type),
        Commands::CheckTools { json } => check_tools(cli.config.as_deref(), json),
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("stickerforge {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

async fn convert_file(
    input: &Path,
    targets: &[TargetFormat],
    content_type: Option<String>,
    out_dir: Option<PathBuf>,
    force: bool,
    json: bool,
    config_path: Option<&Path>,
) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;

    if !input.is_file() {
        anyhow::bail!("Input file does not exist: {:?}", input);
    }

    let content_type =
        content_type.unwrap_or_else(|| service::guess_content_type(input).to_string());
    let out_dir = match out_dir {
        Some(dir) => dir,
        None => input
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(".")),
    };
    std::fs::create_dir_all(&out_dir)
        .with_context(|| format!("Failed to create output directory: {:?}", out_dir))?;

    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "sticker".to_string());

    let kind = classify(&content_type);
    let mut jobs: Vec<(TargetFormat, PathBuf)> = Vec::new();
    for &target in targets {
        if jobs.iter().any(|(t, _)| *t == target) {
            continue;
        }
        if !kind.offers(target) {
            tracing::warn!(
                "{} is not offered for a {} sticker; attempting anyway",
                target,
                kind
            );
        }
        let dest = out_dir.join(format!("{stem}.{}", target.extension()));
        if dest.exists() && !force {
            anyhow::bail!("Output already exists: {:?} (use --force to overwrite)", dest);
        }
        jobs.push((target, dest));
    }

    tracing::info!(
        "Converting {:?} ({}) to {}",
        input,
        content_type,
        jobs.iter()
            .map(|(t, _)| t.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    );

    let service = StickerService::from_config(&config);
    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Interrupted; cancelling conversions");
                cancel.cancel();
            }
        });
    }

    // Each target is an independent request with its own copy of the source.
    let handles: Vec<_> = jobs
        .iter()
        .map(|&(target, _)| {
            let service = service.clone();
            let input = input.to_path_buf();
            let content_type = content_type.clone();
            let cancel = cancel.clone();
            tokio::spawn(async move {
                service
                    .request(&input, &content_type, target, &cancel)
                    .await
            })
        })
        .collect();

    // Every request is collected and every output delivered or released,
    // even when an earlier one failed.
    let mut reports = Vec::with_capacity(jobs.len());
    for ((target, dest), handle) in jobs.into_iter().zip(handles) {
        let outcome = match handle.await {
            Ok(outcome) => outcome,
            Err(e) => ConversionOutcome::Failure {
                kind: ErrorKind::Io,
                message: format!("conversion task failed: {e}"),
            },
        };
        let (delivered_to, outcome) = match outcome {
            ConversionOutcome::Success(result) => match service.deliver(&result, &dest) {
                Ok(path) => (Some(path), ConversionOutcome::Success(result)),
                Err(e) => {
                    tracing::warn!("{e:#}");
                    (
                        None,
                        ConversionOutcome::Failure {
                            kind: ErrorKind::Io,
                            message: format!("{e:#}"),
                        },
                    )
                }
            },
            failure => (None, failure),
        };
        reports.push((target, delivered_to, outcome));
    }

    let failures = reports.iter().filter(|(_, _, o)| !o.is_success()).count();

    if json {
        let lines: Vec<Report<'_>> = reports
            .iter()
            .map(|(target, delivered_to, outcome)| Report {
                target: *target,
                delivered_to: delivered_to.clone(),
                outcome,
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&lines)?);
    } else {
        for (target, delivered_to, outcome) in &reports {
            match (outcome, delivered_to) {
                (ConversionOutcome::Success(result), Some(path)) => {
                    println!("✓ {} -> {} ({})", target, path.display(), result.content_type);
                }
                (ConversionOutcome::Failure { kind, message }, _) => {
                    println!("✗ {} [{}] {}", target, kind, message);
                }
                (ConversionOutcome::Success(_), None) => {}
            }
        }
    }

    if failures > 0 {
        anyhow::bail!("{} of {} conversions failed", failures, reports.len());
    }

    Ok(())
}

fn list_formats(content_type: &str) -> Result<()> {
    let kind = classify(content_type);
    println!("{} is a {} sticker; offered formats:", content_type, kind);
    for target in kind.offered_targets() {
        println!(
            "  {:<5} {:<18} {:<12} {}",
            target.to_string(),
            target.content_type(),
            target.file_name(),
            if target.is_motion() { "animated" } else { "still" }
        );
    }
    Ok(())
}

fn check_tools(config_path: Option<&Path>, json: bool) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let tools = ToolRegistry::discover(&config.tools).check_all();

    if json {
        println!("{}", serde_json::to_string_pretty(&tools)?);
        return Ok(());
    }

    println!("Checking external tools...\n");

    let mut all_ok = true;
    for tool in &tools {
        let status = if tool.available {
            "✓"
        } else {
            all_ok = false;
            "✗"
        };

        print!("{} {}", status, tool.name);

        if let Some(ref version) = tool.version {
            print!(" ({})", version);
        }

        if let Some(ref path) = tool.path {
            print!(" - {}", path.display());
        }

        println!();
    }

    println!();
    if all_ok {
        println!("All required tools are available!");
    } else {
        println!("Some tools are missing. Still-image conversion of raster stickers works without them; everything else needs ffmpeg.");
    }

    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = config::load_config(p)?;
            println!("✓ Configuration is valid");
            print_config(&config);
        }
        None => {
            println!("No config file specified, using defaults");
            println!("Default config:");
            print_config(&config::Config::default());
        }
    }

    Ok(())
}

fn print_config(config: &config::Config) {
    let path_or_search = |p: &Option<PathBuf>| {
        p.as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(search PATH)".to_string())
    };
    println!("  ffmpeg: {}", path_or_search(&config.tools.ffmpeg_path));
    println!("  ffprobe: {}", path_or_search(&config.tools.ffprobe_path));
    println!("  Tool timeout: {}s", config.tools.timeout_secs);
    println!("  Scratch dir: {}", config.scratch.resolved_dir().display());
    println!("  JPEG quality: {}", config.conversion.jpeg_quality);
    println!(
        "  Display attributes: {:?}",
        config.conversion.display_attributes
    );
    println!("  Max concurrent: {}", config.conversion.max_concurrent);
}
