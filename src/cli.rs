use clap::{Parser, Subcommand};
use std::path::PathBuf;
use stickerforge_core::TargetFormat;

#[derive(Parser)]
#[command(name = "stickerforge")]
#[command(author, version, about = "Chat sticker conversion tool")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Convert a sticker into one or more formats
    Convert {
        /// Sticker file to convert
        #[arg(required = true)]
        input: PathBuf,

        /// Target formats: webp, png, jpg, tgs, webm, mp4
        #[arg(short, long = "to", required = true, value_delimiter = ',')]
        targets: Vec<TargetFormat>,

        /// Declared content type (guessed from the extension if omitted)
        #[arg(long)]
        content_type: Option<String>,

        /// Directory for the converted files (defaults to the input's directory)
        #[arg(short, long)]
        out_dir: Option<PathBuf>,

        /// Overwrite existing output files
        #[arg(long)]
        force: bool,

        /// Output results as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the formats offered for a content type
    Formats {
        /// Declared content type of the sticker, e.g. application/x-tgs
        content_type: String,
    },

    /// Check that required external tools are available
    CheckTools {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        config: Option<PathBuf>,
    },

    /// Display version information
    Version,
}
