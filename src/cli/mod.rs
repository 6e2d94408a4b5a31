//! Command-line interface.
//!
//! The CLI is the extraction pipeline's caller: it submits files one at a
//! time, renders progress, and reports success or failure per file. One
//! file failing never stops the rest of the batch.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::Settings;

#[derive(Parser)]
#[command(name = "textlift")]
#[command(about = "Extract text from images and PDF documents, locally")]
#[command(version)]
pub struct Cli {
    /// Config file path (overrides auto-discovery)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Extract text from one or more image or PDF files
    Extract {
        /// Files to process, in order
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Write each result to <name>.txt in this directory instead of stdout
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Emit all results as a JSON array on stdout
        #[arg(long)]
        json: bool,

        /// Page upscale factor for PDF recognition
        #[arg(long)]
        scale: Option<f32>,

        /// Page segmentation mode: auto, single-block, single-line, sparse
        #[arg(long)]
        psm: Option<String>,

        /// Engine mode: legacy, neural, combined
        #[arg(long)]
        oem: Option<String>,

        /// Restrict recognition to these characters
        #[arg(long)]
        whitelist: Option<String>,

        /// Keep engine-reported spacing between words
        #[arg(long)]
        preserve_spaces: bool,
    },

    /// Check recognition tool availability
    Check,
}

pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = Settings::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Extract {
            files,
            out,
            json,
            scale,
            psm,
            oem,
            whitelist,
            preserve_spaces,
        } => {
            commands::cmd_extract(
                settings,
                commands::ExtractArgs {
                    files,
                    out,
                    json,
                    scale,
                    psm,
                    oem,
                    whitelist,
                    preserve_spaces,
                },
            )
            .await
        }
        Commands::Check => commands::cmd_check().await,
    }
}
