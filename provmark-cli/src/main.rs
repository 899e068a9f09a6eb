//! Provmark CLI - batch invisible watermarking with a provenance ledger.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use colored::Colorize;

mod commands;
mod exit_codes;
mod utils;

use exit_codes::ExitCode;

const EXIT_CODES_HELP: &str = "\
Exit codes:
  0   Success
  1   General error
  2   Invalid mode or arguments
  64  Invalid strength or hash value
  65  Validation failed (identifier not in ledger)
  66  Input folder or file not found
  74  I/O error writing images or logs";

#[derive(Parser)]
#[command(name = "provmark")]
#[command(author, version, about = "Invisible provenance watermarks for image batches", long_about = None)]
#[command(after_help = EXIT_CODES_HELP)]
struct Cli {
    /// Show debug logging on stderr (overridden by RUST_LOG)
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Suppress human-readable output
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Folder and codec overrides on top of the PROVMARK_* environment.
#[derive(Args, Debug, Clone, Default)]
pub struct WorkspaceArgs {
    /// Folder holding the original images
    #[arg(long, value_name = "DIR", env = "PROVMARK_ORIGINALS_DIR")]
    pub originals: Option<PathBuf>,

    /// Folder receiving (embed) or holding (extract) watermarked images
    #[arg(long, value_name = "DIR", env = "PROVMARK_WATERMARKED_DIR")]
    pub watermarked: Option<PathBuf>,

    /// Folder holding watermark_log.log, extraction_log.log and debug_log.log
    #[arg(long, value_name = "DIR", env = "PROVMARK_LOG_DIR")]
    pub log_dir: Option<PathBuf>,

    /// Quantisation step of the watermark (default: 36)
    #[arg(long, value_name = "STEP")]
    pub strength: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Embed watermarks into every image of the originals folder
    Embed {
        #[command(flatten)]
        workspace: WorkspaceArgs,

        /// Content hash for the ledger: sha256, sha3-256 or md5
        #[arg(long, value_name = "ALGO")]
        hash: Option<String>,

        /// Print progress events as JSON lines
        #[arg(long)]
        json: bool,
    },

    /// Extract and validate watermarks from every watermarked image
    Extract {
        #[command(flatten)]
        workspace: WorkspaceArgs,

        /// Use a fixed watermark bit length instead of the ledger lookup
        #[arg(long, value_name = "BITS")]
        wm_len: Option<usize>,

        /// Print progress events as JSON lines
        #[arg(long)]
        json: bool,
    },

    /// Check an identifier against the ledger
    Validate {
        /// Identifier recovered from an image (the UUID= value)
        #[arg(value_name = "ID")]
        identifier: String,

        #[command(flatten)]
        workspace: WorkspaceArgs,

        /// Print the matching record as JSON
        #[arg(long)]
        json: bool,
    },
}

impl Commands {
    fn workspace(&self) -> &WorkspaceArgs {
        match self {
            Commands::Embed { workspace, .. }
            | Commands::Extract { workspace, .. }
            | Commands::Validate { workspace, .. } => workspace,
        }
    }

    fn hash(&self) -> Option<&str> {
        match self {
            Commands::Embed { hash, .. } => hash.as_deref(),
            _ => None,
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(err) = run(cli).await {
        let exit = ExitCode::from_anyhow(&err);
        if let Some(message) = exit.message {
            eprintln!("{} {}", "Error:".red().bold(), message);
        }
        std::process::exit(exit.code);
    }
}

async fn run(cli: Cli) -> Result<()> {
    // The debug log lives in the configured log folder
    let config = utils::resolve_config(cli.command.workspace(), cli.command.hash())?;
    utils::init_tracing(cli.verbose, &config)?;
    utils::log_config(&config);

    match cli.command {
        Commands::Embed { json, .. } => commands::embed::execute(config, json, cli.quiet).await,
        Commands::Extract { wm_len, json, .. } => {
            commands::extract::execute(config, wm_len, json, cli.quiet).await
        }
        Commands::Validate {
            identifier, json, ..
        } => commands::validate::execute(identifier, config, json, cli.quiet),
    }
}
