//! Embed command implementation.

use anyhow::{Context, Result};
use colored::Colorize;
use provmark_core::{BatchJob, Config};
use tracing::info;

use super::{run_job, Output};
use crate::utils::require_dir;

/// Execute the embed command.
pub async fn execute(config: Config, json: bool, quiet: bool) -> Result<()> {
    require_dir(&config.originals_dir)?;
    config
        .ensure_dirs()
        .context("Failed to write workspace folders")?;

    info!(
        originals = %config.originals_dir.display(),
        watermarked = %config.watermarked_dir.display(),
        "Starting embed batch"
    );

    let output = Output::new(json, quiet);
    let job = BatchJob::embed(&config.originals_dir, &config.watermarked_dir);
    let summary = run_job(&config, job, output).await?;

    if output == Output::Human {
        println!(
            "   {} {}",
            "Ledger:".dimmed(),
            config.ledger().path().display()
        );
    }

    info!(embedded = summary.embedded, "Embed batch complete");
    Ok(())
}
