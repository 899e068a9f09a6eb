//! Subcommand implementations.

pub mod embed;
pub mod extract;
pub mod validate;

use std::sync::Arc;

use anyhow::{Context, Result};
use colored::Colorize;
use provmark_core::{BatchEvent, BatchJob, BatchMode, BatchSummary, BatchWorker, Config, Workflow};
use tracing::debug;

/// How batch progress is shown on stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Output {
    Human,
    Json,
    Quiet,
}

impl Output {
    pub fn new(json: bool, quiet: bool) -> Self {
        match (json, quiet) {
            (true, _) => Self::Json,
            (false, true) => Self::Quiet,
            (false, false) => Self::Human,
        }
    }
}

/// Run `job` on the background worker and render its events as they arrive.
pub async fn run_job(config: &Config, job: BatchJob, output: Output) -> Result<BatchSummary> {
    let mode = job.mode;
    let workflow = Arc::new(Workflow::from_config(config));
    let (handle, mut events) = BatchWorker::spawn(workflow, job);

    while let Some(event) = events.recv().await {
        render(&event, output)?;
    }

    let summary = handle
        .await
        .context("Batch worker panicked")?
        .with_context(|| format!("{} batch aborted", capitalized(mode)))?;
    debug!(?summary, "Batch finished");
    Ok(summary)
}

fn capitalized(mode: BatchMode) -> &'static str {
    match mode {
        BatchMode::Embed => "Embedding",
        BatchMode::Extract => "Extraction",
    }
}

fn render(event: &BatchEvent, output: Output) -> Result<()> {
    match output {
        Output::Quiet => Ok(()),
        Output::Json => {
            let line = serde_json::to_string(event).context("Failed to serialize event")?;
            println!("{line}");
            Ok(())
        }
        Output::Human => {
            render_human(event);
            Ok(())
        }
    }
}

fn render_human(event: &BatchEvent) {
    match event {
        BatchEvent::Started { mode, total } => {
            println!(
                "{} {} image(s) to {}",
                "Found".cyan().bold(),
                total,
                mode
            );
        }
        BatchEvent::Processing {
            index,
            total,
            image,
        } => {
            println!("Processing: {} ({}/{})", image.bold(), index, total);
        }
        BatchEvent::Embedded(outcome) => {
            println!(
                "   {} {}",
                "Saved:".dimmed(),
                outcome.output_path.display()
            );
            println!("   {} {}", "UUID:".dimmed(), outcome.identifier);
            println!("   {} {} bits", "Length:".dimmed(), outcome.bit_len);
        }
        BatchEvent::Extracted(outcome) => match &outcome.extracted {
            Some(line) => {
                println!("   {}", line);
                if outcome.validated {
                    println!(
                        "   {} {}",
                        "Validation:".dimmed(),
                        "Watermark is valid".green().bold()
                    );
                } else {
                    println!(
                        "   {} {}",
                        "Validation:".dimmed(),
                        "Watermark is NOT valid".red().bold()
                    );
                }
            }
            None => {
                println!(
                    "   {} {}",
                    "Extraction:".dimmed(),
                    "No watermark could be read".red()
                );
            }
        },
        BatchEvent::Skipped { image, reason } => {
            println!("   {} {}: {}", "Skipped".yellow(), image, reason);
        }
        BatchEvent::Failed { image, error } => match image {
            Some(image) => println!("   {} {}: {}", "Failed".red().bold(), image, error),
            None => println!("   {} {}", "Failed".red().bold(), error),
        },
        BatchEvent::Finished(summary) => {
            println!();
            println!(
                "{} {} embedded, {} extracted, {} validated, {} skipped, {} failed",
                "Done:".green().bold(),
                summary.embedded,
                summary.extracted,
                summary.validated,
                summary.skipped,
                summary.failed
            );
        }
    }
}
