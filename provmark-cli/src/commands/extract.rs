//! Extract command implementation.

use anyhow::{bail, Context, Result};
use provmark_core::{BatchJob, Config};
use tracing::{error, info};

use super::{run_job, Output};
use crate::utils::require_dir;

/// Execute the extract command.
///
/// Every image is attempted; the command fails afterwards if any watermark
/// could not be read or did not validate.
pub async fn execute(config: Config, wm_len: Option<usize>, json: bool, quiet: bool) -> Result<()> {
    require_dir(&config.watermarked_dir)?;
    config
        .ensure_dirs()
        .context("Failed to write workspace folders")?;

    let mut job = BatchJob::extract(&config.watermarked_dir);
    if let Some(bit_len) = wm_len {
        job = job.with_bit_len(bit_len);
    }

    info!(
        watermarked = %config.watermarked_dir.display(),
        wm_len = ?wm_len,
        "Starting extract batch"
    );

    let summary = run_job(&config, job, Output::new(json, quiet)).await?;

    if !summary.all_valid() {
        let invalid = summary.extracted - summary.validated + summary.failed;
        error!(invalid, extracted = summary.extracted, "Some watermarks did not validate");
        bail!(
            "Validation failed: {} of {} image(s) without a valid watermark",
            invalid,
            summary.extracted + summary.failed
        );
    }

    info!(validated = summary.validated, "Extract batch complete");
    Ok(())
}
