//! Folder-wide embed and extract batches.
//!
//! A batch walks the supported images of one folder in name order and
//! reports every step through a callback, so callers can drive progress
//! output without the batch knowing who is listening.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{ProvmarkError, Result};
use crate::watermark::Watermarker;
use crate::workflow::{list_images, original_name, EmbedOutcome, ExtractOutcome, Workflow};

/// Which folder-wide operation to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchMode {
    Embed,
    Extract,
}

impl fmt::Display for BatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Embed => write!(f, "embed"),
            Self::Extract => write!(f, "extract"),
        }
    }
}

impl FromStr for BatchMode {
    type Err = ProvmarkError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "embed" => Ok(Self::Embed),
            "extract" => Ok(Self::Extract),
            other => Err(ProvmarkError::Config(format!(
                "Invalid mode '{other}'. Use 'embed' or 'extract'."
            ))),
        }
    }
}

/// A batch to run.
#[derive(Debug, Clone)]
pub struct BatchJob {
    pub mode: BatchMode,
    /// Source of originals (embed only)
    pub originals_dir: PathBuf,
    /// Destination of embed, source of extract
    pub watermarked_dir: PathBuf,
    /// Fixed bit length for every extraction instead of the ledger lookup
    pub bit_len_override: Option<usize>,
}

impl BatchJob {
    pub fn embed(originals_dir: impl Into<PathBuf>, watermarked_dir: impl Into<PathBuf>) -> Self {
        Self {
            mode: BatchMode::Embed,
            originals_dir: originals_dir.into(),
            watermarked_dir: watermarked_dir.into(),
            bit_len_override: None,
        }
    }

    pub fn extract(watermarked_dir: impl Into<PathBuf>) -> Self {
        let watermarked_dir = watermarked_dir.into();
        Self {
            mode: BatchMode::Extract,
            originals_dir: watermarked_dir.clone(),
            watermarked_dir,
            bit_len_override: None,
        }
    }

    pub fn with_bit_len(mut self, bit_len: usize) -> Self {
        self.bit_len_override = Some(bit_len);
        self
    }
}

/// Progress notifications emitted while a batch runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum BatchEvent {
    Started {
        mode: BatchMode,
        total: usize,
    },
    /// About to process image `index` of `total` (1-based)
    Processing {
        index: usize,
        total: usize,
        image: String,
    },
    Embedded(EmbedOutcome),
    Extracted(ExtractOutcome),
    /// Image left untouched, e.g. no bit length on record
    Skipped {
        image: String,
        reason: String,
    },
    /// Error that aborted the batch
    Failed {
        image: Option<String>,
        error: String,
    },
    Finished(BatchSummary),
}

/// Counters for a completed batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total: usize,
    pub embedded: usize,
    pub extracted: usize,
    pub validated: usize,
    pub skipped: usize,
    /// Extractions that returned no result
    pub failed: usize,
}

impl BatchSummary {
    /// True when every processed extraction validated and nothing failed.
    pub fn all_valid(&self) -> bool {
        self.failed == 0 && self.validated == self.extracted
    }
}

/// Run `job` to completion, one image at a time.
///
/// Errors other than per-image extraction failures stop the batch; they are
/// announced with [`BatchEvent::Failed`] before being returned.
pub fn run_batch<W: Watermarker>(
    workflow: &Workflow<W>,
    job: &BatchJob,
    on_event: &mut impl FnMut(BatchEvent),
) -> Result<BatchSummary> {
    let mut current = None;
    let result = run_images(workflow, job, &mut current, on_event);
    if let Err(e) = &result {
        on_event(BatchEvent::Failed {
            image: current,
            error: e.to_string(),
        });
    }
    result
}

fn run_images<W: Watermarker>(
    workflow: &Workflow<W>,
    job: &BatchJob,
    current: &mut Option<String>,
    on_event: &mut impl FnMut(BatchEvent),
) -> Result<BatchSummary> {
    let source = match job.mode {
        BatchMode::Embed => &job.originals_dir,
        BatchMode::Extract => &job.watermarked_dir,
    };
    let images = list_images(source)?;
    let total = images.len();

    info!(mode = %job.mode, total, dir = %source.display(), "Starting batch");
    on_event(BatchEvent::Started {
        mode: job.mode,
        total,
    });

    let mut summary = BatchSummary {
        total,
        ..BatchSummary::default()
    };

    for (i, image) in images.iter().enumerate() {
        *current = Some(image.clone());
        on_event(BatchEvent::Processing {
            index: i + 1,
            total,
            image: image.clone(),
        });

        match job.mode {
            BatchMode::Embed => {
                let outcome = workflow
                    .embed_image(image, &job.originals_dir, &job.watermarked_dir)?;
                summary.embedded += 1;
                on_event(BatchEvent::Embedded(outcome));
            }
            BatchMode::Extract => {
                let original = original_name(image);
                let bit_len = match job.bit_len_override {
                    Some(bit_len) => Some(bit_len),
                    None => workflow.ledger().lookup_bit_len(original)?,
                };

                let Some(bit_len) = bit_len else {
                    warn!(image = original, "No watermark length found, skipping extraction");
                    summary.skipped += 1;
                    on_event(BatchEvent::Skipped {
                        image: image.clone(),
                        reason: format!("no watermark length found for {original}"),
                    });
                    continue;
                };

                let outcome = workflow
                    .extract_image(image, bit_len, &job.watermarked_dir)?;
                if outcome.extracted.is_some() {
                    summary.extracted += 1;
                } else {
                    summary.failed += 1;
                }
                if outcome.validated {
                    summary.validated += 1;
                }
                on_event(BatchEvent::Extracted(outcome));
            }
        }
    }

    info!(
        mode = %job.mode,
        embedded = summary.embedded,
        extracted = summary.extracted,
        validated = summary.validated,
        skipped = summary.skipped,
        failed = summary.failed,
        "Batch complete"
    );
    on_event(BatchEvent::Finished(summary));

    Ok(summary)
}
