//! Provmark Core - invisible provenance watermarks for image batches
//!
//! This crate embeds a hidden, frequency-domain watermark into images and
//! keeps an append-only ledger of every embedding so extracted watermarks
//! can later be traced back and validated.
//!
//! # Features
//!
//! - Blind DWT/DCT watermark codec behind the [`Watermarker`] trait
//! - Provenance payload: time-ordered identifier, source folder, timestamp
//! - Flat-text ledger with bit-length lookup and identifier validation
//! - SHA-256 / SHA3-256 / MD5 content hashes of originals
//! - Background batch worker with progress events (`worker` feature)
//!
//! # Example
//!
//! ```no_run
//! use provmark_core::{Config, Workflow};
//!
//! # fn example() -> provmark_core::Result<()> {
//! let config = Config::from_env()?;
//! let workflow = Workflow::from_config(&config);
//!
//! let embedded = workflow.embed_image("cat.png", &config.originals_dir, &config.watermarked_dir)?;
//! let outcome = workflow.extract_image("cat.png", embedded.bit_len, &config.watermarked_dir)?;
//! assert!(outcome.validated);
//! # Ok(())
//! # }
//! ```

pub mod batch;
pub mod config;
pub mod error;
pub mod hash;
pub mod ledger;
pub mod payload;
pub mod watermark;
#[cfg(feature = "worker")]
pub mod worker;
pub mod workflow;

// Re-export main types for convenience
pub use batch::{run_batch, BatchEvent, BatchJob, BatchMode, BatchSummary};
pub use config::Config;
pub use error::{ProvmarkError, Result, SUPPORTED_EXTENSIONS, WATERMARKED_PREFIX};
pub use hash::{ContentHash, HashAlgorithm};
pub use ledger::{ExtractionLog, Ledger, WatermarkRecord};
pub use payload::{extract_field, WatermarkPayload};
pub use watermark::{DctWatermarker, WatermarkConfig, Watermarker};
pub use workflow::{
    extraction_file_name, list_images, original_name, watermarked_name, EmbedOutcome,
    ExtractOutcome, Workflow,
};

#[cfg(feature = "worker")]
pub use worker::BatchWorker;
