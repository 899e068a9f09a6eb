//! Per-image embed and extract operations.
//!
//! Embedding reads an original, stamps it with a fresh
//! [`WatermarkPayload`], writes `watermarked_<name>` and appends a ledger
//! record. Extraction reads the mark back with the bit length from the
//! ledger and checks the recovered identifier against it.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::error::{Result, SUPPORTED_EXTENSIONS, WATERMARKED_PREFIX};
use crate::hash::{ContentHash, HashAlgorithm};
use crate::ledger::{ExtractionLog, Ledger, WatermarkRecord};
use crate::payload::{extract_field, now_local, WatermarkPayload, TIMESTAMP_FORMAT};
use crate::watermark::{read_image, write_image, DctWatermarker, Watermarker};

/// Result of embedding one image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbedOutcome {
    pub image_name: String,
    pub output_path: PathBuf,
    pub identifier: Uuid,
    pub bit_len: usize,
    pub content_hash: String,
}

/// Result of extracting from one image.
///
/// A failed extraction is not an error: it comes back with `extracted` set
/// to `None` and `validated` set to `false`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractOutcome {
    pub image_name: String,
    /// `[<time>] [WATERMARK EXTRACT] Extracted Watermark: <text>`
    pub extracted: Option<String>,
    /// Raw recovered text
    pub content: Option<String>,
    /// Identifier parsed from the recovered text
    pub identifier: Option<String>,
    /// Whether the identifier is present in the ledger
    pub validated: bool,
}

impl ExtractOutcome {
    fn failed(image_name: &str) -> Self {
        Self {
            image_name: image_name.to_string(),
            extracted: None,
            content: None,
            identifier: None,
            validated: false,
        }
    }
}

/// A watermark codec bound to a ledger.
pub struct Workflow<W = DctWatermarker> {
    watermarker: W,
    ledger: Ledger,
    extraction_log: ExtractionLog,
    hash_algorithm: HashAlgorithm,
}

impl Workflow<DctWatermarker> {
    /// Default codec with the ledger and settings from `config`.
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            DctWatermarker::new(config.watermark),
            config.ledger(),
            config.extraction_log(),
        )
        .with_hash_algorithm(config.hash_algorithm)
    }
}

impl<W: Watermarker> Workflow<W> {
    pub fn new(watermarker: W, ledger: Ledger, extraction_log: ExtractionLog) -> Self {
        Self {
            watermarker,
            ledger,
            extraction_log,
            hash_algorithm: HashAlgorithm::default(),
        }
    }

    pub fn with_hash_algorithm(mut self, algorithm: HashAlgorithm) -> Self {
        self.hash_algorithm = algorithm;
        self
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn watermarker(&self) -> &W {
        &self.watermarker
    }

    /// Watermark `originals_dir/image_name` into
    /// `watermarked_dir/watermarked_<image_name>` and record it.
    pub fn embed_image(
        &self,
        image_name: &str,
        originals_dir: &Path,
        watermarked_dir: &Path,
    ) -> Result<EmbedOutcome> {
        let original_path = originals_dir.join(image_name);
        let output_path = watermarked_dir.join(watermarked_name(image_name));
        debug!(
            original = %original_path.display(),
            output = %output_path.display(),
            "Embedding watermark"
        );

        let payload = WatermarkPayload::generate(folder_name(originals_dir));
        let text = payload.to_text();
        debug!(payload = %text, "Watermark text");

        let image = read_image(&original_path)?;
        let (marked, bit_len) = self.watermarker.embed_text(&image, &text)?;

        std::fs::create_dir_all(watermarked_dir)?;
        write_image(&marked, &output_path)?;

        let content_hash = ContentHash::of_file(&original_path, self.hash_algorithm)?;
        debug!(
            algorithm = self.hash_algorithm.name(),
            hash = %content_hash,
            "Hashed original"
        );

        self.ledger.append(&WatermarkRecord {
            image_name: image_name.to_string(),
            identifier: payload.identifier.to_string(),
            folder: payload.folder.clone(),
            timestamp: payload.timestamp_string(),
            bit_len,
            content_hash: content_hash.hex.clone(),
        })?;

        info!(image = image_name, bit_len, "Watermark embedded");

        Ok(EmbedOutcome {
            image_name: image_name.to_string(),
            output_path,
            identifier: payload.identifier,
            bit_len,
            content_hash: content_hash.hex,
        })
    }

    /// Extract the watermark from `watermarked_dir/watermarked_<image_name>`
    /// and validate it. A name that already carries the prefix is taken as
    /// the file name itself, so batches can pass listed files straight in.
    ///
    /// Decode and extraction failures are logged and reported through the
    /// outcome; only ledger write failures surface as `Err`.
    pub fn extract_image(
        &self,
        image_name: &str,
        bit_len: usize,
        watermarked_dir: &Path,
    ) -> Result<ExtractOutcome> {
        let file_name = extraction_file_name(image_name);
        let image_name = original_name(&file_name);
        let path = watermarked_dir.join(&file_name);
        debug!(path = %path.display(), bit_len, "Extracting watermark");

        let content = match read_image(&path)
            .and_then(|image| self.watermarker.extract_text(&image, bit_len))
        {
            Ok(content) => content,
            Err(e) => {
                error!(image = image_name, error = %e, "Error during extraction");
                return Ok(ExtractOutcome::failed(image_name));
            }
        };

        let timestamp = now_local().format(TIMESTAMP_FORMAT).to_string();
        self.extraction_log.append(image_name, &content, &timestamp)?;

        let identifier = extract_field(&content, "UUID");
        let validated = identifier
            .as_deref()
            .map(|id| self.ledger.validate(id))
            .unwrap_or(false);

        if validated {
            info!(image = image_name, identifier = ?identifier, "Validation successful");
        } else {
            warn!(image = image_name, identifier = ?identifier, "Validation failed");
        }

        Ok(ExtractOutcome {
            image_name: image_name.to_string(),
            extracted: Some(format!(
                "[{timestamp}] [WATERMARK EXTRACT] Extracted Watermark: {content}"
            )),
            content: Some(content),
            identifier,
            validated,
        })
    }
}

/// Output name for an embedded original. The prefix is always added, even to
/// names that already start with it, so output never replaces its source.
pub fn watermarked_name(image_name: &str) -> String {
    format!("{WATERMARKED_PREFIX}{image_name}")
}

/// File an extraction reads: `image_name` itself when it already carries
/// the prefix, [`watermarked_name`] otherwise.
pub fn extraction_file_name(image_name: &str) -> String {
    if image_name.starts_with(WATERMARKED_PREFIX) {
        image_name.to_string()
    } else {
        watermarked_name(image_name)
    }
}

/// Name the original had before [`watermarked_name`]. Strips exactly one
/// prefix.
pub fn original_name(watermarked: &str) -> &str {
    watermarked
        .strip_prefix(WATERMARKED_PREFIX)
        .unwrap_or(watermarked)
}

/// Whether `name` has one of the supported image extensions.
pub fn is_supported_image(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            SUPPORTED_EXTENSIONS
                .iter()
                .any(|supported| ext.eq_ignore_ascii_case(supported))
        })
        .unwrap_or(false)
}

/// Supported image files directly inside `dir`, sorted by name.
pub fn list_images(dir: &Path) -> Result<Vec<String>> {
    let mut images = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        match entry.file_name().into_string() {
            Ok(name) if is_supported_image(&name) => images.push(name),
            Ok(_) => {}
            Err(name) => warn!(name = ?name, "Skipping file with non UTF-8 name"),
        }
    }
    images.sort();
    Ok(images)
}

/// Basename of the folder originals are read from.
fn folder_name(dir: &Path) -> String {
    dir.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .or_else(|| {
            dir.canonicalize()
                .ok()
                .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
        })
        .unwrap_or_default()
}
