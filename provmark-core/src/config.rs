//! Workspace configuration
//!
//! Resolves the image folders and log directory from environment variables
//! with defaults relative to a base directory.

use std::path::{Path, PathBuf};

use crate::error::{ProvmarkError, Result};
use crate::hash::HashAlgorithm;
use crate::ledger::{ExtractionLog, Ledger, DEBUG_LOG};
use crate::watermark::WatermarkConfig;

/// Folder layout and codec settings
#[derive(Debug, Clone)]
pub struct Config {
    /// Originals to be watermarked (default: images/originals)
    pub originals_dir: PathBuf,
    /// Output of the embed batch, input of the extract batch (default: images/watermarked)
    pub watermarked_dir: PathBuf,
    /// Reserved for extracted artefacts (default: images/extracted)
    pub extracted_dir: PathBuf,
    /// Ledger and extraction log location (default: logs)
    pub log_dir: PathBuf,
    /// Content hash algorithm for new records (default: sha256)
    pub hash_algorithm: HashAlgorithm,
    /// Watermark codec settings
    pub watermark: WatermarkConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self::with_base(Path::new("."))
    }
}

impl Config {
    /// Default layout rooted at `base`.
    pub fn with_base(base: &Path) -> Self {
        Self {
            originals_dir: base.join("images").join("originals"),
            watermarked_dir: base.join("images").join("watermarked"),
            extracted_dir: base.join("images").join("extracted"),
            log_dir: base.join("logs"),
            hash_algorithm: HashAlgorithm::default(),
            watermark: WatermarkConfig::default(),
        }
    }

    /// Load configuration from environment variables
    ///
    /// - `PROVMARK_HOME`: base directory (default: current directory)
    /// - `PROVMARK_ORIGINALS_DIR`, `PROVMARK_WATERMARKED_DIR`,
    ///   `PROVMARK_EXTRACTED_DIR`, `PROVMARK_LOG_DIR`: folder overrides
    /// - `PROVMARK_STRENGTH`: quantisation step (positive number)
    /// - `PROVMARK_HASH`: `sha256`, `sha3-256` or `md5`
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let base = lookup("PROVMARK_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));
        let mut config = Self::with_base(&base);

        if let Some(dir) = lookup("PROVMARK_ORIGINALS_DIR") {
            config.originals_dir = dir.into();
        }
        if let Some(dir) = lookup("PROVMARK_WATERMARKED_DIR") {
            config.watermarked_dir = dir.into();
        }
        if let Some(dir) = lookup("PROVMARK_EXTRACTED_DIR") {
            config.extracted_dir = dir.into();
        }
        if let Some(dir) = lookup("PROVMARK_LOG_DIR") {
            config.log_dir = dir.into();
        }

        if let Some(strength) = lookup("PROVMARK_STRENGTH") {
            config.watermark.strength = parse_strength(&strength)?;
        }

        if let Some(algorithm) = lookup("PROVMARK_HASH") {
            config.hash_algorithm = algorithm.parse()?;
        }

        Ok(config)
    }

    /// Create every configured directory.
    pub fn ensure_dirs(&self) -> Result<()> {
        for dir in [
            &self.originals_dir,
            &self.watermarked_dir,
            &self.extracted_dir,
            &self.log_dir,
        ] {
            std::fs::create_dir_all(dir)?;
        }
        Ok(())
    }

    pub fn ledger(&self) -> Ledger {
        Ledger::in_dir(&self.log_dir)
    }

    pub fn extraction_log(&self) -> ExtractionLog {
        ExtractionLog::in_dir(&self.log_dir)
    }

    /// Destination of the full debug trace.
    pub fn debug_log_path(&self) -> PathBuf {
        self.log_dir.join(DEBUG_LOG)
    }
}

/// Parse a quantisation step, rejecting zero, negatives and NaN.
pub fn parse_strength(value: &str) -> Result<f32> {
    match value.trim().parse::<f32>() {
        Ok(strength) if strength.is_finite() && strength > 0.0 => Ok(strength),
        _ => Err(ProvmarkError::Config(format!(
            "Invalid watermark strength: {value}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.originals_dir, PathBuf::from("./images/originals"));
        assert_eq!(config.log_dir, PathBuf::from("./logs"));
        assert_eq!(config.hash_algorithm, HashAlgorithm::Sha256);
        assert_eq!(config.watermark, WatermarkConfig::default());
    }

    #[test]
    fn test_home_and_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("PROVMARK_HOME", "/srv/marks"),
            ("PROVMARK_LOG_DIR", "/var/log/provmark"),
            ("PROVMARK_STRENGTH", "48"),
            ("PROVMARK_HASH", "sha3-256"),
        ]))
        .unwrap();

        assert_eq!(config.watermarked_dir, PathBuf::from("/srv/marks/images/watermarked"));
        assert_eq!(config.log_dir, PathBuf::from("/var/log/provmark"));
        assert_eq!(config.watermark.strength, 48.0);
        assert_eq!(config.hash_algorithm, HashAlgorithm::Sha3_256);
        assert_eq!(
            config.ledger().path(),
            Path::new("/var/log/provmark/watermark_log.log")
        );
    }

    #[test]
    fn test_invalid_values() {
        assert!(Config::from_lookup(lookup_from(&[("PROVMARK_STRENGTH", "0")])).is_err());
        assert!(Config::from_lookup(lookup_from(&[("PROVMARK_STRENGTH", "NaN")])).is_err());
        assert!(Config::from_lookup(lookup_from(&[("PROVMARK_HASH", "crc32")])).is_err());
    }

    #[test]
    fn test_ensure_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::with_base(dir.path());
        config.ensure_dirs().unwrap();
        assert!(config.originals_dir.is_dir());
        assert!(config.extracted_dir.is_dir());
        assert!(config.log_dir.is_dir());
        assert_eq!(config.debug_log_path(), dir.path().join("logs").join("debug_log.log"));
    }
}
