//! Append-only text ledger of watermark embeddings.
//!
//! The ledger is a flat, human-readable log with one line per embedded
//! image. It is never rewritten: records are appended at embed time and
//! read back by linear scan, either to find the bit length an image was
//! marked with or to confirm that an extracted identifier was issued here.
//!
//! Appends hold an exclusive advisory lock on the file and scans hold a
//! shared one, so a batch embedding into the ledger cannot interleave
//! half-written lines with a concurrent reader.

mod extraction;
pub mod record;

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, ErrorKind, Write};
use std::path::{Path, PathBuf};

use chrono::Local;
use fs2::FileExt;
use tracing::{debug, info, warn};

use crate::error::Result;

pub use extraction::ExtractionLog;
pub use record::WatermarkRecord;

/// File name of the embedding ledger inside the log directory.
pub const WATERMARK_LOG: &str = "watermark_log.log";

/// File name of the extraction log inside the log directory.
pub const EXTRACTION_LOG: &str = "extraction_log.log";

/// File name of the diagnostic trace written next to the ledger.
pub const DEBUG_LOG: &str = "debug_log.log";

/// Append a single `<time> INFO: <message>` line, creating parent
/// directories as needed. Line breaks inside `message` are flattened so one
/// event always maps to one line.
pub(crate) fn append_line(path: &Path, message: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let line = format!(
        "{} INFO: {}\n",
        Local::now().format("%Y-%m-%d %H:%M:%S,%3f"),
        message.replace(['\n', '\r'], " ")
    );

    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    FileExt::lock_exclusive(&file)?;
    let written = file.write_all(line.as_bytes()).and_then(|_| file.flush());
    FileExt::unlock(&file)?;
    written?;
    Ok(())
}

/// The embedding ledger (`watermark_log.log`).
#[derive(Debug, Clone)]
pub struct Ledger {
    path: PathBuf,
}

impl Ledger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Ledger stored under `dir` with the standard file name.
    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(WATERMARK_LOG))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record. No uniqueness check is made; identifiers are
    /// trusted to be unique.
    pub fn append(&self, record: &WatermarkRecord) -> Result<()> {
        append_line(&self.path, &record.to_message())?;
        info!(
            image = %record.image_name,
            identifier = %record.identifier,
            bit_len = record.bit_len,
            "Recorded watermark"
        );
        Ok(())
    }

    /// Visit lines in order until `f` returns `Some`.
    ///
    /// A missing ledger behaves like an empty one. Lines that are not valid
    /// UTF-8 are decoded lossily instead of aborting the scan.
    fn scan<T>(&self, mut f: impl FnMut(&str) -> Option<T>) -> Result<Option<T>> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "Ledger does not exist yet");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        FileExt::lock_shared(&file)?;
        let result = Self::scan_reader(BufReader::new(&file), &mut f);
        FileExt::unlock(&file)?;
        result
    }

    fn scan_reader<T>(
        mut reader: impl BufRead,
        f: &mut impl FnMut(&str) -> Option<T>,
    ) -> Result<Option<T>> {
        let mut buf = Vec::new();
        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf)? == 0 {
                return Ok(None);
            }
            let line = String::from_utf8_lossy(&buf);
            if let Some(found) = f(line.trim_end()) {
                return Ok(Some(found));
            }
        }
    }

    /// Bit length recorded for `image_name`.
    ///
    /// Matches on the substring `Image '<name>'`; if the same name was
    /// embedded more than once, the first record wins.
    pub fn lookup_bit_len(&self, image_name: &str) -> Result<Option<usize>> {
        let marker = record::image_marker(image_name);
        self.scan(|line| {
            if line.contains(&marker) {
                record::parse_bit_len(line)
            } else {
                None
            }
        })
    }

    /// Full record for `image_name`, first match wins.
    pub fn lookup(&self, image_name: &str) -> Result<Option<WatermarkRecord>> {
        let marker = record::image_marker(image_name);
        self.scan(|line| {
            if line.contains(&marker) {
                WatermarkRecord::parse(line)
            } else {
                None
            }
        })
    }

    /// Record whose identifier is exactly `identifier`.
    ///
    /// Lines that match the identifier but are otherwise malformed are
    /// skipped; use [`Ledger::validate`] for a bare token check.
    pub fn find_by_identifier(&self, identifier: &str) -> Result<Option<WatermarkRecord>> {
        if identifier.is_empty() {
            return Ok(None);
        }
        self.scan(|line| {
            if record::parse_identifier(line) == Some(identifier) {
                WatermarkRecord::parse(line)
            } else {
                None
            }
        })
    }

    /// Whether `identifier` was ever issued.
    ///
    /// Never fails: an empty identifier, a missing or unreadable ledger and
    /// a ledger without a matching line all yield `false`.
    pub fn validate(&self, identifier: &str) -> bool {
        if identifier.is_empty() {
            return false;
        }

        match self.scan(|line| (record::parse_identifier(line) == Some(identifier)).then_some(())) {
            Ok(Some(())) => {
                debug!(identifier, "Identifier found in ledger");
                true
            }
            Ok(None) => {
                debug!(identifier, "No matching identifier in ledger");
                false
            }
            Err(e) => {
                warn!(error = %e, path = %self.path.display(), "Failed to read ledger");
                false
            }
        }
    }

    /// Every parsable record, in ledger order.
    pub fn records(&self) -> Result<Vec<WatermarkRecord>> {
        let mut records = Vec::new();
        self.scan(|line| {
            records.extend(WatermarkRecord::parse(line));
            None::<()>
        })?;
        Ok(records)
    }
}
