use std::path::{Path, PathBuf};

use super::{append_line, EXTRACTION_LOG};
use crate::error::Result;

/// Append-only record of extraction events. Write-only: nothing in the
/// crate reads it back.
#[derive(Debug, Clone)]
pub struct ExtractionLog {
    path: PathBuf,
}

impl ExtractionLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(EXTRACTION_LOG))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, image_name: &str, content: &str, timestamp: &str) -> Result<()> {
        append_line(
            &self.path,
            &format!("Watermark extracted from '{image_name}' at {timestamp}. Content: {content}"),
        )
    }
}
