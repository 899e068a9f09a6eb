//! Text layout of a single ledger line.
//!
//! ```text
//! 2024-05-01 09:30:15,042 INFO: Image 'cat.png' was watermarked. UUID=<id>, Folder='originals', Time=2024-05-01 09:30:15, len_wm=1000, Hash=<hex>
//! ```
//!
//! The field order is fixed. Lines are scraped with substring searches, so
//! anything that still carries `UUID=` or `len_wm=` remains usable even if the
//! rest of the line is damaged.

use serde::{Deserialize, Serialize};

use crate::payload::extract_field;

/// One embedding event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatermarkRecord {
    /// File name of the original image
    pub image_name: String,
    /// Identifier embedded in the image
    pub identifier: String,
    /// Folder the original came from
    pub folder: String,
    /// Embedding time, `%Y-%m-%d %H:%M:%S`
    pub timestamp: String,
    /// Watermark length in bits, needed for extraction
    pub bit_len: usize,
    /// Hex content hash of the original file
    pub content_hash: String,
}

impl WatermarkRecord {
    /// Render the message part of the line (everything after `INFO: `).
    pub fn to_message(&self) -> String {
        format!(
            "Image '{}' was watermarked. UUID={}, Folder='{}', Time={}, len_wm={}, Hash={}",
            self.image_name,
            self.identifier,
            self.folder,
            self.timestamp,
            self.bit_len,
            self.content_hash
        )
    }

    /// Parse a full ledger line. Returns `None` when any field is missing.
    pub fn parse(line: &str) -> Option<Self> {
        Some(Self {
            image_name: between(line, "Image '", "' was watermarked.")?.to_string(),
            identifier: parse_identifier(line)?.to_string(),
            folder: between(line, "Folder='", "', Time=")?.to_string(),
            timestamp: between(line, "Time=", ", len_wm=")?.to_string(),
            bit_len: parse_bit_len(line)?,
            content_hash: extract_field(line, "Hash").filter(|h| !h.is_empty())?,
        })
    }
}

/// Marker searched for when looking an image up by name.
pub fn image_marker(image_name: &str) -> String {
    format!("Image '{image_name}'")
}

/// The token after `UUID=`, up to the next space, without trailing commas.
pub fn parse_identifier(line: &str) -> Option<&str> {
    let start = line.find("UUID=")? + "UUID=".len();
    let rest = &line[start..];
    let end = rest.find(' ').unwrap_or(rest.len());
    let token = rest[..end].trim().trim_end_matches(',');
    (!token.is_empty()).then_some(token)
}

/// The integer after `len_wm=`.
pub fn parse_bit_len(line: &str) -> Option<usize> {
    extract_field(line, "len_wm")?.parse().ok()
}

fn between<'a>(line: &'a str, open: &str, close: &str) -> Option<&'a str> {
    let start = line.find(open)? + open.len();
    let len = line[start..].find(close)?;
    Some(&line[start..start + len])
}
