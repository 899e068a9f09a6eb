//! The provenance text carried inside the pixels.
//!
//! The payload is formatted like a log line so that whatever is recovered
//! from an image reads naturally to a human, and so individual fields can be
//! scraped back out with [`extract_field`].

use chrono::{Local, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Timestamp layout shared by payloads and ledger records.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const EMBED_MESSAGE: &str = "Image was watermarked.";

/// Metadata embedded into a single image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatermarkPayload {
    /// Time-ordered identifier correlating the image with its ledger record
    pub identifier: Uuid,
    /// Name of the folder the original came from
    pub folder: String,
    /// Local wall-clock time of the embedding
    pub timestamp: NaiveDateTime,
}

impl WatermarkPayload {
    pub fn new(identifier: Uuid, folder: impl Into<String>, timestamp: NaiveDateTime) -> Self {
        Self {
            identifier,
            folder: folder.into(),
            timestamp,
        }
    }

    /// Fresh payload with a new UUIDv7 stamped at the current local time.
    pub fn generate(folder: impl Into<String>) -> Self {
        Self::new(Uuid::now_v7(), folder, now_local())
    }

    pub fn timestamp_string(&self) -> String {
        self.timestamp.format(TIMESTAMP_FORMAT).to_string()
    }

    /// Render the text that gets embedded.
    pub fn to_text(&self) -> String {
        format!(
            "[{}] [WATERMARK EMBED] UUID={} Folder='{}' Message='{}'",
            self.timestamp_string(),
            self.identifier,
            self.folder,
            EMBED_MESSAGE
        )
    }

    /// Parse text produced by [`WatermarkPayload::to_text`].
    ///
    /// Returns `None` if the identifier or timestamp cannot be recovered.
    /// Folder names containing spaces are truncated at the first space.
    pub fn parse(text: &str) -> Option<Self> {
        let identifier = extract_field(text, "UUID")?.parse().ok()?;
        let folder = extract_field(text, "Folder").unwrap_or_default();

        let open = text.find('[')?;
        let close = text[open..].find(']')? + open;
        let timestamp =
            NaiveDateTime::parse_from_str(&text[open + 1..close], TIMESTAMP_FORMAT).ok()?;

        Some(Self {
            identifier,
            folder,
            timestamp,
        })
    }
}

/// Current local time truncated to whole seconds.
pub fn now_local() -> NaiveDateTime {
    let now = Local::now().naive_local();
    now.with_nanosecond(0).unwrap_or(now)
}

/// Pull the value following `key=` out of a payload or log line.
///
/// The value runs up to the next space (or the end of the text). Surrounding
/// single quotes and a trailing comma are trimmed.
pub fn extract_field(text: &str, key: &str) -> Option<String> {
    let needle = format!("{key}=");
    let start = text.find(&needle)? + needle.len();
    let rest = &text[start..];
    let end = rest.find(' ').unwrap_or(rest.len());
    let value = rest[..end]
        .trim()
        .trim_end_matches(',')
        .trim_matches('\'');
    Some(value.to_string())
}

/// Expand text into bits, UTF-8 bytes most significant bit first.
pub fn text_to_bits(text: &str) -> Vec<bool> {
    text.as_bytes()
        .iter()
        .flat_map(|byte| (0..8).rev().map(move |i| (byte >> i) & 1 == 1))
        .collect()
}

/// Pack bits back into text. Trailing bits that do not fill a byte are
/// dropped; invalid UTF-8 is replaced rather than rejected.
pub fn bits_to_text(bits: &[bool]) -> String {
    let bytes: Vec<u8> = bits
        .chunks_exact(8)
        .map(|chunk| chunk.iter().fold(0u8, |acc, &bit| (acc << 1) | bit as u8))
        .collect();
    String::from_utf8_lossy(&bytes).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed_payload() -> WatermarkPayload {
        WatermarkPayload::new(
            "0190a1b2-c3d4-7e5f-8a6b-1c2d3e4f5a6b".parse().unwrap(),
            "originals",
            NaiveDateTime::parse_from_str("2024-05-01 09:30:15", TIMESTAMP_FORMAT).unwrap(),
        )
    }

    #[test]
    fn test_payload_text_layout() {
        let text = fixed_payload().to_text();
        assert_eq!(
            text,
            "[2024-05-01 09:30:15] [WATERMARK EMBED] UUID=0190a1b2-c3d4-7e5f-8a6b-1c2d3e4f5a6b \
             Folder='originals' Message='Image was watermarked.'"
        );
    }

    #[test]
    fn test_payload_parse() {
        let payload = fixed_payload();
        let parsed = WatermarkPayload::parse(&payload.to_text()).expect("payload should parse");
        assert_eq!(parsed, payload);
    }

    #[test]
    fn test_payload_parse_garbage() {
        assert!(WatermarkPayload::parse("not a watermark").is_none());
        assert!(WatermarkPayload::parse("UUID=1234 Folder='x'").is_none());
    }

    #[test]
    fn test_generated_payloads_are_unique() {
        let a = WatermarkPayload::generate("f");
        let b = WatermarkPayload::generate("f");
        assert_ne!(a.identifier, b.identifier);
        assert_eq!(a.identifier.get_version_num(), 7);
    }

    #[test]
    fn test_extract_field_uuid() {
        let text = "UUID=1234 Folder='test_folder'";
        assert_eq!(extract_field(text, "UUID").as_deref(), Some("1234"));
    }

    #[test]
    fn test_extract_field_folder_at_end() {
        let text = "UUID=1234 Folder='test_folder'";
        assert_eq!(extract_field(text, "Folder").as_deref(), Some("test_folder"));
    }

    #[test]
    fn test_extract_field_absent() {
        let text = "UUID=1234 Folder='test_folder'";
        assert_eq!(extract_field(text, "Time"), None);
    }

    #[test]
    fn test_extract_field_trailing_comma() {
        let line = "Image 'a.png' was watermarked. UUID=abc-def, Folder='x', len_wm=8";
        assert_eq!(extract_field(line, "UUID").as_deref(), Some("abc-def"));
        assert_eq!(extract_field(line, "len_wm").as_deref(), Some("8"));
    }

    #[test]
    fn test_bits_layout() {
        assert_eq!(
            text_to_bits("A"),
            vec![false, true, false, false, false, false, false, true]
        );
        assert_eq!(text_to_bits("héllo").len(), 6 * 8);
    }

    #[test]
    fn test_bits_to_text_ignores_partial_byte() {
        let mut bits = text_to_bits("ok");
        bits.extend([true, false, true]);
        assert_eq!(bits_to_text(&bits), "ok");
    }

    #[test]
    fn test_bits_to_text_lossy() {
        let bits = vec![true; 8];
        assert_eq!(bits_to_text(&bits), "\u{FFFD}");
    }
}
