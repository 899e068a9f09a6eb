//! Invisible watermarking of image pixel data.
//!
//! The rest of the crate only talks to the [`Watermarker`] trait; the bit
//! format on the pixels belongs entirely to the implementation.
//!
//! # Components
//!
//! - **Transforms**: Haar DWT and 4×4 DCT building blocks.
//! - **Keystream**: keyed shuffling and whitening.
//! - **DCT watermarker**: the default blind watermark codec.

pub mod dct;
pub mod keystream;
pub mod transform;

use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat};

use crate::error::Result;
use crate::payload::{bits_to_text, text_to_bits};

pub use dct::{DctWatermarker, WatermarkConfig};

/// Quality used when a watermarked image is written as JPEG.
pub const JPEG_QUALITY: u8 = 95;

/// Trait for watermark codecs.
///
/// Implementations must be thread-safe (`Send + Sync`) since batches run on
/// a background worker.
pub trait Watermarker: Send + Sync {
    /// Embed `bits` into a copy of `image`.
    fn embed(&self, image: &DynamicImage, bits: &[bool]) -> Result<DynamicImage>;

    /// Recover `bit_len` bits from a watermarked image.
    ///
    /// Extraction is blind: the original image is not needed, but the exact
    /// bit length recorded at embed time is.
    fn extract(&self, image: &DynamicImage, bit_len: usize) -> Result<Vec<bool>>;

    /// Embed a string watermark. Returns the image and the bit length that
    /// must be kept for extraction.
    fn embed_text(&self, image: &DynamicImage, text: &str) -> Result<(DynamicImage, usize)> {
        let bits = text_to_bits(text);
        let marked = self.embed(image, &bits)?;
        Ok((marked, bits.len()))
    }

    /// Extract a string watermark of `bit_len` bits.
    fn extract_text(&self, image: &DynamicImage, bit_len: usize) -> Result<String> {
        Ok(bits_to_text(&self.extract(image, bit_len)?))
    }
}

/// Decode an image from disk.
pub fn read_image(path: &Path) -> Result<DynamicImage> {
    Ok(image::open(path)?)
}

/// Write an image, picking the encoder from the file extension.
///
/// JPEG output uses [`JPEG_QUALITY`] instead of the encoder default so the
/// mark is not immediately degraded by the save itself.
pub fn write_image(image: &DynamicImage, path: &Path) -> Result<()> {
    match ImageFormat::from_path(path)? {
        ImageFormat::Jpeg => {
            let file = std::fs::File::create(path)?;
            let encoder =
                JpegEncoder::new_with_quality(std::io::BufWriter::new(file), JPEG_QUALITY);
            DynamicImage::ImageRgb8(image.to_rgb8()).write_with_encoder(encoder)?;
        }
        format => image.save_with_format(path, format)?,
    }
    Ok(())
}
