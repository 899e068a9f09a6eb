//! Blind DWT/DCT watermark with quantisation index modulation.
//!
//! # Algorithm
//!
//! 1. Compute BT.601 luma for every pixel.
//! 2. Tile the image into 8×8 blocks (partial edge blocks are left alone) and
//!    visit them in a keyed random order.
//! 3. For each block: Haar DWT, DCT of the LL band, then snap the DC
//!    coefficient onto one of two interleaved lattices of step `strength`
//!    according to the bit being embedded.
//! 4. Invert both transforms and add the luma change to the RGB channels.
//!    Alpha is untouched, and so is chroma unless a channel saturates; the
//!    share a saturated channel cannot take moves to the others.
//!
//! Bits are repeated cyclically over every available block; extraction takes
//! a majority vote per bit, which is what lets the mark survive moderate
//! JPEG re-encoding.

use image::{DynamicImage, Rgba, RgbaImage};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::keystream::{permutation, whiten};
use super::transform::{dct2, haar_forward, haar_inverse, idct2, Block, BLOCK_SIZE};
use super::Watermarker;
use crate::error::{ProvmarkError, Result};

/// BT.601 luma weights.
const LUMA: [f32; 3] = [0.299, 0.587, 0.114];

/// DC coefficient of a block at full-scale luma.
const DC_MAX: f32 = 255.0 * BLOCK_SIZE as f32;

/// Tuning knobs for [`DctWatermarker`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WatermarkConfig {
    /// Quantisation step on the DC coefficient. Larger is more robust and
    /// more visible.
    pub strength: f32,
    /// Key for the block shuffle
    pub image_key: u64,
    /// Key for payload whitening
    pub payload_key: u64,
}

impl Default for WatermarkConfig {
    fn default() -> Self {
        Self {
            strength: 36.0,
            image_key: 1,
            payload_key: 1,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct DctWatermarker {
    config: WatermarkConfig,
}

impl DctWatermarker {
    pub fn new(config: WatermarkConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &WatermarkConfig {
        &self.config
    }

    /// Number of bits one copy of the payload may occupy in an image of the
    /// given size.
    pub fn capacity(width: u32, height: u32) -> usize {
        (width as usize / BLOCK_SIZE) * (height as usize / BLOCK_SIZE)
    }

    fn check_capacity(&self, width: u32, height: u32, bit_len: usize) -> Result<usize> {
        if bit_len == 0 {
            return Err(ProvmarkError::EmptyWatermark);
        }
        let available = Self::capacity(width, height);
        if available < bit_len {
            return Err(ProvmarkError::CapacityExceeded {
                needed: bit_len,
                available,
            });
        }
        Ok(available)
    }

    /// Lattice point for `bit` nearest to `coefficient`, preferring points
    /// a block can actually reach.
    fn embed_bit(&self, coefficient: f32, bit: bool) -> f32 {
        let step = self.config.strength;
        let offset = if bit { 0.75 } else { 0.25 };
        let base = (coefficient / step).floor();
        let rank = |target: f32| {
            (
                !(0.0..=DC_MAX).contains(&target),
                (target - coefficient).abs(),
            )
        };

        [base - 1.0, base, base + 1.0]
            .into_iter()
            .map(|k| (k + offset) * step)
            .min_by(|&a, &b| {
                let (ra, rb) = (rank(a), rank(b));
                ra.0.cmp(&rb.0).then(ra.1.total_cmp(&rb.1))
            })
            .unwrap_or(coefficient)
    }

    fn read_bit(&self, coefficient: f32) -> bool {
        (coefficient / self.config.strength).rem_euclid(1.0) >= 0.5
    }
}

fn luma_plane(rgba: &RgbaImage) -> Vec<f32> {
    rgba.pixels()
        .map(|p| LUMA[0] * p[0] as f32 + LUMA[1] * p[1] as f32 + LUMA[2] * p[2] as f32)
        .collect()
}

/// Move the luma of `pixel` by `delta`.
///
/// Every channel gets the same shift until one clips at 0 or 255; the part
/// it could not take is spread over the channels still free.
fn shift_luma(pixel: &mut Rgba<u8>, delta: f32) {
    let mut values = [pixel[0] as f32, pixel[1] as f32, pixel[2] as f32];
    let mut free = [true; 3];
    let mut remaining = delta;

    for _ in 0..3 {
        let weight: f32 = (0..3).filter(|&c| free[c]).map(|c| LUMA[c]).sum();
        if remaining.abs() < 1e-3 || weight <= 0.0 {
            break;
        }
        let share = remaining / weight;
        remaining = 0.0;
        let active = free;
        for c in (0..3).filter(|&c| active[c]) {
            let target = values[c] + share;
            let clipped = target.clamp(0.0, 255.0);
            if clipped != target {
                remaining += (target - clipped) * LUMA[c];
                free[c] = false;
            }
            values[c] = clipped;
        }
    }

    for (channel, value) in values.into_iter().enumerate() {
        pixel[channel] = value.round() as u8;
    }
}

fn read_block(luma: &[f32], width: usize, bx: usize, by: usize) -> Block {
    let mut block = [[0.0; BLOCK_SIZE]; BLOCK_SIZE];
    for (dy, row) in block.iter_mut().enumerate() {
        let offset = (by * BLOCK_SIZE + dy) * width + bx * BLOCK_SIZE;
        row.copy_from_slice(&luma[offset..offset + BLOCK_SIZE]);
    }
    block
}

fn dc_coefficient(block: &Block) -> f32 {
    dct2(&haar_forward(block).ll)[0][0]
}

impl Watermarker for DctWatermarker {
    fn embed(&self, image: &DynamicImage, bits: &[bool]) -> Result<DynamicImage> {
        let mut rgba = image.to_rgba8();
        let (width, height) = rgba.dimensions();
        let blocks = self.check_capacity(width, height, bits.len())?;

        let stride = width as usize;
        let blocks_per_row = stride / BLOCK_SIZE;
        let luma = luma_plane(&rgba);
        let scrambled = whiten(bits, self.config.payload_key);
        let order = permutation(blocks, self.config.image_key);

        for (slot, &index) in order.iter().enumerate() {
            let (bx, by) = (index % blocks_per_row, index / blocks_per_row);
            let original = read_block(&luma, stride, bx, by);

            let mut bands = haar_forward(&original);
            let mut coeffs = dct2(&bands.ll);
            coeffs[0][0] = self.embed_bit(coeffs[0][0], scrambled[slot % scrambled.len()]);
            bands.ll = idct2(&coeffs);
            let marked = haar_inverse(&bands);

            for dy in 0..BLOCK_SIZE {
                for dx in 0..BLOCK_SIZE {
                    let delta = marked[dy][dx] - original[dy][dx];
                    let x = (bx * BLOCK_SIZE + dx) as u32;
                    let y = (by * BLOCK_SIZE + dy) as u32;
                    shift_luma(rgba.get_pixel_mut(x, y), delta);
                }
            }
        }

        debug!(
            bits = bits.len(),
            blocks,
            copies = blocks / bits.len(),
            "Embedded watermark"
        );

        if image.color().has_alpha() {
            Ok(DynamicImage::ImageRgba8(rgba))
        } else {
            Ok(DynamicImage::ImageRgb8(DynamicImage::ImageRgba8(rgba).to_rgb8()))
        }
    }

    fn extract(&self, image: &DynamicImage, bit_len: usize) -> Result<Vec<bool>> {
        let rgba = image.to_rgba8();
        let (width, height) = rgba.dimensions();
        let blocks = self.check_capacity(width, height, bit_len)?;

        let stride = width as usize;
        let blocks_per_row = stride / BLOCK_SIZE;
        let luma = luma_plane(&rgba);
        let order = permutation(blocks, self.config.image_key);

        // (ones, total) per bit position
        let mut votes = vec![(0u32, 0u32); bit_len];
        for (slot, &index) in order.iter().enumerate() {
            let (bx, by) = (index % blocks_per_row, index / blocks_per_row);
            let block = read_block(&luma, stride, bx, by);
            let tally = &mut votes[slot % bit_len];
            tally.0 += self.read_bit(dc_coefficient(&block)) as u32;
            tally.1 += 1;
        }

        let scrambled: Vec<bool> = votes
            .iter()
            .map(|&(ones, total)| ones * 2 > total)
            .collect();

        Ok(whiten(&scrambled, self.config.payload_key))
    }
}
