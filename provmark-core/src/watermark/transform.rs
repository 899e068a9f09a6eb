//! Block transforms used by the DCT watermarker.
//!
//! An 8×8 pixel block is split by a single-level Haar DWT into four 4×4
//! sub-bands; the low-frequency (LL) band is then taken through an
//! orthonormal 2-D DCT-II. Both transforms are orthonormal, so inverses are
//! exact up to floating-point rounding.

/// Side length of a pixel block.
pub const BLOCK_SIZE: usize = 8;

/// Side length of a Haar sub-band.
pub const BAND_SIZE: usize = BLOCK_SIZE / 2;

pub type Block = [[f32; BLOCK_SIZE]; BLOCK_SIZE];
pub type Band = [[f32; BAND_SIZE]; BAND_SIZE];

/// The four sub-bands of a level-1 Haar decomposition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HaarBands {
    pub ll: Band,
    pub lh: Band,
    pub hl: Band,
    pub hh: Band,
}

/// Orthonormal level-1 Haar DWT of an 8×8 block.
pub fn haar_forward(block: &Block) -> HaarBands {
    let mut bands = HaarBands {
        ll: [[0.0; BAND_SIZE]; BAND_SIZE],
        lh: [[0.0; BAND_SIZE]; BAND_SIZE],
        hl: [[0.0; BAND_SIZE]; BAND_SIZE],
        hh: [[0.0; BAND_SIZE]; BAND_SIZE],
    };

    for i in 0..BAND_SIZE {
        for j in 0..BAND_SIZE {
            let a = block[2 * i][2 * j];
            let b = block[2 * i][2 * j + 1];
            let c = block[2 * i + 1][2 * j];
            let d = block[2 * i + 1][2 * j + 1];

            bands.ll[i][j] = (a + b + c + d) / 2.0;
            bands.lh[i][j] = (a - b + c - d) / 2.0;
            bands.hl[i][j] = (a + b - c - d) / 2.0;
            bands.hh[i][j] = (a - b - c + d) / 2.0;
        }
    }

    bands
}

/// Inverse of [`haar_forward`].
pub fn haar_inverse(bands: &HaarBands) -> Block {
    let mut block = [[0.0; BLOCK_SIZE]; BLOCK_SIZE];

    for i in 0..BAND_SIZE {
        for j in 0..BAND_SIZE {
            let (ll, lh, hl, hh) = (bands.ll[i][j], bands.lh[i][j], bands.hl[i][j], bands.hh[i][j]);

            block[2 * i][2 * j] = (ll + lh + hl + hh) / 2.0;
            block[2 * i][2 * j + 1] = (ll - lh + hl - hh) / 2.0;
            block[2 * i + 1][2 * j] = (ll + lh - hl - hh) / 2.0;
            block[2 * i + 1][2 * j + 1] = (ll - lh - hl + hh) / 2.0;
        }
    }

    block
}

fn dct_basis() -> Band {
    let n = BAND_SIZE as f32;
    let mut basis = [[0.0; BAND_SIZE]; BAND_SIZE];
    for (k, row) in basis.iter_mut().enumerate() {
        let scale = if k == 0 { (1.0 / n).sqrt() } else { (2.0 / n).sqrt() };
        for (x, value) in row.iter_mut().enumerate() {
            let angle = std::f32::consts::PI * (2 * x + 1) as f32 * k as f32 / (2.0 * n);
            *value = scale * angle.cos();
        }
    }
    basis
}

fn multiply(a: &Band, b: &Band) -> Band {
    let mut out = [[0.0; BAND_SIZE]; BAND_SIZE];
    for i in 0..BAND_SIZE {
        for j in 0..BAND_SIZE {
            out[i][j] = (0..BAND_SIZE).map(|k| a[i][k] * b[k][j]).sum();
        }
    }
    out
}

fn transpose(a: &Band) -> Band {
    let mut out = [[0.0; BAND_SIZE]; BAND_SIZE];
    for i in 0..BAND_SIZE {
        for j in 0..BAND_SIZE {
            out[j][i] = a[i][j];
        }
    }
    out
}

/// Orthonormal 2-D DCT-II of a 4×4 band.
pub fn dct2(band: &Band) -> Band {
    let basis = dct_basis();
    multiply(&multiply(&basis, band), &transpose(&basis))
}

/// Inverse of [`dct2`].
pub fn idct2(coeffs: &Band) -> Band {
    let basis = dct_basis();
    multiply(&multiply(&transpose(&basis), coeffs), &basis)
}
