//! Keyed pseudo-random streams for bit whitening and block shuffling.
//!
//! Not a cipher. The keys only decorrelate the embedded bits from image
//! content and spread them across the image; anyone with the key (default 1)
//! can read the watermark back.

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;
use sha3::{Digest, Sha3_256};

/// Seeded generator for one `(key, domain)` pair.
///
/// The seed is the SHA3-256 digest of the key and a domain label, so the
/// shuffle and the whitening mask never share a stream.
pub fn keyed_rng(key: u64, domain: &[u8]) -> Pcg64 {
    let mut hasher = Sha3_256::new();
    hasher.update(key.to_le_bytes());
    hasher.update(domain);
    Pcg64::from_seed(hasher.finalize().into())
}

/// Keyed permutation of `0..len`.
pub fn permutation(len: usize, key: u64) -> Vec<usize> {
    let mut order: Vec<usize> = (0..len).collect();
    order.shuffle(&mut keyed_rng(key, b"provmark/blocks"));
    order
}

/// XOR bits with a keyed stream. Applying it twice is the identity.
pub fn whiten(bits: &[bool], key: u64) -> Vec<bool> {
    let mut rng = keyed_rng(key, b"provmark/payload");
    let mut out = Vec::with_capacity(bits.len());
    for chunk in bits.chunks(8) {
        let mask: u8 = rng.gen();
        for (i, &bit) in chunk.iter().enumerate() {
            out.push(bit ^ ((mask >> (7 - i)) & 1 == 1));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permutation_is_deterministic_and_complete() {
        let a = permutation(100, 1);
        let b = permutation(100, 1);
        assert_eq!(a, b);

        let mut sorted = a.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..100).collect::<Vec<_>>());
    }

    #[test]
    fn test_permutation_depends_on_key() {
        assert_ne!(permutation(64, 1), permutation(64, 2));
    }

    #[test]
    fn test_permutation_trivial_sizes() {
        assert!(permutation(0, 1).is_empty());
        assert_eq!(permutation(1, 1), vec![0]);
    }

    #[test]
    fn test_whiten_is_involution() {
        let bits: Vec<bool> = (0..37).map(|i| i % 3 == 0).collect();
        let scrambled = whiten(&bits, 7);
        assert_ne!(scrambled, bits);
        assert_eq!(whiten(&scrambled, 7), bits);
    }

    #[test]
    fn test_domains_are_independent() {
        let mut blocks = keyed_rng(1, b"provmark/blocks");
        let mut payload = keyed_rng(1, b"provmark/payload");
        let a: [u64; 4] = blocks.gen();
        let b: [u64; 4] = payload.gen();
        assert_ne!(a, b);

        let mut again = keyed_rng(1, b"provmark/blocks");
        assert_eq!(again.gen::<[u64; 4]>(), a);
    }
}
