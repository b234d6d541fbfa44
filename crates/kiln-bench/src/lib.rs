//! Workload generators for kiln benchmarks.
//!
//! Every generator is driven by a seeded [`ChaCha8Rng`], so a benchmark
//! run is reproducible from its seed:
//!
//! - [`request_mix`]: `(bytes, align)` pairs shaped like a parser's
//!   allocation stream (mostly small, occasionally large)
//! - [`batch_lengths`]: container lengths clustered around an inline
//!   capacity, with a tail that spills to the heap
//! - [`tag_sequence`]: member indices for closed-set dispatch

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use rand_chacha::rand_core::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Alignments drawn by [`request_mix`].
pub const ALIGNMENTS: [usize; 4] = [1, 4, 8, 16];

/// `n` allocation requests: 90% between 8 and 128 bytes, the rest between
/// 1 and 8 KiB, each with an alignment from [`ALIGNMENTS`].
pub fn request_mix(n: usize, seed: u64) -> Vec<(usize, usize)> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..n)
        .map(|_| {
            let roll = rng.next_u32();
            let bytes = if roll % 10 == 0 {
                1024 + (rng.next_u32() as usize % (7 * 1024))
            } else {
                8 + (rng.next_u32() as usize % 121)
            };
            let align = ALIGNMENTS[(roll >> 8) as usize % ALIGNMENTS.len()];
            (bytes, align)
        })
        .collect()
}

/// `n` lengths, three quarters at most `inline`, the rest up to `4 * inline`.
pub fn batch_lengths(n: usize, inline: usize, seed: u64) -> Vec<usize> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let inline = inline.max(1);
    (0..n)
        .map(|_| {
            let roll = rng.next_u32() as usize;
            if roll % 4 == 0 {
                inline + 1 + (roll >> 2) % (3 * inline)
            } else {
                (roll >> 2) % (inline + 1)
            }
        })
        .collect()
}

/// `n` indices uniformly drawn from `0..members`.
pub fn tag_sequence(n: usize, members: usize, seed: u64) -> Vec<usize> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..n)
        .map(|_| rng.next_u64() as usize % members.max(1))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generators_are_deterministic() {
        assert_eq!(request_mix(64, 7), request_mix(64, 7));
        assert_ne!(request_mix(64, 7), request_mix(64, 8));
        assert_eq!(batch_lengths(64, 8, 1), batch_lengths(64, 8, 1));
    }

    #[test]
    fn request_mix_shape() {
        let reqs = request_mix(1000, 42);
        assert!(reqs
            .iter()
            .all(|&(bytes, align)| (8..=8 * 1024).contains(&bytes) && ALIGNMENTS.contains(&align)));
        let large = reqs.iter().filter(|&&(bytes, _)| bytes >= 1024).count();
        assert!(large > 0 && large < 300);
    }

    #[test]
    fn batch_lengths_spill_sometimes() {
        let lens = batch_lengths(1000, 8, 3);
        assert!(lens.iter().all(|&n| n <= 32));
        assert!(lens.iter().any(|&n| n > 8));
        assert!(lens.iter().filter(|&&n| n <= 8).count() > 500);
    }

    #[test]
    fn tag_sequence_in_range() {
        assert!(tag_sequence(500, 3, 9).iter().all(|&t| t < 3));
    }
}
