// Deterministic, portable pseudo-random number generator for ELPOEBOT.
//
// xoshiro256++ (Blackman & Vigna, 2019) seeded through SplitMix64. Every
// random decision the poem generator makes (which verse to draw, how long a
// free poem is) goes through a `PoemRng`, so a given corpus, config, and seed
// always produce the same poem. Tests rely on this to pin down the ABAB
// search and its free-form fallback.
//
// Randomness here is non-cryptographic. The server seeds from the system
// clock (`seed_from_clock`) unless a seed is configured; nothing else in the
// workspace touches an OS entropy source.
//
// **Determinism constraint:** the core generator must not use floating point
// or platform-dependent behavior. Integer ranges use rejection sampling so
// draws stay uniform without modulo bias.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Xoshiro256++ generator. Cheap to clone; clones continue the same stream.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoemRng {
    s: [u64; 4],
}

impl PoemRng {
    /// Create a generator from a `u64` seed. Equal seeds give equal streams.
    pub fn new(seed: u64) -> Self {
        let mut sm = seed;
        Self {
            s: [
                splitmix64(&mut sm),
                splitmix64(&mut sm),
                splitmix64(&mut sm),
                splitmix64(&mut sm),
            ],
        }
    }

    pub fn next_u64(&mut self) -> u64 {
        let result = (self.s[0].wrapping_add(self.s[3]))
            .rotate_left(23)
            .wrapping_add(self.s[0]);

        let t = self.s[1] << 17;

        self.s[2] ^= self.s[0];
        self.s[3] ^= self.s[1];
        self.s[1] ^= self.s[2];
        self.s[0] ^= self.s[3];

        self.s[2] ^= t;
        self.s[3] = self.s[3].rotate_left(45);

        result
    }

    /// Uniform integer in `[low, high)`. Panics if `low >= high`.
    pub fn range_u64(&mut self, low: u64, high: u64) -> u64 {
        assert!(low < high, "range_u64: low must be less than high");
        let span = high - low;
        if span.is_power_of_two() {
            return low + (self.next_u64() & (span - 1));
        }
        // Values below the threshold would bias the low residues.
        let threshold = span.wrapping_neg() % span;
        loop {
            let r = self.next_u64();
            if r >= threshold {
                return low + (r % span);
            }
        }
    }

    /// Uniform `usize` in `[low, high)`. Panics if `low >= high`.
    pub fn range_usize(&mut self, low: usize, high: usize) -> usize {
        self.range_u64(low as u64, high as u64) as usize
    }

    /// Uniform `usize` in `[low, high]`. Panics if `low > high`.
    pub fn range_usize_inclusive(&mut self, low: usize, high: usize) -> usize {
        assert!(low <= high, "range_usize_inclusive: low must be <= high");
        let (low, high) = (low as u64, high as u64);
        match high.checked_add(1) {
            Some(end) => self.range_u64(low, end) as usize,
            // `high` is u64::MAX, so the range can't be made half-open.
            None if low == 0 => self.next_u64() as usize,
            None => (self.range_u64(low - 1, high) + 1) as usize,
        }
    }

    /// Pick one element uniformly, or `None` for an empty slice.
    pub fn choose<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        if items.is_empty() {
            return None;
        }
        let idx = self.range_usize(0, items.len());
        Some(&items[idx])
    }
}

/// Seed derived from the wall clock, for runs that don't ask for
/// reproducibility. Mixed through SplitMix64 so nearby instants diverge.
pub fn seed_from_clock() -> u64 {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0);
    let mut sm = nanos ^ u64::from(std::process::id());
    splitmix64(&mut sm)
}

fn splitmix64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9e37_79b9_7f4a_7c15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_stream() {
        let mut a = PoemRng::new(7);
        let mut b = PoemRng::new(7);
        for _ in 0..1000 {
            assert_eq!(a.next_u64(), b.next_u64());
        }
    }

    #[test]
    fn different_seeds_diverge() {
        let mut a = PoemRng::new(7);
        let mut b = PoemRng::new(8);
        assert_ne!(a.next_u64(), b.next_u64());
    }

    #[test]
    fn range_usize_within_bounds() {
        let mut rng = PoemRng::new(555);
        for _ in 0..10_000 {
            let v = rng.range_usize(3, 17);
            assert!((3..17).contains(&v), "range_usize out of range: {v}");
        }
    }

    #[test]
    fn range_usize_inclusive_hits_both_ends() {
        let mut rng = PoemRng::new(4);
        let mut seen = [false; 11];
        for _ in 0..10_000 {
            let v = rng.range_usize_inclusive(4, 14);
            assert!((4..=14).contains(&v), "out of range: {v}");
            seen[v - 4] = true;
        }
        assert!(seen.iter().all(|s| *s), "every length should appear: {seen:?}");
    }

    #[test]
    fn range_usize_inclusive_single_value() {
        let mut rng = PoemRng::new(1);
        for _ in 0..100 {
            assert_eq!(rng.range_usize_inclusive(4, 4), 4);
        }
    }

    #[test]
    fn choose_is_roughly_uniform() {
        let items = ["a", "b", "c", "d"];
        let mut counts = [0u32; 4];
        let mut rng = PoemRng::new(2024);
        let n = 40_000;
        for _ in 0..n {
            let picked = rng.choose(&items).unwrap();
            let idx = items.iter().position(|i| i == picked).unwrap();
            counts[idx] += 1;
        }
        for c in counts {
            let share = f64::from(c) / f64::from(n);
            assert!((0.22..0.28).contains(&share), "skewed draw: {counts:?}");
        }
    }

    #[test]
    fn choose_empty_is_none() {
        let mut rng = PoemRng::new(0);
        let empty: [u8; 0] = [];
        assert!(rng.choose(&empty).is_none());
    }

    #[test]
    fn range_usize_inclusive_reaches_usize_max() {
        let mut rng = PoemRng::new(99);
        for _ in 0..100 {
            let v = rng.range_usize_inclusive(usize::MAX - 1, usize::MAX);
            assert!(v >= usize::MAX - 1);
        }
        let v = rng.range_usize_inclusive(4, usize::MAX);
        assert!(v >= 4);
        let _ = rng.range_usize_inclusive(0, usize::MAX);
        assert_eq!(rng.range_usize_inclusive(usize::MAX, usize::MAX), usize::MAX);
    }

    #[test]
    fn serialization_roundtrip_continues_stream() {
        let mut rng = PoemRng::new(42);
        for _ in 0..50 {
            rng.next_u64();
        }
        let json = serde_json::to_string(&rng).unwrap();
        let mut restored: PoemRng = serde_json::from_str(&json).unwrap();
        for _ in 0..50 {
            assert_eq!(rng.next_u64(), restored.next_u64());
        }
    }
}
