use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::trial::TrialParams;

pub const DEFAULT_BASE_SEED: u64 = 42;

/// How a trial's random source is seeded.
///
/// A seeded policy makes a re-run of the same trial sort an input of the
/// same shape, which is what lets an interrupted sweep be resumed without
/// skewing the results. `SmallRng` streams are not guaranteed to match
/// across platforms or `rand` releases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SeedPolicy {
    /// Seed `base + t`. Every threshold of a given size sees the same
    /// inputs for replicate `t`.
    BasePlusTrial { base: u64 },
    /// Seed mixed from `base`, `n`, `s` and `t`; inputs are independent
    /// across thresholds.
    PerTriple { base: u64 },
    /// Fresh OS randomness for every trial. Not reproducible.
    Entropy,
}

impl Default for SeedPolicy {
    fn default() -> Self {
        SeedPolicy::BasePlusTrial {
            base: DEFAULT_BASE_SEED,
        }
    }
}

impl SeedPolicy {
    /// The seed for `params`, or `None` for [`SeedPolicy::Entropy`].
    pub fn seed_for(&self, params: &TrialParams) -> Option<u64> {
        match *self {
            SeedPolicy::BasePlusTrial { base } => Some(base.wrapping_add(params.t as u64)),
            SeedPolicy::PerTriple { base } => Some(
                [params.n as u64, params.s.get() as u64, params.t as u64]
                    .into_iter()
                    .fold(base, |acc, v| splitmix64(acc ^ v)),
            ),
            SeedPolicy::Entropy => None,
        }
    }

    pub fn rng_for(&self, params: &TrialParams) -> SmallRng {
        match self.seed_for(params) {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_os_rng(),
        }
    }
}

impl std::fmt::Display for SeedPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SeedPolicy::BasePlusTrial { base } => write!(f, "base+trial (base {})", base),
            SeedPolicy::PerTriple { base } => write!(f, "per-triple (base {})", base),
            SeedPolicy::Entropy => write!(f, "entropy"),
        }
    }
}

fn splitmix64(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Upper bound of generated values; the lower bound is always 1.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueRange {
    /// Values in `[1, n]`.
    #[default]
    UpToSize,
    /// Values in `[1, max]`.
    UpTo(u64),
}

impl ValueRange {
    pub fn upper_bound(&self, n: usize) -> u64 {
        match *self {
            ValueRange::UpToSize => n as u64,
            ValueRange::UpTo(max) => max,
        }
    }
}

impl std::fmt::Display for ValueRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValueRange::UpToSize => write!(f, "[1, n]"),
            ValueRange::UpTo(max) => write!(f, "[1, {}]", max),
        }
    }
}

/// Generate `n` integers drawn uniformly from `range`.
pub fn generate_input<R: Rng>(n: usize, range: ValueRange, rng: &mut R) -> Vec<u64> {
    let hi = range.upper_bound(n).max(1);
    (0..n).map(|_| rng.random_range(1..=hi)).collect()
}
