//! Statistical helpers for workload summarization
//!
//! Coverage cutoffs, order statistics, Shannon entropy, SIMD-width
//! moments, and branch-history entropy. Every function is total over
//! degenerate input: empty sequences and zero denominators yield 0 rather
//! than NaN or infinity, so no undefined value can reach a report.
//!
//! ## Citations
//!
//! - Yokota, T., Ootsu, K., & Baba, T. (2008). "Potentials of Branch
//!   Predictors: From Entropy Viewpoints." (branch history entropy)
//! - De Pestel, S., Eyerman, S., & Eeckhout, L. (2017). "Linear Branch
//!   Entropy: Characterizing and Optimizing Branch Behavior."

#![allow(clippy::cast_precision_loss)] // Statistical functions need u64->f64

use std::collections::HashMap;

/// Fraction of dynamic events a "covering" set must account for
pub const COVERAGE_FRACTION: f64 = 0.9;

/// Branch history window length, in dynamic outcomes
pub const BRANCH_HISTORY_WINDOW: usize = 16;

/// Arithmetic mean; 0.0 for an empty slice
#[must_use]
pub fn mean(values: &[u64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<u64>() as f64 / values.len() as f64
}

/// Minimum and maximum; (0, 0) for an empty slice
#[must_use]
pub fn min_max(values: &[u64]) -> (u64, u64) {
    let min = values.iter().copied().min().unwrap_or(0);
    let max = values.iter().copied().max().unwrap_or(0);
    (min, max)
}

/// Median with the two-middle-element convention for even lengths.
///
/// The even-length average uses truncating integer division, so
/// `median([1, 2, 3, 4])` is exactly 2.0, not 2.5. Returns 0.0 for an
/// empty slice.
#[must_use]
pub fn median(values: &[u64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_unstable();
    let n = sorted.len();
    if n % 2 == 0 {
        ((sorted[n / 2 - 1] + sorted[n / 2]) / 2) as f64
    } else {
        sorted[n / 2] as f64
    }
}

/// Number of entries needed to cover [`COVERAGE_FRACTION`] of the total.
///
/// Entries are consumed in descending count order until the cumulative
/// count reaches ⌈0.9 × total⌉. Ties in count are consumed in an
/// unspecified order; the returned cardinality does not depend on it.
/// Returns 0 when the total is 0.
#[must_use]
pub fn coverage_cutoff(counts: &[u64]) -> usize {
    let total: u64 = counts.iter().sum();
    if total == 0 {
        return 0;
    }
    let mut sorted = counts.to_vec();
    sorted.sort_unstable_by(|a, b| b.cmp(a));

    let threshold = (total as f64 * COVERAGE_FRACTION).ceil() as u64;
    let mut covered = 0u64;
    let mut used = 0usize;
    for &count in &sorted {
        if covered >= threshold {
            break;
        }
        covered += count;
        used += 1;
    }
    used
}

/// Shannon entropy (base 2) of a count distribution, −Σ p·log2(p) with
/// p = count / `total`.
///
/// The denominator is explicit so coarsened histograms (addresses with low
/// bits discarded) can share the full access count. Returns 0.0 when
/// `total` is 0; zero counts are skipped.
#[must_use]
pub fn shannon_entropy<'a>(counts: impl IntoIterator<Item = &'a u64>, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let mut entropy = 0.0;
    for &count in counts {
        if count == 0 {
            continue;
        }
        let p = count as f64 / total as f64;
        entropy -= p * p.log2();
    }
    entropy
}

/// Moments of the SIMD-width histogram
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct WidthMoments {
    /// Smallest width observed
    pub min: u32,
    /// Largest width observed
    pub max: u32,
    /// Count-weighted mean width
    pub mean: f64,
    /// Population standard deviation around the weighted mean
    pub stdev: f64,
    /// Σ width × count, the total operand slots produced
    pub operand_sum: u64,
}

/// Weighted moments of an instruction-width histogram; all-zero for an
/// empty histogram
#[must_use]
pub fn width_moments(histogram: &HashMap<u32, u64>) -> WidthMoments {
    let total: u64 = histogram.values().sum();
    if total == 0 {
        return WidthMoments::default();
    }

    let min = histogram.keys().copied().min().unwrap_or(0);
    let max = histogram.keys().copied().max().unwrap_or(0);
    let operand_sum: u64 = histogram
        .iter()
        .map(|(&width, &count)| u64::from(width) * count)
        .sum();
    let mean = operand_sum as f64 / total as f64;

    let sq_sum: f64 = histogram
        .iter()
        .map(|(&width, &count)| {
            let diff = f64::from(width) - mean;
            diff * diff * count as f64
        })
        .sum();
    let stdev = (sq_sum / total as f64).sqrt();

    WidthMoments {
        min,
        max,
        mean,
        stdev,
        operand_sum,
    }
}

/// Branch-history entropy over all branch sites
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BranchEntropy {
    /// Yokota entropy, occurrence-weighted: −Σ n·p·log2(p)
    pub yokota: f64,
    /// Yokota entropy summed once per distinct pattern: −Σ p·log2(p)
    pub yokota_per_workload: f64,
    /// Occurrence-weighted average of 2·min(p, 1−p)
    pub linear: f64,
}

/// Compute branch-history entropy with a [`BRANCH_HISTORY_WINDOW`]-outcome
/// sliding window.
///
/// Every branch site with at least one full window contributes each of its
/// contiguous windows as a bit-pattern key. For a pattern occurring n
/// times with `ones` taken bits, p = ones / window length: Yokota entropy
/// accumulates −n·p·log2(p) (p = 0 contributes nothing), the per-workload
/// variant accumulates −p·log2(p) once per distinct pattern, and linear
/// entropy accumulates n·2·min(p, 1−p), normalized at the end by the total
/// window count across all branches. With no windows observed the linear
/// average is 0, not NaN.
#[must_use]
pub fn branch_entropy(branches: &HashMap<u32, Vec<bool>>) -> BranchEntropy {
    let m = BRANCH_HISTORY_WINDOW;
    let mut yokota = 0.0;
    let mut yokota_per_workload = 0.0;
    let mut linear_sum = 0.0;
    let mut total_windows = 0u64;

    for outcomes in branches.values() {
        if outcomes.len() < m {
            continue;
        }

        let mut patterns: HashMap<u16, u64> = HashMap::new();
        for window in outcomes.windows(m) {
            let mut key: u16 = 0;
            for &taken in window {
                key = (key << 1) | u16::from(taken);
            }
            *patterns.entry(key).or_insert(0) += 1;
        }

        for (&pattern, &occurrences) in &patterns {
            let p = f64::from(pattern.count_ones()) / m as f64;
            if p != 0.0 {
                yokota -= occurrences as f64 * p * p.log2();
                yokota_per_workload -= p * p.log2();
            }
            linear_sum += occurrences as f64 * 2.0 * p.min(1.0 - p);
            total_windows += occurrences;
        }
    }

    let linear = if total_windows == 0 {
        0.0
    } else {
        linear_sum / total_windows as f64
    };

    BranchEntropy {
        yokota,
        yokota_per_workload,
        linear,
    }
}
