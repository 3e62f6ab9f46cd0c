//! Ordinal discretization and index helpers.
//!
//! Response thresholds partition the latent axis into ordinal grade
//! intervals. A full threshold vector for `n` grades has `n + 1` entries
//! running from `-inf` to `+inf`; the interior vector `tau` (length `n - 1`)
//! drops both infinite ends.

use rand::Rng;

/// Grade index of `sample` given ascending interior thresholds.
///
/// Counts the thresholds at or below `sample`, so the result lies in
/// `0..=tau.len()` and a sample exactly on a threshold falls in the upper
/// interval. Counting `tau < sample` instead would put it in the lower one;
/// the two differ only on exact ties. `tau` must be ascending.
#[inline]
pub fn grade_index(sample: f64, tau: &[f64]) -> usize {
    tau.partition_point(|&t| t <= sample)
}

/// Full threshold vector from log interval widths.
///
/// Interval widths `exp(log_w)` are normalized to fill the unit probability
/// interval and mapped through the logit. For `n` widths the result has
/// `n + 1` ascending values, the first `-inf` and the last `+inf`. All-zero
/// `log_w` yields thresholds at `logit(k / n)`. Widths are scaled by the
/// largest one before exponentiation, so large log widths do not overflow.
pub fn response_thresholds(log_w: &[f64]) -> Vec<f64> {
    let n = log_w.len();
    let max_w = log_w.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let widths: Vec<f64> = log_w.iter().map(|w| (w - max_w).exp()).collect();
    let total: f64 = widths.iter().sum();

    let mut tau = Vec::with_capacity(n + 1);
    tau.push(f64::NEG_INFINITY);
    let mut cum = 0.0;
    for w in widths.iter().take(n.saturating_sub(1)) {
        cum += w;
        tau.push(logit(cum / total));
    }
    tau.push(f64::INFINITY);
    tau
}

/// Interior thresholds (both infinite ends stripped) from log interval widths.
pub fn interior_thresholds(log_w: &[f64]) -> Vec<f64> {
    let full = response_thresholds(log_w);
    full[1..full.len() - 1].to_vec()
}

#[inline]
fn logit(p: f64) -> f64 {
    (p / (1.0 - p)).ln()
}

/// Draw one index from a probability-mass slice.
///
/// `p` needs only be non-negative and proportional to the target masses.
/// Rounding leftovers fall back to the last positive entry.
pub fn sample_index<R: Rng>(p: &[f64], rng: &mut R) -> usize {
    if p.len() <= 1 {
        return 0;
    }
    let total: f64 = p.iter().sum();
    let mut r: f64 = rng.random::<f64>() * total;
    for (i, &w) in p.iter().enumerate() {
        if w > 0.0 {
            r -= w;
            if r < 0.0 {
                return i;
            }
        }
    }
    p.iter().rposition(|&w| w > 0.0).unwrap_or(p.len() - 1)
}

/// Row-major linear index → multi-index over `shape`.
pub fn unravel_index(mut linear: usize, shape: &[usize]) -> Vec<usize> {
    let mut index = vec![0usize; shape.len()];
    for (slot, &dim) in index.iter_mut().zip(shape.iter()).rev() {
        *slot = linear % dim;
        linear /= dim;
    }
    index
}
