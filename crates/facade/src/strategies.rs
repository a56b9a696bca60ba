//! Strategy drivers composing noise injection, partitioning, and boosting.
//!
//! Each driver is a pure function from a histogram and a privacy budget to a
//! vector of sanitized counts; all randomness flows through the caller's
//! generator. The NoiseFirst pair perturbs first and selects structure on
//! the already-noised data, so the whole budget goes into one noise pass.
//! The StructureFirst pair splits the budget: part protects the partition
//! boundaries through the exponential mechanism, the rest feeds the
//! per-segment inference trees.

use std::str::FromStr;

use rand::Rng;

use hist_privacy_core::{HistError, Histogram, LaplaceMechanism, Result};
use hist_privacy_htree::boost;
use hist_privacy_partition::{
    adjust_boundaries, find_opt_k, DynamicProgram, SaeCost, SseCost,
};

use crate::calibrate::{opt_eps1_sae, opt_eps1_sse};

/// Published sanitization strategies.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Strategy {
    /// Per-bin Laplace baseline.
    Dwork,
    /// Mean-based noise-then-structure.
    NoiseFirst,
    /// Mean-based structure-then-noise with boundary privacy.
    StructureFirst,
    /// Median-based noise-then-structure.
    MedianNoiseFirst,
    /// Median-based structure-then-noise with boundary privacy.
    MedianStructureFirst,
}

impl FromStr for Strategy {
    type Err = HistError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Dwork" => Ok(Self::Dwork),
            "NoiseFirst" => Ok(Self::NoiseFirst),
            "StructureFirst" => Ok(Self::StructureFirst),
            "m_NoiseFirst" => Ok(Self::MedianNoiseFirst),
            "m_StructureFirst" => Ok(Self::MedianStructureFirst),
            other => Err(HistError::invalid(format!(
                "undefined method name: {other:?}"
            ))),
        }
    }
}

/// Knobs for the StructureFirst drivers.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StructureFirstParams {
    /// Merged-bin count as a fraction of the histogram cardinality.
    pub k_ratio: f64,
    /// Frequency cap as a multiple of the mean bin count.
    pub freq_cap_scale: f64,
    /// Fan-out of the per-segment inference trees.
    pub fan_out: usize,
}

impl Default for StructureFirstParams {
    fn default() -> Self {
        Self {
            k_ratio: 0.1,
            freq_cap_scale: 10_000.0,
            fan_out: 2,
        }
    }
}

impl StructureFirstParams {
    /// Set the merged-bin ratio.
    pub fn with_k_ratio(mut self, k_ratio: f64) -> Self {
        self.k_ratio = k_ratio;
        self
    }

    /// Set the frequency-cap scale.
    pub fn with_freq_cap_scale(mut self, freq_cap_scale: f64) -> Self {
        self.freq_cap_scale = freq_cap_scale;
        self
    }

    /// Set the tree fan-out.
    pub fn with_fan_out(mut self, fan_out: usize) -> Self {
        self.fan_out = fan_out;
        self
    }

    /// Validate parameters.
    pub fn validate(&self) -> Result<()> {
        if !self.k_ratio.is_finite() || self.k_ratio <= 0.0 || self.k_ratio > 1.0 {
            return Err(HistError::invalid("k_ratio must be in (0, 1]"));
        }
        if !self.freq_cap_scale.is_finite() || self.freq_cap_scale <= 0.0 {
            return Err(HistError::invalid("freq_cap_scale must be positive"));
        }
        if self.fan_out < 2 {
            return Err(HistError::invalid("fan_out must be at least 2"));
        }
        Ok(())
    }

    fn merged_bins(&self, n: usize) -> usize {
        ((n as f64 * self.k_ratio).ceil() as usize).clamp(1, n)
    }
}

fn check_epsilon(epsilon: f64) -> Result<()> {
    if !epsilon.is_finite() || epsilon <= 0.0 {
        return Err(HistError::invalid(format!(
            "epsilon must be positive and finite, got {epsilon}"
        )));
    }
    Ok(())
}

/// Laplace-mechanism baseline: independent `Laplace(1/epsilon)` noise per
/// bin.
pub fn dwork<R: Rng>(hist: &Histogram, epsilon: f64, rng: &mut R) -> Result<Vec<f64>> {
    check_epsilon(epsilon)?;
    Ok(LaplaceMechanism::new(epsilon, 1.0).perturbed(hist.counts(), rng))
}

/// Mean-based NoiseFirst.
///
/// Noises the whole histogram once, picks the segment count and the SSE
/// partition on the noised data, then reports either the raw noisy bins or
/// their segment mean, whichever the closed-form error estimators favor.
/// The already-spent budget is reused; there is no second noise draw.
pub fn noise_first<R: Rng>(hist: &Histogram, epsilon: f64, rng: &mut R) -> Result<Vec<f64>> {
    check_epsilon(epsilon)?;
    let noisy = LaplaceMechanism::new(epsilon, 1.0).perturbed(hist.counts(), rng);

    let mut cache = SseCost::new(&noisy)?;
    let opt_k = find_opt_k(&mut cache, epsilon)?;

    let mut dp = DynamicProgram::new(noisy.len(), opt_k)?;
    dp.run(&mut cache);
    let partition = dp.boundaries()?;

    let mut out = Vec::with_capacity(noisy.len());
    for (begin, end) in partition.segments() {
        merge_or_keep_mean(&noisy, begin, end, epsilon, &mut out);
    }
    Ok(out)
}

/// Median-based NoiseFirst.
pub fn m_noise_first<R: Rng>(hist: &Histogram, epsilon: f64, rng: &mut R) -> Result<Vec<f64>> {
    check_epsilon(epsilon)?;
    let noisy = LaplaceMechanism::new(epsilon, 1.0).perturbed(hist.counts(), rng);

    // One cache across the sweep and the final run keeps the median memo
    // warm for the merge decisions below.
    let mut cache = SaeCost::new(&noisy)?;
    let opt_k = find_opt_k(&mut cache, epsilon)?;

    let mut dp = DynamicProgram::new(noisy.len(), opt_k)?;
    dp.run(&mut cache);
    let partition = dp.boundaries()?;

    let mut out = Vec::with_capacity(noisy.len());
    for (begin, end) in partition.segments() {
        merge_or_keep_median(&noisy, &mut cache, begin, end, epsilon, &mut out);
    }
    Ok(out)
}

/// Mean-based StructureFirst with default parameters.
pub fn structure_first<R: Rng>(hist: &Histogram, epsilon: f64, rng: &mut R) -> Result<Vec<f64>> {
    structure_first_with(hist, epsilon, StructureFirstParams::default(), rng)
}

/// Mean-based StructureFirst.
///
/// Splits the budget into `epsilon1` for making the partition boundaries
/// differentially private and `epsilon2` for boosting each segment. The DP
/// runs on a frequency-capped copy of the counts; the boosting always reads
/// the original counts.
pub fn structure_first_with<R: Rng>(
    hist: &Histogram,
    epsilon: f64,
    params: StructureFirstParams,
    rng: &mut R,
) -> Result<Vec<f64>> {
    check_epsilon(epsilon)?;
    params.validate()?;
    let n = hist.len();
    let k = params.merged_bins(n);
    let max_freq = hist.total() / n as f64 * params.freq_cap_scale;
    let capped = hist.capped(max_freq);

    let epsilon1 = opt_eps1_sse(n, k, epsilon, max_freq);
    let mut epsilon2 = epsilon - epsilon1;

    let mut cache = SseCost::new(&capped)?;
    let mut dp = DynamicProgram::new(n, k)?;
    dp.run(&mut cache);
    let partition = dp.boundaries()?;

    let scale = 2.0 * k as f64 * (2.0 * max_freq + 1.0);
    let adjusted = adjust_boundaries(&dp, &mut cache, partition, epsilon1, scale, rng)?;
    if adjusted.is_trivial(n) {
        // No boundary freedom was protected; the structure budget flows back
        // into the noise budget.
        epsilon2 = epsilon1 + epsilon2;
    }

    let mut out = Vec::with_capacity(n);
    for (begin, end) in adjusted.segments() {
        out.extend(boost(hist.counts(), begin, end, epsilon2, params.fan_out, rng)?);
    }
    Ok(out)
}

/// Median-based StructureFirst with default parameters.
pub fn m_structure_first<R: Rng>(hist: &Histogram, epsilon: f64, rng: &mut R) -> Result<Vec<f64>> {
    m_structure_first_with(hist, epsilon, StructureFirstParams::default(), rng)
}

/// Median-based StructureFirst.
///
/// The SAE dynamic program runs on the raw counts; the frequency cap only
/// enters the budget-split bound.
pub fn m_structure_first_with<R: Rng>(
    hist: &Histogram,
    epsilon: f64,
    params: StructureFirstParams,
    rng: &mut R,
) -> Result<Vec<f64>> {
    check_epsilon(epsilon)?;
    params.validate()?;
    let n = hist.len();
    let k = params.merged_bins(n);
    let max_freq = hist.total() / n as f64 * params.freq_cap_scale;

    let epsilon1 = opt_eps1_sae(n, k, epsilon, max_freq);
    let mut epsilon2 = epsilon - epsilon1;

    let mut cache = SaeCost::new(hist.counts())?;
    let mut dp = DynamicProgram::new(n, k)?;
    dp.run(&mut cache);
    let partition = dp.boundaries()?;

    let scale = 2.0 * (k as f64 - 1.0);
    let adjusted = adjust_boundaries(&dp, &mut cache, partition, epsilon1, scale, rng)?;
    if adjusted.is_trivial(n) {
        epsilon2 = epsilon1 + epsilon2;
    }

    let mut out = Vec::with_capacity(n);
    for (begin, end) in adjusted.segments() {
        out.extend(boost(hist.counts(), begin, end, epsilon2, params.fan_out, rng)?);
    }
    Ok(out)
}

/// Dispatch a named strategy over one histogram.
pub fn run_strategy<R: Rng>(
    strategy: Strategy,
    hist: &Histogram,
    epsilon: f64,
    rng: &mut R,
) -> Result<Vec<f64>> {
    match strategy {
        Strategy::Dwork => dwork(hist, epsilon, rng),
        Strategy::NoiseFirst => noise_first(hist, epsilon, rng),
        Strategy::StructureFirst => structure_first(hist, epsilon, rng),
        Strategy::MedianNoiseFirst => m_noise_first(hist, epsilon, rng),
        Strategy::MedianStructureFirst => m_structure_first(hist, epsilon, rng),
    }
}

/// Report raw noisy bins or their mean, whichever has the lower estimated
/// error.
fn merge_or_keep_mean(noisy: &[f64], begin: usize, end: usize, epsilon: f64, out: &mut Vec<f64>) {
    if end == begin + 1 {
        out.push(noisy[begin]);
        return;
    }
    let n = (end - begin) as f64;
    let avg = noisy[begin..end].iter().sum::<f64>() / n;
    let spread: f64 = noisy[begin..end].iter().map(|&x| (avg - x).powi(2)).sum();

    let merge_estimate_error = spread - 2.0 * (n - 2.0) / (epsilon * epsilon);
    let dwork_estimate_error = 2.0 * n / (epsilon * epsilon);

    if merge_estimate_error > dwork_estimate_error {
        out.extend_from_slice(&noisy[begin..end]);
    } else {
        out.extend(std::iter::repeat(avg).take(end - begin));
    }
}

/// Median analogue of the merge decision, reading the segment median from
/// the warm SAE cache.
fn merge_or_keep_median(
    noisy: &[f64],
    cache: &mut SaeCost,
    begin: usize,
    end: usize,
    epsilon: f64,
    out: &mut Vec<f64>,
) {
    if end == begin + 1 {
        out.push(noisy[begin]);
        return;
    }
    let n = (end - begin) as f64;
    let median = cache.median(begin, end - 1);
    let spread: f64 = noisy[begin..end].iter().map(|&x| (median - x).abs()).sum();

    if spread >= (4.0 * (n - 1.0) + 1.0) / epsilon {
        out.extend_from_slice(&noisy[begin..end]);
    } else {
        out.extend(std::iter::repeat(median).take(end - begin));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn sample_hist() -> Histogram {
        Histogram::from_counts(vec![
            12.0, 9.0, 14.0, 30.0, 2.0, 0.0, 7.0, 7.0, 41.0, 5.0, 5.0, 6.0,
        ])
        .expect("valid")
    }

    #[test]
    fn strategy_names_parse() {
        assert_eq!("Dwork".parse::<Strategy>().expect("ok"), Strategy::Dwork);
        assert_eq!(
            "m_StructureFirst".parse::<Strategy>().expect("ok"),
            Strategy::MedianStructureFirst
        );
        assert!("noisefirst".parse::<Strategy>().is_err());
    }

    #[test]
    fn params_validate() {
        assert!(StructureFirstParams::default().validate().is_ok());
        assert!(StructureFirstParams::default()
            .with_k_ratio(0.0)
            .validate()
            .is_err());
        assert!(StructureFirstParams::default()
            .with_fan_out(1)
            .validate()
            .is_err());
        assert!(StructureFirstParams::default()
            .with_freq_cap_scale(-1.0)
            .validate()
            .is_err());
    }

    #[test]
    fn merged_bins_are_clamped() {
        let params = StructureFirstParams::default();
        assert_eq!(params.merged_bins(12), 2);
        assert_eq!(params.merged_bins(3), 1);
        assert_eq!(StructureFirstParams::default()
            .with_k_ratio(1.0)
            .merged_bins(5), 5);
    }

    #[test]
    fn all_strategies_preserve_length() {
        let hist = sample_hist();
        for strategy in [
            Strategy::Dwork,
            Strategy::NoiseFirst,
            Strategy::StructureFirst,
            Strategy::MedianNoiseFirst,
            Strategy::MedianStructureFirst,
        ] {
            let mut rng = ChaCha8Rng::seed_from_u64(42);
            let out = run_strategy(strategy, &hist, 1.0, &mut rng).expect("valid");
            assert_eq!(out.len(), hist.len(), "{strategy:?}");
        }
    }

    #[test]
    fn all_strategies_are_deterministic() {
        let hist = sample_hist();
        for strategy in [
            Strategy::Dwork,
            Strategy::NoiseFirst,
            Strategy::StructureFirst,
            Strategy::MedianNoiseFirst,
            Strategy::MedianStructureFirst,
        ] {
            let mut r1 = ChaCha8Rng::seed_from_u64(7);
            let mut r2 = ChaCha8Rng::seed_from_u64(7);
            let a = run_strategy(strategy, &hist, 0.5, &mut r1).expect("valid");
            let b = run_strategy(strategy, &hist, 0.5, &mut r2).expect("valid");
            assert_eq!(a, b, "{strategy:?}");
        }
    }

    #[test]
    fn rejects_non_positive_epsilon() {
        let hist = sample_hist();
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        for strategy in [Strategy::Dwork, Strategy::NoiseFirst, Strategy::StructureFirst] {
            assert!(run_strategy(strategy, &hist, 0.0, &mut rng).is_err());
            assert!(run_strategy(strategy, &hist, -1.0, &mut rng).is_err());
        }
    }

    #[test]
    fn noise_first_merges_uniform_segments() {
        // With a generous budget, noise is tiny and a uniform histogram
        // collapses to (almost exactly) its mean everywhere.
        let hist = Histogram::from_counts(vec![20.0; 16]).expect("valid");
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let out = noise_first(&hist, 1e6, &mut rng).expect("valid");
        for value in &out {
            assert!((value - 20.0).abs() < 1e-3);
        }
    }

    #[test]
    fn noise_first_keeps_sharp_structure() {
        let hist = Histogram::from_counts(vec![
            0.0, 0.0, 0.0, 0.0, 100.0, 100.0, 100.0, 100.0,
        ])
        .expect("valid");
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let out = noise_first(&hist, 1e6, &mut rng).expect("valid");
        for (value, want) in out.iter().zip(hist.counts()) {
            assert!((value - want).abs() < 1e-3, "{value} vs {want}");
        }
    }

    #[test]
    fn structure_first_tracks_counts_under_large_budget() {
        let hist = sample_hist();
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let out = structure_first(&hist, 1e6, &mut rng).expect("valid");
        // Boosted estimates are consistent mixtures of near-noiseless
        // observations, so each bin lands near its true count.
        for (value, want) in out.iter().zip(hist.counts()) {
            assert!((value - want).abs() < 1e-2, "{value} vs {want}");
        }
    }

    #[test]
    fn singleton_histogram_works_everywhere() {
        let hist = Histogram::from_counts(vec![13.0]).expect("valid");
        for strategy in [
            Strategy::Dwork,
            Strategy::NoiseFirst,
            Strategy::StructureFirst,
            Strategy::MedianNoiseFirst,
            Strategy::MedianStructureFirst,
        ] {
            let mut rng = ChaCha8Rng::seed_from_u64(1);
            let out = run_strategy(strategy, &hist, 1.0, &mut rng).expect("valid");
            assert_eq!(out.len(), 1, "{strategy:?}");
        }
    }
}
