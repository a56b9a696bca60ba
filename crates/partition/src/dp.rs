//! Exact K-way segmentation of a histogram by dynamic programming.

use hist_privacy_core::{HistError, Partition, Result};
use ndarray::Array2;

use crate::cost::{CostKind, SaeCost, SegmentCost, SseCost};

/// Sentinel for an unfilled backpointer entry.
const UNSET: usize = usize::MAX;

/// Cost and backpointer tables for one segmentation run.
///
/// `cost[(i, k)]` is the minimal aggregate error of covering bins `[0, i]`
/// with `k + 1` segments; `back[(i, k)]` is the start of the last segment in
/// that optimum. Tables are filled once by [`DynamicProgram::run`] and read
/// during reconstruction; an instance belongs to exactly one run.
#[derive(Clone, Debug)]
pub struct DynamicProgram {
    n: usize,
    k: usize,
    cost: Array2<f64>,
    back: Array2<usize>,
}

impl DynamicProgram {
    /// Allocate tables for `n` bins and `k` target segments.
    pub fn new(n: usize, k: usize) -> Result<Self> {
        if n == 0 {
            return Err(HistError::invalid("histogram must not be empty"));
        }
        if k == 0 || k > n {
            return Err(HistError::invalid(format!(
                "segment count must satisfy 1 <= k <= {n}, got {k}"
            )));
        }
        Ok(Self {
            n,
            k,
            cost: Array2::from_elem((n, k), f64::MAX),
            back: Array2::from_elem((n, k), UNSET),
        })
    }

    /// Number of bins.
    pub fn num_bins(&self) -> usize {
        self.n
    }

    /// Target segment count.
    pub fn num_segments(&self) -> usize {
        self.k
    }

    /// Fill the tables from a segment-cost cache.
    pub fn run<C: SegmentCost>(&mut self, cache: &mut C) {
        debug_assert_eq!(cache.num_bins(), self.n, "cache covers a different histogram");

        // Exactly i + 1 segments over bins [0, i] leave zero error.
        for i in 0..self.k {
            self.cost[(i, i)] = 0.0;
            self.back[(i, i)] = i;
        }

        // One segment over bins [0, i].
        for i in 1..self.n {
            self.cost[(i, 0)] = cache.cost(0, i);
            self.back[(i, 0)] = 0;
        }

        for k in 1..self.k {
            for i in k + 1..self.n {
                self.scan_candidates(cache, k - 1, i, k);
            }
        }
    }

    /// Scan candidate predecessors for state `(i, k)`, keeping the first
    /// strict minimum.
    fn scan_candidates<C: SegmentCost>(&mut self, cache: &mut C, start: usize, i: usize, k: usize) {
        let mut best = f64::MAX;
        for j in start..i {
            let total = self.cost[(j, k - 1)] + cache.cost(j + 1, i);
            if total < best {
                self.back[(i, k)] = j + 1;
                self.cost[(i, k)] = total;
                best = total;
            }
        }
    }

    /// Reconstruct the optimal boundary vector by walking backpointers from
    /// `(n - 1, k - 1)`.
    ///
    /// An unreachable state (sentinel backpointer with the bin index equal to
    /// the level) falls back to the unit partition, matching the historical
    /// behavior downstream strategies rely on.
    pub fn boundaries(&self) -> Result<Partition> {
        let mut bounds = vec![0usize; self.k + 1];
        bounds[self.k] = self.n;

        let mut n = self.n - 1;
        for i in (1..self.k).rev() {
            let j = self.back[(n, i)];
            if j == UNSET && n == i {
                for x in 1..=n {
                    bounds[x] = x;
                }
                break;
            }
            bounds[i] = j;
            n = j - 1;
        }

        Partition::new(bounds, self.n)
    }

    /// Minimal total error of the full `k`-way segmentation.
    pub fn optimal_cost(&self) -> f64 {
        self.cost[(self.n - 1, self.k - 1)]
    }

    /// Table cost for covering bins `[0, i]` with `k + 1` segments.
    pub fn cost_at(&self, i: usize, k: usize) -> f64 {
        self.cost[(i, k)]
    }
}

/// Sweep every candidate segment count on already-noised counts and pick the
/// K minimizing the bias-corrected error estimate.
///
/// The sweep reuses one full DP at `k = n`, so it spends no extra privacy
/// budget beyond the noise already present in the counts.
pub fn find_opt_k<C: SegmentCost>(cache: &mut C, epsilon: f64) -> Result<usize> {
    if !epsilon.is_finite() || epsilon <= 0.0 {
        return Err(HistError::invalid(format!(
            "epsilon must be positive and finite, got {epsilon}"
        )));
    }
    let n = cache.num_bins();
    let mut dp = DynamicProgram::new(n, n)?;
    dp.run(cache);

    let mut best = f64::MAX;
    let mut opt_k = 1;
    for k in 1..=n {
        let estimated = dp.cost_at(n - 1, k - 1) - cache.opt_k_penalty(n, k, epsilon);
        if estimated < best {
            best = estimated;
            opt_k = k;
        }
    }
    Ok(opt_k)
}

/// Minimum-error `k`-way partition of `hist` under the SSE criterion.
pub fn partition(hist: &[f64], k: usize) -> Result<(Partition, f64)> {
    let mut cache = SseCost::new(hist)?;
    partition_with(&mut cache, k)
}

/// Minimum-error `k`-way partition under any cost criterion.
pub fn partition_with<C: SegmentCost>(cache: &mut C, k: usize) -> Result<(Partition, f64)> {
    let mut dp = DynamicProgram::new(cache.num_bins(), k)?;
    dp.run(cache);
    let bounds = dp.boundaries()?;
    Ok((bounds, dp.optimal_cost()))
}

/// Pick the segment count for `hist` under the given criterion.
pub fn find_optimal_k(hist: &[f64], epsilon: f64, kind: CostKind) -> Result<usize> {
    match kind {
        CostKind::Sse => find_opt_k(&mut SseCost::new(hist)?, epsilon),
        CostKind::Sae => find_opt_k(&mut SaeCost::new(hist)?, epsilon),
    }
}
