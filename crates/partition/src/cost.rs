//! Segment-cost caches for the partition dynamic program.
//!
//! Both criteria answer the same question: the aggregate error of collapsing
//! an inclusive bin range into one segment. The SSE cache answers in O(1)
//! after an O(N) prefix-sum precompute; the SAE cache pays O(length) per
//! range the first time and memoizes the median for later queries.

use hist_privacy_core::{HistError, Result};
use ndarray::Array2;

/// Which error criterion a cost cache implements.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CostKind {
    /// Sum of squared errors against the segment mean.
    Sse,
    /// Sum of absolute errors against the segment median.
    Sae,
}

/// Aggregate error of putting an inclusive bin range into one segment.
///
/// Queries with `i > j` or indices outside the histogram are programming
/// errors, not recoverable conditions.
pub trait SegmentCost {
    /// Number of bins covered by the cache.
    fn num_bins(&self) -> usize;

    /// Error of the segment `[i, j]` (inclusive). `cost(i, i)` is zero.
    fn cost(&mut self, i: usize, j: usize) -> f64;

    /// Bias correction subtracted from `cost[n-1][k-1]` when sweeping K on
    /// already-noised counts.
    fn opt_k_penalty(&self, n: usize, k: usize, epsilon: f64) -> f64;
}

/// O(1) sum-of-squared-errors segment cost backed by prefix sums.
#[derive(Clone, Debug)]
pub struct SseCost {
    p: Vec<f64>,
    pp: Vec<f64>,
}

impl SseCost {
    /// Precompute prefix sums of counts and squared counts.
    pub fn new(hist: &[f64]) -> Result<Self> {
        if hist.is_empty() {
            return Err(HistError::invalid("histogram must not be empty"));
        }
        let mut p = Vec::with_capacity(hist.len());
        let mut pp = Vec::with_capacity(hist.len());
        let mut sum = 0.0;
        let mut sum_sq = 0.0;
        for &x in hist {
            sum += x;
            sum_sq += x * x;
            p.push(sum);
            pp.push(sum_sq);
        }
        Ok(Self { p, pp })
    }

    fn range_sums(&self, i: usize, j: usize) -> (f64, f64) {
        if i == 0 {
            (self.p[j], self.pp[j])
        } else {
            (self.p[j] - self.p[i - 1], self.pp[j] - self.pp[i - 1])
        }
    }
}

impl SegmentCost for SseCost {
    fn num_bins(&self) -> usize {
        self.p.len()
    }

    fn cost(&mut self, i: usize, j: usize) -> f64 {
        debug_assert!(i <= j && j < self.p.len(), "segment range out of bounds");
        if i == j {
            return 0.0;
        }
        let (s, sq) = self.range_sums(i, j);
        sq - s * s / (j - i + 1) as f64
    }

    fn opt_k_penalty(&self, n: usize, k: usize, epsilon: f64) -> f64 {
        2.0 * (n as f64 - 2.0 * k as f64) / (epsilon * epsilon)
    }
}

/// Tolerance under which two counts are treated as tied by the selection
/// partition, so runs of duplicates cannot recurse forever.
const TIE_EPS: f64 = 1e-6;

/// Sum-of-absolute-errors segment cost with a memoized median table.
#[derive(Clone, Debug)]
pub struct SaeCost {
    hist: Vec<f64>,
    medians: Array2<f64>,
}

impl SaeCost {
    /// Wrap `hist` with an empty median memo.
    pub fn new(hist: &[f64]) -> Result<Self> {
        if hist.is_empty() {
            return Err(HistError::invalid("histogram must not be empty"));
        }
        let n = hist.len();
        Ok(Self {
            hist: hist.to_vec(),
            medians: Array2::from_elem((n, n), f64::INFINITY),
        })
    }

    /// Median of `hist[i..=j]`, computed once and cached for the run.
    pub fn median(&mut self, i: usize, j: usize) -> f64 {
        debug_assert!(i <= j && j < self.hist.len(), "segment range out of bounds");
        let cached = self.medians[(i, j)];
        if cached.is_finite() {
            return cached;
        }
        let m = median_of(&self.hist[i..=j]);
        self.medians[(i, j)] = m;
        m
    }
}

impl SegmentCost for SaeCost {
    fn num_bins(&self) -> usize {
        self.hist.len()
    }

    fn cost(&mut self, i: usize, j: usize) -> f64 {
        debug_assert!(i <= j && j < self.hist.len(), "segment range out of bounds");
        if i == j {
            return 0.0;
        }
        let m = self.median(i, j);
        self.hist[i..=j].iter().map(|&x| (x - m).abs()).sum()
    }

    fn opt_k_penalty(&self, n: usize, k: usize, epsilon: f64) -> f64 {
        3.0 * (n as f64 - k as f64 + 1.0) / epsilon
    }
}

/// Quickselect-style partition around the middle element.
///
/// Returns the pivot's final index and the number of elements tied with the
/// pivot (within `TIE_EPS`) that remained to its right.
fn partition_step(seg: &mut [f64], first: usize, last: usize) -> (usize, usize) {
    let mid = (first + last) / 2;
    seg.swap(first, mid);
    let piv = seg[first];
    let mut p = first;
    let mut ties = 0usize;
    for k in first + 1..=last {
        if seg[k] < piv {
            p += 1;
            seg.swap(k, p);
        } else if (seg[k] - piv).abs() < TIE_EPS {
            ties += 1;
        }
    }
    seg.swap(p, first);
    (p, ties)
}

/// Index of the `k`-th smallest element after partial partitioning.
fn find_kth(seg: &mut [f64], left: usize, right: usize, k: usize) -> usize {
    let (pivot, ties) = partition_step(seg, left, right);
    if pivot <= k && k <= pivot + ties {
        k
    } else if k < pivot {
        find_kth(seg, left, pivot - 1, k)
    } else {
        find_kth(seg, pivot + 1, right, k)
    }
}

fn median_of(segment: &[f64]) -> f64 {
    let mut seg = segment.to_vec();
    let len = seg.len();
    let k = (len + 1) / 2 - 1;
    let k_index = find_kth(&mut seg, 0, len - 1, k);
    if len % 2 != 0 {
        seg[k_index]
    } else {
        // Even length: average with the smallest element above the k-th.
        let mut min_above = f64::MAX;
        for &x in &seg[k_index + 1..] {
            if x < min_above {
                min_above = x;
            }
        }
        (seg[k_index] + min_above) / 2.0
    }
}
