//! Histogram counts and partition boundaries.

use crate::error::{HistError, Result};

/// An ordered sequence of non-negative bin counts.
///
/// Counts are validated on construction and immutable for the lifetime of a
/// run; strategies that need perturbed or capped counts work on copies.
#[derive(Clone, Debug, PartialEq)]
pub struct Histogram {
    counts: Vec<f64>,
}

impl Histogram {
    /// Build a histogram from raw counts.
    pub fn from_counts(counts: Vec<f64>) -> Result<Self> {
        if counts.is_empty() {
            return Err(HistError::invalid("histogram must not be empty"));
        }
        if counts.iter().any(|c| !c.is_finite() || *c < 0.0) {
            return Err(HistError::invalid(
                "histogram counts must be finite and non-negative",
            ));
        }
        Ok(Self { counts })
    }

    /// Parse one whitespace-delimited line of counts.
    pub fn from_line(line: &str) -> Result<Self> {
        let counts = line
            .split_whitespace()
            .map(|tok| {
                tok.parse::<f64>()
                    .map_err(|_| HistError::invalid(format!("bad count token: {tok:?}")))
            })
            .collect::<Result<Vec<f64>>>()?;
        Self::from_counts(counts)
    }

    /// The bin counts.
    pub fn counts(&self) -> &[f64] {
        &self.counts
    }

    /// Number of bins.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// Always false: empty histograms are rejected at construction.
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Sum of all counts.
    pub fn total(&self) -> f64 {
        self.counts.iter().sum()
    }

    /// Working copy with every count clamped to `max_freq`.
    pub fn capped(&self, max_freq: f64) -> Vec<f64> {
        self.counts.iter().map(|&c| c.min(max_freq)).collect()
    }
}

/// Boundary indices `0 = b_0 < b_1 < … < b_K = N` splitting `N` bins into
/// `K` contiguous, non-empty segments.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Partition {
    bounds: Vec<usize>,
}

impl Partition {
    /// Validate and wrap a boundary vector over `n` bins.
    pub fn new(bounds: Vec<usize>, n: usize) -> Result<Self> {
        if bounds.len() < 2 {
            return Err(HistError::invalid("partition needs at least two boundaries"));
        }
        if bounds[0] != 0 || bounds[bounds.len() - 1] != n {
            return Err(HistError::invalid(format!(
                "partition must be framed by 0 and {n}, got {bounds:?}"
            )));
        }
        if !bounds.windows(2).all(|w| w[0] < w[1]) {
            return Err(HistError::invalid(format!(
                "partition boundaries must be strictly increasing, got {bounds:?}"
            )));
        }
        Ok(Self { bounds })
    }

    /// The partition where every bin is its own segment.
    pub fn singletons(n: usize) -> Self {
        Self {
            bounds: (0..=n).collect(),
        }
    }

    /// The single-segment partition covering all `n` bins.
    pub fn whole(n: usize) -> Self {
        Self { bounds: vec![0, n] }
    }

    /// The boundary indices.
    pub fn bounds(&self) -> &[usize] {
        &self.bounds
    }

    /// Number of segments.
    pub fn num_segments(&self) -> usize {
        self.bounds.len() - 1
    }

    /// Iterate segments as half-open `(start, end)` ranges.
    pub fn segments(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.bounds.windows(2).map(|w| (w[0], w[1]))
    }

    /// Whether the partition leaves no boundary freedom over `n` bins
    /// (all-singleton or whole-range).
    pub fn is_trivial(&self, n: usize) -> bool {
        self.bounds.len() == n + 1 || self.bounds.len() == 2
    }

    /// Consume into the raw boundary vector.
    pub fn into_bounds(self) -> Vec<usize> {
        self.bounds
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_and_negative() {
        assert!(Histogram::from_counts(vec![]).is_err());
        assert!(Histogram::from_counts(vec![1.0, -2.0]).is_err());
        assert!(Histogram::from_counts(vec![1.0, f64::NAN]).is_err());
    }

    #[test]
    fn parses_whitespace_line() {
        let h = Histogram::from_line(" 1 2.5\t3 ").expect("valid line");
        assert_eq!(h.counts(), &[1.0, 2.5, 3.0]);
        assert_eq!(h.len(), 3);
        assert!((h.total() - 6.5).abs() < 1e-12);
    }

    #[test]
    fn rejects_bad_token() {
        assert!(Histogram::from_line("1 two 3").is_err());
    }

    #[test]
    fn capped_clamps_counts() {
        let h = Histogram::from_counts(vec![1.0, 10.0, 3.0]).expect("valid");
        assert_eq!(h.capped(5.0), vec![1.0, 5.0, 3.0]);
    }

    #[test]
    fn partition_invariants() {
        assert!(Partition::new(vec![0, 2, 4], 4).is_ok());
        assert!(Partition::new(vec![0, 4], 4).is_ok());
        assert!(Partition::new(vec![1, 2, 4], 4).is_err());
        assert!(Partition::new(vec![0, 2, 3], 4).is_err());
        assert!(Partition::new(vec![0, 2, 2, 4], 4).is_err());
        assert!(Partition::new(vec![0, 3, 2, 4], 4).is_err());
    }

    #[test]
    fn segments_cover_range() {
        let p = Partition::new(vec![0, 2, 5], 5).expect("valid");
        let segs: Vec<_> = p.segments().collect();
        assert_eq!(segs, vec![(0, 2), (2, 5)]);
        assert_eq!(p.num_segments(), 2);
    }

    #[test]
    fn trivial_partitions() {
        assert!(Partition::singletons(4).is_trivial(4));
        assert!(Partition::whole(4).is_trivial(4));
        assert!(!Partition::new(vec![0, 2, 4], 4)
            .expect("valid")
            .is_trivial(4));
    }
}
