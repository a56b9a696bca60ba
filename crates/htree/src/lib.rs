//! Hierarchical noise-inference tree ("Boost").
//!
//! Builds a fan-out-ary aggregation tree over a contiguous histogram range,
//! injects independent Laplace noise at every level, then runs the two-pass
//! linear estimator of Hay et al. (VLDB 2010): a bottom-up variance-weighted
//! combine followed by a top-down redistribution that forces every parent's
//! estimate to equal the sum of its children's. The result is a consistent
//! set of per-bin counts with lower variance than the raw noisy leaves.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use hist_privacy_core::{laplace, HistError, Result};
use rand::Rng;

/// One tree node over a segment-local leaf range `[start, end]`.
#[derive(Clone, Copy, Debug, Default)]
struct HNode {
    start: usize,
    end: usize,
    count: f64,
    noise: f64,
    zv: f64,
    hbar: f64,
    total_z_children: f64,
}

/// A noisy aggregation tree over one histogram segment.
///
/// Level 0 holds the leaves (one per bin, padded to a power of the fan-out
/// with zero-count phantom leaves); the last level is the single root. The
/// tree is constructed, inferred, and read once per boosted segment.
#[derive(Clone, Debug)]
pub struct HTree {
    fan_out: usize,
    height: usize,
    real_leaves: usize,
    levels: Vec<Vec<HNode>>,
}

impl HTree {
    /// Build the tree over `hist[begin..end]`, drawing per-node noise from
    /// `rng`. Ranges of fewer than two bins do not need a tree; use
    /// [`boost`] for the general entry point.
    pub fn build<R: Rng>(
        hist: &[f64],
        begin: usize,
        end: usize,
        epsilon: f64,
        fan_out: usize,
        rng: &mut R,
    ) -> Result<Self> {
        check_range(hist, begin, end)?;
        check_budget(epsilon)?;
        check_fan_out(fan_out)?;
        let len = end - begin;
        if len < 2 {
            return Err(HistError::invalid(
                "tree construction needs at least two bins",
            ));
        }

        let height = ((len as f64).ln() / (fan_out as f64).ln()).ceil() as usize + 1;
        let padded = fan_out.pow(height as u32 - 1);
        // The budget is split evenly across the levels.
        let lambda = height as f64 / epsilon;

        let mut leaves = Vec::with_capacity(padded);
        for (offset, &value) in hist[begin..end].iter().enumerate() {
            leaves.push(HNode {
                start: offset,
                end: offset,
                count: value,
                noise: value + laplace(lambda, rng),
                ..HNode::default()
            });
        }
        for pad in len..padded {
            leaves.push(HNode {
                start: pad,
                end: pad,
                ..HNode::default()
            });
        }

        let mut levels = vec![leaves];
        for level_index in 1..height {
            let mut level = Vec::new();
            {
                let below = &levels[level_index - 1];
                level.reserve(below.len() / fan_out);
                for group in 0..below.len() / fan_out {
                    let base = group * fan_out;
                    let start = below[base].start;
                    let end = below[base + fan_out - 1].end;
                    let sum: f64 = below[base..base + fan_out].iter().map(|n| n.count).sum();
                    let mut noise = sum;
                    // Subtrees covering only phantom leaves are exactly zero
                    // and spend no budget.
                    if start < len {
                        noise += laplace(lambda, rng);
                    }
                    level.push(HNode {
                        start,
                        end,
                        count: sum,
                        noise,
                        ..HNode::default()
                    });
                }
            }
            levels.push(level);
        }

        Ok(Self {
            fan_out,
            height,
            real_leaves: len,
            levels,
        })
    }

    /// Tree height, counting the leaf level.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Two-pass consistency inference.
    pub fn inference(&mut self) {
        // Bottom up: combine each node's own observation with its children's
        // already-combined estimates, weighting by the subtree size alpha.
        for leaf in &mut self.levels[0] {
            leaf.zv = leaf.noise;
        }
        let fan_out = self.fan_out as f64;
        for level_index in 1..self.height {
            let alpha = fan_out.powi(level_index as i32);
            let (lower, upper) = self.levels.split_at_mut(level_index);
            let below = &lower[level_index - 1];
            for (j, node) in upper[0].iter_mut().enumerate() {
                let base = j * self.fan_out;
                let zv_sum: f64 = below[base..base + self.fan_out].iter().map(|n| n.zv).sum();
                node.total_z_children = zv_sum;
                node.zv = ((fan_out - 1.0) * alpha * node.noise + (alpha - 1.0) * zv_sum)
                    / (fan_out * alpha - 1.0);
            }
        }

        // Top down: share each parent's residual equally among its children
        // so that children always sum exactly to their parent.
        let top = self.height - 1;
        self.levels[top][0].hbar = self.levels[top][0].zv;
        for level_index in (0..top).rev() {
            let (lower, upper) = self.levels.split_at_mut(level_index + 1);
            let parents = &upper[0];
            for (j, node) in lower[level_index].iter_mut().enumerate() {
                let parent = &parents[j / self.fan_out];
                node.hbar = node.zv + (parent.hbar - parent.total_z_children) / fan_out;
            }
        }
    }

    /// Final consistent estimates for the real (unpadded) leaves, in
    /// original bin order.
    pub fn leaves(&self) -> Vec<f64> {
        self.levels[0][..self.real_leaves]
            .iter()
            .map(|n| n.hbar)
            .collect()
    }
}

/// Boost the contiguous range `[begin, end)` of `hist` under budget
/// `epsilon`.
///
/// Singleton ranges bypass the tree entirely and return one directly noised
/// value with scale `1/epsilon`.
pub fn boost<R: Rng>(
    hist: &[f64],
    begin: usize,
    end: usize,
    epsilon: f64,
    fan_out: usize,
    rng: &mut R,
) -> Result<Vec<f64>> {
    check_range(hist, begin, end)?;
    check_budget(epsilon)?;
    check_fan_out(fan_out)?;

    if end == begin + 1 {
        return Ok(vec![hist[begin] + laplace(1.0 / epsilon, rng)]);
    }

    let mut tree = HTree::build(hist, begin, end, epsilon, fan_out, rng)?;
    tree.inference();
    Ok(tree.leaves())
}

fn check_range(hist: &[f64], begin: usize, end: usize) -> Result<()> {
    if begin >= end || end > hist.len() {
        return Err(HistError::invalid(format!(
            "bad bin range [{begin}, {end}) for {} bins",
            hist.len()
        )));
    }
    Ok(())
}

fn check_budget(epsilon: f64) -> Result<()> {
    if !epsilon.is_finite() || epsilon <= 0.0 {
        return Err(HistError::invalid(format!(
            "epsilon must be positive and finite, got {epsilon}"
        )));
    }
    Ok(())
}

fn check_fan_out(fan_out: usize) -> Result<()> {
    if fan_out < 2 {
        return Err(HistError::invalid(format!(
            "fan-out must be at least 2, got {fan_out}"
        )));
    }
    Ok(())
}

/// Common imports for hierarchical inference.
pub mod prelude {
    pub use crate::{boost, HTree};
}
