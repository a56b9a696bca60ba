//! Differentially private boundary adjustment via the exponential mechanism.

use hist_privacy_core::{HistError, Partition, Result};
use rand::Rng;

use crate::cost::SegmentCost;
use crate::dp::DynamicProgram;

/// Perturb the interior boundaries of `partition` under budget `epsilon1`.
///
/// Boundaries are fixed from the outermost inward. For each one, every
/// candidate position between the current floor and the boundary to its
/// right is scored by its marginal cost increase over the unconstrained
/// optimum, scores are shifted by their minimum and converted to selection
/// probabilities `exp(-epsilon1 * score / sensitivity_scale)`, and a single
/// uniform draw against the cumulative distribution picks the new position.
/// Each fixed boundary removes one degree of freedom from the next.
///
/// `sensitivity_scale` is the variant-specific normalizer of the exponent.
/// Trivial partitions are returned unperturbed since they leave no boundary
/// freedom to protect.
pub fn adjust_boundaries<C: SegmentCost, R: Rng>(
    dp: &DynamicProgram,
    cache: &mut C,
    partition: Partition,
    epsilon1: f64,
    sensitivity_scale: f64,
    rng: &mut R,
) -> Result<Partition> {
    let n = dp.num_bins();
    if partition.is_trivial(n) {
        return Ok(partition);
    }
    if !epsilon1.is_finite() || epsilon1 <= 0.0 {
        return Err(HistError::invalid(format!(
            "epsilon1 must be positive and finite, got {epsilon1}"
        )));
    }
    if !sensitivity_scale.is_finite() || sensitivity_scale <= 0.0 {
        return Err(HistError::invalid(format!(
            "sensitivity scale must be positive and finite, got {sensitivity_scale}"
        )));
    }

    let mut bounds = partition.into_bounds();
    let mut k = dp.num_segments() - 1;
    for i in (2..bounds.len()).rev() {
        let right = bounds[i];

        let mut scores = Vec::with_capacity(right - k);
        let mut min_score = f64::MAX;
        for j in k..right {
            let marginal = dp.cost_at(j - 1, k - 1) + cache.cost(j, right - 1);
            if marginal < min_score {
                min_score = marginal;
            }
            scores.push(marginal);
        }

        let mut weights = Vec::with_capacity(scores.len());
        let mut total = 0.0;
        for score in &scores {
            let weight = (-epsilon1 * (score - min_score) / sensitivity_scale).exp();
            weights.push(weight);
            total += weight;
        }

        let draw: f64 = rng.gen();
        let mut cumulative = 0.0;
        let mut chosen = weights.len() - 1;
        for (idx, weight) in weights.iter().enumerate() {
            cumulative += weight / total;
            if draw <= cumulative {
                chosen = idx;
                break;
            }
        }

        bounds[i - 1] = k + chosen;
        k -= 1;
    }

    Partition::new(bounds, n)
}
