//! Optimal histogram partitioning for differentially private release.
//!
//! This crate houses the structure-selection half of the sanitization
//! pipeline: O(1)/memoized segment-cost caches, the exact dynamic program
//! that segments a histogram into K contiguous buckets of minimal error, and
//! the exponential-mechanism pass that makes the chosen boundaries
//! themselves differentially private.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod boundary;
pub mod cost;
pub mod dp;

pub use boundary::adjust_boundaries;
pub use cost::{CostKind, SaeCost, SegmentCost, SseCost};
pub use dp::{find_opt_k, find_optimal_k, partition, partition_with, DynamicProgram};

/// Common imports for partitioning.
pub mod prelude {
    pub use crate::{
        adjust_boundaries, find_opt_k, find_optimal_k, partition, partition_with, CostKind,
        DynamicProgram, SaeCost, SegmentCost, SseCost,
    };
}
