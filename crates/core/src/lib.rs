//! Core primitives for differentially private histogram sanitization.
//!
//! This crate provides the shared building blocks for the sanitization
//! strategies: the validated histogram/partition data model, the error
//! taxonomy, and Laplace noise generation.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod histogram;
pub mod noise;

pub use error::{HistError, Result};
pub use histogram::{Histogram, Partition};
pub use noise::{add_laplace_noise, laplace, LaplaceMechanism};

/// Common imports for downstream users.
pub mod prelude {
    pub use crate::{
        add_laplace_noise, laplace, HistError, Histogram, LaplaceMechanism, Partition, Result,
    };
}
