//! Differentially private histogram sanitization.
//!
//! This facade crate wires the workspace together: the published strategy
//! drivers (NoiseFirst, StructureFirst, and their median variants, plus the
//! per-bin Laplace baseline), the privacy-budget split calibration, and the
//! flat-text adapters that feed them.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod calibrate;
pub mod io;
pub mod strategies;

/// Crate version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use hist_privacy_core as core;
pub use hist_privacy_htree as htree;
pub use hist_privacy_partition as partition;

pub use calibrate::{opt_eps1_sae, opt_eps1_sse};
pub use io::{append_counts, load_histogram, read_histogram, write_counts};
pub use strategies::{
    dwork, m_noise_first, m_structure_first, m_structure_first_with, noise_first, run_strategy,
    structure_first, structure_first_with, Strategy, StructureFirstParams,
};

/// Common imports for histogram sanitization.
pub mod prelude {
    pub use crate::calibrate::{opt_eps1_sae, opt_eps1_sse};
    pub use crate::io::{append_counts, load_histogram, read_histogram, write_counts};
    pub use crate::strategies::{
        dwork, m_noise_first, m_structure_first, noise_first, run_strategy, structure_first,
        Strategy, StructureFirstParams,
    };
    pub use hist_privacy_core::prelude::*;
    pub use hist_privacy_htree::prelude::*;
    pub use hist_privacy_partition::prelude::*;
}
