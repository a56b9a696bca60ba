//! Privacy-budget split calibration for the StructureFirst drivers.
//!
//! Both scans minimize a closed-form expected-error upper bound over a fixed
//! grid of candidate splits. This is a deterministic grid search, not a
//! numerical optimizer, and it consumes no privacy budget.

/// Number of grid points scanned over `(0, epsilon)`.
const STEP_LEN: usize = 20;

/// Optimal `epsilon1` share for the mean (SSE) StructureFirst driver.
pub fn opt_eps1_sse(n: usize, k: usize, epsilon: f64, max_f: f64) -> f64 {
    let n = n as f64;
    let k = k as f64;
    let interval = epsilon / STEP_LEN as f64;
    let mut opt = interval;
    let mut best = f64::MAX;
    let mut eps1 = interval;
    while eps1 < epsilon {
        let structure = 8.0 * (k - 1.0).powi(2) * (2.0 * max_f + 1.0).powi(2)
            / (eps1 * (8.0 * (k - 1.0) * (2.0 * max_f + 1.0) - eps1 * n * max_f * max_f));
        let boosting = 2.0 * k / (epsilon - eps1).powi(2);
        let bound = structure + boosting;
        if bound < best {
            best = bound;
            opt = eps1;
        }
        eps1 += interval;
    }
    opt
}

/// Optimal `epsilon1` share for the median (SAE) StructureFirst driver.
pub fn opt_eps1_sae(n: usize, k: usize, epsilon: f64, max_f: f64) -> f64 {
    let n = n as f64;
    let k = k as f64;
    let interval = epsilon / STEP_LEN as f64;
    let mut opt = interval;
    let mut best = f64::MAX;
    let mut eps1 = interval;
    while eps1 < epsilon {
        let bound = 2.0 * (k - 1.0).powi(3) / (eps1 * (2.0 * (k - 1.0) - eps1 * n * max_f))
            + 2.0 * k / (1.0 - eps1).powi(2);
        if bound < best {
            best = bound;
            opt = eps1;
        }
        eps1 += interval;
    }
    opt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_lies_inside_the_budget() {
        for eps in [0.1, 0.5, 1.0, 4.0] {
            let e1 = opt_eps1_sse(1000, 100, eps, 50.0);
            assert!(e1 > 0.0 && e1 < eps, "sse split {e1} outside (0, {eps})");
            let e1 = opt_eps1_sae(1000, 100, eps, 50.0);
            assert!(e1 > 0.0 && e1 < eps, "sae split {e1} outside (0, {eps})");
        }
    }

    #[test]
    fn degenerate_k_still_returns_a_split() {
        // k = 1 makes the structure term vanish into 0/0; the scan falls
        // back to the first grid point.
        let e1 = opt_eps1_sse(10, 1, 1.0, 5.0);
        assert!(e1 > 0.0 && e1 < 1.0);
    }

    #[test]
    fn scan_is_deterministic() {
        assert_eq!(
            opt_eps1_sse(512, 51, 1.0, 123.0),
            opt_eps1_sse(512, 51, 1.0, 123.0)
        );
        assert_eq!(
            opt_eps1_sae(512, 51, 1.0, 123.0),
            opt_eps1_sae(512, 51, 1.0, 123.0)
        );
    }
}
