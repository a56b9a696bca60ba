//! Run every strategy over one histogram and print the mean absolute error
//! against the true counts.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use hist_privacy::core::Histogram;
use hist_privacy::{run_strategy, Strategy};

fn main() {
    let hist = Histogram::from_line(
        "12 9 14 30 2 0 7 7 41 5 5 6 19 3 3 8 0 1 25 24",
    )
    .expect("valid counts");
    let epsilon = 1.0;

    for strategy in [
        Strategy::Dwork,
        Strategy::NoiseFirst,
        Strategy::StructureFirst,
        Strategy::MedianNoiseFirst,
        Strategy::MedianStructureFirst,
    ] {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let out = run_strategy(strategy, &hist, epsilon, &mut rng).expect("sanitization");
        let mae: f64 = out
            .iter()
            .zip(hist.counts())
            .map(|(got, want)| (got - want).abs())
            .sum::<f64>()
            / hist.len() as f64;
        println!("{strategy:?}: mean absolute error {mae:.3}");
    }
}
