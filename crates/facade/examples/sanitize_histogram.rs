//! Load a histogram from a text file, sanitize it with a named strategy,
//! and append the result line to an output file.
//!
//! Usage: `sanitize_histogram [method] [epsilon] [input] [output] [seed]`
//! where `method` is one of `Dwork`, `NoiseFirst`, `StructureFirst`,
//! `m_NoiseFirst`, `m_StructureFirst`.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use hist_privacy::{append_counts, load_histogram, run_strategy, Strategy};

fn main() {
    let mut args = std::env::args().skip(1);
    let method = args.next().unwrap_or_else(|| "m_NoiseFirst".to_string());
    let epsilon: f64 = args
        .next()
        .map(|a| a.parse().expect("epsilon must be a number"))
        .unwrap_or(1.0);
    let input = args.next().unwrap_or_else(|| "dataset.txt".to_string());
    let output = args
        .next()
        .unwrap_or_else(|| format!("rlt-{method}.txt"));
    let seed: u64 = args
        .next()
        .map(|a| a.parse().expect("seed must be an integer"))
        .unwrap_or(42);

    let strategy: Strategy = method.parse().expect("known method name");
    let hist = load_histogram(&input).expect("readable histogram file");
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    let counts = run_strategy(strategy, &hist, epsilon, &mut rng).expect("sanitization");
    append_counts(&output, &counts).expect("writable result file");

    println!(
        "{} bins sanitized with {method} (epsilon = {epsilon}) -> {output}",
        hist.len()
    );
}
