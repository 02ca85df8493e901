use super::error::{Error, Result};
use crate::rand::Rng;
use crate::rand_xoshiro;
use crate::rand_xoshiro::rand_core::{RngCore, SeedableRng};

/// index of a physical qubit in a code
pub type QubitIndex = usize;
/// code parameters `(n, k, d)`: physical qubits, logical qubits and distance
pub type CodeShape = (usize, usize, usize);

/// use Xoshiro256StarStar for deterministic random number generator
pub type DeterministicRng = rand_xoshiro::Xoshiro256StarStar;

pub trait F64Rng {
    /// uniform in [0, 1)
    fn next_f64(&mut self) -> f64;
}

impl F64Rng for DeterministicRng {
    fn next_f64(&mut self) -> f64 {
        f64::from_bits(0x3FF << 52 | self.next_u64() >> 12) - 1.
    }
}

/// the random stream of a single run: reproducible when seeded, otherwise seeded from the thread rng
pub fn create_rng(seed: Option<u64>) -> DeterministicRng {
    let seed = seed.unwrap_or_else(|| rand::thread_rng().gen());
    DeterministicRng::seed_from_u64(seed)
}

pub fn check_probability(probability: f64) -> Result<()> {
    if (0. ..=1.).contains(&probability) {
        Ok(())
    } else {
        Err(Error::InvalidProbability(probability))
    }
}

/// population variance (denominator `len`, not `len - 1`); computed from exact integer sums
pub fn population_variance(values: &[usize]) -> f64 {
    if values.is_empty() {
        return 0.;
    }
    let count = values.len() as u128;
    let mut sum: u128 = 0;
    let mut sum_squares: u128 = 0;
    for &value in values.iter() {
        let value = value as u128;
        sum += value;
        sum_squares += value * value;
    }
    // n * sum(x^2) - sum(x)^2 >= 0 by Cauchy-Schwarz
    let numerator = count * sum_squares - sum * sum;
    numerator as f64 / (count * count) as f64
}

/// a file under the system temporary folder, unique per test process
#[cfg(test)]
pub(crate) fn tmp_filename(name: &str) -> String {
    std::env::temp_dir()
        .join(format!("qec_failure_rate_{}_{}", std::process::id(), name))
        .to_string_lossy()
        .into_owned()
}
