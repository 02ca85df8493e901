//! Capabilities
//!
//! The narrow interfaces through which the experiment driver sees a code, a decoder and an error model.
//! Implementations are shared read-only by every worker of a parallel run, hence `Send + Sync`.
//!

use super::error::Result;
use super::pauli::*;
use super::util::*;

/// a stabilizer code with its logical operators
pub trait CodeImpl: Send + Sync {
    /// human-readable name, e.g. "5-qubit"
    fn label(&self) -> String;

    fn n_k_d(&self) -> CodeShape;

    fn stabilizers(&self) -> &GeneratorSet;

    fn logical_xs(&self) -> &GeneratorSet;

    fn logical_zs(&self) -> &GeneratorSet;

    fn qubit_num(&self) -> usize {
        self.n_k_d().0
    }

    /// the full logical generator set, X-type first
    fn logicals(&self) -> GeneratorSet {
        self.logical_xs().concat(self.logical_zs())
    }

    /// logical Y generators as the row-wise product of the logical X and Z generators
    fn logical_ys(&self) -> GeneratorSet {
        self.logical_xs().row_xor(self.logical_zs())
    }

    /// check the commutation relations between stabilizers and logical operators
    fn sanity_check(&self) -> std::result::Result<(), String> {
        let (n, k, d) = self.n_k_d();
        if n == 0 || d == 0 {
            return Err(format!("invalid code parameters [[{}, {}, {}]]", n, k, d));
        }
        let stabilizers = self.stabilizers();
        let (logical_xs, logical_zs) = (self.logical_xs(), self.logical_zs());
        for (name, generators) in [("stabilizers", stabilizers), ("logical X", logical_xs), ("logical Z", logical_zs)] {
            if generators.qubit_num() != n {
                return Err(format!("{} act on {} qubits, expected {}", name, generators.qubit_num(), n));
            }
        }
        if logical_xs.len() != k || logical_zs.len() != k {
            return Err(format!(
                "expected {} logical X and Z generators, found {} and {}",
                k,
                logical_xs.len(),
                logical_zs.len()
            ));
        }
        for (i, stabilizer) in stabilizers.iter().enumerate() {
            if !stabilizer.commutes_with(stabilizers) {
                return Err(format!("stabilizer {} ({}) anticommutes with another stabilizer", i, stabilizer));
            }
        }
        for logical in logical_xs.iter().chain(logical_zs.iter()) {
            if !logical.commutes_with(stabilizers) {
                return Err(format!("logical operator {} anticommutes with a stabilizer", logical));
            }
        }
        for (i, logical_x) in logical_xs.iter().enumerate() {
            for (j, logical_z) in logical_zs.iter().enumerate() {
                if logical_x.symplectic_product(logical_z) != (i == j) {
                    return Err(format!("logical X {} and logical Z {} have wrong commutation", i, j));
                }
            }
        }
        Ok(())
    }
}

/// a decoder proposes a recovery operator given the syndrome
pub trait DecoderImpl: Send + Sync {
    fn label(&self) -> String;

    /// the returned recovery must act on `code.qubit_num()` qubits
    fn decode(
        &self,
        code: &dyn CodeImpl,
        syndrome: &Syndrome,
        error_model: &dyn ErrorModelImpl,
        probability: f64,
    ) -> Result<PauliVector>;
}

/// an i.i.d. single-qubit Pauli noise model
pub trait ErrorModelImpl: Send + Sync {
    fn label(&self) -> String;

    /// probabilities of (I, X, Y, Z) on each qubit, summing to 1
    fn probability_distribution(&self, probability: f64) -> [f64; 4];
}
