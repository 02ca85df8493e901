//! Trial Engine
//!
//! A single Monte Carlo trial: sample an error, measure its syndrome, ask the decoder for a recovery and classify the
//! residual operator `recovery ⊕ error` by its commutation with the stabilizers and the logical operators.
//!

use super::capability::*;
use super::error::{Error, Result};
use super::pauli::*;
use super::record::StatisticsRecord;
use super::util::*;
use crate::derivative::Derivative;
use crate::serde::Serialize;
use crate::serde_json;

/// tolerance on the total probability returned by an error model
pub const DISTRIBUTION_TOLERANCE: f64 = 1e-9;

/// one experiment point: the code, decoder and error model are shared read-only by every trial
#[derive(Derivative)]
#[derivative(Debug)]
pub struct Simulation<'a> {
    #[derivative(Debug = "ignore")]
    pub code: &'a dyn CodeImpl,
    #[derivative(Debug = "ignore")]
    pub decoder: &'a dyn DecoderImpl,
    #[derivative(Debug = "ignore")]
    pub error_model: &'a dyn ErrorModelImpl,
    pub probability: f64,
    /// probabilities of (I, X, Y, Z) on every qubit
    pub distribution: [f64; 4],
    /// cumulative form of `distribution`, the last entry forced to cover every draw
    cumulative: [f64; 4],
    #[derivative(Debug = "ignore")]
    logicals: GeneratorSet,
    #[derivative(Debug = "ignore")]
    logical_ys: GeneratorSet,
}

/// classification of a single trial
#[derive(Debug, Clone, PartialEq)]
pub struct TrialOutcome {
    /// the residual is in the stabilizer group up to a trivial logical
    pub success: bool,
    pub error_weight: usize,
    pub failure_x: bool,
    pub failure_y: bool,
    pub failure_z: bool,
    /// present only when the residual anticommutes with a stabilizer
    pub violation: Option<Box<CodespaceViolation>>,
}

impl TrialOutcome {
    pub fn codespace_violated(&self) -> bool {
        self.violation.is_some()
    }
}

/// diagnostic of a recovery that does not return to the codespace; fields are kept in alphabetical order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CodespaceViolation {
    pub code: String,
    pub decoder: String,
    pub error: PackedPauli,
    pub n_k_d: CodeShape,
    pub recovery: PackedPauli,
}

impl CodespaceViolation {
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| format!("{:?}", self))
    }
}

impl<'a> Simulation<'a> {
    pub fn new(
        code: &'a dyn CodeImpl,
        decoder: &'a dyn DecoderImpl,
        error_model: &'a dyn ErrorModelImpl,
        probability: f64,
    ) -> Result<Self> {
        check_probability(probability)?;
        let distribution = error_model.probability_distribution(probability);
        let invalid = distribution.iter().any(|value| !value.is_finite() || *value < 0.)
            || (distribution.iter().sum::<f64>() - 1.).abs() > DISTRIBUTION_TOLERANCE;
        if invalid {
            return Err(Error::InvalidDistribution {
                error_model: error_model.label(),
                probability,
                distribution,
            });
        }
        let mut cumulative = [0.; 4];
        let mut sum = 0.;
        for (i, value) in distribution.iter().enumerate() {
            sum += value;
            cumulative[i] = sum;
        }
        // rounding must never let a draw fall off the end: the last symbol with positive probability takes the rest
        let last_positive = distribution.iter().rposition(|value| *value > 0.).unwrap_or(0);
        for value in cumulative[last_positive..].iter_mut() {
            *value = f64::INFINITY;
        }
        Ok(Self {
            code,
            decoder,
            error_model,
            probability,
            distribution,
            cumulative,
            logicals: code.logicals(),
            logical_ys: code.logical_ys(),
        })
    }

    pub fn qubit_num(&self) -> usize {
        self.code.qubit_num()
    }

    /// i.i.d. error on every qubit
    pub fn sample_error<R: F64Rng>(&self, rng: &mut R) -> PauliVector {
        let qubit_num = self.qubit_num();
        let mut error = PauliVector::new_identity(qubit_num);
        for qubit_index in 0..qubit_num {
            let draw = rng.next_f64();
            let symbol = self.cumulative.iter().position(|bound| draw < *bound).unwrap_or(3);
            if symbol != 0 {
                error.set(qubit_index, Pauli::ALL[symbol]);
            }
        }
        error
    }

    /// decode a given error and classify the residual
    pub fn trial(&self, error: &PauliVector) -> Result<TrialOutcome> {
        let code = self.code;
        let stabilizers = code.stabilizers();
        let syndrome = error.syndrome(stabilizers);
        let recovery = self.decoder.decode(code, &syndrome, self.error_model, self.probability)?;
        if recovery.qubit_num() != code.qubit_num() {
            return Err(Error::RecoveryLength {
                decoder: self.decoder.label(),
                code: code.label(),
                expected: code.qubit_num(),
                found: recovery.qubit_num(),
            });
        }
        let residual = &recovery ^ error;
        let commutes_stabilizers = residual.commutes_with(stabilizers);
        let commutes_logicals = residual.commutes_with(&self.logicals);
        let commutes_logical_xs = residual.commutes_with(code.logical_xs());
        let commutes_logical_ys = residual.commutes_with(&self.logical_ys);
        let commutes_logical_zs = residual.commutes_with(code.logical_zs());
        let violation = if commutes_stabilizers {
            None
        } else {
            Some(Box::new(CodespaceViolation {
                code: code.label(),
                decoder: self.decoder.label(),
                error: error.pack(),
                n_k_d: code.n_k_d(),
                recovery: recovery.pack(),
            }))
        };
        Ok(TrialOutcome {
            success: commutes_stabilizers && commutes_logicals,
            error_weight: error.weight(),
            failure_x: commutes_stabilizers && !commutes_logical_xs,
            failure_y: commutes_stabilizers && !commutes_logical_ys,
            failure_z: commutes_stabilizers && !commutes_logical_zs,
            violation,
        })
    }

    /// an empty record labelled with this experiment point
    pub fn new_record(&self) -> StatisticsRecord {
        StatisticsRecord::new(
            self.code.label(),
            self.code.n_k_d(),
            self.decoder.label(),
            Some(self.error_model.label()),
            self.probability,
        )
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;

    /// bare qubits without stabilizers, X and Z on the first qubit as logicals
    pub struct StubQubit {
        qubit_num: usize,
        stabilizers: GeneratorSet,
        logical_xs: GeneratorSet,
        logical_zs: GeneratorSet,
    }

    impl StubQubit {
        pub fn new() -> Self {
            Self::with_qubits(1)
        }

        pub fn with_qubits(qubit_num: usize) -> Self {
            Self {
                qubit_num,
                stabilizers: GeneratorSet::new_empty(qubit_num),
                logical_xs: GeneratorSet::new(qubit_num, vec![PauliVector::new_single(qubit_num, 0, Pauli::X)]),
                logical_zs: GeneratorSet::new(qubit_num, vec![PauliVector::new_single(qubit_num, 0, Pauli::Z)]),
            }
        }
    }

    impl CodeImpl for StubQubit {
        fn label(&self) -> String {
            "stub qubit".to_string()
        }
        fn n_k_d(&self) -> CodeShape {
            (self.qubit_num, 1, 1)
        }
        fn stabilizers(&self) -> &GeneratorSet {
            &self.stabilizers
        }
        fn logical_xs(&self) -> &GeneratorSet {
            &self.logical_xs
        }
        fn logical_zs(&self) -> &GeneratorSet {
            &self.logical_zs
        }
    }

    /// three qubits protected against bit flips by `ZZI`, `IZZ`
    pub struct StubRepetition {
        stabilizers: GeneratorSet,
        logical_xs: GeneratorSet,
        logical_zs: GeneratorSet,
    }

    impl StubRepetition {
        pub fn new() -> Self {
            Self {
                stabilizers: GeneratorSet::new(3, vec!["ZZI".parse().unwrap(), "IZZ".parse().unwrap()]),
                logical_xs: GeneratorSet::new(3, vec!["XXX".parse().unwrap()]),
                logical_zs: GeneratorSet::new(3, vec!["ZII".parse().unwrap()]),
            }
        }
    }

    impl CodeImpl for StubRepetition {
        fn label(&self) -> String {
            "stub repetition".to_string()
        }
        fn n_k_d(&self) -> CodeShape {
            (3, 1, 1)
        }
        fn stabilizers(&self) -> &GeneratorSet {
            &self.stabilizers
        }
        fn logical_xs(&self) -> &GeneratorSet {
            &self.logical_xs
        }
        fn logical_zs(&self) -> &GeneratorSet {
            &self.logical_zs
        }
    }

    /// always proposes a fixed recovery
    pub struct StubDecoder {
        pub recovery: PauliVector,
    }

    impl StubDecoder {
        pub fn identity(qubit_num: usize) -> Self {
            Self {
                recovery: PauliVector::new_identity(qubit_num),
            }
        }
    }

    impl DecoderImpl for StubDecoder {
        fn label(&self) -> String {
            "stub decoder".to_string()
        }
        fn decode(&self, _: &dyn CodeImpl, _: &Syndrome, _: &dyn ErrorModelImpl, _: f64) -> Result<PauliVector> {
            Ok(self.recovery.clone())
        }
    }

    /// always fails
    pub struct StubBrokenDecoder;

    impl DecoderImpl for StubBrokenDecoder {
        fn label(&self) -> String {
            "broken".to_string()
        }
        fn decode(&self, _: &dyn CodeImpl, _: &Syndrome, _: &dyn ErrorModelImpl, _: f64) -> Result<PauliVector> {
            Err(Error::Decoder {
                decoder: self.label(),
                message: "unsupported syndrome".to_string(),
            })
        }
    }

    /// returns the given distribution regardless of the probability
    pub struct StubErrorModel {
        pub distribution: [f64; 4],
    }

    impl ErrorModelImpl for StubErrorModel {
        fn label(&self) -> String {
            "stub noise".to_string()
        }
        fn probability_distribution(&self, _: f64) -> [f64; 4] {
            self.distribution
        }
    }

    pub struct StubRng {
        pub values: Vec<f64>,
        pub index: usize,
    }

    impl F64Rng for StubRng {
        fn next_f64(&mut self) -> f64 {
            let value = self.values[self.index % self.values.len()];
            self.index += 1;
            value
        }
    }

    fn pauli(text: &str) -> PauliVector {
        text.parse().unwrap()
    }

    #[test]
    fn trial_identity_error_succeeds() {
        // cargo test trial_identity_error_succeeds -- --nocapture
        let code = StubRepetition::new();
        let decoder = StubDecoder::identity(3);
        let error_model = StubErrorModel {
            distribution: [1., 0., 0., 0.],
        };
        let simulation = Simulation::new(&code, &decoder, &error_model, 0.).unwrap();
        let outcome = simulation.trial(&pauli("III")).unwrap();
        assert!(outcome.success);
        assert_eq!(outcome.error_weight, 0);
        assert!(!outcome.failure_x && !outcome.failure_y && !outcome.failure_z);
        assert!(!outcome.codespace_violated());
    }

    #[test]
    fn trial_logical_axis_classification() {
        // cargo test trial_logical_axis_classification -- --nocapture
        let code = StubQubit::new();
        let decoder = StubDecoder::identity(1);
        let error_model = StubErrorModel {
            distribution: [0., 1., 0., 0.],
        };
        let simulation = Simulation::new(&code, &decoder, &error_model, 0.5).unwrap();
        // X anticommutes with logical Z and logical Y
        let outcome = simulation.trial(&pauli("X")).unwrap();
        assert!(!outcome.success);
        assert_eq!((outcome.failure_x, outcome.failure_y, outcome.failure_z), (false, true, true));
        let outcome = simulation.trial(&pauli("Z")).unwrap();
        assert_eq!((outcome.failure_x, outcome.failure_y, outcome.failure_z), (true, true, false));
        let outcome = simulation.trial(&pauli("Y")).unwrap();
        assert_eq!((outcome.failure_x, outcome.failure_y, outcome.failure_z), (true, false, true));
        assert_eq!(outcome.error_weight, 1);
    }

    #[test]
    fn trial_recovery_cancels_error() {
        // cargo test trial_recovery_cancels_error -- --nocapture
        let code = StubRepetition::new();
        let decoder = StubDecoder { recovery: pauli("XII") };
        let error_model = StubErrorModel {
            distribution: [0.9, 0.1, 0., 0.],
        };
        let simulation = Simulation::new(&code, &decoder, &error_model, 0.1).unwrap();
        let outcome = simulation.trial(&pauli("XII")).unwrap();
        assert!(outcome.success);
        assert_eq!(outcome.error_weight, 1);
        // recovery XII on error IXX leaves the logical XXX
        let outcome = simulation.trial(&pauli("IXX")).unwrap();
        assert!(!outcome.success);
        assert_eq!((outcome.failure_x, outcome.failure_y, outcome.failure_z), (false, true, true));
    }

    #[test]
    fn trial_codespace_violation_is_reported() {
        // cargo test trial_codespace_violation_is_reported -- --nocapture
        let code = StubRepetition::new();
        let decoder = StubDecoder::identity(3);
        let error_model = StubErrorModel {
            distribution: [0.9, 0.1, 0., 0.],
        };
        let simulation = Simulation::new(&code, &decoder, &error_model, 0.1).unwrap();
        let outcome = simulation.trial(&pauli("XII")).unwrap();
        assert!(!outcome.success);
        assert!(!outcome.failure_x && !outcome.failure_y && !outcome.failure_z);
        let violation = outcome.violation.expect("recovery leaves the codespace");
        assert_eq!(
            violation.to_json(),
            r#"{"code":"stub repetition","decoder":"stub decoder","error":{"hex":"20","length":6},"n_k_d":[3,1,1],"recovery":{"hex":"00","length":6}}"#
        );
    }

    #[test]
    fn trial_decoder_errors_propagate() {
        // cargo test trial_decoder_errors_propagate -- --nocapture
        let code = StubRepetition::new();
        let error_model = StubErrorModel {
            distribution: [1., 0., 0., 0.],
        };
        let simulation = Simulation::new(&code, &StubBrokenDecoder, &error_model, 0.).unwrap();
        assert!(matches!(simulation.trial(&pauli("III")), Err(Error::Decoder { .. })));
        let short_decoder = StubDecoder::identity(2);
        let simulation = Simulation::new(&code, &short_decoder, &error_model, 0.).unwrap();
        assert!(matches!(
            simulation.trial(&pauli("III")),
            Err(Error::RecoveryLength { expected: 3, found: 2, .. })
        ));
    }

    #[test]
    fn trial_invalid_distribution_rejected() {
        // cargo test trial_invalid_distribution_rejected -- --nocapture
        let code = StubQubit::new();
        let decoder = StubDecoder::identity(1);
        for distribution in [[0.5, 0.5, 0.5, 0.], [1.1, -0.1, 0., 0.], [f64::NAN, 1., 0., 0.]] {
            let error_model = StubErrorModel { distribution };
            assert!(matches!(
                Simulation::new(&code, &decoder, &error_model, 0.1),
                Err(Error::InvalidDistribution { .. })
            ));
        }
        let error_model = StubErrorModel {
            distribution: [1., 0., 0., 0.],
        };
        assert!(matches!(
            Simulation::new(&code, &decoder, &error_model, -0.1),
            Err(Error::InvalidProbability(_))
        ));
    }

    #[test]
    fn trial_sample_error_follows_distribution() {
        // cargo test trial_sample_error_follows_distribution -- --nocapture
        let code = StubRepetition::new();
        let decoder = StubDecoder::identity(3);
        let error_model = StubErrorModel {
            distribution: [0.25, 0.25, 0.5, 0.],
        };
        let simulation = Simulation::new(&code, &decoder, &error_model, 0.).unwrap();
        let mut rng = StubRng {
            values: vec![0.1, 0.3, 0.99999999],
            index: 0,
        };
        assert_eq!(simulation.sample_error(&mut rng), pauli("IXY"));
        // an all-identity distribution never produces errors
        let error_model = StubErrorModel {
            distribution: [1., 0., 0., 0.],
        };
        let simulation = Simulation::new(&code, &decoder, &error_model, 0.).unwrap();
        let mut rng = create_rng(Some(7));
        for _ in 0..100 {
            assert!(simulation.sample_error(&mut rng).is_identity());
        }
    }
}
