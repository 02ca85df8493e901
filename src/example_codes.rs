//! Example Codes
//!
//! Small stabilizer codes, decoders and error models ready to be plugged into a [`crate::trial::Simulation`].
//! Every component can be built from a JSON config string, e.g. `--code-config '{"d":5}'`.
//!

use super::capability::*;
use super::error::{Error, Result};
use super::pauli::*;
use super::util::*;
use crate::derivative::Derivative;
use crate::parking_lot::RwLock;
use crate::serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

fn pauli_product(qubit_num: usize, qubits: impl IntoIterator<Item = QubitIndex>, pauli: Pauli) -> PauliVector {
    let mut vector = PauliVector::new_identity(qubit_num);
    for qubit_index in qubits {
        vector.set(qubit_index, pauli);
    }
    vector
}

fn all_qubits(qubit_num: usize, pauli: Pauli) -> PauliVector {
    pauli_product(qubit_num, 0..qubit_num, pauli)
}

fn parse_config<T: for<'de> Deserialize<'de>>(name: &str, config: serde_json::Value) -> Result<T> {
    serde_json::from_value(config).map_err(|err| Error::Config(format!("{}: {}", name, err)))
}

/// `n` bare qubits without any protection: every single-qubit Pauli is a logical error
#[derive(Debug, Clone)]
pub struct TrivialCode {
    pub n: usize,
    stabilizers: GeneratorSet,
    logical_xs: GeneratorSet,
    logical_zs: GeneratorSet,
}

impl TrivialCode {
    pub fn new(n: usize) -> Self {
        let logical = |pauli| GeneratorSet::new(n, (0..n).map(|i| PauliVector::new_single(n, i, pauli)).collect());
        Self {
            n,
            stabilizers: GeneratorSet::new_empty(n),
            logical_xs: logical(Pauli::X),
            logical_zs: logical(Pauli::Z),
        }
    }
}

impl CodeImpl for TrivialCode {
    fn label(&self) -> String {
        format!("Trivial {}", self.n)
    }
    fn n_k_d(&self) -> CodeShape {
        (self.n, self.n, 1)
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

/// bit-flip repetition code: `Z_i Z_{i+1}` checks, logical X on every qubit and logical Z on the first;
/// phase flips are not protected so the distance is 1
#[derive(Debug, Clone)]
pub struct RepetitionCode {
    pub d: usize,
    stabilizers: GeneratorSet,
    logical_xs: GeneratorSet,
    logical_zs: GeneratorSet,
}

impl RepetitionCode {
    pub fn new(d: usize) -> Self {
        let stabilizers = (0..d.saturating_sub(1)).map(|i| pauli_product(d, [i, i + 1], Pauli::Z)).collect();
        Self {
            d,
            stabilizers: GeneratorSet::new(d, stabilizers),
            logical_xs: GeneratorSet::new(d, vec![all_qubits(d, Pauli::X)]),
            logical_zs: GeneratorSet::new(d, vec![PauliVector::new_single(d, 0, Pauli::Z)]),
        }
    }
}

impl CodeImpl for RepetitionCode {
    fn label(&self) -> String {
        format!("Repetition {}", self.d)
    }
    fn n_k_d(&self) -> CodeShape {
        (self.d, 1, 1)
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

/// the [[5,1,3]] perfect code, stabilizers are the cyclic shifts of `XZZXI`
#[derive(Debug, Clone)]
pub struct FiveQubitCode {
    stabilizers: GeneratorSet,
    logical_xs: GeneratorSet,
    logical_zs: GeneratorSet,
}

impl FiveQubitCode {
    pub fn new() -> Self {
        let pattern = [Pauli::X, Pauli::Z, Pauli::Z, Pauli::X, Pauli::I];
        let stabilizers = (0..4)
            .map(|shift| {
                let paulis: Vec<Pauli> = (0..5).map(|i| pattern[(i + 5 - shift) % 5]).collect();
                PauliVector::from_paulis(&paulis)
            })
            .collect();
        Self {
            stabilizers: GeneratorSet::new(5, stabilizers),
            logical_xs: GeneratorSet::new(5, vec![all_qubits(5, Pauli::X)]),
            logical_zs: GeneratorSet::new(5, vec![all_qubits(5, Pauli::Z)]),
        }
    }
}

impl Default for FiveQubitCode {
    fn default() -> Self {
        Self::new()
    }
}

impl CodeImpl for FiveQubitCode {
    fn label(&self) -> String {
        "5-qubit".to_string()
    }
    fn n_k_d(&self) -> CodeShape {
        (5, 1, 3)
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

/// the [[7,1,3]] Steane code: X-type and Z-type checks from the parity check matrix of the Hamming code,
/// qubit `j` is in check `r` iff bit `r` of `j + 1` is set
#[derive(Debug, Clone)]
pub struct SteaneCode {
    stabilizers: GeneratorSet,
    logical_xs: GeneratorSet,
    logical_zs: GeneratorSet,
}

impl SteaneCode {
    pub fn new() -> Self {
        let check = |row: usize, pauli| pauli_product(7, (0..7).filter(|j| (j + 1) >> row & 1 == 1), pauli);
        let mut stabilizers: Vec<PauliVector> = (0..3).map(|row| check(row, Pauli::X)).collect();
        stabilizers.extend((0..3).map(|row| check(row, Pauli::Z)));
        Self {
            stabilizers: GeneratorSet::new(7, stabilizers),
            logical_xs: GeneratorSet::new(7, vec![all_qubits(7, Pauli::X)]),
            logical_zs: GeneratorSet::new(7, vec![all_qubits(7, Pauli::Z)]),
        }
    }
}

impl Default for SteaneCode {
    fn default() -> Self {
        Self::new()
    }
}

impl CodeImpl for SteaneCode {
    fn label(&self) -> String {
        "Steane".to_string()
    }
    fn n_k_d(&self) -> CodeShape {
        (7, 1, 3)
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

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TrivialCodeConfig {
    #[serde(default = "code_default_configs::n")]
    pub n: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RepetitionCodeConfig {
    #[serde(default = "code_default_configs::d")]
    pub d: usize,
}

/// components without parameters still reject unknown fields
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EmptyConfig {}

pub mod code_default_configs {
    pub fn n() -> usize {
        1
    }
    pub fn d() -> usize {
        3
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CodeType {
    /// bare qubits, config `{"n": 1}`
    Trivial,
    /// bit-flip repetition code, config `{"d": 3}`
    Repetition,
    /// [[5,1,3]] code
    FiveQubit,
    /// [[7,1,3]] Steane code
    Steane,
}

impl CodeType {
    pub fn build(&self, config: serde_json::Value) -> Result<Box<dyn CodeImpl>> {
        let code: Box<dyn CodeImpl> = match self {
            Self::Trivial => {
                let config: TrivialCodeConfig = parse_config("trivial code", config)?;
                Box::new(TrivialCode::new(config.n))
            }
            Self::Repetition => {
                let config: RepetitionCodeConfig = parse_config("repetition code", config)?;
                if config.d == 0 {
                    return Err(Error::Config("repetition code: d must be positive".to_string()));
                }
                Box::new(RepetitionCode::new(config.d))
            }
            Self::FiveQubit => {
                parse_config::<EmptyConfig>("5-qubit code", config)?;
                Box::new(FiveQubitCode::new())
            }
            Self::Steane => {
                parse_config::<EmptyConfig>("Steane code", config)?;
                Box::new(SteaneCode::new())
            }
        };
        code.sanity_check().map_err(|message| Error::Config(format!("{}: {}", code.label(), message)))?;
        Ok(code)
    }
}

/// always proposes the identity, useful as a baseline of the bare error rate
#[derive(Debug, Clone, Default)]
pub struct ZeroDecoder;

impl DecoderImpl for ZeroDecoder {
    fn label(&self) -> String {
        "Zero".to_string()
    }
    fn decode(&self, code: &dyn CodeImpl, _: &Syndrome, _: &dyn ErrorModelImpl, _: f64) -> Result<PauliVector> {
        Ok(PauliVector::new_identity(code.qubit_num()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LookupDecoderConfig {
    /// refuse codes larger than this, the table enumerates all `4^n` errors
    #[serde(default = "lookup_decoder_default_configs::max_qubits")]
    pub max_qubits: usize,
}

pub mod lookup_decoder_default_configs {
    pub fn max_qubits() -> usize {
        10
    }
}

/// most likely error of each syndrome
type LookupTable = HashMap<Syndrome, PauliVector>;

/// the key of a table: code label and shape, error model label and the bits of the probability
type LookupKey = (String, CodeShape, String, u64);

/// maximum likelihood over single errors: for every syndrome, the error of highest probability consistent with it.
/// Tables are built on first use and shared by every thread.
#[derive(Derivative)]
#[derivative(Debug)]
pub struct LookupDecoder {
    pub config: LookupDecoderConfig,
    #[derivative(Debug = "ignore")]
    tables: RwLock<HashMap<LookupKey, Arc<LookupTable>>>,
}

impl LookupDecoder {
    pub fn new(config: LookupDecoderConfig) -> Self {
        Self {
            config,
            tables: RwLock::new(HashMap::new()),
        }
    }

    fn build_table(code: &dyn CodeImpl, distribution: &[f64; 4]) -> LookupTable {
        let qubit_num = code.qubit_num();
        let stabilizers = code.stabilizers();
        let mut table: HashMap<Syndrome, (f64, PauliVector)> = HashMap::new();
        let mut error = PauliVector::new_identity(qubit_num);
        for index in 0..4usize.pow(qubit_num as u32) {
            let mut probability = 1.;
            for qubit_index in 0..qubit_num {
                let symbol = index >> (2 * qubit_index) & 3;
                error.set(qubit_index, Pauli::ALL[symbol]);
                probability *= distribution[symbol];
            }
            let syndrome = error.syndrome(stabilizers);
            match table.get_mut(&syndrome) {
                Some(entry) => {
                    if probability > entry.0 {
                        *entry = (probability, error.clone());
                    }
                }
                None => {
                    table.insert(syndrome, (probability, error.clone()));
                }
            }
        }
        table.into_iter().map(|(syndrome, (_, error))| (syndrome, error)).collect()
    }

    fn table(&self, code: &dyn CodeImpl, error_model: &dyn ErrorModelImpl, probability: f64) -> Arc<LookupTable> {
        let key = (code.label(), code.n_k_d(), error_model.label(), probability.to_bits());
        if let Some(table) = self.tables.read().get(&key) {
            return table.clone();
        }
        let table = Arc::new(Self::build_table(code, &error_model.probability_distribution(probability)));
        debug!(code = %key.0, probability, syndromes = table.len(), "lookup table built");
        self.tables.write().entry(key).or_insert(table).clone()
    }
}

impl DecoderImpl for LookupDecoder {
    fn label(&self) -> String {
        "Lookup".to_string()
    }
    fn decode(&self, code: &dyn CodeImpl, syndrome: &Syndrome, error_model: &dyn ErrorModelImpl, probability: f64) -> Result<PauliVector> {
        if code.qubit_num() > self.config.max_qubits || 2 * code.qubit_num() >= usize::BITS as usize {
            return Err(Error::Decoder {
                decoder: self.label(),
                message: format!(
                    "code `{}` has {} qubits, more than max_qubits = {}",
                    code.label(),
                    code.qubit_num(),
                    self.config.max_qubits
                ),
            });
        }
        let table = self.table(code, error_model, probability);
        table.get(syndrome).cloned().ok_or_else(|| Error::Decoder {
            decoder: self.label(),
            message: format!("syndrome {} is not produced by any error", syndrome),
        })
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DecoderType {
    /// identity recovery
    Zero,
    /// exhaustive most-likely-error table, config `{"max_qubits": 10}`
    Lookup,
}

impl DecoderType {
    pub fn build(&self, config: serde_json::Value) -> Result<Box<dyn DecoderImpl>> {
        Ok(match self {
            Self::Zero => {
                parse_config::<EmptyConfig>("zero decoder", config)?;
                Box::new(ZeroDecoder)
            }
            Self::Lookup => Box::new(LookupDecoder::new(parse_config("lookup decoder", config)?)),
        })
    }
}

/// X, Y and Z each with probability `p / 3`
#[derive(Debug, Clone, Default)]
pub struct DepolarizingErrorModel;

impl ErrorModelImpl for DepolarizingErrorModel {
    fn label(&self) -> String {
        "Depolarizing".to_string()
    }
    fn probability_distribution(&self, probability: f64) -> [f64; 4] {
        let p = probability / 3.;
        [1. - probability, p, p, p]
    }
}

#[derive(Debug, Clone, Default)]
pub struct BitFlipErrorModel;

impl ErrorModelImpl for BitFlipErrorModel {
    fn label(&self) -> String {
        "Bit-flip".to_string()
    }
    fn probability_distribution(&self, probability: f64) -> [f64; 4] {
        [1. - probability, probability, 0., 0.]
    }
}

#[derive(Debug, Clone, Default)]
pub struct PhaseFlipErrorModel;

impl ErrorModelImpl for PhaseFlipErrorModel {
    fn label(&self) -> String {
        "Phase-flip".to_string()
    }
    fn probability_distribution(&self, probability: f64) -> [f64; 4] {
        [1. - probability, 0., 0., probability]
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BiasedErrorModelConfig {
    /// ratio between the probability of the dominant Pauli and the sum of the other two
    #[serde(default = "biased_error_model_default_configs::bias")]
    pub bias: f64,
    #[serde(default = "biased_error_model_default_configs::axis")]
    pub axis: Pauli,
}

pub mod biased_error_model_default_configs {
    use super::Pauli;
    pub fn bias() -> f64 {
        10.
    }
    pub fn axis() -> Pauli {
        Pauli::Z
    }
}

/// biased depolarizing noise: the `axis` Pauli with probability `bias / (bias + 1) * p`,
/// each of the other two with `p / (2 (bias + 1))`
#[derive(Debug, Clone)]
pub struct BiasedErrorModel {
    pub bias: f64,
    pub axis: Pauli,
}

impl BiasedErrorModel {
    pub fn new(config: BiasedErrorModelConfig) -> Result<Self> {
        if config.axis == Pauli::I {
            return Err(Error::Config("biased error model: axis must be one of X, Y, Z".to_string()));
        }
        if !config.bias.is_finite() || config.bias <= 0. {
            return Err(Error::Config(format!("biased error model: invalid bias {}", config.bias)));
        }
        Ok(Self {
            bias: config.bias,
            axis: config.axis,
        })
    }
}

impl ErrorModelImpl for BiasedErrorModel {
    fn label(&self) -> String {
        format!("Biased-depolarizing (bias={}, axis={})", self.bias, self.axis.to_char())
    }
    fn probability_distribution(&self, probability: f64) -> [f64; 4] {
        let p_axis = self.bias / (self.bias + 1.) * probability;
        let p_other = probability / (2. * (self.bias + 1.));
        let mut distribution = [1. - probability, p_other, p_other, p_other];
        let axis_index = Pauli::ALL.iter().position(|pauli| *pauli == self.axis).unwrap_or(3);
        distribution[axis_index] = p_axis;
        distribution
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorModelType {
    /// X, Y, Z each with p/3
    Depolarizing,
    /// X with p
    BitFlip,
    /// Z with p
    PhaseFlip,
    /// biased depolarizing, config `{"bias": 10, "axis": "Z"}`
    Biased,
}

impl ErrorModelType {
    pub fn build(&self, config: serde_json::Value) -> Result<Box<dyn ErrorModelImpl>> {
        Ok(match self {
            Self::Depolarizing => {
                parse_config::<EmptyConfig>("depolarizing error model", config)?;
                Box::new(DepolarizingErrorModel)
            }
            Self::BitFlip => {
                parse_config::<EmptyConfig>("bit-flip error model", config)?;
                Box::new(BitFlipErrorModel)
            }
            Self::PhaseFlip => {
                parse_config::<EmptyConfig>("phase-flip error model", config)?;
                Box::new(PhaseFlipErrorModel)
            }
            Self::Biased => Box::new(BiasedErrorModel::new(parse_config("biased error model", config)?)?),
        })
    }
}
