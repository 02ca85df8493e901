//! Binary Symplectic Algebra
//!
//! Pauli operators on `n` qubits in binary symplectic form: an X-part and a Z-part of `n` bits each.
//! Two operators commute iff their symplectic product is 0; the syndrome of an error is its symplectic
//! product with each stabilizer generator.
//!

use super::error::{Error, Result};
use super::util::*;
use crate::serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{BitXor, BitXorAssign};
use std::str::FromStr;

const WORD_BITS: usize = 64;

/// single-qubit Pauli operator, phases are ignored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Pauli {
    I,
    X,
    Y,
    Z,
}

impl Pauli {
    /// in the same order as [`crate::capability::ErrorModelImpl::probability_distribution`]
    pub const ALL: [Pauli; 4] = [Pauli::I, Pauli::X, Pauli::Y, Pauli::Z];

    /// (x bit, z bit)
    pub fn bits(self) -> (bool, bool) {
        match self {
            Pauli::I => (false, false),
            Pauli::X => (true, false),
            Pauli::Y => (true, true),
            Pauli::Z => (false, true),
        }
    }

    pub fn from_bits(x: bool, z: bool) -> Self {
        match (x, z) {
            (false, false) => Pauli::I,
            (true, false) => Pauli::X,
            (true, true) => Pauli::Y,
            (false, true) => Pauli::Z,
        }
    }

    pub fn to_char(self) -> char {
        match self {
            Pauli::I => 'I',
            Pauli::X => 'X',
            Pauli::Y => 'Y',
            Pauli::Z => 'Z',
        }
    }

    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'I' => Some(Pauli::I),
            'X' => Some(Pauli::X),
            'Y' => Some(Pauli::Y),
            'Z' => Some(Pauli::Z),
            _ => None,
        }
    }
}

/// an `n`-qubit Pauli operator in binary symplectic form
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct PauliVector {
    qubit_num: usize,
    x: Vec<u64>,
    z: Vec<u64>,
}

fn word_num(qubit_num: usize) -> usize {
    (qubit_num + WORD_BITS - 1) / WORD_BITS
}

impl PauliVector {
    pub fn new_identity(qubit_num: usize) -> Self {
        Self {
            qubit_num,
            x: vec![0; word_num(qubit_num)],
            z: vec![0; word_num(qubit_num)],
        }
    }

    pub fn from_paulis(paulis: &[Pauli]) -> Self {
        let mut vector = Self::new_identity(paulis.len());
        for (qubit_index, pauli) in paulis.iter().enumerate() {
            vector.set(qubit_index, *pauli);
        }
        vector
    }

    /// operator acting as `pauli` on a single qubit and identity elsewhere
    pub fn new_single(qubit_num: usize, qubit_index: QubitIndex, pauli: Pauli) -> Self {
        let mut vector = Self::new_identity(qubit_num);
        vector.set(qubit_index, pauli);
        vector
    }

    pub fn qubit_num(&self) -> usize {
        self.qubit_num
    }

    pub fn get(&self, qubit_index: QubitIndex) -> Pauli {
        assert!(qubit_index < self.qubit_num, "qubit {} out of range {}", qubit_index, self.qubit_num);
        let (word, bit) = (qubit_index / WORD_BITS, qubit_index % WORD_BITS);
        Pauli::from_bits(self.x[word] >> bit & 1 == 1, self.z[word] >> bit & 1 == 1)
    }

    pub fn set(&mut self, qubit_index: QubitIndex, pauli: Pauli) {
        assert!(qubit_index < self.qubit_num, "qubit {} out of range {}", qubit_index, self.qubit_num);
        let (word, bit) = (qubit_index / WORD_BITS, qubit_index % WORD_BITS);
        let (x, z) = pauli.bits();
        self.x[word] = self.x[word] & !(1 << bit) | (x as u64) << bit;
        self.z[word] = self.z[word] & !(1 << bit) | (z as u64) << bit;
    }

    pub fn paulis(&self) -> Vec<Pauli> {
        (0..self.qubit_num).map(|qubit_index| self.get(qubit_index)).collect()
    }

    /// number of qubits with a non-identity component
    pub fn weight(&self) -> usize {
        self.x.iter().zip(self.z.iter()).map(|(x, z)| (x | z).count_ones() as usize).sum()
    }

    pub fn is_identity(&self) -> bool {
        self.x.iter().chain(self.z.iter()).all(|word| *word == 0)
    }

    /// `true` iff the two operators anticommute
    pub fn symplectic_product(&self, other: &Self) -> bool {
        assert_eq!(self.qubit_num, other.qubit_num, "operators must act on the same number of qubits");
        let mut parity = 0;
        for i in 0..self.x.len() {
            parity ^= ((self.x[i] & other.z[i]) ^ (self.z[i] & other.x[i])).count_ones() & 1;
        }
        parity == 1
    }

    /// symplectic product against every generator
    pub fn syndrome(&self, generators: &GeneratorSet) -> Syndrome {
        Syndrome {
            bits: generators.iter().map(|generator| self.symplectic_product(generator)).collect(),
        }
    }

    pub fn commutes_with(&self, generators: &GeneratorSet) -> bool {
        generators.iter().all(|generator| !self.symplectic_product(generator))
    }

    /// bits of the binary symplectic form, X-part first
    fn bsf_bits(&self) -> Vec<bool> {
        let mut bits = Vec::with_capacity(2 * self.qubit_num);
        for part in [&self.x, &self.z] {
            for qubit_index in 0..self.qubit_num {
                bits.push(part[qubit_index / WORD_BITS] >> (qubit_index % WORD_BITS) & 1 == 1);
            }
        }
        bits
    }

    /// compact storable form: the binary symplectic form read as a big-endian hex number
    pub fn pack(&self) -> PackedPauli {
        let bits = self.bsf_bits();
        let padding = (4 - bits.len() % 4) % 4;
        let padded: Vec<bool> = std::iter::repeat(false).take(padding).chain(bits.into_iter()).collect();
        let hex = padded
            .chunks(4)
            .map(|nibble| {
                let value = nibble.iter().fold(0u32, |acc, bit| acc << 1 | *bit as u32);
                std::char::from_digit(value, 16).unwrap_or('0')
            })
            .collect();
        PackedPauli {
            hex,
            length: 2 * self.qubit_num,
        }
    }

    pub fn unpack(packed: &PackedPauli) -> Result<Self> {
        let PackedPauli { hex, length } = packed;
        if length % 2 != 0 || hex.len() * 4 < *length {
            return Err(Error::InvalidPauli(format!("invalid packed operator {:?}", packed)));
        }
        let mut bits = Vec::with_capacity(hex.len() * 4);
        for c in hex.chars() {
            let value = c
                .to_digit(16)
                .ok_or_else(|| Error::InvalidPauli(format!("invalid hex digit `{}` in packed operator", c)))?;
            for shift in (0..4).rev() {
                bits.push(value >> shift & 1 == 1);
            }
        }
        let (padding, bits) = bits.split_at(bits.len() - length);
        if padding.iter().any(|bit| *bit) {
            return Err(Error::InvalidPauli(format!("packed operator {:?} overflows its length", packed)));
        }
        let qubit_num = length / 2;
        let mut vector = Self::new_identity(qubit_num);
        for qubit_index in 0..qubit_num {
            vector.set(qubit_index, Pauli::from_bits(bits[qubit_index], bits[qubit_num + qubit_index]));
        }
        Ok(vector)
    }
}

impl BitXorAssign<&PauliVector> for PauliVector {
    fn bitxor_assign(&mut self, other: &PauliVector) {
        assert_eq!(self.qubit_num, other.qubit_num, "operators must act on the same number of qubits");
        for i in 0..self.x.len() {
            self.x[i] ^= other.x[i];
            self.z[i] ^= other.z[i];
        }
    }
}

/// product of two operators up to phase
impl<'a, 'b> BitXor<&'b PauliVector> for &'a PauliVector {
    type Output = PauliVector;
    fn bitxor(self, other: &'b PauliVector) -> PauliVector {
        let mut result = self.clone();
        result ^= other;
        result
    }
}

impl fmt::Display for PauliVector {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let text: String = self.paulis().into_iter().map(Pauli::to_char).collect();
        write!(f, "{}", text)
    }
}

impl fmt::Debug for PauliVector {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "PauliVector({})", self)
    }
}

impl FromStr for PauliVector {
    type Err = Error;
    fn from_str(text: &str) -> Result<Self> {
        let paulis = text
            .chars()
            .map(|c| Pauli::from_char(c).ok_or_else(|| Error::InvalidPauli(format!("unknown symbol `{}` in \"{}\"", c, text))))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::from_paulis(&paulis))
    }
}

impl Serialize for PauliVector {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for PauliVector {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

/// storable form of a [`PauliVector`]: hex digits of the binary symplectic form and its bit length
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackedPauli {
    pub hex: String,
    pub length: usize,
}

/// a list of generators acting on the same number of qubits, e.g. stabilizers or logical operators
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorSet {
    qubit_num: usize,
    generators: Vec<PauliVector>,
}

impl GeneratorSet {
    pub fn new(qubit_num: usize, generators: Vec<PauliVector>) -> Self {
        for generator in generators.iter() {
            assert_eq!(generator.qubit_num(), qubit_num, "generator {} acts on a different number of qubits", generator);
        }
        Self { qubit_num, generators }
    }

    pub fn new_empty(qubit_num: usize) -> Self {
        Self::new(qubit_num, vec![])
    }

    pub fn qubit_num(&self) -> usize {
        self.qubit_num
    }

    pub fn len(&self) -> usize {
        self.generators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.generators.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PauliVector> {
        self.generators.iter()
    }

    /// all generators of `self` followed by all generators of `other`
    pub fn concat(&self, other: &Self) -> Self {
        assert_eq!(self.qubit_num, other.qubit_num, "generator sets must act on the same number of qubits");
        let mut generators = self.generators.clone();
        generators.extend(other.generators.iter().cloned());
        Self::new(self.qubit_num, generators)
    }

    /// row-wise product, e.g. logical Y generators from logical X and logical Z generators
    pub fn row_xor(&self, other: &Self) -> Self {
        assert_eq!(self.len(), other.len(), "generator sets must have the same number of rows");
        let generators = self.iter().zip(other.iter()).map(|(a, b)| a ^ b).collect();
        Self::new(self.qubit_num, generators)
    }
}

/// symplectic products of an operator against a generator set, `true` meaning anticommute
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Syndrome {
    pub bits: Vec<bool>,
}

impl Syndrome {
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    pub fn is_trivial(&self) -> bool {
        self.bits.iter().all(|bit| !bit)
    }
}

impl fmt::Display for Syndrome {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let text: String = self.bits.iter().map(|bit| if *bit { '1' } else { '0' }).collect();
        write!(f, "{}", text)
    }
}
