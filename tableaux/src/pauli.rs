use std::fmt;
use std::ops::{Mul, MulAssign};
use std::str::FromStr;

use quantum_core::{subscript_digits, Axis};

use crate::error::Error;

/// Pauli operator `iᵉ·X^x·Z^z` on a fixed number of qubits, stored in xz-form.
///
/// The phase exponent `e` is kept modulo 4. Hermitian operators `±P₀⊗…⊗Pₙ` have
/// `e = 2·sign + |x ∧ z|`, because `Y = i·X·Z`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PauliString {
    x_bits: Vec<bool>,
    z_bits: Vec<bool>,
    exponent: u8,
}

impl PauliString {
    #[must_use]
    pub fn identity(num_qubits: usize) -> Self {
        PauliString {
            x_bits: vec![false; num_qubits],
            z_bits: vec![false; num_qubits],
            exponent: 0,
        }
    }

    /// Single qubit Pauli `axis` on `qubit`, identity elsewhere.
    #[must_use]
    pub fn single(num_qubits: usize, qubit: usize, axis: Axis) -> Self {
        let mut res = Self::identity(num_qubits);
        res.x_bits[qubit] = axis.x_bit();
        res.z_bits[qubit] = axis.z_bit();
        res.exponent = u8::from(axis == Axis::Y);
        res
    }

    /// Hermitian Pauli `(-1)^sign·P₀⊗…⊗Pₙ` given by the tableau row `(x_bits, z_bits, sign)`.
    #[must_use]
    pub fn from_row(x_bits: Vec<bool>, z_bits: Vec<bool>, sign: bool) -> Self {
        debug_assert_eq!(x_bits.len(), z_bits.len());
        let y_count = x_bits.iter().zip(&z_bits).filter(|(x, z)| **x && **z).count();
        let exponent = ((2 * usize::from(sign) + y_count) % 4) as u8;
        PauliString {
            x_bits,
            z_bits,
            exponent,
        }
    }

    #[must_use]
    pub fn num_qubits(&self) -> usize {
        self.x_bits.len()
    }

    #[must_use]
    pub fn x_bits(&self) -> &[bool] {
        &self.x_bits
    }

    #[must_use]
    pub fn z_bits(&self) -> &[bool] {
        &self.z_bits
    }

    #[must_use]
    pub fn phase_exponent(&self) -> u8 {
        self.exponent
    }

    fn y_count(&self) -> usize {
        self.x_bits.iter().zip(&self.z_bits).filter(|(x, z)| **x && **z).count()
    }

    #[must_use]
    pub fn is_hermitian(&self) -> bool {
        (usize::from(self.exponent) + 4 - self.y_count() % 4) % 2 == 0
    }

    /// Sign bit of a Hermitian operator, `None` when the operator is `±i` times a Hermitian one.
    #[must_use]
    pub fn sign(&self) -> Option<bool> {
        let shifted = (usize::from(self.exponent) + 4 - self.y_count() % 4) % 4;
        match shifted {
            0 => Some(false),
            2 => Some(true),
            _ => None,
        }
    }

    /// Sign bit of the nearest Hermitian operator, ignoring a stray factor of `i`.
    pub(crate) fn sign_bit(&self) -> bool {
        (usize::from(self.exponent) + 4 - self.y_count() % 4) % 4 >= 2
    }

    #[must_use]
    pub fn axis(&self, qubit: usize) -> Option<Axis> {
        Axis::from_bits(self.x_bits[qubit], self.z_bits[qubit])
    }

    #[must_use]
    pub fn weight(&self) -> usize {
        self.x_bits.iter().zip(&self.z_bits).filter(|(x, z)| **x || **z).count()
    }

    #[must_use]
    pub fn commutes_with(&self, other: &PauliString) -> bool {
        let anti_commuting = (0..self.num_qubits())
            .filter(|&q| (self.x_bits[q] && other.z_bits[q]) ^ (self.z_bits[q] && other.x_bits[q]))
            .count();
        anti_commuting % 2 == 0
    }

    /// Multiplies the operator by `iᵏ`.
    pub fn add_phase_exponent(&mut self, k: u8) {
        self.exponent = (self.exponent + k) % 4;
    }
}

impl MulAssign<&PauliString> for PauliString {
    /// `self ← self·other`, moving `Z^z₁` past `X^x₂` contributes `(-1)^(z₁·x₂)`.
    fn mul_assign(&mut self, other: &PauliString) {
        debug_assert_eq!(self.num_qubits(), other.num_qubits());
        let swaps = self.z_bits.iter().zip(&other.x_bits).filter(|(z, x)| **z && **x).count();
        let exponent = usize::from(self.exponent) + usize::from(other.exponent) + 2 * swaps;
        self.exponent = (exponent % 4) as u8;
        for (bit, other_bit) in self.x_bits.iter_mut().zip(&other.x_bits) {
            *bit ^= other_bit;
        }
        for (bit, other_bit) in self.z_bits.iter_mut().zip(&other.z_bits) {
            *bit ^= other_bit;
        }
    }
}

impl Mul<&PauliString> for &PauliString {
    type Output = PauliString;
    fn mul(self, other: &PauliString) -> PauliString {
        let mut res = self.clone();
        res *= other;
        res
    }
}

impl fmt::Display for PauliString {
    /// Sparse form such as `-X₀Z₂`, or `+I` for the identity.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = match (usize::from(self.exponent) + 4 - self.y_count() % 4) % 4 {
            0 => "+",
            1 => "+i",
            2 => "-",
            _ => "-i",
        };
        f.write_str(prefix)?;
        if self.weight() == 0 {
            return f.write_str("I");
        }
        for qubit in 0..self.num_qubits() {
            if let Some(axis) = self.axis(qubit) {
                write!(f, "{axis}{}", subscript_digits(qubit))?;
            }
        }
        Ok(())
    }
}

impl FromStr for PauliString {
    type Err = Error;

    /// Parses dense strings such as `XIZ`, `-YY` or `+iZ`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (negative, rest) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s.strip_prefix('+').unwrap_or(s)),
        };
        let (imaginary, rest) = match rest.strip_prefix('i') {
            Some(rest) => (true, rest),
            None => (false, rest),
        };
        let mut x_bits = Vec::with_capacity(rest.len());
        let mut z_bits = Vec::with_capacity(rest.len());
        for symbol in rest.chars() {
            let (x, z) = match symbol {
                'I' | '_' => (false, false),
                'X' => (true, false),
                'Y' => (true, true),
                'Z' => (false, true),
                other => {
                    return Err(Error::InvalidSpecification(format!(
                        "Unexpected character {other:?} in Pauli string {s:?}"
                    )))
                }
            };
            x_bits.push(x);
            z_bits.push(z);
        }
        let mut res = PauliString::from_row(x_bits, z_bits, negative);
        if imaginary {
            res.add_phase_exponent(1);
        }
        Ok(res)
    }
}
