pub mod linalg;
mod qid;

pub use qid::{qid_shape, Qid, QidLabel};

use num_derive::{FromPrimitive, ToPrimitive};
use std::fmt;
use std::ops::Neg;

/// All elements of a given type. Usually used for simple enums.
pub trait All<const NUM_ELEMENTS: usize>: Sized {
    fn all() -> [Self; NUM_ELEMENTS];
}

#[must_use]
pub fn subscript_digits(number: usize) -> String {
    let mut res = String::new();
    for char in number.to_string().chars() {
        let digit = char.to_digit(10).unwrap_or_default() as usize;
        res.push(SUB_CHARS[digit]);
    }
    res
}

pub const SUB_CHARS: [char; 10] = ['₀', '₁', '₂', '₃', '₄', '₅', '₆', '₇', '₈', '₉'];

/// Pauli matrices not equal to identity, also axes of the Block sphere.
/// See also [`PauliMatrix`], [`PauliTransform`].
///
/// The discriminant packs the symplectic encoding of the Pauli: bit 0 is the X-part and bit 1 is the Z-part.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Copy, Clone, PartialEq, PartialOrd, Eq, Ord, Hash, FromPrimitive, ToPrimitive)]
pub enum Axis {
    /// Pauli X, also x axis of the Bloch sphere
    /// ```text
    /// |0 1|
    /// |1 0|
    /// ```
    X = 0b001,

    /// Pauli Y, also y axis of the Bloch sphere
    /// ```text
    /// |0 -i|
    /// |i  0|
    /// ```
    Y = 0b011,

    /// Pauli Z, also z axis of the Bloch sphere
    /// ```text
    /// |1  0|
    /// |0 -1|
    /// ```
    Z = 0b010,
}

impl Axis {
    /// Position of the axis in the cyclic order X → Y → Z → X.
    #[must_use]
    pub fn cyclic_index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }

    #[must_use]
    pub fn by_cyclic_index(index: usize) -> Axis {
        match index % 3 {
            0 => Axis::X,
            1 => Axis::Y,
            _ => Axis::Z,
        }
    }

    /// The axis `shift` steps after `self` in the cyclic order, `shift` may be negative.
    #[must_use]
    pub fn by_relative_index(self, shift: isize) -> Axis {
        let index = (self.cyclic_index() as isize + shift).rem_euclid(3);
        Axis::by_cyclic_index(index.unsigned_abs())
    }

    #[must_use]
    pub fn next(self) -> Axis {
        self.by_relative_index(1)
    }

    #[must_use]
    pub fn previous(self) -> Axis {
        self.by_relative_index(-1)
    }

    /// The axis different from both `self` and `other`. When both are equal returns the same axis.
    #[must_use]
    pub fn third(self, other: Axis) -> Axis {
        let sum = self.cyclic_index() + other.cyclic_index();
        Axis::by_cyclic_index((6 - sum) % 3)
    }

    /// Returns true when `other` directly follows `self` in the cyclic order, so that `self * other = i * third`.
    #[must_use]
    pub fn precedes(self, other: Axis) -> bool {
        (other.cyclic_index() + 3 - self.cyclic_index()) % 3 == 1
    }

    #[must_use]
    pub fn x_bit(self) -> bool {
        (self as u8) & 0b01 != 0
    }

    #[must_use]
    pub fn z_bit(self) -> bool {
        (self as u8) & 0b10 != 0
    }

    /// Inverse of ([`Axis::x_bit`], [`Axis::z_bit`]), `None` for the identity.
    #[must_use]
    pub fn from_bits(x_bit: bool, z_bit: bool) -> Option<Axis> {
        match (x_bit, z_bit) {
            (true, false) => Some(Axis::X),
            (true, true) => Some(Axis::Y),
            (false, true) => Some(Axis::Z),
            (false, false) => None,
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            Axis::X => "X",
            Axis::Y => "Y",
            Axis::Z => "Z",
        };
        f.write_str(symbol)
    }
}

/// Pauli matrices on one qubit.
/// See also [`Axis`].
#[derive(Debug, Copy, Clone, PartialEq, PartialOrd, Eq, Ord, Hash, FromPrimitive, ToPrimitive)]
pub enum PauliMatrix {
    /// One qubit identity matrix
    I = 0b000,
    /// Pauli X
    X = (Axis::X as isize),
    /// Pauli Y
    Y = (Axis::Y as isize),
    /// Pauli Z
    Z = (Axis::Z as isize),
}

impl From<Axis> for PauliMatrix {
    fn from(axis: Axis) -> Self {
        match axis {
            Axis::X => PauliMatrix::X,
            Axis::Y => PauliMatrix::Y,
            Axis::Z => PauliMatrix::Z,
        }
    }
}

impl All<4> for PauliMatrix {
    fn all() -> [PauliMatrix; 4] {
        [PauliMatrix::I, PauliMatrix::X, PauliMatrix::Y, PauliMatrix::Z]
    }
}

impl All<3> for Axis {
    fn all() -> [Axis; 3] {
        [Axis::X, Axis::Y, Axis::Z]
    }
}

/// Image of a Pauli operator under conjugation by a single qubit Clifford unitary.
///
/// The image is `-to` when `flip` is set and `+to` otherwise.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PauliTransform {
    pub to: Axis,
    pub flip: bool,
}

impl PauliTransform {
    #[must_use]
    pub fn new(to: Axis, flip: bool) -> Self {
        PauliTransform { to, flip }
    }

    #[must_use]
    pub fn plus(to: Axis) -> Self {
        PauliTransform { to, flip: false }
    }

    #[must_use]
    pub fn minus(to: Axis) -> Self {
        PauliTransform { to, flip: true }
    }
}

impl Neg for PauliTransform {
    type Output = PauliTransform;
    fn neg(self) -> Self::Output {
        PauliTransform {
            to: self.to,
            flip: !self.flip,
        }
    }
}

impl fmt::Display for PauliTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.flip { '-' } else { '+' };
        write!(f, "{sign}{}", self.to)
    }
}

impl All<6> for PauliTransform {
    fn all() -> [PauliTransform; 6] {
        [
            PauliTransform::plus(Axis::X),
            PauliTransform::plus(Axis::Y),
            PauliTransform::plus(Axis::Z),
            PauliTransform::minus(Axis::X),
            PauliTransform::minus(Axis::Y),
            PauliTransform::minus(Axis::Z),
        ]
    }
}
