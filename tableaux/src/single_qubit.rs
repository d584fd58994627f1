use std::fmt;
use std::sync::{Arc, LazyLock};

use quantum_core::linalg::{allclose, dagger, identity, is_unitary, pauli_matrix, Matrix, Tolerance};
use quantum_core::{All, Axis, PauliTransform, Qid};

use crate::act_on::{act_on_clifford, SimulationState};
use crate::error::{Error, Result};
use crate::gate::{ActOnOutcome, Gate, Operation};
use crate::gates::PauliPowGate;
use crate::pauli::PauliString;
use crate::phased_xz::PhasedXZGate;
use crate::tableau::{CliffordTableau, TableauRecord};

/// Any single qubit Clifford gate, identified by the images of `X` and `Z` under conjugation.
///
/// The 24 gates are built once into a read-only table, see [`SingleQubitCliffordGate::all`].
/// Equality is tableau equality, so the global phase of the unitary is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SingleQubitCliffordGate {
    tableau: CliffordTableau,
    x_to: PauliTransform,
    z_to: PauliTransform,
}

/// Partial map from input Paulis to their images.
pub type PauliMap = [(Axis, PauliTransform)];

static ALL_GATES: LazyLock<Vec<SingleQubitCliffordGate>> = LazyLock::new(|| {
    let mut gates = Vec::with_capacity(24);
    for x_to in PauliTransform::all() {
        for z_to in PauliTransform::all() {
            if x_to.to != z_to.to {
                gates.push(SingleQubitCliffordGate::from_xz_unchecked(x_to, z_to));
            }
        }
    }
    gates
});

fn validate_map(required: usize, map: &PauliMap) -> Result<()> {
    for (index, (from, _)) in map.iter().enumerate() {
        if map[..index].iter().any(|(other, _)| other == from) {
            return Err(Error::InvalidSpecification(format!(
                "Pauli {from} is given more than one transform."
            )));
        }
    }
    if map.len() != required {
        let plural = if required == 1 { "" } else { "s" };
        return Err(Error::InvalidSpecification(format!(
            "Method takes {required} transform{plural}."
        )));
    }
    for (index, (_, transform)) in map.iter().enumerate() {
        if map[..index].iter().any(|(_, other)| other.to == transform.to) {
            return Err(Error::InvalidSpecification(
                "A rotation cannot map two Paulis to the same".to_owned(),
            ));
        }
    }
    Ok(())
}

/// Completes two images of distinct Paulis with the image of the third one.
///
/// With `Y = i·X·Z` the third image carries an extra sign whenever the two inputs and the two outputs are in
/// opposite cyclic order.
fn complete_double_map(
    (from1, to1): (Axis, PauliTransform),
    (from2, to2): (Axis, PauliTransform),
) -> [PauliTransform; 3] {
    let from3 = from1.third(from2);
    let to3 = PauliTransform::new(
        to1.to.third(to2.to),
        to1.flip ^ to2.flip ^ (from1.precedes(from2) != to1.to.precedes(to2.to)),
    );
    let mut images = [PauliTransform::plus(Axis::X); 3];
    for (from, to) in [(from1, to1), (from2, to2), (from3, to3)] {
        images[from.cyclic_index()] = to;
    }
    images
}

impl SingleQubitCliffordGate {
    fn from_xz_unchecked(x_to: PauliTransform, z_to: PauliTransform) -> Self {
        let mut tableau = CliffordTableau::new(1);
        tableau.set_row(0, &PauliString::from_row(vec![x_to.to.x_bit()], vec![x_to.to.z_bit()], x_to.flip));
        tableau.set_row(1, &PauliString::from_row(vec![z_to.to.x_bit()], vec![z_to.to.z_bit()], z_to.flip));
        SingleQubitCliffordGate { tableau, x_to, z_to }
    }

    fn from_images(images: [PauliTransform; 3]) -> Self {
        Self::from_xz_unchecked(images[Axis::X.cyclic_index()], images[Axis::Z.cyclic_index()])
    }

    fn lookup(x_to: PauliTransform, z_to: PauliTransform) -> Self {
        ALL_GATES
            .iter()
            .find(|gate| gate.x_to == x_to && gate.z_to == z_to)
            .cloned()
            .unwrap_or_else(|| Self::from_xz_unchecked(x_to, z_to))
    }

    /// All 24 single qubit Clifford gates.
    #[must_use]
    pub fn all() -> &'static [SingleQubitCliffordGate] {
        &ALL_GATES
    }

    #[must_use]
    pub fn identity() -> Self {
        Self::lookup(PauliTransform::plus(Axis::X), PauliTransform::plus(Axis::Z))
    }

    #[must_use]
    pub fn h() -> Self {
        Self::lookup(PauliTransform::plus(Axis::Z), PauliTransform::plus(Axis::X))
    }

    #[must_use]
    pub fn x() -> Self {
        Self::from_pauli(Axis::X, false)
    }

    #[must_use]
    pub fn y() -> Self {
        Self::from_pauli(Axis::Y, false)
    }

    #[must_use]
    pub fn z() -> Self {
        Self::from_pauli(Axis::Z, false)
    }

    #[must_use]
    pub fn x_sqrt() -> Self {
        Self::from_pauli(Axis::X, true)
    }

    #[must_use]
    pub fn y_sqrt() -> Self {
        Self::from_pauli(Axis::Y, true)
    }

    #[must_use]
    pub fn z_sqrt() -> Self {
        Self::from_pauli(Axis::Z, true)
    }

    #[must_use]
    pub fn x_nsqrt() -> Self {
        Self::x_sqrt().inverse()
    }

    #[must_use]
    pub fn y_nsqrt() -> Self {
        Self::y_sqrt().inverse()
    }

    #[must_use]
    pub fn z_nsqrt() -> Self {
        Self::z_sqrt().inverse()
    }

    /// # Errors
    /// Returns [`Error::NotSymplectic`] unless `tableau` is a valid one qubit tableau.
    pub fn from_clifford_tableau(tableau: CliffordTableau) -> Result<Self> {
        if tableau.num_qubits() != 1 || !tableau.is_valid() {
            return Err(Error::NotSymplectic);
        }
        let transform = |row: usize| -> Result<PauliTransform> {
            let to = Axis::from_bits(tableau.xs()[[row, 0]], tableau.zs()[[row, 0]]).ok_or(Error::NotSymplectic)?;
            Ok(PauliTransform::new(to, tableau.rs()[row]))
        };
        let x_to = transform(0)?;
        let z_to = transform(1)?;
        Ok(SingleQubitCliffordGate { tableau, x_to, z_to })
    }

    /// Gate with the given images of `X` and `Z`.
    ///
    /// # Errors
    /// Returns [`Error::InvalidSpecification`] when both images are along the same axis.
    pub fn from_xz_map(x_to: PauliTransform, z_to: PauliTransform) -> Result<Self> {
        validate_map(2, &[(Axis::X, x_to), (Axis::Z, z_to)])?;
        Ok(Self::lookup(x_to, z_to))
    }

    /// Gate with the given images of `X`, `Y` and `Z`.
    ///
    /// # Errors
    /// Returns [`Error::InvalidSpecification`] if two images collide or the images are a mirrored relabeling of the
    /// axes, which no unitary implements.
    pub fn from_xyz_map(x_to: PauliTransform, y_to: PauliTransform, z_to: PauliTransform) -> Result<Self> {
        validate_map(3, &[(Axis::X, x_to), (Axis::Y, y_to), (Axis::Z, z_to)])?;
        let gate = Self::lookup(x_to, z_to);
        if gate.transform(Axis::Y) != y_to {
            return Err(Error::InvalidSpecification(format!(
                "X:{x_to}, Y:{y_to}, Z:{z_to} is a mirror image of a rotation."
            )));
        }
        Ok(gate)
    }

    /// Gate mapping one Pauli as given. The remaining freedom is fixed by choosing a 90° or 180° rotation.
    ///
    /// # Errors
    /// Returns [`Error::InvalidSpecification`] unless `map` has exactly one entry.
    pub fn from_single_map(map: &PauliMap) -> Result<Self> {
        validate_map(1, map)?;
        let (from, transform) = map[0];
        let second = if from == transform.to {
            (from.next(), PauliTransform::plus(from.next()))
        } else {
            (transform.to, PauliTransform::new(from, !transform.flip))
        };
        Ok(Self::from_images(complete_double_map((from, transform), second)))
    }

    /// Gate mapping two Paulis as given.
    ///
    /// # Errors
    /// Returns [`Error::InvalidSpecification`] unless `map` has exactly two entries with distinct inputs and
    /// distinct outputs.
    pub fn from_double_map(map: &PauliMap) -> Result<Self> {
        validate_map(2, map)?;
        Ok(Self::from_images(complete_double_map(map[0], map[1])))
    }

    /// The Pauli gate `pauli`, or its positive square root when `sqrt` is set.
    #[must_use]
    pub fn from_pauli(pauli: Axis, sqrt: bool) -> Self {
        let previous = pauli.previous();
        let next = pauli.next();
        let mut images = [PauliTransform::plus(Axis::X); 3];
        images[pauli.cyclic_index()] = PauliTransform::plus(pauli);
        if sqrt {
            images[previous.cyclic_index()] = PauliTransform::minus(next);
            images[next.cyclic_index()] = PauliTransform::plus(previous);
        } else {
            images[previous.cyclic_index()] = PauliTransform::minus(previous);
            images[next.cyclic_index()] = PauliTransform::minus(next);
        }
        Self::from_images(images)
    }

    /// Rotation by `quarter_turns` times 90° about `pauli`, taken modulo 4.
    #[must_use]
    pub fn from_quarter_turns(pauli: Axis, quarter_turns: i64) -> Self {
        match quarter_turns.rem_euclid(4) {
            0 => Self::identity(),
            1 => Self::from_pauli(pauli, true),
            2 => Self::from_pauli(pauli, false),
            _ => Self::from_pauli(pauli, true).inverse(),
        }
    }

    /// The gate whose unitary equals `unitary` up to global phase, if any.
    ///
    /// Returns `None` for non-unitary, non-Clifford or wrongly sized matrices.
    #[must_use]
    pub fn from_unitary(unitary: &Matrix) -> Option<Self> {
        let tolerance = Tolerance::default();
        if unitary.dim() != (2, 2) || !is_unitary(unitary, tolerance) {
            return None;
        }
        let conjugate = |axis: Axis| unitary.dot(&pauli_matrix(axis.into())).dot(&dagger(unitary));
        let x_to = to_pauli_transform(&conjugate(Axis::X), tolerance)?;
        let z_to = to_pauli_transform(&conjugate(Axis::Z), tolerance)?;
        Self::from_xz_map(x_to, z_to).ok()
    }

    #[must_use]
    pub fn tableau(&self) -> &CliffordTableau {
        &self.tableau
    }

    /// Image of `pauli` under conjugation by the gate.
    #[must_use]
    pub fn transform(&self, pauli: Axis) -> PauliTransform {
        match pauli {
            Axis::X => self.x_to,
            Axis::Z => self.z_to,
            Axis::Y => PauliTransform::new(
                self.x_to.to.third(self.z_to.to),
                self.x_to.flip ^ self.z_to.flip ^ self.x_to.to.precedes(self.z_to.to),
            ),
        }
    }

    /// The gate applying `self` and then `second`.
    #[must_use]
    pub fn merged_with(&self, second: &SingleQubitCliffordGate) -> Self {
        let x_to = second.transform(self.x_to.to);
        let z_to = second.transform(self.z_to.to);
        Self::lookup(
            PauliTransform::new(x_to.to, x_to.flip ^ self.x_to.flip),
            PauliTransform::new(z_to.to, z_to.flip ^ self.z_to.flip),
        )
    }

    #[must_use]
    pub fn inverse(&self) -> Self {
        let images = complete_double_map(
            (self.x_to.to, PauliTransform::new(Axis::X, self.x_to.flip)),
            (self.z_to.to, PauliTransform::new(Axis::Z, self.z_to.flip)),
        );
        Self::from_images(images)
    }

    /// Integer power, reduced modulo 24, the order of the group.
    #[must_use]
    pub fn powi(&self, exponent: i64) -> Self {
        let mut res = Self::identity();
        for _ in 0..exponent.rem_euclid(24) {
            res = res.merged_with(self);
        }
        res
    }

    /// Integer powers of any gate, and half-integer powers of the Pauli gates through their square roots.
    ///
    /// # Errors
    /// Returns [`Error::UnsupportedExponent`] for any other exponent.
    #[allow(clippy::cast_possible_truncation, clippy::float_cmp)]
    pub fn pow(&self, exponent: f64) -> Result<Self> {
        if exponent.fract() == 0.0 && exponent.abs() < 1e15 {
            return Ok(self.powi(exponent as i64));
        }
        let doubled = 2.0 * exponent;
        if doubled.fract() == 0.0 && doubled.abs() < 1e15 {
            let root = Axis::all()
                .into_iter()
                .find(|&axis| *self == Self::from_pauli(axis, false))
                .map(|axis| {
                    let root = Self::from_pauli(axis, true);
                    if exponent < 0.0 {
                        root.inverse()
                    } else {
                        root
                    }
                });
            if let Some(root) = root {
                return Ok(root.powi(doubled.abs() as i64));
            }
        }
        Err(Error::UnsupportedExponent(exponent))
    }

    /// Whether applying the gates in either order gives the same gate.
    #[must_use]
    pub fn commutes_with(&self, other: &SingleQubitCliffordGate) -> bool {
        self.merged_with(other) == other.merged_with(self)
    }

    #[must_use]
    pub fn commutes_with_pauli(&self, pauli: Axis) -> bool {
        self.transform(pauli) == PauliTransform::plus(pauli)
    }

    /// Whether the gate commutes with the rotation `gate`, which holds for even exponents.
    #[must_use]
    pub fn commutes_with_pauli_pow(&self, gate: &PauliPowGate) -> bool {
        let even = gate.exponent.rem_euclid(2.0) == 0.0;
        even || self.commutes_with_pauli(gate.axis)
    }

    /// Quarter turn rotations `(axis, turns)` whose successive application reconstructs the gate.
    ///
    /// Empty for the identity and a single rotation for 90° and 180° rotations about a Pauli axis.
    #[must_use]
    pub fn decompose_rotation(&self) -> Vec<(Axis, i64)> {
        let rotations = Axis::all().map(|axis| self.transform(axis));
        let whole = Axis::all().map(|axis| rotations[axis.cyclic_index()].to == axis);
        let flips = rotations.map(|transform| transform.flip);
        let num_whole = whole.iter().filter(|w| **w).count();
        let num_flip = flips.iter().filter(|f| **f).count();
        match num_whole {
            3 if num_flip == 0 => vec![],
            3 => {
                let index = flips.iter().position(|f| !*f).unwrap_or_default();
                vec![(Axis::by_cyclic_index(index), 2)]
            }
            1 => {
                let index = whole.iter().position(|w| *w).unwrap_or_default();
                let pauli = Axis::by_cyclic_index(index);
                let next = pauli.next();
                let mut res = Vec::with_capacity(2);
                if flips[index] {
                    res.push((next, 2));
                }
                let turns = if self.transform(next).flip { -1 } else { 1 };
                res.push((pauli, turns));
                res
            }
            _ => {
                let [x_rot, y_rot, z_rot] = rotations;
                let sign = |flip: bool| if flip { -1 } else { 1 };
                if x_rot.to == Axis::Y {
                    vec![(Axis::X, sign(y_rot.flip)), (Axis::Z, sign(x_rot.flip))]
                } else {
                    vec![(Axis::Z, -sign(y_rot.flip)), (Axis::X, -sign(z_rot.flip))]
                }
            }
        }
    }

    /// The gate `G` such that applying `G` and then `self` equals applying `self` and then `after`.
    #[must_use]
    pub fn equivalent_gate_before(&self, after: &SingleQubitCliffordGate) -> Self {
        self.merged_with(after).merged_with(&self.inverse())
    }

    /// Unitary matrix with the global phase given by the quarter turn decomposition.
    #[must_use]
    pub fn matrix(&self) -> Matrix {
        self.decompose_rotation()
            .into_iter()
            .fold(identity(2), |acc, (axis, turns)| {
                PauliPowGate::new(axis, quarter_turns_to_exponent(turns)).matrix().dot(&acc)
            })
    }

    #[must_use]
    pub fn to_phased_xz_gate(&self) -> PhasedXZGate {
        PhasedXZGate::from_matrix(&self.matrix())
    }

    #[must_use]
    pub fn to_record(&self) -> TableauRecord {
        self.tableau.to_record()
    }

    /// # Errors
    /// Returns an error when the record is malformed or not a one qubit Clifford tableau.
    pub fn from_record(record: &TableauRecord) -> Result<Self> {
        Self::from_clifford_tableau(CliffordTableau::from_record(record)?)
    }
}

#[allow(clippy::cast_precision_loss)]
fn quarter_turns_to_exponent(turns: i64) -> f64 {
    turns as f64 / 2.0
}

fn to_pauli_transform(matrix: &Matrix, tolerance: Tolerance) -> Option<PauliTransform> {
    for axis in Axis::all() {
        let pauli = pauli_matrix(axis.into());
        if allclose(matrix, &pauli, tolerance) {
            return Some(PauliTransform::plus(axis));
        }
        if allclose(matrix, &pauli.mapv(|entry| -entry), tolerance) {
            return Some(PauliTransform::minus(axis));
        }
    }
    None
}

impl fmt::Display for SingleQubitCliffordGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SingleQubitCliffordGate(X:{}, Y:{}, Z:{})",
            self.transform(Axis::X),
            self.transform(Axis::Y),
            self.transform(Axis::Z)
        )
    }
}

impl Gate for SingleQubitCliffordGate {
    fn num_qubits(&self) -> usize {
        1
    }

    fn unitary(&self) -> Option<Matrix> {
        Some(self.matrix())
    }

    fn clifford_tableau(&self) -> Option<CliffordTableau> {
        Some(self.tableau.clone())
    }

    fn decompose(&self, qubits: &[Qid]) -> Option<Vec<Operation>> {
        self.decompose_rotation()
            .into_iter()
            .map(|(axis, turns)| {
                let gate = PauliPowGate::new(axis, quarter_turns_to_exponent(turns));
                Operation::new(Arc::new(gate), qubits.to_vec()).ok()
            })
            .collect()
    }

    fn act_on(&self, state: &mut dyn SimulationState, qubits: &[Qid]) -> Result<ActOnOutcome> {
        act_on_clifford(&self.tableau, self, state, qubits)
    }
}
