use std::fmt;

use ndarray::{s, Array1, Array2};
use quantum_core::{subscript_digits, Axis};
use rand::Rng;

use crate::error::{Error, Result};
use crate::pauli::PauliString;

/// Stabilizer tableau of a Clifford unitary `U` on `n` qubits.
///
/// Row `i < n` holds `U·Xᵢ·U†` and row `n + i` holds `U·Zᵢ·U†`, each as the bits of a Hermitian Pauli
/// `(-1)^rs[k]·∏ₖ Pₖ` split between `xs` and `zs`. Used as a simulation state the first `n` rows are the
/// destabilizers and the last `n` rows are the stabilizers of the current state.
///
/// Global phase is not tracked, so two unitaries differing by a phase have equal tableaux.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CliffordTableau {
    num_qubits: usize,
    xs: Array2<bool>,
    zs: Array2<bool>,
    rs: Array1<bool>,
}

/// Flat record of a tableau made of primitive fields, used for structural serialization.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableauRecord {
    pub n: usize,
    pub rs: Vec<bool>,
    pub xs: Vec<Vec<bool>>,
    pub zs: Vec<Vec<bool>>,
}

impl CliffordTableau {
    /// Tableau of the identity, equivalently of the state `|0…0⟩`.
    #[must_use]
    pub fn new(num_qubits: usize) -> Self {
        let n = num_qubits;
        let mut xs = Array2::from_elem((2 * n, n), false);
        let mut zs = Array2::from_elem((2 * n, n), false);
        for i in 0..n {
            xs[[i, i]] = true;
            zs[[n + i, i]] = true;
        }
        CliffordTableau {
            num_qubits,
            xs,
            zs,
            rs: Array1::from_elem(2 * n, false),
        }
    }

    /// Tableau of the computational basis state `initial_state`, qubit 0 being the most significant bit.
    #[must_use]
    pub fn with_initial_state(num_qubits: usize, initial_state: usize) -> Self {
        let mut res = Self::new(num_qubits);
        for qubit in 0..num_qubits {
            let shift = num_qubits - 1 - qubit;
            res.rs[num_qubits + qubit] = shift < usize::BITS as usize && (initial_state >> shift) & 1 == 1;
        }
        res
    }

    /// Wraps raw tableau blocks. Shapes are checked, the symplectic condition is not.
    ///
    /// # Errors
    /// Returns [`Error::InvalidSpecification`] if `xs` and `zs` are not `2n × n` or `rs` is not of length `2n`.
    pub fn from_parts(xs: Array2<bool>, zs: Array2<bool>, rs: Array1<bool>) -> Result<Self> {
        let num_qubits = xs.ncols();
        let expected = (2 * num_qubits, num_qubits);
        if xs.dim() != expected || zs.dim() != expected || rs.len() != 2 * num_qubits {
            return Err(Error::InvalidSpecification(format!(
                "Tableau blocks must have shapes {expected:?}, {expected:?} and ({},), got {:?}, {:?} and ({},)",
                2 * num_qubits,
                xs.dim(),
                zs.dim(),
                rs.len()
            )));
        }
        Ok(CliffordTableau { num_qubits, xs, zs, rs })
    }

    #[must_use]
    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    #[must_use]
    pub fn xs(&self) -> &Array2<bool> {
        &self.xs
    }

    #[must_use]
    pub fn zs(&self) -> &Array2<bool> {
        &self.zs
    }

    #[must_use]
    pub fn rs(&self) -> &Array1<bool> {
        &self.rs
    }

    /// The `2n × 2n` binary matrix `[xs | zs]`.
    #[must_use]
    pub fn matrix(&self) -> Array2<bool> {
        let n = self.num_qubits;
        let mut res = Array2::from_elem((2 * n, 2 * n), false);
        res.slice_mut(s![.., ..n]).assign(&self.xs);
        res.slice_mut(s![.., n..]).assign(&self.zs);
        res
    }

    fn symplectic_product(&self, row1: usize, row2: usize) -> bool {
        (0..self.num_qubits).fold(false, |acc, q| {
            acc ^ (self.xs[[row1, q]] && self.zs[[row2, q]]) ^ (self.zs[[row1, q]] && self.xs[[row2, q]])
        })
    }

    /// Checks that rows `i` and `n + i` anti-commute and all other pairs of rows commute.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        let n = self.num_qubits;
        (0..2 * n).all(|row1| {
            (row1 + 1..2 * n).all(|row2| self.symplectic_product(row1, row2) == (row2 - row1 == n))
        })
    }

    /// Row `index` as a Hermitian Pauli string.
    #[must_use]
    pub fn row(&self, index: usize) -> PauliString {
        PauliString::from_row(self.xs.row(index).to_vec(), self.zs.row(index).to_vec(), self.rs[index])
    }

    pub(crate) fn set_row(&mut self, index: usize, pauli: &PauliString) {
        for q in 0..self.num_qubits {
            self.xs[[index, q]] = pauli.x_bits()[q];
            self.zs[[index, q]] = pauli.z_bits()[q];
        }
        self.rs[index] = pauli.sign_bit();
    }

    /// Images of `X₀, …, Xₙ₋₁`.
    #[must_use]
    pub fn destabilizers(&self) -> Vec<PauliString> {
        (0..self.num_qubits).map(|i| self.row(i)).collect()
    }

    /// Images of `Z₀, …, Zₙ₋₁`, for a state tableau the generators of the stabilizer group.
    #[must_use]
    pub fn stabilizers(&self) -> Vec<PauliString> {
        (self.num_qubits..2 * self.num_qubits).map(|i| self.row(i)).collect()
    }

    /// Image of an arbitrary Pauli string under the unitary represented by this tableau.
    #[must_use]
    pub fn image(&self, pauli: &PauliString) -> PauliString {
        let n = self.num_qubits;
        let mut res = PauliString::identity(n);
        for q in 0..n {
            if pauli.x_bits()[q] {
                res *= &self.row(q);
            }
            if pauli.z_bits()[q] {
                res *= &self.row(n + q);
            }
        }
        res.add_phase_exponent(pauli.phase_exponent());
        res
    }

    /// Tableau of applying `self` and then `second`.
    ///
    /// # Errors
    /// Returns [`Error::QubitCountMismatch`] if the tableaux act on different numbers of qubits.
    pub fn then(&self, second: &CliffordTableau) -> Result<CliffordTableau> {
        if self.num_qubits != second.num_qubits {
            return Err(Error::QubitCountMismatch {
                left: self.num_qubits,
                right: second.num_qubits,
            });
        }
        Ok(self.compose_same_size(second))
    }

    /// [`Self::then`] for tableaux already known to act on the same qubits.
    pub(crate) fn compose_same_size(&self, second: &CliffordTableau) -> CliffordTableau {
        debug_assert_eq!(self.num_qubits, second.num_qubits);
        let mut res = self.clone();
        for k in 0..2 * self.num_qubits {
            let image = second.image(&self.row(k));
            res.set_row(k, &image);
        }
        res
    }

    /// Tableau `T⁻¹` such that `self.then(T⁻¹)` is the identity.
    ///
    /// For the symplectic matrix `[[A, B], [C, D]]` the inverse matrix is `[[Dᵀ, Bᵀ], [Cᵀ, Aᵀ]]`, signs are then
    /// fixed by composing with `self`.
    ///
    /// # Errors
    /// Returns [`Error::NotSymplectic`] if the tableau does not describe a Clifford unitary.
    pub fn inverse(&self) -> Result<CliffordTableau> {
        if !self.is_valid() {
            return Err(Error::NotSymplectic);
        }
        let n = self.num_qubits;
        let a = self.xs.slice(s![..n, ..]);
        let b = self.zs.slice(s![..n, ..]);
        let c = self.xs.slice(s![n.., ..]);
        let d = self.zs.slice(s![n.., ..]);
        let mut xs = Array2::from_elem((2 * n, n), false);
        let mut zs = Array2::from_elem((2 * n, n), false);
        xs.slice_mut(s![..n, ..]).assign(&d.t());
        zs.slice_mut(s![..n, ..]).assign(&b.t());
        xs.slice_mut(s![n.., ..]).assign(&c.t());
        zs.slice_mut(s![n.., ..]).assign(&a.t());
        let mut res = CliffordTableau {
            num_qubits: n,
            xs,
            zs,
            rs: Array1::from_elem(2 * n, false),
        };
        res.rs = res.then(self)?.rs;
        Ok(res)
    }

    /// Embeds this tableau into `num_qubits_after_padding` qubits, qubit `i` landing on `axes[i]`.
    ///
    /// # Errors
    /// Returns [`Error::PaddingAxesMismatch`] if `axes` does not list one axis per qubit,
    /// [`Error::PaddingTooSmall`] if the target space has fewer qubits than the tableau, and
    /// [`Error::InvalidSpecification`] if the axes repeat or fall outside the target space.
    pub fn pad(&self, num_qubits_after_padding: usize, axes: &[usize]) -> Result<CliffordTableau> {
        if axes.len() != self.num_qubits {
            return Err(Error::PaddingAxesMismatch);
        }
        if num_qubits_after_padding < self.num_qubits {
            return Err(Error::PaddingTooSmall);
        }
        if !quantum_core::linalg::are_valid_axes(axes, num_qubits_after_padding) {
            return Err(Error::InvalidSpecification(format!(
                "Padding axes {axes:?} must be distinct and smaller than {num_qubits_after_padding}"
            )));
        }
        let n = self.num_qubits;
        let m = num_qubits_after_padding;
        let mut res = CliffordTableau::new(m);
        for (i, &row_axis) in axes.iter().enumerate() {
            for (j, &col_axis) in axes.iter().enumerate() {
                res.xs[[row_axis, col_axis]] = self.xs[[i, j]];
                res.zs[[row_axis, col_axis]] = self.zs[[i, j]];
                res.xs[[m + row_axis, col_axis]] = self.xs[[n + i, j]];
                res.zs[[m + row_axis, col_axis]] = self.zs[[n + i, j]];
            }
            res.rs[row_axis] = self.rs[i];
            res.rs[m + row_axis] = self.rs[n + i];
        }
        Ok(res)
    }

    /// Hadamard on `q`.
    pub fn apply_h(&mut self, q: usize) {
        for i in 0..2 * self.num_qubits {
            let (x, z) = (self.xs[[i, q]], self.zs[[i, q]]);
            self.rs[i] ^= x && z;
            self.xs[[i, q]] = z;
            self.zs[[i, q]] = x;
        }
    }

    /// Phase gate `S = diag(1, i)` on `q`.
    pub fn apply_s(&mut self, q: usize) {
        for i in 0..2 * self.num_qubits {
            let (x, z) = (self.xs[[i, q]], self.zs[[i, q]]);
            self.rs[i] ^= x && z;
            self.zs[[i, q]] = z ^ x;
        }
    }

    pub fn apply_x(&mut self, q: usize) {
        for i in 0..2 * self.num_qubits {
            self.rs[i] ^= self.zs[[i, q]];
        }
    }

    pub fn apply_y(&mut self, q: usize) {
        for i in 0..2 * self.num_qubits {
            self.rs[i] ^= self.xs[[i, q]] ^ self.zs[[i, q]];
        }
    }

    pub fn apply_z(&mut self, q: usize) {
        for i in 0..2 * self.num_qubits {
            self.rs[i] ^= self.xs[[i, q]];
        }
    }

    /// Controlled X with `control` and `target`.
    pub fn apply_cx(&mut self, control: usize, target: usize) {
        for i in 0..2 * self.num_qubits {
            let (xc, zc) = (self.xs[[i, control]], self.zs[[i, control]]);
            let (xt, zt) = (self.xs[[i, target]], self.zs[[i, target]]);
            self.rs[i] ^= xc && zt && !(xt ^ zc);
            self.xs[[i, target]] = xt ^ xc;
            self.zs[[i, control]] = zc ^ zt;
        }
    }

    pub fn apply_cz(&mut self, q1: usize, q2: usize) {
        for i in 0..2 * self.num_qubits {
            let (x1, z1) = (self.xs[[i, q1]], self.zs[[i, q1]]);
            let (x2, z2) = (self.xs[[i, q2]], self.zs[[i, q2]]);
            self.rs[i] ^= x1 && x2 && (z1 ^ z2);
            self.zs[[i, q1]] = z1 ^ x2;
            self.zs[[i, q2]] = z2 ^ x1;
        }
    }

    pub fn apply_swap(&mut self, q1: usize, q2: usize) {
        for i in 0..2 * self.num_qubits {
            self.xs.swap([i, q1], [i, q2]);
            self.zs.swap([i, q1], [i, q2]);
        }
    }

    /// Measures `Z` on `qubit` of the stabilizer state described by this tableau and collapses it.
    ///
    /// Returns `true` for outcome `1`. The outcome is drawn from `rng` only when it is not determined by the state.
    pub fn measure<R: Rng + ?Sized>(&mut self, qubit: usize, rng: &mut R) -> bool {
        let n = self.num_qubits;
        let pivot = (n..2 * n).find(|&p| self.xs[[p, qubit]]);
        if let Some(p) = pivot {
            let pivot_row = self.row(p);
            for i in 0..2 * n {
                if i != p && self.xs[[i, qubit]] {
                    let product = &self.row(i) * &pivot_row;
                    self.set_row(i, &product);
                }
            }
            self.set_row(p - n, &pivot_row);
            let outcome = rng.gen::<bool>();
            let mut collapsed = PauliString::single(n, qubit, Axis::Z);
            if outcome {
                collapsed.add_phase_exponent(2);
            }
            self.set_row(p, &collapsed);
            outcome
        } else {
            let mut scratch = PauliString::identity(n);
            for i in 0..n {
                if self.xs[[i, qubit]] {
                    scratch *= &self.row(n + i);
                }
            }
            scratch.sign_bit()
        }
    }

    #[must_use]
    pub fn to_record(&self) -> TableauRecord {
        let rows = |block: &Array2<bool>| block.rows().into_iter().map(|row| row.to_vec()).collect();
        TableauRecord {
            n: self.num_qubits,
            rs: self.rs.to_vec(),
            xs: rows(&self.xs),
            zs: rows(&self.zs),
        }
    }

    /// Rebuilds a tableau from [`CliffordTableau::to_record`].
    ///
    /// # Errors
    /// Returns [`Error::InvalidSpecification`] if the record fields have inconsistent sizes.
    pub fn from_record(record: &TableauRecord) -> Result<Self> {
        let n = record.n;
        let block = |rows: &[Vec<bool>]| {
            if rows.len() != 2 * n || rows.iter().any(|row| row.len() != n) {
                return Err(Error::InvalidSpecification(format!(
                    "Tableau record for {n} qubits must have {} rows of length {n}",
                    2 * n
                )));
            }
            Ok(Array2::from_shape_fn((2 * n, n), |(i, j)| rows[i][j]))
        };
        let xs = block(&record.xs)?;
        let zs = block(&record.zs)?;
        Self::from_parts(xs, zs, Array1::from_vec(record.rs.clone()))
    }
}

impl fmt::Display for CliffordTableau {
    /// Images of the generators, for example `X₀→+Z₀, Z₀→+X₀` for the Hadamard.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let n = self.num_qubits;
        for q in 0..n {
            if q > 0 {
                f.write_str(", ")?;
            }
            let sub = subscript_digits(q);
            write!(f, "X{sub}→{}, Z{sub}→{}", self.row(q), self.row(n + q))?;
        }
        Ok(())
    }
}
