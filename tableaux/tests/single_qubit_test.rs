use itertools::iproduct;
use quantum_core::linalg::{dagger, identity, matrices_close_up_to_global_phase, Matrix, Tolerance};
use quantum_core::{All, Axis, PauliTransform};
use tableaux::{Error, Gate, PauliPowGate, SingleQubitCliffordGate, UnitaryOp};

fn close(left: &Matrix, right: &Matrix) -> bool {
    matrices_close_up_to_global_phase(left, right, Tolerance::default())
}

#[test]
fn xz_map_round_trip() {
    for gate in SingleQubitCliffordGate::all() {
        let rebuilt = SingleQubitCliffordGate::from_xz_map(gate.transform(Axis::X), gate.transform(Axis::Z)).unwrap();
        assert_eq!(&rebuilt, gate);
    }
}

#[test]
fn xyz_map_round_trip() {
    for gate in SingleQubitCliffordGate::all() {
        let rebuilt = SingleQubitCliffordGate::from_xyz_map(
            gate.transform(Axis::X),
            gate.transform(Axis::Y),
            gate.transform(Axis::Z),
        )
        .unwrap();
        assert_eq!(&rebuilt, gate);
    }
}

#[test]
fn xz_map_on_same_axis_is_rejected() {
    let res = SingleQubitCliffordGate::from_xz_map(PauliTransform::plus(Axis::X), PauliTransform::minus(Axis::X));
    assert_eq!(
        res,
        Err(Error::InvalidSpecification("A rotation cannot map two Paulis to the same".to_owned()))
    );
}

#[test]
fn inverse_of_named_gates() {
    assert_eq!(SingleQubitCliffordGate::h().inverse(), SingleQubitCliffordGate::h());
    assert_eq!(SingleQubitCliffordGate::x().inverse(), SingleQubitCliffordGate::x());
    assert_eq!(SingleQubitCliffordGate::x_sqrt().inverse(), SingleQubitCliffordGate::x_nsqrt());
    assert_eq!(SingleQubitCliffordGate::y_nsqrt().inverse(), SingleQubitCliffordGate::y_sqrt());
    assert_eq!(SingleQubitCliffordGate::z_sqrt().inverse(), SingleQubitCliffordGate::z_nsqrt());
}

#[test]
fn inverse_of_quarter_turn_flips_one_image() {
    for axis in Axis::all() {
        let gate = SingleQubitCliffordGate::from_pauli(axis, true);
        let next = axis.next();
        let flipped = SingleQubitCliffordGate::from_double_map(&[
            (axis, PauliTransform::plus(axis)),
            (next, -gate.transform(next)),
        ])
        .unwrap();
        assert_eq!(gate.pow(-1.0).unwrap(), flipped);
    }
}

#[test]
fn inverse_composes_to_identity() {
    for gate in SingleQubitCliffordGate::all() {
        assert_eq!(gate.merged_with(&gate.inverse()), SingleQubitCliffordGate::identity());
        assert_eq!(gate.inverse().merged_with(gate), SingleQubitCliffordGate::identity());
        assert_eq!(&gate.inverse().inverse(), gate);
    }
}

#[test]
fn inverse_matrix_is_adjoint() {
    for gate in SingleQubitCliffordGate::all() {
        assert!(close(&gate.inverse().matrix(), &dagger(&gate.matrix())), "{gate}");
    }
}

#[test]
fn rotation_decomposition_lengths() {
    let mut counts = [0; 3];
    for gate in SingleQubitCliffordGate::all() {
        counts[gate.decompose_rotation().len()] += 1;
    }
    assert_eq!(counts, [1, 9, 14]);
    assert!(SingleQubitCliffordGate::identity().decompose_rotation().is_empty());
    assert_eq!(SingleQubitCliffordGate::x_sqrt().decompose_rotation(), vec![(Axis::X, 1)]);
    assert_eq!(SingleQubitCliffordGate::z_nsqrt().decompose_rotation(), vec![(Axis::Z, -1)]);
    assert_eq!(SingleQubitCliffordGate::y().decompose_rotation(), vec![(Axis::Y, 2)]);
}

#[test]
fn rotation_decomposition_reconstructs_gate() {
    for gate in SingleQubitCliffordGate::all() {
        let rebuilt = gate
            .decompose_rotation()
            .into_iter()
            .fold(SingleQubitCliffordGate::identity(), |acc, (axis, turns)| {
                acc.merged_with(&SingleQubitCliffordGate::from_quarter_turns(axis, turns))
            });
        assert_eq!(&rebuilt, gate);
        assert_eq!(SingleQubitCliffordGate::from_unitary(&gate.matrix()).as_ref(), Some(gate));
    }
}

#[test]
fn commutation_matches_unitaries() {
    let gates = SingleQubitCliffordGate::all();
    for (left, right) in iproduct!(gates, gates) {
        let (a, b) = (left.matrix(), right.matrix());
        assert_eq!(left.commutes_with(right), close(&a.dot(&b), &b.dot(&a)), "{left} {right}");
    }
}

#[test]
fn commutes_with_pauli_pow() {
    assert!(SingleQubitCliffordGate::z_sqrt().commutes_with_pauli_pow(&PauliPowGate::z(0.3)));
    assert!(!SingleQubitCliffordGate::h().commutes_with_pauli_pow(&PauliPowGate::z(0.3)));
    assert!(SingleQubitCliffordGate::h().commutes_with_pauli_pow(&PauliPowGate::z(2.0)));
    assert!(SingleQubitCliffordGate::x().commutes_with_pauli(Axis::X));
    assert!(!SingleQubitCliffordGate::x().commutes_with_pauli(Axis::Y));
}

#[test]
fn equivalent_gate_before() {
    let gates = SingleQubitCliffordGate::all();
    for (gate, after) in iproduct!(gates, gates) {
        let before = gate.equivalent_gate_before(after);
        assert_eq!(before.merged_with(gate), gate.merged_with(after));
    }
}

#[test]
fn from_unitary() {
    let h = UnitaryOp::Hadamard.unitary().unwrap();
    assert_eq!(SingleQubitCliffordGate::from_unitary(&h), Some(SingleQubitCliffordGate::h()));
    let s = PauliPowGate::z(0.5).matrix();
    assert_eq!(SingleQubitCliffordGate::from_unitary(&s), Some(SingleQubitCliffordGate::z_sqrt()));
    let t = PauliPowGate::z(0.25).matrix();
    assert_eq!(SingleQubitCliffordGate::from_unitary(&t), None);
    assert_eq!(SingleQubitCliffordGate::from_unitary(&identity(4)), None);
    let not_unitary = identity(2) * num_complex::Complex64::new(2.0, 0.0);
    assert_eq!(SingleQubitCliffordGate::from_unitary(&not_unitary), None);
}

#[test]
fn integer_and_half_integer_powers() {
    let x = SingleQubitCliffordGate::x();
    assert_eq!(x.pow(0.5).unwrap(), SingleQubitCliffordGate::x_sqrt());
    assert_eq!(x.pow(-0.5).unwrap(), SingleQubitCliffordGate::x_nsqrt());
    assert_eq!(SingleQubitCliffordGate::z().pow(1.5).unwrap(), SingleQubitCliffordGate::z_nsqrt());
    assert_eq!(SingleQubitCliffordGate::h().pow(2.0).unwrap(), SingleQubitCliffordGate::identity());
    assert_eq!(SingleQubitCliffordGate::y_sqrt().pow(3.0).unwrap(), SingleQubitCliffordGate::y_nsqrt());
    assert_eq!(SingleQubitCliffordGate::z_sqrt().pow(-1.0).unwrap(), SingleQubitCliffordGate::z_nsqrt());
    assert_eq!(SingleQubitCliffordGate::h().pow(0.5), Err(Error::UnsupportedExponent(0.5)));
    assert!(SingleQubitCliffordGate::x().pow(0.25).is_err());
}

#[test]
fn quarter_turns() {
    assert_eq!(
        SingleQubitCliffordGate::from_quarter_turns(Axis::X, -1),
        SingleQubitCliffordGate::x_nsqrt()
    );
    assert_eq!(SingleQubitCliffordGate::from_quarter_turns(Axis::Z, 6), SingleQubitCliffordGate::z());
    assert_eq!(
        SingleQubitCliffordGate::from_quarter_turns(Axis::Y, 4),
        SingleQubitCliffordGate::identity()
    );
}

#[test]
fn display() {
    assert_eq!(
        SingleQubitCliffordGate::h().to_string(),
        "SingleQubitCliffordGate(X:+Z, Y:-Y, Z:+X)"
    );
    assert_eq!(
        SingleQubitCliffordGate::identity().to_string(),
        "SingleQubitCliffordGate(X:+X, Y:+Y, Z:+Z)"
    );
}

#[test]
fn phased_xz_equivalence() {
    for gate in SingleQubitCliffordGate::all() {
        let phased = gate.to_phased_xz_gate();
        assert!(close(&phased.matrix(), &gate.matrix()), "{gate} -> {phased}");
    }
}

#[test]
fn square_roots_rotate_by_quarter_turns() {
    let y_sqrt = SingleQubitCliffordGate::y_sqrt();
    assert_eq!(y_sqrt.transform(Axis::X), PauliTransform::minus(Axis::Z));
    assert_eq!(y_sqrt.transform(Axis::Y), PauliTransform::plus(Axis::Y));
    assert_eq!(y_sqrt.transform(Axis::Z), PauliTransform::plus(Axis::X));

    let x_sqrt = SingleQubitCliffordGate::x_sqrt();
    assert_eq!(x_sqrt.transform(Axis::Y), PauliTransform::plus(Axis::Z));
    assert_eq!(x_sqrt.transform(Axis::Z), PauliTransform::minus(Axis::Y));

    let z_sqrt = SingleQubitCliffordGate::z_sqrt();
    assert_eq!(z_sqrt.transform(Axis::X), PauliTransform::plus(Axis::Y));
    assert_eq!(z_sqrt.transform(Axis::Y), PauliTransform::minus(Axis::X));
}

#[test]
fn single_map_fixes_the_given_image() {
    for (from, to) in iproduct!(Axis::all(), PauliTransform::all()) {
        let gate = SingleQubitCliffordGate::from_single_map(&[(from, to)]).unwrap();
        assert_eq!(gate.transform(from), to);
        assert!(gate.tableau().is_valid());
    }
}

#[test]
fn double_map() {
    let gate = SingleQubitCliffordGate::from_double_map(&[
        (Axis::X, PauliTransform::plus(Axis::Z)),
        (Axis::Z, PauliTransform::plus(Axis::X)),
    ])
    .unwrap();
    assert_eq!(gate, SingleQubitCliffordGate::h());
    let gate = SingleQubitCliffordGate::from_double_map(&[
        (Axis::Y, PauliTransform::minus(Axis::Y)),
        (Axis::Z, PauliTransform::plus(Axis::X)),
    ])
    .unwrap();
    assert_eq!(gate, SingleQubitCliffordGate::h());
}

#[test]
fn invalid_maps_are_rejected() {
    let res = SingleQubitCliffordGate::from_single_map(&[
        (Axis::X, PauliTransform::plus(Axis::Y)),
        (Axis::Z, PauliTransform::plus(Axis::X)),
    ]);
    assert_eq!(res, Err(Error::InvalidSpecification("Method takes 1 transform.".to_owned())));

    let res = SingleQubitCliffordGate::from_double_map(&[(Axis::X, PauliTransform::plus(Axis::Y))]);
    assert_eq!(res, Err(Error::InvalidSpecification("Method takes 2 transforms.".to_owned())));

    let res = SingleQubitCliffordGate::from_double_map(&[
        (Axis::X, PauliTransform::plus(Axis::Y)),
        (Axis::Z, PauliTransform::minus(Axis::Y)),
    ]);
    assert_eq!(
        res,
        Err(Error::InvalidSpecification(
            "A rotation cannot map two Paulis to the same".to_owned()
        ))
    );

    let mirror = SingleQubitCliffordGate::from_xyz_map(
        PauliTransform::plus(Axis::X),
        PauliTransform::plus(Axis::Z),
        PauliTransform::plus(Axis::Y),
    );
    assert!(matches!(mirror, Err(Error::InvalidSpecification(_))));
}

#[test]
fn unitary_op_tableaux_match_single_qubit_gates() {
    let cases = [
        (UnitaryOp::X, SingleQubitCliffordGate::x()),
        (UnitaryOp::SqrtY, SingleQubitCliffordGate::y_sqrt()),
        (UnitaryOp::SqrtZInv, SingleQubitCliffordGate::z_nsqrt()),
        (UnitaryOp::Hadamard, SingleQubitCliffordGate::h()),
    ];
    for (op, gate) in cases {
        assert_eq!(op.clifford_tableau().as_ref(), Some(gate.tableau()), "{op}");
    }
}
