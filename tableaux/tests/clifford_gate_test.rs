use std::sync::Arc;

use ndarray::{arr1, arr2};
use num_complex::Complex64;
use proptest::prelude::*;
use quantum_core::linalg::{
    identity, is_unitary, matrices_close_up_to_global_phase, targeted_left_multiply, Matrix, Tolerance,
};
use quantum_core::Qid;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tableaux::{
    act_on, ActOnOutcome, CliffordGate, CliffordTableau, Error, Gate, MeasurementGate, MeasurementRecords,
    Operation, Operations, PauliPowGate, SimulationState, TableauSimulationState, UnitaryOp,
};

const ALL_OPS: [UnitaryOp; 14] = [
    UnitaryOp::I,
    UnitaryOp::X,
    UnitaryOp::Y,
    UnitaryOp::Z,
    UnitaryOp::SqrtX,
    UnitaryOp::SqrtXInv,
    UnitaryOp::SqrtY,
    UnitaryOp::SqrtYInv,
    UnitaryOp::SqrtZ,
    UnitaryOp::SqrtZInv,
    UnitaryOp::Hadamard,
    UnitaryOp::Swap,
    UnitaryOp::ControlledX,
    UnitaryOp::ControlledZ,
];

fn random_operations(num_qubits: usize, count: usize, rng: &mut impl Rng) -> Operations {
    let mut res = Operations::with_capacity(count);
    while res.len() < count {
        let op = ALL_OPS[rng.gen_range(0..ALL_OPS.len())];
        let support = if op.num_qubits() == 2 {
            if num_qubits < 2 {
                continue;
            }
            let first = rng.gen_range(0..num_qubits);
            let second = (first + rng.gen_range(1..num_qubits)) % num_qubits;
            vec![first, second]
        } else {
            vec![rng.gen_range(0..num_qubits)]
        };
        res.push((op, support));
    }
    res
}

fn tableau_of(num_qubits: usize, operations: &Operations) -> CliffordTableau {
    let mut tableau = CliffordTableau::new(num_qubits);
    for (op, support) in operations {
        op.apply_to(&mut tableau, support);
    }
    tableau
}

fn random_gate(num_qubits: usize, rng: &mut impl Rng) -> CliffordGate {
    let operations = random_operations(num_qubits, 20 * num_qubits, rng);
    CliffordGate::from_clifford_tableau(tableau_of(num_qubits, &operations)).unwrap()
}

fn to_operations(operations: &Operations, qubits: &[Qid]) -> Vec<Operation> {
    operations
        .iter()
        .map(|(op, support)| {
            let targets: Vec<Qid> = support.iter().map(|&index| qubits[index].clone()).collect();
            op.on(&targets).unwrap()
        })
        .collect()
}

#[test]
fn cnot_from_hadamard_and_cz() {
    let qubits = Qid::range(2);
    let (q0, q1) = (qubits[0].clone(), qubits[1].clone());
    let operations = vec![
        UnitaryOp::Hadamard.on(&[q1.clone()]).unwrap(),
        UnitaryOp::ControlledZ.on(&[q0.clone(), q1.clone()]).unwrap(),
        UnitaryOp::Hadamard.on(&[q1.clone()]).unwrap(),
    ];
    let gate = CliffordGate::from_op_list(&operations, &[q0.clone(), q1.clone()]).unwrap();
    assert_eq!(gate, CliffordGate::cnot());

    // the qubit order decides which tableau index each qubit takes
    let reversed = CliffordGate::from_op_list(&operations, &[q1.clone(), q0.clone()]).unwrap();
    assert_ne!(reversed, CliffordGate::cnot());
    let mut expected = CliffordTableau::new(2);
    expected.apply_cx(1, 0);
    assert_eq!(reversed.tableau(), &expected);

    let order_matters = vec![
        UnitaryOp::Hadamard.on(&[q0.clone()]).unwrap(),
        UnitaryOp::ControlledZ.on(&[q0.clone(), q1.clone()]).unwrap(),
        UnitaryOp::Hadamard.on(&[q0.clone()]).unwrap(),
    ];
    let gate = CliffordGate::from_op_list(&order_matters, &[q0, q1]).unwrap();
    assert_eq!(gate.tableau(), &expected);
}

#[test]
fn op_list_needs_stabilizer_effect() {
    let q0 = Qid::line(0);
    let operations = vec![UnitaryOp::Hadamard.on(&[q0.clone()]).unwrap(), PauliPowGate::z(0.25).on(&[q0.clone()]).unwrap()];
    assert_eq!(CliffordGate::from_op_list(&operations, &[q0]), Err(Error::NoStabilizerEffect));
}

#[test]
fn op_list_on_unknown_qubit() {
    let operations = vec![UnitaryOp::X.on(&[Qid::line(5)]).unwrap()];
    assert!(matches!(
        CliffordGate::from_op_list(&operations, &Qid::range(2)),
        Err(Error::UnknownQubit(_))
    ));
}

#[test]
fn op_list_with_mixed_gate_kinds() {
    let qubits = Qid::range(2);
    let operations = vec![
        PauliPowGate::x(0.5).on(&qubits[..1]).unwrap(),
        CliffordGate::cz().on(&qubits).unwrap(),
        tableaux::SingleQubitCliffordGate::h().on(&qubits[1..]).unwrap(),
    ];
    let gate = CliffordGate::from_op_list(&operations, &qubits).unwrap();
    let expected = tableau_of(
        2,
        &vec![
            (UnitaryOp::SqrtX, vec![0]),
            (UnitaryOp::ControlledZ, vec![0, 1]),
            (UnitaryOp::Hadamard, vec![1]),
        ],
    );
    assert_eq!(gate.tableau(), &expected);
}

#[test]
fn large_random_op_list() {
    let num_qubits = 50;
    let qubits = Qid::range(num_qubits);
    for seed in [0, 1, 2] {
        let mut rng = SmallRng::seed_from_u64(seed);
        let operations = random_operations(num_qubits, 1000, &mut rng);
        let gate = CliffordGate::from_op_list(&to_operations(&operations, &qubits), &qubits).unwrap();
        let expected = tableau_of(num_qubits, &operations);
        assert_eq!(gate.tableau(), &expected);
        assert!(gate.tableau().is_valid());

        let mut state = TableauSimulationState::new(qubits.clone(), SmallRng::seed_from_u64(seed));
        act_on(&gate.on(&qubits).unwrap(), &mut state, true).unwrap();
        assert_eq!(state.tableau(), &expected);
    }
}

#[test]
fn compiled_gate_on_part_of_a_large_register() {
    let num_qubits = 50;
    let qubits = Qid::range(num_qubits);
    let mut rng = SmallRng::seed_from_u64(9);
    let prefix = random_operations(num_qubits, 500, &mut rng);
    let inner = random_operations(20, 400, &mut rng);
    // gate qubit k acts on register qubit 2k + 5
    let targets: Vec<Qid> = (0..20).map(|k| qubits[2 * k + 5].clone()).collect();
    let gate = CliffordGate::from_op_list(&to_operations(&inner, &targets), &targets).unwrap();

    let mut expected = TableauSimulationState::new(qubits.clone(), SmallRng::seed_from_u64(0));
    let mut actual = TableauSimulationState::new(qubits.clone(), SmallRng::seed_from_u64(0));
    for operation in to_operations(&prefix, &qubits) {
        act_on(&operation, &mut expected, true).unwrap();
        act_on(&operation, &mut actual, true).unwrap();
    }
    for operation in to_operations(&inner, &targets) {
        act_on(&operation, &mut expected, true).unwrap();
    }
    act_on(&gate.on(&targets).unwrap(), &mut actual, true).unwrap();
    assert_eq!(actual.tableau(), expected.tableau());
}

fn reference_unitary(num_qubits: usize, operations: &Operations) -> Matrix {
    let shape = vec![2; num_qubits];
    let dimension = 1 << num_qubits;
    let mut res = identity(dimension);
    for mut column in res.columns_mut() {
        let mut amplitudes = column.to_vec();
        for (op, support) in operations {
            let mut next = vec![Complex64::new(0.0, 0.0); dimension];
            targeted_left_multiply(&op.unitary().unwrap(), &amplitudes, &shape, support, &mut next);
            amplitudes = next;
        }
        column.assign(&arr1(&amplitudes));
    }
    res
}

#[test]
fn unitary_of_common_gates() {
    for op in [
        UnitaryOp::ControlledX,
        UnitaryOp::ControlledZ,
        UnitaryOp::Swap,
        UnitaryOp::Hadamard,
        UnitaryOp::SqrtZ,
    ] {
        let unitary = CliffordGate::from(op).unitary().unwrap();
        assert!(
            matrices_close_up_to_global_phase(&unitary, &op.unitary().unwrap(), Tolerance::with_atol(1e-8)),
            "{op}"
        );
    }
    assert!(matrices_close_up_to_global_phase(
        &CliffordGate::identity(2).unitary().unwrap(),
        &identity(4),
        Tolerance::default()
    ));
}

#[test]
fn unitary_of_compiled_gates() {
    let qubits = Qid::range(3);
    let mut rng = SmallRng::seed_from_u64(17);
    for _ in 0..10 {
        let operations = random_operations(3, 30, &mut rng);
        let gate = CliffordGate::from_op_list(&to_operations(&operations, &qubits), &qubits).unwrap();
        let unitary = gate.unitary().unwrap();
        assert!(is_unitary(&unitary, Tolerance::default()));
        assert!(matrices_close_up_to_global_phase(
            &unitary,
            &reference_unitary(3, &operations),
            Tolerance::with_atol(1e-8)
        ));
    }
}

#[test]
fn powers_match_repeated_composition() {
    let mut rng = SmallRng::seed_from_u64(23);
    let gate = random_gate(3, &mut rng);
    let mut expected = CliffordGate::identity(3);
    for exponent in 0..7 {
        assert_eq!(gate.powi(exponent), expected, "exponent {exponent}");
        assert_eq!(gate.powi(-exponent), expected.inverse(), "exponent -{exponent}");
        expected = expected.then(&gate).unwrap();
    }
}

#[test]
fn operation_needs_one_qubit_per_gate_qubit() {
    let qubits = Qid::range(3);
    let wrong = CliffordGate::cnot().on(&qubits).map(|operation| operation.to_string());
    assert_eq!(
        wrong,
        Err(Error::WrongQubitCount {
            gate: CliffordGate::cnot().to_string(),
            expected: 2,
            actual: 3,
        })
    );
    let gate: Arc<dyn Gate> = Arc::new(UnitaryOp::Hadamard);
    assert!(matches!(
        Operation::new(gate, Vec::new()),
        Err(Error::WrongQubitCount { expected: 1, actual: 0, .. })
    ));
    assert!(CliffordGate::cnot().decompose(&qubits[..1]).is_none());
}

#[test]
fn padded_hadamard() {
    let h = CliffordGate::h();
    let padded = h.tableau().pad(2, &[0]).unwrap();
    let expected = CliffordTableau::from_parts(
        arr2(&[[false, false], [false, true], [true, false], [false, false]]),
        arr2(&[[true, false], [false, false], [false, false], [false, true]]),
        arr1(&[false; 4]),
    )
    .unwrap();
    assert_eq!(padded, expected);
    assert_eq!(
        padded.matrix(),
        arr2(&[
            [false, false, true, false],
            [false, true, false, false],
            [true, false, false, false],
            [false, false, false, true],
        ])
    );

    let padded = h.tableau().pad(2, &[1]).unwrap();
    let expected = CliffordTableau::from_parts(
        arr2(&[[true, false], [false, false], [false, false], [false, true]]),
        arr2(&[[false, false], [false, true], [true, false], [false, false]]),
        arr1(&[false; 4]),
    )
    .unwrap();
    assert_eq!(padded, expected);
}

#[test]
fn padding_errors() {
    let cnot = CliffordGate::cnot();
    assert_eq!(cnot.tableau().pad(3, &[0]), Err(Error::PaddingAxesMismatch));
    assert_eq!(cnot.tableau().pad(1, &[0, 1]), Err(Error::PaddingTooSmall));
    assert!(matches!(
        cnot.tableau().pad(3, &[1, 1]),
        Err(Error::InvalidSpecification(_))
    ));
    assert!(matches!(
        cnot.tableau().pad(3, &[0, 3]),
        Err(Error::InvalidSpecification(_))
    ));
}

#[test]
fn padding_then_composition_matches_direct_update() {
    let padded = CliffordGate::cnot().tableau().pad(4, &[3, 1]).unwrap();
    let mut expected = CliffordTableau::new(4);
    expected.apply_cx(3, 1);
    assert_eq!(padded, expected);
}

#[test]
fn powers() {
    let s = CliffordGate::s();
    assert_eq!(s.powi(2), CliffordGate::z());
    assert_eq!(s.pow(2.0).unwrap(), CliffordGate::z());
    assert_eq!(s.pow(-1.0).unwrap(), s.powi(3));
    assert_eq!(s.powi(-1), s.inverse());
    assert_eq!(s.powi(4), CliffordGate::identity(1));
    assert_eq!(CliffordGate::cnot().powi(3), CliffordGate::cnot());
    assert_eq!(CliffordGate::swap().powi(0), CliffordGate::identity(2));
    assert_eq!(CliffordGate::h().pow(1.5), Err(Error::UnsupportedExponent(1.5)));
}

#[test]
fn inverse_of_random_gates() {
    let mut rng = SmallRng::seed_from_u64(3);
    for num_qubits in 1..6 {
        let gate = random_gate(num_qubits, &mut rng);
        let inverse = gate.inverse();
        assert_eq!(gate.then(&inverse).unwrap(), CliffordGate::identity(num_qubits));
        assert_eq!(inverse.then(&gate).unwrap(), CliffordGate::identity(num_qubits));
        assert_eq!(inverse.tableau(), &gate.tableau().inverse().unwrap());
    }
}

#[test]
fn decomposition_rebuilds_random_gates() {
    let mut rng = SmallRng::seed_from_u64(5);
    for num_qubits in 1..8 {
        for _ in 0..10 {
            let gate = random_gate(num_qubits, &mut rng);
            let operations = gate.decompose_to_unitary_ops();
            assert_eq!(&tableau_of(num_qubits, &operations), gate.tableau());
        }
    }
}

#[test]
fn decomposition_of_identity_is_empty() {
    assert!(CliffordGate::identity(4).decompose_to_unitary_ops().is_empty());
}

#[test]
fn decomposed_operations_are_qubit_operations() {
    let qubits = vec![Qid::named("a"), Qid::named("b")];
    let operations = CliffordGate::cnot().decompose(&qubits).unwrap();
    let rebuilt = CliffordGate::from_op_list(&operations, &qubits).unwrap();
    assert_eq!(rebuilt, CliffordGate::cnot());
}

#[test]
fn invalid_tableau_is_rejected() {
    let tableau = CliffordTableau::from_parts(
        arr2(&[[true], [true]]),
        arr2(&[[false], [false]]),
        arr1(&[false, false]),
    )
    .unwrap();
    assert!(!tableau.is_valid());
    assert_eq!(tableau.inverse(), Err(Error::NotSymplectic));
    assert_eq!(CliffordGate::from_clifford_tableau(tableau), Err(Error::NotSymplectic));
}

#[test]
fn display() {
    assert_eq!(CliffordGate::h().to_string(), "CliffordGate(X₀→+Z₀, Z₀→+X₀)");
    assert_eq!(
        CliffordGate::cnot().to_string(),
        "CliffordGate(X₀→+X₀X₁, Z₀→+Z₀, X₁→+X₁, Z₁→+Z₀Z₁)"
    );
}

/// State that rejects every strategy, optionally accepting decomposed elementary operations.
#[derive(Default)]
struct RecordingState {
    qubits: Vec<Qid>,
    accept_decomposition: bool,
    applied: Vec<String>,
    measurements: MeasurementRecords,
}

impl SimulationState for RecordingState {
    fn qubits(&self) -> &[Qid] {
        &self.qubits
    }

    fn measure(&mut self, qubits: &[Qid]) -> tableaux::Result<Vec<usize>> {
        Ok(vec![0; qubits.len()])
    }

    fn measurements(&self) -> &MeasurementRecords {
        &self.measurements
    }

    fn measurements_mut(&mut self) -> &mut MeasurementRecords {
        &mut self.measurements
    }

    fn accepts_decomposed_operations(&self) -> bool {
        self.accept_decomposition
    }

    fn act_on_fallback(&mut self, operation: &Operation, _allow_decompose: bool) -> tableaux::Result<ActOnOutcome> {
        if self.accept_decomposition && operation.gate().num_qubits() <= 2 && operation.decompose().is_none() {
            self.applied.push(operation.to_string());
            return Ok(ActOnOutcome::Applied);
        }
        Ok(ActOnOutcome::NotImplemented)
    }
}

#[test]
fn failed_to_act() {
    let mut state = RecordingState {
        qubits: Qid::range(1),
        ..RecordingState::default()
    };
    let operation = CliffordGate::h().on(&Qid::range(1)).unwrap();
    let res = act_on(&operation, &mut state, true);
    assert_eq!(res, Err(Error::FailedToAct(operation.to_string())));
    assert_eq!(
        res.unwrap_err().to_string(),
        "Failed to act action on state: CliffordGate(X₀→+Z₀, Z₀→+X₀)(q(0))"
    );
}

#[test]
fn states_accepting_decomposition_receive_elementary_operations() {
    let qubits = Qid::range(2);
    let mut state = RecordingState {
        qubits: qubits.clone(),
        accept_decomposition: true,
        ..RecordingState::default()
    };
    let gate = CliffordGate::cnot().then(&CliffordGate::from(UnitaryOp::Swap)).unwrap();
    act_on(&gate.clone().on(&qubits).unwrap(), &mut state, true).unwrap();
    let expected: Vec<String> = gate
        .decompose(&qubits)
        .unwrap()
        .iter()
        .map(ToString::to_string)
        .collect();
    assert!(!expected.is_empty());
    assert_eq!(state.applied, expected);
}

#[test]
fn measurement_on_tableau_state() {
    let qubits = Qid::range(2);
    let mut state = TableauSimulationState::with_initial_state(qubits.clone(), 0b01, SmallRng::seed_from_u64(1));
    act_on(&UnitaryOp::ControlledX.on(&[qubits[1].clone(), qubits[0].clone()]).unwrap(), &mut state, true).unwrap();
    act_on(&MeasurementGate::new(2, "m").on(&qubits).unwrap(), &mut state, true).unwrap();
    assert_eq!(state.measurements()["m"], vec![vec![1, 1]]);
}

#[test]
fn bell_pair_measurements_agree() {
    let qubits = Qid::range(2);
    let mut rng = SmallRng::seed_from_u64(17);
    let mut seen = [false; 2];
    for _ in 0..32 {
        let mut state = TableauSimulationState::new(qubits.clone(), SmallRng::seed_from_u64(rng.gen()));
        act_on(&CliffordGate::h().on(&qubits[..1]).unwrap(), &mut state, true).unwrap();
        act_on(&CliffordGate::cnot().on(&qubits).unwrap(), &mut state, true).unwrap();
        act_on(&MeasurementGate::new(2, "bell").on(&qubits).unwrap(), &mut state, true).unwrap();
        let values = &state.measurements()["bell"][0];
        assert_eq!(values[0], values[1]);
        seen[values[0]] = true;
    }
    assert_eq!(seen, [true, true]);
}

#[test]
fn decomposing_through_arc_gates() {
    let qubits = Qid::range(3);
    let gate: Arc<dyn Gate> = Arc::new(CliffordGate::cz());
    let operation = Operation::new(gate, qubits[1..].to_vec()).unwrap();
    let composed = CliffordGate::from_op_list(&[operation], &qubits).unwrap();
    let mut expected = CliffordTableau::new(3);
    expected.apply_cz(1, 2);
    assert_eq!(composed.tableau(), &expected);
}

fn operations_strategy(num_qubits: usize) -> impl Strategy<Value = Operations> {
    prop::collection::vec((0..ALL_OPS.len(), 0..num_qubits, 1..num_qubits), 0..40).prop_map(move |choices| {
        choices
            .into_iter()
            .map(|(index, first, offset)| {
                let op = ALL_OPS[index];
                let support = if op.num_qubits() == 2 {
                    vec![first, (first + offset) % num_qubits]
                } else {
                    vec![first]
                };
                (op, support)
            })
            .collect()
    })
}

proptest! {
    #[test]
    fn composition_is_associative(
        a in operations_strategy(3),
        b in operations_strategy(3),
        c in operations_strategy(3)
    ) {
        let (a, b, c) = (tableau_of(3, &a), tableau_of(3, &b), tableau_of(3, &c));
        let left = a.then(&b).unwrap().then(&c).unwrap();
        let right = a.then(&b.then(&c).unwrap()).unwrap();
        prop_assert_eq!(left, right);
    }

    #[test]
    fn composition_matches_sequential_application(a in operations_strategy(4), b in operations_strategy(4)) {
        let combined: Operations = a.iter().chain(&b).cloned().collect();
        let composed = tableau_of(4, &a).then(&tableau_of(4, &b)).unwrap();
        prop_assert_eq!(composed, tableau_of(4, &combined));
    }

    #[test]
    fn identity_is_neutral(a in operations_strategy(3)) {
        let tableau = tableau_of(3, &a);
        let identity = CliffordTableau::new(3);
        prop_assert_eq!(&identity.then(&tableau).unwrap(), &tableau);
        prop_assert_eq!(&tableau.then(&identity).unwrap(), &tableau);
        prop_assert_eq!(tableau.then(&tableau.inverse().unwrap()).unwrap(), identity);
    }

    #[test]
    fn decomposition_round_trip(a in operations_strategy(4)) {
        let gate = CliffordGate::from_clifford_tableau(tableau_of(4, &a)).unwrap();
        prop_assert_eq!(&tableau_of(4, &gate.decompose_to_unitary_ops()), gate.tableau());
    }
}
