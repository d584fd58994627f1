use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::clifford_gate::CliffordGate;
use crate::pauli::PauliString;
use crate::single_qubit::SingleQubitCliffordGate;
use crate::tableau::{CliffordTableau, TableauRecord};

impl Serialize for CliffordTableau {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.to_record().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for CliffordTableau {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let record = TableauRecord::deserialize(deserializer)?;
        CliffordTableau::from_record(&record).map_err(de::Error::custom)
    }
}

impl Serialize for SingleQubitCliffordGate {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.to_record().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for SingleQubitCliffordGate {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let record = TableauRecord::deserialize(deserializer)?;
        SingleQubitCliffordGate::from_record(&record).map_err(de::Error::custom)
    }
}

impl Serialize for CliffordGate {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.to_record().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for CliffordGate {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let record = TableauRecord::deserialize(deserializer)?;
        CliffordGate::from_record(&record).map_err(de::Error::custom)
    }
}

/// Dense form accepted by `PauliString::from_str`, such as `-iXIZ`.
fn dense(pauli: &PauliString) -> String {
    let mut res = String::with_capacity(pauli.num_qubits() + 2);
    let y_count = (0..pauli.num_qubits())
        .filter(|&q| pauli.x_bits()[q] && pauli.z_bits()[q])
        .count();
    res.push_str(match (usize::from(pauli.phase_exponent()) + 4 - y_count % 4) % 4 {
        0 => "+",
        1 => "+i",
        2 => "-",
        _ => "-i",
    });
    for q in 0..pauli.num_qubits() {
        res.push(match (pauli.x_bits()[q], pauli.z_bits()[q]) {
            (false, false) => 'I',
            (true, false) => 'X',
            (true, true) => 'Y',
            (false, true) => 'Z',
        });
    }
    res
}

impl Serialize for PauliString {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&dense(self))
    }
}

impl<'de> Deserialize<'de> for PauliString {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let string = String::deserialize(deserializer)?;
        string
            .parse()
            .map_err(|_| de::Error::custom("failed to parse PauliString"))
    }
}
