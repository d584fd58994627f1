use std::fmt;

/// Name part of a [`Qid`]. Line labels sort before named ones.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum QidLabel {
    Line(i64),
    Named(String),
}

/// Identifier of a quantum subsystem together with its dimension.
///
/// Qids are totally ordered, first by label and then by dimension, which gives a canonical axis assignment
/// when a register is built from an unordered collection.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Qid {
    label: QidLabel,
    dimension: usize,
}

impl Qid {
    #[must_use]
    pub fn line(index: i64) -> Self {
        Self::line_qudit(index, 2)
    }

    #[must_use]
    pub fn line_qudit(index: i64, dimension: usize) -> Self {
        Qid {
            label: QidLabel::Line(index),
            dimension,
        }
    }

    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Qid {
            label: QidLabel::Named(name.into()),
            dimension: 2,
        }
    }

    /// Qubits `q(0)`, ..., `q(count - 1)`.
    #[must_use]
    pub fn range(count: usize) -> Vec<Qid> {
        (0..count).map(|index| Qid::line(index as i64)).collect()
    }

    #[must_use]
    pub fn label(&self) -> &QidLabel {
        &self.label
    }

    #[must_use]
    pub fn dimension(&self) -> usize {
        self.dimension
    }
}

impl fmt::Display for Qid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.label, self.dimension) {
            (QidLabel::Line(index), 2) => write!(f, "q({index})"),
            (QidLabel::Line(index), dimension) => write!(f, "q({index}, d={dimension})"),
            (QidLabel::Named(name), 2) => f.write_str(name),
            (QidLabel::Named(name), dimension) => write!(f, "{name} (d={dimension})"),
        }
    }
}

#[must_use]
pub fn qid_shape(qids: &[Qid]) -> Vec<usize> {
    qids.iter().map(Qid::dimension).collect()
}
