use crate::error::{Result, SimulationError};
use serde::{Deserialize, Serialize};
use tracing::info;

/// What occupies a slot of the operator string.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperatorKind {
    /// Empty slot.
    Identity,
    /// Diagonal part of the bond Hamiltonian.
    Diagonal,
    /// Off-diagonal part, exchanges the two spins of its bond.
    OffDiagonal,
}

/// A bond operator in imaginary time, plus the loop fragments directly below and above it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalOperator {
    kind: OperatorKind,
    bond: usize,
    #[serde(skip)]
    pub(crate) lower: usize,
    #[serde(skip)]
    pub(crate) upper: usize,
}

impl Default for LocalOperator {
    fn default() -> Self {
        Self::identity()
    }
}

impl LocalOperator {
    /// An empty slot.
    pub fn identity() -> Self {
        Self {
            kind: OperatorKind::Identity,
            bond: 0,
            lower: 0,
            upper: 0,
        }
    }

    /// A diagonal operator on `bond`.
    pub fn diagonal(bond: usize) -> Self {
        Self {
            kind: OperatorKind::Diagonal,
            bond,
            lower: 0,
            upper: 0,
        }
    }

    /// An off-diagonal operator on `bond`.
    pub fn offdiagonal(bond: usize) -> Self {
        Self {
            kind: OperatorKind::OffDiagonal,
            ..Self::diagonal(bond)
        }
    }

    /// Kind of operator.
    pub fn kind(&self) -> OperatorKind {
        self.kind
    }

    /// Bond index, meaningless for identities.
    pub fn bond(&self) -> usize {
        self.bond
    }

    /// Check if the slot is empty.
    pub fn is_identity(&self) -> bool {
        self.kind == OperatorKind::Identity
    }

    /// Check if diagonal.
    pub fn is_diagonal(&self) -> bool {
        self.kind == OperatorKind::Diagonal
    }

    /// Check if off-diagonal.
    pub fn is_offdiagonal(&self) -> bool {
        self.kind == OperatorKind::OffDiagonal
    }

    /// Swap diagonal and off-diagonal. Identities are left alone.
    pub fn toggle(&mut self) {
        self.kind = match self.kind {
            OperatorKind::Diagonal => OperatorKind::OffDiagonal,
            OperatorKind::OffDiagonal => OperatorKind::Diagonal,
            OperatorKind::Identity => OperatorKind::Identity,
        }
    }

    pub(crate) fn clear(&mut self) {
        self.kind = OperatorKind::Identity;
    }
}

/// A fixed length string of operator slots along imaginary time.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatorString {
    ops: Vec<LocalOperator>,
    num_operators: usize,
}

impl OperatorString {
    /// An all identity string with `capacity` slots, at least one.
    pub fn new(capacity: usize) -> Self {
        Self {
            ops: vec![LocalOperator::identity(); capacity.max(1)],
            num_operators: 0,
        }
    }

    /// Build a string from explicit slots.
    pub fn from_ops(ops: Vec<LocalOperator>) -> Self {
        let mut ops = ops;
        if ops.is_empty() {
            ops.push(LocalOperator::identity());
        }
        let num_operators = ops.iter().filter(|op| !op.is_identity()).count();
        Self { ops, num_operators }
    }

    /// Number of slots.
    pub fn capacity(&self) -> usize {
        self.ops.len()
    }

    /// Number of slots holding a non-identity operator.
    pub fn num_operators(&self) -> usize {
        self.num_operators
    }

    /// All slots in imaginary time order.
    pub fn ops(&self) -> &[LocalOperator] {
        &self.ops
    }

    pub(crate) fn ops_mut(&mut self) -> &mut [LocalOperator] {
        &mut self.ops
    }

    pub(crate) fn insert_diagonal(&mut self, slot: usize, bond: usize) {
        self.ops[slot] = LocalOperator::diagonal(bond);
        self.num_operators += 1;
    }

    pub(crate) fn remove(&mut self, slot: usize) {
        self.ops[slot].clear();
        self.num_operators -= 1;
    }

    /// Double the capacity if more than 80% of the slots are occupied.
    ///
    /// Slot `i` moves to slot `2i` and every odd slot becomes an identity, so the relative order
    /// of the operators is untouched. Returns whether the string grew.
    pub fn maybe_grow(&mut self) -> Result<bool> {
        let capacity = self.capacity();
        if (self.num_operators as f64) <= 0.8 * capacity as f64 {
            return Ok(false);
        }
        let new_capacity = doubled_capacity(capacity)?;
        let mut ops = vec![LocalOperator::identity(); new_capacity];
        self.ops
            .iter()
            .enumerate()
            .for_each(|(i, op)| ops[2 * i] = *op);
        self.ops = ops;
        info!(
            from = capacity,
            to = new_capacity,
            operators = self.num_operators,
            "operator string grew"
        );
        Ok(true)
    }
}

fn doubled_capacity(capacity: usize) -> Result<usize> {
    capacity
        .checked_mul(2)
        .ok_or(SimulationError::CapacityOverflow { capacity })
}

#[cfg(test)]
mod operator_string_tests {
    use super::*;

    #[test]
    fn test_no_growth_below_threshold() {
        let mut ops = vec![LocalOperator::identity(); 10];
        (0..8).for_each(|i| ops[i] = LocalOperator::diagonal(i));
        let mut string = OperatorString::from_ops(ops);
        assert!(!string.maybe_grow().unwrap());
        assert_eq!(string.capacity(), 10);
    }

    #[test]
    fn test_interleaves_on_growth() {
        let ops = vec![
            LocalOperator::diagonal(0),
            LocalOperator::offdiagonal(1),
            LocalOperator::identity(),
            LocalOperator::diagonal(2),
            LocalOperator::diagonal(3),
        ];
        let mut string = OperatorString::from_ops(ops.clone());
        assert_eq!(string.num_operators(), 4);
        assert!(string.maybe_grow().unwrap());
        assert_eq!(string.capacity(), 10);
        assert_eq!(string.num_operators(), 4);
        string.ops().iter().enumerate().for_each(|(i, op)| {
            if i % 2 == 0 {
                assert_eq!(*op, ops[i / 2]);
            } else {
                assert!(op.is_identity());
            }
        });
    }

    #[test]
    fn test_minimum_capacity() {
        assert_eq!(OperatorString::new(0).capacity(), 1);
        assert_eq!(OperatorString::from_ops(vec![]).capacity(), 1);
    }

    #[test]
    fn test_overflow() {
        assert_eq!(doubled_capacity(4).unwrap(), 8);
        let err = doubled_capacity(usize::MAX / 2 + 1).unwrap_err();
        assert!(matches!(err, SimulationError::CapacityOverflow { .. }));
    }

    #[test]
    fn test_toggle() {
        let mut op = LocalOperator::diagonal(3);
        op.toggle();
        assert!(op.is_offdiagonal());
        op.toggle();
        assert!(op.is_diagonal());
        let mut id = LocalOperator::identity();
        id.toggle();
        assert!(id.is_identity());
    }
}
