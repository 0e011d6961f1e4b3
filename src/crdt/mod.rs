//! CRDT primitives for collaborative data structures.

pub mod rga;

/// A CRDT is a data type with a merge operator that is commutative,
/// associative, and idempotent.
pub trait Crdt {
    /// Merge another instance into this one.
    /// Must be commutative: merge(a, b) == merge(b, a)
    /// Must be associative: merge(a, merge(b, c)) == merge(merge(a, b), c)
    /// Must be idempotent: merge(a, merge(a, b)) == merge(a, b)
    fn merge(&mut self, other: &Self);
}
