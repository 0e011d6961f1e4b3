//! Identifiers for actors and operations.
//!
//! # Identifier Hierarchy
//!
//! - `ActorId`: a stable replica identity, assigned once per replica.
//! - `OpId`: identifies a single operation `(counter, actor)`.
//!
//! IDs are designed to be:
//! - Globally unique: `(counter, actor)` pairs are unique across all replicas.
//! - Totally ordered: can be compared deterministically (counter first, then
//!   actor as a tie-break), which is what makes concurrent-insert resolution
//!   and mark tie-breaks deterministic across replicas.
//! - Hashable: used as arena-index map keys.

use std::cmp::Ordering;
use std::fmt;

/// An opaque, stable identity for a replica (e.g. `"doc0"`, `"doc1"`).
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct ActorId(pub String);

impl ActorId {
    /// Wrap a string as an actor id.
    pub fn new(id: impl Into<String>) -> ActorId {
        return ActorId(id.into());
    }

    /// Borrow the underlying string.
    pub fn as_str(&self) -> &str {
        return &self.0;
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return write!(f, "{}", self.0);
    }
}

impl From<&str> for ActorId {
    fn from(value: &str) -> ActorId {
        return ActorId(value.to_string());
    }
}

impl From<String> for ActorId {
    fn from(value: String) -> ActorId {
        return ActorId(value);
    }
}

/// The identity of a single operation: `(counter, actor)`.
///
/// Total order across `OpId`s compares `counter` first and `actor`
/// lexicographically as a tie-break. This order is used for concurrent
/// insert resolution and for deterministic tie-breaks in the
/// format engine.
#[derive(Clone, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct OpId {
    /// Strictly increasing counter within `actor`.
    pub counter: u64,
    /// The actor that created this operation.
    pub actor: ActorId,
}

impl OpId {
    /// Create a new operation id.
    pub fn new(counter: u64, actor: ActorId) -> OpId {
        return OpId { counter, actor };
    }
}

impl PartialOrd for OpId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        return Some(self.cmp(other));
    }
}

impl Ord for OpId {
    fn cmp(&self, other: &Self) -> Ordering {
        match self.counter.cmp(&other.counter) {
            Ordering::Equal => self.actor.cmp(&other.actor),
            other => other,
        }
    }
}

impl fmt::Display for OpId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return write!(f, "{}@{}", self.counter, self.actor);
    }
}
