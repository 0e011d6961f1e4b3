//! Vector clocks for tracking per-actor causal high-water marks.
//!
//! Complexity:
//! - `get`: O(1)
//! - `get_mut`/`set`: O(1) amortized
//! - `merge`: O(n) where n is the number of actors in `other`
//! - `causally_ready`: O(deps)

use rustc_hash::FxHashMap;

use crate::id::ActorId;

/// Mapping from `ActorId` to the highest counter observed from that actor.
///
/// Invariant: `clock.get(a)` means all operations `(1..=clock.get(a), a)`
/// have been applied. Monotonically non-decreasing as changes apply.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct VectorClock {
    entries: FxHashMap<ActorId, u64>,
}

impl VectorClock {
    /// Create an empty vector clock.
    pub fn new() -> VectorClock {
        return VectorClock { entries: FxHashMap::default() };
    }

    /// Get the highest counter seen from `actor`, or 0 if none.
    pub fn get(&self, actor: &ActorId) -> u64 {
        return *self.entries.get(actor).unwrap_or(&0);
    }

    /// Set the high-water mark for `actor` to `max(current, counter)`.
    /// Returns the resulting value.
    pub fn advance(&mut self, actor: ActorId, counter: u64) -> u64 {
        let entry = self.entries.entry(actor).or_insert(0);
        *entry = (*entry).max(counter);
        return *entry;
    }

    /// Merge another clock into this one (pointwise maximum).
    pub fn merge(&mut self, other: &VectorClock) {
        for (actor, counter) in &other.entries {
            let entry = self.entries.entry(actor.clone()).or_insert(0);
            *entry = (*entry).max(*counter);
        }
    }

    /// True if every dependency in `deps` is already satisfied by this clock,
    /// i.e. `self.get(a) >= deps.get(a)` for every actor `a` in `deps`.
    pub fn causally_ready(&self, deps: &VectorClock) -> bool {
        for (actor, counter) in &deps.entries {
            if self.get(actor) < *counter {
                return false;
            }
        }
        return true;
    }

    /// Iterate over `(actor, counter)` pairs. Iteration order is not
    /// meaningful and must not be relied on for anything observable.
    pub fn iter(&self) -> impl Iterator<Item = (&ActorId, &u64)> {
        return self.entries.iter();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn actor(s: &str) -> ActorId {
        return ActorId::new(s);
    }

    #[test]
    fn get_defaults_to_zero() {
        let clock = VectorClock::new();
        assert_eq!(clock.get(&actor("doc0")), 0);
    }

    #[test]
    fn advance_is_monotonic() {
        let mut clock = VectorClock::new();
        assert_eq!(clock.advance(actor("doc0"), 3), 3);
        assert_eq!(clock.advance(actor("doc0"), 1), 3);
        assert_eq!(clock.advance(actor("doc0"), 5), 5);
    }

    #[test]
    fn merge_takes_pointwise_max() {
        let mut a = VectorClock::new();
        a.advance(actor("doc0"), 2);
        a.advance(actor("doc1"), 5);

        let mut b = VectorClock::new();
        b.advance(actor("doc0"), 4);
        b.advance(actor("doc2"), 1);

        a.merge(&b);
        assert_eq!(a.get(&actor("doc0")), 4);
        assert_eq!(a.get(&actor("doc1")), 5);
        assert_eq!(a.get(&actor("doc2")), 1);
    }

    #[test]
    fn causally_ready_checks_every_dependency() {
        let mut have = VectorClock::new();
        have.advance(actor("doc0"), 3);

        let mut deps = VectorClock::new();
        deps.advance(actor("doc0"), 3);
        assert!(have.causally_ready(&deps));

        deps.advance(actor("doc1"), 1);
        assert!(!have.causally_ready(&deps));

        have.advance(actor("doc1"), 1);
        assert!(have.causally_ready(&deps));
    }
}
