//! Resolved operation log: the causal list of mark operations,
//! addressed by character identity rather than integer position, so a
//! mark authored on one replica stays semantically stable on a replica
//! with diverging intermediate inserts.

use crate::crdt::rga::{Anchor, AnchorBias, Rga};
use crate::format::mark::MarkValue;
use crate::format::span::{MarkAction, MarkApplication};
use crate::id::OpId;

/// A single `addMark`/`removeMark` operation after its visible `start`/`end`
/// have been translated into anchor identities.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedOp {
    /// The id of this op itself, used as the deterministic tie-break between
    /// concurrent mark ops that land on the same `lamport` value.
    pub id: OpId,
    /// The Lamport timestamp of the `Change` this op came from (see
    /// `Change::lamport`). Causal order is a partial order on counters alone
    /// — a per-actor counter says nothing about ops from other actors — so
    /// replay order sorts by this scalar first and falls back to `id` only
    /// between ops that are mutually concurrent.
    pub lamport: u64,
    pub action: MarkAction,
    pub value: MarkValue,
    pub start: Anchor,
    pub end: Anchor,
}

/// The causally-applied log of resolved mark ops, kept sorted by
/// `(lamport, id)` so that any two replicas holding the same set of ops
/// agree on replay order: causally-later changes always carry a strictly
/// higher `lamport` value than everything in their `deps`, and `id` is only
/// consulted to break ties between mutually concurrent ops.
#[derive(Clone, Debug, Default)]
pub struct ResolvedOpLog {
    ops: Vec<ResolvedOp>,
}

impl ResolvedOpLog {
    pub fn new() -> ResolvedOpLog {
        return ResolvedOpLog { ops: Vec::new() };
    }

    /// Insert a resolved op into its sorted position. Idempotent: applying
    /// the same op id twice is a no-op.
    pub fn insert(&mut self, op: ResolvedOp) {
        let key = |o: &ResolvedOp| (o.lamport, o.id.clone());
        let pos = self.ops.partition_point(|o| key(o) < key(&op));
        if self.ops.get(pos).map(|o| &o.id) == Some(&op.id) {
            return;
        }
        self.ops.insert(pos, op);
    }

    pub fn len(&self) -> usize {
        return self.ops.len();
    }

    pub fn is_empty(&self) -> bool {
        return self.ops.is_empty();
    }

    /// Re-resolve every anchor against the current state of `rga`, yielding
    /// a replay-ready list of mark applications at current integer
    /// positions. This is the step that lets a replica with different
    /// concurrent inserts still compute the same spans.
    pub fn materialize(&self, rga: &Rga) -> Vec<MarkApplication> {
        return self
            .ops
            .iter()
            .map(|op| MarkApplication {
                action: op.action,
                start: rga.anchor_to_position(&op.start, AnchorBias::Left),
                end: rga.anchor_to_position(&op.end, AnchorBias::Right),
                value: op.value.clone(),
            })
            .collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::ActorId;

    fn id(counter: u64, actor: &str) -> OpId {
        return OpId::new(counter, ActorId::new(actor));
    }

    fn resolved(op_id: OpId, lamport: u64, action: MarkAction, value: MarkValue, start: Anchor, end: Anchor) -> ResolvedOp {
        return ResolvedOp { id: op_id, lamport, action, value, start, end };
    }

    #[test]
    fn insert_keeps_log_sorted_by_lamport_then_op_id() {
        let mut log = ResolvedOpLog::new();
        log.insert(resolved(id(3, "doc0"), 3, MarkAction::Add, MarkValue::Strong, Anchor::Start, Anchor::End));
        log.insert(resolved(id(1, "doc0"), 1, MarkAction::Add, MarkValue::Em, Anchor::Start, Anchor::End));
        log.insert(resolved(id(2, "doc1"), 2, MarkAction::Add, MarkValue::Em, Anchor::Start, Anchor::End));
        let ids: Vec<_> = log.ops.iter().map(|o| o.id.clone()).collect();
        assert_eq!(ids, vec![id(1, "doc0"), id(2, "doc1"), id(3, "doc0")]);
    }

    #[test]
    fn insert_is_idempotent() {
        let mut log = ResolvedOpLog::new();
        let op = resolved(id(1, "doc0"), 1, MarkAction::Add, MarkValue::Strong, Anchor::Start, Anchor::End);
        log.insert(op.clone());
        log.insert(op);
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn causally_later_op_wins_even_with_a_smaller_op_id() {
        // doc0 issues `addMark strong` at counter 5 (lamport 5). doc1, after
        // syncing that op, issues `removeMark strong` at its own counter 3
        // but with a lamport stamp advanced past what it observed (8).
        // Causally the remove is later and must win, even though
        // `(3, doc1) < (5, doc0)` as a bare `OpId` comparison.
        let mut log = ResolvedOpLog::new();
        log.insert(resolved(id(5, "doc0"), 5, MarkAction::Add, MarkValue::Strong, Anchor::Start, Anchor::End));
        log.insert(resolved(id(3, "doc1"), 8, MarkAction::Remove, MarkValue::Strong, Anchor::Start, Anchor::End));

        let ids: Vec<_> = log.ops.iter().map(|o| o.id.clone()).collect();
        assert_eq!(ids, vec![id(5, "doc0"), id(3, "doc1")]);
    }

    #[test]
    fn materialize_resolves_anchors_against_current_rga() {
        let mut rga = Rga::new();
        rga.insert(id(1, "doc0"), None, "a".to_string()).unwrap();
        rga.insert(id(2, "doc0"), Some(id(1, "doc0")), "b".to_string()).unwrap();
        rga.insert(id(3, "doc0"), Some(id(2, "doc0")), "c".to_string()).unwrap();

        let mut log = ResolvedOpLog::new();
        // strong over "bc": left-gravity start anchored to "a", right-gravity
        // end anchored to "c" itself.
        log.insert(resolved(
            id(4, "doc0"),
            4,
            MarkAction::Add,
            MarkValue::Strong,
            Anchor::At(id(1, "doc0")),
            Anchor::At(id(3, "doc0")),
        ));

        let applications = log.materialize(&rga);
        assert_eq!(applications.len(), 1);
        assert_eq!(applications[0].start, 1);
        assert_eq!(applications[0].end, 2);

        // A character inserted between "a" and "b" (with a higher OpId, so
        // it sorts before "b" among "a"'s children) is swept into the
        // range since the start anchor sticks to "a", not to an integer
        // position.
        rga.insert(id(10, "doc1"), Some(id(1, "doc0")), "x".to_string()).unwrap();
        let applications = log.materialize(&rga);
        assert_eq!(applications[0].start, 1);
        assert_eq!(applications[0].end, 3);
    }
}
