//! The wire-compatible change record: a causally-atomic unit of work
//! produced by one actor, plus the tagged primitive ops it carries.
//!
//! Each op carries both the integer position the author observed (`index`,
//! `startIndex`/`endIndex` — useful as a human-readable hint and for
//! reconstructing intent) and the character identities resolved from that
//! position at creation time (`after`, `targets`, `startAnchor`/`endAnchor`).
//! Apply-remote always uses the resolved identities — a raw
//! integer position reinterpreted against a receiver's possibly-diverged
//! state would not converge under concurrent edits.

use crate::clock::VectorClock;
use crate::crdt::rga::Anchor;
use crate::format::mark::Attrs;
use crate::id::{ActorId, OpId};

fn text_path() -> Vec<String> {
    return vec!["text".to_string()];
}

/// One primitive operation inside a `Change`. Tagged on the wire by
/// `action`, matching `{ action: "insert", ... }` literally.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum PrimitiveOp {
    Insert {
        #[serde(default = "text_path")]
        path: Vec<String>,
        index: u64,
        values: Vec<String>,
        /// The character this run was inserted after. `None` means the
        /// very beginning of the document.
        after: Option<OpId>,
    },
    Delete {
        #[serde(default = "text_path")]
        path: Vec<String>,
        index: u64,
        count: u64,
        /// The ids of the characters being tombstoned, in visible order.
        targets: Vec<OpId>,
    },
    AddMark {
        #[serde(default = "text_path")]
        path: Vec<String>,
        start_index: u64,
        end_index: u64,
        mark_type: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        attrs: Option<Attrs>,
        start_anchor: Anchor,
        end_anchor: Anchor,
    },
    RemoveMark {
        #[serde(default = "text_path")]
        path: Vec<String>,
        start_index: u64,
        end_index: u64,
        mark_type: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        attrs: Option<Attrs>,
        start_anchor: Anchor,
        end_anchor: Anchor,
    },
}

impl PrimitiveOp {
    /// The number of local counters this op consumes — one per inserted
    /// character, one per tombstoned character, one for a mark op.
    pub fn counter_span(&self) -> u64 {
        return match self {
            PrimitiveOp::Insert { values, .. } => values.len() as u64,
            PrimitiveOp::Delete { targets, .. } => targets.len() as u64,
            PrimitiveOp::AddMark { .. } | PrimitiveOp::RemoveMark { .. } => 1,
        };
    }
}

/// A causally-atomic unit of work produced by one actor. Value-typed and
/// freely copyable across replicas — there is no aliasing between a
/// `Change` and the replica that produced it.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Change {
    pub actor: ActorId,
    pub start_counter: u64,
    pub seq: u64,
    pub deps: VectorClock,
    pub ops: Vec<PrimitiveOp>,
    /// A Lamport timestamp for this change: `max(lamport clock at creation
    /// time over every dependency) + 1`. Carried on the wire so every
    /// replica orders this change's resolved mark ops identically, rather
    /// than each replica re-deriving a possibly-divergent value. This is
    /// what lets the resolved op log sort causally-first rather than by
    /// `OpId` alone (see `format::log::ResolvedOpLog`).
    pub lamport: u64,
}

impl Change {
    /// The counter of the last op in this change, i.e. the value `clock[actor]`
    /// should advance to once the change is fully applied.
    pub fn end_counter(&self) -> u64 {
        let span: u64 = self.ops.iter().map(PrimitiveOp::counter_span).sum();
        return self.start_counter + span - 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primitive_op_round_trips_through_json() {
        let op = PrimitiveOp::AddMark {
            path: text_path(),
            start_index: 2,
            end_index: 9,
            mark_type: "strong".to_string(),
            attrs: None,
            start_anchor: Anchor::At(OpId::new(1, ActorId::new("doc0"))),
            end_anchor: Anchor::At(OpId::new(9, ActorId::new("doc0"))),
        };
        let json = serde_json::to_string(&op).unwrap();
        let back: PrimitiveOp = serde_json::from_str(&json).unwrap();
        assert_eq!(back, op);
    }

    #[test]
    fn change_round_trips_through_json() {
        let mut deps = VectorClock::new();
        deps.advance(ActorId::new("doc1"), 3);
        let change = Change {
            actor: ActorId::new("doc0"),
            start_counter: 1,
            seq: 0,
            deps,
            ops: vec![PrimitiveOp::Insert { path: text_path(), index: 0, values: vec!["h".to_string()], after: None }],
            lamport: 4,
        };
        let json = serde_json::to_string(&change).unwrap();
        let back: Change = serde_json::from_str(&json).unwrap();
        assert_eq!(back, change);
    }

    #[test]
    fn end_counter_accounts_for_multi_character_inserts() {
        let change = Change {
            actor: ActorId::new("doc0"),
            start_counter: 5,
            seq: 1,
            deps: VectorClock::new(),
            ops: vec![PrimitiveOp::Insert {
                path: text_path(),
                index: 0,
                values: vec!["a".to_string(), "b".to_string()],
                after: None,
            }],
            lamport: 1,
        };
        assert_eq!(change.end_counter(), 6);
    }
}
