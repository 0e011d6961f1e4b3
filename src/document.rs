//! Document facade: holds the sequence CRDT and the resolved mark
//! log, and exposes the primary editing surface.

use std::collections::BTreeSet;

use rustc_hash::FxHashMap;

use crate::change::{Change, PrimitiveOp};
use crate::clock::VectorClock;
use crate::crdt::rga::{Anchor, AnchorBias, Rga};
use crate::error::{Error, Result};
use crate::format::log::{ResolvedOp, ResolvedOpLog};
use crate::format::mark::{self, Attrs, MarkType, MarkValue};
use crate::format::span::{self, MarkAction};
use crate::id::{ActorId, OpId};

/// A single replica's view of the document: the sequence CRDT, the
/// resolved mark log, and the per-actor append-only change history that
/// backs `getMissingChanges`.
#[derive(Clone, Debug)]
pub struct Document {
    actor: ActorId,
    seq: u64,
    clock: VectorClock,
    /// Lamport clock used to stamp mark ops so the resolved op log can sort
    /// causally rather than by `OpId` alone (a per-actor counter says
    /// nothing about ops from other actors). Advances past any `deps` a
    /// local change carries, and past any change applied from a remote
    /// replica, per the standard Lamport-clock receive rule.
    lamport: u64,
    rga: Rga,
    log: ResolvedOpLog,
    history: FxHashMap<ActorId, Vec<Change>>,
}

impl Document {
    /// Create a new, empty document owned by `actor`.
    pub fn new(actor: impl Into<ActorId>) -> Document {
        return Document {
            actor: actor.into(),
            seq: 0,
            clock: VectorClock::new(),
            lamport: 0,
            rga: Rga::new(),
            log: ResolvedOpLog::new(),
            history: FxHashMap::default(),
        };
    }

    pub fn actor_id(&self) -> &ActorId {
        return &self.actor;
    }

    /// A copy of the current vector clock.
    pub fn clock(&self) -> VectorClock {
        return self.clock.clone();
    }

    /// The visible length of the document, in characters.
    pub fn len(&self) -> usize {
        return self.rga.visible_len();
    }

    pub fn is_empty(&self) -> bool {
        return self.rga.visible_len() == 0;
    }

    /// The visible text, in document order.
    pub fn text(&self) -> String {
        return self.rga.to_string();
    }

    /// Read-only access to the per-actor append log backing
    /// `getMissingChanges`.
    pub fn history(&self) -> &FxHashMap<ActorId, Vec<Change>> {
        return &self.history;
    }

    /// The visible text, split into runs by formatting span and paired
    /// with the marks covering each run.
    pub fn get_text_with_formatting(&self) -> Vec<(String, BTreeSet<MarkValue>)> {
        let len = self.rga.visible_len();
        let applications = self.log.materialize(&self.rga);
        let spans = span::replay_ops(&applications, len);

        let mut out = Vec::with_capacity(spans.len());
        for (i, current) in spans.iter().enumerate() {
            let end = spans.get(i + 1).map(|next| next.start).unwrap_or(len);
            let text = self.rga.slice(current.start, end).unwrap_or_default();
            out.push((text, current.marks.clone()));
        }
        return out;
    }

    /// Apply `ops` locally, append the resulting change to this actor's
    /// history, and return it. The document reflects the edit immediately.
    /// On any error, the document is left exactly as it was — ops are
    /// applied to a scratch copy of the state and only committed once every
    /// op in the batch has succeeded.
    pub fn change(&mut self, ops: Vec<PrimitiveOp>) -> Result<Change> {
        let deps = self.clock.clone();
        let start_counter = self.clock.get(&self.actor) + 1;
        let lamport = self.lamport + 1;
        let mut counter = start_counter;
        let mut rga = self.rga.clone();
        let mut log = self.log.clone();
        let mut wire_ops = Vec::with_capacity(ops.len());

        for op in ops {
            let (wire_op, next_counter) = apply_local_op(&mut rga, &mut log, &self.actor, counter, lamport, op)?;
            wire_ops.push(wire_op);
            counter = next_counter;
        }

        self.rga = rga;
        self.log = log;
        self.clock.advance(self.actor.clone(), counter - 1);
        self.lamport = lamport;

        let change = Change { actor: self.actor.clone(), start_counter, seq: self.seq, deps, ops: wire_ops, lamport };
        self.seq += 1;
        self.history.entry(self.actor.clone()).or_default().push(change.clone());
        log::debug!("{} applied local change seq={}", self.actor, change.seq);
        return Ok(change);
    }

    /// Validate `change.deps` against the current clock and, if satisfied,
    /// apply every op inside it and advance the clock. Fails with
    /// `MissingDependency` (the caller should re-queue) if `deps` is not
    /// yet satisfied; the document is left unchanged either way unless
    /// every op applies cleanly. Applying a change this replica has already
    /// observed is a true no-op — it neither re-advances the clock nor
    /// duplicates the change in `history`.
    pub fn apply_change(&mut self, change: &Change) -> Result<()> {
        if self.clock.get(&change.actor) >= change.end_counter() {
            log::debug!("{} ignoring already-observed change from {} seq={}", self.actor, change.actor, change.seq);
            return Ok(());
        }

        if let Some((actor, needed, have)) = first_unsatisfied_dependency(&self.clock, &change.deps) {
            log::warn!("{} deferring change from {} (needs {} counter {}, have {})", self.actor, change.actor, actor, needed, have);
            return Err(Error::MissingDependency { actor, needed, have });
        }

        let mut rga = self.rga.clone();
        let mut log = self.log.clone();
        let mut counter = change.start_counter;

        for op in &change.ops {
            let next_counter = apply_remote_op(&mut rga, &mut log, &change.actor, counter, change.lamport, op)?;
            counter = next_counter;
        }

        self.rga = rga;
        self.log = log;
        self.clock.advance(change.actor.clone(), counter - 1);
        // Standard Lamport receive rule: this replica's own subsequent
        // local changes must carry a timestamp past anything it has seen.
        self.lamport = self.lamport.max(change.lamport) + 1;
        self.history.entry(change.actor.clone()).or_default().push(change.clone());
        log::debug!("{} applied change from {} seq={}", self.actor, change.actor, change.seq);
        return Ok(());
    }
}

/// The first `(actor, needed, have)` dependency in `deps` that `clock`
/// does not yet satisfy, if any.
fn first_unsatisfied_dependency(clock: &VectorClock, deps: &VectorClock) -> Option<(ActorId, u64, u64)> {
    for (actor, needed) in deps.iter() {
        let have = clock.get(actor);
        if have < *needed {
            return Some((actor.clone(), *needed, have));
        }
    }
    return None;
}

/// Apply one locally-authored op against scratch state, resolving
/// positions into the identities the wire form carries, and return the
/// wire op plus the next free counter.
fn apply_local_op(
    rga: &mut Rga,
    log: &mut ResolvedOpLog,
    actor: &ActorId,
    counter: u64,
    lamport: u64,
    op: PrimitiveOp,
) -> Result<(PrimitiveOp, u64)> {
    match op {
        PrimitiveOp::Insert { path, index, values, .. } => {
            let idx = index as usize;
            if idx > rga.visible_len() {
                return Err(Error::OutOfBounds { index, count: values.len() as u64, len: rga.visible_len() as u64 });
            }
            let after = if idx == 0 { None } else { Some(rga.char_at_visible_pos(idx - 1).expect("index validated above")) };
            let mut predecessor = after.clone();
            let mut next = counter;
            for value in &values {
                let id = OpId::new(next, actor.clone());
                rga.insert(id.clone(), predecessor, value.clone())?;
                predecessor = Some(id);
                next += 1;
            }
            return Ok((PrimitiveOp::Insert { path, index, values, after }, next));
        }
        PrimitiveOp::Delete { path, index, count, .. } => {
            let idx = index as usize;
            let n = count as usize;
            if idx + n > rga.visible_len() {
                return Err(Error::OutOfBounds { index, count, len: rga.visible_len() as u64 });
            }
            let mut targets = Vec::with_capacity(n);
            let mut next = counter;
            for _ in 0..n {
                let id = rga.char_at_visible_pos(idx).expect("index validated above");
                rga.delete(&id)?;
                targets.push(id);
                next += 1;
            }
            return Ok((PrimitiveOp::Delete { path, index, count, targets }, next));
        }
        PrimitiveOp::AddMark { path, start_index, end_index, mark_type, attrs, .. } => {
            let (value, start_anchor, end_anchor) = resolve_mark_anchors(rga, start_index, end_index, &mark_type, attrs.as_ref())?;
            let id = OpId::new(counter, actor.clone());
            log.insert(ResolvedOp { id, lamport, action: MarkAction::Add, value, start: start_anchor.clone(), end: end_anchor.clone() });
            return Ok((
                PrimitiveOp::AddMark { path, start_index, end_index, mark_type, attrs, start_anchor, end_anchor },
                counter + 1,
            ));
        }
        PrimitiveOp::RemoveMark { path, start_index, end_index, mark_type, attrs, .. } => {
            let (value, start_anchor, end_anchor) = resolve_mark_anchors(rga, start_index, end_index, &mark_type, attrs.as_ref())?;
            let id = OpId::new(counter, actor.clone());
            log.insert(ResolvedOp { id, lamport, action: MarkAction::Remove, value, start: start_anchor.clone(), end: end_anchor.clone() });
            return Ok((
                PrimitiveOp::RemoveMark { path, start_index, end_index, mark_type, attrs, start_anchor, end_anchor },
                counter + 1,
            ));
        }
    }
}

/// Apply one remotely-received op, using the identities already resolved
/// by its author rather than reinterpreting integer positions against this
/// replica's (possibly diverged) current state.
fn apply_remote_op(
    rga: &mut Rga,
    log: &mut ResolvedOpLog,
    actor: &ActorId,
    counter: u64,
    lamport: u64,
    op: &PrimitiveOp,
) -> Result<u64> {
    match op {
        PrimitiveOp::Insert { values, after, .. } => {
            let mut predecessor = after.clone();
            let mut next = counter;
            for value in values {
                let id = OpId::new(next, actor.clone());
                rga.insert(id.clone(), predecessor, value.clone())?;
                predecessor = Some(id);
                next += 1;
            }
            return Ok(next);
        }
        PrimitiveOp::Delete { targets, .. } => {
            let mut next = counter;
            for id in targets {
                rga.delete(id)?;
                next += 1;
            }
            return Ok(next);
        }
        PrimitiveOp::AddMark { mark_type, attrs, start_anchor, end_anchor, .. } => {
            let mark_type = MarkType::parse(mark_type)?;
            let value = mark::resolve(mark_type, attrs.as_ref())?;
            let id = OpId::new(counter, actor.clone());
            log.insert(ResolvedOp { id, lamport, action: MarkAction::Add, value, start: start_anchor.clone(), end: end_anchor.clone() });
            return Ok(counter + 1);
        }
        PrimitiveOp::RemoveMark { mark_type, attrs, start_anchor, end_anchor, .. } => {
            let mark_type = MarkType::parse(mark_type)?;
            let value = mark::resolve(mark_type, attrs.as_ref())?;
            let id = OpId::new(counter, actor.clone());
            log.insert(ResolvedOp { id, lamport, action: MarkAction::Remove, value, start: start_anchor.clone(), end: end_anchor.clone() });
            return Ok(counter + 1);
        }
    }
}

/// Validate a mark op's range against the current document length, parse
/// its mark type and attrs, and resolve its anchors (left-gravity
/// start, right-gravity end).
fn resolve_mark_anchors(
    rga: &Rga,
    start_index: u64,
    end_index: u64,
    mark_type: &str,
    attrs: Option<&Attrs>,
) -> Result<(MarkValue, Anchor, Anchor)> {
    let len = rga.visible_len();
    let start = start_index as usize;
    let end = end_index as usize;
    if start > end || end >= len {
        return Err(Error::OutOfBounds { index: start_index, count: end_index.saturating_sub(start_index) + 1, len: len as u64 });
    }
    let mark_type = MarkType::parse(mark_type)?;
    let value = mark::resolve(mark_type, attrs)?;
    let start_anchor = rga.position_to_anchor(start, AnchorBias::Left)?;
    let end_anchor = rga.position_to_anchor(end, AnchorBias::Right)?;
    return Ok((value, start_anchor, end_anchor));
}
