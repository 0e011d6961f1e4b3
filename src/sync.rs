//! Sync helper: computes the changes a target is missing
//! relative to a source and drives them into the target in causal order.

use crate::change::Change;
use crate::clock::VectorClock;
use crate::document::Document;
use crate::error::{Error, Result};
use crate::id::ActorId;

/// Bound on the number of passes `sync` will make over a deferred-change
/// queue before giving up. A single pass only fails to make progress when
/// the source's history is missing a dependency the target needs, which
/// should never happen for a well-formed source — this bound exists to
/// turn that bug into a clear error instead of an infinite loop.
pub const MAX_SYNC_ROUNDS: u32 = 10_000;

/// Every change in `source`'s history that `target` has not yet observed,
/// in an order where each change's `deps` are satisfied by the changes
/// before it — so applying them to `target` in this order never produces
/// a spurious `MissingDependency`.
pub fn get_missing_changes(source: &Document, target_clock: &VectorClock) -> Vec<Change> {
    let mut missing: Vec<Change> = Vec::new();
    for changes in source.history().values() {
        for change in changes {
            if target_clock.get(&change.actor) < change.start_counter {
                missing.push(change.clone());
            }
        }
    }
    missing.sort_by(|a, b| (a.actor.clone(), a.start_counter).cmp(&(b.actor.clone(), b.start_counter)));
    return missing;
}

/// Bring `target` up to date with everything `source` has seen. Repeatedly
/// computes the missing set and applies whatever is currently
/// causally-ready, re-queuing the rest, until the missing set is empty or
/// `MAX_SYNC_ROUNDS` passes have made no progress.
pub fn sync(source: &Document, target: &mut Document) -> Result<()> {
    let mut pending = get_missing_changes(source, &target.clock());
    let mut rounds = 0;

    while !pending.is_empty() {
        rounds += 1;
        if rounds > MAX_SYNC_ROUNDS {
            return Err(Error::NonConvergence { rounds: MAX_SYNC_ROUNDS });
        }

        let mut deferred = Vec::new();
        let mut applied_this_round = false;
        for change in pending {
            match target.apply_change(&change) {
                Ok(()) => applied_this_round = true,
                Err(Error::MissingDependency { .. }) => deferred.push(change),
                Err(err) => return Err(err),
            }
        }

        if !applied_this_round {
            log::warn!("sync stalled with {} changes still deferred", deferred.len());
            return Err(Error::NonConvergence { rounds });
        }
        pending = deferred;
    }

    return Ok(());
}

/// Convenience wrapper naming the actor whose history was read, matching
/// the `getMissingChanges(actor, clock)` shape.
pub fn missing_changes_for(source: &Document, actor: &ActorId, target_clock: &VectorClock) -> Vec<Change> {
    return get_missing_changes(source, target_clock)
        .into_iter()
        .filter(|c| &c.actor == actor)
        .collect();
}
