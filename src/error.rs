//! Error kinds for the merge and formatting core.
//!
//! Local errors abort the current `change` call without mutating state.
//! Errors during `apply_change` leave the document unchanged — the change
//! is validated in full before any op is applied.

use thiserror::Error;

use crate::format::mark::MarkType;

/// The distinguished error kinds of the core.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum Error {
    /// A change referred to ops that have not been seen yet. Recoverable —
    /// the caller should re-queue the change and retry once its
    /// dependencies are satisfied.
    #[error("change depends on unseen operations from {actor}: need counter {needed}, have {have}")]
    MissingDependency {
        actor: crate::id::ActorId,
        needed: u64,
        have: u64,
    },

    /// A local `index`/`count` violated the visible length at call time.
    #[error("index {index} (count {count}) out of bounds for length {len}")]
    OutOfBounds { index: u64, count: u64, len: u64 },

    /// An op referenced a mark type outside `{strong, em, link, comment}`.
    #[error("unknown mark type: {0}")]
    UnknownMark(String),

    /// An op was missing attrs required for its mark type (e.g. `link`
    /// without a `url`, `comment` without an `id`).
    #[error("malformed op: {mark_type:?} requires attrs that were not provided")]
    MalformedOp { mark_type: MarkType },

    /// The sync helper exceeded its retry bound without reaching
    /// convergence — indicates data corruption or an implementation bug.
    #[error("sync did not converge after {rounds} rounds")]
    NonConvergence { rounds: u32 },
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
