//! Format span engine: replays resolved, position-materialized mark
//! operations into a normalized sequence of format spans.

use std::collections::BTreeSet;

use crate::format::mark::MarkValue;

/// Whether a mark application adds or removes a value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MarkAction {
    Add,
    Remove,
}

/// A single mark operation with its anchors already resolved to current
/// integer positions (inclusive `start..=end`), ready to replay.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MarkApplication {
    pub action: MarkAction,
    pub start: usize,
    pub end: usize,
    pub value: MarkValue,
}

/// A maximal run of positions bearing one `marks` set.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FormatSpan {
    pub start: usize,
    pub marks: BTreeSet<MarkValue>,
}

impl FormatSpan {
    fn empty(start: usize) -> FormatSpan {
        return FormatSpan { start, marks: BTreeSet::new() };
    }
}

/// Replay a log of mark applications (already materialized to integer
/// positions) into a normalized span list covering `[0, length)`.
pub fn replay_ops(ops: &[MarkApplication], length: usize) -> Vec<FormatSpan> {
    let mut spans = vec![FormatSpan::empty(0)];
    for op in ops {
        apply(&mut spans, op);
    }
    return normalize(spans, length);
}

/// Apply one mark op to the span list in place, splitting span boundaries
/// at `start` and `end + 1` and updating every span's mark set within
/// `[start, end]`.
fn apply(spans: &mut Vec<FormatSpan>, op: &MarkApplication) {
    split_at(spans, op.start);
    split_at(spans, op.end + 1);

    for span in spans.iter_mut() {
        if span.start < op.start || span.start > op.end {
            continue;
        }
        match (op.action, &op.value) {
            (MarkAction::Add, MarkValue::Link(_)) => {
                span.marks.retain(|m| !matches!(m, MarkValue::Link(_)));
                span.marks.insert(op.value.clone());
            }
            (MarkAction::Add, _) => {
                span.marks.insert(op.value.clone());
            }
            (MarkAction::Remove, MarkValue::Link(_)) => {
                span.marks.retain(|m| !matches!(m, MarkValue::Link(_)));
            }
            (MarkAction::Remove, _) => {
                span.marks.remove(&op.value);
            }
        }
    }
}

/// Ensure a span boundary exists exactly at `pos`, inheriting marks from
/// the span it splits. A no-op if a boundary already exists there.
fn split_at(spans: &mut Vec<FormatSpan>, pos: usize) {
    let idx = spans.partition_point(|s| s.start <= pos);
    if idx == 0 {
        return;
    }
    let containing = idx - 1;
    if spans[containing].start == pos {
        return;
    }
    let marks = spans[containing].marks.clone();
    spans.insert(containing + 1, FormatSpan { start: pos, marks });
}

/// Normalize a span list for a document of length `length`:
/// - drop trailing spans with `start >= length`,
/// - collapse adjacent spans with identical `marks`, keeping the leftmost,
/// - ensure a span exists at `start == 0`.
pub fn normalize(mut spans: Vec<FormatSpan>, length: usize) -> Vec<FormatSpan> {
    spans.retain(|s| s.start < length);
    spans.sort_by_key(|s| s.start);
    if spans.first().map(|s| s.start) != Some(0) {
        spans.insert(0, FormatSpan::empty(0));
    }

    let mut out: Vec<FormatSpan> = Vec::with_capacity(spans.len());
    for span in spans {
        if out.last().map(|last: &FormatSpan| &last.marks) == Some(&span.marks) {
            continue;
        }
        out.push(span);
    }
    return out;
}

/// Return `(span, index)` for the rightmost span with `span.start <= pos`.
/// `index` is the position of that span within `spans`, counted from 1 to
/// match how this query is conventionally reported. Returns `None` for an
/// empty list or when `pos` precedes every span.
pub fn get_span_at_position(spans: &[FormatSpan], pos: usize) -> Option<(&FormatSpan, usize)> {
    if spans.is_empty() || pos < spans[0].start {
        return None;
    }
    let idx = spans.partition_point(|s| s.start <= pos) - 1;
    return Some((&spans[idx], idx + 1));
}
