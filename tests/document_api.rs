//! Integration tests for the `Document` facade: local edits, formatting
//! queries, and atomicity of rejected changes.

use together::change::PrimitiveOp;
use together::crdt::rga::Anchor;
use together::document::Document;
use together::error::Error;
use together::format::mark::{Attrs, MarkValue};

fn insert(index: u64, text: &str) -> PrimitiveOp {
    return PrimitiveOp::Insert {
        path: vec!["text".to_string()],
        index,
        values: text.chars().map(|c| c.to_string()).collect(),
        after: None,
    };
}

fn delete(index: u64, count: u64) -> PrimitiveOp {
    return PrimitiveOp::Delete { path: vec!["text".to_string()], index, count, targets: vec![] };
}

fn add_mark(start_index: u64, end_index: u64, mark_type: &str, attrs: Option<Attrs>) -> PrimitiveOp {
    return PrimitiveOp::AddMark {
        path: vec!["text".to_string()],
        start_index,
        end_index,
        mark_type: mark_type.to_string(),
        attrs,
        start_anchor: Anchor::Start,
        end_anchor: Anchor::End,
    };
}

fn remove_mark(start_index: u64, end_index: u64, mark_type: &str, attrs: Option<Attrs>) -> PrimitiveOp {
    return PrimitiveOp::RemoveMark {
        path: vec!["text".to_string()],
        start_index,
        end_index,
        mark_type: mark_type.to_string(),
        attrs,
        start_anchor: Anchor::Start,
        end_anchor: Anchor::End,
    };
}

#[test]
fn insert_and_delete_round_trip() {
    let mut doc = Document::new("doc0");
    doc.change(vec![insert(0, "hello world")]).unwrap();
    assert_eq!(doc.text(), "hello world");

    doc.change(vec![delete(5, 6)]).unwrap();
    assert_eq!(doc.text(), "hello");
}

#[test]
fn a_single_change_can_carry_multiple_ops() {
    let mut doc = Document::new("doc0");
    doc.change(vec![insert(0, "ab"), insert(2, "cd")]).unwrap();
    assert_eq!(doc.text(), "abcd");
}

#[test]
fn out_of_bounds_insert_is_rejected_and_leaves_state_untouched() {
    let mut doc = Document::new("doc0");
    doc.change(vec![insert(0, "abc")]).unwrap();
    let clock_before = doc.clock();

    let err = doc.change(vec![insert(99, "x")]).unwrap_err();
    assert!(matches!(err, Error::OutOfBounds { .. }));
    assert_eq!(doc.text(), "abc");
    assert_eq!(doc.clock(), clock_before);
}

#[test]
fn a_batch_change_is_atomic_across_its_ops() {
    let mut doc = Document::new("doc0");
    doc.change(vec![insert(0, "abc")]).unwrap();

    // The second op in this batch is out of bounds; the first op's insert
    // must not survive even though it would have succeeded on its own.
    let err = doc.change(vec![insert(0, "XYZ"), insert(9999, "bad")]).unwrap_err();
    assert!(matches!(err, Error::OutOfBounds { .. }));
    assert_eq!(doc.text(), "abc");
}

#[test]
fn unknown_mark_type_is_rejected() {
    let mut doc = Document::new("doc0");
    doc.change(vec![insert(0, "hi")]).unwrap();
    let err = doc.change(vec![add_mark(0, 1, "underline", None)]).unwrap_err();
    assert!(matches!(err, Error::UnknownMark(_)));
}

#[test]
fn link_mark_without_url_is_malformed() {
    let mut doc = Document::new("doc0");
    doc.change(vec![insert(0, "hi")]).unwrap();
    let err = doc.change(vec![add_mark(0, 1, "link", None)]).unwrap_err();
    assert!(matches!(err, Error::MalformedOp { .. }));
}

#[test]
fn formatting_marks_cover_the_right_runs() {
    let mut doc = Document::new("doc0");
    doc.change(vec![insert(0, "hello world")]).unwrap();
    doc.change(vec![add_mark(0, 4, "strong", None)]).unwrap();

    let runs = doc.get_text_with_formatting();
    assert_eq!(runs[0].0, "hello");
    assert!(runs[0].1.contains(&MarkValue::Strong));
    assert_eq!(runs[1].0, " world");
    assert!(runs[1].1.is_empty());
}

#[test]
fn add_link_replaces_prior_link_on_the_same_range() {
    let mut doc = Document::new("doc0");
    doc.change(vec![insert(0, "click here")]).unwrap();
    let a = Attrs { url: Some("https://a.example".to_string()), id: None };
    let b = Attrs { url: Some("https://b.example".to_string()), id: None };
    doc.change(vec![add_mark(0, 9, "link", Some(a))]).unwrap();
    doc.change(vec![add_mark(0, 9, "link", Some(b))]).unwrap();

    let runs = doc.get_text_with_formatting();
    let links: Vec<_> = runs[0].1.iter().filter(|m| matches!(m, MarkValue::Link(_))).collect();
    assert_eq!(links, vec![&MarkValue::Link("https://b.example".to_string())]);
}

#[test]
fn removing_a_comment_only_drops_the_matching_id() {
    let mut doc = Document::new("doc0");
    doc.change(vec![insert(0, "hello")]).unwrap();
    let c1 = Attrs { url: None, id: Some("c1".to_string()) };
    let c2 = Attrs { url: None, id: Some("c2".to_string()) };
    doc.change(vec![add_mark(0, 4, "comment", Some(c1.clone()))]).unwrap();
    doc.change(vec![add_mark(0, 4, "comment", Some(c2))]).unwrap();
    doc.change(vec![remove_mark(0, 4, "comment", Some(c1))]).unwrap();

    let runs = doc.get_text_with_formatting();
    assert!(!runs[0].1.contains(&MarkValue::Comment("c1".to_string())));
    assert!(runs[0].1.contains(&MarkValue::Comment("c2".to_string())));
}

#[test]
fn deletions_shrink_the_formatted_document() {
    let mut doc = Document::new("doc0");
    doc.change(vec![insert(0, "hello world")]).unwrap();
    doc.change(vec![add_mark(6, 10, "em", None)]).unwrap();
    doc.change(vec![delete(0, 6)]).unwrap();

    assert_eq!(doc.text(), "world");
    let runs = doc.get_text_with_formatting();
    assert_eq!(runs.len(), 1);
    assert!(runs[0].1.contains(&MarkValue::Em));
}
