//! Tests for the cursor tree and the nested-pagination generator

use super::*;
use crate::error::Error;
use crate::path::AccessPath;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::collections::HashMap;

fn page_info_path(stem: &str) -> AccessPath {
    AccessPath::builder().add(stem).add("pageInfo").build()
}

fn forward_page(has_next: bool, cursor: &str) -> Value {
    json!({ "hasNextPage": has_next, "endCursor": cursor })
}

fn single_level(has_next: bool, cursor: &str) -> Value {
    json!({ "items": { "pageInfo": forward_page(has_next, cursor) } })
}

fn two_level(parent: (bool, &str), child: (bool, &str)) -> Value {
    json!({
        "prs": { "pageInfo": forward_page(parent.0, parent.1) },
        "reviews": { "pageInfo": forward_page(child.0, child.1) },
    })
}

fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect()
}

// ============================================================================
// Tree construction
// ============================================================================

#[test]
fn test_single_node_tree_uses_defaults() {
    let tree = CursorTree::single(Connection::new(page_info_path("items")));
    assert_eq!(tree.len(), 1);

    let mut generator = CursorGenerator::new(tree);
    let next = generator.next_cursors(&single_level(true, "c1")).unwrap();
    assert_eq!(next, NextCursors::Continue(vars(&[("cursor", "c1")])));
}

#[test]
fn test_build_rejects_duplicate_variables() {
    let mut builder = CursorTree::builder();
    let root = builder.root(Connection::new(page_info_path("prs")).variable("cursor"));
    builder.child(root, Connection::new(page_info_path("reviews")).variable("cursor"));

    let err = builder.build().unwrap_err();
    assert!(matches!(err, Error::DuplicateVariable { ref variable } if variable == "cursor"));
}

#[test]
fn test_build_rejects_missing_root() {
    let err = CursorTree::builder().build().unwrap_err();
    assert!(matches!(err, Error::CursorTree { .. }));
}

#[test]
fn test_build_rejects_second_root() {
    let mut builder = CursorTree::builder();
    builder.root(Connection::new(page_info_path("a")).variable("cursorA"));
    builder.root(Connection::new(page_info_path("b")).variable("cursorB"));

    let err = builder.build().unwrap_err();
    assert!(matches!(err, Error::CursorTree { .. }));
}

// ============================================================================
// Single-level pagination
// ============================================================================

#[test]
fn test_single_level_n_pages_then_complete() {
    // Three pages: has-next on the first two, exhausted on the third.
    let tree = CursorTree::single(Connection::new(page_info_path("items")));
    let mut generator = CursorGenerator::new(tree);

    let next = generator.next_cursors(&single_level(true, "c1")).unwrap();
    assert_eq!(next, NextCursors::Continue(vars(&[("cursor", "c1")])));

    let next = generator.next_cursors(&single_level(true, "c2")).unwrap();
    assert_eq!(next, NextCursors::Continue(vars(&[("cursor", "c2")])));

    let next = generator.next_cursors(&single_level(false, "c3")).unwrap();
    assert_eq!(next, NextCursors::Complete);
}

#[test]
fn test_complete_even_when_a_cursor_is_remembered() {
    // A remembered position is replayed only while some level can still
    // advance; once nothing reports a further page the run is complete.
    let tree = CursorTree::single(Connection::new(page_info_path("items")));
    let mut generator = CursorGenerator::new(tree);

    generator.next_cursors(&single_level(true, "c1")).unwrap();
    let next = generator.next_cursors(&single_level(false, "c2")).unwrap();
    assert_eq!(next, NextCursors::Complete);
}

#[test]
fn test_backward_paging_fields() {
    let tree = CursorTree::single(Connection::new(page_info_path("items")).backward());
    let mut generator = CursorGenerator::new(tree);

    let snapshot = json!({
        "items": { "pageInfo": { "hasPreviousPage": true, "startCursor": "top" } }
    });
    let next = generator.next_cursors(&snapshot).unwrap();
    assert_eq!(next, NextCursors::Continue(vars(&[("cursor", "top")])));
}

// ============================================================================
// Two-level odometer
// ============================================================================

#[test]
fn test_two_level_child_advances_before_parent() {
    let mut builder = CursorTree::builder();
    let root = builder.root(Connection::new(page_info_path("prs")).variable("cursorP"));
    let child = builder.child(root, Connection::new(page_info_path("reviews")).variable("cursorC"));
    let mut generator = CursorGenerator::new(builder.build().unwrap());

    // Round 1: both levels report further pages; only the child advances.
    let next = generator
        .next_cursors(&two_level((true, "p1"), (true, "c11")))
        .unwrap();
    assert_eq!(next, NextCursors::Continue(vars(&[("cursorC", "c11")])));

    // Round 2: child exhausted under this parent page; parent advances and
    // the child's remembered position is cleared. The child was visited
    // first, so its old position is still replayed in this round's mapping.
    let next = generator
        .next_cursors(&two_level((true, "p1"), (false, "c12")))
        .unwrap();
    assert_eq!(
        next,
        NextCursors::Continue(vars(&[("cursorC", "c11"), ("cursorP", "p1")]))
    );
    assert!(generator.tree().node(child).cursor_value().is_empty());
    assert_eq!(generator.tree().node(root).cursor_value(), "p1");

    // Round 3: fresh child pages under the new parent context; the child
    // advances again while the parent replays its position.
    let next = generator
        .next_cursors(&two_level((false, "p2"), (true, "c21")))
        .unwrap();
    assert_eq!(
        next,
        NextCursors::Continue(vars(&[("cursorC", "c21"), ("cursorP", "p1")]))
    );

    // Round 4: nothing reports a further page anywhere.
    let next = generator
        .next_cursors(&two_level((false, "p2"), (false, "c22")))
        .unwrap();
    assert_eq!(next, NextCursors::Complete);
}

#[test]
fn test_sibling_connections_advance_left_to_right() {
    let mut builder = CursorTree::builder();
    let root = builder.root(Connection::new(page_info_path("prs")).variable("cursorP"));
    builder.child(root, Connection::new(page_info_path("reviews")).variable("cursorR"));
    builder.child(root, Connection::new(page_info_path("comments")).variable("cursorK"));
    let mut generator = CursorGenerator::new(builder.build().unwrap());

    let snapshot = json!({
        "prs": { "pageInfo": forward_page(true, "p1") },
        "reviews": { "pageInfo": forward_page(true, "r1") },
        "comments": { "pageInfo": forward_page(true, "k1") },
    });
    let next = generator.next_cursors(&snapshot).unwrap();
    assert_eq!(next, NextCursors::Continue(vars(&[("cursorR", "r1")])));
}

#[test]
fn test_unresolvable_page_info_treated_as_exhausted() {
    // The child's page-info lives inside the first element of a list that
    // is empty on this snapshot; the child is skipped transparently.
    let mut builder = CursorTree::builder();
    let root = builder.root(Connection::new(page_info_path("prs")).variable("cursorP"));
    builder.child(
        root,
        Connection::new(
            AccessPath::builder()
                .add("prs")
                .add("edges")
                .add(0)
                .add("node")
                .add("reviews")
                .add("pageInfo")
                .build(),
        )
        .variable("cursorC"),
    );
    let mut generator = CursorGenerator::new(builder.build().unwrap());

    let snapshot = json!({
        "prs": { "edges": [], "pageInfo": forward_page(true, "p1") }
    });
    let next = generator.next_cursors(&snapshot).unwrap();
    assert_eq!(next, NextCursors::Continue(vars(&[("cursorP", "p1")])));
}

// ============================================================================
// Three-level reset cascade
// ============================================================================

#[test]
fn test_root_advance_resets_every_descendant() {
    let mut builder = CursorTree::builder();
    let root = builder.root(Connection::new(page_info_path("prs")).variable("cursorP"));
    let child = builder.child(root, Connection::new(page_info_path("threads")).variable("cursorT"));
    let grandchild =
        builder.child(child, Connection::new(page_info_path("comments")).variable("cursorK"));
    let mut generator = CursorGenerator::new(builder.build().unwrap());

    let snapshot = |p: (bool, &str), t: (bool, &str), k: (bool, &str)| {
        json!({
            "prs": { "pageInfo": forward_page(p.0, p.1) },
            "threads": { "pageInfo": forward_page(t.0, t.1) },
            "comments": { "pageInfo": forward_page(k.0, k.1) },
        })
    };

    // Round 1: the deepest level advances.
    generator
        .next_cursors(&snapshot((true, "p1"), (true, "t1"), (true, "k1")))
        .unwrap();
    assert_eq!(generator.tree().node(grandchild).cursor_value(), "k1");

    // Round 2: the middle level advances, which already resets the
    // grandchild below it.
    generator
        .next_cursors(&snapshot((true, "p1"), (true, "t1"), (false, "k2")))
        .unwrap();
    assert_eq!(generator.tree().node(child).cursor_value(), "t1");
    assert!(generator.tree().node(grandchild).cursor_value().is_empty());

    // Round 3: the root advances; every descendant position is
    // invalidated, including the middle level's.
    let next = generator
        .next_cursors(&snapshot((true, "p1"), (false, "t2"), (false, "k2")))
        .unwrap();
    assert!(next.is_continue());
    assert_eq!(next.variables().unwrap().get("cursorP"), Some(&"p1".to_string()));
    assert!(generator.tree().node(child).cursor_value().is_empty());
    assert!(generator.tree().node(grandchild).cursor_value().is_empty());
}

// ============================================================================
// Extraction failures
// ============================================================================

#[test]
fn test_missing_cursor_token_is_fatal() {
    let tree = CursorTree::single(Connection::new(page_info_path("items")));
    let mut generator = CursorGenerator::new(tree);

    let snapshot = json!({ "items": { "pageInfo": { "hasNextPage": true } } });
    let err = generator.next_cursors(&snapshot).unwrap_err();
    assert!(matches!(err, Error::PathNotFound { ref segment, .. } if segment == "endCursor"));
}

#[test]
fn test_non_string_cursor_token_is_fatal() {
    let tree = CursorTree::single(Connection::new(page_info_path("items")));
    let mut generator = CursorGenerator::new(tree);

    let snapshot = json!({
        "items": { "pageInfo": { "hasNextPage": true, "endCursor": 42 } }
    });
    let err = generator.next_cursors(&snapshot).unwrap_err();
    assert!(matches!(err, Error::Extraction { .. }));
}

#[test]
fn test_non_boolean_flag_treated_as_exhausted() {
    let tree = CursorTree::single(Connection::new(page_info_path("items")));
    let mut generator = CursorGenerator::new(tree);

    let snapshot = json!({
        "items": { "pageInfo": { "hasNextPage": "yes", "endCursor": "c1" } }
    });
    let next = generator.next_cursors(&snapshot).unwrap();
    assert_eq!(next, NextCursors::Complete);
}

// ============================================================================
// Reset
// ============================================================================

#[test]
fn test_tree_reset_clears_every_position() {
    let mut builder = CursorTree::builder();
    let root = builder.root(Connection::new(page_info_path("prs")).variable("cursorP"));
    let child = builder.child(root, Connection::new(page_info_path("reviews")).variable("cursorC"));
    let mut generator = CursorGenerator::new(builder.build().unwrap());

    generator
        .next_cursors(&two_level((true, "p1"), (true, "c11")))
        .unwrap();
    generator
        .next_cursors(&two_level((true, "p1"), (false, "c12")))
        .unwrap();
    assert_eq!(generator.tree().node(root).cursor_value(), "p1");

    let mut tree = generator.tree().clone();
    tree.reset();
    assert!(tree.node(root).cursor_value().is_empty());
    assert!(tree.node(child).cursor_value().is_empty());
}
