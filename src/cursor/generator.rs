//! The nested-pagination odometer
//!
//! Generalizes single-cursor pagination to a tree of nested connections
//! fetched by one composite query: each round, the innermost connection that
//! still reports a further page advances, and every connection below it
//! restarts from its first page. The digit size of each level is discovered
//! lazily from server responses, like a mixed-radix counter whose carries
//! reset all inner digits.

use super::tree::CursorTree;
use crate::error::Result;
use serde_json::Value;
use std::collections::HashMap;
use tracing::debug;

/// One round's worth of pagination variables, or completion
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextCursors {
    /// Some level advanced; send these variables with the next request.
    /// A level absent from the mapping starts from its first page.
    Continue(HashMap<String, String>),
    /// No connection in the tree reports a further page
    Complete,
}

impl NextCursors {
    /// Check if pagination is exhausted
    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Complete)
    }

    /// Check if another round should be fetched
    pub fn is_continue(&self) -> bool {
        matches!(self, Self::Continue(_))
    }

    /// The variable mapping, if not complete
    pub fn variables(&self) -> Option<&HashMap<String, String>> {
        match self {
            Self::Continue(variables) => Some(variables),
            Self::Complete => None,
        }
    }
}

/// Computes the next round's cursor variables from a response snapshot
#[derive(Debug)]
pub struct CursorGenerator {
    tree: CursorTree,
}

impl CursorGenerator {
    /// Create a generator over a cursor tree
    pub fn new(tree: CursorTree) -> Self {
        Self { tree }
    }

    /// The underlying tree
    pub fn tree(&self) -> &CursorTree {
        &self.tree
    }

    /// Compute the variable set for the next request, or signal completion.
    ///
    /// Nodes are visited in post-order, so the deepest connection is checked
    /// for advancement first. Exactly one node advances per round; nodes
    /// above it replay their remembered position, nodes below it are reset
    /// to their first page.
    pub fn next_cursors(&mut self, snapshot: &Value) -> Result<NextCursors> {
        let mut cursors = HashMap::new();
        let mut looking_for_next_cursor = true;

        for id in self.tree.post_order() {
            if looking_for_next_cursor && self.tree.node(id).has_next(snapshot) {
                looking_for_next_cursor = false;
                let token = self.tree.node_mut(id).next_cursor(snapshot)?;
                let variable = self.tree.node(id).variable().to_string();
                debug!(%variable, "found next cursor");
                cursors.insert(variable, token);

                // the new parent context invalidates every nested position
                for descendant in self.tree.descendants(id) {
                    self.tree.node_mut(descendant).reset_cursor_value();
                }
            } else if !self.tree.node(id).cursor_value().is_empty() {
                let node = self.tree.node(id);
                debug!(variable = node.variable(), "replaying previous cursor");
                cursors.insert(node.variable().to_string(), node.cursor_value().to_string());
            } else {
                debug!(variable = self.tree.node(id).variable(), "no cursor");
            }
        }

        if looking_for_next_cursor {
            // no connection anywhere in the tree can be continued
            return Ok(NextCursors::Complete);
        }

        Ok(NextCursors::Continue(cursors))
    }
}
