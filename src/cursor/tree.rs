//! Cursor tree arena
//!
//! Nodes live in a flat arena indexed by [`NodeId`]; parent and children
//! links are explicit, and the tree shape is validated once at build time.

use super::{DEFAULT_VARIABLE, END_CURSOR, HAS_NEXT_PAGE, HAS_PREVIOUS_PAGE, START_CURSOR};
use crate::error::{Error, Result};
use crate::path::AccessPath;
use serde_json::Value;
use std::collections::HashSet;
use tracing::debug;

/// Handle to a node inside a [`CursorTree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// Configuration for one paginated connection.
///
/// Defaults to forward paging (`hasNextPage`/`endCursor`) under the variable
/// name `cursor`; exports that walk a connection newest-first flip to
/// backward paging with [`Connection::backward`].
#[derive(Debug, Clone)]
pub struct Connection {
    page_info: AccessPath,
    variable: String,
    has_next_field: String,
    cursor_field: String,
}

impl Connection {
    /// Describe a connection by the path to its page-info object
    pub fn new(page_info: AccessPath) -> Self {
        Self {
            page_info,
            variable: DEFAULT_VARIABLE.to_string(),
            has_next_field: HAS_NEXT_PAGE.to_string(),
            cursor_field: END_CURSOR.to_string(),
        }
    }

    /// Set the request-variable name this connection's cursor is sent under.
    /// Must be unique across the whole tree.
    #[must_use]
    pub fn variable(mut self, name: impl Into<String>) -> Self {
        self.variable = name.into();
        self
    }

    /// Override the "has-more" flag field name
    #[must_use]
    pub fn has_next_field(mut self, name: impl Into<String>) -> Self {
        self.has_next_field = name.into();
        self
    }

    /// Override the cursor-token field name
    #[must_use]
    pub fn cursor_field(mut self, name: impl Into<String>) -> Self {
        self.cursor_field = name.into();
        self
    }

    /// Page backward: `hasPreviousPage`/`startCursor`
    #[must_use]
    pub fn backward(mut self) -> Self {
        self.has_next_field = HAS_PREVIOUS_PAGE.to_string();
        self.cursor_field = START_CURSOR.to_string();
        self
    }
}

/// One paginated level's state inside the tree
#[derive(Debug, Clone)]
pub(crate) struct CursorNode {
    page_info: AccessPath,
    variable: String,
    has_next_field: String,
    cursor_field: String,
    /// Remembered cursor; empty = not yet paged past the first page under
    /// the current position of all ancestors
    cursor_value: String,
    children: Vec<NodeId>,
}

impl CursorNode {
    fn new(connection: Connection) -> Self {
        Self {
            page_info: connection.page_info,
            variable: connection.variable,
            has_next_field: connection.has_next_field,
            cursor_field: connection.cursor_field,
            cursor_value: String::new(),
            children: Vec::new(),
        }
    }

    /// Whether this connection reports a further page on the snapshot.
    ///
    /// An unresolvable page-info location (an empty list at that position,
    /// say) means "no further page", not an error.
    pub(crate) fn has_next(&self, snapshot: &Value) -> bool {
        let Ok(info) = self.page_info.run(snapshot) else {
            debug!(path = %self.page_info, "page-info not present, treating as exhausted");
            return false;
        };
        info.get(&self.has_next_field)
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    /// Extract the cursor token from the snapshot and remember it.
    ///
    /// Only called for a connection that reported a further page; a missing
    /// or non-string token is a fatal extraction error.
    pub(crate) fn next_cursor(&mut self, snapshot: &Value) -> Result<String> {
        let info = self.page_info.run(snapshot)?;
        let token = info
            .get(&self.cursor_field)
            .ok_or_else(|| Error::path_not_found(self.cursor_field.clone(), info))?;
        let token = token.as_str().ok_or_else(|| {
            Error::extraction(
                format!("{}/{}", self.page_info, self.cursor_field),
                "cursor token is not a string",
            )
        })?;
        self.cursor_value = token.to_string();
        Ok(self.cursor_value.clone())
    }

    pub(crate) fn reset_cursor_value(&mut self) {
        self.cursor_value.clear();
    }

    pub(crate) fn variable(&self) -> &str {
        &self.variable
    }

    pub(crate) fn cursor_value(&self) -> &str {
        &self.cursor_value
    }
}

/// Immutable-shape tree of paginated connections.
///
/// Only the per-node remembered cursor values mutate after construction.
#[derive(Debug, Clone)]
pub struct CursorTree {
    nodes: Vec<CursorNode>,
    root: NodeId,
}

impl CursorTree {
    /// Start building a tree
    pub fn builder() -> CursorTreeBuilder {
        CursorTreeBuilder::new()
    }

    /// Build a single-level tree, the degenerate case of ordinary
    /// single-cursor pagination.
    pub fn single(connection: Connection) -> Self {
        let mut builder = Self::builder();
        builder.root(connection);
        builder
            .build()
            .unwrap_or_else(|_| unreachable!("single-node tree is always valid"))
    }

    /// Number of paginated levels
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// A cursor tree always has at least its root
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Clear every remembered cursor, returning the tree to its initial
    /// first-page position.
    pub fn reset(&mut self) {
        for node in &mut self.nodes {
            node.reset_cursor_value();
        }
    }

    pub(crate) fn node(&self, id: NodeId) -> &CursorNode {
        &self.nodes[id.0]
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut CursorNode {
        &mut self.nodes[id.0]
    }

    /// Post-order traversal: all descendants before their node, siblings
    /// left-to-right. The deepest, most-recently-declared connection comes
    /// first.
    pub(crate) fn post_order(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![(self.root, false)];
        while let Some((id, expanded)) = stack.pop() {
            if expanded {
                order.push(id);
                continue;
            }
            stack.push((id, true));
            for &child in self.nodes[id.0].children.iter().rev() {
                stack.push((child, false));
            }
        }
        order
    }

    /// Every node below `id`, in no particular order
    pub(crate) fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut found = Vec::new();
        let mut stack = self.nodes[id.0].children.clone();
        while let Some(child) = stack.pop() {
            found.push(child);
            stack.extend(self.nodes[child.0].children.iter().copied());
        }
        found
    }
}

/// Builder producing a validated [`CursorTree`].
///
/// Nodes are appended root-first; child links are wired explicitly, so the
/// shape is acyclic by construction. `build` checks that exactly one root
/// was declared and that every variable name is unique.
#[derive(Debug, Default)]
pub struct CursorTreeBuilder {
    nodes: Vec<CursorNode>,
    root: Option<NodeId>,
    roots: usize,
}

impl CursorTreeBuilder {
    /// Create an empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare the root connection
    pub fn root(&mut self, connection: Connection) -> NodeId {
        self.roots += 1;
        let id = self.push(connection);
        self.root.get_or_insert(id);
        id
    }

    /// Declare a connection nested inside `parent`
    pub fn child(&mut self, parent: NodeId, connection: Connection) -> NodeId {
        let id = self.push(connection);
        self.nodes[parent.0].children.push(id);
        id
    }

    fn push(&mut self, connection: Connection) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(CursorNode::new(connection));
        id
    }

    /// Validate and freeze the tree
    pub fn build(self) -> Result<CursorTree> {
        let root = self.root.ok_or_else(|| Error::cursor_tree("tree has no root"))?;
        if self.roots != 1 {
            return Err(Error::cursor_tree(format!(
                "tree must have exactly one root, found {}",
                self.roots
            )));
        }

        let mut seen = HashSet::new();
        for node in &self.nodes {
            if !seen.insert(node.variable.clone()) {
                return Err(Error::DuplicateVariable {
                    variable: node.variable.clone(),
                });
            }
        }

        Ok(CursorTree {
            nodes: self.nodes,
            root,
        })
    }
}
