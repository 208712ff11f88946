//! Cursor trees and the nested-pagination generator
//!
//! A composite GraphQL query can nest several paginated connections, each
//! with its own page-info object and cursor variable. This module models
//! those connections as a tree and computes, round by round, the variable
//! set for the next request.
//!
//! # Overview
//!
//! - [`Connection`] - configuration for one paginated level
//! - [`CursorTree`] / [`CursorTreeBuilder`] - arena of connections with
//!   explicit parent/child structure
//! - [`CursorGenerator`] - the odometer: advances the innermost
//!   not-yet-exhausted level each round
//! - [`NextCursors`] - one round's variable mapping, or completion

mod generator;
mod tree;

pub use generator::{CursorGenerator, NextCursors};
pub use tree::{Connection, CursorTree, CursorTreeBuilder, NodeId};

/// Default flag field for forward paging
pub const HAS_NEXT_PAGE: &str = "hasNextPage";
/// Flag field for backward paging
pub const HAS_PREVIOUS_PAGE: &str = "hasPreviousPage";
/// Default cursor-token field for forward paging
pub const END_CURSOR: &str = "endCursor";
/// Cursor-token field for backward paging
pub const START_CURSOR: &str = "startCursor";
/// Default request-variable name for a single-level tree
pub const DEFAULT_VARIABLE: &str = "cursor";

#[cfg(test)]
mod tests;
