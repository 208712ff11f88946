//! # gql-harvest
//!
//! A Rust-native toolkit for resumable exports of nested GraphQL
//! connections.
//!
//! A composite GraphQL query can nest several paginated connections, each
//! with its own page cursor. gql-harvest flattens such a response tree into
//! a stream of records: an odometer over the cursor tree advances the
//! innermost not-yet-exhausted connection each round, a driver loop fetches
//! and forwards pages to a sink, and the current position is persisted on
//! failure so an export can resume where it stopped.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use gql_harvest::{
//!     AccessPath, Collector, Connection, CursorGenerator, CursorTree,
//!     GraphqlClient, GraphqlClientConfig, JsonlWriter, Result,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let client = GraphqlClient::new(GraphqlClientConfig::new("token"))?;
//!
//!     let base = AccessPath::builder().add("repository").add("pullRequests");
//!     let tree = CursorTree::single(Connection::new(base.copy().add("pageInfo").build()));
//!
//!     let mut collector = Collector::builder()
//!         .client(Box::new(client))
//!         .query(QUERY)
//!         .cursor_generator(CursorGenerator::new(tree))
//!         .records_path(base.copy().add("edges").build())
//!         .sink(Box::new(JsonlWriter::create("prs.jsonl")?))
//!         .build()?;
//!
//!     collector.run().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                           Collector                            │
//! │   run() → send → extract records → sink → next cursors → ...   │
//! └────────────────────────────────────────────────────────────────┘
//!               │                 │                  │
//! ┌─────────────┴───┬─────────────┴─────┬────────────┴──────────────┐
//! │     Client      │      Cursor       │      Sink / State         │
//! ├─────────────────┼───────────────────┼───────────────────────────┤
//! │ GraphQL envelope│ AccessPath        │ JSONL writer              │
//! │ Bearer auth     │ CursorTree arena  │ append + stop-on-seen     │
//! │ Retry, throttle │ Odometer          │ Cursor store (resume)     │
//! └─────────────────┴───────────────────┴───────────────────────────┘
//! ```

#![warn(clippy::all)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Access paths into nested response values
pub mod path;

/// Cursor trees and the nested-pagination generator
pub mod cursor;

/// GraphQL query client
pub mod client;

/// Record sinks
pub mod sink;

/// Cursor persistence for crash-resumable runs
pub mod state;

/// Collection driver
pub mod collector;

/// Settings and on-disk assets
pub mod config;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use client::{GraphqlClient, GraphqlClientConfig, QueryClient};
pub use collector::{Collector, CollectorBuilder, RunState, RunStats};
pub use cursor::{Connection, CursorGenerator, CursorTree, NextCursors};
pub use error::{Error, Result};
pub use path::{AccessPath, PathBuilder, Segment};
pub use sink::{JsonlWriter, RecordSink};
pub use state::CursorStore;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
