//! Cursor persistence for crash-resumable runs
//!
//! The driver saves its last known cursor variable mapping when a run
//! fails, and a later run started with the resume flag picks pagination up
//! from that position instead of the first page.

mod store;

pub use store::CursorStore;

/// Fixed top-level key the cursor mapping is stored under
pub const CURSOR_KEY: &str = "cursor";

/// Default backing file name
pub const DEFAULT_STORE_FILE: &str = "backup.json";
