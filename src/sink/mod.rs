//! Record sinks
//!
//! A sink receives the records of each fetched page, one at a time, in
//! order. Returning `Ok(false)` from [`RecordSink::accept`] is a deliberate
//! stop signal, not an error: the driver stops forwarding the rest of the
//! current page (used to halt a resumed, newest-first export once a
//! previously seen record comes around again).

mod writer;

pub use writer::JsonlWriter;

use crate::error::Result;
use serde_json::Value;

/// Consumer of downloaded records
pub trait RecordSink: Send {
    /// Accept one record. `Ok(false)` stops forwarding for this run.
    fn accept(&mut self, record: &Value) -> Result<bool>;
}

/// Any `FnMut(&Value) -> Result<bool>` closure is a sink
impl<F> RecordSink for F
where
    F: FnMut(&Value) -> Result<bool> + Send,
{
    fn accept(&mut self, record: &Value) -> Result<bool> {
        self(record)
    }
}
