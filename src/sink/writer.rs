//! JSONL file sink
//!
//! Writes one JSON document per line, flushing after every record so a
//! crashed run loses nothing that was already forwarded. Append mode
//! supports resumed exports: the writer remembers the identity of the last
//! record already on disk and declines the record that matches it, halting
//! a newest-first export at the previously covered position.

use super::RecordSink;
use crate::error::{Error, Result};
use serde_json::Value;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use tracing::{debug, info};

/// Record fields tried, in order, as the identity of a record
const IDENTITY_KEYS: &[&str] = &["id", "oid"];

/// Line-delimited JSON writer implementing [`RecordSink`]
pub struct JsonlWriter {
    out: BufWriter<File>,
    last_seen: Option<(String, Value)>,
}

impl JsonlWriter {
    /// Create a writer that truncates any existing file
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!(path = %path.display(), "writing records");
        let file = File::create(path)?;
        Ok(Self {
            out: BufWriter::new(file),
            last_seen: None,
        })
    }

    /// Open a writer in append mode, remembering the identity of the last
    /// record already present so a resumed export can stop when it
    /// re-encounters it.
    pub fn append(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!(path = %path.display(), "appending records");
        let last_seen = if path.exists() {
            Self::read_last_identity(path)?
        } else {
            None
        };
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            out: BufWriter::new(file),
            last_seen,
        })
    }

    /// The identity of the last record on disk, if one was registered
    pub fn last_seen(&self) -> Option<(&str, &Value)> {
        self.last_seen
            .as_ref()
            .map(|(key, value)| (key.as_str(), value))
    }

    fn read_last_identity(path: &Path) -> Result<Option<(String, Value)>> {
        let reader = BufReader::new(File::open(path)?);
        let Some(last_line) = reader.lines().map_while(std::io::Result::ok).last() else {
            return Ok(None);
        };
        let record: Value = serde_json::from_str(&last_line)
            .map_err(|e| Error::sink(format!("cannot parse last record in output file: {e}")))?;
        for key in IDENTITY_KEYS {
            if let Some(value) = record.get(key) {
                debug!(key, %value, "registered last record on disk");
                return Ok(Some(((*key).to_string(), value.clone())));
            }
        }
        Ok(None)
    }
}

impl RecordSink for JsonlWriter {
    fn accept(&mut self, record: &Value) -> Result<bool> {
        if let Some((key, value)) = &self.last_seen {
            if record.get(key) == Some(value) {
                info!("reached last previously exported record");
                return Ok(false);
            }
        }
        serde_json::to_writer(&mut self.out, record)?;
        self.out.write_all(b"\n")?;
        self.out.flush()?;
        Ok(true)
    }
}
