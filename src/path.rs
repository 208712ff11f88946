//! Access paths into nested response values
//!
//! An [`AccessPath`] addresses one value inside a nested JSON response by a
//! fixed sequence of keys and indices. Paths are built once, up front, from
//! the known shape of a query's response; resolution failures indicate a
//! response-shape mismatch and are fatal.

use crate::error::{Error, Result};
use serde_json::Value;
use std::fmt;

/// One step of an [`AccessPath`]: an object key or an array index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Index into an object by key
    Key(String),
    /// Index into an array by position
    Index(usize),
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Key(key) => write!(f, "{key}"),
            Segment::Index(index) => write!(f, "{index}"),
        }
    }
}

impl From<&str> for Segment {
    fn from(key: &str) -> Self {
        Segment::Key(key.to_string())
    }
}

impl From<String> for Segment {
    fn from(key: String) -> Self {
        Segment::Key(key)
    }
}

impl From<usize> for Segment {
    fn from(index: usize) -> Self {
        Segment::Index(index)
    }
}

/// An immutable ordered sequence of segments addressing a nested value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessPath {
    segments: Vec<Segment>,
}

impl AccessPath {
    /// Start building a path
    pub fn builder() -> PathBuilder {
        PathBuilder::new()
    }

    /// Resolve this path against a response snapshot.
    ///
    /// Walks `data`, indexing successively by each segment, and returns a
    /// reference to the addressed value. Fails with [`Error::PathNotFound`]
    /// naming the failing segment and the partially-reached content.
    pub fn run<'a>(&self, data: &'a Value) -> Result<&'a Value> {
        let mut content = data;
        for segment in &self.segments {
            content = match segment {
                Segment::Key(key) => content.get(key.as_str()),
                Segment::Index(index) => content.get(*index),
            }
            .ok_or_else(|| Error::path_not_found(segment.to_string(), content))?;
        }
        Ok(content)
    }

    /// Extend this path by one segment, returning a new path.
    pub fn join(&self, segment: impl Into<Segment>) -> AccessPath {
        let mut segments = self.segments.clone();
        segments.push(segment.into());
        AccessPath { segments }
    }

    /// The segments of this path
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }
}

impl fmt::Display for AccessPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self.segments.iter().map(ToString::to_string).collect();
        write!(f, "{}", rendered.join("/"))
    }
}

/// Mutable builder for [`AccessPath`].
///
/// `copy` produces an independent branch sharing the prefix built so far, so
/// several paths into one response (records, page-info, nested page-info) can
/// be derived from a common stem without aliasing.
#[derive(Debug, Clone, Default)]
pub struct PathBuilder {
    segments: Vec<Segment>,
}

impl PathBuilder {
    /// Create an empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a segment. Mutates this builder in place.
    pub fn add(mut self, segment: impl Into<Segment>) -> Self {
        self.segments.push(segment.into());
        self
    }

    /// Fork an independent builder holding a copy of the current prefix.
    pub fn copy(&self) -> Self {
        Self {
            segments: self.segments.clone(),
        }
    }

    /// Freeze into an immutable path
    pub fn build(self) -> AccessPath {
        AccessPath {
            segments: self.segments,
        }
    }
}
