// src/location/source_span.rs
use crate::location::source_location::SourceLocation;
use std::fmt;
use std::sync::Arc;

/// A contiguous range of source code in a specific file.
///
/// The start position is inclusive, the end position exclusive. Spans are
/// attached to tokens, AST nodes and diagnostics; the middle-end drops them
/// once lowering begins.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SourceSpan {
    /// Path to the source file (shared reference).
    pub file_path: Arc<str>,
    pub start: SourceLocation,
    pub end: SourceLocation,
}

impl SourceSpan {
    #[must_use]
    pub const fn new(file_path: Arc<str>, start: SourceLocation, end: SourceLocation) -> Self {
        Self { file_path, start, end }
    }

    /// Expands this span in place so it also covers `other`.
    ///
    /// Spans from different files are left untouched.
    pub fn merge(&mut self, other: &SourceSpan) {
        if self.file_path == other.file_path {
            self.start = self.start.min(other.start);
            self.end = self.end.max(other.end);
        }
    }

    /// Returns a new span covering both `self` and `other`.
    #[must_use]
    pub fn merged(&self, other: &SourceSpan) -> SourceSpan {
        let mut span = self.clone();
        span.merge(other);
        span
    }
}

impl Default for SourceSpan {
    fn default() -> Self {
        Self { file_path: Arc::from(""), start: SourceLocation::default(), end: SourceLocation::default() }
    }
}

impl fmt::Display for SourceSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file_path, self.start.line, self.start.column)
    }
}
