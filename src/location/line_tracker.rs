// src/location/line_tracker.rs
use crate::location::{source_location::SourceLocation, source_span::SourceSpan};
use std::ops::Range;
use std::sync::Arc;

/// Converts byte offsets into line/column positions.
///
/// Line start offsets are precomputed once, so each lookup is a binary
/// search. Lines and columns are 1-indexed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineTracker {
    source: Arc<str>,
    /// Starting byte offset of each line; the first element is always 0.
    line_starts: Vec<usize>,
    file_path: Arc<str>,
}

impl LineTracker {
    pub fn new(file_path: &str, source: String) -> Self {
        let line_starts = std::iter::once(0)
            .chain(source.match_indices('\n').map(|(pos, _)| pos + 1))
            .collect();
        Self { line_starts, file_path: Arc::from(file_path), source: source.into() }
    }

    /// Maps a byte offset to its line/column position.
    #[must_use]
    pub fn location_for(&self, offset: usize) -> SourceLocation {
        let line_idx = match self.line_starts.binary_search(&offset) {
            Ok(idx) => idx,
            Err(idx) => idx - 1,
        };
        let line_start = self.line_starts[line_idx];
        let column = self.source[line_start..offset.min(self.source.len())].chars().count() + 1;
        SourceLocation::new(line_idx + 1, column, offset)
    }

    /// Maps a byte range to a [`SourceSpan`].
    #[must_use]
    pub fn span_for(&self, range: Range<usize>) -> SourceSpan {
        SourceSpan::new(self.file_path.clone(), self.location_for(range.start), self.location_for(range.end))
    }

    /// Returns the text of a 1-indexed line, without its newline.
    #[must_use]
    pub fn get_line(&self, line: usize) -> Option<&str> {
        let start = *self.line_starts.get(line.checked_sub(1)?)?;
        let end = self.line_starts.get(line).map_or(self.source.len(), |&next| next);
        Some(self.source[start..end].trim_end_matches(['\n', '\r']))
    }

    #[must_use]
    pub fn file_path(&self) -> &str {
        &self.file_path
    }
}
