use serde::Deserialize;
use serde::Serialize;

/// A location in a document. `line` and `column` are 1-indexed, `offset` is
/// the 0-indexed byte offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Point {
	pub line: usize,
	pub column: usize,
	pub offset: usize,
}

impl Point {
	pub fn new(line: usize, column: usize, offset: usize) -> Self {
		Self {
			line,
			column,
			offset,
		}
	}
}

/// The span covered by a marker, from `start` (inclusive) to `end`
/// (exclusive).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Position {
	pub start: Point,
	pub end: Point,
}

impl Position {
	pub fn new(
		start_line: usize,
		start_column: usize,
		start_offset: usize,
		end_line: usize,
		end_column: usize,
		end_offset: usize,
	) -> Self {
		Self {
			start: Point::new(start_line, start_column, start_offset),
			end: Point::new(end_line, end_column, end_offset),
		}
	}

	/// The byte range of this span within the source document.
	pub fn range(&self) -> std::ops::Range<usize> {
		self.start.offset..self.end.offset
	}
}

/// Pre-computed table of line-start byte offsets so that converting many
/// offsets to points is a binary search instead of a rescan.
pub(crate) struct LineTable {
	/// `line_starts[0]` is always 0.
	line_starts: Vec<usize>,
}

impl LineTable {
	pub(crate) fn new(content: &str) -> Self {
		let mut line_starts = vec![0];
		for (i, byte) in content.bytes().enumerate() {
			if byte == b'\n' {
				line_starts.push(i + 1);
			}
		}
		Self { line_starts }
	}

	/// Columns count bytes, matching the offsets they are derived from.
	pub(crate) fn point(&self, offset: usize) -> Point {
		let line_idx = match self.line_starts.binary_search(&offset) {
			Ok(exact) => exact,
			Err(insert) => insert.saturating_sub(1),
		};

		Point {
			line: line_idx + 1,
			column: offset - self.line_starts[line_idx] + 1,
			offset,
		}
	}

	pub(crate) fn position(&self, range: std::ops::Range<usize>) -> Position {
		Position {
			start: self.point(range.start),
			end: self.point(range.end),
		}
	}
}
