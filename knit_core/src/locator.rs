use std::ops::Range;

use serde::Deserialize;
use serde::Serialize;

use crate::Header;
use crate::KnitResult;
use crate::Position;
use crate::header::HEADER_TOKEN;
use crate::header::parse_header;
use crate::position::LineTable;

const COMMENT_OPEN: &str = "<!--";
const COMMENT_CLOSE: &str = "-->";
const CLOSING_TOKEN: &str = "/docs";

/// A delimited region of a document that knit manages.
///
/// ```text
/// <!-- docs TREE depth=2 -->   opening marker
/// ...                          body
/// <!-- /docs -->               closing marker
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
	/// The full opening marker text, e.g. `<!-- docs TREE depth=2 -->`.
	pub opening_marker: String,
	/// Everything between the opening and closing markers.
	pub body: String,
	/// The full closing marker text, e.g. `<!-- /docs -->`.
	pub closing_marker: String,
	/// Where the opening marker sits in the document.
	pub opening: Position,
	/// Where the closing marker sits in the document.
	pub closing: Position,
}

impl Block {
	/// Parse the opening marker into a generator name and options.
	pub fn header(&self) -> KnitResult<Header> {
		parse_header(&self.opening_marker)
	}

	/// The byte range of the whole block, markers included.
	pub fn span(&self) -> Range<usize> {
		self.opening.start.offset..self.closing.end.offset
	}

	/// The byte range of the body.
	pub fn body_range(&self) -> Range<usize> {
		self.opening.end.offset..self.closing.start.offset
	}
}

/// A problem with the markers in a document that doesn't stop the other
/// blocks from being processed. The offending markers are left untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum ParseDiagnostic {
	/// An opening marker with no closing marker anywhere after it.
	UnclosedBlock {
		name: String,
		line: usize,
		column: usize,
	},
	/// An opening marker followed by another opening marker before any
	/// closing marker. Pairing restarts from the inner marker.
	NestedBlock {
		name: String,
		line: usize,
		column: usize,
	},
	/// A closing marker with no opening marker before it.
	UnopenedClosing { line: usize, column: usize },
}

impl ParseDiagnostic {
	/// 1-indexed line of the offending marker.
	pub fn line(&self) -> usize {
		match self {
			Self::UnclosedBlock { line, .. }
			| Self::NestedBlock { line, .. }
			| Self::UnopenedClosing { line, .. } => *line,
		}
	}

	/// 1-indexed column of the offending marker.
	pub fn column(&self) -> usize {
		match self {
			Self::UnclosedBlock { column, .. }
			| Self::NestedBlock { column, .. }
			| Self::UnopenedClosing { column, .. } => *column,
		}
	}

	/// Human-readable message for this diagnostic.
	pub fn message(&self) -> String {
		match self {
			Self::UnclosedBlock { name, .. } => {
				format!("block `{name}` has no closing `<!-- /docs -->` marker")
			}
			Self::NestedBlock { name, .. } => {
				format!("block `{name}` is not closed before the next opening marker")
			}
			Self::UnopenedClosing { .. } => {
				"closing `<!-- /docs -->` marker has no opening marker".to_string()
			}
		}
	}
}

/// All blocks located in a document together with any marker diagnostics.
#[derive(Debug, Clone, Default)]
pub struct LocateResult {
	/// Blocks in source order.
	pub blocks: Vec<Block>,
	pub diagnostics: Vec<ParseDiagnostic>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MarkerKind {
	Opening,
	Closing,
}

#[derive(Debug, Clone)]
struct Marker {
	kind: MarkerKind,
	range: Range<usize>,
}

/// Locate all blocks in `content`, discarding diagnostics.
pub fn locate_blocks(content: &str) -> Vec<Block> {
	locate(content).blocks
}

/// Locate all blocks in `content`.
///
/// This is a two-phase scan. First every opening and closing marker is
/// found; then markers are paired in source order, each opening marker with
/// the next closing marker. Unpaired markers are reported as diagnostics and
/// never produce a block.
pub fn locate(content: &str) -> LocateResult {
	let markers = find_markers(content);
	let line_table = LineTable::new(content);
	let mut result = LocateResult::default();
	let mut pending: Option<Marker> = None;

	for marker in markers {
		match marker.kind {
			MarkerKind::Opening => {
				if let Some(outer) = pending.replace(marker) {
					let point = line_table.point(outer.range.start);
					result.diagnostics.push(ParseDiagnostic::NestedBlock {
						name: marker_name(&content[outer.range]),
						line: point.line,
						column: point.column,
					});
				}
			}
			MarkerKind::Closing => {
				match pending.take() {
					Some(opening) => {
						result.blocks.push(Block {
							opening_marker: content[opening.range.clone()].to_string(),
							body: content[opening.range.end..marker.range.start].to_string(),
							closing_marker: content[marker.range.clone()].to_string(),
							opening: line_table.position(opening.range),
							closing: line_table.position(marker.range),
						});
					}
					None => {
						let point = line_table.point(marker.range.start);
						result.diagnostics.push(ParseDiagnostic::UnopenedClosing {
							line: point.line,
							column: point.column,
						});
					}
				}
			}
		}
	}

	if let Some(opening) = pending {
		let point = line_table.point(opening.range.start);
		result.diagnostics.push(ParseDiagnostic::UnclosedBlock {
			name: marker_name(&content[opening.range]),
			line: point.line,
			column: point.column,
		});
	}

	tracing::debug!(
		blocks = result.blocks.len(),
		diagnostics = result.diagnostics.len(),
		"located blocks"
	);

	result
}

/// Find every opening and closing marker. A recognized marker consumes its
/// span; any other comment start is skipped so that comments embedded in a
/// body are still searched for markers.
fn find_markers(content: &str) -> Vec<Marker> {
	let mut markers = Vec::new();
	let mut search_from = 0;

	while let Some(found) = content[search_from..].find(COMMENT_OPEN) {
		let start = search_from + found;

		if let Some(end) = match_opening(content, start) {
			markers.push(Marker {
				kind: MarkerKind::Opening,
				range: start..end,
			});
			search_from = end;
		} else if let Some(end) = match_closing(content, start) {
			markers.push(Marker {
				kind: MarkerKind::Closing,
				range: start..end,
			});
			search_from = end;
		} else {
			search_from = start + COMMENT_OPEN.len();
		}
	}

	markers
}

/// Match `<!--` ws* `docs` ws+ header `-->` at `start`, where the header
/// contains no `>`. Returns the end offset of the marker.
fn match_opening(content: &str, start: usize) -> Option<usize> {
	let rest = content[start + COMMENT_OPEN.len()..]
		.trim_start()
		.strip_prefix(HEADER_TOKEN)?;

	if !rest.starts_with(char::is_whitespace) {
		return None;
	}

	// The header cannot extend past the next comment start.
	let window = rest.find(COMMENT_OPEN).map_or(rest, |next| &rest[..next]);
	let header_end = window.find('>')?;
	if !rest[..header_end].ends_with("--") {
		return None;
	}

	let rest_offset = content.len() - rest.len();
	Some(rest_offset + header_end + 1)
}

/// Match `<!--` ws* `/docs` ws* `-->` at `start`. Returns the end offset of
/// the marker.
fn match_closing(content: &str, start: usize) -> Option<usize> {
	let rest = content[start + COMMENT_OPEN.len()..]
		.trim_start()
		.strip_prefix(CLOSING_TOKEN)?
		.trim_start()
		.strip_prefix(COMMENT_CLOSE)?;

	Some(content.len() - rest.len())
}

fn marker_name(marker: &str) -> String {
	parse_header(marker).map(|header| header.name).unwrap_or_default()
}
