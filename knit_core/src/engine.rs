use std::path::Path;

use crate::Block;
use crate::Dispatch;
use crate::KnitResult;
use crate::ParseDiagnostic;
use crate::locator::locate;

/// A block whose generator could not produce content. The block body was
/// replaced with an error marker.
#[derive(Debug, Clone)]
pub struct BlockError {
	/// Generator name, when the header could be parsed.
	pub name: Option<String>,
	/// The message embedded in the error marker.
	pub message: String,
	/// 1-indexed line number of the block's opening marker.
	pub line: usize,
	/// 1-indexed column number of the block's opening marker.
	pub column: usize,
}

/// The outcome of rendering one document.
#[derive(Debug, Clone)]
pub struct RenderReport {
	/// The rewritten document text.
	pub content: String,
	/// Number of blocks whose generator succeeded.
	pub rendered: usize,
	/// Blocks that now hold an error marker.
	pub errors: Vec<BlockError>,
	/// Unpaired markers that were left untouched.
	pub diagnostics: Vec<ParseDiagnostic>,
}

impl RenderReport {
	/// Total number of blocks found in the document.
	pub fn block_count(&self) -> usize {
		self.rendered + self.errors.len()
	}

	pub fn has_errors(&self) -> bool {
		!self.errors.is_empty()
	}
}

/// Render every block in `content` and return the new document text.
///
/// See [`render_document`] for the rules.
pub fn render<D: Dispatch + ?Sized>(content: &str, path: &Path, dispatcher: &D) -> String {
	render_document(content, path, dispatcher).content
}

/// Render every block in `content`.
///
/// For each block the header is parsed and the dispatcher is called once
/// with the generator name, the current body, the options and `path`. The
/// body becomes the trimmed output separated from both markers by exactly one
/// blank line. When any step fails the body becomes a single
/// `<!-- Error: ... -->` marker instead; other blocks and the surrounding
/// text are unaffected.
///
/// Text outside of blocks is copied through byte for byte, so a document
/// without blocks is returned unchanged.
pub fn render_document<D: Dispatch + ?Sized>(
	content: &str,
	path: &Path,
	dispatcher: &D,
) -> RenderReport {
	let located = locate(content);
	let mut rendered = 0;
	let mut errors = Vec::new();

	let output = rewrite(content, &located.blocks, |block| {
		match render_block(block, path, dispatcher) {
			Ok(generated) => {
				rendered += 1;
				generated
			}
			Err(error) => {
				let name = block.header().ok().map(|header| header.name);
				let message = error.to_string();
				tracing::warn!(
					path = %path.display(),
					line = block.opening.start.line,
					generator = name.as_deref().unwrap_or_default(),
					"{message}"
				);
				let marker = error_marker(&message);
				errors.push(BlockError {
					name,
					message,
					line: block.opening.start.line,
					column: block.opening.start.column,
				});
				marker
			}
		}
	});

	RenderReport {
		content: output,
		rendered,
		errors,
		diagnostics: located.diagnostics,
	}
}

/// Empty every block body without invoking any generator. The markers are
/// kept and separated by a single blank line. Clearing a cleared document
/// changes nothing.
pub fn clear(content: &str) -> String {
	let located = locate(content);
	rewrite(content, &located.blocks, |_| String::new())
}

/// Build the `<!-- Error: ... -->` marker for `message`. The message is
/// folded onto one line and comment delimiters inside it are escaped so the
/// marker cannot end early or be mistaken for a block marker.
pub fn error_marker(message: &str) -> String {
	let single_line = message
		.lines()
		.map(str::trim)
		.filter(|line| !line.is_empty())
		.collect::<Vec<_>>()
		.join(" ");
	let escaped = single_line
		.replace("<!--", "&lt;!--")
		.replace("-->", "--&gt;");

	format!("<!-- Error: {escaped} -->")
}

fn render_block<D: Dispatch + ?Sized>(
	block: &Block,
	path: &Path,
	dispatcher: &D,
) -> KnitResult<String> {
	let header = block.header()?;
	dispatcher.dispatch(&header.name, &block.body, &header.options, path)
}

/// Copy `content` with every block body replaced by `body_for(block)`.
/// Blocks must be in source order and non-overlapping.
fn rewrite(content: &str, blocks: &[Block], mut body_for: impl FnMut(&Block) -> String) -> String {
	let mut output = String::with_capacity(content.len());
	let mut cursor = 0;

	for block in blocks {
		output.push_str(&content[cursor..block.opening.start.offset]);
		output.push_str(&block.opening_marker);
		output.push_str("\n\n");

		let body = body_for(block);
		let body = body.trim();
		if !body.is_empty() {
			output.push_str(body);
			output.push_str("\n\n");
		}

		output.push_str(&block.closing_marker);
		cursor = block.closing.end.offset;
	}

	output.push_str(&content[cursor..]);
	output
}
