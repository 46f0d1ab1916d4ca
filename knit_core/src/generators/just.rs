use std::fs;
use std::path::Path;
use std::path::PathBuf;

use super::document_dir;
use crate::Generator;
use crate::GeneratorError;
use crate::Options;

/// File names recognized as a justfile, in lookup order.
pub const JUSTFILE_NAMES: [&str; 3] = ["justfile", "Justfile", ".justfile"];

/// Documents a `just` recipe: its description followed by a `bash` code block
/// showing how to run it.
///
/// ```markdown
/// <!-- docs JUST recipe="test" -->
/// <!-- /docs -->
/// ```
///
/// The description comes from a `[doc('...')]` attribute on the recipe, or
/// failing that from the `#` comment directly above it. With `body=true` the
/// code block holds the recipe source instead of the `just` invocation.
#[derive(Debug, Clone, Copy, Default)]
pub struct JustGenerator;

impl JustGenerator {
	pub const NAME: &'static str = "JUST";
}

impl Generator for JustGenerator {
	fn generate(&self, _body: &str, options: &Options, path: &Path) -> Result<String, GeneratorError> {
		let recipe_name = options.required("recipe")?;
		let include_body = options.get_bool("body", false)?;
		let dir = document_dir(path);

		let Some(justfile) = find_justfile(dir) else {
			return Err(GeneratorError::NotFound {
				what: "justfile".to_string(),
				path: dir.join(JUSTFILE_NAMES[0]),
			});
		};

		let content = fs::read_to_string(&justfile).map_err(|source| {
			GeneratorError::Io {
				path: justfile.clone(),
				source,
			}
		})?;

		let recipe = find_recipe(&content, recipe_name).ok_or_else(|| {
			GeneratorError::message(format!(
				"Recipe '{recipe_name}' not found in {}",
				justfile.display()
			))
		})?;

		Ok(recipe.render(recipe_name, include_body))
	}
}

/// Search the document directory, its parent and then the working directory.
pub fn find_justfile(dir: &Path) -> Option<PathBuf> {
	let mut dirs = vec![dir.to_path_buf()];
	if let Some(parent) = dir.parent() {
		dirs.push(if parent.as_os_str().is_empty() {
			PathBuf::from("..")
		} else {
			parent.to_path_buf()
		});
	}
	if let Ok(cwd) = std::env::current_dir() {
		dirs.push(cwd);
	}

	dirs.iter()
		.flat_map(|dir| JUSTFILE_NAMES.iter().map(move |name| dir.join(name)))
		.find(|candidate| candidate.is_file())
}

/// A recipe extracted from a justfile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipe {
	pub description: Option<String>,
	/// The header line and its indented body.
	pub source: String,
}

impl Recipe {
	fn render(&self, name: &str, include_body: bool) -> String {
		let code = if include_body {
			self.source.clone()
		} else {
			format!("just {name}")
		};

		match &self.description {
			Some(description) => format!("{description}\n\n```bash\n{code}\n```"),
			None => format!("```bash\n{code}\n```"),
		}
	}
}

/// Find the recipe called `name` in justfile `content`.
pub fn find_recipe(content: &str, name: &str) -> Option<Recipe> {
	let lines: Vec<&str> = content.lines().collect();
	let index = lines.iter().position(|line| is_recipe_header(line, name))?;

	let mut end = index + 1;
	let mut last_body_line = index;
	while end < lines.len() {
		let line = lines[end];
		if line.trim().is_empty() {
			end += 1;
			continue;
		}
		if !line.starts_with([' ', '\t']) {
			break;
		}
		last_body_line = end;
		end += 1;
	}

	Some(Recipe {
		description: recipe_description(&lines[..index]),
		source: lines[index..=last_body_line].join("\n"),
	})
}

/// `name` or `@name`, optionally followed by parameters, then a `:` that is
/// not part of a `:=` assignment.
fn is_recipe_header(line: &str, name: &str) -> bool {
	if line.starts_with([' ', '\t', '#', '[']) {
		return false;
	}

	let Some(colon) = line.find(':') else {
		return false;
	};
	if line[colon..].starts_with(":=") {
		return false;
	}

	let head = line[..colon].trim_start_matches('@');
	head.split_whitespace().next() == Some(name)
}

/// Walk upwards over the attribute lines above a recipe. A `doc` attribute
/// wins over a comment.
fn recipe_description(above: &[&str]) -> Option<String> {
	let mut comment = None;

	for line in above.iter().rev() {
		let trimmed = line.trim();
		if trimmed.starts_with('[') {
			if let Some(doc) = doc_attribute(trimmed) {
				return Some(doc.to_string());
			}
			continue;
		}

		if let Some(text) = trimmed.strip_prefix('#') {
			if !text.starts_with('!') && !text.trim().is_empty() {
				comment = Some(text.trim().to_string());
			}
		}
		break;
	}

	comment
}

/// The quoted argument of a `doc(...)` entry inside an attribute line such
/// as `[doc('Run tests')]` or `[group('ci'), doc("Run tests")]`.
fn doc_attribute(line: &str) -> Option<&str> {
	let mut search_from = 0;

	while let Some(found) = line[search_from..].find("doc(") {
		let start = search_from + found;
		let standalone = line[..start]
			.chars()
			.next_back()
			.is_none_or(|c| c == '[' || c == ',' || c.is_whitespace());

		if standalone {
			let argument = line[start + "doc(".len()..].trim_start();
			for quote in ['\'', '"'] {
				if let Some(quoted) = argument.strip_prefix(quote) {
					if let Some(end) = quoted.find(quote) {
						return Some(&quoted[..end]);
					}
				}
			}
		}

		search_from = start + "doc(".len();
	}

	None
}
