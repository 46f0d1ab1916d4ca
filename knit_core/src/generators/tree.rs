use std::fs;
use std::path::Path;
use std::path::PathBuf;

use globset::GlobBuilder;
use globset::GlobMatcher;
use serde::Deserialize;

use super::document_dir;
use crate::Generator;
use crate::GeneratorError;
use crate::Options;

const BRANCH: &str = "├── ";
const LAST_BRANCH: &str = "└── ";
const PIPE: &str = "│   ";
const SPACE: &str = "    ";

/// Renders a directory listing as a fenced code block.
///
/// ```markdown
/// <!-- docs TREE path="src" depth=2 dirs_only=true -->
/// <!-- /docs -->
/// ```
///
/// | option      | default | meaning                                            |
/// |-------------|---------|----------------------------------------------------|
/// | `path`      | `.`     | directory to list, relative to the document        |
/// | `depth`     | `1`     | levels to descend; `1` lists direct children only  |
/// | `dirs_only` | `false` | omit files                                         |
/// | `hidden`    | `false` | include entries whose name starts with `.`         |
/// | `exclude`   |         | comma-separated globs, names or trailing paths     |
/// | `add_docs`  | `true`  | append `# description` from a child `README.md`    |
#[derive(Debug, Clone, Copy, Default)]
pub struct TreeGenerator;

impl TreeGenerator {
	pub const NAME: &'static str = "TREE";
}

impl Generator for TreeGenerator {
	fn generate(&self, _body: &str, options: &Options, path: &Path) -> Result<String, GeneratorError> {
		let settings = TreeSettings::from_options(options)?;
		let root = document_dir(path).join(&settings.path);

		if !root.is_dir() {
			return Err(GeneratorError::NotFound {
				what: "directory".to_string(),
				path: root,
			});
		}

		let mut lines = vec!["```".to_string(), settings.path.clone()];
		render_level(&root, "", "", 1, &settings, &mut lines);
		lines.push("```".to_string());

		Ok(lines.join("\n"))
	}
}

struct TreeSettings {
	path: String,
	depth: usize,
	dirs_only: bool,
	hidden: bool,
	add_docs: bool,
	exclude: Vec<ExcludeRule>,
}

impl TreeSettings {
	fn from_options(options: &Options) -> Result<Self, GeneratorError> {
		Ok(Self {
			path: options.get_str_or("path", ".").to_string(),
			depth: options.get_usize("depth", 1)?,
			dirs_only: options.get_bool("dirs_only", false)?,
			hidden: options.get_bool("hidden", false)?,
			add_docs: options.get_bool("add_docs", true)?,
			exclude: options
				.get_list("exclude")
				.into_iter()
				.map(ExcludeRule::new)
				.collect(),
		})
	}

	fn is_excluded(&self, relative: &str) -> bool {
		self.exclude.iter().any(|rule| rule.matches(relative))
	}
}

/// An exclude entry is matched against the entry's path relative to the
/// listed directory, anchored at the right: `subdir` and `dir1/subdir` both
/// exclude `dir1/subdir`, exactly or as a glob.
struct ExcludeRule {
	pattern: String,
	glob: Option<GlobMatcher>,
}

impl ExcludeRule {
	fn new(pattern: String) -> Self {
		let glob = GlobBuilder::new(&pattern)
			.literal_separator(true)
			.build()
			.map(|glob| glob.compile_matcher())
			.map_err(|error| tracing::debug!(%pattern, %error, "exclude is not a glob"))
			.ok();

		Self { pattern, glob }
	}

	fn matches(&self, relative: &str) -> bool {
		trailing_paths(relative).any(|candidate| {
			self.pattern == candidate || self.glob.as_ref().is_some_and(|glob| glob.is_match(candidate))
		})
	}
}

/// `a/b/c`, `b/c` and `c` for `a/b/c`.
fn trailing_paths(relative: &str) -> impl Iterator<Item = &str> {
	std::iter::once(relative).chain(
		relative
			.match_indices('/')
			.map(move |(index, _)| &relative[index + 1..]),
	)
}

struct Entry {
	name: String,
	relative: String,
	path: PathBuf,
	is_dir: bool,
}

fn render_level(
	dir: &Path,
	relative_dir: &str,
	prefix: &str,
	level: usize,
	settings: &TreeSettings,
	lines: &mut Vec<String>,
) {
	if level > settings.depth {
		return;
	}

	let entries = match read_entries(dir, relative_dir, settings) {
		Ok(entries) => entries,
		Err(error) => {
			tracing::debug!(dir = %dir.display(), %error, "skipping unreadable directory");
			return;
		}
	};

	let count = entries.len();
	for (index, entry) in entries.into_iter().enumerate() {
		let is_last = index + 1 == count;
		let connector = if is_last { LAST_BRANCH } else { BRANCH };
		let mut line = format!("{prefix}{connector}{}", entry.name);

		if entry.is_dir && settings.add_docs {
			if let Some(description) = readme_description(&entry.path) {
				line.push_str(" # ");
				line.push_str(&description);
			}
		}

		lines.push(line);

		if entry.is_dir {
			let child_prefix = format!("{prefix}{}", if is_last { SPACE } else { PIPE });
			render_level(
				&entry.path,
				&entry.relative,
				&child_prefix,
				level + 1,
				settings,
				lines,
			);
		}
	}
}

/// Visible entries of `dir`, directories first and then by name.
fn read_entries(dir: &Path, relative_dir: &str, settings: &TreeSettings) -> std::io::Result<Vec<Entry>> {
	let mut entries = Vec::new();

	for entry in fs::read_dir(dir)? {
		let entry = entry?;
		let name = entry.file_name().to_string_lossy().into_owned();
		let path = entry.path();
		let is_dir = path.is_dir();

		if !settings.hidden && name.starts_with('.') {
			continue;
		}

		if settings.dirs_only && !is_dir {
			continue;
		}

		let relative = if relative_dir.is_empty() {
			name.clone()
		} else {
			format!("{relative_dir}/{name}")
		};

		if settings.is_excluded(&relative) {
			continue;
		}

		entries.push(Entry {
			name,
			relative,
			path,
			is_dir,
		});
	}

	entries.sort_by(|a, b| b.is_dir.cmp(&a.is_dir).then_with(|| a.name.cmp(&b.name)));
	Ok(entries)
}

#[derive(Deserialize)]
struct FrontMatter {
	description: Option<String>,
}

/// The `description` from the YAML front matter of `dir/README.md`.
fn readme_description(dir: &Path) -> Option<String> {
	let readme = dir.join("README.md");
	let content = fs::read_to_string(&readme).ok()?;
	let yaml = front_matter(&content)?;

	match serde_yaml_ng::from_str::<FrontMatter>(yaml) {
		Ok(front_matter) => {
			front_matter
				.description
				.map(|description| description.trim().to_string())
				.filter(|description| !description.is_empty())
		}
		Err(error) => {
			tracing::debug!(readme = %readme.display(), %error, "ignoring invalid front matter");
			None
		}
	}
}

/// The text between a leading `---` line and the next `---` line.
fn front_matter(content: &str) -> Option<&str> {
	let rest = content
		.strip_prefix("---\n")
		.or_else(|| content.strip_prefix("---\r\n"))?;

	let mut offset = 0;
	for line in rest.split_inclusive('\n') {
		if line.trim_end() == "---" {
			return Some(&rest[..offset]);
		}
		offset += line.len();
	}

	None
}
