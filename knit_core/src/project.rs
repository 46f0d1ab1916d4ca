use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

use ignore::gitignore::Gitignore;
use ignore::gitignore::GitignoreBuilder;

use crate::BlockError;
use crate::Dispatch;
use crate::KnitError;
use crate::KnitResult;
use crate::ParseDiagnostic;
use crate::config::CONFIG_FILE_CANDIDATES;
use crate::config::KnitConfig;
use crate::engine::clear;
use crate::engine::render_document;
use crate::locator::locate;

/// Options that control how documents are discovered.
///
/// Use [`ScanOptions::default()`] for sensible defaults or
/// [`ScanOptions::from_config`] to construct from a [`KnitConfig`].
#[derive(Debug, Clone)]
pub struct ScanOptions {
	/// Project root. `.gitignore` and exclude patterns are resolved against
	/// it.
	pub root: PathBuf,
	/// Document extensions searched for under directory arguments.
	pub extensions: Vec<String>,
	/// Gitignore-style patterns to exclude from discovery.
	pub exclude_patterns: Vec<String>,
	/// Maximum document size in bytes.
	pub max_file_size: u64,
	/// Whether to disable `.gitignore` integration.
	pub disable_gitignore: bool,
}

impl Default for ScanOptions {
	fn default() -> Self {
		Self::from_config(Path::new("."), None)
	}
}

impl ScanOptions {
	/// Construct [`ScanOptions`] for the project at `root` from an optional
	/// [`KnitConfig`].
	pub fn from_config(root: &Path, config: Option<&KnitConfig>) -> Self {
		let defaults = KnitConfig::default();
		let config = config.unwrap_or(&defaults);

		Self {
			root: root.to_path_buf(),
			extensions: config.extensions.clone(),
			exclude_patterns: config.exclude.patterns.clone(),
			max_file_size: config.max_file_size,
			disable_gitignore: config.disable_gitignore,
		}
	}

	fn is_document(&self, path: &Path) -> bool {
		path.extension()
			.and_then(|extension| extension.to_str())
			.is_some_and(|extension| {
				self.extensions
					.iter()
					.any(|candidate| candidate.trim_start_matches('.') == extension)
			})
	}
}

/// Documents found by [`discover_documents`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Discovery {
	/// Documents to process, sorted and without duplicates.
	pub files: Vec<PathBuf>,
	/// Arguments that do not exist.
	pub missing: Vec<PathBuf>,
	/// Documents skipped because they exceed the size limit.
	pub oversized: Vec<PathBuf>,
}

/// Expand `paths` into the list of documents to process.
///
/// File arguments are taken as they are. Directory arguments are walked
/// recursively for documents with one of the configured extensions, honoring
/// `.gitignore` and exclude patterns and skipping hidden directories,
/// `node_modules` and `target`. Subdirectories with their own knit config
/// are a separate project and are not entered.
pub fn discover_documents(paths: &[PathBuf], options: &ScanOptions) -> KnitResult<Discovery> {
	let gitignore = if options.disable_gitignore {
		Gitignore::empty()
	} else {
		build_gitignore(&options.root)
	};
	let custom_exclude = build_exclude_matcher(&options.root, &options.exclude_patterns)?;
	let mut discovery = Discovery::default();
	let mut candidates = Vec::new();
	let mut visited_dirs = HashSet::new();

	for path in paths {
		if path.is_dir() {
			let walker = Walker {
				options,
				gitignore: &gitignore,
				custom_exclude: &custom_exclude,
			};
			walker.walk(path, &mut candidates, &mut visited_dirs)?;
		} else if path.is_file() {
			candidates.push(path.clone());
		} else {
			tracing::debug!(path = %path.display(), "path does not exist");
			discovery.missing.push(path.clone());
		}
	}

	candidates.sort();
	candidates.dedup();

	for path in candidates {
		let size = fs::metadata(&path).map(|metadata| metadata.len()).unwrap_or(0);
		if size > options.max_file_size {
			tracing::warn!(
				path = %path.display(),
				size,
				limit = options.max_file_size,
				"skipping document larger than max_file_size"
			);
			discovery.oversized.push(path);
			continue;
		}
		discovery.files.push(path);
	}

	tracing::debug!(
		files = discovery.files.len(),
		missing = discovery.missing.len(),
		"discovered documents"
	);

	Ok(discovery)
}

struct Walker<'a> {
	options: &'a ScanOptions,
	gitignore: &'a Gitignore,
	custom_exclude: &'a Gitignore,
}

impl Walker<'_> {
	fn walk(
		&self,
		dir: &Path,
		files: &mut Vec<PathBuf>,
		visited_dirs: &mut HashSet<PathBuf>,
	) -> KnitResult<()> {
		// Detect symlink cycles by tracking canonical paths.
		let canonical = dir.canonicalize().unwrap_or_else(|_| dir.to_path_buf());
		if !visited_dirs.insert(canonical) {
			tracing::debug!(dir = %dir.display(), "directory already visited");
			return Ok(());
		}

		let entries = match fs::read_dir(dir) {
			Ok(entries) => entries,
			Err(error) => {
				tracing::warn!(dir = %dir.display(), %error, "skipping unreadable directory");
				return Ok(());
			}
		};

		for entry in entries {
			let entry = entry?;
			let path = entry.path();

			if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
				if is_ignored_name(name) {
					continue;
				}
			}

			let is_dir = path.is_dir();

			if self.gitignore.matched(&path, is_dir).is_ignore() {
				continue;
			}

			if self.custom_exclude.matched(&path, is_dir).is_ignore() {
				continue;
			}

			if is_dir {
				if has_project_config(&path) {
					tracing::debug!(dir = %path.display(), "skipping nested project");
					continue;
				}
				self.walk(&path, files, visited_dirs)?;
			} else if self.options.is_document(&path) {
				files.push(path);
			}
		}

		Ok(())
	}
}

fn is_ignored_name(name: &str) -> bool {
	name.starts_with('.') || name == "node_modules" || name == "target"
}

fn has_project_config(dir: &Path) -> bool {
	CONFIG_FILE_CANDIDATES
		.iter()
		.any(|candidate| dir.join(candidate).is_file())
}

/// Build a `Gitignore` matcher from `[exclude]` patterns. These follow
/// `.gitignore` syntax and are applied on top of any `.gitignore` rules.
fn build_exclude_matcher(root: &Path, patterns: &[String]) -> KnitResult<Gitignore> {
	let mut builder = GitignoreBuilder::new(root);
	for pattern in patterns {
		builder.add_line(None, pattern).map_err(|e| {
			KnitError::InvalidExcludePattern {
				pattern: pattern.clone(),
				reason: e.to_string(),
			}
		})?;
	}
	builder.build().map_err(|e| {
		KnitError::InvalidExcludePattern {
			pattern: patterns.join(", "),
			reason: e.to_string(),
		}
	})
}

/// Build a `Gitignore` matcher from the project's `.gitignore` file (if any).
fn build_gitignore(root: &Path) -> Gitignore {
	let mut builder = GitignoreBuilder::new(root);
	let gitignore_path = root.join(".gitignore");
	if gitignore_path.is_file() {
		if let Some(error) = builder.add(&gitignore_path) {
			tracing::warn!(path = %gitignore_path.display(), %error, "ignoring unreadable .gitignore");
		}
	}
	builder.build().unwrap_or_else(|error| {
		tracing::warn!(%error, "failed to build .gitignore rules");
		Gitignore::empty()
	})
}

/// What [`sync_documents`] does to each document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncMode {
	/// Regenerate every block body.
	Render,
	/// Empty every block body.
	Clear,
}

/// A document whose content changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentUpdate {
	pub path: PathBuf,
	pub original: String,
	pub updated: String,
}

/// A document that could not be read or written.
#[derive(Debug)]
pub struct DocumentFailure {
	pub path: PathBuf,
	pub error: KnitError,
}

impl DocumentFailure {
	fn io(path: &Path, source: std::io::Error) -> Self {
		Self {
			path: path.to_path_buf(),
			error: KnitError::DocumentIo {
				path: path.to_path_buf(),
				source,
			},
		}
	}
}

/// A block in a specific document that now holds an error marker.
#[derive(Debug, Clone)]
pub struct FileBlockError {
	pub path: PathBuf,
	pub error: BlockError,
}

/// An unpaired marker in a specific document.
#[derive(Debug, Clone)]
pub struct FileDiagnostic {
	pub path: PathBuf,
	pub diagnostic: ParseDiagnostic,
}

/// The outcome of [`sync_documents`]. Nothing has been written yet; pass it
/// to [`write_updates`] to apply the changes.
#[derive(Debug, Default)]
pub struct SyncResult {
	/// Number of documents read successfully.
	pub processed: usize,
	/// Number of blocks found across all documents.
	pub blocks: usize,
	/// Documents whose content changes.
	pub updated_files: Vec<DocumentUpdate>,
	pub block_errors: Vec<FileBlockError>,
	pub diagnostics: Vec<FileDiagnostic>,
	pub failures: Vec<DocumentFailure>,
}

impl SyncResult {
	/// Whether every document is already up to date.
	pub fn is_clean(&self) -> bool {
		self.updated_files.is_empty()
	}

	pub fn has_failures(&self) -> bool {
		!self.failures.is_empty()
	}
}

/// Apply `mode` to every document in `files`.
///
/// A document that cannot be read is recorded as a [`DocumentFailure`] and
/// the remaining documents are still processed.
pub fn sync_documents<D: Dispatch + ?Sized>(
	files: &[PathBuf],
	mode: SyncMode,
	dispatcher: &D,
) -> SyncResult {
	let mut result = SyncResult::default();

	for path in files {
		let original = match fs::read_to_string(path) {
			Ok(content) => content,
			Err(source) => {
				tracing::debug!(path = %path.display(), %source, "failed to read document");
				result.failures.push(DocumentFailure::io(path, source));
				continue;
			}
		};

		result.processed += 1;

		let (updated, blocks, diagnostics) = match mode {
			SyncMode::Render => {
				let report = render_document(&original, path, dispatcher);
				let blocks = report.block_count();
				result
					.block_errors
					.extend(report.errors.into_iter().map(|error| {
						FileBlockError {
							path: path.clone(),
							error,
						}
					}));
				(report.content, blocks, report.diagnostics)
			}
			SyncMode::Clear => {
				let located = locate(&original);
				(clear(&original), located.blocks.len(), located.diagnostics)
			}
		};

		result.blocks += blocks;
		result
			.diagnostics
			.extend(diagnostics.into_iter().map(|diagnostic| {
				FileDiagnostic {
					path: path.clone(),
					diagnostic,
				}
			}));

		tracing::debug!(path = %path.display(), blocks, changed = (updated != original), "processed document");

		if updated != original {
			result.updated_files.push(DocumentUpdate {
				path: path.clone(),
				original,
				updated,
			});
		}
	}

	result
}

/// Write every changed document to disk. Returns the documents that could
/// not be written.
pub fn write_updates(result: &SyncResult) -> Vec<DocumentFailure> {
	let mut failures = Vec::new();

	for update in &result.updated_files {
		if let Err(source) = fs::write(&update.path, &update.updated) {
			tracing::debug!(path = %update.path.display(), %source, "failed to write document");
			failures.push(DocumentFailure::io(&update.path, source));
		}
	}

	failures
}
