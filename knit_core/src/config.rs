use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;

use crate::KnitError;
use crate::KnitResult;

/// Default maximum document size in bytes (10 MB).
pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Supported config file locations in discovery order (highest precedence
/// first).
pub const CONFIG_FILE_CANDIDATES: [&str; 3] = ["knit.toml", ".knit.toml", ".config/knit.toml"];

/// Document extensions discovered when no config overrides them.
pub const DEFAULT_EXTENSIONS: [&str; 2] = ["md", "qmd"];

/// Configuration loaded from a `knit.toml` file.
///
/// ```toml
/// extensions = ["md", "qmd", "markdown"]
/// max_file_size = 1048576
/// disable_gitignore = false
///
/// [exclude]
/// patterns = ["vendor/", "CHANGELOG.md"]
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct KnitConfig {
	/// File extensions (without the dot) searched for under directory
	/// arguments. Explicit file arguments are processed whatever their
	/// extension.
	#[serde(default = "default_extensions")]
	pub extensions: Vec<String>,
	/// Exclusion configuration using gitignore-style patterns.
	#[serde(default)]
	pub exclude: ExcludeConfig,
	/// Documents larger than this many bytes are skipped with a warning.
	#[serde(default = "default_max_file_size")]
	pub max_file_size: u64,
	/// When true, `.gitignore` rules are not used to filter discovered
	/// documents.
	#[serde(default)]
	pub disable_gitignore: bool,
}

impl Default for KnitConfig {
	fn default() -> Self {
		Self {
			extensions: default_extensions(),
			exclude: ExcludeConfig::default(),
			max_file_size: DEFAULT_MAX_FILE_SIZE,
			disable_gitignore: false,
		}
	}
}

/// Paths to skip during discovery. Patterns follow gitignore syntax and are
/// relative to the project root.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExcludeConfig {
	#[serde(default)]
	pub patterns: Vec<String>,
}

fn default_extensions() -> Vec<String> {
	DEFAULT_EXTENSIONS.iter().map(ToString::to_string).collect()
}

fn default_max_file_size() -> u64 {
	DEFAULT_MAX_FILE_SIZE
}

impl KnitConfig {
	/// Resolve the config path from known discovery candidates.
	#[must_use]
	pub fn resolve_path(root: &Path) -> Option<PathBuf> {
		CONFIG_FILE_CANDIDATES
			.iter()
			.map(|candidate| root.join(candidate))
			.find(|path| path.is_file())
	}

	/// Load the config from the first discovered config file at `root`.
	/// Returns `None` if there is no config file.
	pub fn load(root: &Path) -> KnitResult<Option<KnitConfig>> {
		let Some(config_path) = Self::resolve_path(root) else {
			return Ok(None);
		};

		tracing::debug!(path = %config_path.display(), "loading config");
		let content = std::fs::read_to_string(&config_path)?;
		let config = Self::parse(&content)?;

		Ok(Some(config))
	}

	/// Parse config file contents.
	pub fn parse(content: &str) -> KnitResult<KnitConfig> {
		toml::from_str(content).map_err(|e| KnitError::ConfigParse(e.to_string()))
	}
}
