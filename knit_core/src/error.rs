use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Diagnostic, Error)]
#[non_exhaustive]
pub enum KnitError {
	#[error(transparent)]
	#[diagnostic(code(knit::io_error))]
	Io(#[from] std::io::Error),

	#[error("invalid block header: {0}")]
	#[diagnostic(
		code(knit::header_parse),
		help("block headers look like `<!-- docs NAME key=\"value\" -->`")
	)]
	HeaderParse(String),

	#[error("Extension '{0}' not found")]
	#[diagnostic(
		code(knit::unknown_generator),
		help("run `knit list` to see the registered generators")
	)]
	UnknownGenerator(String),

	#[error("{source}")]
	#[diagnostic(code(knit::generator))]
	Generator {
		name: String,
		#[source]
		source: GeneratorError,
	},

	#[error("failed to parse config file: {0}")]
	#[diagnostic(
		code(knit::config_parse),
		help("check that knit.toml is valid TOML with `extensions` and/or [exclude] entries")
	)]
	ConfigParse(String),

	#[error("invalid exclude pattern `{pattern}`: {reason}")]
	#[diagnostic(code(knit::exclude_pattern))]
	InvalidExcludePattern { pattern: String, reason: String },

	#[error("failed to access document `{}`: {source}", path.display())]
	#[diagnostic(code(knit::document_io))]
	DocumentIo {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},
}

/// Failure raised by a generator while producing replacement content. The
/// display text ends up verbatim inside the `<!-- Error: ... -->` marker.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GeneratorError {
	#[error("'{key}' option required")]
	MissingOption { key: String },

	#[error("invalid value `{value}` for option '{key}': expected {expected}")]
	InvalidOption {
		key: String,
		value: String,
		expected: &'static str,
	},

	#[error("{what} not found at {}", path.display())]
	NotFound { what: String, path: PathBuf },

	#[error("failed to read {}: {source}", path.display())]
	Io {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("{0}")]
	Message(String),
}

impl GeneratorError {
	pub fn message(message: impl Into<String>) -> Self {
		Self::Message(message.into())
	}
}

pub type KnitResult<T> = Result<T, KnitError>;
pub type AnyError = Box<dyn std::error::Error>;
pub type AnyEmptyResult = Result<(), AnyError>;
pub type AnyResult<T> = Result<T, AnyError>;
