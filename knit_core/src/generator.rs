use std::path::Path;

use crate::GeneratorError;
use crate::KnitResult;
use crate::Options;

/// Produces the replacement content for a block body.
///
/// `body` is the block's current content, `options` are the header options
/// and `path` is the document being processed (generators resolve relative
/// paths against its parent directory). Implementations validate and coerce
/// their own options.
///
/// Any closure with the same signature is a generator:
///
/// ```rust
/// use knit_core::GeneratorRegistry;
/// use knit_core::Options;
/// use knit_core::GeneratorError;
/// use std::path::Path;
///
/// let mut registry = GeneratorRegistry::new();
/// registry.register(
/// 	"GREETING",
/// 	|_body: &str, options: &Options, _path: &Path| -> Result<String, GeneratorError> {
/// 		Ok(format!("Hello, {}!", options.get_str_or("name", "world")))
/// 	},
/// );
/// ```
pub trait Generator: Send + Sync {
	fn generate(&self, body: &str, options: &Options, path: &Path) -> Result<String, GeneratorError>;
}

impl<F> Generator for F
where
	F: Fn(&str, &Options, &Path) -> Result<String, GeneratorError> + Send + Sync,
{
	fn generate(&self, body: &str, options: &Options, path: &Path) -> Result<String, GeneratorError> {
		self(body, options, path)
	}
}

/// The seam between the rewrite engine and generators: resolve `name` and
/// invoke it exactly once.
///
/// [`GeneratorRegistry`](crate::GeneratorRegistry) is the usual dispatcher.
/// Closures work too, which keeps engine tests free of registry setup.
pub trait Dispatch {
	fn dispatch(
		&self,
		name: &str,
		body: &str,
		options: &Options,
		path: &Path,
	) -> KnitResult<String>;
}

impl<F> Dispatch for F
where
	F: Fn(&str, &str, &Options, &Path) -> KnitResult<String>,
{
	fn dispatch(
		&self,
		name: &str,
		body: &str,
		options: &Options,
		path: &Path,
	) -> KnitResult<String> {
		self(name, body, options, path)
	}
}
