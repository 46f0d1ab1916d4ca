//! Built-in generators registered by
//! [`GeneratorRegistry::with_builtins`](crate::GeneratorRegistry::with_builtins).

use std::path::Path;

pub use just::*;
pub use tree::*;

mod just;
mod tree;

/// The directory that relative generator paths resolve against.
pub(crate) fn document_dir(path: &Path) -> &Path {
	match path.parent() {
		Some(parent) if !parent.as_os_str().is_empty() => parent,
		_ => Path::new("."),
	}
}
