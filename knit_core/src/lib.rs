//! `knit_core` keeps generated regions of Markdown and Quarto documents up
//! to date. A region is delimited by a pair of HTML comments:
//!
//! ```markdown
//! <!-- docs TREE path="src" depth=2 -->
//! ...generated content...
//! <!-- /docs -->
//! ```
//!
//! Everything between the markers is owned by the named generator and is
//! replaced on every run; everything outside is copied through untouched.
//!
//! ## Processing Pipeline
//!
//! ```text
//! document
//!   -> locator   (pairs opening and closing markers into Blocks)
//!   -> header    (splits an opening marker into a name and Options)
//!   -> registry  (resolves the name to a Generator)
//!   -> engine    (splices generated or error content back into the document)
//! ```
//!
//! ## Modules
//!
//! - [`config`]: configuration loading from `knit.toml`.
//! - [`project`]: document discovery and whole-project sync.
//! - [`generators`]: the built-in `TREE` and `JUST` generators.
//!
//! ## Quick Start
//!
//! ```rust
//! use knit_core::GeneratorRegistry;
//! use knit_core::render;
//! use std::path::Path;
//!
//! let mut registry = GeneratorRegistry::new();
//! registry.register(
//! 	"VERSION",
//! 	|_body: &str, _options: &knit_core::Options, _path: &Path| -> Result<String, knit_core::GeneratorError> {
//! 		Ok("0.3.0".to_string())
//! 	},
//! );
//!
//! let document = "Current version:\n<!-- docs VERSION -->\n<!-- /docs -->\n";
//! let rendered = render(document, Path::new("readme.md"), &registry);
//!
//! assert_eq!(
//! 	rendered,
//! 	"Current version:\n<!-- docs VERSION -->\n\n0.3.0\n\n<!-- /docs -->\n"
//! );
//! ```

pub use engine::*;
pub use error::*;
pub use generator::*;
pub use header::*;
pub use locator::*;
pub use position::*;
pub use registry::*;

pub mod config;
mod engine;
#[allow(unused_assignments)]
mod error;
mod generator;
pub mod generators;
mod header;
mod locator;
mod position;
pub mod project;
mod registry;
