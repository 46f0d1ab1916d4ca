use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use crate::Dispatch;
use crate::Generator;
use crate::KnitError;
use crate::KnitResult;
use crate::Options;
use crate::generators::JustGenerator;
use crate::generators::TreeGenerator;

/// Maps generator names to implementations.
///
/// A registry is built once (usually with [`GeneratorRegistry::with_builtins`])
/// and handed to the rewrite engine by reference. It is `Send + Sync`, so
/// documents may be rendered from several threads once registration is done.
#[derive(Clone, Default)]
pub struct GeneratorRegistry {
	generators: HashMap<String, Arc<dyn Generator>>,
}

impl GeneratorRegistry {
	/// An empty registry.
	pub fn new() -> Self {
		Self::default()
	}

	/// A registry with the built-in `TREE` and `JUST` generators.
	pub fn with_builtins() -> Self {
		let mut registry = Self::new();
		registry.register(TreeGenerator::NAME, TreeGenerator);
		registry.register(JustGenerator::NAME, JustGenerator);
		registry
	}

	/// Register `generator` under `name`. Re-registering a name replaces the
	/// previous generator.
	pub fn register(&mut self, name: impl Into<String>, generator: impl Generator + 'static) {
		let name = name.into();
		if self
			.generators
			.insert(name.clone(), Arc::new(generator))
			.is_some()
		{
			tracing::debug!(%name, "replaced generator registration");
		}
	}

	/// Look up the generator registered under `name`.
	pub fn resolve(&self, name: &str) -> KnitResult<Arc<dyn Generator>> {
		self.generators
			.get(name)
			.cloned()
			.ok_or_else(|| KnitError::UnknownGenerator(name.to_string()))
	}

	/// Whether `name` has a registration.
	pub fn contains(&self, name: &str) -> bool {
		self.generators.contains_key(name)
	}

	/// Registered names in sorted order.
	pub fn names(&self) -> Vec<&str> {
		let mut names: Vec<&str> = self.generators.keys().map(String::as_str).collect();
		names.sort_unstable();
		names
	}

	/// Remove every registration.
	pub fn reset(&mut self) {
		self.generators.clear();
	}

	pub fn len(&self) -> usize {
		self.generators.len()
	}

	pub fn is_empty(&self) -> bool {
		self.generators.is_empty()
	}
}

impl fmt::Debug for GeneratorRegistry {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("GeneratorRegistry")
			.field("generators", &self.names())
			.finish()
	}
}

impl Dispatch for GeneratorRegistry {
	fn dispatch(
		&self,
		name: &str,
		body: &str,
		options: &Options,
		path: &Path,
	) -> KnitResult<String> {
		let generator = self.resolve(name)?;
		tracing::debug!(%name, path = %path.display(), "dispatching generator");

		generator.generate(body, options, path).map_err(|source| {
			KnitError::Generator {
				name: name.to_string(),
				source,
			}
		})
	}
}
