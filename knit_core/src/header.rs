use std::collections::BTreeMap;

use derive_more::Deref;
use derive_more::DerefMut;
use serde::Deserialize;
use serde::Serialize;

use crate::GeneratorError;
use crate::KnitError;
use crate::KnitResult;

/// The literal token that introduces every knit block header.
pub const HEADER_TOKEN: &str = "docs";

/// The decomposed opening marker of a block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
	/// The generator name, e.g. `TREE`. Case-sensitive.
	pub name: String,
	/// The `key=value` options that follow the name.
	pub options: Options,
}

/// Options attached to a block header.
///
/// Values stay strings because they are the textual contract with the
/// document. Generators coerce them with the typed accessors below, which
/// fail with a [`GeneratorError`] on malformed input rather than silently
/// falling back to a default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Deref, DerefMut)]
#[serde(transparent)]
pub struct Options(BTreeMap<String, String>);

impl Options {
	pub fn new() -> Self {
		Self::default()
	}

	/// The raw value for `key`, if present.
	pub fn get_str(&self, key: &str) -> Option<&str> {
		self.0.get(key).map(String::as_str)
	}

	/// The raw value for `key` or `default` when absent.
	pub fn get_str_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
		self.get_str(key).unwrap_or(default)
	}

	/// A value that must be present and non-empty.
	pub fn required(&self, key: &str) -> Result<&str, GeneratorError> {
		match self.get_str(key) {
			Some(value) if !value.is_empty() => Ok(value),
			_ => {
				Err(GeneratorError::MissingOption {
					key: key.to_string(),
				})
			}
		}
	}

	/// Parse a boolean option. Accepts `true`/`false`, `yes`/`no` and `1`/`0`
	/// in any case.
	pub fn get_bool(&self, key: &str, default: bool) -> Result<bool, GeneratorError> {
		let Some(value) = self.get_str(key) else {
			return Ok(default);
		};

		match value.to_ascii_lowercase().as_str() {
			"true" | "yes" | "1" => Ok(true),
			"false" | "no" | "0" => Ok(false),
			_ => {
				Err(GeneratorError::InvalidOption {
					key: key.to_string(),
					value: value.to_string(),
					expected: "`true` or `false`",
				})
			}
		}
	}

	/// Parse a non-negative integer option.
	pub fn get_usize(&self, key: &str, default: usize) -> Result<usize, GeneratorError> {
		let Some(value) = self.get_str(key) else {
			return Ok(default);
		};

		value
			.trim()
			.parse::<usize>()
			.map_err(|_| {
				GeneratorError::InvalidOption {
					key: key.to_string(),
					value: value.to_string(),
					expected: "a non-negative integer",
				}
			})
	}

	/// Split a comma-separated option into its trimmed, non-empty parts.
	pub fn get_list(&self, key: &str) -> Vec<String> {
		self.get_str(key)
			.map(|value| {
				value
					.split(',')
					.map(str::trim)
					.filter(|part| !part.is_empty())
					.map(ToString::to_string)
					.collect()
			})
			.unwrap_or_default()
	}
}

impl<K, V> FromIterator<(K, V)> for Options
where
	K: Into<String>,
	V: Into<String>,
{
	fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
		Self(
			iter.into_iter()
				.map(|(key, value)| (key.into(), value.into()))
				.collect(),
		)
	}
}

/// Decompose an opening marker such as `<!-- docs TREE path="." depth=2 -->`
/// into its generator name and options.
///
/// The comment delimiters and the leading `docs` token are optional so the
/// bare form `TREE depth=2` parses the same way. Text in the options tail
/// that is not a `key=value` pair is ignored.
pub fn parse_header(marker: &str) -> KnitResult<Header> {
	let mut content = marker.trim();
	content = content.strip_prefix("<!--").unwrap_or(content);
	content = content.strip_suffix("-->").unwrap_or(content);
	content = strip_header_token(content.trim());

	let (name, tail) = match content.find(char::is_whitespace) {
		Some(index) => (&content[..index], &content[index..]),
		None => (content, ""),
	};

	if name.is_empty() {
		return Err(KnitError::HeaderParse(format!(
			"missing generator name in `{}`",
			marker.trim()
		)));
	}

	Ok(Header {
		name: name.to_string(),
		options: parse_options(tail),
	})
}

/// Strip the `docs` token only when it stands alone, so a generator called
/// `docsite` keeps its name.
fn strip_header_token(content: &str) -> &str {
	match content.strip_prefix(HEADER_TOKEN) {
		Some(rest) if rest.is_empty() || rest.starts_with(char::is_whitespace) => rest.trim_start(),
		_ => content,
	}
}

/// Scan left to right for `identifier=value` pairs. Later keys overwrite
/// earlier ones.
pub fn parse_options(input: &str) -> Options {
	let mut options = Options::new();
	let bytes = input.as_bytes();
	let mut cursor = 0;

	while cursor < bytes.len() {
		if !is_identifier_byte(bytes[cursor]) {
			cursor += 1;
			continue;
		}

		let key_end = cursor
			+ bytes[cursor..]
				.iter()
				.take_while(|byte| is_identifier_byte(**byte))
				.count();

		if bytes.get(key_end) != Some(&b'=') {
			cursor = key_end;
			continue;
		}

		let Some((value, rest)) = parse_value(&input[key_end + 1..]) else {
			cursor = key_end + 1;
			continue;
		};

		options.insert(input[cursor..key_end].to_string(), value.to_string());
		cursor = input.len() - rest.len();
	}

	options
}

/// Returns the value and the unconsumed remainder. Quoted values are taken
/// verbatim with no escape processing; an unterminated quote is treated as
/// part of an unquoted value.
fn parse_value(input: &str) -> Option<(&str, &str)> {
	for quote in ['"', '\''] {
		if let Some(stripped) = input.strip_prefix(quote) {
			if let Some(end) = stripped.find(quote) {
				return Some((&stripped[..end], &stripped[end + 1..]));
			}
		}
	}

	let end = input.find(char::is_whitespace).unwrap_or(input.len());
	if end == 0 {
		return None;
	}

	Some((&input[..end], &input[end..]))
}

fn is_identifier_byte(byte: u8) -> bool {
	byte.is_ascii_alphanumeric() || byte == b'_'
}
