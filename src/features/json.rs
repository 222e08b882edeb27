//! Support for loading snippet definitions from JSON files.
//!
//! The files use the format of VS Code snippet files:
//! an object that maps snippet names to a prefix, a body and an optional description.
//! The body is either a single string, or an array of lines.
//!
//! ```json
//! {
//!   "For loop": {
//!     "prefix": "for",
//!     "body": ["for ${1:item} in ${2:items} {", "\t$0", "}"],
//!     "description": "Loop over an iterator"
//!   }
//! }
//! ```

use crate::Snippet;

/// A named snippet loaded from a snippet file.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct SnippetDefinition {
	/// The name of the snippet.
	pub name: String,

	/// The words that trigger the snippet.
	pub prefixes: Vec<String>,

	/// The parsed snippet body.
	pub body: Snippet,

	/// A description of the snippet, if the file has one.
	pub description: Option<String>,
}

/// Entry of a snippet file as it appears in the JSON data.
#[derive(serde::Deserialize)]
struct RawDefinition {
	prefix: OneOrMany,
	body: OneOrMany,
	#[serde(default)]
	description: Option<String>,
}

#[derive(serde::Deserialize)]
#[serde(untagged)]
enum OneOrMany {
	One(String),
	Many(Vec<String>),
}

impl OneOrMany {
	fn into_vec(self) -> Vec<String> {
		match self {
			Self::One(value) => vec![value],
			Self::Many(values) => values,
		}
	}
}

/// Load snippet definitions from JSON data.
///
/// Snippet bodies are parsed leniently: malformed placeholders become literal text.
/// The definitions are sorted by name.
pub fn from_slice(data: &[u8]) -> Result<Vec<SnippetDefinition>, Error> {
	let raw: serde_json::Map<String, serde_json::Value> = serde_json::from_slice(data)?;
	convert(raw)
}

/// Load snippet definitions from JSON data.
///
/// Snippet bodies are parsed leniently: malformed placeholders become literal text.
/// The definitions are sorted by name.
pub fn from_str(data: &str) -> Result<Vec<SnippetDefinition>, Error> {
	let raw: serde_json::Map<String, serde_json::Value> = serde_json::from_str(data)?;
	convert(raw)
}

fn convert(raw: serde_json::Map<String, serde_json::Value>) -> Result<Vec<SnippetDefinition>, Error> {
	let mut definitions = Vec::with_capacity(raw.len());
	for (name, value) in raw {
		let definition: RawDefinition = serde_json::from_value(value).map_err(|source| InvalidDefinition {
			name: name.clone(),
			source,
		})?;
		let body = Snippet::parse(definition.body.into_vec().join("\n"));
		if !body.diagnostics().is_empty() {
			tracing::debug!(
				name = %name,
				errors = body.diagnostics().len(),
				"snippet body contains malformed placeholders",
			);
		}
		definitions.push(SnippetDefinition {
			name,
			prefixes: definition.prefix.into_vec(),
			body,
			description: definition.description,
		});
	}
	definitions.sort_by(|a, b| a.name.cmp(&b.name));
	Ok(definitions)
}

/// Error for loading snippet definitions from JSON.
#[derive(Debug)]
pub enum Error {
	/// The data is not a valid JSON object.
	Json(serde_json::Error),

	/// One of the snippet definitions has the wrong shape.
	InvalidDefinition(InvalidDefinition),
}

/// A snippet definition has the wrong shape.
#[derive(Debug)]
pub struct InvalidDefinition {
	/// The name of the snippet.
	pub name: String,

	/// The underlying JSON error.
	pub source: serde_json::Error,
}

impl From<serde_json::Error> for Error {
	#[inline]
	fn from(other: serde_json::Error) -> Self {
		Self::Json(other)
	}
}

impl From<InvalidDefinition> for Error {
	#[inline]
	fn from(other: InvalidDefinition) -> Self {
		Self::InvalidDefinition(other)
	}
}

impl std::error::Error for Error {}

impl std::fmt::Display for Error {
	#[inline]
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Json(e) => std::fmt::Display::fmt(e, f),
			Self::InvalidDefinition(e) => write!(f, "Invalid snippet definition {:?}: {}", e.name, e.source),
		}
	}
}
