use crate::error::ParseError;

mod raw;

/// A parsed snippet template.
///
/// A template is literal text mixed with numbered placeholders:
///
/// * `$n` or `${n}`: an empty placeholder with index `n`,
/// * `${n:default}`: a placeholder with default text, which may itself contain placeholders,
/// * `$0`: the final placeholder, visited last.
///
/// A placeholder index may appear more than once.
/// All occurrences of one index are linked and stay textually identical while the snippet is being edited.
///
/// You can escape dollar signs, closing braces and backslashes with a backslash.
/// A dollar sign that does not start a placeholder is literal text, and so is any other backslash.
#[derive(Clone)]
pub struct Snippet {
	source: String,
	raw: raw::Template,
	diagnostics: Vec<ParseError>,
}

impl std::fmt::Debug for Snippet {
	#[inline]
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_tuple("Snippet").field(&self.source).finish()
	}
}

/// Snippets are equal when they have the same source.
impl PartialEq for Snippet {
	fn eq(&self, other: &Self) -> bool {
		self.source == other.source
	}
}

impl Eq for Snippet {}

impl Snippet {
	/// Parse a snippet template, treating malformed placeholders as literal text.
	///
	/// This never fails.
	/// The `$` of a malformed placeholder such as `${1:unclosed` is inserted verbatim,
	/// and the error is kept in [`Self::diagnostics()`].
	pub fn parse(source: impl Into<String>) -> Self {
		let source = source.into();
		let mut diagnostics = Vec::new();
		let raw = match raw::Template::parse(&source, 0, &mut raw::Mode::Lenient(&mut diagnostics)) {
			Ok(raw) => raw,
			// The lenient parser reports errors through the diagnostics instead.
			Err(e) => unreachable!("lenient snippet parsing failed: {e}"),
		};
		for diagnostic in &diagnostics {
			tracing::debug!(
				error = %diagnostic,
				range = ?diagnostic.source_range(),
				"treating malformed placeholder as literal text",
			);
		}
		Self { source, raw, diagnostics }
	}

	/// Parse a snippet template, failing on the first malformed placeholder.
	pub fn parse_strict(source: impl Into<String>) -> Result<Self, ParseError> {
		let source = source.into();
		let raw = raw::Template::parse(&source, 0, &mut raw::Mode::Strict)?;
		Ok(Self {
			source,
			raw,
			diagnostics: Vec::new(),
		})
	}

	/// Get the original template source.
	#[inline]
	pub fn source(&self) -> &str {
		&self.source
	}

	/// Consume the snippet to get the original template source.
	#[inline]
	pub fn into_source(self) -> String {
		self.source
	}

	/// Get the errors the lenient parser recovered from.
	///
	/// Always empty for snippets parsed with [`Self::parse_strict()`].
	#[inline]
	pub fn diagnostics(&self) -> &[ParseError] {
		&self.diagnostics
	}

	/// Expand the snippet into plain text and placeholder spans.
	///
	/// If the template has no final placeholder (`$0`),
	/// an empty one is appended at the end of the text.
	pub fn expand(&self) -> Expansion {
		let mut output = Expansion {
			text: String::with_capacity(self.source.len()),
			char_len: 0,
			placeholders: Vec::new(),
		};
		self.raw.expand(&mut output, &self.source, 0);
		if !output.placeholders.iter().any(|p| p.index == 0) {
			let end = output.char_len;
			output.placeholders.push(PlaceholderSpan {
				index: 0,
				range: end..end,
				depth: 0,
				implicit: true,
			});
		}
		output
	}
}

impl std::str::FromStr for Snippet {
	type Err = ParseError;

	fn from_str(source: &str) -> Result<Self, Self::Err> {
		Self::parse_strict(source)
	}
}

/// The result of expanding a [`Snippet`].
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Expansion {
	text: String,

	/// Length of `text` in characters.
	char_len: usize,

	placeholders: Vec<PlaceholderSpan>,
}

impl Expansion {
	/// The expanded text, with every placeholder replaced by its default text.
	#[inline]
	pub fn text(&self) -> &str {
		&self.text
	}

	/// The length of the expanded text in characters.
	#[inline]
	pub fn char_len(&self) -> usize {
		self.char_len
	}

	/// All placeholder occurrences in template order.
	///
	/// A placeholder always comes before the placeholders nested in its default text.
	#[inline]
	pub fn placeholders(&self) -> &[PlaceholderSpan] {
		&self.placeholders
	}

	fn push_str(&mut self, value: &str) {
		self.text.push_str(value);
		self.char_len += value.chars().count();
	}

	fn push_char(&mut self, value: char) {
		self.text.push(value);
		self.char_len += 1;
	}
}

/// One placeholder occurrence in an [`Expansion`].
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct PlaceholderSpan {
	/// The placeholder index.
	pub index: u32,

	/// The character range of the placeholder text in the expanded text.
	pub range: std::ops::Range<usize>,

	/// How many placeholders this one is nested in.
	pub depth: usize,

	/// True for the final placeholder that is added when the template has none.
	pub implicit: bool,
}

/// Sort key that puts the final placeholder (index 0) after all others.
pub(crate) fn navigation_key(index: u32) -> (bool, u32) {
	(index == 0, index)
}
