//! Module containing error details.

use crate::document::{Position, Range};

/// An error that can occur while strictly parsing a snippet template.
///
/// The lenient parser never returns these errors.
/// Instead it treats the offending token as literal text and records the error as a diagnostic.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum ParseError {
	/// The template contains a braced placeholder without an index (`"${}"` or `"${foo}"`).
	MissingPlaceholderIndex(MissingPlaceholderIndex),

	/// The template contains a placeholder index that does not fit in a `u32`.
	InvalidPlaceholderIndex(InvalidPlaceholderIndex),

	/// The template contains an unexpected character.
	UnexpectedCharacter(UnexpectedCharacter),

	/// The template contains an unclosed placeholder.
	MissingClosingBrace(MissingClosingBrace),
}

impl From<MissingPlaceholderIndex> for ParseError {
	fn from(other: MissingPlaceholderIndex) -> Self {
		Self::MissingPlaceholderIndex(other)
	}
}

impl From<InvalidPlaceholderIndex> for ParseError {
	fn from(other: InvalidPlaceholderIndex) -> Self {
		Self::InvalidPlaceholderIndex(other)
	}
}

impl From<UnexpectedCharacter> for ParseError {
	fn from(other: UnexpectedCharacter) -> Self {
		Self::UnexpectedCharacter(other)
	}
}

impl From<MissingClosingBrace> for ParseError {
	fn from(other: MissingClosingBrace) -> Self {
		Self::MissingClosingBrace(other)
	}
}

impl std::error::Error for ParseError {}

impl std::fmt::Display for ParseError {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		match self {
			Self::MissingPlaceholderIndex(e) => e.fmt(f),
			Self::InvalidPlaceholderIndex(e) => e.fmt(f),
			Self::UnexpectedCharacter(e) => e.fmt(f),
			Self::MissingClosingBrace(e) => e.fmt(f),
		}
	}
}

/// The template contains a braced placeholder without an index (`"${}"` or `"${foo}"`).
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct MissingPlaceholderIndex {
	/// The byte offset within the template where the error occurs.
	///
	/// This points to the `$` sign of the placeholder.
	pub position: usize,

	/// The length of the placeholder opening in bytes.
	pub len: usize,
}

impl std::error::Error for MissingPlaceholderIndex {}

impl std::fmt::Display for MissingPlaceholderIndex {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		write!(f, "Missing placeholder index")
	}
}

/// The template contains a placeholder index that does not fit in a `u32`.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct InvalidPlaceholderIndex {
	/// The byte offset of the first digit of the index.
	pub position: usize,

	/// The number of digits in the index.
	pub len: usize,
}

impl std::error::Error for InvalidPlaceholderIndex {}

impl std::fmt::Display for InvalidPlaceholderIndex {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		write!(f, "Placeholder index out of range")
	}
}

/// The template contains an unexpected character.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct UnexpectedCharacter {
	/// The byte offset within the template where the error occurs.
	pub position: usize,

	/// The unexpected character.
	pub character: char,

	/// A human readable message about what was expected instead.
	pub expected: ExpectedCharacter,
}

impl std::error::Error for UnexpectedCharacter {}

impl std::fmt::Display for UnexpectedCharacter {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		write!(f, "Unexpected character: {:?}, expected {}", self.character, self.expected.message())
	}
}

/// A struct to describe what was expected instead of the unexpected character.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ExpectedCharacter {
	/// A human readable message to describe what is expected.
	pub(crate) message: &'static str,
}

impl ExpectedCharacter {
	/// Get a human readable message to describe what was expected.
	pub fn message(&self) -> &str {
		self.message
	}
}

/// The template contains an unclosed placeholder.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct MissingClosingBrace {
	/// The byte offset within the template where the error occurs.
	///
	/// This points to the `{` character that is missing a closing brace.
	pub position: usize,
}

impl std::error::Error for MissingClosingBrace {}

impl std::fmt::Display for MissingClosingBrace {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		write!(f, "Missing closing brace")
	}
}

impl ParseError {
	/// Get the byte range in the template that contains the error.
	pub fn source_range(&self) -> std::ops::Range<usize> {
		let (start, len) = match &self {
			Self::MissingPlaceholderIndex(e) => (e.position, e.len),
			Self::InvalidPlaceholderIndex(e) => (e.position, e.len),
			Self::UnexpectedCharacter(e) => (e.position, e.character.len_utf8()),
			Self::MissingClosingBrace(e) => (e.position, 1),
		};
		std::ops::Range {
			start,
			end: start + len,
		}
	}

	/// Get the line of the template that contains the error.
	///
	/// # Panics
	/// May panic if the source text is not the template that contains the error.
	pub fn source_line<'a>(&self, source: &'a str) -> &'a str {
		let position = self.source_range().start;
		let start = line_start(source, position);
		let end = line_end(source, position);
		&source[start..end]
	}

	/// Write source highlighting for the error location.
	///
	/// The highlighting ends with a newline.
	///
	/// Note: this function doesn't print anything if the source line exceeds 60 characters in width.
	pub fn write_source_highlighting(&self, f: &mut impl std::fmt::Write, source: &str) -> std::fmt::Result {
		use unicode_width::UnicodeWidthStr;

		let range = self.source_range();
		let line = self.source_line(source);
		if line.width() > 60 {
			return Ok(());
		}
		let line_offset = line_start(source, range.start);
		let range = range.start - line_offset..(range.end - line_offset).min(line.len());
		write!(f, "  {}\n  ", line)?;
		write_underline(f, line, range)?;
		writeln!(f)
	}

	/// Get source highlighting for the error location as a string.
	///
	/// The highlighting ends with a newline.
	pub fn source_highlighting(&self, source: &str) -> String {
		let mut output = String::new();
		// Writing to a String can not fail and the line is always valid UTF-8.
		let _ = self.write_source_highlighting(&mut output, source);
		output
	}
}

fn line_start(source: &str, position: usize) -> usize {
	match source.as_bytes()[..position].iter().rposition(|&c| c == b'\n' || c == b'\r') {
		Some(line_end) => line_end + 1,
		None => 0,
	}
}

fn line_end(source: &str, position: usize) -> usize {
	match source.as_bytes()[position..].iter().position(|&c| c == b'\n' || c == b'\r') {
		Some(line_end) => position + line_end,
		None => source.len(),
	}
}

fn write_underline(f: &mut impl std::fmt::Write, line: &str, range: std::ops::Range<usize>) -> std::fmt::Result {
	use unicode_width::UnicodeWidthStr;
	let spaces = line[..range.start].width();
	let carets = line[range].width().max(1);
	write!(f, "{}", " ".repeat(spaces))?;
	write!(f, "{}", "^".repeat(carets))?;
	Ok(())
}

/// An error that can occur when applying edits to a [`Document`][crate::Document].
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum EditError {
	/// A position lies outside of the document.
	PositionOutOfBounds(PositionOutOfBounds),

	/// A character offset lies outside of the document.
	OffsetOutOfBounds(OffsetOutOfBounds),

	/// Two edits in one batch overlap.
	OverlappingEdits(OverlappingEdits),
}

impl From<PositionOutOfBounds> for EditError {
	fn from(other: PositionOutOfBounds) -> Self {
		Self::PositionOutOfBounds(other)
	}
}

impl From<OffsetOutOfBounds> for EditError {
	fn from(other: OffsetOutOfBounds) -> Self {
		Self::OffsetOutOfBounds(other)
	}
}

impl From<OverlappingEdits> for EditError {
	fn from(other: OverlappingEdits) -> Self {
		Self::OverlappingEdits(other)
	}
}

impl std::error::Error for EditError {}

impl std::fmt::Display for EditError {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		match self {
			Self::PositionOutOfBounds(e) => e.fmt(f),
			Self::OffsetOutOfBounds(e) => e.fmt(f),
			Self::OverlappingEdits(e) => e.fmt(f),
		}
	}
}

/// A position lies outside of the document.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct PositionOutOfBounds {
	/// The offending position.
	pub position: Position,
}

impl std::error::Error for PositionOutOfBounds {}

impl std::fmt::Display for PositionOutOfBounds {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		write!(f, "Position out of bounds: {}", self.position)
	}
}

/// A character offset lies outside of the document.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct OffsetOutOfBounds {
	/// The offending offset.
	pub offset: usize,

	/// The length of the document in characters.
	pub len: usize,
}

impl std::error::Error for OffsetOutOfBounds {}

impl std::fmt::Display for OffsetOutOfBounds {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		write!(f, "Offset out of bounds: {} (document length is {})", self.offset, self.len)
	}
}

/// Two edits in one batch overlap.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct OverlappingEdits {
	/// The range of the first edit.
	pub first: Range,

	/// The range of the edit that overlaps the first one.
	pub second: Range,
}

impl std::error::Error for OverlappingEdits {}

impl std::fmt::Display for OverlappingEdits {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		write!(f, "Overlapping edits: {} and {}", self.first, self.second)
	}
}

/// An error that can occur when inserting a strictly parsed snippet.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Error {
	/// The template could not be parsed.
	Parse(ParseError),

	/// The expansion could not be applied to the document.
	Edit(EditError),
}

impl From<ParseError> for Error {
	fn from(other: ParseError) -> Self {
		Self::Parse(other)
	}
}

impl From<EditError> for Error {
	fn from(other: EditError) -> Self {
		Self::Edit(other)
	}
}

impl std::error::Error for Error {}

impl std::fmt::Display for Error {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		match self {
			Self::Parse(e) => e.fmt(f),
			Self::Edit(e) => e.fmt(f),
		}
	}
}
