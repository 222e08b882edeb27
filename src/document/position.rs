/// A position in a document.
///
/// Both the line and the column are zero-based.
/// The column counts characters (Unicode scalar values) from the start of the line.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Position {
	/// The zero-based line number.
	pub line: usize,

	/// The zero-based column, in characters.
	pub column: usize,
}

impl Position {
	/// Create a new position.
	#[inline]
	pub const fn new(line: usize, column: usize) -> Self {
		Self { line, column }
	}
}

impl std::fmt::Display for Position {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		write!(f, "{}:{}", self.line, self.column)
	}
}

/// A range between two positions in a document.
///
/// The start is always before or equal to the end.
/// An empty range is a caret.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Range {
	/// The start of the range.
	pub start: Position,

	/// The end of the range.
	pub end: Position,
}

impl Range {
	/// Create a range between two positions, in either order.
	pub fn new(a: Position, b: Position) -> Self {
		if a <= b {
			Self { start: a, end: b }
		} else {
			Self { start: b, end: a }
		}
	}

	/// Create a range from line and column numbers, in either order.
	#[inline]
	pub fn from_coords(start_line: usize, start_column: usize, end_line: usize, end_column: usize) -> Self {
		Self::new(Position::new(start_line, start_column), Position::new(end_line, end_column))
	}

	/// Create an empty range at a position.
	#[inline]
	pub const fn caret(position: Position) -> Self {
		Self {
			start: position,
			end: position,
		}
	}

	/// Check if the range is empty.
	#[inline]
	pub fn is_empty(&self) -> bool {
		self.start == self.end
	}

	/// Check if a position lies within the range, edges included.
	#[inline]
	pub fn contains(&self, position: Position) -> bool {
		self.start <= position && position <= self.end
	}
}

impl std::fmt::Display for Range {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		write!(f, "[{}, {}]", self.start, self.end)
	}
}
