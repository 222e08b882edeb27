//! Options that control how snippet text is laid out in a document.

/// The line ending convention of a document.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum LineEnding {
	/// `\n`
	#[default]
	Lf,

	/// `\r\n`
	CrLf,

	/// `\r`
	Cr,
}

impl LineEnding {
	/// The characters that make up this line ending.
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Lf => "\n",
			Self::CrLf => "\r\n",
			Self::Cr => "\r",
		}
	}

	/// Detect the line ending of a text from its first line break.
	///
	/// Returns `None` if the text has no line breaks.
	pub fn detect(text: &str) -> Option<Self> {
		let position = memchr::memchr2(b'\n', b'\r', text.as_bytes())?;
		match &text.as_bytes()[position..] {
			[b'\r', b'\n', ..] => Some(Self::CrLf),
			[b'\r', ..] => Some(Self::Cr),
			_ => Some(Self::Lf),
		}
	}
}

/// Indentation and line ending settings of a document.
#[derive(Debug, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default, deny_unknown_fields))]
pub struct DocumentOptions {
	/// The line ending used for inserted text.
	pub line_ending: LineEnding,

	/// The width of one indentation level in columns.
	pub tab_size: usize,

	/// Indent with spaces instead of tabs.
	pub insert_spaces: bool,
}

impl Default for DocumentOptions {
	fn default() -> Self {
		Self {
			line_ending: LineEnding::Lf,
			tab_size: 4,
			insert_spaces: true,
		}
	}
}

impl DocumentOptions {
	/// Set the line ending.
	#[must_use]
	pub fn with_line_ending(mut self, line_ending: LineEnding) -> Self {
		self.line_ending = line_ending;
		self
	}

	/// Set the tab size.
	///
	/// A tab size of zero is treated as one.
	#[must_use]
	pub fn with_tab_size(mut self, tab_size: usize) -> Self {
		self.tab_size = tab_size.max(1);
		self
	}

	/// Choose between indenting with spaces or tabs.
	#[must_use]
	pub fn with_insert_spaces(mut self, insert_spaces: bool) -> Self {
		self.insert_spaces = insert_spaces;
		self
	}

	/// Rewrite a run of leading whitespace to the configured indentation style.
	///
	/// Every tab counts as a full [`Self::tab_size`] columns.
	pub fn normalize_indentation(&self, whitespace: &str) -> String {
		let tab_size = self.tab_size.max(1);
		let width: usize = whitespace
			.chars()
			.map(|c| if c == '\t' { tab_size } else { 1 })
			.sum();
		if self.insert_spaces {
			" ".repeat(width)
		} else {
			let mut output = "\t".repeat(width / tab_size);
			output.push_str(&" ".repeat(width % tab_size));
			output
		}
	}
}

#[cfg(test)]
mod test {
	use super::*;
	use assert2::{assert, check};

	#[test]
	fn test_detect_line_ending() {
		check!(LineEnding::detect("foo") == None);
		check!(LineEnding::detect("foo\nbar") == Some(LineEnding::Lf));
		check!(LineEnding::detect("foo\r\nbar\n") == Some(LineEnding::CrLf));
		check!(LineEnding::detect("foo\rbar") == Some(LineEnding::Cr));
	}

	#[test]
	fn test_normalize_indentation() {
		let options = DocumentOptions::default();
		check!(options.normalize_indentation("") == "");
		check!(options.normalize_indentation("\t") == "    ");
		check!(options.normalize_indentation("  \t") == "      ");

		let options = DocumentOptions::default().with_insert_spaces(false).with_tab_size(2);
		check!(options.normalize_indentation("     ") == "\t\t ");
		check!(options.normalize_indentation("\t ") == "\t ");
	}

	#[test]
	fn test_zero_tab_size() {
		let options = DocumentOptions::default().with_tab_size(0);
		assert!(options.tab_size == 1);
	}
}
