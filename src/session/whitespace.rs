use crate::document::{Document, Position};

/// Adjust the line breaks and indentation of snippet text for insertion at a position.
///
/// Line breaks (`\r\n`, `\r` or `\n`) are replaced by the line ending of the document.
/// Every indented line after the first one is re-indented with the leading whitespace of the anchor line,
/// up to the anchor column, followed by its own leading whitespace.
/// The combined indentation is rewritten to the indentation style of the document,
/// where each tab counts as a full tab size.
/// Lines that don't start with whitespace are left as they are.
///
/// Text without line breaks is returned unchanged.
pub fn normalize_whitespace(document: &Document, anchor: Position, text: &str) -> String {
	let line = document.line(anchor.line).unwrap_or_default();
	let anchor_indentation: String = line
		.chars()
		.take(anchor.column)
		.take_while(|c| *c == ' ' || *c == '\t')
		.collect();

	let mut output = String::with_capacity(text.len());
	for (i, text_line) in split_lines(text).enumerate() {
		if i == 0 {
			output.push_str(text_line);
			continue;
		}
		output.push_str(document.eol());
		let own_indentation_len = text_line.len() - text_line.trim_start_matches([' ', '\t']).len();
		if own_indentation_len == 0 {
			output.push_str(text_line);
			continue;
		}
		let (own_indentation, rest) = text_line.split_at(own_indentation_len);
		let indentation = format!("{anchor_indentation}{own_indentation}");
		output.push_str(&document.options().normalize_indentation(&indentation));
		output.push_str(rest);
	}
	output
}

/// Split text on `\r\n`, `\r` and `\n`.
fn split_lines(text: &str) -> impl Iterator<Item = &str> {
	let mut rest = Some(text);
	std::iter::from_fn(move || {
		let current = rest?;
		match memchr::memchr2(b'\r', b'\n', current.as_bytes()) {
			Some(position) => {
				let break_len = if current[position..].starts_with("\r\n") { 2 } else { 1 };
				rest = Some(&current[position + break_len..]);
				Some(&current[..position])
			},
			None => {
				rest = None;
				Some(current)
			},
		}
	})
}

#[cfg(test)]
#[rustfmt::skip]
mod test {
	use super::*;
	use crate::config::{DocumentOptions, LineEnding};
	use assert2::check;

	fn document() -> Document {
		Document::new("function foo() {\n    console.log(a);\n}")
	}

	#[test]
	fn test_split_lines() {
		check!(split_lines("a").collect::<Vec<_>>() == ["a"]);
		check!(split_lines("a\r\nb\rc\nd").collect::<Vec<_>>() == ["a", "b", "c", "d"]);
		check!(split_lines("a\n").collect::<Vec<_>>() == ["a", ""]);
		check!(split_lines("").collect::<Vec<_>>() == [""]);
	}

	#[test]
	fn text_without_line_breaks_is_unchanged() {
		let document = document();
		check!(normalize_whitespace(&document, Position::new(0, 0), "foo") == "foo");
		check!(normalize_whitespace(&document, Position::new(1, 4), "foo\tbar") == "foo\tbar");
	}

	#[test]
	fn line_breaks_use_the_document_line_ending() {
		let document = document();
		check!(normalize_whitespace(&document, Position::new(0, 0), "foo\rbar") == "foo\nbar");
		check!(normalize_whitespace(&document, Position::new(0, 0), "foo\r\nbar") == "foo\nbar");

		let document = Document::with_options("x", DocumentOptions::default().with_line_ending(LineEnding::CrLf));
		check!(normalize_whitespace(&document, Position::new(0, 0), "foo\nbar") == "foo\r\nbar");
	}

	#[test]
	fn continuation_lines_follow_the_anchor_indentation() {
		let document = document();
		check!(normalize_whitespace(&document, Position::new(1, 4), "foo\r\tbar") == "foo\n        bar");
		check!(normalize_whitespace(&document, Position::new(1, 2), "foo\r\tbar") == "foo\n      bar");
		check!(normalize_whitespace(&document, Position::new(1, 10), "a\n b") == "a\n     b");
	}

	#[test]
	fn unindented_lines_are_left_alone() {
		let document = document();
		check!(normalize_whitespace(&document, Position::new(1, 4), "a\nb") == "a\nb");
		check!(normalize_whitespace(&document, Position::new(1, 4), "foo\n\tbar\n") == "foo\n        bar\n");
		check!(normalize_whitespace(&document, Position::new(1, 4), "{\n\tx\n}") == "{\n        x\n}");
	}

	#[test]
	fn indentation_with_tabs() {
		let document = Document::with_options(
			"\tx",
			DocumentOptions::default().with_insert_spaces(false).with_tab_size(4),
		);
		check!(normalize_whitespace(&document, Position::new(0, 1), "{\n    y\n}") == "{\n\t\ty\n}");
	}
}
