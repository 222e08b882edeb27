use super::{EscapedChar, Literal, Part, Placeholder, Template};
use crate::error::{self, ParseError};

/// How the parser deals with malformed placeholders.
#[derive(Debug)]
pub enum Mode<'a> {
	/// Stop at the first malformed placeholder and return the error.
	Strict,

	/// Treat the `$` of a malformed placeholder as literal text and keep going.
	///
	/// The errors are collected in the given vector.
	Lenient(&'a mut Vec<ParseError>),
}

impl Template {
	/// Parse the template from a source slice starting at the given position.
	///
	/// You must pass the entire source slice and an offset,
	/// so that source positions in errors are correct.
	pub fn parse(source: &str, start: usize, mode: &mut Mode<'_>) -> Result<Self, ParseError> {
		let bytes = source.as_bytes();
		let mut parts = Vec::with_capacity(1);
		let mut finger = start;
		while finger < bytes.len() {
			let next = match memchr::memchr2(b'$', b'\\', &bytes[finger..]) {
				Some(x) => finger + x,
				None => bytes.len(),
			};

			// If we found a non-empty string up to the first backslash or dollar,
			// then we have a piece of literal text.
			if next != finger {
				push_literal(&mut parts, finger..next);
			}

			// If we hit the end of the string, we're done.
			if next == bytes.len() {
				break;
			}

			if bytes[next] == b'\\' {
				match unescape_one(bytes, next) {
					Some(value) => {
						parts.push(Part::EscapedChar(EscapedChar { value }));
						finger = next + 2;
					},
					None => {
						push_literal(&mut parts, next..next + 1);
						finger = next + 1;
					},
				}
				continue;
			}

			match Placeholder::parse(source, next, mode) {
				Ok(Some((placeholder, end))) => {
					parts.push(Part::Placeholder(placeholder));
					finger = end;
				},
				// A dollar sign that doesn't start a placeholder is literal text.
				Ok(None) => {
					push_literal(&mut parts, next..next + 1);
					finger = next + 1;
				},
				Err(e) => match mode {
					Mode::Strict => return Err(e),
					Mode::Lenient(diagnostics) => {
						diagnostics.push(e);
						push_literal(&mut parts, next..next + 1);
						finger = next + 1;
					},
				},
			}
		}

		Ok(Self { parts })
	}
}

/// Push a literal, merging it with the previous part if that is a literal too.
fn push_literal(parts: &mut Vec<Part>, range: std::ops::Range<usize>) {
	if let Some(Part::Literal(last)) = parts.last_mut() {
		if last.range.end == range.start {
			last.range.end = range.end;
			return;
		}
	}
	parts.push(Part::Literal(Literal { range }));
}

impl Placeholder {
	/// Parse a placeholder from the source.
	///
	/// The finger must be the position of the dollar sign in the source.
	///
	/// Returns the parsed placeholder and the index of the byte after the placeholder,
	/// or `None` if the dollar sign does not start a placeholder at all.
	fn parse(source: &str, finger: usize, mode: &mut Mode<'_>) -> Result<Option<(Self, usize)>, ParseError> {
		let bytes = source.as_bytes();
		match bytes.get(finger + 1) {
			Some(b'{') => Self::parse_braced(source, finger, mode).map(Some),
			Some(c) if c.is_ascii_digit() => {
				let (index, index_end) = parse_index(bytes, finger + 1)?;
				let placeholder = Placeholder { index, default: None };
				Ok(Some((placeholder, index_end)))
			},
			_ => Ok(None),
		}
	}

	/// Parse a braced placeholder in the form of "${n[:default]}" from source at the given position.
	///
	/// The finger must be the position of the dollar sign in the source.
	///
	/// Returns the parsed placeholder and the index of the byte after the placeholder.
	fn parse_braced(source: &str, finger: usize, mode: &mut Mode<'_>) -> Result<(Self, usize), ParseError> {
		let bytes = source.as_bytes();
		let index_start = finger + 2;
		if !bytes.get(index_start).is_some_and(u8::is_ascii_digit) {
			return Err(error::MissingPlaceholderIndex {
				position: finger,
				len: 2,
			}
			.into());
		}

		let (index, index_end) = parse_index(bytes, index_start)?;

		// If the index extends to the end, we're missing a closing brace.
		if index_end == bytes.len() {
			return Err(error::MissingClosingBrace { position: finger + 1 }.into());
		}

		// If there is a closing brace after the index, there is no default value and we're done.
		if bytes[index_end] == b'}' {
			let placeholder = Placeholder { index, default: None };
			return Ok((placeholder, index_end + 1));

		// If there is something other than a closing brace or colon after the index, it's an error.
		} else if bytes[index_end] != b':' {
			// `index_end` follows an ASCII digit, so it is on a char boundary.
			let character = source[index_end..].chars().next().unwrap_or('\u{FFFD}');
			return Err(error::UnexpectedCharacter {
				position: index_end,
				character,
				expected: error::ExpectedCharacter {
					message: "a closing brace ('}') or colon (':')",
				},
			}
			.into());
		}

		// If there is no matching un-escaped closing brace, it's missing.
		let end = finger
			+ find_closing_brace(&bytes[finger..]).ok_or(error::MissingClosingBrace { position: finger + 1 })?;

		let placeholder = Placeholder {
			index,
			default: Some(Template::parse(&source[..end], index_end + 1, mode)?),
		};
		Ok((placeholder, end + 1))
	}
}

/// Parse a run of ASCII digits starting at `start` into a placeholder index.
///
/// Returns the index and the position of the first byte after the digits.
fn parse_index(bytes: &[u8], start: usize) -> Result<(u32, usize), ParseError> {
	let end = bytes[start..]
		.iter()
		.position(|c| !c.is_ascii_digit())
		.map_or(bytes.len(), |x| start + x);

	let mut index: u32 = 0;
	for &digit in &bytes[start..end] {
		index = index
			.checked_mul(10)
			.and_then(|x| x.checked_add(u32::from(digit - b'0')))
			.ok_or(error::InvalidPlaceholderIndex {
				position: start,
				len: end - start,
			})?;
	}
	Ok((index, end))
}

/// Unescape a single escape sequence in source at the given position.
///
/// The `position` must point to the backslash character in the source text.
///
/// Only `\$`, `\}` and `\\` are escape sequences.
/// Returns `None` if the backslash does not start one, in which case it is literal text.
fn unescape_one(source: &[u8], position: usize) -> Option<char> {
	match source.get(position + 1) {
		Some(b'\\') => Some('\\'),
		Some(b'$') => Some('$'),
		Some(b'}') => Some('}'),
		_ => None,
	}
}

/// Find the closing brace of a braced placeholder.
///
/// The haystack must start at the dollar sign of the placeholder.
fn find_closing_brace(haystack: &[u8]) -> Option<usize> {
	let mut finger = 0;
	let mut nested = 0;
	while finger < haystack.len() {
		let next = memchr::memchr3(b'\\', b'{', b'}', &haystack[finger..])?;
		match haystack[finger + next] {
			b'\\' => {
				// Only skip the next byte if it is actually escaped.
				match unescape_one(haystack, finger + next) {
					Some(_) => finger += next + 2,
					None => finger += next + 1,
				}
			},
			b'{' => {
				nested += 1;
				finger += next + 1;
			},
			b'}' => {
				nested -= 1;
				if nested == 0 {
					return Some(finger + next);
				}
				finger += next + 1;
			},
			_ => unreachable!(),
		}
	}
	None
}

#[cfg(test)]
#[rustfmt::skip]
mod test {
	use super::*;
	use assert2::{assert, check, let_assert};

	fn parse_strict(source: &str) -> Result<Template, ParseError> {
		Template::parse(source, 0, &mut Mode::Strict)
	}

	#[test]
	fn test_find_closing_brace() {
		check!(find_closing_brace(b"${1}") == Some(3));
		check!(find_closing_brace(b"${1:\\}}foo") == Some(6));
		check!(find_closing_brace(b"${1:{}}foo $2") == Some(6));
		check!(find_closing_brace(b"${1:${2:x}}y") == Some(10));
		check!(find_closing_brace(b"${1:\\{}}") == Some(7));
		check!(find_closing_brace(b"${1:abc") == None);
	}

	#[test]
	fn test_parse_index() {
		check!(let Ok((12, 3)) = parse_index(b"$12x", 1));
		check!(let Ok((0, 2)) = parse_index(b"$0", 1));
		let_assert!(Err(ParseError::InvalidPlaceholderIndex(e)) = parse_index(b"$99999999999", 1));
		assert!(e.position == 1);
		assert!(e.len == 11);
	}

	#[test]
	fn test_parse_parts() {
		let_assert!(Ok(template) = parse_strict("foo${1:bar}$0"));
		assert!(template.parts.len() == 3);
		let_assert!(Part::Literal(literal) = &template.parts[0]);
		assert!(literal.range == (0..3));
		let_assert!(Part::Placeholder(placeholder) = &template.parts[1]);
		assert!(placeholder.index == 1);
		let_assert!(Some(default) = &placeholder.default);
		let_assert!(Part::Literal(literal) = &default.parts[0]);
		assert!(literal.range == (7..10));
		let_assert!(Part::Placeholder(placeholder) = &template.parts[2]);
		assert!(placeholder.index == 0);
		assert!(placeholder.default.is_none());
	}

	#[test]
	fn test_literal_dollars_and_backslashes() {
		let_assert!(Ok(template) = parse_strict("a$b\\n$"));
		assert!(template.parts.len() == 1);
		let_assert!(Part::Literal(literal) = &template.parts[0]);
		assert!(literal.range == (0..6));
	}

	#[test]
	fn test_strict_errors() {
		check!(let Err(ParseError::MissingPlaceholderIndex(_)) = parse_strict("${}"));
		check!(let Err(ParseError::MissingPlaceholderIndex(_)) = parse_strict("${foo}"));
		check!(let Err(ParseError::MissingClosingBrace(_)) = parse_strict("${1"));
		check!(let Err(ParseError::MissingClosingBrace(_)) = parse_strict("${1:abc"));
		check!(let Err(ParseError::UnexpectedCharacter(_)) = parse_strict("${1|a,b|}"));
	}

	#[test]
	fn test_lenient_collects_errors() {
		let mut diagnostics = Vec::new();
		let_assert!(Ok(template) = Template::parse("x${1:abc", 0, &mut Mode::Lenient(&mut diagnostics)));
		assert!(diagnostics.len() == 1);
		assert!(template.parts.len() == 1);
		let_assert!(Part::Literal(literal) = &template.parts[0]);
		assert!(literal.range == (0..8));
	}
}
