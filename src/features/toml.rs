//! Support for loading document options from TOML data.

use crate::config::DocumentOptions;

/// Load document options from TOML data.
///
/// Missing fields keep their default value, unknown fields are rejected.
///
/// ```toml
/// line_ending = "crlf"
/// tab_size = 2
/// insert_spaces = false
/// ```
pub fn options_from_str(data: &str) -> Result<DocumentOptions, Error> {
	let mut options: DocumentOptions = toml::from_str(data)?;
	options.tab_size = options.tab_size.max(1);
	Ok(options)
}

/// Load document options from TOML data.
///
/// See [`options_from_str()`].
pub fn options_from_slice(data: &[u8]) -> Result<DocumentOptions, Error> {
	options_from_str(std::str::from_utf8(data)?)
}

/// Error for loading document options from TOML.
#[derive(Debug)]
pub enum Error {
	/// The input contains invalid UTF-8.
	InvalidUtf8(std::str::Utf8Error),

	/// An error occurred while parsing TOML.
	Toml(toml::de::Error),
}

impl From<std::str::Utf8Error> for Error {
	#[inline]
	fn from(other: std::str::Utf8Error) -> Self {
		Self::InvalidUtf8(other)
	}
}

impl From<toml::de::Error> for Error {
	#[inline]
	fn from(other: toml::de::Error) -> Self {
		Self::Toml(other)
	}
}

impl std::error::Error for Error {}

impl std::fmt::Display for Error {
	#[inline]
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::InvalidUtf8(e) => std::fmt::Display::fmt(e, f),
			Self::Toml(e) => std::fmt::Display::fmt(e, f),
		}
	}
}

#[cfg(test)]
#[rustfmt::skip]
mod test {
	use super::*;
	use crate::config::LineEnding;
	use assert2::{assert, let_assert};

	#[test]
	fn test_options_from_str() {
		let_assert!(Ok(options) = options_from_str(
			concat!(
				"line_ending = \"crlf\"\n",
				"tab_size = 2\n",
				"insert_spaces = false\n",
			),
		));
		assert!(options.line_ending == LineEnding::CrLf);
		assert!(options.tab_size == 2);
		assert!(!options.insert_spaces);
	}

	#[test]
	fn missing_fields_use_defaults() {
		let_assert!(Ok(options) = options_from_str("tab_size = 0\n"));
		assert!(options.line_ending == LineEnding::Lf);
		assert!(options.tab_size == 1);
		assert!(options.insert_spaces);

		let_assert!(Ok(options) = options_from_slice(b""));
		assert!(options == DocumentOptions::default());
	}

	#[test]
	fn invalid_options_are_rejected() {
		let_assert!(Err(Error::Toml(_)) = options_from_str("indent = 4\n"));
		let_assert!(Err(Error::Toml(_)) = options_from_str("line_ending = \"lfcr\"\n"));
		let_assert!(Err(Error::InvalidUtf8(_)) = options_from_slice(b"tab_size = \xff"));
	}
}
