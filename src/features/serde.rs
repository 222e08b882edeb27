use serde::{
	de::{Error, Visitor},
	Deserialize,
	Deserializer,
	Serialize,
	Serializer,
};

use crate::Snippet;

struct SnippetVisitor;

impl<'de> Visitor<'de> for SnippetVisitor {
	type Value = Snippet;

	fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
		formatter.write_str("a snippet template string")
	}

	fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
	where
		E: Error,
	{
		self.visit_string(v.to_owned())
	}

	fn visit_string<E>(self, v: String) -> Result<Self::Value, E>
	where
		E: Error,
	{
		Snippet::parse_strict(v).map_err(E::custom)
	}
}

impl Serialize for Snippet {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.serialize_str(self.source())
	}
}

/// Deserializes from a template string, rejecting malformed placeholders.
impl<'de> Deserialize<'de> for Snippet {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		deserializer.deserialize_string(SnippetVisitor)
	}
}

#[cfg(test)]
mod test {
	use serde_test::{assert_de_tokens_error, assert_tokens, Token};

	use crate::config::{DocumentOptions, LineEnding};
	use crate::document::{Position, Range};
	use crate::Snippet;

	const SOURCE: &str = "for ${1:i} in ${2:items} {\n\t$0\n}";

	#[test]
	fn snippet_ser_de() {
		let snippet = Snippet::parse_strict(SOURCE).unwrap();

		assert_tokens(&snippet, &[Token::String(SOURCE)]);
		assert_tokens(&snippet, &[Token::Str(SOURCE)]);
	}

	#[test]
	fn malformed_snippet_is_rejected() {
		assert_de_tokens_error::<Snippet>(&[Token::Str("${1:unclosed")], "Missing closing brace");
	}

	#[test]
	fn options_ser_de() {
		let options = DocumentOptions::default().with_line_ending(LineEnding::CrLf).with_tab_size(2);

		assert_tokens(&options, &[
			Token::Struct { name: "DocumentOptions", len: 3 },
			Token::Str("line_ending"),
			Token::UnitVariant { name: "LineEnding", variant: "crlf" },
			Token::Str("tab_size"),
			Token::U64(2),
			Token::Str("insert_spaces"),
			Token::Bool(true),
			Token::StructEnd,
		]);
	}

	#[test]
	fn range_ser_de() {
		let range = Range::new(Position::new(1, 4), Position::new(1, 7));

		assert_tokens(&range, &[
			Token::Struct { name: "Range", len: 2 },
			Token::Str("start"),
			Token::Struct { name: "Position", len: 2 },
			Token::Str("line"),
			Token::U64(1),
			Token::Str("column"),
			Token::U64(4),
			Token::StructEnd,
			Token::Str("end"),
			Token::Struct { name: "Position", len: 2 },
			Token::Str("line"),
			Token::U64(1),
			Token::Str("column"),
			Token::U64(7),
			Token::StructEnd,
			Token::StructEnd,
		]);
	}
}
