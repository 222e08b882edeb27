use super::{Part, Placeholder, Template};
use crate::snippet::{Expansion, PlaceholderSpan};

impl Template {
	/// Expand the template into the output expansion.
	///
	/// Placeholders are recorded in pre-order: a placeholder comes before the placeholders nested in its default text.
	pub fn expand(&self, output: &mut Expansion, source: &str, depth: usize) {
		for part in &self.parts {
			match part {
				Part::Literal(x) => output.push_str(&source[x.range.clone()]),
				Part::EscapedChar(x) => output.push_char(x.value),
				Part::Placeholder(x) => x.expand(output, source, depth),
			}
		}
	}
}

impl Placeholder {
	/// Expand the placeholder into the output expansion.
	fn expand(&self, output: &mut Expansion, source: &str, depth: usize) {
		let start = output.char_len;
		let slot = output.placeholders.len();
		output.placeholders.push(PlaceholderSpan {
			index: self.index,
			range: start..start,
			depth,
			implicit: false,
		});
		if let Some(default) = &self.default {
			default.expand(output, source, depth + 1);
		}
		output.placeholders[slot].range.end = output.char_len;
	}
}
