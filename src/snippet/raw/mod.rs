mod expand;
mod parse;

pub use parse::Mode;

/// Raw snippet template that doesn't own the original source.
///
/// Internally, this keeps a bunch of offsets into the original source.
#[derive(Debug, Clone)]
pub struct Template {
	/// The individual parts that make up the template.
	parts: Vec<Part>,
}

/// One piece of a parsed template.
#[derive(Debug, Clone)]
pub enum Part {
	/// A literal string to be used verbatim from the original source.
	Literal(Literal),

	/// An escaped character.
	EscapedChar(EscapedChar),

	/// A numbered placeholder.
	Placeholder(Placeholder),
}

/// A literal string to be used verbatim from the original source.
#[derive(Debug, Clone)]
pub struct Literal {
	/// The byte range of the literal in the original source.
	///
	/// The literal can not contain any escaped characters or placeholders.
	range: std::ops::Range<usize>,
}

/// An escaped character (`\$`, `\}` or `\\`).
#[derive(Debug, Clone)]
pub struct EscapedChar {
	/// The escaped character.
	value: char,
}

/// A numbered placeholder, `$n`, `${n}` or `${n:default}`.
#[derive(Debug, Clone)]
pub struct Placeholder {
	/// The placeholder index.
	///
	/// Index 0 is the final placeholder.
	index: u32,

	/// The default text, which may itself contain placeholders.
	default: Option<Template>,
}
