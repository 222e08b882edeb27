//! Snippet tabstop sessions for text editors.
//!
//! # Features
//!
//! * Parse snippet templates with numbered, nested and linked placeholders: `"for ${1:item} in ${2:items} {\n\t$0\n}"`.
//! * Insert a snippet at every selection of an editor at once.
//! * Navigate between placeholders with [`SnippetSession::next()`] and [`SnippetSession::prev()`].
//! * Keep linked placeholders (the same index used more than once) identical while the user types.
//! * Track placeholders as live ranges that follow every edit of the document.
//! * Nest sessions: insert a snippet inside a placeholder of another snippet.
//! * Load VS Code style snippet files (optional, requires the `json` feature).
//!
//! # Snippet syntax
//!
//! * `$1` or `${1}`: an empty placeholder,
//! * `${1:default}`: a placeholder with default text, which may contain other placeholders,
//! * `$0`: the final placeholder, where the cursor ends up.
//!   If a snippet has no final placeholder, one is added at the end.
//!
//! Dollar signs, closing braces and backslashes can be escaped with a backslash.
//!
//! # Example
//!
//! ```
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use snippet_session::{Document, Editor, Position, Range, SnippetSession};
//!
//! let mut editor = Editor::new(Document::new("fn main() {}\n"));
//! editor.set_selection(Range::caret(Position::new(1, 0)));
//!
//! let mut session = SnippetSession::insert(&mut editor, "let ${1:x} = ${2:1};$0")?;
//! assert_eq!(editor.document().text(), "fn main() {}\nlet x = 1;");
//! assert_eq!(editor.selections(), [Range::from_coords(1, 4, 1, 5)]);
//!
//! editor.type_text("answer")?;
//! session.next(&mut editor);
//! assert_eq!(editor.selections(), [Range::from_coords(1, 13, 1, 14)]);
//!
//! session.next(&mut editor);
//! assert!(session.is_at_final_placeholder());
//! assert_eq!(editor.selections(), [Range::caret(Position::new(1, 15))]);
//! session.finish(&mut editor);
//! # Ok(())
//! # }
//! ```
//!
//! # Logging
//!
//! The library logs through [`tracing`].
//! It never installs a subscriber itself.
#![warn(missing_docs, missing_debug_implementations)]
#![cfg_attr(feature = "doc-cfg", feature(doc_cfg))]

pub mod config;
pub use config::{DocumentOptions, LineEnding};

pub mod document;
pub use document::{ChangeEvent, ContentChange, Document, EditOrigin, Position, Range, TextEdit};

pub mod editor;
pub use editor::Editor;

pub mod error;
pub use error::{EditError, Error, ParseError};

pub mod features;

pub mod session;
pub use session::{normalize_whitespace, SnippetSession};

pub mod snippet;
pub use snippet::Snippet;

/// Install a log subscriber that writes to the test output.
///
/// The filter is taken from `RUST_LOG`, and defaults to debug messages from this crate.
#[cfg(test)]
pub(crate) fn init_test_logging() {
	let _ = tracing_subscriber::fmt()
		.with_env_filter(
			tracing_subscriber::EnvFilter::try_from_default_env()
				.unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("snippet_session=debug")),
		)
		.with_test_writer()
		.try_init();
}
